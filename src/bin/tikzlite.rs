//! tikzlite CLI - render TikZ-subset diagram directives to SVG

use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};

use tikzlite::{parse_scene_with_diagnostics, render_scene, RenderOptions};

#[derive(Parser)]
#[command(name = "tikzlite")]
#[command(version)]
#[command(about = "Render TikZ-subset diagram directives to SVG", long_about = None)]
struct Cli {
    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 300.0)]
    width: f64,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 300.0)]
    height: f64,

    /// Canvas padding in pixels
    #[arg(long, default_value_t = 30.0)]
    padding: f64,

    /// Samples per function plot
    #[arg(long, default_value_t = 201)]
    resolution: usize,

    /// Print the parsed scene as JSON instead of rendering
    #[arg(long)]
    dump_scene: bool,

    /// Suppress parse warnings on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let input = match cli.input_file {
        Some(ref path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let outcome = parse_scene_with_diagnostics(&input);
    if !cli.quiet {
        for warning in &outcome.warnings {
            eprintln!("warning: {}", warning);
        }
    }

    let output = if cli.dump_scene {
        match serde_json::to_string_pretty(&outcome.scene) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("error: could not serialize scene: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        let options = RenderOptions {
            width: cli.width,
            height: cli.height,
            padding: cli.padding,
            resolution: cli.resolution,
        };
        if let Err(e) = options.validate() {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
        render_scene(&outcome.scene, &options)
    };

    match cli.output {
        Some(ref path) => {
            fs::write(path, &output)?;
            if !cli.quiet {
                eprintln!("✓ Output written to: {}", path);
            }
        }
        None => {
            io::stdout().write_all(output.as_bytes())?;
            if !output.ends_with('\n') {
                io::stdout().write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
