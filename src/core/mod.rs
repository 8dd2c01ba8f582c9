pub mod parse;
pub mod render;
pub mod sampler;
pub mod scene;
