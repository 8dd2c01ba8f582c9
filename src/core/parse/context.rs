//! Parse context
//!
//! All mutable state of one parse lives here and is discarded when the parse
//! ends. Nothing is module-level or shared: concurrent renders of different
//! diagrams cannot observe each other's variable or coordinate tables.

use fxhash::FxHashMap;

use super::{ParseWarning, WarningKind};
use crate::core::scene::Coord;

/// Mutable state threaded through every extraction stage of one parse
#[derive(Debug, Default)]
pub struct ParseContext {
    /// `\def` variable table, names stored without the backslash
    pub variables: FxHashMap<String, f64>,
    /// Named-coordinate table, built strictly in source order.
    /// A redefinition overwrites the entry for subsequent lookups only;
    /// points already resolved keep their old value.
    pub coordinates: FxHashMap<String, Coord>,
    /// Definition order of coordinate names, for the scene's ordered table
    pub coordinate_order: Vec<String>,
    /// Non-fatal diagnostics collected along the way
    pub warnings: Vec<ParseWarning>,
}

impl ParseContext {
    pub fn new() -> Self {
        ParseContext::default()
    }

    /// Insert or overwrite a named coordinate (last-write-wins)
    pub fn define_coordinate(&mut self, name: &str, coord: Coord) {
        if !self.coordinates.contains_key(name) {
            self.coordinate_order.push(name.to_string());
        }
        self.coordinates.insert(name.to_string(), coord);
    }

    /// Look up a coordinate by exact name
    pub fn lookup_coordinate(&self, name: &str) -> Option<Coord> {
        self.coordinates.get(name).copied()
    }

    pub fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
        self.warnings.push(ParseWarning::new(kind, message));
    }

    pub fn warn_at(
        &mut self,
        kind: WarningKind,
        message: impl Into<String>,
        location: impl Into<String>,
    ) {
        self.warnings
            .push(ParseWarning::new(kind, message).with_location(location));
    }
}
