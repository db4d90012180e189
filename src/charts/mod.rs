//! Charts module - static diagnosis rendering

mod plotter;

pub use plotter::MissingPatternPlotter;
