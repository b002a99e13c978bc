//! Terminal styling for the interactive session and command output.

pub mod theme;

pub use theme::{THEME, Theme};
