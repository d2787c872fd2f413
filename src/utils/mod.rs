pub mod tui;
pub mod when;
