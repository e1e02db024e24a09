pub mod catalog;
pub mod core;
pub mod generate;
pub mod prompt;
pub mod selection;
pub mod worksheet;
