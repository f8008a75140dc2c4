// Utility functions module
pub mod clock;
pub mod config;
pub mod formatters;
