// Slash commands
pub mod help;
