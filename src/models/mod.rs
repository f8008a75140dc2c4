// Data models
pub mod mode;
pub mod platform;
pub mod player;
