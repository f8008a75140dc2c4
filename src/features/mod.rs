// Stats bot behaviour

pub mod archive;
pub mod command_parser;
pub mod discord;
pub mod engine;
pub mod errors;
pub mod identity;
pub mod report;
pub mod resolver;
pub mod sink;
pub mod stats_cache;
