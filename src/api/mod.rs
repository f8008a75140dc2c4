// Upstream and storage clients
pub mod firebase;
pub mod leaderboards;
pub mod store;
pub mod tracker;
