pub mod scoring;
pub mod matcher;
pub mod session;
pub mod pool;
pub mod committer;
pub mod events;
pub mod search;
