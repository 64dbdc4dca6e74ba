pub mod client;

pub use client::SlotStoreClient;
