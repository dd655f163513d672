// HTTP module
// Tagged client and per-request records

pub mod client;
pub mod record;

pub use client::TaggedClient;
pub use record::{RequestRecord, RequestTag};
