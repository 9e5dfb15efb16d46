pub mod auth;
pub mod cache;
pub mod client;
pub mod endpoints;
pub mod response;

pub use cache::InstanceCache;
pub use client::{ErrorEnvelope, SantabaClient, Transport, health_check};
pub use endpoints::{MATCH_ALL, RequestKind, ResourceRequest};
