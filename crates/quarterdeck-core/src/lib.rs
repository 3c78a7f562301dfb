//! Shared plumbing for quarterdeck services: tracing setup, env config,
//! health endpoints, request-id middleware and sea-orm query helpers.

pub mod config;
pub mod health;
pub mod middleware;
pub mod sea_ext;
pub mod serde;
pub mod tracing;
