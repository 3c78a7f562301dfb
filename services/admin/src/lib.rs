//! Admin service: user, identity and role administration behind a
//! role-gated HTTP API.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod infra;
pub mod policy;
pub mod query;
pub mod router;
pub mod state;
pub mod usecase;
