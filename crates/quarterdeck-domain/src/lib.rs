//! Shared domain types for the quarterdeck services.

pub mod action;
pub mod pagination;
