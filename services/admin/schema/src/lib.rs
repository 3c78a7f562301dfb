//! sea-orm entities owned by the admin service.

pub mod audit_logs;
pub mod identities;
pub mod roles;
pub mod user_roles;
pub mod users;
