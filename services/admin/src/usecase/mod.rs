pub mod password;
pub mod session;
pub mod user;

#[cfg(test)]
pub(crate) mod mock;
