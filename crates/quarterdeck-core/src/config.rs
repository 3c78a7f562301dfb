/// Service configuration loaded from environment variables.
///
/// Implementors derive `serde::Deserialize` (with `#[serde(default)]`
/// for optional fields) and call `from_env()` once at startup.
///
/// # Panics
///
/// Panics when a required env var is missing or malformed. Configuration
/// errors should stop the process before it serves traffic.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Self {
        envy::from_env().expect("failed to load config from environment")
    }
}
