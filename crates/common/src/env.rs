use anyhow::{anyhow, Result};

/// A group of environment variables owned by one crate, loaded once at startup.
pub trait EnvVars: Sized {
    fn load() -> Result<Self>;
    fn get_env_var(&self, key: &str) -> String;
}

pub fn required_env_var(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(anyhow!("{} is set but empty", key)),
        Err(_) => Err(anyhow!("{} is not set", key)),
    }
}

pub fn optional_env_var(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
