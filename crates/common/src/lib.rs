mod client;
mod env;

pub use client::ModuleClient;
pub use env::{optional_env_var, required_env_var, EnvVars};

#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use async_trait;
    pub use tracing;
}
