use anyhow::{anyhow, Result};

use invitegate_common::{optional_env_var, EnvVars};

pub const DEFAULT_PORT: u16 = 3033;

pub struct ApiServerEnv {
    pub port: u16,
}

impl EnvVars for ApiServerEnv {
    fn load() -> Result<Self> {
        let port = optional_env_var("PORT", &DEFAULT_PORT.to_string());
        let port = port
            .parse()
            .map_err(|e| anyhow!("PORT must be a valid port number, got {:?}: {}", port, e))?;

        Ok(Self { port })
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "PORT" => self.port.to_string(),
            _ => panic!("{} is not set", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_server_env_load() {
        std::env::remove_var("PORT");
        let env = ApiServerEnv::load().unwrap();
        assert_eq!(env.port, DEFAULT_PORT);

        std::env::set_var("PORT", "8080");
        let env = ApiServerEnv::load().unwrap();
        assert_eq!(env.port, 8080);
        assert_eq!(env.get_env_var("PORT"), "8080");

        std::env::set_var("PORT", "not-a-port");
        assert!(ApiServerEnv::load().is_err());

        std::env::set_var("PORT", "70000");
        assert!(ApiServerEnv::load().is_err());

        std::env::remove_var("PORT");
    }
}
