use anyhow::{anyhow, Result};

use invitegate_common::{required_env_var, EnvVars};

use crate::ChatId;

pub struct ReferralEnv {
    pub channel_id: ChatId,
    pub private_group_url: String,
}

impl EnvVars for ReferralEnv {
    fn load() -> Result<Self> {
        let channel_id = required_env_var("CHANNEL_ID")?;
        let channel_id = channel_id
            .trim()
            .parse::<i64>()
            .map_err(|e| anyhow!("CHANNEL_ID must be a numeric chat id, got {:?}: {}", channel_id, e))?;

        Ok(Self {
            channel_id: ChatId(channel_id),
            private_group_url: required_env_var("PRIVATE_GROUP")?,
        })
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "CHANNEL_ID" => self.channel_id.to_string(),
            "PRIVATE_GROUP" => self.private_group_url.clone(),
            _ => panic!("{} is not set", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_env_load() {
        std::env::set_var("CHANNEL_ID", "-1001234567890");
        std::env::set_var("PRIVATE_GROUP", "https://t.me/+group");

        let env = ReferralEnv::load().unwrap();
        assert_eq!(env.channel_id, ChatId(-1001234567890));
        assert_eq!(env.get_env_var("CHANNEL_ID"), "-1001234567890");
        assert_eq!(env.get_env_var("PRIVATE_GROUP"), "https://t.me/+group");
    }
}
