use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use invitegate_common::{define_module_client, optional_env_var, required_env_var, ModuleClient};
use invitegate_runtime::{
    ChatId, ChatMemberUpdate, InviteLink, InviteLinkOptions, MemberStatus, Platform,
    ProgressMessage, UserId,
};

use crate::{ALLOWED_UPDATES, DEFAULT_TELEGRAM_API_URL, HTTP_TIMEOUT_GRACE_SECS, LONG_POLL_TIMEOUT_SECS};

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("[Telegram::{method}] request failed with code {code}: {description}")]
    Api {
        method: &'static str,
        code: i64,
        description: String,
        retry_after: Option<u64>,
    },
    #[error("[Telegram::{0}] response had no result")]
    MissingResult(&'static str),
}

/// The `{ ok, result, description, error_code }` envelope every Bot API method returns.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self, method: &'static str) -> Result<T, TelegramError> {
        if !self.ok {
            return Err(TelegramError::Api {
                method,
                code: self.error_code.unwrap_or_default(),
                description: self.description.unwrap_or_else(|| "no description".to_string()),
                retry_after: self.parameters.and_then(|p| p.retry_after),
            });
        }
        self.result.ok_or(TelegramError::MissingResult(method))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInviteLink {
    pub invite_link: String,
    pub name: Option<String>,
    #[serde(default)]
    pub creates_join_request: bool,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_revoked: bool,
    pub expire_date: Option<i64>,
    pub member_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMember {
    pub status: String,
    pub user: TelegramUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: TelegramUser,
    pub date: i64,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
    pub invite_link: Option<ChatInviteLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub chat_member: Option<ChatMemberUpdated>,
}

impl Update {
    /// Reduces a `chat_member` update to the fields attribution works on.
    /// Other update kinds and unknown statuses yield `None`.
    pub fn to_member_update(&self) -> Option<ChatMemberUpdate> {
        let updated = self.chat_member.as_ref()?;
        let new_status = MemberStatus::parse(&updated.new_chat_member.status)?;

        Some(ChatMemberUpdate {
            chat: ChatId(updated.chat.id),
            subject: UserId(updated.new_chat_member.user.id),
            new_status,
            via_invite_link: updated
                .invite_link
                .as_ref()
                .map(|link| InviteLink::new(link.invite_link.clone())),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl From<&ProgressMessage> for InlineKeyboardMarkup {
    fn from(message: &ProgressMessage) -> Self {
        Self {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: message.button.label.clone(),
                url: message.button.url.clone(),
            }]],
        }
    }
}

pub struct TelegramBot {
    http: Client,
    api_url: String,
    token: String,
}

impl TelegramBot {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_TIMEOUT_SECS + HTTP_TIMEOUT_GRACE_SECS))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    pub async fn call<P, R>(&self, method: &'static str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        // reqwest errors carry the URL, which embeds the token.
        let response = self.http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(|e| anyhow!("[Telegram::{}] request failed: {}", method, e.without_url()))?;

        let envelope = response
            .json::<ApiResponse<R>>()
            .await
            .map_err(|e| anyhow!("[Telegram::{}] invalid response body: {}", method, e.without_url()))?;

        Ok(envelope.into_result(method)?)
    }
}

define_module_client! {
    (struct TelegramClient, "telegram")
    client_type: TelegramBot,
    env: ["BOT_TOKEN"],
    setup: async {
        let token = required_env_var("BOT_TOKEN")?;
        let api_url = optional_env_var("TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL);
        TelegramBot::new(api_url, token)
    }
}

impl TelegramClient {
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.get_client().call("getMe", &json!({})).await
    }

    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut params = json!({
            "timeout": timeout_secs,
            "allowed_updates": ALLOWED_UPDATES,
        });
        if let Some(offset) = offset {
            params["offset"] = json!(offset);
        }
        self.get_client().call("getUpdates", &params).await
    }
}

#[async_trait::async_trait]
impl Platform for TelegramClient {
    async fn create_invite_link(&self, chat: ChatId, options: &InviteLinkOptions) -> Result<InviteLink> {
        let params = create_invite_link_params(chat, options);
        let link: ChatInviteLink = self.get_client().call("createChatInviteLink", &params).await?;
        Ok(InviteLink::new(link.invite_link))
    }

    async fn revoke_invite_link(&self, chat: ChatId, link: &InviteLink) -> Result<()> {
        let params = json!({
            "chat_id": chat.0,
            "invite_link": link.as_str(),
        });
        let _: ChatInviteLink = self.get_client().call("revokeChatInviteLink", &params).await?;
        Ok(())
    }

    async fn send_private_message(&self, user: UserId, message: &ProgressMessage) -> Result<()> {
        let params = send_message_params(user, message);
        let _: serde_json::Value = self.get_client().call("sendMessage", &params).await?;
        Ok(())
    }
}

fn create_invite_link_params(chat: ChatId, options: &InviteLinkOptions) -> serde_json::Value {
    let mut params = json!({
        "chat_id": chat.0,
        "name": options.name,
        "creates_join_request": options.creates_join_request,
    });
    if let Some(expire_date) = options.expire_date {
        params["expire_date"] = json!(expire_date);
    }
    if let Some(member_limit) = options.member_limit {
        params["member_limit"] = json!(member_limit);
    }
    params
}

fn send_message_params(user: UserId, message: &ProgressMessage) -> serde_json::Value {
    json!({
        "chat_id": user.0,
        "text": message.text,
        "reply_markup": InlineKeyboardMarkup::from(message),
    })
}
