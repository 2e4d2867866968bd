use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{ChatId, InviteLink, ProgressMessage, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteLinkOptions {
    pub name: String,
    /// Unix timestamp; `None` never expires.
    pub expire_date: Option<i64>,
    /// `None` admits an unlimited number of members.
    pub member_limit: Option<u32>,
    pub creates_join_request: bool,
}

impl InviteLinkOptions {
    /// A personal link that never expires and admits anyone who opens it.
    pub fn personal(owner: UserId) -> Self {
        Self {
            name: format!("invite_{}", owner),
            expire_date: None,
            member_limit: None,
            creates_join_request: false,
        }
    }
}

/// The messaging-platform operations the referral engine relies on.
#[async_trait::async_trait]
pub trait Platform: Send + Sync + 'static {
    async fn create_invite_link(&self, chat: ChatId, options: &InviteLinkOptions) -> Result<InviteLink>;
    async fn revoke_invite_link(&self, chat: ChatId, link: &InviteLink) -> Result<()>;
    async fn send_private_message(&self, user: UserId, message: &ProgressMessage) -> Result<()>;
}

#[async_trait::async_trait]
impl<T: Platform> Platform for std::sync::Arc<T> {
    async fn create_invite_link(&self, chat: ChatId, options: &InviteLinkOptions) -> Result<InviteLink> {
        (**self).create_invite_link(chat, options).await
    }

    async fn revoke_invite_link(&self, chat: ChatId, link: &InviteLink) -> Result<()> {
        (**self).revoke_invite_link(chat, link).await
    }

    async fn send_private_message(&self, user: UserId, message: &ProgressMessage) -> Result<()> {
        (**self).send_private_message(user, message).await
    }
}
