use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform-assigned numeric identity of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Platform-assigned numeric identity of a chat (channel, group or private chat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// An opaque, platform-issued invite link string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteLink(pub String);

impl InviteLink {
    pub fn new(link: impl Into<String>) -> Self {
        Self(link.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for InviteLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "creator" => Some(Self::Creator),
            "administrator" => Some(Self::Administrator),
            "member" => Some(Self::Member),
            "restricted" => Some(Self::Restricted),
            "left" => Some(Self::Left),
            "kicked" => Some(Self::Kicked),
            _ => None,
        }
    }
}

/// A membership-change notification, reduced to what attribution needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMemberUpdate {
    pub chat: ChatId,
    pub subject: UserId,
    pub new_status: MemberStatus,
    pub via_invite_link: Option<InviteLink>,
}

impl ChatMemberUpdate {
    pub fn joined(chat: ChatId, subject: UserId) -> Self {
        Self {
            chat,
            subject,
            new_status: MemberStatus::Member,
            via_invite_link: None,
        }
    }

    pub fn joined_via(chat: ChatId, subject: UserId, link: InviteLink) -> Self {
        Self {
            via_invite_link: Some(link),
            ..Self::joined(chat, subject)
        }
    }

    pub fn is_join(&self) -> bool {
        self.new_status == MemberStatus::Member
    }
}
