mod engine;
mod env;
mod platform;
mod render;
mod store;
mod types;

pub use engine::{AttributionOutcome, JoinOutcome, MemberOutcome, ReferralConfig, ReferralEngine};
pub use env::ReferralEnv;
pub use platform::{InviteLinkOptions, Platform};
pub use render::{
    render, InlineButton, ProgressMessage, SHARE_PROMPT_TEXT, UNLOCKED_BUTTON_LABEL, UNLOCKED_TEXT,
};
pub use store::{
    AttributionStore, InMemoryAttributionStore, ReferralCredit, StoreError, StoreStats,
    UNLOCK_THRESHOLD,
};
pub use types::{ChatId, ChatMemberUpdate, InviteLink, MemberStatus, UserId};
