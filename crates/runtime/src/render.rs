use serde::{Deserialize, Serialize};

use crate::{InviteLink, UNLOCK_THRESHOLD};

pub const SHARE_PROMPT_TEXT: &str = "Share this channel with 2 friends to unlock the group:";
pub const UNLOCKED_TEXT: &str = "✅ You have added 2 friends! Tap below to get access.";
pub const UNLOCKED_BUTTON_LABEL: &str = "Open the group";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub label: String,
    pub url: String,
}

/// A private message carrying exactly one button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub text: String,
    pub button: InlineButton,
}

impl ProgressMessage {
    pub fn is_unlocked(&self) -> bool {
        self.button.label == UNLOCKED_BUTTON_LABEL
    }
}

/// Builds the share prompt below the threshold and the unlock message at it.
pub fn render(progress: u8, own_link: &InviteLink, unlock_url: &str) -> ProgressMessage {
    if progress < UNLOCK_THRESHOLD {
        ProgressMessage {
            text: SHARE_PROMPT_TEXT.to_string(),
            button: InlineButton {
                label: format!("Share to unlock ({progress}/{UNLOCK_THRESHOLD})"),
                url: own_link.as_str().to_string(),
            },
        }
    } else {
        ProgressMessage {
            text: UNLOCKED_TEXT.to_string(),
            button: InlineButton {
                label: UNLOCKED_BUTTON_LABEL.to_string(),
                url: unlock_url.to_string(),
            },
        }
    }
}
