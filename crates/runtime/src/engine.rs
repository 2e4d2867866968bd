use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    render, AttributionStore, ChatId, ChatMemberUpdate, InviteLink, InviteLinkOptions, Platform,
    ReferralCredit, ReferralEnv, StoreError, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralConfig {
    pub channel_id: ChatId,
    pub private_group_url: String,
}

impl From<ReferralEnv> for ReferralConfig {
    fn from(env: ReferralEnv) -> Self {
        Self {
            channel_id: env.channel_id,
            private_group_url: env.private_group_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberOutcome {
    /// The update was for another chat or was not a join.
    Ignored,
    /// First join: a personal link was created and registered.
    LinkIssued { link: InviteLink, delivered: bool },
    /// The member already owned a link; their progress was re-sent.
    AlreadyKnown { delivered: bool },
    /// The platform refused to create a link; nothing was committed.
    LinkCreationFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributionOutcome {
    /// The update was for another chat or was not a join.
    Ignored,
    NoInviteLink,
    UnknownLink,
    Credited { inviter: UserId, progress: u8, delivered: bool },
    Duplicate { inviter: UserId, progress: u8, delivered: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub member: MemberOutcome,
    pub attribution: AttributionOutcome,
}

impl JoinOutcome {
    fn ignored() -> Self {
        Self {
            member: MemberOutcome::Ignored,
            attribution: AttributionOutcome::Ignored,
        }
    }
}

/// Turns membership-change notifications into store updates and progress messages.
pub struct ReferralEngine<P: Platform, S: AttributionStore> {
    platform: P,
    store: Arc<S>,
    config: ReferralConfig,
}

impl<P: Platform, S: AttributionStore> ReferralEngine<P, S> {
    pub fn new(platform: P, store: Arc<S>, config: ReferralConfig) -> Self {
        Self { platform, store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &ReferralConfig {
        &self.config
    }

    /// Processes one notification to completion. Platform failures are logged
    /// and reported in the outcome, never returned.
    pub async fn handle(&self, update: &ChatMemberUpdate) -> JoinOutcome {
        if update.chat != self.config.channel_id {
            tracing::debug!(
                "[ReferralEngine::handle] Ignoring update for chat {} (watching {})",
                update.chat, self.config.channel_id
            );
            return JoinOutcome::ignored();
        }
        if !update.is_join() {
            tracing::debug!(
                "[ReferralEngine::handle] Ignoring {:?} transition for user {}",
                update.new_status, update.subject
            );
            return JoinOutcome::ignored();
        }

        // A brand-new member who arrived through someone's link gets their own
        // link first, then the inviter is credited.
        let member = self.on_member_joined_channel(update.subject).await;
        let attribution = match &update.via_invite_link {
            Some(link) => self.on_member_joined_via_link(update.subject, link).await,
            None => AttributionOutcome::NoInviteLink,
        };

        JoinOutcome { member, attribution }
    }

    async fn on_member_joined_channel(&self, user: UserId) -> MemberOutcome {
        if self.store.has_invite_link(user) {
            let delivered = self.send_progress(user).await;
            return MemberOutcome::AlreadyKnown { delivered };
        }

        let options = InviteLinkOptions::personal(user);
        let link = match self.platform.create_invite_link(self.config.channel_id, &options).await {
            Ok(link) => link,
            Err(e) => {
                tracing::error!(
                    "[ReferralEngine::on_member_joined_channel] Failed to create invite link for user {}: {:?}",
                    user, e
                );
                return MemberOutcome::LinkCreationFailed;
            }
        };

        match self.store.register_invite_link(user, link.clone()) {
            Ok(()) => {
                tracing::info!(
                    "[ReferralEngine::on_member_joined_channel] Issued invite link to user {}",
                    user
                );
                let delivered = self.send_progress(user).await;
                MemberOutcome::LinkIssued { link, delivered }
            }
            Err(StoreError::AlreadyExists(_)) => {
                tracing::debug!(
                    "[ReferralEngine::on_member_joined_channel] Lost link registration race for user {}, discarding {}",
                    user, link
                );
                self.discard_link(&link).await;
                let delivered = self.send_progress(user).await;
                MemberOutcome::AlreadyKnown { delivered }
            }
            Err(e @ StoreError::LinkTaken { .. }) => {
                // The string is another user's registered link; revoking it
                // would cut them off.
                tracing::error!(
                    "[ReferralEngine::on_member_joined_channel] Platform returned a link already in use: {}",
                    e
                );
                MemberOutcome::LinkCreationFailed
            }
        }
    }

    async fn on_member_joined_via_link(&self, joiner: UserId, link: &InviteLink) -> AttributionOutcome {
        let Some(credit) = self.store.credit_referral(link, joiner) else {
            tracing::debug!(
                "[ReferralEngine::on_member_joined_via_link] User {} joined via a link not issued by us",
                joiner
            );
            return AttributionOutcome::UnknownLink;
        };

        let inviter = credit.inviter();
        let progress = credit.progress();
        match credit {
            ReferralCredit::Credited { .. } => tracing::info!(
                "[ReferralEngine::on_member_joined_via_link] User {} credited for inviting {} ({}/{})",
                inviter, joiner, progress, crate::UNLOCK_THRESHOLD
            ),
            ReferralCredit::Duplicate { .. } => tracing::debug!(
                "[ReferralEngine::on_member_joined_via_link] Join of {} via {}'s link was already credited",
                joiner, inviter
            ),
        }

        let delivered = self.send_progress(inviter).await;
        match credit {
            ReferralCredit::Credited { .. } => AttributionOutcome::Credited { inviter, progress, delivered },
            ReferralCredit::Duplicate { .. } => AttributionOutcome::Duplicate { inviter, progress, delivered },
        }
    }

    /// Renders the current progress for `user` and delivers it privately.
    /// Returns whether delivery succeeded.
    async fn send_progress(&self, user: UserId) -> bool {
        let progress = self.store.get_or_init_progress(user);
        let Some(link) = self.store.link_for(user) else {
            tracing::error!(
                "[ReferralEngine::send_progress] User {} has no invite link to render",
                user
            );
            return false;
        };

        let message = render(progress, &link, &self.config.private_group_url);
        match self.platform.send_private_message(user, &message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "[ReferralEngine::send_progress] Could not message user {}: {:?}",
                    user, e
                );
                false
            }
        }
    }

    async fn discard_link(&self, link: &InviteLink) {
        if let Err(e) = self.platform.revoke_invite_link(self.config.channel_id, link).await {
            tracing::warn!(
                "[ReferralEngine::discard_link] Failed to revoke duplicate link {}: {:?}",
                link, e
            );
        }
    }
}
