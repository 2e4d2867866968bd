use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{InviteLink, UserId};

/// Number of distinct referrals after which a user is granted the private group.
pub const UNLOCK_THRESHOLD: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user {0} already owns an invite link")]
    AlreadyExists(UserId),
    #[error("invite link {link} is already registered to user {owner}")]
    LinkTaken { link: InviteLink, owner: UserId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferralCredit {
    /// First join credited for this `(joiner, link)` pair.
    Credited { inviter: UserId, progress: u8 },
    /// The pair was credited before; progress is unchanged.
    Duplicate { inviter: UserId, progress: u8 },
}

impl ReferralCredit {
    pub fn inviter(&self) -> UserId {
        match self {
            Self::Credited { inviter, .. } | Self::Duplicate { inviter, .. } => *inviter,
        }
    }

    pub fn progress(&self) -> u8 {
        match self {
            Self::Credited { progress, .. } | Self::Duplicate { progress, .. } => *progress,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub known_users: usize,
    pub issued_links: usize,
    pub unlocked_users: usize,
}

/// Authoritative holder of referral progress and the link <-> inviter mapping.
///
/// Every method is a single linearizable step. Implementations must never be
/// called while an outbound platform request is in flight under their lock.
pub trait AttributionStore: Send + Sync + 'static {
    fn get_or_init_progress(&self, user: UserId) -> u8;
    fn has_invite_link(&self, user: UserId) -> bool;
    fn register_invite_link(&self, user: UserId, link: InviteLink) -> Result<(), StoreError>;
    fn inviter_for(&self, link: &InviteLink) -> Option<UserId>;
    fn increment_progress(&self, user: UserId) -> u8;
    fn link_for(&self, user: UserId) -> Option<InviteLink>;

    /// Resolves `link` and credits its owner once per `(joiner, link)` pair.
    /// Returns `None` when the link was not issued by this store.
    fn credit_referral(&self, link: &InviteLink, joiner: UserId) -> Option<ReferralCredit>;

    fn stats(&self) -> StoreStats;
}

#[derive(Debug, Default)]
struct StoreState {
    progress: HashMap<UserId, u8>,
    links: HashMap<UserId, InviteLink>,
    inviters: HashMap<InviteLink, UserId>,
    credited: HashSet<(UserId, InviteLink)>,
}

impl StoreState {
    fn increment(&mut self, user: UserId) -> u8 {
        let progress = self.progress.entry(user).or_insert(0);
        *progress = progress.saturating_add(1).min(UNLOCK_THRESHOLD);
        *progress
    }
}

/// Process-local store; one mutex guards all maps so paired updates are atomic.
#[derive(Debug, Default)]
pub struct InMemoryAttributionStore {
    state: Mutex<StoreState>,
}

impl InMemoryAttributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // Every mutation completes before the guard drops, so a poisoned
        // lock still holds consistent maps.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AttributionStore for InMemoryAttributionStore {
    fn get_or_init_progress(&self, user: UserId) -> u8 {
        *self.lock().progress.entry(user).or_insert(0)
    }

    fn has_invite_link(&self, user: UserId) -> bool {
        self.lock().links.contains_key(&user)
    }

    fn register_invite_link(&self, user: UserId, link: InviteLink) -> Result<(), StoreError> {
        let mut state = self.lock();

        if state.links.contains_key(&user) {
            return Err(StoreError::AlreadyExists(user));
        }
        if let Some(owner) = state.inviters.get(&link) {
            return Err(StoreError::LinkTaken { link, owner: *owner });
        }

        state.progress.entry(user).or_insert(0);
        state.inviters.insert(link.clone(), user);
        state.links.insert(user, link);
        Ok(())
    }

    fn inviter_for(&self, link: &InviteLink) -> Option<UserId> {
        self.lock().inviters.get(link).copied()
    }

    fn increment_progress(&self, user: UserId) -> u8 {
        self.lock().increment(user)
    }

    fn link_for(&self, user: UserId) -> Option<InviteLink> {
        self.lock().links.get(&user).cloned()
    }

    fn credit_referral(&self, link: &InviteLink, joiner: UserId) -> Option<ReferralCredit> {
        let mut state = self.lock();
        let inviter = *state.inviters.get(link)?;

        if !state.credited.insert((joiner, link.clone())) {
            let progress = state.progress.get(&inviter).copied().unwrap_or(0);
            return Some(ReferralCredit::Duplicate { inviter, progress });
        }

        let progress = state.increment(inviter);
        Some(ReferralCredit::Credited { inviter, progress })
    }

    fn stats(&self) -> StoreStats {
        let state = self.lock();
        StoreStats {
            known_users: state.progress.len(),
            issued_links: state.links.len(),
            unlocked_users: state
                .progress
                .values()
                .filter(|progress| **progress >= UNLOCK_THRESHOLD)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn link(s: &str) -> InviteLink {
        InviteLink::new(format!("https://t.me/+{s}"))
    }

    #[test]
    fn test_unseen_user_defaults_to_zero() {
        let store = InMemoryAttributionStore::new();
        assert!(!store.has_invite_link(UserId(1)));
        assert_eq!(store.link_for(UserId(1)), None);
        assert_eq!(store.get_or_init_progress(UserId(1)), 0);
        assert_eq!(store.stats().known_users, 1);
    }

    #[test]
    fn test_register_keeps_both_directions_in_sync() {
        let store = InMemoryAttributionStore::new();
        store.register_invite_link(UserId(1), link("a")).unwrap();

        assert!(store.has_invite_link(UserId(1)));
        assert_eq!(store.link_for(UserId(1)), Some(link("a")));
        assert_eq!(store.inviter_for(&link("a")), Some(UserId(1)));
        assert_eq!(store.get_or_init_progress(UserId(1)), 0);
    }

    #[test]
    fn test_register_never_overwrites() {
        let store = InMemoryAttributionStore::new();
        store.register_invite_link(UserId(1), link("a")).unwrap();

        assert_eq!(
            store.register_invite_link(UserId(1), link("b")),
            Err(StoreError::AlreadyExists(UserId(1)))
        );
        assert_eq!(
            store.register_invite_link(UserId(2), link("a")),
            Err(StoreError::LinkTaken { link: link("a"), owner: UserId(1) })
        );

        assert_eq!(store.link_for(UserId(1)), Some(link("a")));
        assert_eq!(store.inviter_for(&link("b")), None);
        assert!(!store.has_invite_link(UserId(2)));
        assert_eq!(store.stats().issued_links, 1);
    }

    #[test]
    fn test_increment_clamps_at_threshold() {
        let store = InMemoryAttributionStore::new();
        assert_eq!(store.increment_progress(UserId(1)), 1);
        assert_eq!(store.increment_progress(UserId(1)), 2);
        assert_eq!(store.increment_progress(UserId(1)), 2);
        assert_eq!(store.get_or_init_progress(UserId(1)), UNLOCK_THRESHOLD);
        assert_eq!(store.stats().unlocked_users, 1);
    }

    #[test]
    fn test_credit_referral_ignores_unknown_links() {
        let store = InMemoryAttributionStore::new();
        store.register_invite_link(UserId(1), link("a")).unwrap();

        assert_eq!(store.credit_referral(&link("organic"), UserId(2)), None);
        assert_eq!(store.get_or_init_progress(UserId(1)), 0);
    }

    #[test]
    fn test_credit_referral_deduplicates_redelivery() {
        let store = InMemoryAttributionStore::new();
        store.register_invite_link(UserId(1), link("a")).unwrap();

        assert_eq!(
            store.credit_referral(&link("a"), UserId(2)),
            Some(ReferralCredit::Credited { inviter: UserId(1), progress: 1 })
        );
        assert_eq!(
            store.credit_referral(&link("a"), UserId(2)),
            Some(ReferralCredit::Duplicate { inviter: UserId(1), progress: 1 })
        );
        assert_eq!(
            store.credit_referral(&link("a"), UserId(3)),
            Some(ReferralCredit::Credited { inviter: UserId(1), progress: 2 })
        );
        assert_eq!(
            store.credit_referral(&link("a"), UserId(4)),
            Some(ReferralCredit::Credited { inviter: UserId(1), progress: 2 })
        );
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryAttributionStore::new());
        store.register_invite_link(UserId(1), link("a")).unwrap();

        let handles = (0..16)
            .map(|joiner| {
                let store = store.clone();
                std::thread::spawn(move || store.credit_referral(&link("a"), UserId(100 + joiner)))
            })
            .collect::<Vec<_>>();

        let credited = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|credit| matches!(credit, Some(ReferralCredit::Credited { .. })))
            .count();

        assert_eq!(credited, 16);
        assert_eq!(store.get_or_init_progress(UserId(1)), UNLOCK_THRESHOLD);
    }

    #[test]
    fn test_concurrent_registration_has_one_winner() {
        let store = Arc::new(InMemoryAttributionStore::new());

        let handles = (0..8)
            .map(|attempt| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.register_invite_link(UserId(1), link(&format!("attempt{attempt}")))
                })
            })
            .collect::<Vec<_>>();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(Result::is_ok)
            .count();

        assert_eq!(winners, 1);
        let owned = store.link_for(UserId(1)).unwrap();
        assert_eq!(store.inviter_for(&owned), Some(UserId(1)));
        assert_eq!(store.stats().issued_links, 1);
    }
}
