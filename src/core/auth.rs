//! Authorization gate
//!
//! Fixed allow-list of user ids, loaded once from configuration. Callers that
//! fail the check get no reply at all; the only trace is a warning in the log.

use std::collections::HashSet;
use tracing::warn;

use crate::models::types::{Sender, UserId};

#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    allowed: HashSet<UserId>,
}

impl AuthorizationGate {
    pub fn new(allowed: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    #[inline]
    pub fn is_authorized(&self, id: UserId) -> bool {
        self.allowed.contains(&id)
    }

    /// Check a sender and log the denial. `entry_point` names what was attempted.
    pub fn admit(&self, sender: &Sender, entry_point: &str) -> bool {
        if self.is_authorized(sender.id) {
            return true;
        }
        warn!(
            user_id = sender.id,
            user_name = %sender.display_name,
            "Access DENIED for {}",
            entry_point
        );
        false
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}
