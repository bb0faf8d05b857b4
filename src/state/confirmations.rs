//! Confirmation tickets for risky actions
//!
//! A ticket snapshots an order draft awaiting approval. Tickets expire after a
//! TTL; expiry is enforced lazily, every registry operation first purges all
//! expired tickets. There is no background sweep.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use super::random_id;

/// Default ticket lifetime (1 hour)
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Shortest TTL accepted at the tool boundary
pub const MIN_TTL_SECONDS: u64 = 30;

/// Longest TTL accepted at the tool boundary (24 hours)
pub const MAX_TTL_SECONDS: u64 = 86_400;

const ID_LENGTH: usize = 12;

/// A pending confirmation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationTicket {
    pub id: String,
    pub draft: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ConfirmationTicket {
    /// A ticket is visible strictly before `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-memory registry of confirmation tickets
#[derive(Debug, Default)]
pub struct ConfirmationRegistry {
    tickets: Mutex<HashMap<String, ConfirmationTicket>>,
}

impl ConfirmationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new ticket with a fresh random id
    ///
    /// `ttl_seconds` defaults to one hour. Range checks belong to the caller.
    pub fn create(
        &self,
        draft: Map<String, Value>,
        reason: Option<String>,
        ttl_seconds: Option<u64>,
    ) -> ConfirmationTicket {
        let ttl = ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS);
        let created_at = Utc::now();
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut tickets = self.tickets.lock();
        purge_expired(&mut tickets, created_at);

        let mut id = random_id(ID_LENGTH);
        while tickets.contains_key(&id) {
            id = random_id(ID_LENGTH);
        }

        let ticket = ConfirmationTicket {
            id: id.clone(),
            draft,
            reason,
            created_at,
            expires_at,
        };
        tickets.insert(id, ticket.clone());

        debug!(confirmation_id = %ticket.id, ttl_secs = ttl, "Created confirmation ticket");
        ticket
    }

    /// Looks up a ticket, treating an expired one as absent
    pub fn get(&self, id: &str) -> Option<ConfirmationTicket> {
        let now = Utc::now();
        let mut tickets = self.tickets.lock();
        purge_expired(&mut tickets, now);
        tickets.get(id).cloned()
    }

    /// All live tickets, oldest first
    pub fn list(&self) -> Vec<ConfirmationTicket> {
        let now = Utc::now();
        let mut tickets = self.tickets.lock();
        purge_expired(&mut tickets, now);

        let mut live: Vec<ConfirmationTicket> = tickets.values().cloned().collect();
        live.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        live
    }

    /// Number of resident tickets, expired or not
    pub fn resident_count(&self) -> usize {
        self.tickets.lock().len()
    }
}

fn purge_expired(tickets: &mut HashMap<String, ConfirmationTicket>, now: DateTime<Utc>) {
    let before = tickets.len();
    tickets.retain(|_, ticket| !ticket.is_expired_at(now));

    let purged = before - tickets.len();
    if purged > 0 {
        debug!(purged, "Purged expired confirmation tickets");
    }
}
