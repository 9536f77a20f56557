// ABOUTME: Anti-forgery state cache for in-flight OAuth login attempts
// ABOUTME: TTL-bounded, single-use entries with atomic consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campus Assistant Contributors

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;

/// How long an issued state stays valid
const STATE_TTL_MINUTES: i64 = 10;
/// Raw entropy per state value, before encoding
const STATE_BYTES: usize = 32;

#[derive(Debug, Clone)]
struct StateEntry {
    expires_at: DateTime<Utc>,
}

/// Cache of state parameters for login flows that have started but not yet
/// returned through the callback.
///
/// Entries are single-use: [`consume`](Self::consume) removes the entry in
/// the same operation that checks it, so two callbacks racing on the same
/// state agree on exactly one winner. Expired entries are swept whenever a
/// new state is issued.
pub struct StateCache {
    entries: DashMap<String, StateEntry>,
    ttl: Duration,
}

impl StateCache {
    /// Create a cache with the standard 10 minute TTL
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(STATE_TTL_MINUTES))
    }

    /// Create a cache with a custom TTL
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Generate a fresh state value and register it.
    ///
    /// The value carries 256 bits of OS entropy, URL-safe base64 encoded
    /// without padding, and is registered before this method returns.
    #[must_use]
    pub fn issue(&self) -> String {
        let mut bytes = [0u8; STATE_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let state = general_purpose::URL_SAFE_NO_PAD.encode(bytes);

        let now = Utc::now();
        self.entries.insert(
            state.clone(),
            StateEntry {
                expires_at: now + self.ttl,
            },
        );

        // Opportunistic cleanup so abandoned logins cannot accumulate
        self.entries.retain(|_, entry| entry.expires_at > now);

        state
    }

    /// Check a state value and spend it.
    ///
    /// Returns `true` only for a state that was issued here, has not been
    /// consumed before, and has not expired. The entry is removed either
    /// way, so a replayed value always fails.
    #[must_use]
    pub fn consume(&self, state: &str) -> bool {
        self.entries
            .remove(state)
            .is_some_and(|(_, entry)| entry.expires_at > Utc::now())
    }

    /// Number of states currently outstanding
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no login flows are in flight
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new()
    }
}
