// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port allocation for dev servers.
//!
//! Deterministic assignment over a configured range: the lowest port that
//! is neither reserved nor live-busy wins. Reservations are in-memory only
//! and rebuilt by scanning dev-server windows after a restart.

use crate::error::OrchestratorError;
use az_adapters::PortProbe;
use az_core::{PortReservation, ServerKey};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::ops::RangeInclusive;

/// Default range when the config does not narrow it.
pub const DEFAULT_PORT_RANGE: RangeInclusive<u16> = 3000..=3999;

/// Single arbiter for the dev-server port range.
///
/// No other component may bind a port without going through here.
pub struct PortAllocator<P> {
    probe: P,
    range: RangeInclusive<u16>,
    reservations: Mutex<IndexMap<ServerKey, u16>>,
}

impl<P: PortProbe> PortAllocator<P> {
    pub fn new(probe: P, range: RangeInclusive<u16>) -> Self {
        Self {
            probe,
            range,
            reservations: Mutex::new(IndexMap::new()),
        }
    }

    /// Reserve the lowest free port in range for `key`.
    ///
    /// Idempotent per key: a live reservation is returned as-is. Fails with
    /// `Conflict` when every port in range is reserved or live-busy.
    pub async fn allocate(&self, key: ServerKey) -> Result<u16, OrchestratorError> {
        if let Some(port) = self.get(&key) {
            return Ok(port);
        }

        for port in self.range.clone() {
            let reserved = { self.reservations.lock().values().any(|&p| p == port) };
            if reserved {
                continue;
            }
            if !self.probe.is_free(port).await {
                continue;
            }
            // Re-check under the lock: a concurrent allocate may have taken
            // this port while we were probing.
            let mut reservations = self.reservations.lock();
            if reservations.values().any(|&p| p == port) {
                continue;
            }
            tracing::debug!(%key, port, "port allocated");
            reservations.insert(key, port);
            return Ok(port);
        }

        Err(OrchestratorError::Conflict(format!(
            "no free port in {}-{} for {}",
            self.range.start(),
            self.range.end(),
            key
        )))
    }

    /// Drop a reservation. No-op when the key holds none; the port becomes
    /// reassignable once the live probe agrees it is free.
    pub fn release(&self, key: &ServerKey) {
        if self.reservations.lock().shift_remove(key).is_some() {
            tracing::debug!(%key, "port released");
        }
    }

    /// Current assignment for a key, if any.
    pub fn get(&self, key: &ServerKey) -> Option<u16> {
        self.reservations.lock().get(key).copied()
    }

    /// All live reservations, in allocation order.
    pub fn reservations(&self) -> Vec<PortReservation> {
        self.reservations
            .lock()
            .iter()
            .map(|(key, &port)| PortReservation::new(key.clone(), port))
            .collect()
    }

    /// Replace all reservations from a recovery scan.
    ///
    /// Out-of-range entries are kept: a recovered server owns whatever port
    /// it is actually bound to.
    pub fn rebuild(&self, entries: impl IntoIterator<Item = (ServerKey, u16)>) {
        let mut reservations = self.reservations.lock();
        reservations.clear();
        for (key, port) in entries {
            reservations.insert(key, port);
        }
    }
}

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod tests;
