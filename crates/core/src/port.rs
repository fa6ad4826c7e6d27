// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port reservations.

use crate::event::ServerKey;
use serde::{Deserialize, Serialize};

/// A claim on a TCP port by one `(task, server)` pair.
///
/// No two live reservations share a port; releasing requires the same
/// composite key that allocated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortReservation {
    pub key: ServerKey,
    pub port: u16,
}

impl PortReservation {
    pub fn new(key: ServerKey, port: u16) -> Self {
        Self { key, port }
    }
}
