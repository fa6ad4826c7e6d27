// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP port probing.
//!
//! Two distinct questions: is a port *free* to allocate (a local bind
//! succeeds), and is something *serving* on it (a local connect succeeds).
//! The allocator asks the first; dev-server monitors ask the second.

use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// How long a liveness connect may take before the port counts as dead.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait PortProbe: Clone + Send + Sync + 'static {
    /// Whether a listener could be bound on the port right now.
    async fn is_free(&self, port: u16) -> bool;

    /// Whether something accepts connections on the port right now.
    async fn is_serving(&self, port: u16) -> bool;
}

/// Live TCP probe.
///
/// Binding checks IPv4 (authoritative) and IPv6 best-effort; dual-stack
/// hosts where only the v6 side is taken still fail the v6 bind, so the
/// port is correctly reported busy. IPv6-only hosts are out of scope.
#[derive(Clone, Copy, Default)]
pub struct TcpPortProbe;

impl TcpPortProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PortProbe for TcpPortProbe {
    async fn is_free(&self, port: u16) -> bool {
        let v4 = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let Ok(listener_v4) = TcpListener::bind(v4).await else {
            return false;
        };

        // A v6-only listener (e.g. a node server on `::`) does not conflict
        // with the v4 wildcard bind above, so check v6 loopback separately.
        // Binding `[::]` here would collide with our own v4 listener on
        // dual-stack hosts, hence `[::1]`.
        let v6 = SocketAddr::from((Ipv6Addr::LOCALHOST, port));
        let v6_free = match TcpListener::bind(v6).await {
            Ok(_) => true,
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => false,
            // No IPv6 support on this host; the v4 answer stands
            Err(_) => true,
        };

        drop(listener_v4);
        v6_free
    }

    async fn is_serving(&self, port: u16) -> bool {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        matches!(
            tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await,
            Ok(Ok(_))
        )
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
