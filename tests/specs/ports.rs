// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port allocation properties over the engine allocator.

use az_adapters::FakePortProbe;
use az_core::ServerKey;
use az_engine::{OrchestratorError, PortAllocator};
use std::sync::Arc;

#[tokio::test]
async fn exhaustion_fails_with_conflict_and_no_reservation() {
    let allocator = PortAllocator::new(FakePortProbe::new(), 9000..=9001);

    let web = allocator
        .allocate(ServerKey::new("az-3", "web"))
        .await
        .unwrap();
    let api = allocator
        .allocate(ServerKey::new("az-3", "api"))
        .await
        .unwrap();
    assert_eq!((web, api), (9000, 9001));

    let err = allocator
        .allocate(ServerKey::new("az-3", "docs"))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Conflict(_)));
    assert!(allocator.get(&ServerKey::new("az-3", "docs")).is_none());
    assert_eq!(allocator.reservations().len(), 2);
}

#[tokio::test]
async fn live_reservations_never_share_a_port() {
    let allocator = Arc::new(PortAllocator::new(FakePortProbe::new(), 9100..=9139));

    // Many concurrent allocations across tasks
    let mut handles = Vec::new();
    for task in 0..8 {
        for server in ["web", "api", "docs"] {
            let allocator = Arc::clone(&allocator);
            let key = ServerKey::new(format!("az-{}", task), server);
            handles.push(tokio::spawn(
                async move { allocator.allocate(key).await },
            ));
        }
    }

    let mut ports = Vec::new();
    for handle in handles {
        ports.push(handle.await.unwrap().unwrap());
    }
    ports.sort_unstable();
    let before = ports.len();
    ports.dedup();
    assert_eq!(ports.len(), before, "duplicate port allocated");
}

#[tokio::test]
async fn release_requires_the_owning_key() {
    let allocator = PortAllocator::new(FakePortProbe::new(), 9200..=9201);
    let owner = ServerKey::new("az-1", "web");
    allocator.allocate(owner.clone()).await.unwrap();

    // A different composite key cannot release the reservation
    allocator.release(&ServerKey::new("az-2", "web"));
    allocator.release(&ServerKey::new("az-1", "api"));
    assert_eq!(allocator.get(&owner), Some(9200));

    allocator.release(&owner);
    assert!(allocator.get(&owner).is_none());
}
