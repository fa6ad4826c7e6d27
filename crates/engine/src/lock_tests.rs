// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::WorkspaceLock;
use crate::error::OrchestratorError;

#[test]
fn second_acquire_conflicts_until_release() {
    let tmp = tempfile::tempdir().unwrap();

    let lock = WorkspaceLock::acquire(tmp.path()).unwrap();
    assert!(lock.path().exists());

    let err = WorkspaceLock::acquire(tmp.path()).unwrap_err();
    assert!(matches!(err, OrchestratorError::Conflict(_)));

    drop(lock);
    let relock = WorkspaceLock::acquire(tmp.path());
    assert!(relock.is_ok());
}
