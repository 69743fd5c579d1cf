// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Mutex contract, on the active backend.

use std::sync::Arc;

use osport::sync;
use osport::{Duration, Mutex, Task, TaskParameters};

#[test]
fn created_released_and_immediately_acquirable() {
    let mutex = Mutex::new().unwrap();
    mutex.lock();
    mutex.unlock();
    // The round trip leaves the mutex acquirable again.
    mutex.lock();
    mutex.unlock();
}

#[test]
fn try_lock_fails_while_held_and_recovers() {
    let mutex = Mutex::new().unwrap();
    assert!(mutex.try_lock());
    assert!(!mutex.try_lock());
    mutex.unlock();
    assert!(mutex.try_lock());
    mutex.unlock();
}

#[test]
fn guarded_mutex_serializes_tasks() {
    let counter = Arc::new(sync::Mutex::new(0u32).unwrap());
    let mut tasks = Vec::new();
    for i in 0..4 {
        let counter = counter.clone();
        tasks.push(
            Task::spawn(&format!("bump-{}", i), TaskParameters::default(), move || {
                for _ in 0..100 {
                    let mut value = counter.lock().unwrap();
                    let read = *value;
                    Task::yield_now();
                    *value = read + 1;
                }
            })
            .unwrap(),
        );
    }
    // Tasks are detached; poll until they are all done.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
    loop {
        if *counter.lock().unwrap() == 400 {
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "tasks did not finish in time"
        );
        Task::sleep(Duration::millis(10));
    }
}
