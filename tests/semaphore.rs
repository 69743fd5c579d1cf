// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Counting semaphore contract, on the active backend.

use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use osport::{Duration, Error, NoWait, Semaphore, Task, TaskParameters};

#[test]
fn n_gives_against_max_m_satisfy_min_n_m_takes() {
    let sem = Semaphore::new(3).unwrap();
    for _ in 0..5 {
        sem.give();
    }
    let mut taken = 0;
    while sem.take(NoWait) {
        taken += 1;
    }
    assert_eq!(taken, 3);
}

#[test]
fn created_empty() {
    let sem = Semaphore::new(1).unwrap();
    assert!(!sem.take(NoWait));
}

#[test]
fn zero_maximum_is_rejected() {
    assert_eq!(Semaphore::new(0).unwrap_err(), Error::InvalidParameter);
}

#[test]
fn bounded_take_succeeds_when_a_give_arrives_in_time() {
    let sem = Arc::new(Semaphore::new(1).unwrap());
    let giver = sem.clone();
    let _task = Task::spawn("giver", TaskParameters::default(), move || {
        Task::sleep(Duration::millis(20));
        giver.give();
    })
    .unwrap();
    assert!(sem.take(Duration::millis(5000)));
}

#[test]
fn bounded_take_reports_timeout_after_the_bound() {
    let sem = Semaphore::new(1).unwrap();
    let start = Instant::now();
    assert!(!sem.take(Duration::millis(40)));
    assert!(Instant::now() - start >= StdDuration::from_millis(40));
}

#[test]
fn give_from_interrupt_context_counts() {
    let sem = Semaphore::new(2).unwrap();
    let _ = sem.give_from_isr();
    assert!(sem.take(NoWait));
    assert!(!sem.take(NoWait));
}
