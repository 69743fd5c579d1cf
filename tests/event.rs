// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Auto-reset event contract, on the active backend.

use std::time::{Duration as StdDuration, Instant};

use osport::{Duration, Event, Forever, NoWait, Task, TaskParameters};

#[test]
fn one_set_satisfies_exactly_one_wait() {
    let event = Event::new().unwrap();
    event.set();
    assert!(event.wait(Forever));
    // The signal was consumed by the first wait.
    assert!(!event.wait(NoWait));
}

#[test]
fn no_wait_never_blocks() {
    let event = Event::new().unwrap();
    let start = Instant::now();
    assert!(!event.wait(NoWait));
    assert!(Instant::now() - start < StdDuration::from_secs(1));
}

#[test]
fn bounded_wait_times_out_without_a_signal() {
    let event = Event::new().unwrap();
    let start = Instant::now();
    assert!(!event.wait(Duration::millis(50)));
    assert!(Instant::now() - start >= StdDuration::from_millis(50));
}

#[test]
fn bounded_wait_observes_an_earlier_signal_immediately() {
    let event = Event::new().unwrap();
    event.set();
    let start = Instant::now();
    assert!(event.wait(Duration::millis(5000)));
    assert!(Instant::now() - start < StdDuration::from_secs(5));
}

#[test]
fn infinite_wait_returns_once_a_signal_arrives() {
    let event = std::sync::Arc::new(Event::new().unwrap());
    let setter = event.clone();
    let _task = Task::spawn("setter", TaskParameters::default(), move || {
        Task::sleep(Duration::millis(20));
        setter.set();
    })
    .unwrap();
    assert!(event.wait(Forever));
}

#[test]
fn signal_from_interrupt_context_wakes_a_waiter() {
    let event = Event::new().unwrap();
    let _ = event.set_from_isr();
    assert!(event.wait(NoWait));
}

#[test]
fn reset_discards_a_pending_signal() {
    let event = Event::new().unwrap();
    event.set();
    event.reset();
    assert!(!event.wait(NoWait));
}

#[test]
fn reset_on_a_nonsignaled_event_is_harmless() {
    let event = Event::new().unwrap();
    event.reset();
    event.set();
    assert!(event.wait(NoWait));
}
