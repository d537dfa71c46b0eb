// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;

fn every_event() -> Vec<Event> {
    let semaphore = SemaphoreId::new("host:a:script-1");
    let permit = PermitId::new("permit-1");
    let id = TaskId("task-1".to_string());
    vec![
        Event::PermitGranted {
            semaphore: semaphore.clone(),
            permit: permit.clone(),
            available: 1,
        },
        Event::PermitDenied {
            semaphore: semaphore.clone(),
            capacity: 2,
        },
        Event::PermitRenewed {
            semaphore: semaphore.clone(),
            permit: permit.clone(),
        },
        Event::PermitRenewRejected {
            semaphore: semaphore.clone(),
            permit: permit.clone(),
        },
        Event::PermitReleased {
            semaphore: semaphore.clone(),
            permit: permit.clone(),
            available: 2,
        },
        Event::PermitExpired {
            semaphore,
            permit: permit.clone(),
        },
        Event::TaskAcquired {
            id: id.clone(),
            permit,
        },
        Event::TaskRunning { id: id.clone() },
        Event::TaskReleasing {
            id: id.clone(),
            cause: ReleaseCause::Completed,
        },
        Event::TaskDone { id: id.clone() },
        Event::TaskAbandoned {
            id: id.clone(),
            reason: AbandonReason::NoSlot,
        },
        Event::TaskFailed {
            id,
            cause: ReleaseCause::LifetimeExceeded,
        },
    ]
}

#[test]
fn names_are_unique_and_namespaced() {
    let events = every_event();
    let names: HashSet<&str> = events.iter().map(Event::name).collect();

    assert_eq!(names.len(), events.len());
    for name in names {
        assert!(
            name.starts_with("permit:") || name.starts_with("task:"),
            "unexpected event name {}",
            name
        );
    }
}

#[test]
fn logging_without_a_subscriber_is_harmless() {
    for event in every_event() {
        event.log();
    }
}
