// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_never_goes_backwards() {
    let clock = SystemClock;
    let t1 = clock.now();
    std::thread::sleep(Duration::from_millis(1));
    let t2 = clock.now();
    assert!(t2 > t1);
}

#[tokio::test(start_paused = true)]
async fn system_clock_follows_paused_runtime() {
    let clock = SystemClock;
    let t1 = clock.now();
    tokio::time::sleep(Duration::from_secs(3600)).await;
    let t2 = clock.now();
    assert!(t2.duration_since(t1) >= Duration::from_secs(3600));
}

#[test]
fn fake_clock_deadline_tracks_advances() {
    let clock = FakeClock::new();
    let deadline = clock.deadline(Duration::from_secs(60));
    clock.advance(Duration::from_secs(59));
    assert!(clock.now() < deadline);
    clock.advance(Duration::from_secs(1));
    assert_eq!(clock.now(), deadline);
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(Duration::from_secs(30));
    let t2 = clock1.now();
    assert!(t2.duration_since(t1) >= Duration::from_secs(30));
}

#[test]
fn deadline_saturates_instead_of_overflowing() {
    let clock = FakeClock::new();
    let far = clock.deadline(Duration::MAX);
    assert!(far > clock.now() + Duration::from_secs(86400 * 365));
    assert_eq!(saturating_add(clock.now(), Duration::MAX), far);
}

#[test]
fn saturating_add_is_exact_for_ordinary_durations() {
    let now = Instant::now();
    assert_eq!(saturating_add(now, Duration::from_secs(166)), now + Duration::from_secs(166));
}
