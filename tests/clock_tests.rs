use cloudpelican::clock::{epoch_millis, Clock, ManualClock, SystemClock};
use std::thread;
use std::time::Duration;

#[test]
fn test_system_clock_monotonic_enough() {
    let clock = SystemClock;
    let first = clock.now_millis();
    thread::sleep(Duration::from_millis(5));
    let second = clock.now_millis();
    assert!(second >= first, "Wall clock should not run backwards across a short sleep");
}

#[test]
fn test_system_clock_is_epoch_millis() {
    let before = epoch_millis();
    let now = SystemClock.now_millis();
    let after = epoch_millis();
    assert!(before <= now && now <= after);
}

#[test]
fn test_manual_clock_moves_only_when_told() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_millis(), 1_000);
    thread::sleep(Duration::from_millis(2));
    assert_eq!(clock.now_millis(), 1_000);

    clock.advance(250);
    assert_eq!(clock.now_millis(), 1_250);

    clock.set(42);
    assert_eq!(clock.now_millis(), 42);
}

#[test]
fn test_manual_clock_shared_across_threads() {
    let clock = std::sync::Arc::new(ManualClock::new(0));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let clock = clock.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    clock.advance(1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(clock.now_millis(), 400);
}
