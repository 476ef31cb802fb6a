use super::*;

// --- Clocks ---

#[test]
fn test_manual_clock_moves_only_when_told() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_millis(), 1_000);
    assert_eq!(clock.advance(Duration::from_millis(250)), 1_250);
    assert_eq!(clock.now_millis(), 1_250);
    clock.set(10);
    assert_eq!(clock.now_millis(), 10);
}

#[test]
fn test_manual_clock_clones_share_time() {
    let clock = ManualClock::new(0);
    let shared = clock.clone();
    clock.advance(Duration::from_secs(1));
    assert_eq!(shared.now_millis(), 1_000);
}

#[test]
fn test_time_millis_is_in_the_future() {
    let before = current_processing_time_ms();
    let deadline = time_millis(Duration::from_secs(60));
    assert!(deadline >= before + 60_000);
}

#[test]
fn test_duration_millis_saturates() {
    assert_eq!(duration_millis(Duration::from_millis(42)), 42);
    assert_eq!(duration_millis(Duration::MAX), EventTime::MAX);
}

// --- TimerService ---

#[test]
fn test_timer_register_and_drain_due() {
    let mut timers = TimerService::new();
    timers.register("window", 100);
    timers.register("other", 50);
    assert_eq!(timers.len(), 2);
    assert_eq!(timers.next_timer(), Some(50));

    assert!(timers.drain_due(49).is_empty());
    assert_eq!(timers.drain_due(100), vec![
        ("other".to_string(), 50),
        ("window".to_string(), 100),
    ]);
    assert!(timers.is_empty());
    assert_eq!(timers.next_timer(), None);
}

#[test]
fn test_timer_reregister_replaces_deadline() {
    let mut timers = TimerService::new();
    timers.register("window", 100);
    timers.register("window", 300);
    assert_eq!(timers.len(), 1);
    assert_eq!(timers.deadline("window"), Some(300));
    assert!(timers.drain_due(200).is_empty());
    assert_eq!(timers.drain_due(300), vec![("window".to_string(), 300)]);
}

#[test]
fn test_timer_equal_deadlines_fire_by_name() {
    let mut timers = TimerService::new();
    timers.register("b", 10);
    timers.register("a", 10);
    let fired: Vec<_> = timers.drain_due(10).into_iter().map(|(name, _)| name).collect();
    assert_eq!(fired, vec!["a", "b"]);
}

#[test]
fn test_timer_delete() {
    let mut timers = TimerService::new();
    timers.register("window", 100);
    timers.delete("window");
    timers.delete("missing");
    assert!(timers.is_empty());
    assert!(timers.drain_due(1_000).is_empty());
}
