//! Integration tests for playtimed
//!
//! These drive the playtime service end to end over a real SQLite store,
//! with a hand-driven clock and scheduler standing in for the host.

use chrono::{DateTime, Local, TimeZone};
use playtime_api::Sender;
use playtime_config::LimitSettings;
use playtime_core::{CoreEvent, PlaytimeService};
use playtime_host_api::{ManualClock, ManualScheduler, TimerKind};
use playtime_store::{CounterStore, SqliteKvStore};
use playtime_util::UserId;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

struct Host {
    clock: Arc<ManualClock>,
    scheduler: Arc<ManualScheduler>,
    service: PlaytimeService,
}

fn noon(day: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()
}

fn boot(db: &Path, at: DateTime<Local>, default_cap: u64) -> (Host, Vec<CoreEvent>) {
    let store = Arc::new(SqliteKvStore::open(db).unwrap());
    let clock = Arc::new(ManualClock::new(at));
    let scheduler = Arc::new(ManualScheduler::new());
    let mut service = PlaytimeService::new(
        LimitSettings {
            default_max_daily_minutes: default_cap,
            ..LimitSettings::default()
        },
        store,
        clock.clone(),
        scheduler.clone(),
    );
    let events = service.start();
    (
        Host {
            clock,
            scheduler,
            service,
        },
        events,
    )
}

impl Host {
    fn advance(&self, millis: u64) {
        self.clock.advance(Duration::from_millis(millis));
    }

    fn periodic(&mut self) -> Vec<CoreEvent> {
        let fired = self.scheduler.fire_kind(TimerKind::PeriodicCheck).unwrap();
        self.service.on_timer(fired)
    }

    fn daily(&self, user: UserId) -> u64 {
        self.service.counters().get_daily(user).unwrap()
    }

    fn total(&self, user: UserId) -> u64 {
        self.service.counters().get_total(user).unwrap()
    }
}

#[test]
fn test_single_session_is_credited() {
    let dir = tempfile::tempdir().unwrap();
    let (mut host, _) = boot(&dir.path().join("pt.db"), noon(15), 0);
    let a = UserId::new();

    host.service.on_became_active(a, "Alex");
    host.advance(125_000);
    host.service.on_became_inactive(a);

    assert_eq!(host.daily(a), 125_000);
    assert_eq!(host.total(a), 125_000);
}

#[test]
fn test_split_flush_has_no_double_count() {
    let dir = tempfile::tempdir().unwrap();
    let (mut host, _) = boot(&dir.path().join("pt.db"), noon(15), 0);
    let a = UserId::new();

    host.service.on_became_active(a, "Alex");
    host.advance(600_000);
    host.periodic();
    assert_eq!(host.total(a), 600_000);

    host.advance(300_000);
    host.service.on_became_inactive(a);

    assert_eq!(host.daily(a), 900_000);
    assert_eq!(host.total(a), 900_000);
}

#[test]
fn test_became_inactive_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (mut host, _) = boot(&dir.path().join("pt.db"), noon(15), 0);
    let a = UserId::new();

    host.service.on_became_active(a, "Alex");
    host.advance(10_000);
    host.service.on_became_inactive(a);
    host.advance(10_000);
    host.service.on_became_inactive(a);

    assert_eq!(host.daily(a), 10_000);
    assert_eq!(host.total(a), 10_000);

    // Never joined at all
    let b = UserId::new();
    host.service.on_became_inactive(b);
    assert_eq!(host.total(b), 0);
}

#[test]
fn test_total_never_decreases() {
    let dir = tempfile::tempdir().unwrap();
    let (mut host, _) = boot(&dir.path().join("pt.db"), noon(15), 0);
    let a = UserId::new();
    let mut last_total = 0;

    host.service.on_became_active(a, "Alex");
    for step in 0..20u64 {
        host.advance(17_000 + step * 1_000);
        match step % 4 {
            0 => {
                host.periodic();
            }
            1 => host.service.on_became_inactive(a),
            2 => host.service.on_became_active(a, "Alex"),
            _ => {
                // Wall clock stepped backwards
                host.clock.rewind(Duration::from_secs(5));
                host.periodic();
            }
        }
        let total = host.total(a);
        assert!(total >= last_total, "total went from {last_total} to {total}");
        last_total = total;
    }
}

#[test]
fn test_catch_up_resets_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pt.db");
    let a = UserId::new();

    {
        let (mut host, events) = boot(&db, noon(1), 0);
        assert!(events.is_empty());
        host.service.on_became_active(a, "Alex");
        host.advance(60_000);
        host.service.shutdown();
    }

    // Down for two weeks
    let (mut host, events) = boot(&db, noon(15), 0);
    assert_eq!(
        events,
        vec![CoreEvent::DailyReset {
            date: "2025-06-15".into(),
            players_reset: 1,
        }]
    );
    assert_eq!(host.daily(a), 0);
    assert_eq!(host.total(a), 60_000);

    // Accrue some time, then a second restart on the same day does not reset
    host.service.on_became_active(a, "Alex");
    host.advance(30_000);
    host.service.shutdown();
    drop(host);

    let (host, events) = boot(&db, noon(15), 0);
    assert!(events.is_empty());
    assert_eq!(host.daily(a), 30_000);
    assert_eq!(host.total(a), 90_000);
}

#[test]
fn test_timer_driven_reset_keeps_totals() {
    let dir = tempfile::tempdir().unwrap();
    let (mut host, _) = boot(&dir.path().join("pt.db"), noon(15), 0);
    let a = UserId::new();
    let b = UserId::new();

    for (user, name) in [(a, "Alex"), (b, "Blake")] {
        host.service.on_became_active(user, name);
        host.advance(45_000);
        host.service.on_became_inactive(user);
    }

    host.clock.set(Local.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap());
    let fired = host.scheduler.fire_kind(TimerKind::DailyReset).unwrap();
    let events = host.service.on_timer(fired);

    assert_eq!(events.len(), 1);
    for user in [a, b] {
        assert_eq!(host.daily(user), 0);
        assert_eq!(host.total(user), 45_000);
    }
    assert_eq!(host.scheduler.count(TimerKind::DailyReset), 1);
}

#[test]
fn test_cap_boundary_is_whole_minutes() {
    let dir = tempfile::tempdir().unwrap();
    let (mut host, _) = boot(&dir.path().join("pt.db"), noon(15), 30);
    let a = UserId::new();

    host.service.on_became_active(a, "Alex");
    host.advance(1_794_000); // 29.9 minutes
    assert!(host.periodic().is_empty());

    host.advance(6_000);
    let events = host.periodic();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        CoreEvent::LimitExceeded { user, daily_minutes: 30, max_daily_minutes: 30, message, .. }
            if *user == a && message == "You have reached your daily playtime limit of 30 minutes."
    ));

    // Still over on the next cycle, one signal per check
    host.advance(60_000);
    assert_eq!(host.periodic().len(), 1);

    // Host ends the session; the leave that follows is harmless
    host.service.on_became_inactive(a);
    host.service.on_became_inactive(a);
    assert_eq!(host.daily(a), 1_860_000);
}

#[test]
fn test_zero_cap_never_fires() {
    let dir = tempfile::tempdir().unwrap();
    let (mut host, _) = boot(&dir.path().join("pt.db"), noon(15), 0);
    let a = UserId::new();

    host.service.on_became_active(a, "Alex");
    for _ in 0..30 {
        host.advance(60 * 60_000);
        assert!(host.periodic().is_empty());
    }
}

#[test]
fn test_sixty_minute_cap_reached_by_periodic_checks() {
    let dir = tempfile::tempdir().unwrap();
    let (mut host, _) = boot(&dir.path().join("pt.db"), noon(15), 60);
    let a = UserId::new();

    host.service.on_became_active(a, "Alex");
    let mut first_signal = None;
    for minute in 1..=61u64 {
        host.advance(60_000);
        let events = host.periodic();
        if !events.is_empty() && first_signal.is_none() {
            first_signal = Some(minute);
        }
        if minute == 61 {
            assert!(matches!(
                events.as_slice(),
                [CoreEvent::LimitExceeded { daily_minutes: 61, .. }]
            ));
        }
    }
    assert_eq!(first_signal, Some(60));
}

#[test]
fn test_join_check_flags_user_already_over() {
    let dir = tempfile::tempdir().unwrap();
    let (mut host, _) = boot(&dir.path().join("pt.db"), noon(15), 1);
    let a = UserId::new();

    host.service.on_became_active(a, "Alex");
    host.advance(90_000);
    host.service.on_became_inactive(a);

    // Rejoins the same day
    host.service.on_became_active(a, "Alex");
    host.advance(1_000);
    let fired = host.scheduler.fire_kind(TimerKind::JoinCheck(a)).unwrap();
    let events = host.service.on_timer(fired);

    assert!(matches!(
        events.as_slice(),
        [CoreEvent::LimitExceeded { daily_minutes: 1, .. }]
    ));
}

#[test]
fn test_shutdown_flush_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pt.db");
    let a = UserId::new();
    let b = UserId::new();

    {
        let (mut host, _) = boot(&db, noon(15), 0);
        host.service.on_became_active(a, "Alex");
        host.service.on_became_active(b, "Blake");
        host.advance(42_000);
        host.service.shutdown();
        assert!(host.scheduler.active().is_empty());
    }

    let counters = CounterStore::new(Arc::new(SqliteKvStore::open(&db).unwrap()));
    assert_eq!(counters.get_total(a).unwrap(), 42_000);
    assert_eq!(counters.get_total(b).unwrap(), 42_000);
    assert_eq!(counters.get_name(b).unwrap().as_deref(), Some("Blake"));
}

#[test]
fn test_cap_set_by_command_persists() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pt.db");

    {
        let (mut host, _) = boot(&db, noon(15), 0);
        let reply = host
            .service
            .handle_command(&Sender::Console, "playLimit", &["set", "25"])
            .unwrap();
        assert_eq!(reply, vec!["Daily playtime limit set to 25 minutes."]);
    }

    // Stored cap beats the configured default
    let (host, _) = boot(&db, noon(15), 90);
    assert_eq!(host.service.counters().get_cap().unwrap(), 25);
}
