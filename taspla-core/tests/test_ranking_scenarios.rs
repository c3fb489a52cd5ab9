use chrono::{DateTime, Duration, TimeZone, Utc};
use taspla_core::{
    is_overdue, is_reminder_due, FixedClock, Priority, RankContext, Task, TaskDraft, TaskEngine,
    TaskError, TaskStatus, Tier,
};

fn today_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap()
}

fn engine() -> TaskEngine<FixedClock> {
    TaskEngine::with_clock(FixedClock::new(today_noon()))
}

fn titles(tasks: &[&Task]) -> Vec<String> {
    tasks.iter().map(|t| t.title.clone()).collect()
}

fn assert_invariants(e: &TaskEngine<FixedClock>) {
    for t in e.snapshot() {
        assert!(t.is_consistent(), "completed_at out of step with status on {}", t.id);
    }
    assert!(e.active_tasks().iter().all(|t| t.status == TaskStatus::Active));
    assert!(e.completed_tasks().iter().all(|t| t.status == TaskStatus::Completed));
    assert_eq!(e.active_tasks().len() + e.completed_tasks().len(), e.len());
}

/// Low due in 10 days, Critical due in 5, High overdue by a day.
#[test]
fn critical_then_overdue_then_rest() {
    let now = today_noon();
    let mut e = engine();
    e.create(TaskDraft::new("low", Priority::Low, now + Duration::days(10))).unwrap();
    e.create(TaskDraft::new("critical", Priority::Critical, now + Duration::days(5))).unwrap();
    e.create(TaskDraft::new("high-overdue", Priority::High, now - Duration::days(1))).unwrap();

    assert_eq!(titles(&e.active_tasks()), vec!["critical", "high-overdue", "low"]);
    assert_invariants(&e);
}

#[test]
fn two_criticals_rank_by_due() {
    let now = today_noon();
    let mut e = engine();
    e.create(TaskDraft::new("d2", Priority::Critical, now + Duration::days(4))).unwrap();
    e.create(TaskDraft::new("d1", Priority::Critical, now + Duration::days(2))).unwrap();
    e.create(TaskDraft::new("d3", Priority::Critical, now + Duration::days(6))).unwrap();

    assert_eq!(titles(&e.active_tasks()), vec!["d1", "d2", "d3"]);
}

#[test]
fn overdue_yesterday_beats_reminder_due_tomorrow() {
    let now = today_noon();
    let mut e = engine();
    e.create(
        TaskDraft::new("reminder", Priority::High, now + Duration::days(1)).with_reminder_days(1),
    )
    .unwrap();
    e.create(TaskDraft::new("yesterday", Priority::Low, now - Duration::days(1))).unwrap();

    let ranked = e.ranked_active();
    assert_eq!(ranked[0].task.title, "yesterday");
    assert_eq!(ranked[0].tier, Tier::Overdue);
    assert_eq!(ranked[1].task.title, "reminder");
    assert_eq!(ranked[1].tier, Tier::Reminder);
}

#[test]
fn due_today_without_reminder_is_not_overdue() {
    let now = today_noon();
    let mut e = engine();
    let t = e
        .create(TaskDraft::new("today", Priority::Medium, Utc.with_ymd_and_hms(2026, 2, 15, 0, 0, 0).unwrap()))
        .unwrap();

    let ctx = RankContext::utc(now);
    assert!(!is_overdue(&t, &ctx));
    assert!(!is_reminder_due(&t, &ctx));

    // Still not overdue in the last second of the day.
    e.clock().set(Utc.with_ymd_and_hms(2026, 2, 15, 23, 59, 59).unwrap());
    assert!(!e.ranked_active()[0].overdue);

    // Overdue once the date rolls over.
    e.clock().advance(Duration::seconds(1));
    assert!(e.ranked_active()[0].overdue);
}

#[test]
fn twenty_hours_out_with_day_long_reminder_is_due() {
    let now = today_noon();
    let mut e = engine();
    let t = e
        .create(TaskDraft::new("soon", Priority::Low, now + Duration::hours(20)).with_reminder_hours(24))
        .unwrap();

    let ctx = RankContext::utc(now);
    assert!(is_reminder_due(&t, &ctx));
    assert!(!is_overdue(&t, &ctx));
    assert_eq!(e.due_reminders().len(), 1);
}

#[test]
fn complete_then_restore_round_trip() {
    let now = today_noon();
    let mut e = engine();
    let t = e.create(TaskDraft::new("a", Priority::High, now + Duration::days(1))).unwrap();

    e.complete(&t.id).unwrap();
    assert_invariants(&e);
    assert!(e.active_tasks().is_empty());

    let back = e.restore(&t.id).unwrap();
    assert_eq!(back.status, TaskStatus::Active);
    assert_eq!(back.completed_at, None);
    assert_invariants(&e);
    assert_eq!(titles(&e.active_tasks()), vec!["a"]);
}

#[test]
fn removing_an_absent_id_is_a_no_op() {
    let mut e = engine();
    let t = e.create(TaskDraft::new("a", Priority::Low, today_noon())).unwrap();

    assert!(e.remove(&t.id).is_some());
    assert!(e.remove(&t.id).is_none());
    assert!(e.remove("never-existed").is_none());
    assert_eq!(e.complete(&t.id), Err(TaskError::TaskNotFound(t.id.clone())));
}

#[test]
fn ranking_is_deterministic_for_same_inputs() {
    let now = today_noon();
    let mut e = engine();
    for (i, p) in Priority::ALL.iter().cycle().take(12).enumerate() {
        let due = now + Duration::days(i as i64 % 5 - 2);
        let mut draft = TaskDraft::new(format!("t{i}"), *p, due);
        if i % 3 == 0 {
            draft = draft.with_reminder_days(3);
        }
        e.create(draft).unwrap();
    }

    let first = titles(&e.active_tasks());
    let second = titles(&e.active_tasks());
    assert_eq!(first, second);

    // Tiers never go backwards down the list.
    let tiers: Vec<Tier> = e.ranked_active().iter().map(|r| r.tier).collect();
    assert!(tiers.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn timezone_moves_the_overdue_boundary() {
    let chicago = taspla_core::time::parse_timezone("America/Chicago").unwrap();
    // 03:00 UTC on the 16th is 21:00 on the 15th in Chicago.
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 2, 16, 3, 0, 0).unwrap());
    let mut e = TaskEngine::with_clock(clock).with_timezone(chicago);

    let due = taspla_core::time::parse_due("2026-02-15", chicago).unwrap();
    e.create(TaskDraft::new("a", Priority::Medium, due)).unwrap();

    assert!(!e.ranked_active()[0].overdue);
}
