//! Property tests for the scoring, ledger and challenge invariants.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use waterprint_core::ledger::{CompletedTask, ProgressPoint};
use waterprint_core::survey::{tally, ActionOption, NeutralOption};
use waterprint_core::{
    AnswerOption, CategoryCatalog, CategoryId, ChallengeProgressTracker, ChallengeStatus, Database,
    SessionState, SessionStore, WaterFootprintLedger, WaterprintProfile,
};

const CATEGORIES: [&str; 4] = ["Shower", "Dishwashing", "Laundry", "Toilet"];

/// Whole-liter values keep float sums exact in any order.
fn arb_liters() -> impl Strategy<Value = f64> {
    (0u32..200).prop_map(f64::from)
}

fn arb_action() -> impl Strategy<Value = ActionOption> {
    (arb_liters(), arb_liters(), 0..CATEGORIES.len()).prop_map(|(total, saving, c)| ActionOption {
        text: format!("{total}/{saving}"),
        value_total: total,
        value_saving: saving,
        category: CategoryId::from(CATEGORIES[c]),
        task: "do better".into(),
    })
}

fn arb_option() -> impl Strategy<Value = AnswerOption> {
    prop_oneof![
        arb_action().prop_map(AnswerOption::Task),
        arb_action().prop_map(AnswerOption::Achievement),
        (arb_liters(), arb_liters()).prop_map(|(total, saving)| {
            AnswerOption::Neutral(NeutralOption {
                text: "neutral".into(),
                value_total: total,
                value_saving: saving,
            })
        }),
    ]
}

/// Any finite double, drawn from raw bit patterns.
fn arb_finite_f64() -> impl Strategy<Value = f64> {
    any::<u64>()
        .prop_map(f64::from_bits)
        .prop_filter("finite", |v| v.is_finite())
}

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + Duration::days(i64::from(offset))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Totals are plain sums of the chosen options, whatever the order.
    #[test]
    fn prop_totals_are_sums(options in prop::collection::vec(arb_option(), 1..20)) {
        let now = Utc::now();
        let result = tally(&options, now);

        let total: f64 = options.iter().map(|o| o.value_total()).sum();
        let saving: f64 = options.iter().map(|o| o.value_saving()).sum();
        prop_assert_eq!(result.total_usage, total);
        prop_assert_eq!(result.total_saving, saving);

        let reversed: Vec<_> = options.iter().rev().cloned().collect();
        let again = tally(&reversed, now);
        prop_assert_eq!(again.total_usage, result.total_usage);
        prop_assert_eq!(again.total_saving, result.total_saving);
    }

    /// Improvement areas list each Task category once, in first-seen order.
    #[test]
    fn prop_improvement_areas_first_seen(options in prop::collection::vec(arb_option(), 1..20)) {
        let result = tally(&options, Utc::now());

        let mut expected: Vec<CategoryId> = Vec::new();
        for option in &options {
            if let AnswerOption::Task(o) = option {
                if !expected.contains(&o.category) {
                    expected.push(o.category.clone());
                }
            }
        }
        prop_assert_eq!(&result.improvement_areas, &expected);

        let tasks = options.iter().filter(|o| matches!(o, AnswerOption::Task(_))).count();
        let achievements = options.iter().filter(|o| matches!(o, AnswerOption::Achievement(_))).count();
        prop_assert_eq!(result.tasks.len(), tasks);
        prop_assert_eq!(result.achievements.len(), achievements);
    }

    /// Achievement improvements never exceed their option's total or drop below zero.
    #[test]
    fn prop_achievement_improvement_bounded(options in prop::collection::vec(arb_option(), 1..20)) {
        let result = tally(&options, Utc::now());
        let achieved = options.iter().filter_map(|o| match o {
            AnswerOption::Achievement(a) => Some(a),
            _ => None,
        });
        for (achievement, option) in result.achievements.iter().zip(achieved) {
            prop_assert!(achievement.improvement >= 0.0);
            prop_assert!(achievement.improvement <= option.value_total);
        }
    }

    /// Footprint after any completions is the initial value minus their sum,
    /// however the completions are split across calls.
    #[test]
    fn prop_ledger_folds_associatively(
        initial in arb_liters(),
        reductions in prop::collection::vec(arb_liters(), 0..15),
        split in 0usize..15,
    ) {
        let ledger = WaterFootprintLedger::new();
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let profile = ledger.create_profile(initial, start);

        let mut current = profile.clone();
        for (i, r) in reductions.iter().enumerate() {
            let at = start + Duration::hours(i as i64);
            current = ledger.apply_task_completion(Some(&current), &format!("t{i}"), *r, at).unwrap();
        }

        let split = split.min(reductions.len());
        let (head, tail) = reductions.split_at(split);
        let head_sum: f64 = head.iter().sum();
        let tail_sum: f64 = tail.iter().sum();
        let expected = initial - (head_sum + tail_sum);

        prop_assert_eq!(current.current_waterprint, expected);
        prop_assert_eq!(current.completed_tasks.len(), reductions.len());
        prop_assert_eq!(current.progress_history.len(), reductions.len() + 1);
        prop_assert_eq!(current.initial_waterprint, initial);
        prop_assert!(current
            .progress_history
            .windows(2)
            .all(|w| w[0].date <= w[1].date));
    }

    /// Any in-cap week is accepted and ends Completed with the exact percentage.
    #[test]
    fn prop_in_cap_week_completes(saved in prop::collection::vec(0u32..=5, 7)) {
        let tracker = ChallengeProgressTracker::default();
        let shower = CategoryId::from("Shower");
        let mut challenge = tracker.start(shower, day(0)).unwrap();
        for (i, s) in saved.iter().enumerate() {
            let n = i as u32;
            challenge = tracker
                .record_daily_action(&challenge, n + 1, f64::from(*s), day(n))
                .unwrap();
        }

        let total: u32 = saved.iter().sum();
        prop_assert_eq!(challenge.status, ChallengeStatus::Completed);
        prop_assert_eq!(challenge.total_saved(), f64::from(total));
        prop_assert_eq!(challenge.completion_percentage(), f64::from(total) / 35.0 * 100.0);
        prop_assert_eq!(challenge.running_totals().last().copied(), Some(f64::from(total)));
    }

    /// Any saving above the category cap is rejected without changing the challenge.
    #[test]
    fn prop_above_cap_rejected(excess in 1u32..1000, category in 0..CATEGORIES.len()) {
        let catalog = CategoryCatalog::builtin();
        let tracker = ChallengeProgressTracker::default();
        let id = CategoryId::from(CATEGORIES[category]);
        let cap = catalog.daily_cap(&id).unwrap();
        let challenge = tracker.start(id, day(0)).unwrap();

        let saved = cap + f64::from(excess) / 10.0;
        prop_assert!(tracker.record_daily_action(&challenge, 1, saved, day(0)).is_err());
        prop_assert!(challenge.daily_actions.is_empty());
    }

    /// Stored footprints come back bit-for-bit.
    #[test]
    fn prop_session_snapshot_keeps_float_bits(
        initial in arb_finite_f64(),
        current in arb_finite_f64(),
        reduction in arb_finite_f64(),
    ) {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let state = SessionState {
            profile: Some(WaterprintProfile {
                initial_waterprint: initial,
                current_waterprint: current,
                completed_tasks: vec![CompletedTask {
                    task_id: "t1".into(),
                    waterprint_reduction: reduction,
                    completion_date: at,
                }],
                progress_history: vec![ProgressPoint { date: at, waterprint: current }],
            }),
            ..SessionState::default()
        };

        let mut db = Database::open_memory().unwrap();
        db.save(&state).unwrap();
        let loaded = db.load().unwrap().profile.unwrap();

        prop_assert_eq!(loaded.initial_waterprint.to_bits(), initial.to_bits());
        prop_assert_eq!(loaded.current_waterprint.to_bits(), current.to_bits());
        prop_assert_eq!(
            loaded.completed_tasks[0].waterprint_reduction.to_bits(),
            reduction.to_bits()
        );
        prop_assert_eq!(loaded.progress_history[0].waterprint.to_bits(), current.to_bits());
    }
}
