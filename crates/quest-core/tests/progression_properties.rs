use contracts::SubmissionOutcome;
use proptest::prelude::*;
use quest_core::progression::{apply_submission, default_player, reward_for};
use quest_core::scorer::ScoreReport;
use quest_core::Catalog;

fn report(passed: usize, total: usize) -> ScoreReport {
    ScoreReport {
        passed,
        total,
        fault: None,
    }
}

proptest! {
    #[test]
    fn accuracy_is_exactly_passed_over_total_and_in_unit_range(
        total in 1_usize..=12,
        passed_seed in 0_usize..=12,
    ) {
        let passed = passed_seed.min(total);
        let accuracy = report(passed, total).accuracy();
        prop_assert!((0.0..=1.0).contains(&accuracy));
        prop_assert_eq!(accuracy, passed as f64 / total as f64);
    }

    #[test]
    fn reward_never_exceeds_the_full_scaled_reward(
        problem_index in 0_usize..11,
        passed_seed in 0_usize..=6,
        total in 1_usize..=6,
    ) {
        let catalog = Catalog::builtin();
        let problem = &catalog.problems()[problem_index];
        let accuracy = report(passed_seed.min(total), total).accuracy();

        let reward = reward_for(problem, accuracy);
        let ceiling = (problem.base_reward as f64 * problem.difficulty.multiplier()).floor() as u64;
        prop_assert!(reward <= ceiling);
        prop_assert_eq!(
            reward,
            (problem.base_reward as f64 * problem.difficulty.multiplier() * accuracy).floor() as u64
        );
    }

    #[test]
    fn mastery_is_monotone_and_capped_over_any_submission_sequence(
        outcomes in prop::collection::vec((0_usize..11, 0_usize..=4), 1..40),
    ) {
        let catalog = Catalog::builtin();
        let mut record = default_player(&catalog);
        let mut previous = record.mastery.clone();

        for (problem_index, passed) in outcomes {
            let problem = catalog.problems()[problem_index].clone();
            apply_submission(&catalog, &mut record, &problem, &report(passed, 4));

            for (zone_id, gauge) in &record.mastery {
                prop_assert!(*gauge <= 100);
                prop_assert!(previous.get(zone_id).copied().unwrap_or(0) <= *gauge);
            }
            previous = record.mastery.clone();
        }
    }

    #[test]
    fn rejected_submissions_never_mutate_the_record(
        problem_index in 0_usize..11,
        passed in 0_usize..=1,
    ) {
        // At most 1 of 4 passed: always below the acceptance threshold.
        let catalog = Catalog::builtin();
        let mut record = default_player(&catalog);
        let problem = catalog.problems()[problem_index].clone();
        let before = record.clone();

        let outcome = apply_submission(&catalog, &mut record, &problem, &report(passed, 4));
        let is_rejected = matches!(outcome, SubmissionOutcome::Rejected { .. });
        prop_assert!(is_rejected);
        prop_assert_eq!(record, before);
    }

    #[test]
    fn solved_set_only_grows(
        outcomes in prop::collection::vec((0_usize..11, 0_usize..=4), 1..40),
    ) {
        let catalog = Catalog::builtin();
        let mut record = default_player(&catalog);
        let mut previous = record.solved.clone();

        for (problem_index, passed) in outcomes {
            let problem = catalog.problems()[problem_index].clone();
            apply_submission(&catalog, &mut record, &problem, &report(passed, 4));

            prop_assert!(previous.is_subset(&record.solved));
            previous = record.solved.clone();
        }
    }

    #[test]
    fn accuracy_history_stays_in_unit_range(
        outcomes in prop::collection::vec((0_usize..11, 0_usize..=4), 1..40),
    ) {
        let catalog = Catalog::builtin();
        let mut record = default_player(&catalog);

        for (problem_index, passed) in outcomes {
            let problem = catalog.problems()[problem_index].clone();
            apply_submission(&catalog, &mut record, &problem, &report(passed, 4));
            prop_assert!((0.0..=1.0).contains(&record.accuracy));
        }
    }
}
