//! The progression model: pure transforms of the player record driven by
//! scored submissions and answered MCQs.

use contracts::{McqDefinition, McqOutcome, PlayerRecord, ProblemDefinition, SubmissionOutcome};

use crate::catalog::Catalog;
use crate::explain;
use crate::scorer::ScoreReport;

/// Minimum accuracy for a submission to be accepted.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.5;

pub const MASTERY_CAP: u8 = 100;

// Four consecutive perfect solves drive a zone to full mastery.
const MASTERY_PER_PERFECT_SOLVE: f64 = 25.0;

const MCQ_REJECTION_TEXT: &str = "Not quite. Study more.";

pub fn reward_for(problem: &ProblemDefinition, accuracy: f64) -> u64 {
    (problem.base_reward as f64 * problem.difficulty.multiplier() * accuracy).floor() as u64
}

/// Fresh record with a mastery slot per catalog zone and the base rank.
pub fn default_player(catalog: &Catalog) -> PlayerRecord {
    let mut record = PlayerRecord::default();
    for zone in catalog.zones() {
        record.mastery.insert(zone.id.clone(), 0);
    }
    record.rank = catalog.rank_for(0).name.clone();
    record
}

/// One-shot normalization applied to every loaded document: clamp gauges into
/// range, backfill mastery slots older saves lack, re-derive the rank.
pub fn normalize(catalog: &Catalog, record: &mut PlayerRecord) {
    if !record.accuracy.is_finite() {
        record.accuracy = 1.0;
    }
    record.accuracy = record.accuracy.clamp(0.0, 1.0);
    for zone in catalog.zones() {
        record.mastery.entry(zone.id.clone()).or_insert(0);
    }
    for gauge in record.mastery.values_mut() {
        *gauge = (*gauge).min(MASTERY_CAP);
    }
    record.rank = catalog.rank_for(record.experience).name.clone();
}

/// Apply one scored submission. Below the acceptance threshold the record is
/// left untouched and the outcome carries the remediation text. An accepted
/// resubmission of an already-solved problem is reported but awards nothing.
pub fn apply_submission(
    catalog: &Catalog,
    record: &mut PlayerRecord,
    problem: &ProblemDefinition,
    report: &ScoreReport,
) -> SubmissionOutcome {
    let accuracy = report.accuracy();

    if accuracy < ACCEPTANCE_THRESHOLD {
        return SubmissionOutcome::Rejected {
            accuracy,
            explanation: explain::explain(problem, accuracy, report.fault.as_deref()),
        };
    }

    if record.solved.contains(&problem.id) {
        return SubmissionOutcome::Accepted {
            accuracy,
            reward: 0,
            experience_total: record.experience,
            rank: record.rank.clone(),
            mastery: record.mastery_for(&problem.zone),
        };
    }

    let reward = reward_for(problem, accuracy);
    record.experience += reward;
    record.accuracy = (record.accuracy + accuracy) / 2.0;
    record.solved.insert(problem.id.clone());

    let gauge = record.mastery.entry(problem.zone.clone()).or_insert(0);
    *gauge = (u64::from(*gauge) + (accuracy * MASTERY_PER_PERFECT_SOLVE).floor() as u64)
        .min(u64::from(MASTERY_CAP)) as u8;
    let mastery = *gauge;

    record.rank = catalog.rank_for(record.experience).name.clone();

    SubmissionOutcome::Accepted {
        accuracy,
        reward,
        experience_total: record.experience,
        rank: record.rank.clone(),
        mastery,
    }
}

/// Apply one MCQ answer. Wrong answers never mutate the record; an
/// already-answered MCQ follows the same award-once rule as problems.
pub fn apply_mcq(
    catalog: &Catalog,
    record: &mut PlayerRecord,
    mcq: &McqDefinition,
    choice: usize,
) -> McqOutcome {
    if choice != mcq.answer_index {
        return McqOutcome::Rejected {
            explanation: MCQ_REJECTION_TEXT.to_string(),
        };
    }

    if record.solved_mcq.contains(&mcq.id) {
        return McqOutcome::Accepted {
            reward: 0,
            experience_total: record.experience,
            rank: record.rank.clone(),
        };
    }

    record.experience += mcq.reward;
    record.solved_mcq.insert(mcq.id.clone());
    record.rank = catalog.rank_for(record.experience).name.clone();

    McqOutcome::Accepted {
        reward: mcq.reward,
        experience_total: record.experience,
        rank: record.rank.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Catalog, PlayerRecord) {
        let catalog = Catalog::builtin();
        let record = default_player(&catalog);
        (catalog, record)
    }

    fn report(passed: usize, total: usize) -> ScoreReport {
        ScoreReport {
            passed,
            total,
            fault: None,
        }
    }

    #[test]
    fn perfect_easy_solve_awards_the_full_base_reward() {
        let (catalog, mut record) = fixture();
        let problem = catalog.problem("A1").expect("A1").clone();

        let outcome = apply_submission(&catalog, &mut record, &problem, &report(3, 3));
        let SubmissionOutcome::Accepted {
            reward,
            experience_total,
            mastery,
            ..
        } = outcome
        else {
            panic!("expected acceptance");
        };
        assert_eq!(reward, 40);
        assert_eq!(experience_total, 40);
        assert_eq!(mastery, 25);
        assert!(record.solved.contains("A1"));
    }

    #[test]
    fn boss_reward_vectors_follow_the_floor_formula() {
        let (catalog, _) = fixture();
        let boss = catalog.problem("A_BOSS").expect("A_BOSS");

        assert_eq!(reward_for(boss, 1.0), 600);
        // 600 times the f64 value of 2/3 rounds to exactly 400.0, so the
        // floor does not drop it to 399.
        assert_eq!(reward_for(boss, 2.0 / 3.0), 400);

        let easy = catalog.problem("A1").expect("A1");
        assert_eq!(reward_for(easy, 2.0 / 3.0), 26);
    }

    #[test]
    fn two_of_three_on_a_boss_is_accepted() {
        let (catalog, mut record) = fixture();
        let boss = catalog.problem("A_BOSS").expect("A_BOSS").clone();

        let outcome = apply_submission(&catalog, &mut record, &boss, &report(2, 3));
        let SubmissionOutcome::Accepted { reward, rank, .. } = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(reward, 400);
        assert_eq!(rank, "Coder");
    }

    #[test]
    fn rejection_leaves_the_record_untouched() {
        let (catalog, mut record) = fixture();
        let problem = catalog.problem("A1").expect("A1").clone();
        let before = record.clone();

        let outcome = apply_submission(&catalog, &mut record, &problem, &report(1, 3));
        assert!(!outcome.is_accepted());
        assert_eq!(record, before);
    }

    #[test]
    fn resubmission_awards_nothing() {
        let (catalog, mut record) = fixture();
        let problem = catalog.problem("A1").expect("A1").clone();

        apply_submission(&catalog, &mut record, &problem, &report(3, 3));
        let snapshot = record.clone();

        let outcome = apply_submission(&catalog, &mut record, &problem, &report(3, 3));
        let SubmissionOutcome::Accepted { reward, .. } = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(reward, 0);
        assert_eq!(record, snapshot);
    }

    #[test]
    fn accuracy_history_halves_the_distance_each_time() {
        let (catalog, mut record) = fixture();
        let a1 = catalog.problem("A1").expect("A1").clone();
        let a2 = catalog.problem("A2").expect("A2").clone();

        apply_submission(&catalog, &mut record, &a1, &report(3, 3));
        assert_eq!(record.accuracy, 1.0);

        apply_submission(&catalog, &mut record, &a2, &report(1, 2));
        assert_eq!(record.accuracy, 0.75);
    }

    #[test]
    fn mastery_saturates_at_the_cap() {
        let (catalog, mut record) = fixture();
        let ids = ["A1", "A2", "A3", "A4", "A_BOSS"];
        for id in ids {
            let problem = catalog.problem(id).expect("problem").clone();
            apply_submission(&catalog, &mut record, &problem, &report(1, 1));
        }
        assert_eq!(record.mastery_for("arrays"), 100);
    }

    #[test]
    fn rank_is_rederived_from_experience_on_every_acceptance() {
        let (catalog, mut record) = fixture();
        record.experience = 295;

        let mcq = catalog.mcq("M_A1").expect("M_A1").clone();
        let outcome = apply_mcq(&catalog, &mut record, &mcq, 0);
        let McqOutcome::Accepted { rank, .. } = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(rank, "Coder");
        assert_eq!(record.rank, "Coder");
    }

    #[test]
    fn wrong_mcq_choice_never_mutates_the_record() {
        let (catalog, mut record) = fixture();
        let mcq = catalog.mcq("M_A1").expect("M_A1").clone();
        let before = record.clone();

        let outcome = apply_mcq(&catalog, &mut record, &mcq, 3);
        assert!(matches!(outcome, McqOutcome::Rejected { .. }));
        assert_eq!(record, before);
    }

    #[test]
    fn repeat_mcq_answer_awards_nothing() {
        let (catalog, mut record) = fixture();
        let mcq = catalog.mcq("M_R1").expect("M_R1").clone();

        apply_mcq(&catalog, &mut record, &mcq, 2);
        let snapshot = record.clone();

        let outcome = apply_mcq(&catalog, &mut record, &mcq, 2);
        let McqOutcome::Accepted { reward, .. } = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(reward, 0);
        assert_eq!(record, snapshot);
    }

    #[test]
    fn normalize_backfills_and_clamps_old_documents() {
        let catalog = Catalog::builtin();
        let mut record = PlayerRecord {
            accuracy: 7.5,
            ..PlayerRecord::default()
        };
        record.mastery.insert("arrays".to_string(), 250);
        record.experience = 900;

        normalize(&catalog, &mut record);
        assert_eq!(record.accuracy, 1.0);
        assert_eq!(record.mastery_for("arrays"), 100);
        assert_eq!(record.mastery_for("recursion"), 0);
        assert_eq!(record.mastery_for("strings"), 0);
        assert_eq!(record.rank, "DSA Fighter");
    }
}
