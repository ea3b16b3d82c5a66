//! Drives the sandbox across a problem's suite and grades the outcome.

use contracts::{ProblemDefinition, SandboxLimits};

use crate::sandbox::{self, Fault};
use crate::script;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreReport {
    pub passed: usize,
    pub total: usize,
    /// Suite-level fault: entry point missing or a load failure. Per-test
    /// runtime faults are folded into failed tests and never surfaced here.
    pub fault: Option<String>,
}

impl ScoreReport {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64
    }

    fn suite_fault(total: usize, fault: &Fault) -> Self {
        Self {
            passed: 0,
            total,
            fault: Some(fault.to_string()),
        }
    }
}

/// Run every test case independently; a test passes iff the returned value is
/// structurally equal to the expectation. A faulting test counts as failed
/// but does not abort the rest of the suite.
pub fn score(problem: &ProblemDefinition, source: &str, limits: &SandboxLimits) -> ScoreReport {
    let total = problem.tests.len();

    if let Err(fault) = sandbox::check(source) {
        return ScoreReport::suite_fault(total, &fault);
    }

    let mut passed = 0;
    for test in &problem.tests {
        let Ok(result) = sandbox::execute(source, test.input.as_ref(), limits) else {
            continue;
        };
        let Ok(expected) = script::value_from_json(&test.expected) else {
            continue;
        };
        if script::structural_eq(&result, &expected) {
            passed += 1;
        }
    }

    ScoreReport {
        passed,
        total,
        fault: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Difficulty, TestCase};
    use serde_json::json;

    fn sum_problem() -> ProblemDefinition {
        ProblemDefinition {
            id: "A1".to_string(),
            title: "Sum of Array".to_string(),
            zone: "arrays".to_string(),
            difficulty: Difficulty::Easy,
            description: "Return the sum of all elements in the array".to_string(),
            starter_source: "fn solve(arr) {\n}\n".to_string(),
            tests: vec![
                TestCase::new(json!([1, 2, 3]), json!(6)),
                TestCase::new(json!([10, 20]), json!(30)),
                TestCase::new(json!([5]), json!(5)),
            ],
            base_reward: 40,
            kb_key: "general_logic".to_string(),
        }
    }

    const CORRECT: &str =
        "fn solve(arr) { let total = 0; for x in arr { total = total + x; } return total; }";

    #[test]
    fn perfect_solution_scores_one() {
        let report = score(&sum_problem(), CORRECT, &SandboxLimits::default());
        assert_eq!(report.passed, 3);
        assert_eq!(report.total, 3);
        assert_eq!(report.accuracy(), 1.0);
        assert!(report.fault.is_none());
    }

    #[test]
    fn missing_entry_point_is_a_suite_fault_with_zero_accuracy() {
        let report = score(
            &sum_problem(),
            "fn helper(arr) { return 0; }",
            &SandboxLimits::default(),
        );
        assert_eq!(report.accuracy(), 0.0);
        assert_eq!(report.fault.as_deref(), Some("function solve() not found"));
    }

    #[test]
    fn per_test_fault_fails_that_test_but_runs_the_rest() {
        // Faults on the single-element case only; the other two still pass.
        let source = "fn solve(arr) { let ignored = arr[1]; let total = 0; for x in arr { total = total + x; } return total; }";
        let report = score(&sum_problem(), source, &SandboxLimits::default());
        assert_eq!(report.passed, 2);
        assert_eq!(report.total, 3);
        assert!(report.fault.is_none());
    }

    #[test]
    fn accuracy_is_exactly_passed_over_total() {
        let source = "fn solve(arr) { if len(arr) == 1 { return arr[0]; } return 0; }";
        let report = score(&sum_problem(), source, &SandboxLimits::default());
        assert_eq!(report.passed, 1);
        assert_eq!(report.accuracy(), 1.0 / 3.0);
    }

    #[test]
    fn mutating_one_test_input_does_not_affect_the_others() {
        // Destroys its input in place after summing; every case still passes
        // because each invocation gets an independent copy.
        let source = "fn solve(arr) { let total = 0; for x in arr { total = total + x; } let i = 0; while i < len(arr) { arr[i] = 0; i = i + 1; } return total; }";
        let report = score(&sum_problem(), source, &SandboxLimits::default());
        assert_eq!(report.passed, 3);
    }

    #[test]
    fn empty_suite_has_zero_accuracy() {
        let mut problem = sum_problem();
        problem.tests.clear();
        let report = score(&problem, CORRECT, &SandboxLimits::default());
        assert_eq!(report.accuracy(), 0.0);
    }
}
