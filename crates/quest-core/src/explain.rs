//! Remediation messages for rejected submissions. Pure; only ever invoked
//! for a submission that will be rejected.

use contracts::ProblemDefinition;

use crate::kb;

pub fn explain(problem: &ProblemDefinition, accuracy: f64, fault: Option<&str>) -> String {
    let entry = kb::lookup(&problem.kb_key);

    if let Some(fault) = fault {
        return format!("Runtime fault detected:\n{fault}\n\n{entry}");
    }

    if accuracy == 0.0 {
        return entry.to_string();
    }

    format!("Partial correctness detected.\nLikely missing edge cases.\n\n{entry}")
}
