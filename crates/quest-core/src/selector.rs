//! Pure queries over the catalogs and a player's progress.

use contracts::{
    McqDefinition, McqView, PlayerRecord, ProblemDefinition, ProblemView, ZoneDefinition,
    ZoneSummary,
};

use crate::catalog::Catalog;
use crate::progression;

pub fn is_unlocked(zone: &ZoneDefinition, record: &PlayerRecord) -> bool {
    record.experience >= zone.unlock_threshold
}

/// First problem of the zone, in catalog declaration order, not yet solved.
pub fn next_unsolved<'a>(
    catalog: &'a Catalog,
    zone_id: &'a str,
    record: &PlayerRecord,
) -> Option<&'a ProblemDefinition> {
    catalog
        .problems_in_zone(zone_id)
        .find(|problem| !record.solved.contains(&problem.id))
}

pub fn next_mcq<'a>(
    catalog: &'a Catalog,
    zone_id: &'a str,
    record: &PlayerRecord,
) -> Option<&'a McqDefinition> {
    catalog
        .mcqs_in_zone(zone_id)
        .find(|mcq| !record.solved_mcq.contains(&mcq.id))
}

pub fn problem_view(problem: &ProblemDefinition, record: &PlayerRecord) -> ProblemView {
    ProblemView {
        id: problem.id.clone(),
        title: problem.title.clone(),
        zone: problem.zone.clone(),
        difficulty: problem.difficulty,
        description: problem.description.clone(),
        starter_source: problem.starter_source.clone(),
        tests: problem.tests.clone(),
        potential_reward: progression::reward_for(problem, 1.0),
        solved: record.solved.contains(&problem.id),
    }
}

pub fn mcq_view(mcq: &McqDefinition, record: &PlayerRecord) -> McqView {
    McqView {
        id: mcq.id.clone(),
        zone: mcq.zone.clone(),
        prompt: mcq.prompt.clone(),
        choices: mcq.choices.clone(),
        reward: mcq.reward,
        answered: record.solved_mcq.contains(&mcq.id),
    }
}

pub fn zone_summaries(catalog: &Catalog, record: &PlayerRecord) -> Vec<ZoneSummary> {
    catalog
        .zones()
        .iter()
        .map(|zone| {
            let total_problems = catalog.problems_in_zone(&zone.id).count();
            let solved_count = catalog
                .problems_in_zone(&zone.id)
                .filter(|problem| record.solved.contains(&problem.id))
                .count();
            ZoneSummary {
                zone_id: zone.id.clone(),
                display_name: zone.display_name.clone(),
                icon: zone.icon.clone(),
                unlocked: is_unlocked(zone, record),
                unlock_threshold: zone.unlock_threshold,
                total_problems,
                solved_count,
                mastery: record.mastery_for(&zone.id),
            }
        })
        .collect()
}
