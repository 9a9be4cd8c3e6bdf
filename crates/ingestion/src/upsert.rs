//! Idempotent persistence of grouped games

use blooters_common::metrics::record_store;
use blooters_common::{MatchRecord, MatchStore};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpsertReport {
    pub matches_created: usize,
    pub matches_reused: usize,
    pub goals_inserted: usize,
    /// Goals already stored by an earlier pass
    pub duplicates: usize,
    pub failed_goals: usize,
    pub failed_matches: usize,
}

impl UpsertReport {
    /// Some row failed for a reason other than being a duplicate
    pub fn is_partial_failure(&self) -> bool {
        self.failed_goals > 0 || self.failed_matches > 0
    }
}

/// Store games and their goals.
///
/// An existing game is looked up by team pair and reused as is; its stored
/// score is not updated. Row failures are counted and skipped.
#[instrument(skip_all, fields(games = matches.len()))]
pub async fn upsert_matches(store: &dyn MatchStore, matches: &[MatchRecord]) -> UpsertReport {
    let mut report = UpsertReport::default();

    for game in matches {
        let game_id = match resolve_match(store, game, &mut report).await {
            Some(id) => id,
            None => continue,
        };

        for goal in &game.goals {
            match store.insert_goal(game_id, goal).await {
                Ok(_) => report.goals_inserted += 1,
                Err(e) if e.is_conflict() => {
                    debug!(game_id, title = %goal.description, "Goal already stored");
                    report.duplicates += 1;
                }
                Err(e) => {
                    warn!(game_id, title = %goal.description, error = %e, "Goal insert failed");
                    report.failed_goals += 1;
                }
            }
        }
    }

    record_store(
        !report.is_partial_failure(),
        report.goals_inserted,
        report.duplicates,
        report.failed_goals,
    );

    info!(
        created = report.matches_created,
        reused = report.matches_reused,
        inserted = report.goals_inserted,
        duplicates = report.duplicates,
        failed = report.failed_goals + report.failed_matches,
        "Goals stored"
    );

    report
}

async fn resolve_match(store: &dyn MatchStore, game: &MatchRecord, report: &mut UpsertReport) -> Option<i32> {
    let (home, away) = (game.home_team.as_str(), game.away_team.as_str());

    match store.find_match_by_teams(home, away).await {
        Ok(Some(id)) => {
            report.matches_reused += 1;
            return Some(id);
        }
        Ok(None) => {}
        Err(e) => {
            warn!(home, away, error = %e, "Game lookup failed");
            report.failed_matches += 1;
            return None;
        }
    }

    match store.insert_match(game).await {
        Ok(id) => {
            debug!(home, away, game_id = id, "Game created");
            report.matches_created += 1;
            Some(id)
        }
        Err(e) => {
            warn!(home, away, error = %e, "Game insert failed");
            report.failed_matches += 1;
            None
        }
    }
}
