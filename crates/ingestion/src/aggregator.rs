//! Groups parsed goals into games by team pair

use blooters_common::{GoalRecord, MatchRecord, TeamPair};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Games keyed by exact (home, away) pair, in first-seen order
#[derive(Debug, Default)]
pub struct GameAggregator {
    index: HashMap<TeamPair, usize>,
    matches: Vec<MatchRecord>,
}

impl GameAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a goal. The first goal of a pair fixes the game's score snapshot.
    pub fn add(&mut self, goal: GoalRecord, now: DateTime<Utc>) {
        let pair = goal.team_pair();
        match self.index.get(&pair) {
            Some(&slot) => self.matches[slot].goals.push(goal),
            None => {
                self.index.insert(pair, self.matches.len());
                self.matches.push(MatchRecord::from_first_goal(goal, now));
            }
        }
    }

    pub fn into_matches(self) -> Vec<MatchRecord> {
        self.matches
    }
}

/// Group a batch of goals; games come out in first-seen order.
pub fn group(goals: Vec<GoalRecord>, now: DateTime<Utc>) -> Vec<MatchRecord> {
    let mut aggregator = GameAggregator::new();
    for goal in goals {
        aggregator.add(goal, now);
    }
    aggregator.into_matches()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(home: &str, away: &str, hs: i32, aws: i32, scorer: &str) -> GoalRecord {
        GoalRecord {
            description: format!("{} {}-{} {} - {} 10'", home, hs, aws, away, scorer),
            home_team: home.into(),
            away_team: away.into(),
            home_score: hs,
            away_score: aws,
            goalscorer: scorer.into(),
            minute: "10".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_same_pair_folds_into_one_game() {
        let now = Utc::now();
        let games = group(
            vec![
                goal("Arsenal", "Leeds United", 1, 0, "Thierry Henry"),
                goal("Arsenal", "Leeds United", 2, 0, "Robert Pires"),
            ],
            now,
        );

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].goals.len(), 2);
        assert_eq!(games[0].goals[1].goalscorer, "Robert Pires");
        // Snapshot from the first goal
        assert_eq!((games[0].home_score, games[0].away_score), (1, 0));
        assert_eq!(games[0].timestamp, now);
    }

    #[test]
    fn test_distinct_pairs_first_seen_order() {
        let games = group(
            vec![
                goal("Lyon", "Nice", 1, 0, "A"),
                goal("Arsenal", "Leeds United", 1, 0, "B"),
                goal("Lyon", "Nice", 1, 1, "C"),
            ],
            Utc::now(),
        );

        let pairs: Vec<String> = games.iter().map(|g| g.team_pair().to_string()).collect();
        assert_eq!(pairs, vec!["Lyon vs Nice", "Arsenal vs Leeds United"]);
        assert_eq!(games[0].goals.len(), 2);
    }

    #[test]
    fn test_pair_is_ordered_and_case_sensitive() {
        let mut aggregator = GameAggregator::new();
        let now = Utc::now();
        aggregator.add(goal("Arsenal", "Chelsea", 1, 0, "A"), now);
        aggregator.add(goal("Chelsea", "Arsenal", 1, 0, "B"), now);
        aggregator.add(goal("arsenal", "Chelsea", 1, 0, "C"), now);

        let games = aggregator.into_matches();
        assert_eq!(games.len(), 3);
        let pairs: Vec<TeamPair> = games.iter().map(|g| g.team_pair()).collect();
        assert!(pairs.contains(&TeamPair::new("Arsenal", "Chelsea")));
        assert!(!pairs.contains(&TeamPair::new("ARSENAL", "Chelsea")));
    }

    #[test]
    fn test_empty_batch() {
        assert!(group(Vec::new(), Utc::now()).is_empty());
        assert!(GameAggregator::new().into_matches().is_empty());
    }
}
