use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{BonusTable, Match, OprTable, Outcome, Side, TeamId};
use crate::predictor::{evaluate_match, predict_match};
use crate::season_rules::SeasonRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Completed,
    NotStarted,
    InProgress,
}

impl EventStatus {
    pub fn from_counts(played: usize, scheduled: usize) -> Self {
        if scheduled == 0 {
            EventStatus::Completed
        } else if played == 0 {
            EventStatus::NotStarted
        } else {
            EventStatus::InProgress
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventStatus::Completed => "completed",
            EventStatus::NotStarted => "not_started",
            EventStatus::InProgress => "in_progress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub team: TeamId,
    pub total_ranking_points: u32,
    pub matches: usize,
    pub average_ranking_points: f64,
    pub win_rate: f64,
    pub median_ranking_points: u32,
    pub includes_predictions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub status: EventStatus,
    pub played_count: usize,
    pub scheduled_count: usize,
}

#[derive(Debug, Default)]
struct Tally {
    ranking_points: u32,
    matches: usize,
    win_credit: f64,
    per_match: Vec<u32>,
    predicted: bool,
}

impl Tally {
    fn record(&mut self, points: u32, credit: f64, predicted: bool) {
        self.ranking_points += points;
        self.matches += 1;
        self.win_credit += credit;
        self.per_match.push(points);
        self.predicted |= predicted;
    }
}

pub fn build_leaderboard(
    matches: &[Match],
    opr: &OprTable,
    bonus: &BonusTable,
    rules: &SeasonRules,
) -> Leaderboard {
    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut played_count = 0usize;
    let mut scheduled_count = 0usize;

    for m in matches.iter().filter(|m| m.is_well_formed()) {
        let (outcome, red_rp, blue_rp, predicted) = match evaluate_match(m, opr, rules) {
            Some(eval) => {
                played_count += 1;
                (
                    eval.actual_winner,
                    eval.red_ranking_points,
                    eval.blue_ranking_points,
                    false,
                )
            }
            None => {
                scheduled_count += 1;
                let pred = predict_match(m, opr, bonus, rules);
                (
                    Outcome::from_side(pred.predicted_winner),
                    pred.red_ranking_points,
                    pred.blue_ranking_points,
                    true,
                )
            }
        };

        for (side, points) in [(Side::Red, red_rp), (Side::Blue, blue_rp)] {
            let credit = win_credit(outcome, side);
            for team in m.alliance(side) {
                tallies
                    .entry(team.as_str())
                    .or_default()
                    .record(points, credit, predicted);
            }
        }
    }

    let mut entries: Vec<LeaderboardEntry> = tallies
        .into_iter()
        .filter(|(_, t)| t.matches > 0)
        .map(|(team, t)| finalize_entry(team, t))
        .collect();

    // sort_by is stable, so full ties keep team order.
    entries.sort_by(|a, b| {
        b.total_ranking_points
            .cmp(&a.total_ranking_points)
            .then_with(|| b.average_ranking_points.total_cmp(&a.average_ranking_points))
    });
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx + 1;
    }

    Leaderboard {
        entries,
        status: EventStatus::from_counts(played_count, scheduled_count),
        played_count,
        scheduled_count,
    }
}

fn win_credit(outcome: Outcome, side: Side) -> f64 {
    match outcome {
        Outcome::Tie => 0.5,
        o if o == Outcome::from_side(side) => 1.0,
        _ => 0.0,
    }
}

fn finalize_entry(team: &str, mut tally: Tally) -> LeaderboardEntry {
    let n = tally.matches as f64;
    tally.per_match.sort_unstable();
    LeaderboardEntry {
        rank: 0,
        team: team.to_string(),
        total_ranking_points: tally.ranking_points,
        matches: tally.matches,
        average_ranking_points: tally.ranking_points as f64 / n,
        win_rate: tally.win_credit / n * 100.0,
        median_ranking_points: upper_median(&tally.per_match),
        includes_predictions: tally.predicted,
    }
}

/// Element at `len / 2` of a sorted slice: the upper middle for even lengths.
fn upper_median(sorted: &[u32]) -> u32 {
    sorted.get(sorted.len() / 2).copied().unwrap_or(0)
}
