use std::collections::BTreeSet;

use anyhow::{Result, anyhow};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bonus_model::{SeasonBestOpr, bonus_probabilities, season_best_opr};
use crate::leaderboard::{Leaderboard, build_leaderboard};
use crate::model::{BonusTable, Match, OprTable, TeamEventStats, TeamId};
use crate::opr::estimate_opr;
use crate::predictor::{MatchForecast, predict_or_evaluate};
use crate::season_rules::SeasonRules;
use crate::source::StatsSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OprMode {
    /// Regressed from this event's played matches.
    #[default]
    Event,
    /// Best upstream OPR from any event this season.
    SeasonBest,
}

impl OprMode {
    pub fn toggle(self) -> Self {
        match self {
            OprMode::Event => OprMode::SeasonBest,
            OprMode::SeasonBest => OprMode::Event,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OprMode::Event => "event",
            OprMode::SeasonBest => "season-best",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionAccuracy {
    pub evaluated: usize,
    pub correct: usize,
    pub ties: usize,
    // Percent of decided (non-tie) matches the OPR rule called right.
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    pub event_code: String,
    pub season: u16,
    pub opr_mode: OprMode,
    pub opr_data: OprTable,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub season_best: Vec<SeasonBestOpr>,
    pub bonus_probabilities: BonusTable,
    pub bonus_labels: Vec<String>,
    pub predictions: Vec<MatchForecast>,
    pub accuracy: PredictionAccuracy,
    pub leaderboard: Leaderboard,
}

pub fn build_event_report<S>(
    source: &S,
    event_code: &str,
    mode: OprMode,
    rules: &SeasonRules,
    pool: Option<&rayon::ThreadPool>,
) -> Result<EventReport>
where
    S: StatsSource + ?Sized,
{
    let matches = source.fetch_event_matches(event_code);
    if matches.is_empty() {
        return Err(anyhow!("no matches found for event {event_code}"));
    }

    let teams: BTreeSet<&str> = matches
        .iter()
        .flat_map(|m| m.teams())
        .map(|t| t.as_str())
        .collect();
    let team_stats = with_fetch_pool(pool, || {
        teams
            .par_iter()
            .map(|team| (team.to_string(), source.fetch_team_season_stats(team)))
            .collect::<Vec<(TeamId, Vec<TeamEventStats>)>>()
    });
    tracing::info!(
        event = event_code,
        matches = matches.len(),
        teams = team_stats.len(),
        mode = mode.label(),
        "event data loaded"
    );

    Ok(assemble_report(event_code, &matches, &team_stats, mode, rules))
}

/// Pure part of the report: no I/O, same inputs give the same output.
pub fn assemble_report(
    event_code: &str,
    matches: &[Match],
    team_stats: &[(TeamId, Vec<TeamEventStats>)],
    mode: OprMode,
    rules: &SeasonRules,
) -> EventReport {
    let bonus: BonusTable = team_stats
        .iter()
        .map(|(team, stats)| (team.clone(), bonus_probabilities(stats, event_code)))
        .collect();

    let (opr, season_best) = match mode {
        OprMode::Event => {
            let opr = estimate_opr(matches);
            if opr.is_empty() {
                tracing::info!(event = event_code, "not enough played matches for OPR");
            }
            (opr, Vec::new())
        }
        OprMode::SeasonBest => {
            let best: Vec<SeasonBestOpr> = team_stats
                .iter()
                .map(|(team, stats)| season_best_opr(team, stats))
                .collect();
            let opr: OprTable = best.iter().map(|b| (b.team.clone(), b.opr)).collect();
            (opr, best)
        }
    };

    let predictions: Vec<MatchForecast> = matches
        .iter()
        .map(|m| predict_or_evaluate(m, &opr, &bonus, rules))
        .collect();
    let accuracy = prediction_accuracy(&predictions);
    let leaderboard = build_leaderboard(matches, &opr, &bonus, rules);

    EventReport {
        event_code: event_code.to_string(),
        season: rules.season,
        opr_mode: mode,
        opr_data: opr,
        season_best,
        bonus_probabilities: bonus,
        bonus_labels: rules.bonus_labels().iter().map(|l| l.to_string()).collect(),
        predictions,
        accuracy,
        leaderboard,
    }
}

pub fn prediction_accuracy(forecasts: &[MatchForecast]) -> PredictionAccuracy {
    let mut out = PredictionAccuracy::default();
    for f in forecasts {
        let MatchForecast::Evaluation(eval) = f else {
            continue;
        };
        out.evaluated += 1;
        if eval.correct {
            out.correct += 1;
        }
        if eval.actual_winner == crate::model::Outcome::Tie {
            out.ties += 1;
        }
    }
    let decided = out.evaluated - out.ties;
    if decided > 0 {
        out.accuracy = out.correct as f64 / decided as f64 * 100.0;
    }
    out
}

pub fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: Option<&rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool {
        pool.install(action)
    } else {
        action()
    }
}
