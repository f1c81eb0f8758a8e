use serde::{Deserialize, Serialize};

use crate::model::{BONUS_COUNT, BonusProbs, TeamEventStats, TeamId};

pub fn bonus_probabilities(stats: &[TeamEventStats], event_code: &str) -> BonusProbs {
    let Some(row) = stats
        .iter()
        .find(|s| s.event_code.eq_ignore_ascii_case(event_code))
    else {
        return [0.0; BONUS_COUNT];
    };
    row.bonus_averages.map(clamp_probability)
}

pub fn event_opr(stats: &[TeamEventStats], event_code: &str) -> f64 {
    stats
        .iter()
        .find(|s| s.event_code.eq_ignore_ascii_case(event_code))
        .and_then(|s| s.opr)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonBestOpr {
    pub team: TeamId,
    pub opr: f64,
    // None means the team has no rated event this season.
    pub event_code: Option<String>,
}

impl SeasonBestOpr {
    pub fn not_applicable(team: &str) -> Self {
        Self {
            team: team.to_string(),
            opr: 0.0,
            event_code: None,
        }
    }

    pub fn provenance(&self) -> &str {
        self.event_code.as_deref().unwrap_or("N/A")
    }
}

pub fn season_best_opr(team: &str, stats: &[TeamEventStats]) -> SeasonBestOpr {
    let mut best: Option<SeasonBestOpr> = None;
    for row in stats {
        let Some(opr) = row.opr.filter(|v| v.is_finite()) else {
            continue;
        };
        if best.as_ref().is_some_and(|b| opr <= b.opr) {
            continue;
        }
        best = Some(SeasonBestOpr {
            team: team.to_string(),
            opr,
            event_code: Some(row.event_code.clone()),
        });
    }
    best.unwrap_or_else(|| SeasonBestOpr::not_applicable(team))
}

pub fn alliance_bonus_probabilities(members: &[BonusProbs]) -> BonusProbs {
    if members.is_empty() {
        return [0.0; BONUS_COUNT];
    }
    let n = members.len() as f64;
    let mut out = [0.0; BONUS_COUNT];
    for probs in members {
        for (acc, p) in out.iter_mut().zip(probs.iter()) {
            *acc += p;
        }
    }
    out.map(|sum| sum / n)
}

pub fn predicted_achieved(probs: &BonusProbs) -> [bool; BONUS_COUNT] {
    probs.map(|p| p > 0.5)
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(event: &str, opr: Option<f64>, bonus: BonusProbs) -> TeamEventStats {
        TeamEventStats {
            team: "7244".to_string(),
            event_code: event.to_string(),
            opr,
            bonus_averages: bonus,
        }
    }

    #[test]
    fn alliance_mean_and_strict_threshold() {
        let probs = alliance_bonus_probabilities(&[[1.0, 0.5, 0.5], [0.0, 0.5, 1.0]]);
        assert_eq!(probs, [0.5, 0.5, 0.75]);
        assert_eq!(predicted_achieved(&probs), [false, false, true]);
        assert_eq!(alliance_bonus_probabilities(&[]), [0.0; BONUS_COUNT]);
    }

    #[test]
    fn out_of_range_averages_are_clamped() {
        let stats = [row("A", None, [1.7, -0.3, f64::NAN])];
        assert_eq!(bonus_probabilities(&stats, "a"), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn season_best_keeps_first_on_ties_and_skips_missing() {
        let stats = [
            row("A", Some(50.0), [0.0; 3]),
            row("B", None, [0.0; 3]),
            row("C", Some(50.0), [0.0; 3]),
        ];
        let best = season_best_opr("7244", &stats);
        assert_eq!(best.opr, 50.0);
        assert_eq!(best.provenance(), "A");
        assert_eq!(event_opr(&stats, "b"), 0.0);
    }
}
