use serde::{Deserialize, Serialize};

use crate::bonus_model::{alliance_bonus_probabilities, predicted_achieved};
use crate::model::{
    BONUS_COUNT, BonusFlags, BonusProbs, BonusTable, Match, OprTable, Outcome, Side, TeamId,
    alliance_opr,
};
use crate::season_rules::SeasonRules;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusOutlook {
    pub probabilities: BonusProbs,
    pub achieved: BonusFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub match_id: String,
    pub label: String,
    pub red_teams: Vec<TeamId>,
    pub blue_teams: Vec<TeamId>,
    pub red_opr_sum: f64,
    pub blue_opr_sum: f64,
    pub predicted_winner: Side,
    pub confidence: f64,
    pub winner_confidence: f64,
    pub red_bonus: BonusOutlook,
    pub blue_bonus: BonusOutlook,
    pub red_ranking_points: u32,
    pub blue_ranking_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub match_id: String,
    pub label: String,
    pub red_teams: Vec<TeamId>,
    pub blue_teams: Vec<TeamId>,
    pub red_score: i32,
    pub blue_score: i32,
    pub actual_winner: Outcome,
    pub red_opr_sum: f64,
    pub blue_opr_sum: f64,
    pub predicted_winner: Outcome,
    pub confidence: f64,
    pub winner_confidence: f64,
    pub red_ranking_points: u32,
    pub blue_ranking_points: u32,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchForecast {
    Prediction(PredictionRecord),
    Evaluation(EvaluationRecord),
}

impl MatchForecast {
    pub fn match_id(&self) -> &str {
        match self {
            MatchForecast::Prediction(p) => &p.match_id,
            MatchForecast::Evaluation(e) => &e.match_id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MatchForecast::Prediction(p) => &p.label,
            MatchForecast::Evaluation(e) => &e.label,
        }
    }
}

pub fn predict_or_evaluate(
    m: &Match,
    opr: &OprTable,
    bonus: &BonusTable,
    rules: &SeasonRules,
) -> MatchForecast {
    match evaluate_match(m, opr, rules) {
        Some(eval) => MatchForecast::Evaluation(eval),
        None => MatchForecast::Prediction(predict_match(m, opr, bonus, rules)),
    }
}

pub fn predict_match(
    m: &Match,
    opr: &OprTable,
    bonus: &BonusTable,
    rules: &SeasonRules,
) -> PredictionRecord {
    let red_opr_sum = alliance_opr(opr, &m.red);
    let blue_opr_sum = alliance_opr(opr, &m.blue);
    let winner = scheduled_winner(red_opr_sum, blue_opr_sum);
    let conf = confidence(red_opr_sum, blue_opr_sum);

    let red_bonus = bonus_outlook(&m.red, bonus);
    let blue_bonus = bonus_outlook(&m.blue, bonus);
    let outcome = Outcome::from_side(winner);

    PredictionRecord {
        match_id: m.id.clone(),
        label: m.display_label().to_string(),
        red_teams: m.red.clone(),
        blue_teams: m.blue.clone(),
        red_opr_sum,
        blue_opr_sum,
        predicted_winner: winner,
        confidence: conf,
        winner_confidence: winner_confidence(conf),
        red_ranking_points: ranking_points(outcome, Side::Red, &red_bonus.achieved, rules),
        blue_ranking_points: ranking_points(outcome, Side::Blue, &blue_bonus.achieved, rules),
        red_bonus,
        blue_bonus,
    }
}

pub fn evaluate_match(m: &Match, opr: &OprTable, rules: &SeasonRules) -> Option<EvaluationRecord> {
    let (red, blue) = (m.red_result?, m.blue_result?);
    let red_opr_sum = alliance_opr(opr, &m.red);
    let blue_opr_sum = alliance_opr(opr, &m.blue);
    let actual_winner = Outcome::compare(red.score as f64, blue.score as f64);
    let predicted_winner = Outcome::compare(red_opr_sum, blue_opr_sum);
    let conf = confidence(red_opr_sum, blue_opr_sum);

    Some(EvaluationRecord {
        match_id: m.id.clone(),
        label: m.display_label().to_string(),
        red_teams: m.red.clone(),
        blue_teams: m.blue.clone(),
        red_score: red.score,
        blue_score: blue.score,
        actual_winner,
        red_opr_sum,
        blue_opr_sum,
        predicted_winner,
        confidence: conf,
        winner_confidence: winner_confidence(conf),
        red_ranking_points: ranking_points(actual_winner, Side::Red, &red.bonuses, rules),
        blue_ranking_points: ranking_points(actual_winner, Side::Blue, &blue.bonuses, rules),
        correct: actual_winner != Outcome::Tie && actual_winner == predicted_winner,
    })
}

/// An unplayed match always gets a winner: red only on a strictly larger sum, so an
/// exact tie goes to blue. Same rule as the predictions web endpoint; settled, not pending.
pub fn scheduled_winner(red_opr_sum: f64, blue_opr_sum: f64) -> Side {
    if red_opr_sum > blue_opr_sum {
        Side::Red
    } else {
        Side::Blue
    }
}

pub fn confidence(red_opr_sum: f64, blue_opr_sum: f64) -> f64 {
    let denom = red_opr_sum + blue_opr_sum;
    if denom == 0.0 {
        return 0.0;
    }
    let c = (red_opr_sum - blue_opr_sum).abs() / denom * 100.0;
    if c.is_finite() { c } else { 0.0 }
}

pub fn winner_confidence(confidence: f64) -> f64 {
    (confidence + 50.0).clamp(50.0, 100.0)
}

pub fn ranking_points(
    outcome: Outcome,
    side: Side,
    achieved: &BonusFlags,
    rules: &SeasonRules,
) -> u32 {
    let bonus = achieved.iter().filter(|a| **a).count() as u32 * rules.bonus_points;
    let result = match outcome {
        Outcome::Tie => rules.tie_points,
        o if o == Outcome::from_side(side) => rules.win_points,
        _ => 0,
    };
    bonus + result
}

fn bonus_outlook(teams: &[TeamId], bonus: &BonusTable) -> BonusOutlook {
    let members: Vec<BonusProbs> = teams
        .iter()
        .map(|t| bonus.get(t).copied().unwrap_or([0.0; BONUS_COUNT]))
        .collect();
    let probabilities = alliance_bonus_probabilities(&members);
    BonusOutlook {
        achieved: predicted_achieved(&probabilities),
        probabilities,
    }
}
