use ftc_forecast::model::{AllianceResult, BonusTable, Match, OprTable, Outcome, Side};
use ftc_forecast::predictor::{
    MatchForecast, confidence, evaluate_match, predict_match, predict_or_evaluate,
    ranking_points, winner_confidence,
};
use ftc_forecast::season_rules::SeasonRules;

fn fixture_match(
    red_result: Option<(i32, [bool; 3])>,
    blue_result: Option<(i32, [bool; 3])>,
) -> Match {
    Match {
        id: "Q7".to_string(),
        label: None,
        red: vec!["100".to_string(), "200".to_string()],
        blue: vec!["300".to_string(), "400".to_string()],
        red_result: red_result.map(|(score, bonuses)| AllianceResult { score, bonuses }),
        blue_result: blue_result.map(|(score, bonuses)| AllianceResult { score, bonuses }),
    }
}

fn opr(values: [f64; 4]) -> OprTable {
    ["100", "200", "300", "400"]
        .into_iter()
        .zip(values)
        .map(|(t, v)| (t.to_string(), v))
        .collect()
}

#[test]
fn scheduled_match_prediction_numbers() {
    let rules = SeasonRules::defaults(2025);
    let m = fixture_match(None, None);
    let p = predict_match(&m, &opr([60.0, 40.0, 35.0, 25.0]), &BonusTable::new(), &rules);
    assert_eq!(p.red_opr_sum, 100.0);
    assert_eq!(p.blue_opr_sum, 60.0);
    assert_eq!(p.predicted_winner, Side::Red);
    assert_eq!(p.confidence, 25.0);
    assert_eq!(p.winner_confidence, 75.0);
    assert_eq!(p.red_ranking_points, 3);
    assert_eq!(p.blue_ranking_points, 0);
}

#[test]
fn exact_tie_in_schedule_goes_to_blue() {
    let rules = SeasonRules::defaults(2025);
    let m = fixture_match(None, None);
    let p = predict_match(&m, &opr([30.0, 30.0, 20.0, 40.0]), &BonusTable::new(), &rules);
    assert_eq!(p.predicted_winner, Side::Blue);
    assert_eq!(p.confidence, 0.0);
    assert_eq!(p.winner_confidence, 50.0);
    assert_eq!(p.blue_ranking_points, 3);

    // no ratings at all: zero denominator
    let empty = predict_match(&m, &OprTable::new(), &BonusTable::new(), &rules);
    assert_eq!(empty.predicted_winner, Side::Blue);
    assert_eq!(empty.confidence, 0.0);
}

#[test]
fn bonus_needs_strict_majority() {
    let rules = SeasonRules::defaults(2025);
    let mut bonus = BonusTable::new();
    bonus.insert("100".to_string(), [0.75, 0.5, 0.5]);
    bonus.insert("200".to_string(), [0.25, 0.5, 0.75]);
    // 400 has no stats, so it reads as zeros
    bonus.insert("300".to_string(), [1.0, 1.0, 1.0]);

    let m = fixture_match(None, None);
    let p = predict_match(&m, &opr([60.0, 40.0, 35.0, 25.0]), &bonus, &rules);
    assert_eq!(p.red_bonus.achieved, [false, false, true]);
    assert_eq!(p.red_ranking_points, 4);
    assert_eq!(p.blue_bonus.probabilities, [0.5, 0.5, 0.5]);
    assert_eq!(p.blue_bonus.achieved, [false, false, false]);
    assert_eq!(p.blue_ranking_points, 0);
}

#[test]
fn played_match_is_evaluated() {
    let rules = SeasonRules::defaults(2025);
    let m = fixture_match(Some((90, [true, false, false])), Some((110, [false; 3])));
    let table = opr([60.0, 40.0, 35.0, 25.0]);
    let MatchForecast::Evaluation(e) = predict_or_evaluate(&m, &table, &BonusTable::new(), &rules)
    else {
        panic!("played match should be evaluated");
    };
    assert_eq!(e.actual_winner, Outcome::Blue);
    assert_eq!(e.predicted_winner, Outcome::Red);
    assert!(!e.correct);
    assert_eq!(e.red_ranking_points, 1);
    assert_eq!(e.blue_ranking_points, 3);
}

#[test]
fn actual_tie_is_never_correct() {
    let rules = SeasonRules::defaults(2025);
    let m = fixture_match(Some((120, [false; 3])), Some((120, [false; 3])));
    let e = evaluate_match(&m, &opr([30.0, 30.0, 20.0, 40.0]), &rules).expect("played");
    assert_eq!(e.actual_winner, Outcome::Tie);
    assert_eq!(e.predicted_winner, Outcome::Tie);
    assert!(!e.correct);
    assert_eq!((e.red_ranking_points, e.blue_ranking_points), (1, 1));
}

#[test]
fn half_played_match_is_predicted() {
    let rules = SeasonRules::defaults(2025);
    let m = fixture_match(Some((50, [false; 3])), None);
    assert!(evaluate_match(&m, &OprTable::new(), &rules).is_none());
    let forecast = predict_or_evaluate(&m, &OprTable::new(), &BonusTable::new(), &rules);
    assert!(matches!(forecast, MatchForecast::Prediction(_)));
    assert_eq!(forecast.match_id(), "Q7");
}

#[test]
fn ranking_points_follow_injected_rules() {
    let mut rules = SeasonRules::defaults(2030);
    rules.win_points = 2;
    rules.tie_points = 1;
    rules.bonus_points = 2;

    assert_eq!(ranking_points(Outcome::Red, Side::Red, &[true, true, false], &rules), 6);
    assert_eq!(ranking_points(Outcome::Red, Side::Blue, &[true, false, false], &rules), 2);
    assert_eq!(ranking_points(Outcome::Tie, Side::Blue, &[false; 3], &rules), 1);

    let old = SeasonRules::defaults(2024);
    assert_eq!(ranking_points(Outcome::Blue, Side::Blue, &[false; 3], &old), 2);
}

#[test]
fn confidence_is_clamped() {
    assert_eq!(confidence(0.0, 0.0), 0.0);
    assert_eq!(confidence(-10.0, 10.0), 0.0);
    assert_eq!(winner_confidence(80.0), 100.0);
    assert_eq!(winner_confidence(-5.0), 50.0);
}

#[test]
fn records_carry_the_readable_label() {
    let rules = SeasonRules::defaults(2025);
    let mut m = fixture_match(None, None);
    assert_eq!(
        predict_or_evaluate(&m, &OprTable::new(), &BonusTable::new(), &rules).label(),
        "Q7"
    );

    m.label = Some("SF1-2".to_string());
    let p = predict_match(&m, &OprTable::new(), &BonusTable::new(), &rules);
    assert_eq!(p.label, "SF1-2");
    assert_eq!(p.match_id, "Q7");

    m.red_result = Some(AllianceResult { score: 10, bonuses: [false; 3] });
    m.blue_result = Some(AllianceResult { score: 20, bonuses: [false; 3] });
    let e = evaluate_match(&m, &OprTable::new(), &rules).expect("played");
    assert_eq!(e.label, "SF1-2");
}
