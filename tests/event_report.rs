use anyhow::{Result, anyhow};

use ftc_forecast::bonus_model::event_opr;
use ftc_forecast::demo_feed::{DEMO_EVENT_CODE, SyntheticConfig, synthetic_event};
use ftc_forecast::event_report::{OprMode, build_event_report, build_fetch_pool};
use ftc_forecast::leaderboard::EventStatus;
use ftc_forecast::model::{AllianceResult, Match, TeamEventStats};
use ftc_forecast::predictor::MatchForecast;
use ftc_forecast::season_rules::SeasonRules;
use ftc_forecast::source::{InMemorySource, StatsSource};

fn played(id: &str, red: [&str; 2], blue: [&str; 2], red_score: i32, blue_score: i32) -> Match {
    Match {
        id: id.to_string(),
        label: None,
        red: red.iter().map(|t| t.to_string()).collect(),
        blue: blue.iter().map(|t| t.to_string()).collect(),
        red_result: Some(AllianceResult {
            score: red_score,
            bonuses: [false; 3],
        }),
        blue_result: Some(AllianceResult {
            score: blue_score,
            bonuses: [false; 3],
        }),
    }
}

fn small_source() -> InMemorySource {
    let mut source = InMemorySource::with_event(
        "USTXCMP",
        vec![
            played("1", ["1", "2"], ["3", "4"], 5, 50),
            played("2", ["1", "3"], ["2", "4"], 40, 15),
            played("3", ["1", "4"], ["2", "3"], 30, 25),
            Match {
                id: "4".to_string(),
                label: Some("Q4".to_string()),
                red: vec!["1".to_string(), "2".to_string()],
                blue: vec!["3".to_string(), "4".to_string()],
                red_result: None,
                blue_result: None,
            },
        ],
    );
    source.add_team_stats(TeamEventStats {
        team: "3".to_string(),
        event_code: "USTXCMP".to_string(),
        opr: Some(31.0),
        bonus_averages: [0.9, 0.2, 0.6],
    });
    source.add_team_stats(TeamEventStats {
        team: "3".to_string(),
        event_code: "USTXQ1".to_string(),
        opr: Some(44.0),
        bonus_averages: [0.5, 0.5, 0.5],
    });
    source
}

struct FlakySource(InMemorySource);

impl StatsSource for FlakySource {
    fn event_matches(&self, event_code: &str) -> Result<Vec<Match>> {
        self.0.event_matches(event_code)
    }

    fn team_events(&self, team: &str) -> Result<Vec<TeamEventStats>> {
        Err(anyhow!("upstream 503 for team {team}"))
    }
}

#[test]
fn event_mode_report_combines_every_stage() {
    let rules = SeasonRules::defaults(2025);
    let report =
        build_event_report(&small_source(), "ustxcmp", OprMode::Event, &rules, None).unwrap();

    assert_eq!(report.opr_data.len(), 4);
    assert!((report.opr_data["2"] + 5.0).abs() < 1e-6);
    assert!(report.season_best.is_empty());
    assert_eq!(report.bonus_probabilities["1"], [0.0; 3]);
    assert_eq!(report.bonus_labels, vec!["Movement", "Goal", "Pattern"]);

    assert_eq!(report.predictions.len(), 4);
    let evaluated = report
        .predictions
        .iter()
        .filter(|f| matches!(f, MatchForecast::Evaluation(_)))
        .count();
    assert_eq!(evaluated, 3);
    // exact fit: every played match called right
    assert_eq!(report.accuracy.evaluated, 3);
    assert_eq!(report.accuracy.correct, 3);
    assert_eq!(report.accuracy.accuracy, 100.0);

    assert_eq!(report.leaderboard.status, EventStatus::InProgress);
}

#[test]
fn bonus_probabilities_use_the_requested_event_row() {
    let rules = SeasonRules::defaults(2025);
    let report =
        build_event_report(&small_source(), "USTXCMP", OprMode::Event, &rules, None).unwrap();
    // the lookup is case-insensitive, and the other event's averages are ignored
    let mut source = small_source();
    let copy = source.matches["ustxcmp"].clone();
    source.matches.insert("ustxq1".to_string(), copy);
    let other = build_event_report(&source, "USTXQ1", OprMode::Event, &rules, None).unwrap();

    assert_eq!(report.bonus_probabilities["3"], [0.9, 0.2, 0.6]);
    assert_eq!(other.bonus_probabilities["3"], [0.5, 0.5, 0.5]);
    assert_eq!(report.bonus_probabilities["1"], [0.0; 3]);
}

#[test]
fn season_best_mode_reports_provenance() {
    let rules = SeasonRules::defaults(2025);
    let report = build_event_report(
        &small_source(),
        "USTXCMP",
        OprMode::SeasonBest,
        &rules,
        None,
    )
    .unwrap();

    assert_eq!(report.opr_data["3"], 44.0);
    assert_eq!(report.opr_data["1"], 0.0);
    let three = report.season_best.iter().find(|b| b.team == "3").unwrap();
    assert_eq!(three.provenance(), "USTXQ1");
    let one = report.season_best.iter().find(|b| b.team == "1").unwrap();
    assert_eq!(one.provenance(), "N/A");
}

#[test]
fn failing_team_lookups_degrade_to_zeros() {
    let rules = SeasonRules::defaults(2025);
    let pool = build_fetch_pool(2);
    let source = FlakySource(small_source());
    let report =
        build_event_report(&source, "USTXCMP", OprMode::Event, &rules, pool.as_ref()).unwrap();
    assert_eq!(report.opr_data.len(), 4);
    assert!(report.bonus_probabilities.values().all(|p| *p == [0.0; 3]));
}

#[test]
fn unknown_event_is_an_error() {
    let rules = SeasonRules::defaults(2025);
    let err = build_event_report(&small_source(), "NOPE", OprMode::Event, &rules, None)
        .unwrap_err();
    assert!(err.to_string().contains("NOPE"));
}

#[test]
fn demo_event_report_is_deterministic() {
    let rules = SeasonRules::defaults(2025);
    let cfg = SyntheticConfig::default();
    let a = synthetic_event(&cfg);
    let b = synthetic_event(&cfg);
    assert_eq!(a.matches, b.matches);

    let pool = build_fetch_pool(4);
    let first = build_event_report(&a.source, DEMO_EVENT_CODE, OprMode::Event, &rules, pool.as_ref())
        .unwrap();
    let second = build_event_report(&b.source, DEMO_EVENT_CODE, OprMode::Event, &rules, None)
        .unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.leaderboard.played_count + first.leaderboard.scheduled_count, a.matches.len());
}

#[test]
fn single_event_lookup_is_case_insensitive() {
    let source = small_source();
    let row = source.fetch_team_event_stats("3", "ustxq1").expect("row exists");
    assert_eq!(row.opr, Some(44.0));
    assert!(source.fetch_team_event_stats("3", "USCAFFFAQ").is_none());
    assert!(FlakySource(small_source()).fetch_team_event_stats("3", "USTXQ1").is_none());

    let rows = source.fetch_team_season_stats("3");
    assert_eq!(event_opr(&rows, "ustxcmp"), 31.0);
    assert_eq!(event_opr(&rows, "USCAFFFAQ"), 0.0);
}
