use ftc_forecast::demo_feed::{SyntheticConfig, synthetic_event};
use ftc_forecast::model::{AllianceResult, Match};
use ftc_forecast::opr::estimate_opr;

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

fn scheduled(id: &str, red: [&str; 2], blue: [&str; 2]) -> Match {
    Match {
        red_result: None,
        blue_result: None,
        ..played(id, red, blue, 0, 0)
    }
}

// True values: 1 = 10, 2 = -5, 3 = 30, 4 = 20. Every pair meets once.
fn round_robin_of_four() -> Vec<Match> {
    vec![
        played("1", ["1", "2"], ["3", "4"], 5, 50),
        played("2", ["1", "3"], ["2", "4"], 40, 15),
        played("3", ["1", "4"], ["2", "3"], 30, 25),
    ]
}

#[test]
fn recovers_exact_contributions_including_negative() {
    let opr = estimate_opr(&round_robin_of_four());
    assert_eq!(opr.len(), 4);
    for (team, want) in [("1", 10.0), ("2", -5.0), ("3", 30.0), ("4", 20.0)] {
        let got = opr[team];
        assert!((got - want).abs() < 1e-6, "team {team}: {got} vs {want}");
    }
}

#[test]
fn recovers_synthetic_ratings_without_noise() {
    let event = synthetic_event(&SyntheticConfig {
        seed: 7,
        teams: 24,
        rounds: 10,
        played_fraction: 1.0,
        noise: 0.0,
    });
    let opr = estimate_opr(&event.matches);
    assert_eq!(opr.len(), event.true_opr.len());
    for (team, truth) in &event.true_opr {
        assert!((opr[team] - truth).abs() < 1e-6, "team {team}");
    }
}

#[test]
fn too_few_equations_gives_empty_table() {
    let opr = estimate_opr(&[played("1", ["1", "2"], ["3", "4"], 50, 40)]);
    assert!(opr.is_empty());
}

#[test]
fn scheduled_only_teams_count_toward_equation_check() {
    let mut matches = round_robin_of_four();
    matches.push(scheduled("4", ["5", "6"], ["7", "8"]));
    // 6 equations, 8 distinct teams
    assert!(estimate_opr(&matches).is_empty());
}

#[test]
fn unobserved_teams_get_no_entry() {
    let mut matches = round_robin_of_four();
    matches.push(scheduled("4", ["1", "2"], ["3", "5"]));
    let opr = estimate_opr(&matches);
    assert_eq!(opr.len(), 4);
    assert!(!opr.contains_key("5"));
}

#[test]
fn rank_deficient_schedule_gives_empty_table() {
    let matches: Vec<Match> = (0..3)
        .map(|i| played(&i.to_string(), ["1", "2"], ["3", "4"], 60 + i, 40))
        .collect();
    assert!(estimate_opr(&matches).is_empty());
}

#[test]
fn no_played_matches_gives_empty_table() {
    assert!(estimate_opr(&[]).is_empty());
    assert!(estimate_opr(&[scheduled("1", ["1", "2"], ["3", "4"])]).is_empty());
}

#[test]
fn repeated_team_in_an_alliance_counts_once() {
    let mut matches = round_robin_of_four();
    // reads as 1 alone scoring 10, which agrees with the exact fit
    matches.push(played("4", ["1", "1"], ["3", "4"], 10, 50));
    let opr = estimate_opr(&matches);
    assert_eq!(opr.len(), 4);
    for (team, want) in [("1", 10.0), ("2", -5.0), ("3", 30.0), ("4", 20.0)] {
        assert!((opr[team] - want).abs() < 1e-6, "team {team}");
    }
}
