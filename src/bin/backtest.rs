use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use ftc_forecast::config::{self, Settings};
use ftc_forecast::event_report::{OprMode, assemble_report};
use ftc_forecast::model::{Match, TeamEventStats};
use ftc_forecast::season_rules::resolve_rules;

#[derive(Debug, serde::Deserialize)]
struct BacktestCase {
    event_code: String,
    matches: Vec<Match>,
    #[serde(default)]
    team_stats: Vec<TeamEventStats>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/backtest_case.json"));

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read backtest case {}", path.display()))?;
    let case: BacktestCase = serde_json::from_str(&raw).context("parse backtest case")?;

    let settings = Settings::from_env();
    let rules = resolve_rules(settings.season, settings.rules_file.as_deref());

    let mut teams: Vec<String> = case.matches.iter().flat_map(|m| m.teams().cloned()).collect();
    teams.sort();
    teams.dedup();
    let team_stats = teams
        .into_iter()
        .map(|team| {
            let stats = case
                .team_stats
                .iter()
                .filter(|s| s.team == team)
                .cloned()
                .collect::<Vec<_>>();
            (team, stats)
        })
        .collect::<Vec<_>>();

    // Offline replay of one snapshot: no network, just the model over saved data.
    for mode in [OprMode::Event, OprMode::SeasonBest] {
        let report = assemble_report(&case.event_code, &case.matches, &team_stats, mode, &rules);
        let acc = &report.accuracy;
        println!(
            "{:<12} evaluated {:>3}  ties {:>2}  correct {:>3}  accuracy {:>5.1}%  rated {}",
            mode.label(),
            acc.evaluated,
            acc.ties,
            acc.correct,
            acc.accuracy,
            report.opr_data.len()
        );
    }

    Ok(())
}
