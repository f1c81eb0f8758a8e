use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use ftc_forecast::bonus_model::{bonus_probabilities, event_opr, season_best_opr};
use ftc_forecast::config::{self, Settings};
use ftc_forecast::demo_feed::{SyntheticConfig, synthetic_event};
use ftc_forecast::event_report::{OprMode, build_event_report, build_fetch_pool};
use ftc_forecast::ftc_scout::FtcScoutClient;
use ftc_forecast::http_cache::HttpCache;
use ftc_forecast::logging;
use ftc_forecast::season_rules::resolve_rules;
use ftc_forecast::source::StatsSource;

#[derive(Parser)]
#[command(author, version, about = "Print FTC event forecasts as JSON")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predictions, evaluations and projected standings for one event
    Event {
        code: String,
        /// Use each team's best OPR this season instead of this event's regression
        #[arg(long)]
        season_best: bool,
    },
    /// Team profile plus season-best OPR
    Team {
        number: String,
        /// Also show the team's row for one event
        #[arg(long)]
        event: Option<String>,
    },
    /// Report for a synthetic event (no network)
    Demo {
        #[arg(long, default_value_t = 2025)]
        seed: u64,
        #[arg(long, default_value_t = 24)]
        teams: usize,
        #[arg(long, default_value_t = 0.5)]
        played: f64,
    },
    /// Liveness check
    Health,
}

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_stderr()?;
    let cli = Cli::parse();
    let settings = Settings::from_env();
    let rules = resolve_rules(settings.season, settings.rules_file.as_deref());
    let cache = HttpCache::from_settings(&settings);

    match cli.command {
        Commands::Event { code, season_best } => {
            let mode = if season_best {
                OprMode::SeasonBest
            } else {
                OprMode::Event
            };
            let client = FtcScoutClient::new(&settings, &rules, &cache);
            let pool = build_fetch_pool(settings.fetch_parallelism);
            let report = build_event_report(&client, code.trim(), mode, &rules, pool.as_ref())?;
            print_json(&report, cli.pretty)
        }
        Commands::Team { number, event } => {
            let client = FtcScoutClient::new(&settings, &rules, &cache);
            let info = client.team_info(&number).context("team lookup failed")?;
            let events = client.fetch_team_season_stats(&number);
            let best = season_best_opr(number.trim(), &events);
            let at_event = event.as_deref().map(|code| {
                json!({
                    "event_code": code,
                    "stats": client.fetch_team_event_stats(&number, code),
                    "opr": event_opr(&events, code),
                    "bonus_probabilities": bonus_probabilities(&events, code),
                })
            });
            let out = json!({
                "team_info": info,
                "season": client.season(),
                "events": events,
                "season_best": best,
                "event": at_event,
            });
            print_json(&out, cli.pretty)
        }
        Commands::Demo {
            seed,
            teams,
            played,
        } => {
            let event = synthetic_event(&SyntheticConfig {
                seed,
                teams,
                played_fraction: played,
                ..SyntheticConfig::default()
            });
            let report =
                build_event_report(&event.source, &event.event_code, OprMode::Event, &rules, None)?;
            print_json(&report, cli.pretty)
        }
        Commands::Health => print_json(
            &json!({ "status": "ok", "season": settings.season }),
            cli.pretty,
        ),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("serialize output")?;
    println!("{out}");
    Ok(())
}
