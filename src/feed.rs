use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::demo_feed::{SyntheticConfig, synthetic_event};
use crate::event_report::{OprMode, build_event_report, build_fetch_pool};
use crate::ftc_scout::FtcScoutClient;
use crate::http_cache::HttpCache;
use crate::season_rules::SeasonRules;
use crate::source::StatsSource;
use crate::state::{Delta, ProviderCommand};

#[derive(Debug, Clone)]
pub enum FeedSource {
    FtcScout,
    Demo(SyntheticConfig),
}

pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    settings: Settings,
    rules: SeasonRules,
    feed: FeedSource,
) {
    thread::spawn(move || {
        let cache = HttpCache::from_settings(&settings);
        let pool = build_fetch_pool(settings.fetch_parallelism);
        match feed {
            FeedSource::FtcScout => {
                let client = FtcScoutClient::new(&settings, &rules, &cache);
                serve(&client, &tx, &cmd_rx, &settings, &rules, pool.as_ref());
            }
            FeedSource::Demo(cfg) => {
                let event = synthetic_event(&cfg);
                let _ = tx.send(Delta::Log(format!(
                    "[INFO] Demo event {} with {} matches",
                    event.event_code,
                    event.matches.len()
                )));
                serve(&event.source, &tx, &cmd_rx, &settings, &rules, pool.as_ref());
            }
        }
    });
}

fn serve<S: StatsSource + ?Sized>(
    source: &S,
    tx: &Sender<Delta>,
    cmd_rx: &Receiver<ProviderCommand>,
    settings: &Settings,
    rules: &SeasonRules,
    pool: Option<&rayon::ThreadPool>,
) {
    let mut current: Option<(String, OprMode)> = None;
    let mut last_fetch = Instant::now();

    loop {
        match cmd_rx.recv_timeout(Duration::from_millis(500)) {
            Ok(ProviderCommand::FetchEvent { event_code, mode }) => {
                if !publish(source, tx, &event_code, mode, rules, pool) {
                    return;
                }
                current = Some((event_code, mode));
                last_fetch = Instant::now();
            }
            Err(RecvTimeoutError::Timeout) => {
                let Some((event_code, mode)) = current.as_ref() else {
                    continue;
                };
                if last_fetch.elapsed() < settings.refresh_interval {
                    continue;
                }
                if !publish(source, tx, event_code, *mode, rules, pool) {
                    return;
                }
                last_fetch = Instant::now();
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

// false once the UI side has hung up.
fn publish<S: StatsSource + ?Sized>(
    source: &S,
    tx: &Sender<Delta>,
    event_code: &str,
    mode: OprMode,
    rules: &SeasonRules,
    pool: Option<&rayon::ThreadPool>,
) -> bool {
    let delta = match build_event_report(source, event_code, mode, rules, pool) {
        Ok(report) => Delta::SetReport(Box::new(report)),
        Err(err) => {
            tracing::warn!(event = event_code, "report failed: {err:#}");
            Delta::FetchFailed {
                event_code: event_code.to_string(),
                error: format!("{err:#}"),
            }
        }
    };
    tx.send(delta).is_ok()
}
