use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SCOUT_BASE: &str = "https://api.ftcscout.org/rest/v1";
pub const DEFAULT_SEASON: u16 = 2025;

#[derive(Debug, Clone)]
pub struct Settings {
    pub scout_base: String,
    pub season: u16,
    pub cache_ttl: Duration,
    pub cache_on_disk: bool,
    pub fetch_parallelism: usize,
    pub refresh_interval: Duration,
    pub rules_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        let scout_base = env::var("FTC_SCOUT_BASE")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SCOUT_BASE.to_string());
        let season = env::var("FTC_SEASON")
            .ok()
            .and_then(|val| val.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_SEASON);
        let cache_ttl = Duration::from_secs(
            env::var("FTC_CACHE_TTL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(300)
                .min(86_400),
        );
        let cache_on_disk = env::var("FTC_HTTP_CACHE_DISK")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let fetch_parallelism = env::var("FETCH_PARALLELISM")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(6)
            .clamp(2, 32);
        let refresh_interval = Duration::from_secs(
            env::var("FTC_REFRESH_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(120)
                .max(30),
        );

        Self {
            scout_base,
            season,
            cache_ttl,
            cache_on_disk,
            fetch_parallelism,
            refresh_interval,
            rules_file: opt_path_env("FTC_RULES_FILE"),
            log_file: opt_path_env("FTC_LOG_FILE"),
        }
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

fn opt_path_env(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
