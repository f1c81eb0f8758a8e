pub mod bonus_model;
pub mod config;
pub mod demo_feed;
pub mod event_report;
pub mod feed;
pub mod ftc_scout;
pub mod http_cache;
pub mod http_client;
pub mod leaderboard;
pub mod logging;
pub mod model;
pub mod opr;
pub mod predictor;
pub mod season_rules;
pub mod source;
pub mod state;
