use std::collections::VecDeque;

use crate::event_report::{EventReport, OprMode};
use crate::leaderboard::LeaderboardEntry;
use crate::model::Outcome;
use crate::predictor::MatchForecast;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Standings,
    Matches,
    Opr,
}

impl Screen {
    pub fn label(self) -> &'static str {
        match self {
            Screen::Standings => "Standings",
            Screen::Matches => "Matches",
            Screen::Opr => "OPR",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetReport(Box<EventReport>),
    FetchFailed { event_code: String, error: String },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchEvent { event_code: String, mode: OprMode },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRow {
    pub label: String,
    pub red: String,
    pub blue: String,
    pub score: String,
    pub pick: String,
    pub confidence: String,
    pub ranking_points: String,
    pub played: bool,
    pub correct: Option<bool>,
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub selected: usize,
    pub event_code: String,
    pub opr_mode: OprMode,
    pub report: Option<EventReport>,
    pub loading: bool,
    pub last_error: Option<String>,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(event_code: &str) -> Self {
        Self {
            screen: Screen::Standings,
            selected: 0,
            event_code: event_code.to_string(),
            opr_mode: OprMode::Event,
            report: None,
            loading: false,
            last_error: None,
            help_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.selected = 0;
        }
    }

    pub fn row_count(&self) -> usize {
        let Some(report) = self.report.as_ref() else {
            return 0;
        };
        match self.screen {
            Screen::Standings => report.leaderboard.entries.len(),
            Screen::Matches => report.predictions.len(),
            Screen::Opr => report.opr_data.len(),
        }
    }

    pub fn select_next(&mut self) {
        let total = self.row_count();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(total - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn standings(&self) -> &[LeaderboardEntry] {
        self.report
            .as_ref()
            .map(|r| r.leaderboard.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn match_rows(&self) -> Vec<MatchRow> {
        let Some(report) = self.report.as_ref() else {
            return Vec::new();
        };
        report.predictions.iter().map(match_row).collect()
    }

    pub fn opr_rows(&self) -> Vec<(String, f64)> {
        let Some(report) = self.report.as_ref() else {
            return Vec::new();
        };
        let mut rows: Vec<(String, f64)> = report
            .opr_data
            .iter()
            .map(|(team, opr)| (team.clone(), *opr))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows
    }

    pub fn status_line(&self) -> String {
        let Some(report) = self.report.as_ref() else {
            return if self.loading {
                "loading...".to_string()
            } else {
                "no data".to_string()
            };
        };
        let lb = &report.leaderboard;
        format!(
            "{} | played {} | scheduled {} | OPR {} | accuracy {:.1}% ({}/{})",
            lb.status.label(),
            lb.played_count,
            lb.scheduled_count,
            report.opr_mode.label(),
            report.accuracy.accuracy,
            report.accuracy.correct,
            report.accuracy.evaluated.saturating_sub(report.accuracy.ties),
        )
    }
}

fn match_row(forecast: &MatchForecast) -> MatchRow {
    match forecast {
        MatchForecast::Prediction(p) => MatchRow {
            label: p.label.clone(),
            red: p.red_teams.join(" "),
            blue: p.blue_teams.join(" "),
            score: format!("{:.0}-{:.0}", p.red_opr_sum, p.blue_opr_sum),
            pick: p.predicted_winner.label().to_string(),
            confidence: format!("{:.0}%", p.winner_confidence),
            ranking_points: format!("{}-{}", p.red_ranking_points, p.blue_ranking_points),
            played: false,
            correct: None,
        },
        MatchForecast::Evaluation(e) => MatchRow {
            label: e.label.clone(),
            red: e.red_teams.join(" "),
            blue: e.blue_teams.join(" "),
            score: format!("{}-{}", e.red_score, e.blue_score),
            pick: e.predicted_winner.label().to_string(),
            confidence: format!("{:.0}%", e.winner_confidence),
            ranking_points: format!("{}-{}", e.red_ranking_points, e.blue_ranking_points),
            played: true,
            correct: (e.actual_winner != Outcome::Tie).then_some(e.correct),
        },
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetReport(report) => {
            if !report.event_code.eq_ignore_ascii_case(&state.event_code) {
                state.push_log(format!("[INFO] Dropped stale report for {}", report.event_code));
                return;
            }
            state.push_log(format!(
                "[INFO] {}: {} matches, {} teams rated ({})",
                report.event_code,
                report.predictions.len(),
                report.opr_data.len(),
                report.opr_mode.label()
            ));
            state.opr_mode = report.opr_mode;
            state.report = Some(*report);
            state.loading = false;
            state.last_error = None;
            let total = state.row_count();
            state.selected = state.selected.min(total.saturating_sub(1));
        }
        Delta::FetchFailed { event_code, error } => {
            state.push_log(format!("[WARN] {event_code}: {error}"));
            if event_code.eq_ignore_ascii_case(&state.event_code) {
                state.loading = false;
                state.last_error = Some(error);
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
