use std::collections::HashMap;

use anyhow::Result;

use crate::model::{Match, TeamEventStats, TeamId};

/// Where match lists and per-team event stats come from.
pub trait StatsSource: Sync {
    fn event_matches(&self, event_code: &str) -> Result<Vec<Match>>;

    fn team_events(&self, team: &str) -> Result<Vec<TeamEventStats>>;

    fn fetch_event_matches(&self, event_code: &str) -> Vec<Match> {
        self.event_matches(event_code).unwrap_or_else(|err| {
            tracing::warn!(event = event_code, "match list unavailable: {err:#}");
            Vec::new()
        })
    }

    fn fetch_team_season_stats(&self, team: &str) -> Vec<TeamEventStats> {
        self.team_events(team).unwrap_or_else(|err| {
            tracing::warn!(team, "team stats unavailable: {err:#}");
            Vec::new()
        })
    }

    fn fetch_team_event_stats(&self, team: &str, event_code: &str) -> Option<TeamEventStats> {
        self.fetch_team_season_stats(team)
            .into_iter()
            .find(|s| s.event_code.eq_ignore_ascii_case(event_code))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub matches: HashMap<String, Vec<Match>>,
    pub team_stats: HashMap<TeamId, Vec<TeamEventStats>>,
}

impl InMemorySource {
    pub fn with_event(event_code: &str, matches: Vec<Match>) -> Self {
        Self {
            matches: HashMap::from([(event_code.to_ascii_lowercase(), matches)]),
            team_stats: HashMap::new(),
        }
    }

    pub fn add_team_stats(&mut self, stats: TeamEventStats) {
        self.team_stats.entry(stats.team.clone()).or_default().push(stats);
    }
}

impl StatsSource for InMemorySource {
    fn event_matches(&self, event_code: &str) -> Result<Vec<Match>> {
        Ok(self
            .matches
            .get(&event_code.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    fn team_events(&self, team: &str) -> Result<Vec<TeamEventStats>> {
        Ok(self.team_stats.get(team).cloned().unwrap_or_default())
    }
}
