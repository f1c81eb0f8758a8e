use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::config::Settings;
use crate::http_cache::HttpCache;
use crate::http_client::http_client;
use crate::model::{AllianceResult, BONUS_COUNT, BonusFlags, Match, Side, TeamEventStats, TeamId};
use crate::season_rules::SeasonRules;
use crate::source::StatsSource;

pub struct FtcScoutClient<'a> {
    base: String,
    season: u16,
    bonus_keys: [String; BONUS_COUNT],
    cache: &'a HttpCache,
}

impl<'a> FtcScoutClient<'a> {
    pub fn new(settings: &Settings, rules: &SeasonRules, cache: &'a HttpCache) -> Self {
        Self {
            base: settings.scout_base.clone(),
            season: settings.season,
            bonus_keys: rules.bonuses.clone().map(|b| b.key),
            cache,
        }
    }

    pub fn season(&self) -> u16 {
        self.season
    }

    pub fn team_info(&self, team: &str) -> Result<Value> {
        let team = checked_segment(team)?;
        let body = self.get(&format!("teams/{team}"))?;
        let v: Value = serde_json::from_str(body.trim()).context("invalid team json")?;
        if v.is_null() {
            return Err(anyhow!("team {team} not found"));
        }
        Ok(v)
    }

    fn get(&self, path: &str) -> Result<String> {
        let url = format!("{}/{}", self.base, path.trim_start_matches('/'));
        tracing::info!(%url, "fetching");
        let client = http_client()?;
        self.cache.fetch(client, &url)
    }

    fn keys(&self) -> [&str; BONUS_COUNT] {
        [
            self.bonus_keys[0].as_str(),
            self.bonus_keys[1].as_str(),
            self.bonus_keys[2].as_str(),
        ]
    }
}

impl StatsSource for FtcScoutClient<'_> {
    fn event_matches(&self, event_code: &str) -> Result<Vec<Match>> {
        let code = checked_segment(event_code)?;
        let body = self
            .get(&format!("events/{}/{code}/matches", self.season))
            .context("event matches request failed")?;
        parse_matches_json(&body, &self.keys())
    }

    fn team_events(&self, team: &str) -> Result<Vec<TeamEventStats>> {
        let team = checked_segment(team)?;
        let body = self
            .get(&format!("teams/{team}/events/{}", self.season))
            .context("team events request failed")?;
        parse_team_events_json(&body, team, &self.keys())
    }
}

fn checked_segment(raw: &str) -> Result<&str> {
    let s = raw.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(anyhow!("invalid path segment {raw:?}"));
    }
    Ok(s)
}

/// Parse `events/{season}/{code}/matches`. `null` means no matches.
pub fn parse_matches_json(raw: &str, bonus_keys: &[&str; BONUS_COUNT]) -> Result<Vec<Match>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid matches json")?;
    let Some(items) = v.as_array() else {
        return Err(anyhow!("matches payload is not a list"));
    };
    Ok(items
        .iter()
        .filter_map(|item| parse_match(item, bonus_keys))
        .collect())
}

fn parse_match(item: &Value, bonus_keys: &[&str; BONUS_COUNT]) -> Option<Match> {
    let id = value_text(item.get("id")?)?;

    let mut seats: Vec<(Side, u8, TeamId)> = Vec::new();
    for team in item.get("teams").and_then(|t| t.as_array()).into_iter().flatten() {
        let Some(number) = team.get("teamNumber").and_then(value_text) else {
            continue;
        };
        let Some(side) = team.get("alliance").and_then(|a| a.as_str()).and_then(Side::parse) else {
            continue;
        };
        let station = team
            .get("station")
            .map(station_rank)
            .unwrap_or(u8::MAX);
        seats.push((side, station, number));
    }
    seats.sort_by_key(|(side, station, _)| (*side == Side::Blue, *station));

    let alliance = |want: Side| -> Vec<TeamId> {
        seats
            .iter()
            .filter(|(side, _, _)| *side == want)
            .map(|(_, _, t)| t.clone())
            .collect()
    };

    let scores = item.get("scores").filter(|s| !s.is_null());
    let result = |side: Side| scores.and_then(|s| parse_alliance_result(s.get(side.label())?, bonus_keys));

    Some(Match {
        label: match_label(item),
        red: alliance(Side::Red),
        blue: alliance(Side::Blue),
        red_result: result(Side::Red),
        blue_result: result(Side::Blue),
        id,
    })
}

fn parse_alliance_result(v: &Value, bonus_keys: &[&str; BONUS_COUNT]) -> Option<AllianceResult> {
    let score = v.get("totalPoints")?.as_f64()?;
    let mut bonuses: BonusFlags = [false; BONUS_COUNT];
    for (flag, key) in bonuses.iter_mut().zip(bonus_keys) {
        *flag = v.get(*key).is_some_and(value_truthy);
    }
    Some(AllianceResult {
        score: score.round() as i32,
        bonuses,
    })
}

fn match_label(item: &Value) -> Option<String> {
    let num = item.get("matchNum").and_then(|n| n.as_u64())?;
    let prefix = match item.get("tournamentLevel").and_then(|t| t.as_str()) {
        Some("Quals") => "Q",
        Some("Semis") => "SF",
        Some("Finals") => "F",
        Some("DoubleElim") => "M",
        _ => "#",
    };
    let series = item.get("series").and_then(|s| s.as_u64()).unwrap_or(0);
    if series > 0 && prefix != "Q" {
        Some(format!("{prefix}{series}-{num}"))
    } else {
        Some(format!("{prefix}{num}"))
    }
}

fn station_rank(v: &Value) -> u8 {
    if let Some(n) = v.as_u64() {
        return n.min(u8::MAX as u64) as u8;
    }
    match v.as_str().map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("one") | Some("1") => 1,
        Some("two") | Some("2") => 2,
        Some("three") | Some("3") => 3,
        _ => u8::MAX,
    }
}

/// Parse `teams/{n}/events/{season}`. Upstream has returned both a bare object and a
/// list here; both become a list.
pub fn parse_team_events_json(
    raw: &str,
    team: &str,
    bonus_keys: &[&str; BONUS_COUNT],
) -> Result<Vec<TeamEventStats>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid team events json")?;
    let records: Vec<&Value> = match &v {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![&v],
        _ => Vec::new(),
    };
    Ok(records
        .into_iter()
        .filter_map(|r| parse_team_event(r, team, bonus_keys))
        .collect())
}

fn parse_team_event(
    v: &Value,
    team: &str,
    bonus_keys: &[&str; BONUS_COUNT],
) -> Option<TeamEventStats> {
    let event_code = v.get("eventCode").and_then(|c| c.as_str())?.to_string();
    let team = v
        .get("teamNumber")
        .and_then(value_text)
        .unwrap_or_else(|| team.to_string());
    let stats = v.get("stats").filter(|s| !s.is_null());

    let opr = stats.and_then(|s| s.get("opr")).and_then(|o| {
        o.get("totalPoints")
            .and_then(|x| x.as_f64())
            .or_else(|| o.get("totalPointsNp").and_then(|x| x.as_f64()))
    });

    let avg = stats.and_then(|s| s.get("avg"));
    let mut bonus_averages = [0.0; BONUS_COUNT];
    for (slot, key) in bonus_averages.iter_mut().zip(bonus_keys) {
        let value = avg.and_then(|a| a.get(*key)).and_then(value_number).unwrap_or(0.0);
        *slot = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    }

    Some(TeamEventStats {
        team,
        event_code,
        opr,
        bonus_averages,
    })
}

fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_truthy(v: &Value) -> bool {
    value_number(v).is_some_and(|n| n > 0.0)
}
