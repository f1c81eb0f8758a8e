use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::BONUS_COUNT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusObjective {
    // Field name in FTCScout score/average objects.
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRules {
    pub season: u16,
    pub win_points: u32,
    pub tie_points: u32,
    pub bonus_points: u32,
    pub bonuses: [BonusObjective; BONUS_COUNT],
}

impl SeasonRules {
    pub fn defaults(season: u16) -> Self {
        let (win_points, tie_points) = match season {
            ..=2024 => (2, 1),
            _ => (3, 1),
        };
        Self {
            season,
            win_points,
            tie_points,
            bonus_points: 1,
            bonuses: [
                objective("movementRp", "Movement"),
                objective("goalRp", "Goal"),
                objective("patternRp", "Pattern"),
            ],
        }
    }

    pub fn bonus_labels(&self) -> [&str; BONUS_COUNT] {
        [
            self.bonuses[0].label.as_str(),
            self.bonuses[1].label.as_str(),
            self.bonuses[2].label.as_str(),
        ]
    }
}

fn objective(key: &str, label: &str) -> BonusObjective {
    BonusObjective {
        key: key.to_string(),
        label: label.to_string(),
    }
}

pub fn resolve_rules(season: u16, overrides_path: Option<&Path>) -> SeasonRules {
    let Some(path) = overrides_path else {
        return SeasonRules::defaults(season);
    };
    match load_rule_overrides(path) {
        Ok(mut table) => table
            .remove(&season)
            .unwrap_or_else(|| SeasonRules::defaults(season)),
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring season rules file: {err:#}");
            SeasonRules::defaults(season)
        }
    }
}

pub fn load_rule_overrides(path: &Path) -> Result<HashMap<u16, SeasonRules>> {
    let raw = fs::read_to_string(path).context("read season rules file")?;
    let table = serde_json::from_str::<HashMap<u16, SeasonRules>>(&raw)
        .context("parse season rules file")?;
    Ok(table
        .into_iter()
        .map(|(season, mut rules)| {
            rules.season = season;
            (season, rules)
        })
        .collect())
}
