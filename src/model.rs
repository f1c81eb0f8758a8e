use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const BONUS_COUNT: usize = 3;

pub type TeamId = String;

pub type BonusFlags = [bool; BONUS_COUNT];
pub type BonusProbs = [f64; BONUS_COUNT];

pub type OprTable = BTreeMap<TeamId, f64>;
pub type BonusTable = BTreeMap<TeamId, BonusProbs>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Red,
    Blue,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Red => "red",
            Side::Blue => "blue",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Side::Red),
            "blue" => Some(Side::Blue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Red,
    Blue,
    Tie,
}

impl Outcome {
    pub fn from_side(side: Side) -> Self {
        match side {
            Side::Red => Outcome::Red,
            Side::Blue => Outcome::Blue,
        }
    }

    /// Strict comparison: equal values are a tie.
    pub fn compare(red: f64, blue: f64) -> Self {
        if red > blue {
            Outcome::Red
        } else if blue > red {
            Outcome::Blue
        } else {
            Outcome::Tie
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Red => "red",
            Outcome::Blue => "blue",
            Outcome::Tie => "tie",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllianceResult {
    pub score: i32,
    #[serde(default)]
    pub bonuses: BonusFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub red: Vec<TeamId>,
    pub blue: Vec<TeamId>,
    #[serde(default)]
    pub red_result: Option<AllianceResult>,
    #[serde(default)]
    pub blue_result: Option<AllianceResult>,
}

impl Match {
    pub fn is_played(&self) -> bool {
        self.red_result.is_some() && self.blue_result.is_some()
    }

    /// Exactly two distinct, non-empty teams per alliance. Anything else is listed but
    /// never aggregated.
    pub fn is_well_formed(&self) -> bool {
        [&self.red, &self.blue].into_iter().all(|teams| {
            teams.len() == 2 && teams[0] != teams[1] && teams.iter().all(|t| !t.trim().is_empty())
        })
    }

    pub fn alliance(&self, side: Side) -> &[TeamId] {
        match side {
            Side::Red => &self.red,
            Side::Blue => &self.blue,
        }
    }

    pub fn result(&self, side: Side) -> Option<&AllianceResult> {
        match side {
            Side::Red => self.red_result.as_ref(),
            Side::Blue => self.blue_result.as_ref(),
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamId> {
        self.red.iter().chain(self.blue.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEventStats {
    pub team: TeamId,
    pub event_code: String,
    pub opr: Option<f64>,
    pub bonus_averages: BonusProbs,
}

pub fn opr_of(table: &OprTable, team: &str) -> f64 {
    table.get(team).copied().unwrap_or(0.0)
}

pub fn alliance_opr(table: &OprTable, teams: &[TeamId]) -> f64 {
    teams.iter().map(|t| opr_of(table, t)).sum()
}
