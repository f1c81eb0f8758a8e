use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::model::{
    AllianceResult, BONUS_COUNT, BonusFlags, BonusProbs, BonusTable, Match, OprTable,
    TeamEventStats, TeamId,
};
use crate::source::InMemorySource;

pub const DEMO_EVENT_CODE: &str = "DEMO";
const DEMO_EARLIER_EVENT: &str = "DEMOQUAL";

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub teams: usize,
    pub rounds: usize,
    pub played_fraction: f64,
    // Uniform score noise half-width, in points per alliance.
    pub noise: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 2025,
            teams: 24,
            rounds: 6,
            played_fraction: 0.5,
            noise: 8.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticEvent {
    pub event_code: String,
    pub matches: Vec<Match>,
    pub true_opr: OprTable,
    pub bonus_rates: BonusTable,
    pub source: InMemorySource,
}

pub fn synthetic_event(cfg: &SyntheticConfig) -> SyntheticEvent {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let team_count = cfg.teams.max(4);

    let teams: Vec<TeamId> = (0..team_count).map(|i| (10_000 + i * 7).to_string()).collect();
    let mut true_opr = OprTable::new();
    let mut bonus_rates = BonusTable::new();
    for team in &teams {
        true_opr.insert(team.clone(), rng.gen_range(20.0..120.0_f64).round());
        let rates: BonusProbs = [rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)];
        bonus_rates.insert(team.clone(), rates);
    }

    let mut matches = Vec::new();
    for _ in 0..cfg.rounds.max(1) {
        let mut order = teams.clone();
        order.shuffle(&mut rng);
        for quad in order.chunks_exact(4) {
            let n = matches.len() + 1;
            matches.push(Match {
                id: n.to_string(),
                label: Some(format!("Q{n}")),
                red: vec![quad[0].clone(), quad[1].clone()],
                blue: vec![quad[2].clone(), quad[3].clone()],
                red_result: None,
                blue_result: None,
            });
        }
    }

    let played = ((matches.len() as f64) * cfg.played_fraction.clamp(0.0, 1.0)).round() as usize;
    for m in matches.iter_mut().take(played) {
        m.red_result = Some(simulate_alliance(&mut rng, &m.red, &true_opr, &bonus_rates, cfg.noise));
        m.blue_result = Some(simulate_alliance(&mut rng, &m.blue, &true_opr, &bonus_rates, cfg.noise));
    }

    let mut source = InMemorySource::with_event(DEMO_EVENT_CODE, matches.clone());
    for team in &teams {
        let opr = true_opr.get(team).copied().unwrap_or(0.0);
        let rates = bonus_rates.get(team).copied().unwrap_or([0.0; BONUS_COUNT]);
        source.add_team_stats(TeamEventStats {
            team: team.clone(),
            event_code: DEMO_EARLIER_EVENT.to_string(),
            opr: Some((opr * rng.gen_range(0.8..1.1)).round()),
            bonus_averages: rates.map(|r| (r * rng.gen_range(0.8..1.2)).clamp(0.0, 1.0)),
        });
        source.add_team_stats(TeamEventStats {
            team: team.clone(),
            event_code: DEMO_EVENT_CODE.to_string(),
            opr: Some(opr),
            bonus_averages: rates,
        });
    }

    SyntheticEvent {
        event_code: DEMO_EVENT_CODE.to_string(),
        matches,
        true_opr,
        bonus_rates,
        source,
    }
}

fn simulate_alliance(
    rng: &mut StdRng,
    teams: &[TeamId],
    true_opr: &OprTable,
    bonus_rates: &BonusTable,
    noise: f64,
) -> AllianceResult {
    let base: f64 = teams.iter().filter_map(|t| true_opr.get(t)).sum();
    let jitter = if noise > 0.0 { rng.gen_range(-noise..noise) } else { 0.0 };

    let mut bonuses: BonusFlags = [false; BONUS_COUNT];
    for (k, flag) in bonuses.iter_mut().enumerate() {
        let p = teams
            .iter()
            .filter_map(|t| bonus_rates.get(t).map(|r| r[k]))
            .sum::<f64>()
            / teams.len().max(1) as f64;
        *flag = rng.gen_bool(p.clamp(0.0, 1.0));
    }

    AllianceResult {
        score: (base + jitter).round().max(0.0) as i32,
        bonuses,
    }
}
