use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use ftc_forecast::demo_feed::{SyntheticConfig, synthetic_event};
use ftc_forecast::event_report::{OprMode, assemble_report};
use ftc_forecast::leaderboard::build_leaderboard;
use ftc_forecast::model::BonusTable;
use ftc_forecast::opr::estimate_opr;
use ftc_forecast::season_rules::SeasonRules;
use ftc_forecast::source::StatsSource;

fn large_event() -> SyntheticConfig {
    SyntheticConfig {
        teams: 64,
        rounds: 12,
        played_fraction: 0.75,
        ..SyntheticConfig::default()
    }
}

fn bench_estimate_opr(c: &mut Criterion) {
    let event = synthetic_event(&large_event());
    c.bench_function("estimate_opr_64_teams", |b| {
        b.iter(|| {
            let opr = estimate_opr(black_box(&event.matches));
            black_box(opr.len());
        })
    });
}

fn bench_leaderboard(c: &mut Criterion) {
    let event = synthetic_event(&large_event());
    let rules = SeasonRules::defaults(2025);
    let opr = estimate_opr(&event.matches);
    let bonus: BonusTable = event.bonus_rates.clone();
    c.bench_function("build_leaderboard_64_teams", |b| {
        b.iter(|| {
            let lb = build_leaderboard(black_box(&event.matches), &opr, &bonus, &rules);
            black_box(lb.entries.len());
        })
    });
}

fn bench_full_report(c: &mut Criterion) {
    let event = synthetic_event(&large_event());
    let rules = SeasonRules::defaults(2025);
    let team_stats: Vec<_> = event
        .true_opr
        .keys()
        .map(|team| (team.clone(), event.source.fetch_team_season_stats(team)))
        .collect();
    c.bench_function("assemble_report_64_teams", |b| {
        b.iter(|| {
            let report = assemble_report(
                &event.event_code,
                black_box(&event.matches),
                &team_stats,
                OprMode::Event,
                &rules,
            );
            black_box(report.predictions.len());
        })
    });
}

criterion_group!(benches, bench_estimate_opr, bench_leaderboard, bench_full_report);
criterion_main!(benches);
