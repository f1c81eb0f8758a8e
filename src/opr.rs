use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Match, OprTable, Side, TeamId};

// Pivots below this fraction of the largest diagonal entry count as zero.
const PIVOT_EPS: f64 = 1e-9;

/// Least-squares OPR over every played alliance.
///
/// Each played alliance contributes one equation `sum(x_team) = score`. The
/// normal equations `AᵀA x = Aᵀb` are solved by Cholesky; an under-determined or
/// rank-deficient system yields an empty table rather than an error.
pub fn estimate_opr(matches: &[Match]) -> OprTable {
    let all_teams: BTreeSet<&str> = matches
        .iter()
        .flat_map(|m| m.teams())
        .map(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    if all_teams.is_empty() {
        return OprTable::new();
    }

    let equations = alliance_equations(matches);
    if equations.len() < all_teams.len() {
        return OprTable::new();
    }

    // Unknowns are the teams with at least one observed alliance; the rest get no entry.
    let observed: BTreeSet<&str> = equations
        .iter()
        .flat_map(|(teams, _)| teams.iter().copied())
        .collect();
    let index: BTreeMap<&str, usize> = observed.iter().enumerate().map(|(i, t)| (*t, i)).collect();
    let n = index.len();

    let mut ata = vec![0.0; n * n];
    let mut atb = vec![0.0; n];
    for (teams, score) in &equations {
        let cols: Vec<usize> = teams.iter().filter_map(|t| index.get(t).copied()).collect();
        for &i in &cols {
            atb[i] += score;
            for &j in &cols {
                ata[i * n + j] += 1.0;
            }
        }
    }

    let Some(x) = solve_cholesky(&ata, &atb, n) else {
        return OprTable::new();
    };
    if x.iter().any(|v| !v.is_finite()) {
        return OprTable::new();
    }

    index
        .into_iter()
        .map(|(team, i)| (TeamId::from(team), x[i]))
        .collect()
}

fn alliance_equations(matches: &[Match]) -> Vec<(Vec<&str>, f64)> {
    let mut out = Vec::new();
    for m in matches.iter().filter(|m| m.is_played()) {
        for side in [Side::Red, Side::Blue] {
            let Some(result) = m.result(side) else { continue };
            let mut teams: Vec<&str> = m
                .alliance(side)
                .iter()
                .map(|t| t.as_str())
                .filter(|t| !t.is_empty())
                .collect();
            // a team listed twice still gets a 0/1 column
            teams.sort_unstable();
            teams.dedup();
            if teams.is_empty() {
                continue;
            }
            out.push((teams, result.score as f64));
        }
    }
    out
}

/// Solve `a x = b` for symmetric positive definite `a` (row-major, `n x n`).
fn solve_cholesky(a: &[f64], b: &[f64], n: usize) -> Option<Vec<f64>> {
    let scale = (0..n).map(|i| a[i * n + i]).fold(0.0_f64, f64::max);
    if scale <= 0.0 {
        return None;
    }
    let tol = scale * PIVOT_EPS;

    // A = L * Lᵀ
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if sum <= tol {
                    return None;
                }
                l[i * n + j] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    // L * y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i * n + j] * y[j];
        }
        y[i] = sum / l[i * n + i];
    }

    // Lᵀ * x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j * n + i] * x[j];
        }
        x[i] = sum / l[i * n + i];
    }

    Some(x)
}
