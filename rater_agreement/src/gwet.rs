use log::{debug, warn};

use crate::check_units;
use crate::config::*;

/// Computes Gwet's agreement coefficient (AC1 or AC2, depending on the weights) on raw ratings.
///
/// The computation follows the raw-ratings method of Gwet's `irrCAC` package:
/// - values that are not part of the categories are ignored
/// - subjects without any valid rating are removed
/// - the percent agreement only uses the subjects rated at least twice
pub fn run_gwet_ac(units: &[RatedUnit], rules: &GwetRules) -> Result<GwetResult, AgreementErrors> {
    let num_raters = check_units(units)?;
    let categories: Vec<i64> = match &rules.categories {
        Some(cats) => cats.clone(),
        None => {
            let mut cats: Vec<i64> = units.iter().flat_map(|u| u.present()).collect();
            cats.sort_unstable();
            cats.dedup();
            cats
        }
    };
    if categories.is_empty() {
        return Err(AgreementErrors::EmptyCategories);
    }
    let q = categories.len();
    let weights = weight_matrix(rules.weights, &categories);
    debug!(
        "run_gwet_ac: {} units, {} raters, categories: {:?} weights: {:?}",
        units.len(),
        num_raters,
        categories,
        weights
    );

    // The classification counts r_ik, only for the subjects with at least one valid rating.
    let mut agree: Vec<Vec<f64>> = Vec::new();
    for (idx, unit) in units.iter().enumerate() {
        let mut counts = vec![0.0; q];
        for v in unit.present() {
            match categories.iter().position(|c| *c == v) {
                Some(k) => counts[k] += 1.0,
                None => {
                    warn!(
                        "run_gwet_ac: unit {}: value {} is not a rating category, ignoring it",
                        idx, v
                    );
                }
            }
        }
        if counts.iter().any(|c| *c > 0.0) {
            agree.push(counts);
        }
    }
    let n = agree.len();
    if n == 0 {
        return Err(AgreementErrors::EmptyData);
    }
    let nf = n as f64;

    let r_i: Vec<f64> = agree.iter().map(|row| row.iter().sum()).collect();
    // Weighted counts r*_ik = sum_l w_kl r_il
    let agree_w: Vec<Vec<f64>> = agree
        .iter()
        .map(|row| {
            (0..q)
                .map(|k| (0..q).map(|l| weights[k][l] * row[l]).sum())
                .collect()
        })
        .collect();
    let sum_q: Vec<f64> = agree
        .iter()
        .zip(agree_w.iter())
        .map(|(row, row_w)| (0..q).map(|k| row[k] * (row_w[k] - 1.0)).sum())
        .collect();

    let n2more = r_i.iter().filter(|r| **r >= 2.0).count();
    if n2more == 0 {
        return Err(AgreementErrors::NoDoubleRatedSubjects);
    }
    let n2f = n2more as f64;
    let pa: f64 = sum_q
        .iter()
        .zip(r_i.iter())
        .filter(|(_, r)| **r >= 2.0)
        .map(|(s, r)| s / (r * (r - 1.0)))
        .sum::<f64>()
        / n2f;

    let pi: Vec<f64> = (0..q)
        .map(|k| {
            agree
                .iter()
                .zip(r_i.iter())
                .map(|(row, r)| row[k] / r)
                .sum::<f64>()
                / nf
        })
        .collect();
    let total_weights: f64 = weights.iter().map(|row| row.iter().sum::<f64>()).sum();
    let pe_factor = if q >= 2 {
        total_weights / (q * (q - 1)) as f64
    } else {
        0.0
    };
    let pe = pe_factor * pi.iter().map(|p| p * (1.0 - p)).sum::<f64>();
    debug!("run_gwet_ac: pa: {} pe: {} pi: {:?}", pa, pe, pi);
    if pe >= 1.0 {
        return Err(AgreementErrors::PerfectChanceAgreement);
    }
    let coefficient = (pa - pe) / (1.0 - pe);

    // Variance of the coefficient, without finite population correction.
    let std_error = if n >= 2 {
        let mut total = 0.0;
        for i in 0..n {
            let den = {
                let d = r_i[i] * (r_i[i] - 1.0);
                if d == 0.0 {
                    -1.0
                } else {
                    d
                }
            };
            let pa_i = sum_q[i] / den;
            let pe_r2 = if r_i[i] >= 2.0 { pe } else { 0.0 };
            let ac_i = (nf / n2f) * (pa_i - pe_r2) / (1.0 - pe);
            let pe_i = pe_factor
                * (0..q).map(|k| agree[i][k] * (1.0 - pi[k])).sum::<f64>()
                / r_i[i];
            let ac_i_x = ac_i - 2.0 * (1.0 - coefficient) * (pe_i - pe) / (1.0 - pe);
            total += (ac_i_x - coefficient) * (ac_i_x - coefficient);
        }
        Some((total / (nf * (nf - 1.0))).sqrt())
    } else {
        None
    };

    Ok(GwetResult {
        coefficient,
        percent_agreement: pa,
        chance_agreement: pe,
        std_error,
        subjects: n,
        raters: num_raters,
        weights: rules.weights,
        categories,
    })
}

/// The matrix of agreement weights `w[k][l]` between the categories, in the order provided.
///
/// Every weight is 1 on the diagonal and lies in [0, 1].
pub fn weight_matrix(scheme: WeightScheme, categories: &[i64]) -> Vec<Vec<f64>> {
    let q = categories.len();
    let x: Vec<f64> = categories.iter().map(|c| *c as f64).collect();
    let x_min = x.iter().cloned().fold(f64::INFINITY, f64::min);
    let x_max = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let disagreement = |k: usize, l: usize| -> f64 {
        let (a, b) = (x[k], x[l]);
        match scheme {
            WeightScheme::Identity => {
                if k == l {
                    0.0
                } else {
                    1.0
                }
            }
            WeightScheme::Ordinal => {
                let m = (k.max(l) - k.min(l) + 1) as f64;
                m * (m - 1.0) / 2.0
            }
            WeightScheme::Linear => (a - b).abs(),
            WeightScheme::Quadratic => (a - b) * (a - b),
            WeightScheme::Radical => (a - b).abs().sqrt(),
            WeightScheme::Ratio => {
                if a + b == 0.0 {
                    0.0
                } else {
                    ((a - b) / (a + b)).powi(2)
                }
            }
            WeightScheme::Circular => {
                let u = x_max - x_min + 1.0;
                (std::f64::consts::PI * (a - b) / u).sin().powi(2)
            }
            WeightScheme::Bipolar => {
                if k == l {
                    0.0
                } else {
                    let den = (a + b - 2.0 * x_min) * (2.0 * x_max - a - b);
                    if den == 0.0 {
                        0.0
                    } else {
                        (a - b) * (a - b) / den
                    }
                }
            }
        }
    };

    let d: Vec<Vec<f64>> = (0..q)
        .map(|k| (0..q).map(|l| disagreement(k, l)).collect())
        .collect();
    let max_d = d
        .iter()
        .flat_map(|row| row.iter())
        .cloned()
        .fold(0.0, f64::max);
    if max_d == 0.0 {
        return (0..q)
            .map(|k| (0..q).map(|l| if k == l { 1.0 } else { 0.0 }).collect())
            .collect();
    }
    d.iter()
        .map(|row| row.iter().map(|v| 1.0 - v / max_d).collect())
        .collect()
}
