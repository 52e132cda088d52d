use log::debug;

use crate::config::*;
use crate::check_units;

// The coincidence matrix, indexed by the position of the values in the value domain.
struct Coincidences {
    matrix: Vec<Vec<f64>>,
    pairable_units: usize,
}

/// Computes Krippendorff's alpha for the given reliability data.
///
/// Units with fewer than two values cannot be paired and do not contribute to the
/// coefficient. The value domain is made of all the values that appear in the data.
pub fn run_krippendorff_alpha(
    units: &[RatedUnit],
    rules: &AlphaRules,
) -> Result<AlphaResult, AgreementErrors> {
    let num_raters = check_units(units)?;
    debug!(
        "run_krippendorff_alpha: {} units, {} raters, rules: {:?}",
        units.len(),
        num_raters,
        rules
    );

    let mut value_domain: Vec<i64> = units.iter().flat_map(|u| u.present()).collect();
    value_domain.sort_unstable();
    value_domain.dedup();
    if value_domain.len() < 2 {
        return Err(AgreementErrors::SingleValueDomain);
    }

    let coincidences = coincidences(units, &value_domain);
    if coincidences.pairable_units == 0 {
        return Err(AgreementErrors::NoPairableValues);
    }
    let o = &coincidences.matrix;
    let n_v: Vec<f64> = o.iter().map(|row| row.iter().sum()).collect();
    let n: f64 = n_v.iter().sum();
    debug!("run_krippendorff_alpha: n_v: {:?} n: {}", n_v, n);

    let q = value_domain.len();
    let mut observed = 0.0;
    let mut expected = 0.0;
    for c in 0..q {
        for k in 0..q {
            if c == k {
                continue;
            }
            let d = distance(rules.level, &value_domain, &n_v, c, k);
            observed += o[c][k] * d;
            expected += n_v[c] * n_v[k] * d;
        }
    }
    expected /= n - 1.0;
    debug!(
        "run_krippendorff_alpha: observed: {} expected: {}",
        observed, expected
    );
    if expected == 0.0 {
        // All the pairable values are identical.
        return Err(AgreementErrors::SingleValueDomain);
    }

    Ok(AlphaResult {
        alpha: 1.0 - observed / expected,
        level: rules.level,
        pairable_values: n.round() as u64,
        pairable_units: coincidences.pairable_units,
        value_domain,
    })
}

fn coincidences(units: &[RatedUnit], value_domain: &[i64]) -> Coincidences {
    let q = value_domain.len();
    let mut matrix = vec![vec![0.0; q]; q];
    let mut pairable_units = 0;
    for unit in units.iter() {
        let positions: Vec<usize> = unit
            .present()
            .filter_map(|v| value_domain.binary_search(&v).ok())
            .collect();
        let m = positions.len();
        if m < 2 {
            continue;
        }
        pairable_units += 1;
        let weight = 1.0 / (m - 1) as f64;
        for (i, c) in positions.iter().enumerate() {
            for (j, k) in positions.iter().enumerate() {
                if i != j {
                    matrix[*c][*k] += weight;
                }
            }
        }
    }
    Coincidences {
        matrix,
        pairable_units,
    }
}

// The squared difference function, for two positions in the value domain.
fn distance(level: LevelOfMeasurement, domain: &[i64], n_v: &[f64], c: usize, k: usize) -> f64 {
    let (v1, v2) = (domain[c] as f64, domain[k] as f64);
    match level {
        LevelOfMeasurement::Nominal => {
            if c == k {
                0.0
            } else {
                1.0
            }
        }
        LevelOfMeasurement::Ordinal => {
            let (lo, hi) = if c <= k { (c, k) } else { (k, c) };
            let between: f64 = n_v[lo..=hi].iter().sum();
            let d = between - (n_v[c] + n_v[k]) / 2.0;
            d * d
        }
        LevelOfMeasurement::Interval => (v1 - v2) * (v1 - v2),
        LevelOfMeasurement::Ratio => {
            if v1 + v2 == 0.0 {
                0.0
            } else {
                let d = (v1 - v2) / (v1 + v2);
                d * d
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // Krippendorff's reference example: 3 coders, 15 units. 0 marks a missing value.
    fn reference_units() -> Vec<RatedUnit> {
        let coders: [[i64; 15]; 3] = [
            [0, 0, 0, 0, 0, 3, 4, 1, 2, 1, 1, 3, 3, 0, 3],
            [1, 0, 2, 1, 3, 3, 4, 3, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 2, 1, 3, 4, 4, 0, 2, 1, 1, 3, 3, 0, 4],
        ];
        (0..15)
            .map(|u| RatedUnit {
                ratings: coders
                    .iter()
                    .map(|c| if c[u] == 0 { None } else { Some(c[u]) })
                    .collect(),
            })
            .collect()
    }

    fn paired_units() -> Vec<RatedUnit> {
        let tm = [1, 2, 3, 4, 5, 6, 3, 4, 2, 5];
        let x = [1, 2, 4, 4, 5, 5, 3, 3, 2, 6];
        tm.iter()
            .zip(x.iter())
            .map(|(a, b)| RatedUnit::pair(*a, *b))
            .collect()
    }

    fn alpha(units: &[RatedUnit], level: LevelOfMeasurement) -> AlphaResult {
        run_krippendorff_alpha(units, &AlphaRules { level }).unwrap()
    }

    #[test]
    fn reference_example() {
        init_logger();
        let units = reference_units();
        let res = alpha(&units, LevelOfMeasurement::Nominal);
        assert!(close(res.alpha, 0.691358024691358), "{:?}", res);
        assert_eq!(res.pairable_values, 26);
        assert_eq!(res.pairable_units, 12);
        assert_eq!(res.value_domain, vec![1, 2, 3, 4]);

        let res = alpha(&units, LevelOfMeasurement::Interval);
        assert!(close(res.alpha, 0.8108448928121059), "{:?}", res);
        let res = alpha(&units, LevelOfMeasurement::Ordinal);
        assert!(close(res.alpha, 0.8067214199413153), "{:?}", res);
        let res = alpha(&units, LevelOfMeasurement::Ratio);
        assert!(close(res.alpha, 0.8089436707842471), "{:?}", res);
    }

    #[test]
    fn two_raters() {
        let units = paired_units();
        let res = alpha(&units, LevelOfMeasurement::Ordinal);
        assert!(close(res.alpha, 0.9262422360248447), "{:?}", res);
        assert_eq!(res.pairable_values, 20);
        let res = alpha(&units, LevelOfMeasurement::Nominal);
        assert!(close(res.alpha, 0.5365853658536586), "{:?}", res);
    }

    #[test]
    fn perfect_agreement() {
        let units: Vec<RatedUnit> = (1..=6).map(|v| RatedUnit::pair(v, v)).collect();
        let res = alpha(&units, LevelOfMeasurement::Ordinal);
        assert!(close(res.alpha, 1.0));
    }

    #[test]
    fn single_value() {
        let units = vec![RatedUnit::pair(3, 3), RatedUnit::pair(3, 3)];
        let res = run_krippendorff_alpha(&units, &AlphaRules::DEFAULT_RULES);
        assert_eq!(res, Err(AgreementErrors::SingleValueDomain));
    }

    #[test]
    fn unpairable() {
        let units = vec![
            RatedUnit {
                ratings: vec![Some(1), None],
            },
            RatedUnit {
                ratings: vec![None, Some(2)],
            },
        ];
        let res = run_krippendorff_alpha(&units, &AlphaRules::DEFAULT_RULES);
        assert_eq!(res, Err(AgreementErrors::NoPairableValues));
    }
}
