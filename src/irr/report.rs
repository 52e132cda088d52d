// Rendering of the tables and of the JSON summary.

use std::fs;

use rater_agreement::{AgreementErrors, AlphaResult, GwetResult, LevelOfMeasurement};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::irr::config_reader::{AnalysisSettings, Statistic};
use crate::irr::table::ObservationTable;
use crate::irr::*;

#[derive(PartialEq, Debug, Clone)]
pub enum Coefficient {
    Gwet(GwetResult),
    Alpha(AlphaResult),
}

impl Coefficient {
    pub fn value(&self) -> f64 {
        match self {
            Coefficient::Gwet(g) => g.coefficient,
            Coefficient::Alpha(a) => a.alpha,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct StatisticOutcome {
    pub statistic: Statistic,
    pub result: Result<Coefficient, AgreementErrors>,
}

/// Everything computed for one group.
#[derive(PartialEq, Debug, Clone)]
pub struct GroupOutcome {
    pub key: Vec<String>,
    pub sample_size: usize,
    pub outcomes: Vec<StatisticOutcome>,
}

impl GroupOutcome {
    pub fn errors(&self) -> Vec<(Statistic, String)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Err(e) => Some((o.statistic, e.to_string())),
                Ok(_) => None,
            })
            .collect()
    }
}

fn format_table(header: &[String], lines: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for line in lines.iter() {
        for (idx, c) in line.iter().enumerate() {
            if let Some(w) = widths.get_mut(idx) {
                *w = (*w).max(c.chars().count());
            }
        }
    }
    let render = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{}{}", c, " ".repeat(w - c.chars().count())))
            .collect();
        padded.join(" | ").trim_end().to_string()
    };
    let mut res: Vec<String> = vec![render(header)];
    res.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<String>>()
            .join("-+-"),
    );
    for line in lines.iter() {
        res.push(render(line));
    }
    res.join("\n")
}

/// The working copy of the observations, as a text table.
pub fn format_observation_table(table: &ObservationTable) -> String {
    let lines: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.label()).collect())
        .collect();
    format_table(&table.columns, &lines)
}

/// One line per group: the values of the dimensions, one column per statistic and the
/// sample size.
pub fn format_results_table(
    analyze_by: &[String],
    statistics: &[Statistic],
    results: &[GroupOutcome],
) -> String {
    let mut header: Vec<String> = analyze_by.to_vec();
    header.extend(statistics.iter().map(|s| s.label().to_string()));
    header.push("n".to_string());
    let lines: Vec<Vec<String>> = results
        .iter()
        .map(|g| {
            let mut line = g.key.clone();
            for stat in statistics.iter() {
                let cell = match g.outcomes.iter().find(|o| o.statistic == *stat) {
                    Some(StatisticOutcome {
                        result: Ok(c), ..
                    }) => format!("{:.4}", c.value()),
                    Some(StatisticOutcome { result: Err(_), .. }) => "error".to_string(),
                    None => "".to_string(),
                };
                line.push(cell);
            }
            line.push(g.sample_size.to_string());
            line
        })
        .collect();
    format_table(&header, &lines)
}

fn level_name(level: LevelOfMeasurement) -> &'static str {
    match level {
        LevelOfMeasurement::Nominal => "nominal",
        LevelOfMeasurement::Ordinal => "ordinal",
        LevelOfMeasurement::Interval => "interval",
        LevelOfMeasurement::Ratio => "ratio",
    }
}

fn coefficient_to_json(c: &Coefficient) -> JSValue {
    match c {
        Coefficient::Gwet(g) => json!({
            "coefficient": g.coefficient,
            "percentAgreement": g.percent_agreement,
            "chanceAgreement": g.chance_agreement,
            "stdError": g.std_error,
            "subjects": g.subjects,
            "raters": g.raters,
            "weights": format!("{:?}", g.weights).to_lowercase(),
        }),
        Coefficient::Alpha(a) => json!({
            "alpha": a.alpha,
            "level": level_name(a.level),
            "pairableValues": a.pairable_values,
            "pairableUnits": a.pairable_units,
            "valueDomain": a.value_domain,
        }),
    }
}

fn group_to_json(analyze_by: &[String], g: &GroupOutcome) -> JSValue {
    let mut key: JSMap<String, JSValue> = JSMap::new();
    for (dim, v) in analyze_by.iter().zip(g.key.iter()) {
        key.insert(dim.clone(), json!(v));
    }
    let mut coefficients: JSMap<String, JSValue> = JSMap::new();
    let mut errors: JSMap<String, JSValue> = JSMap::new();
    for o in g.outcomes.iter() {
        match &o.result {
            Ok(c) => {
                coefficients.insert(o.statistic.label().to_string(), coefficient_to_json(c));
            }
            Err(e) => {
                errors.insert(o.statistic.label().to_string(), json!(e.to_string()));
            }
        }
    }
    json!({
        "group": key,
        "sampleSize": g.sample_size,
        "coefficients": coefficients,
        "errors": errors,
    })
}

pub fn build_summary_js(settings: &AnalysisSettings, results: &[GroupOutcome]) -> JSValue {
    let mut filters: JSMap<String, JSValue> = JSMap::new();
    for (dim, values) in settings.filters.iter() {
        filters.insert(dim.clone(), json!(values));
    }
    let statistics: Vec<&str> = settings.statistics.iter().map(|s| s.label()).collect();
    json!({
        "config": {
            "title": settings.title,
            "input": settings.input_path,
            "worksheet": settings.worksheet,
            "raters": settings.rater_columns,
            "preFilter": settings.pre_filter,
            "analyzeBy": settings.analyze_by,
            "filters": filters,
            "minObservationId": settings.min_observation_id,
            "statistics": statistics,
        },
        "results": results
            .iter()
            .map(|g| group_to_json(&settings.analyze_by, g))
            .collect::<Vec<JSValue>>(),
    })
}

/// Reads a reference summary, to be compared with the computed one.
pub fn read_summary(path: &str) -> IrrResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irr::config_reader::{validate_settings, IrrConfig};
    use crate::irr::table::Cell;
    use rater_agreement::WeightScheme;

    fn outcome_ok() -> GroupOutcome {
        GroupOutcome {
            key: vec!["Plenum".to_string()],
            sample_size: 10,
            outcomes: vec![StatisticOutcome {
                statistic: Statistic::Ac2,
                result: Ok(Coefficient::Gwet(GwetResult {
                    coefficient: 0.9016,
                    percent_agreement: 0.97,
                    chance_agreement: 0.73,
                    std_error: Some(0.04),
                    subjects: 10,
                    raters: 2,
                    weights: WeightScheme::Ordinal,
                    categories: vec![1, 2, 3, 4, 5, 6],
                })),
            }],
        }
    }

    fn outcome_err() -> GroupOutcome {
        GroupOutcome {
            key: vec!["Gruppe".to_string()],
            sample_size: 2,
            outcomes: vec![StatisticOutcome {
                statistic: Statistic::Ac2,
                result: Err(AgreementErrors::NoDoubleRatedSubjects),
            }],
        }
    }

    #[test]
    fn results_table() {
        let s = format_results_table(
            &["Situation".to_string()],
            &[Statistic::Ac2],
            &[outcome_ok(), outcome_err()],
        );
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Situation | AC2    | n");
        assert_eq!(lines[2], "Plenum    | 0.9016 | 10");
        assert_eq!(lines[3], "Gruppe    | error  | 2");
    }

    #[test]
    fn observation_table() {
        let table = ObservationTable {
            columns: vec!["Kategorie".to_string(), "TM".to_string()],
            rows: vec![vec![Cell::Text("Klima".to_string()), Cell::Number(3.0)]],
        };
        let s = format_observation_table(&table);
        assert_eq!(s, "Kategorie | TM\n----------+---\nKlima     | 3");
    }

    #[test]
    fn summary() {
        let settings = validate_settings(&IrrConfig::default(), None).unwrap();
        let js = build_summary_js(&settings, &[outcome_ok(), outcome_err()]);
        assert_eq!(js["config"]["worksheet"], json!("data_transformed"));
        assert_eq!(js["results"][0]["group"]["Situation"], json!("Plenum"));
        assert_eq!(js["results"][0]["sampleSize"], json!(10));
        assert_eq!(
            js["results"][0]["coefficients"]["AC2"]["coefficient"],
            json!(0.9016)
        );
        assert_eq!(
            js["results"][1]["errors"]["AC2"],
            json!("no subject has at least two valid ratings")
        );
        assert_eq!(outcome_err().errors().len(), 1);
    }
}
