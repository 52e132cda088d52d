use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use rater_agreement::{AlphaRules, GwetRules, LevelOfMeasurement, WeightScheme};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::irr::table::Cell;
use crate::irr::*;

pub const DEFAULT_WORKSHEET: &str = "data_transformed";
pub const DEFAULT_TITLE: &str = "Krippendorff's Alpha in der Schule";
pub const DEFAULT_RATERS: [&str; 2] = ["TM", "X"];
pub const DEFAULT_PRE_FILTER: [&str; 3] = ["Situation", "Sozialform", "Skala"];
pub const DEFAULT_DIMENSIONS: [&str; 2] = ["Kategorie", "Beobachtung ID"];
pub const DEFAULT_OBSERVATION_ID: &str = "Beobachtung ID";
pub const DEFAULT_MIN_OBSERVATION_ID: u32 = 1;
pub const DEFAULT_RATING_CATEGORIES: [i64; 6] = [1, 2, 3, 4, 5, 6];

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    pub title: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSettings {
    pub raters: Option<Vec<String>>,
    #[serde(rename = "preFilter")]
    pub pre_filter: Option<Vec<String>>,
    pub dimensions: Option<Vec<String>>,
    #[serde(rename = "observationId")]
    pub observation_id: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSettings {
    pub statistics: Option<Vec<String>>,
    pub weights: Option<String>,
    #[serde(rename = "levelOfMeasurement")]
    pub level_of_measurement: Option<String>,
    #[serde(rename = "ratingCategories")]
    pub rating_categories: Option<Vec<i64>>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSection {
    #[serde(rename = "minObservationId")]
    pub min_observation_id: Option<u32>,
    // The values may be written as strings or as numbers.
    pub filters: Option<BTreeMap<String, Vec<JSValue>>>,
    #[serde(rename = "analyzeBy")]
    pub analyze_by: Option<Vec<String>>,
    #[serde(rename = "labelRemapping")]
    pub label_remapping: Option<BTreeMap<String, BTreeMap<String, String>>>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrrConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "inputSettings", default)]
    pub input_settings: InputSettings,
    #[serde(default)]
    pub columns: ColumnSettings,
    #[serde(default)]
    pub rules: RuleSettings,
    #[serde(default)]
    pub analysis: AnalysisSection,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Statistic {
    Ac2,
    Ac1,
    Alpha,
}

impl Statistic {
    pub fn label(&self) -> &'static str {
        match self {
            Statistic::Ac2 => "AC2",
            Statistic::Ac1 => "AC1",
            Statistic::Alpha => "alpha",
        }
    }
}

/// The validated settings of one analysis run.
#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisSettings {
    pub title: String,
    pub input_path: Option<String>,
    pub worksheet: String,
    pub rater_columns: Vec<String>,
    pub pre_filter: Vec<String>,
    /// All the dimensions that can be used for grouping, the pre-filter ones included.
    pub dimensions: Vec<String>,
    pub observation_id: String,
    pub min_observation_id: Option<u32>,
    pub statistics: Vec<Statistic>,
    pub gwet_rules: GwetRules,
    pub alpha_rules: AlphaRules,
    pub filters: Vec<(String, Vec<String>)>,
    pub analyze_by: Vec<String>,
    pub label_remapping: Vec<(String, HashMap<String, String>)>,
    pub output_path: Option<String>,
}

pub fn read_config(path: &str) -> IrrResult<IrrConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    let config: IrrConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn parse_statistic(s: &str) -> IrrResult<Statistic> {
    match s.to_lowercase().as_str() {
        "ac2" => Ok(Statistic::Ac2),
        "ac1" => Ok(Statistic::Ac1),
        "alpha" | "krippendorff" => Ok(Statistic::Alpha),
        x => {
            whatever!("Unknown statistic {:?}: expected one of ac2, ac1, alpha", x)
        }
    }
}

pub fn parse_weights(s: &str) -> IrrResult<WeightScheme> {
    match s.to_lowercase().as_str() {
        "identity" | "unweighted" => Ok(WeightScheme::Identity),
        "ordinal" => Ok(WeightScheme::Ordinal),
        "linear" => Ok(WeightScheme::Linear),
        "quadratic" => Ok(WeightScheme::Quadratic),
        "radical" => Ok(WeightScheme::Radical),
        "ratio" => Ok(WeightScheme::Ratio),
        "circular" => Ok(WeightScheme::Circular),
        "bipolar" => Ok(WeightScheme::Bipolar),
        x => {
            whatever!("Unknown weights {:?}", x)
        }
    }
}

pub fn parse_level(s: &str) -> IrrResult<LevelOfMeasurement> {
    match s.to_lowercase().as_str() {
        "nominal" => Ok(LevelOfMeasurement::Nominal),
        "ordinal" => Ok(LevelOfMeasurement::Ordinal),
        "interval" => Ok(LevelOfMeasurement::Interval),
        "ratio" => Ok(LevelOfMeasurement::Ratio),
        x => {
            whatever!("Unknown level of measurement {:?}", x)
        }
    }
}

fn js_label(v: &JSValue) -> IrrResult<String> {
    match v {
        JSValue::String(s) => Ok(s.clone()),
        JSValue::Number(n) => match n.as_f64() {
            Some(x) => Ok(Cell::Number(x).label()),
            None => {
                whatever!("Cannot read filter value {:?}", n)
            }
        },
        JSValue::Bool(b) => Ok(b.to_string()),
        x => {
            whatever!("Cannot read filter value {:?}", x)
        }
    }
}

fn or_defaults(v: &Option<Vec<String>>, defaults: &[&str]) -> Vec<String> {
    match v {
        Some(x) => x.clone(),
        None => defaults.iter().map(|s| s.to_string()).collect(),
    }
}

/// Checks the raw configuration and fills in the defaults.
///
/// `root` is the directory that relative input paths are resolved against.
pub fn validate_settings(config: &IrrConfig, root: Option<&Path>) -> IrrResult<AnalysisSettings> {
    let rater_columns = or_defaults(&config.columns.raters, &DEFAULT_RATERS);
    if rater_columns.len() < 2 {
        whatever!(
            "At least two rater columns are required, got {:?}",
            rater_columns
        );
    }
    let pre_filter = or_defaults(&config.columns.pre_filter, &DEFAULT_PRE_FILTER);
    let mut dimensions = pre_filter.clone();
    for d in or_defaults(&config.columns.dimensions, &DEFAULT_DIMENSIONS) {
        if !dimensions.contains(&d) {
            dimensions.push(d);
        }
    }
    if dimensions.is_empty() {
        whatever!("No dimension is available for the analysis");
    }

    let statistics: Vec<Statistic> = match &config.rules.statistics {
        Some(l) if !l.is_empty() => l
            .iter()
            .map(|s| parse_statistic(s))
            .collect::<IrrResult<Vec<Statistic>>>()?,
        _ => vec![Statistic::Ac2],
    };
    let weights = match &config.rules.weights {
        Some(w) => parse_weights(w)?,
        None => WeightScheme::Ordinal,
    };
    let level = match &config.rules.level_of_measurement {
        Some(l) => parse_level(l)?,
        None => LevelOfMeasurement::Ordinal,
    };
    let categories = config
        .rules
        .rating_categories
        .clone()
        .unwrap_or_else(|| DEFAULT_RATING_CATEGORIES.to_vec());
    if categories.is_empty() {
        whatever!("The list of rating categories is empty");
    }

    let mut filters: Vec<(String, Vec<String>)> = Vec::new();
    for (dim, values) in config.analysis.filters.clone().unwrap_or_default() {
        if !dimensions.contains(&dim) {
            whatever!(
                "Cannot filter on {:?}: it is not one of the dimensions {:?}",
                dim,
                dimensions
            );
        }
        let labels = values
            .iter()
            .map(js_label)
            .collect::<IrrResult<Vec<String>>>()?;
        filters.push((dim, labels));
    }

    let analyze_by: Vec<String> = match &config.analysis.analyze_by {
        Some(l) => l.clone(),
        None => vec![dimensions[0].clone()],
    };
    if analyze_by.is_empty() || analyze_by.len() > 2 {
        whatever!(
            "The analysis is done by one or two dimensions, got {:?}",
            analyze_by
        );
    }
    for d in analyze_by.iter() {
        if !dimensions.contains(d) {
            whatever!(
                "Cannot analyze by {:?}: it is not one of the dimensions {:?}",
                d,
                dimensions
            );
        }
    }
    if analyze_by.len() == 2 && analyze_by[0] == analyze_by[1] {
        whatever!("The two grouping dimensions must be different: {:?}", analyze_by);
    }

    let label_remapping: Vec<(String, HashMap<String, String>)> = config
        .analysis
        .label_remapping
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(|(col, m)| (col, m.into_iter().collect()))
        .collect();

    let input_path = config.input_settings.file_path.as_ref().map(|p| {
        let pb: PathBuf = match root {
            Some(r) if Path::new(p).is_relative() => r.join(p),
            _ => PathBuf::from(p),
        };
        pb.display().to_string()
    });

    Ok(AnalysisSettings {
        title: config
            .output_settings
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        input_path,
        worksheet: config
            .input_settings
            .worksheet_name
            .clone()
            .unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
        rater_columns,
        pre_filter,
        dimensions,
        observation_id: config
            .columns
            .observation_id
            .clone()
            .unwrap_or_else(|| DEFAULT_OBSERVATION_ID.to_string()),
        min_observation_id: config.analysis.min_observation_id,
        statistics,
        gwet_rules: GwetRules {
            weights,
            categories: Some(categories),
        },
        alpha_rules: AlphaRules { level },
        filters,
        analyze_by,
        label_remapping,
        output_path: config.output_settings.output_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"{
        "outputSettings": { "title": "Pilot", "outputPath": "summary.json" },
        "inputSettings": { "filePath": "ratings.xlsx", "worksheetName": "Tabelle1" },
        "columns": {
            "raters": ["Rater A", "Rater B"],
            "preFilter": ["Situation"],
            "dimensions": ["Kategorie", "Beobachtung ID"]
        },
        "rules": {
            "statistics": ["ac2", "alpha"],
            "weights": "quadratic",
            "levelOfMeasurement": "interval"
        },
        "analysis": {
            "minObservationId": 2,
            "filters": { "Situation": ["Plenum", 3] },
            "analyzeBy": ["Situation", "Kategorie"],
            "labelRemapping": { "Kategorie": { "1": "Klassenführung" } }
        }
    }"#;

    #[test]
    fn defaults() {
        let settings = validate_settings(&IrrConfig::default(), None).unwrap();
        assert_eq!(settings.worksheet, "data_transformed");
        assert_eq!(settings.rater_columns, vec!["TM", "X"]);
        assert_eq!(
            settings.dimensions,
            vec!["Situation", "Sozialform", "Skala", "Kategorie", "Beobachtung ID"]
        );
        assert_eq!(settings.analyze_by, vec!["Situation"]);
        assert_eq!(settings.statistics, vec![Statistic::Ac2]);
        assert_eq!(settings.gwet_rules.weights, WeightScheme::Ordinal);
        assert_eq!(
            settings.gwet_rules.categories,
            Some(vec![1, 2, 3, 4, 5, 6])
        );
        assert_eq!(settings.input_path, None);
        assert_eq!(settings.min_observation_id, None);
    }

    #[test]
    fn full_config() {
        let config: IrrConfig = serde_json::from_str(FULL_CONFIG).unwrap();
        let settings = validate_settings(&config, Some(Path::new("/data/study"))).unwrap();
        assert_eq!(settings.title, "Pilot");
        assert_eq!(
            settings.input_path,
            Some("/data/study/ratings.xlsx".to_string())
        );
        assert_eq!(settings.worksheet, "Tabelle1");
        assert_eq!(settings.rater_columns, vec!["Rater A", "Rater B"]);
        assert_eq!(
            settings.dimensions,
            vec!["Situation", "Kategorie", "Beobachtung ID"]
        );
        assert_eq!(
            settings.statistics,
            vec![Statistic::Ac2, Statistic::Alpha]
        );
        assert_eq!(settings.gwet_rules.weights, WeightScheme::Quadratic);
        assert_eq!(settings.alpha_rules.level, LevelOfMeasurement::Interval);
        assert_eq!(settings.min_observation_id, Some(2));
        assert_eq!(
            settings.filters,
            vec![(
                "Situation".to_string(),
                vec!["Plenum".to_string(), "3".to_string()]
            )]
        );
        assert_eq!(settings.analyze_by, vec!["Situation", "Kategorie"]);
        assert_eq!(settings.label_remapping.len(), 1);
        assert_eq!(
            settings.label_remapping[0].1.get("1"),
            Some(&"Klassenführung".to_string())
        );
        assert_eq!(settings.output_path, Some("summary.json".to_string()));
    }

    #[test]
    fn invalid_grouping() {
        let mut config = IrrConfig::default();
        config.analysis.analyze_by = Some(vec!["Unknown".to_string()]);
        assert!(validate_settings(&config, None).is_err());

        config.analysis.analyze_by = Some(vec![
            "Situation".to_string(),
            "Skala".to_string(),
            "Kategorie".to_string(),
        ]);
        assert!(validate_settings(&config, None).is_err());

        config.analysis.analyze_by = Some(vec!["Skala".to_string(), "Skala".to_string()]);
        assert!(validate_settings(&config, None).is_err());
    }

    #[test]
    fn invalid_rules() {
        let mut config = IrrConfig::default();
        config.rules.statistics = Some(vec!["kappa".to_string()]);
        assert!(validate_settings(&config, None).is_err());

        let mut config = IrrConfig::default();
        config.rules.weights = Some("cubic".to_string());
        assert!(validate_settings(&config, None).is_err());

        let mut config = IrrConfig::default();
        config.columns.raters = Some(vec!["TM".to_string()]);
        assert!(validate_settings(&config, None).is_err());
    }

    #[test]
    fn parsing() {
        assert_eq!(parse_statistic("AC2").unwrap(), Statistic::Ac2);
        assert_eq!(parse_statistic("krippendorff").unwrap(), Statistic::Alpha);
        assert_eq!(parse_weights("Unweighted").unwrap(), WeightScheme::Identity);
        assert_eq!(parse_level("nominal").unwrap(), LevelOfMeasurement::Nominal);
    }
}
