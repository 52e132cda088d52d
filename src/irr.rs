use log::{debug, info, warn};

use rater_agreement::*;
use snafu::prelude::*;

use std::fs;
use std::path::Path;

use text_diff::print_diff;

use crate::args::Args;

pub mod config_reader;
pub mod io_excel;
pub mod report;
pub mod table;

use crate::irr::config_reader::*;
use crate::irr::report::*;
use crate::irr::table::ObservationTable;

#[derive(Debug, Snafu)]
pub enum IrrError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display(
        "Worksheet {worksheet} not found in {path}, available worksheets: {available:?}"
    ))]
    MissingWorksheet {
        path: String,
        worksheet: String,
        available: Vec<String>,
    },
    #[snafu(display("Worksheet {worksheet} is empty"))]
    EmptyExcel { worksheet: String },
    #[snafu(display("Column {column} not found, available columns: {available:?}"))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },
    #[snafu(display("Invalid observation id {value:?} at row {row}, expected <a>.<b>"))]
    InvalidObservationId { row: usize, value: String },
    #[snafu(display(
        "Observation id {value} at row {row} is stored as a number, store the ids as text"
    ))]
    NumericObservationId { row: usize, value: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type IrrResult<T> = Result<T, IrrError>;

/// Merges the command line options into the configuration. The command line takes precedence.
fn apply_args(config: &mut IrrConfig, args: &Args) -> IrrResult<()> {
    if let Some(w) = &args.excel_worksheet_name {
        config.input_settings.worksheet_name = Some(w.clone());
    }
    if !args.raters.is_empty() {
        config.columns.raters = Some(args.raters.clone());
    }
    if !args.by.is_empty() {
        config.analysis.analyze_by = Some(args.by.clone());
    }
    if !args.filter.is_empty() {
        let filters = config.analysis.filters.get_or_insert_with(Default::default);
        for f in args.filter.iter() {
            let (dim, values) = parse_filter_arg(f)?;
            filters.insert(
                dim,
                values.into_iter().map(serde_json::Value::String).collect(),
            );
        }
    }
    if let Some(m) = args.min_observation_id {
        config.analysis.min_observation_id = Some(m);
    }
    if !args.statistic.is_empty() {
        config.rules.statistics = Some(args.statistic.clone());
    }
    if let Some(w) = &args.weights {
        config.rules.weights = Some(w.clone());
    }
    if let Some(l) = &args.level {
        config.rules.level_of_measurement = Some(l.clone());
    }
    if !args.categories.is_empty() {
        config.rules.rating_categories = Some(args.categories.clone());
    }
    if let Some(o) = &args.out {
        config.output_settings.output_path = Some(o.clone());
    }
    Ok(())
}

/// Parses a filter of the form `Dimension=value1,value2`.
fn parse_filter_arg(s: &str) -> IrrResult<(String, Vec<String>)> {
    match s.split_once('=') {
        Some((dim, values)) if !dim.trim().is_empty() => Ok((
            dim.trim().to_string(),
            values
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
        )),
        _ => {
            whatever!(
                "Cannot understand filter {:?}, expected the form Dimension=value1,value2",
                s
            )
        }
    }
}

/// Applies the remapping of the labels, then the filters, on the working copy.
pub fn prepare_table(table: &mut ObservationTable, settings: &AnalysisSettings) -> IrrResult<()> {
    for (column, mapping) in settings.label_remapping.iter() {
        table.remap_labels(column, mapping)?;
    }

    let obs_column = settings.observation_id.as_str();
    match settings.min_observation_id {
        Some(min_id) => table.retain_min_observation_id(obs_column, min_id)?,
        None if table.has_column(obs_column) => {
            table.retain_min_observation_id(obs_column, DEFAULT_MIN_OBSERVATION_ID)?
        }
        None => {
            debug!(
                "prepare_table: no column {:?}, skipping the observation id filter",
                obs_column
            );
        }
    }

    for (dim, allowed) in settings.filters.iter() {
        table.retain_values(dim, allowed)?;
    }
    info!("prepare_table: {} observations after filtering", table.len());
    Ok(())
}

fn evaluate(
    statistic: Statistic,
    units: &[RatedUnit],
    settings: &AnalysisSettings,
) -> Result<Coefficient, AgreementErrors> {
    match statistic {
        Statistic::Ac2 => run_gwet_ac(units, &settings.gwet_rules).map(Coefficient::Gwet),
        Statistic::Ac1 => {
            let rules = GwetRules {
                weights: WeightScheme::Identity,
                categories: settings.gwet_rules.categories.clone(),
            };
            run_gwet_ac(units, &rules).map(Coefficient::Gwet)
        }
        Statistic::Alpha => {
            run_krippendorff_alpha(units, &settings.alpha_rules).map(Coefficient::Alpha)
        }
    }
}

/// Computes all the statistics, group by group.
///
/// A statistic that cannot be computed for a group is recorded as an error for this group,
/// and the evaluation continues with the next one.
pub fn analyze_groups(
    table: &ObservationTable,
    settings: &AnalysisSettings,
) -> IrrResult<Vec<GroupOutcome>> {
    let groups = table.group_by(&settings.analyze_by)?;
    info!(
        "analyze_groups: {} groups for {:?}",
        groups.len(),
        settings.analyze_by
    );
    let mut res: Vec<GroupOutcome> = Vec::new();
    for group in groups.iter() {
        let units = group.rows.rated_units(&settings.rater_columns)?;
        let mut outcomes: Vec<StatisticOutcome> = Vec::new();
        for statistic in settings.statistics.iter() {
            let result = evaluate(*statistic, &units, settings);
            match &result {
                Ok(c) => debug!(
                    "analyze_groups: {:?} {}: {}",
                    group.key,
                    statistic.label(),
                    c.value()
                ),
                Err(e) => warn!(
                    "Error for {} ({}): {}",
                    group.key.join(" / "),
                    statistic.label(),
                    e
                ),
            }
            outcomes.push(StatisticOutcome {
                statistic: *statistic,
                result,
            });
        }
        res.push(GroupOutcome {
            key: group.key.clone(),
            sample_size: group.rows.len(),
            outcomes,
        });
    }
    Ok(res)
}

fn write_summary(path: &str, pretty_js: &str) -> IrrResult<()> {
    if path == "stdout" {
        println!("{}", pretty_js);
        return Ok(());
    }
    info!("Writing summary to {:?}", path);
    fs::write(path, pretty_js).context(WritingSummarySnafu {
        path: path.to_string(),
    })
}

/// Compares the computed summary with a reference summary, and prints the differences.
fn check_reference(summary_ref: &serde_json::Value, pretty_js_stats: &str) -> IrrResult<()> {
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

/// Reads the configuration file (if any), applies the command line options and validates the result.
///
/// A relative input path in the configuration file is resolved against the directory of this file.
fn load_settings(args: &Args) -> IrrResult<AnalysisSettings> {
    let (mut config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path).parent().map(|p| p.to_path_buf());
            (config, root)
        }
        None => (IrrConfig::default(), None),
    };
    apply_args(&mut config, args)?;
    let mut settings = validate_settings(&config, root.as_deref())?;
    if let Some(input) = &args.input {
        settings.input_path = Some(input.clone());
    }
    info!("settings: {:?}", settings);
    Ok(settings)
}

pub fn run_analysis(args: &Args) -> IrrResult<()> {
    let settings = load_settings(args)?;

    let input_path = match &settings.input_path {
        Some(p) => p.clone(),
        None => {
            whatever!(
                "No input file: pass one with --input or set inputSettings.filePath in the configuration"
            )
        }
    };

    println!("{}", settings.title);
    let mut table = io_excel::read_observations(&input_path, &settings.worksheet)?;
    prepare_table(&mut table, &settings)?;
    if table.is_empty() {
        warn!("No observation left after filtering");
    }

    if args.show_data {
        println!("\nInput data ({} observations)", table.len());
        println!("{}", format_observation_table(&table));
    }

    let results = analyze_groups(&table, &settings)?;

    println!("\nAnalyse per {}", settings.analyze_by.join(" / "));
    println!(
        "{}",
        format_results_table(&settings.analyze_by, &settings.statistics, &results)
    );
    for g in results.iter() {
        for (statistic, message) in g.errors() {
            println!(
                "Error for {} ({}): {}",
                g.key.join(" / "),
                statistic.label(),
                message
            );
        }
    }

    let summary_js = build_summary_js(&settings, &results);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    if let Some(out) = &settings.output_path {
        write_summary(out, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        check_reference(&summary_ref, &pretty_js_stats)?;
    }

    Ok(())
}
