use clap::Parser;

/// Inter-rater reliability per subgroup, for paired observer ratings stored in Excel.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the description of the analysis.
    /// See the manual of the rater_agreement crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The Excel workbook (.xlsx) with the observations. Setting this option overrides
    /// the file that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default data_transformed) The name of the worksheet to read.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (column name, repeated) The columns with the scores of each rater. Defaults to TM and X.
    #[clap(long, value_parser)]
    pub raters: Vec<String>,

    /// (dimension name, once or twice) The dimension(s) the results are computed for.
    #[clap(short, long, value_parser)]
    pub by: Vec<String>,

    /// (Dimension=value1,value2, repeated) Only keeps the observations with these values.
    /// All the values are kept for the dimensions that are not listed.
    #[clap(short, long, value_parser)]
    pub filter: Vec<String>,

    /// (default 1) Only keeps the observations whose id <a>.<b> has a b greater or equal to this value.
    #[clap(long, value_parser)]
    pub min_observation_id: Option<u32>,

    /// (ac2, ac1 or alpha, repeated; default ac2) The coefficients to compute.
    #[clap(short, long, value_parser)]
    pub statistic: Vec<String>,

    /// (default ordinal) The weights for Gwet's AC2: identity, ordinal, linear, quadratic,
    /// radical, ratio, circular or bipolar.
    #[clap(long, value_parser)]
    pub weights: Option<String>,

    /// (default ordinal) The level of measurement for Krippendorff's alpha: nominal, ordinal,
    /// interval or ratio.
    #[clap(long, value_parser)]
    pub level: Option<String>,

    /// (integers, repeated; default 1 to 6) The rating categories.
    #[clap(long, value_parser)]
    pub categories: Vec<i64>,

    /// (file path, 'stdout' or empty) If specified, the summary of the analysis will be written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, irrtab will check that the
    /// computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Prints the observations that are left after filtering.
    #[clap(long, takes_value = false)]
    pub show_data: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
