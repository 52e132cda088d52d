// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One co-rated unit (an observation, a subject) with the score given by each rater.
///
/// A missing score is represented by `None`. All the units that are passed to the same
/// computation must have the same number of raters.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct RatedUnit {
    pub ratings: Vec<Option<i64>>,
}

impl RatedUnit {
    /// A unit rated by two raters, none of them missing.
    pub fn pair(first: i64, second: i64) -> RatedUnit {
        RatedUnit {
            ratings: vec![Some(first), Some(second)],
        }
    }

    /// The scores that are present, in rater order.
    pub fn present(&self) -> impl Iterator<Item = i64> + '_ {
        self.ratings.iter().filter_map(|r| *r)
    }
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone)]
pub struct AlphaResult {
    pub alpha: f64,
    pub level: LevelOfMeasurement,
    /// The total number of pairable values (n in Krippendorff's notation).
    pub pairable_values: u64,
    /// The number of units that had at least two values.
    pub pairable_units: usize,
    pub value_domain: Vec<i64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct GwetResult {
    pub coefficient: f64,
    pub percent_agreement: f64,
    pub chance_agreement: f64,
    /// Not available when fewer than two subjects have been rated.
    pub std_error: Option<f64>,
    pub subjects: usize,
    pub raters: usize,
    pub weights: WeightScheme,
    pub categories: Vec<i64>,
}

impl GwetResult {
    /// AC1 for unweighted (identity) analysis, AC2 for any other weights.
    pub fn name(&self) -> &'static str {
        match self.weights {
            WeightScheme::Identity => "AC1",
            _ => "AC2",
        }
    }
}

/// Errors that prevent a coefficient from being computed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AgreementErrors {
    EmptyData,
    NotEnoughRaters,
    RaterCountMismatch { expected: usize, found: usize },
    /// There has to be more than one value in the domain.
    SingleValueDomain,
    NoPairableValues,
    NoDoubleRatedSubjects,
    PerfectChanceAgreement,
    EmptyCategories,
}

impl Error for AgreementErrors {}

impl Display for AgreementErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgreementErrors::EmptyData => write!(f, "no rated unit in the data"),
            AgreementErrors::NotEnoughRaters => write!(f, "at least two raters are required"),
            AgreementErrors::RaterCountMismatch { expected, found } => write!(
                f,
                "inconsistent number of raters: expected {}, found {}",
                expected, found
            ),
            AgreementErrors::SingleValueDomain => {
                write!(f, "there has to be more than one value in the domain")
            }
            AgreementErrors::NoPairableValues => {
                write!(f, "no unit has been rated by at least two raters")
            }
            AgreementErrors::NoDoubleRatedSubjects => {
                write!(f, "no subject has at least two valid ratings")
            }
            AgreementErrors::PerfectChanceAgreement => {
                write!(f, "chance agreement is 1, the coefficient is undefined")
            }
            AgreementErrors::EmptyCategories => write!(f, "the list of categories is empty"),
        }
    }
}

// ********* Configuration **********

/// The metric used to compare two values in Krippendorff's alpha.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum LevelOfMeasurement {
    Nominal,
    Ordinal,
    Interval,
    Ratio,
}

/// The weights of the partial agreements in Gwet's coefficient.
///
/// They follow the definitions of Gwet's `irrCAC` package:
/// every scheme is derived from a disagreement `d(k, l)` between two categories and then
/// normalised as `1 - d / max(d)`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum WeightScheme {
    /// No partial agreement, this gives Gwet's AC1.
    Identity,
    Ordinal,
    Linear,
    Quadratic,
    Radical,
    Ratio,
    Circular,
    Bipolar,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AlphaRules {
    pub level: LevelOfMeasurement,
}

impl AlphaRules {
    pub const DEFAULT_RULES: AlphaRules = AlphaRules {
        level: LevelOfMeasurement::Ordinal,
    };
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GwetRules {
    pub weights: WeightScheme,
    /// The rating categories, in order. If not provided, they are inferred from the data.
    pub categories: Option<Vec<i64>>,
}

impl GwetRules {
    pub const DEFAULT_RULES: GwetRules = GwetRules {
        weights: WeightScheme::Ordinal,
        categories: None,
    };
}
