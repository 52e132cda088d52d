pub use crate::config::*;

/// A builder for collecting rated units.
///
/// ```
/// use rater_agreement::builder::Builder;
/// use rater_agreement::{GwetRules, WeightScheme};
/// # use rater_agreement::AgreementErrors;
///
/// let mut builder = Builder::new(2)?;
/// builder.add_pair(4, 4)?;
/// builder.add_pair(2, 3)?;
///
/// let rules = GwetRules {
///     weights: WeightScheme::Ordinal,
///     categories: Some(vec![1, 2, 3, 4, 5, 6]),
/// };
/// let res = builder.gwet(&rules)?;
/// assert_eq!(res.subjects, 2);
/// # Ok::<(), AgreementErrors>(())
/// ```
pub struct Builder {
    pub(crate) _num_raters: usize,
    pub(crate) _units: Vec<RatedUnit>,
}

impl Builder {
    pub fn new(num_raters: usize) -> Result<Builder, AgreementErrors> {
        if num_raters < 2 {
            return Err(AgreementErrors::NotEnoughRaters);
        }
        Ok(Builder {
            _num_raters: num_raters,
            _units: Vec::new(),
        })
    }

    /// Adds a unit rated by two raters.
    ///
    /// It is the simplest use case for paired observations.
    pub fn add_pair(&mut self, first: i64, second: i64) -> Result<(), AgreementErrors> {
        self.add_unit(&[Some(first), Some(second)])
    }

    /// Adds a unit, with one entry per rater. Missing ratings are `None`.
    pub fn add_unit(&mut self, ratings: &[Option<i64>]) -> Result<(), AgreementErrors> {
        if ratings.len() != self._num_raters {
            return Err(AgreementErrors::RaterCountMismatch {
                expected: self._num_raters,
                found: ratings.len(),
            });
        }
        self._units.push(RatedUnit {
            ratings: ratings.to_vec(),
        });
        Ok(())
    }

    pub fn units(&self) -> &[RatedUnit] {
        &self._units
    }

    pub fn alpha(&self, rules: &AlphaRules) -> Result<AlphaResult, AgreementErrors> {
        crate::run_krippendorff_alpha(&self._units, rules)
    }

    pub fn gwet(&self, rules: &GwetRules) -> Result<GwetResult, AgreementErrors> {
        crate::run_gwet_ac(&self._units, rules)
    }
}
