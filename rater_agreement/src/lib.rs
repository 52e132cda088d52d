/*!

Inter-rater reliability coefficients for categorical and ordinal ratings.

This crate computes two chance-corrected agreement coefficients on raw ratings:
- Krippendorff's alpha, for nominal, ordinal, interval and ratio data
- Gwet's AC1 (unweighted) and AC2 (weighted)

The input is a list of [RatedUnit]s: each unit holds the score given by every rater,
possibly missing. The simplest way to assemble them is through the [builder::Builder].

```
use rater_agreement::builder::Builder;
use rater_agreement::{AlphaRules, GwetRules};
# use rater_agreement::AgreementErrors;

let mut builder = Builder::new(2)?;
builder.add_pair(1, 1)?;
builder.add_pair(2, 3)?;
builder.add_unit(&[Some(4), None])?;
builder.add_pair(5, 5)?;

let alpha = builder.alpha(&AlphaRules::DEFAULT_RULES)?;
let ac2 = builder.gwet(&GwetRules::DEFAULT_RULES)?;
assert!(alpha.alpha > 0.5);
assert_eq!(ac2.name(), "AC2");
# Ok::<(), AgreementErrors>(())
```

See the [manual] for the definitions and the conventions used.
*/

mod config;
mod gwet;
mod krippendorff;

pub mod builder;
pub mod manual;

use log::debug;

pub use crate::config::*;
pub use crate::gwet::{run_gwet_ac, weight_matrix};
pub use crate::krippendorff::run_krippendorff_alpha;

/// Checks that the units are non-empty and share the same number of raters.
///
/// Returns the number of raters.
pub(crate) fn check_units(units: &[RatedUnit]) -> Result<usize, AgreementErrors> {
    let first = units.first().ok_or(AgreementErrors::EmptyData)?;
    let expected = first.ratings.len();
    if expected < 2 {
        return Err(AgreementErrors::NotEnoughRaters);
    }
    if let Some(u) = units.iter().find(|u| u.ratings.len() != expected) {
        debug!("check_units: unit with wrong arity: {:?}", u);
        return Err(AgreementErrors::RaterCountMismatch {
            expected,
            found: u.ratings.len(),
        });
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_units() {
        assert_eq!(check_units(&[]), Err(AgreementErrors::EmptyData));
    }

    #[test]
    fn single_rater() {
        let units = vec![RatedUnit {
            ratings: vec![Some(1)],
        }];
        assert_eq!(check_units(&units), Err(AgreementErrors::NotEnoughRaters));
    }

    #[test]
    fn mismatched_raters() {
        let units = vec![
            RatedUnit::pair(1, 2),
            RatedUnit {
                ratings: vec![Some(1), Some(2), None],
            },
        ];
        assert_eq!(
            check_units(&units),
            Err(AgreementErrors::RaterCountMismatch {
                expected: 2,
                found: 3
            })
        );
    }
}
