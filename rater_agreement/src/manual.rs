/*!

This is the long-form manual for `rater_agreement` and `irrtab`.

## Input formats

`irrtab` reads Excel workbooks (`.xlsx`). The first row of the worksheet is the header,
every following row is one observation rated by (by default) two raters:

| Beobachtung ID | Situation | Sozialform | Skala | Kategorie | TM | X |
|----------------|-----------|------------|-------|-----------|----|---|
| 1.1            | Plenum    | Einzeln    | A     | 1         | 4  | 5 |
| 1.2            | Plenum    | Gruppe     | A     | 2         | 3  | 3 |
| ...            |           |            |       |           |    |   |

The observation ids must be stored as text: a number cell cannot distinguish `3.10` from `3.1`,
so it is rejected.

The worksheet `data_transformed` is used unless another one is provided with
`--excel-worksheet-name`. The names of all the columns can be changed in the configuration file.

## Coefficients

### Krippendorff's alpha

Computed through the coincidence matrix of the pairable values. Units (rows) with fewer than
two ratings are not pairable and are ignored. The value domain is made of the values that
are observed in the data: a subgroup in which all the raters always gave the same score
has no defined alpha and is reported as an error.

The levels of measurement `nominal`, `ordinal`, `interval` and `ratio` are supported.

### Gwet's AC1 and AC2

Computed on raw ratings, following Gwet's `irrCAC` package. AC1 uses identity weights,
AC2 uses any other weighting scheme: `ordinal`, `linear`, `quadratic`, `radical`, `ratio`,
`circular` or `bipolar`.

The rating categories default to `1, 2, 3, 4, 5, 6`. Ratings outside of the categories are
ignored. The standard error is reported without finite population correction.

## Configuration

All the options can be passed in a JSON file with the `--config` flag:

```json
{
  "outputSettings": { "title": "Krippendorff's Alpha in der Schule" },
  "inputSettings": { "filePath": "ratings.xlsx", "worksheetName": "data_transformed" },
  "columns": {
    "raters": ["TM", "X"],
    "preFilter": ["Situation", "Sozialform", "Skala"],
    "dimensions": ["Kategorie", "Beobachtung ID"],
    "observationId": "Beobachtung ID"
  },
  "rules": {
    "statistics": ["ac2", "alpha"],
    "weights": "ordinal",
    "levelOfMeasurement": "ordinal",
    "ratingCategories": [1, 2, 3, 4, 5, 6]
  },
  "analysis": {
    "minObservationId": 1,
    "filters": { "Situation": ["Plenum"] },
    "analyzeBy": ["Skala", "Kategorie"],
    "labelRemapping": { "Kategorie": { "1": "Klassenführung", "2": "Unterstützung" } }
  }
}
```

The `filePath` is relative to the directory of the configuration file. Options passed on the
command line take precedence over the ones in the configuration file.

## Filters

- `minObservationId`: the observation identifiers are of the form `<a>.<b>`. Only the rows with
  `b` greater or equal to this value are kept.
- `filters`: for each pre-filter dimension, the values to keep. A dimension that is not listed
  keeps all its values.
- `labelRemapping`: replaces the raw values of a column by labels, before filtering and grouping.

## Output

For each group (one or two dimensions), `irrtab` reports each coefficient and the sample size
(number of rows in the group). A group for which a coefficient cannot be computed is reported
with the error message, and the other groups are still evaluated.

The summary can be written in JSON format with `--out`, and compared against a reference
summary with `--reference`.
*/
