// The in-memory working copy of the observations.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use rater_agreement::RatedUnit;
use snafu::prelude::*;

use crate::irr::*;

/// The content of one cell of the worksheet.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// The representation used for filtering and grouping.
    ///
    /// Integral numbers are written without decimals, so that a category stored as `3.0`
    /// in the workbook reads as `3`.
    pub fn label(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(x) if x.fract() == 0.0 && x.abs() < 1e15 => format!("{}", *x as i64),
            Cell::Number(x) => format!("{}", x),
            Cell::Empty => "".to_string(),
        }
    }

    /// The cell as a rating score, if it holds an integral value.
    pub fn score(&self) -> Option<i64> {
        match self {
            Cell::Number(x) if x.fract() == 0.0 => Some(*x as i64),
            Cell::Text(s) => {
                let t = s.trim();
                t.parse::<i64>().ok().or_else(|| {
                    t.parse::<f64>()
                        .ok()
                        .filter(|x| x.fract() == 0.0)
                        .map(|x| x as i64)
                })
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// One group of observations, with the values of the grouping dimensions.
#[derive(PartialEq, Debug, Clone)]
pub struct Group {
    pub key: Vec<String>,
    pub rows: ObservationTable,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ObservationTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ObservationTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> IrrResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .context(ColumnNotFoundSnafu {
                column: name.to_string(),
                available: self.columns.clone(),
            })
    }

    /// The distinct labels of a column, in order of first appearance. Empty cells are skipped.
    pub fn unique_labels(&self, column: &str) -> IrrResult<Vec<String>> {
        let idx = self.column_index(column)?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut res: Vec<String> = Vec::new();
        for row in self.rows.iter() {
            let cell = &row[idx];
            if cell.is_empty() {
                continue;
            }
            let l = cell.label();
            if seen.insert(l.clone()) {
                res.push(l);
            }
        }
        Ok(res)
    }

    /// Only keeps the rows for which the label of the column is one of the allowed values.
    ///
    /// An empty list of allowed values keeps all the rows.
    pub fn retain_values(&mut self, column: &str, allowed: &[String]) -> IrrResult<()> {
        if allowed.is_empty() {
            debug!("retain_values: column: {:?}: no selection, keeping all rows", column);
            return Ok(());
        }
        let idx = self.column_index(column)?;
        let allowed: HashSet<&str> = allowed.iter().map(|s| s.as_str()).collect();
        let before = self.rows.len();
        self.rows
            .retain(|row| allowed.contains(row[idx].label().as_str()));
        debug!(
            "retain_values: column: {:?} allowed: {:?} rows: {} -> {}",
            column,
            allowed,
            before,
            self.rows.len()
        );
        Ok(())
    }

    /// Only keeps the observations whose sequence number (`b` in `<a>.<b>`) is at least `min_id`.
    ///
    /// An identifier that cannot be parsed is an error, the data is considered malformed.
    /// So is an identifier stored as a number: `3.10` and `3.1` cannot be told apart.
    pub fn retain_min_observation_id(&mut self, column: &str, min_id: u32) -> IrrResult<()> {
        let idx = self.column_index(column)?;
        let mut keep: Vec<bool> = Vec::with_capacity(self.rows.len());
        for (lineno, row) in self.rows.iter().enumerate() {
            let value = row[idx].label();
            if let Cell::Number(_) = row[idx] {
                return NumericObservationIdSnafu {
                    row: lineno + 2,
                    value,
                }
                .fail();
            }
            let seq = observation_sequence(&value).context(InvalidObservationIdSnafu {
                // The header is the first row of the sheet.
                row: lineno + 2,
                value: value.clone(),
            })?;
            keep.push(seq >= min_id);
        }
        let mut flags = keep.into_iter();
        self.rows.retain(|_| flags.next().unwrap_or(false));
        debug!(
            "retain_min_observation_id: min_id: {} rows left: {}",
            min_id,
            self.rows.len()
        );
        Ok(())
    }

    /// Replaces the labels of a column. The values without a mapping are kept as they are.
    pub fn remap_labels(
        &mut self,
        column: &str,
        mapping: &HashMap<String, String>,
    ) -> IrrResult<()> {
        let idx = self.column_index(column)?;
        for row in self.rows.iter_mut() {
            if let Some(label) = mapping.get(&row[idx].label()) {
                row[idx] = Cell::Text(label.clone());
            }
        }
        Ok(())
    }

    fn select_equal(&self, idx: usize, value: &str) -> ObservationTable {
        ObservationTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| !row[idx].is_empty() && row[idx].label() == value)
                .cloned()
                .collect(),
        }
    }

    /// Splits the table along one or two dimensions.
    ///
    /// The groups are nested: the values of the first dimension in order of first appearance,
    /// then within each of them the values of the second dimension. Combinations without any
    /// row are not returned.
    pub fn group_by(&self, dimensions: &[String]) -> IrrResult<Vec<Group>> {
        match dimensions {
            [first] => {
                let idx = self.column_index(first)?;
                Ok(self
                    .unique_labels(first)?
                    .into_iter()
                    .map(|v| Group {
                        rows: self.select_equal(idx, &v),
                        key: vec![v],
                    })
                    .collect())
            }
            [first, second] => {
                let idx1 = self.column_index(first)?;
                let idx2 = self.column_index(second)?;
                let mut res: Vec<Group> = Vec::new();
                for v1 in self.unique_labels(first)? {
                    let sub = self.select_equal(idx1, &v1);
                    for v2 in sub.unique_labels(second)? {
                        res.push(Group {
                            rows: sub.select_equal(idx2, &v2),
                            key: vec![v1.clone(), v2],
                        });
                    }
                }
                Ok(res)
            }
            _ => {
                whatever!(
                    "Grouping requires one or two dimensions, got {:?}",
                    dimensions
                )
            }
        }
    }

    /// One rated unit per row, with the scores of the rater columns.
    ///
    /// Cells that do not contain an integral score are treated as missing ratings.
    pub fn rated_units(&self, raters: &[String]) -> IrrResult<Vec<RatedUnit>> {
        let indexes: Vec<usize> = raters
            .iter()
            .map(|r| self.column_index(r))
            .collect::<IrrResult<Vec<usize>>>()?;
        let mut res: Vec<RatedUnit> = Vec::with_capacity(self.rows.len());
        for row in self.rows.iter() {
            let mut ratings: Vec<Option<i64>> = Vec::with_capacity(indexes.len());
            for idx in indexes.iter() {
                let cell = &row[*idx];
                let score = cell.score();
                if score.is_none() && !cell.is_empty() {
                    warn!(
                        "rated_units: column {:?}: cannot read {:?} as a score, treating it as missing",
                        self.columns[*idx], cell
                    );
                }
                ratings.push(score);
            }
            res.push(RatedUnit { ratings });
        }
        Ok(res)
    }
}

/// The sequence number `b` of an observation identifier `<a>.<b>`.
pub fn observation_sequence(value: &str) -> Option<u32> {
    value.split('.').nth(1).and_then(|s| s.trim().parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sample_table() -> ObservationTable {
        let columns: Vec<String> = ["Beobachtung ID", "Situation", "Kategorie", "TM", "X"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = vec![
            vec![text("1.1"), text("Plenum"), Cell::Number(1.0), Cell::Number(3.0), Cell::Number(3.0)],
            vec![text("1.2"), text("Gruppe"), Cell::Number(2.0), Cell::Number(4.0), Cell::Number(5.0)],
            vec![text("2.1"), text("Plenum"), Cell::Number(2.0), Cell::Number(2.0), text("n/a")],
            vec![text("2.3"), text("Gruppe"), Cell::Number(1.0), text("6"), Cell::Empty],
            vec![text("3.2"), text("Plenum"), Cell::Number(1.0), Cell::Number(1.0), Cell::Number(2.0)],
        ];
        ObservationTable { columns, rows }
    }

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn labels_and_scores() {
        assert_eq!(Cell::Number(3.0).label(), "3");
        assert_eq!(Cell::Number(1.5).label(), "1.5");
        assert_eq!(Cell::Number(4.0).score(), Some(4));
        assert_eq!(Cell::Number(4.5).score(), None);
        assert_eq!(text(" 5 ").score(), Some(5));
        assert_eq!(text("2.0").score(), Some(2));
        assert_eq!(text("abc").score(), None);
        assert_eq!(Cell::Empty.score(), None);
    }

    #[test]
    fn unique_in_order() {
        let t = sample_table();
        assert_eq!(t.unique_labels("Situation").unwrap(), s(&["Plenum", "Gruppe"]));
        assert_eq!(t.unique_labels("Kategorie").unwrap(), s(&["1", "2"]));
    }

    #[test]
    fn missing_column() {
        let t = sample_table();
        let err = t.unique_labels("Skala").unwrap_err();
        assert!(matches!(err, IrrError::ColumnNotFound { .. }), "{:?}", err);
    }

    #[test]
    fn filters() {
        let mut t = sample_table();
        t.retain_values("Situation", &s(&["Plenum"])).unwrap();
        assert_eq!(t.len(), 3);
        t.retain_min_observation_id("Beobachtung ID", 2).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.rows[0][0], text("3.2"));

        let mut t = sample_table();
        t.retain_values("Situation", &[]).unwrap();
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn observation_ids() {
        assert_eq!(observation_sequence("1.2"), Some(2));
        assert_eq!(observation_sequence("12.10"), Some(10));
        assert_eq!(observation_sequence("12"), None);
        assert_eq!(observation_sequence("a.b"), None);

        let mut t = sample_table();
        t.rows[1][0] = text("bad");
        let err = t
            .retain_min_observation_id("Beobachtung ID", 1)
            .unwrap_err();
        assert!(
            matches!(err, IrrError::InvalidObservationId { row: 3, .. }),
            "{:?}",
            err
        );
    }

    #[test]
    fn numeric_observation_ids() {
        let mut t = ObservationTable {
            columns: s(&["Beobachtung ID"]),
            rows: vec![vec![Cell::Number(3.10)], vec![Cell::Number(3.2)]],
        };
        let err = t
            .retain_min_observation_id("Beobachtung ID", 5)
            .unwrap_err();
        assert!(
            matches!(&err, IrrError::NumericObservationId { row: 2, value } if value == "3.1"),
            "{:?}",
            err
        );
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn remapping() {
        let mut t = sample_table();
        let mapping: HashMap<String, String> =
            [("1".to_string(), "Klassenführung".to_string())].into_iter().collect();
        t.remap_labels("Kategorie", &mapping).unwrap();
        assert_eq!(
            t.unique_labels("Kategorie").unwrap(),
            s(&["Klassenführung", "2"])
        );
    }

    #[test]
    fn group_one_dimension() {
        let t = sample_table();
        let groups = t.group_by(&s(&["Kategorie"])).unwrap();
        let keys: Vec<Vec<String>> = groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(keys, vec![s(&["1"]), s(&["2"])]);
        assert_eq!(groups[0].rows.len(), 3);
        assert_eq!(groups[1].rows.len(), 2);
    }

    #[test]
    fn group_two_dimensions() {
        let t = sample_table();
        let groups = t.group_by(&s(&["Situation", "Kategorie"])).unwrap();
        let keys: Vec<Vec<String>> = groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(
            keys,
            vec![
                s(&["Plenum", "1"]),
                s(&["Plenum", "2"]),
                s(&["Gruppe", "2"]),
                s(&["Gruppe", "1"])
            ]
        );
        let sizes: Vec<usize> = groups.iter().map(|g| g.rows.len()).collect();
        assert_eq!(sizes, vec![2, 1, 1, 1]);
    }

    #[test]
    fn group_too_many_dimensions() {
        let t = sample_table();
        assert!(t.group_by(&s(&["Situation", "Kategorie", "TM"])).is_err());
        assert!(t.group_by(&[]).is_err());
    }

    #[test]
    fn units() {
        let t = sample_table();
        let units = t.rated_units(&s(&["TM", "X"])).unwrap();
        assert_eq!(units.len(), 5);
        assert_eq!(units[0], RatedUnit::pair(3, 3));
        assert_eq!(units[2].ratings, vec![Some(2), None]);
        assert_eq!(units[3].ratings, vec![Some(6), None]);
    }
}
