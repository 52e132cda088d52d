// Primitives for reading the observations from Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::{debug, info};
use snafu::prelude::*;

use crate::irr::{
    table::{Cell, ObservationTable},
    *,
};

/// Loads one worksheet of an `.xlsx` workbook. The first row is taken as the header.
pub fn read_observations(path: &str, worksheet: &str) -> IrrResult<ObservationTable> {
    info!(
        "read_observations: path: {:?} worksheet: {:?}",
        path, worksheet
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path.to_string(),
    })?;
    let available: Vec<String> = workbook.sheet_names().to_vec();
    let wrange = workbook
        .worksheet_range(worksheet)
        .context(MissingWorksheetSnafu {
            path: path.to_string(),
            worksheet: worksheet.to_string(),
            available,
        })?
        .context(OpeningExcelSnafu {
            path: path.to_string(),
        })?;
    debug!("read_observations: range size: {:?}", wrange.get_size());
    let table = table_from_rows(wrange.rows(), worksheet)?;
    info!(
        "read_observations: {} observations, columns: {:?}",
        table.len(),
        table.columns
    );
    Ok(table)
}

/// Builds the table out of the raw rows of a worksheet.
pub fn table_from_rows<'a, I>(mut rows: I, worksheet: &str) -> IrrResult<ObservationTable>
where
    I: Iterator<Item = &'a [DataType]>,
{
    let header = rows.next().context(EmptyExcelSnafu {
        worksheet: worksheet.to_string(),
    })?;
    debug!("table_from_rows: header: {:?}", header);
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, dt)| match to_cell(dt) {
            Cell::Empty => format!("column_{}", idx + 1),
            c => c.label().trim().to_string(),
        })
        .collect();

    let mut res: Vec<Vec<Cell>> = Vec::new();
    for row in rows {
        let mut cells: Vec<Cell> = row.iter().map(to_cell).collect();
        // Fully blank lines at the end of a sheet are frequent with manual edits.
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        cells.resize(columns.len(), Cell::Empty);
        res.push(cells);
    }
    Ok(ObservationTable {
        columns,
        rows: res,
    })
}

fn to_cell(dt: &DataType) -> Cell {
    match dt {
        DataType::String(s) if s.trim().is_empty() => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Float(f) => Cell::Number(*f),
        DataType::DateTime(f) => Cell::Number(*f),
        DataType::Bool(b) => Cell::Text(b.to_string()),
        DataType::Empty => Cell::Empty,
        _ => Cell::Empty,
    }
}
