use crate::sheet::{Cell, Sheet};
use anyhow::Context;
use csv::ReaderBuilder as CsvReaderBuilder;
use indexmap::IndexMap;
use std::io::Read;

/// Reads a unit sheet exported as CSV. The first record holds the column headers; every
/// following record is one sheet row, starting at row 0.
///
/// Headers repeated within the sheet get `.1`, `.2`, ... suffixes on their later
/// occurrences, and blank headers are named after their position.
pub fn sheet_from_csv(name: impl Into<String>, file: impl Read) -> anyhow::Result<Sheet> {
    let name = name.into();
    let mut reader = CsvReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(file);

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => unique_headers(
            record
                .with_context(|| format!("could not read headers of sheet {name}"))?
                .iter(),
        ),
        None => return Ok(Sheet::new(name)),
    };

    let mut columns = vec![Vec::new(); headers.len()];
    for (row, record) in records.enumerate() {
        let record = record.with_context(|| format!("could not read row {row} of sheet {name}"))?;
        for (column, cells) in columns.iter_mut().enumerate() {
            cells.push(record.get(column).map_or(Cell::Empty, Cell::parse));
        }
    }

    Ok(headers
        .into_iter()
        .zip(columns)
        .fold(Sheet::new(name), |sheet, (header, cells)| {
            sheet.with_column(header, cells)
        }))
}

fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: IndexMap<String, usize> = IndexMap::new();

    raw.enumerate()
        .map(|(index, header)| {
            let header = match header.trim() {
                "" => format!("Unnamed: {index}"),
                header => header.to_string(),
            };
            let occurrences = seen.entry(header.clone()).or_default();
            *occurrences += 1;
            match *occurrences {
                1 => header,
                n => format!("{header}.{}", n - 1),
            }
        })
        .collect()
}
