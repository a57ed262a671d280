use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// A single cell of a calculation sheet.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parses raw cell text the way a spreadsheet export presents it: blank is empty,
    /// anything numeric is a number, everything else is text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(number) => Cell::Number(number),
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    /// Whether the cell holds no value. NaN counts as empty, matching how sheet tools
    /// surface blank numeric cells.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(number) => number.is_nan(),
            Cell::Text(text) => text.trim().is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(number) if !number.is_nan() => Some(*number),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(number) => write!(f, "{number}"),
            Cell::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

/// One calculation sheet: the tabular record for a single unit.
///
/// Columns are addressed by their header text. Row 0 of every column holds a secondary
/// label (or, for thermal bridges, the psi value); data starts at row 1.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    name: String,
    columns: IndexMap<String, Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Default::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds (or replaces) a column.
    pub fn with_column(mut self, header: impl Into<String>, cells: Vec<Cell>) -> Self {
        self.insert_column(header, cells);
        self
    }

    pub fn insert_column(&mut self, header: impl Into<String>, cells: Vec<Cell>) {
        self.columns.insert(header.into(), cells);
    }

    pub fn remove_column(&mut self, header: &str) -> Option<Vec<Cell>> {
        self.columns.shift_remove(header)
    }

    /// The cells of a column. An absent column reads as entirely empty.
    pub fn column(&self, header: &str) -> &[Cell] {
        self.columns
            .get(header)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn cell(&self, header: &str, row: usize) -> &Cell {
        self.column(header).get(row).unwrap_or(&Cell::Empty)
    }

    /// Data cells of a column (row 1 onwards).
    pub fn data_cells(&self, header: &str) -> &[Cell] {
        self.column(header).get(1..).unwrap_or_default()
    }

    /// Number of populated data cells in a column.
    pub fn populated_count(&self, header: &str) -> usize {
        self.data_cells(header)
            .iter()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    /// Length of the longest column, i.e. the number of rows in the sheet.
    pub fn row_count(&self) -> usize {
        self.columns.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("", Cell::Empty)]
    #[case("   ", Cell::Empty)]
    #[case("12.5", Cell::Number(12.5))]
    #[case(" 3 ", Cell::Number(3.))]
    #[case("External wall", Cell::Text("External wall".into()))]
    fn should_parse_raw_cells(#[case] raw: &str, #[case] expected: Cell) {
        assert_eq!(Cell::parse(raw), expected);
    }

    #[test]
    fn should_treat_nan_as_empty() {
        assert!(Cell::Number(f64::NAN).is_empty());
        assert_eq!(Cell::Number(f64::NAN).as_f64(), None);
        assert!(!Cell::Number(0.).is_empty());
    }

    #[test]
    fn should_read_absent_columns_as_empty() {
        let sheet = Sheet::new("Unit 1");
        assert!(sheet.column("Element type").is_empty());
        assert_eq!(sheet.cell("Element type", 1), &Cell::Empty);
        assert_eq!(sheet.populated_count("Element type"), 0);
    }

    #[test]
    fn should_count_populated_data_cells_from_row_one() {
        let sheet = Sheet::new("Unit 1").with_column(
            "Element name",
            vec!["label".into(), "W1".into(), Cell::Empty, "W2".into()],
        );
        assert_eq!(sheet.populated_count("Element name"), 2);
        assert_eq!(sheet.data_cells("Element name").len(), 3);
        assert_eq!(sheet.row_count(), 4);
    }
}
