use std::fmt::Write as _;

use crate::column::Column;
use crate::dataset::Dataset;
use crate::decode::{DecodedColumn, PlainColumn};
use crate::element::Cell;
use crate::scalar::Scalar;

/// Text shown for the native absent marker of plain columns.
const PLAIN_ABSENT: &str = "NA";

/// `Present(v)` renders as `v`, `Absent(r)` as `<r>`.
#[must_use]
pub fn format_cell(cell: &Cell) -> String {
    cell.to_string()
}

#[must_use]
pub fn format_plain(value: Option<&Scalar>) -> String {
    value.map_or_else(|| PLAIN_ABSENT.to_owned(), ToString::to_string)
}

fn pad(cells: &mut [String], width: usize, right: bool) {
    for cell in cells {
        let fill = width.saturating_sub(cell.chars().count());
        if fill > 0 {
            if right {
                cell.insert_str(0, &" ".repeat(fill));
            } else {
                cell.push_str(&" ".repeat(fill));
            }
        }
    }
}

fn width_of(cells: &[String]) -> usize {
    cells.iter().map(|cell| cell.chars().count()).max().unwrap_or(0)
}

/// Formats every cell to a common width: numeric columns are right-aligned,
/// everything else left-aligned.
#[must_use]
pub fn format_column(column: &Column) -> Vec<String> {
    let mut cells: Vec<String> = column.data().iter().map(format_cell).collect();
    let width = width_of(&cells);
    pad(&mut cells, width, column.types().value.is_numeric());
    cells
}

fn raw_cells(column: &DecodedColumn) -> Vec<String> {
    match column {
        DecodedColumn::Channeled(column) => column.data().iter().map(format_cell).collect(),
        DecodedColumn::Plain(column) => plain_cells(column),
    }
}

fn plain_cells(column: &PlainColumn) -> Vec<String> {
    column
        .values()
        .iter()
        .map(|value| format_plain(value.as_ref()))
        .collect()
}

/// Renders a dataset as an aligned text table with a header line, showing at
/// most `max_rows` rows.
#[must_use]
pub fn format_dataset(dataset: &Dataset, max_rows: Option<usize>) -> String {
    let rows = max_rows.map_or(dataset.num_rows(), |limit| limit.min(dataset.num_rows()));
    let columns: Vec<Vec<String>> = dataset
        .columns()
        .iter()
        .map(|named| {
            let mut cells = vec![named.name.clone()];
            cells.extend(raw_cells(&named.column).into_iter().take(rows));
            let width = width_of(&cells);
            pad(&mut cells, width, named.column.value_type().is_numeric());
            cells
        })
        .collect();

    let mut out = String::new();
    for row in 0..=rows {
        let line = columns
            .iter()
            .map(|cells| cells[row].as_str())
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", line.trim_end());
    }
    if rows < dataset.num_rows() {
        let _ = writeln!(out, "... {} more rows", dataset.num_rows() - rows);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Channeled, Reason};
    use crate::promote::ChannelTypes;
    use crate::scalar::ScalarType;

    #[test]
    fn numeric_columns_align_right() {
        let column = Column::new(
            ChannelTypes::new(ScalarType::Int, ScalarType::Text),
            vec![
                Channeled::Present(Scalar::Int(20)),
                Channeled::Absent(Reason::from("REFUSED")),
                Channeled::Absent(Reason::ParseFailure),
            ]
            .into(),
        )
        .unwrap();
        assert_eq!(
            format_column(&column),
            vec![
                "             20",
                "      <REFUSED>",
                "<parse failure>"
            ]
        );
    }

    #[test]
    fn text_columns_align_left() {
        let column = Column::new(
            ChannelTypes::new(ScalarType::Text, ScalarType::Int),
            vec![
                Channeled::Present(Scalar::from("ab")),
                Channeled::Absent(Reason::from(-9_i64)),
            ]
            .into(),
        )
        .unwrap();
        assert_eq!(format_column(&column), vec!["ab  ", "<-9>"]);
    }

    #[test]
    fn plain_absent_renders_as_na() {
        assert_eq!(format_plain(None), "NA");
        assert_eq!(format_plain(Some(&Scalar::Float(1.5))), "1.5");
    }
}
