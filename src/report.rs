//! Tabular output of dashboard rows
//!
//! Rows are any `Serialize` type. Nested fields are flattened to dotted
//! columns for the table and CSV renderings; JSON keeps the nesting.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::dashboard::NO_DATA;
use crate::data::normalize::{flatten, FlatRecord};
use crate::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 => format!("{:.1}", f),
            (None, Some(f)) => format!("{:.4}", f),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn flat_rows<T: Serialize>(rows: &[T]) -> Result<(Vec<String>, Vec<FlatRecord>)> {
    let records = rows
        .iter()
        .map(|row| Ok(flatten(&serde_json::to_value(row)?)))
        .collect::<Result<Vec<_>>>()?;

    // columns in first-seen order across all rows
    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    Ok((columns, records))
}

/// Render `rows` in `format`.
///
/// Nothing to render gives the no-data notice as a table, `[]` as JSON and
/// no output at all as CSV.
pub fn write_rows<T, W>(rows: &[T], format: OutputFormat, mut writer: W) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => {
            if rows.is_empty() {
                return Ok(());
            }
            let (columns, records) = flat_rows(rows)?;
            let mut out = csv::Writer::from_writer(writer);
            out.write_record(&columns)?;
            for record in &records {
                out.write_record(columns.iter().map(|c| cell(record.get(c))))?;
            }
            out.flush()?;
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                writeln!(writer, "{}", NO_DATA)?;
                return Ok(());
            }
            let (columns, records) = flat_rows(rows)?;
            let cells: Vec<Vec<String>> = records
                .iter()
                .map(|r| columns.iter().map(|c| cell(r.get(c))).collect())
                .collect();

            let widths: Vec<usize> = columns
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    cells
                        .iter()
                        .map(|row| row[i].chars().count())
                        .chain(std::iter::once(c.chars().count()))
                        .max()
                        .unwrap_or(0)
                })
                .collect();

            let line = |values: &[String]| {
                values
                    .iter()
                    .zip(&widths)
                    .map(|(v, w)| format!("{:<width$}", v, width = *w))
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            };

            writeln!(writer, "{}", line(&columns))?;
            let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
            writeln!(writer, "{}", "─".repeat(total))?;
            for row in &cells {
                writeln!(writer, "{}", line(row))?;
            }
        }
    }
    Ok(())
}
