//! Plain-text user tables.
//!
//! One row per node, seven whitespace-separated columns:
//!
//! ```text
//! r   f   -f'   g   -g'   h   -h'
//! ```
//!
//! `f` is the electrostatics shape, `g` the dispersion shape and `h` the repulsion shape.
//! Rows must start at `r = 0` and be uniformly spaced. Lines starting with `#` or `@` are
//! comments.

use super::spline::from_nodes;
use super::{Channel, InterpolationTable, TableError, TableLayout, TableLookup};
use crate::core::forcefield::potentials::RadialValue;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

const COLUMNS: usize = 7;
const SPACING_TOLERANCE: f64 = 1e-5;

fn column_pair(channel: Channel) -> usize {
    match channel {
        Channel::Electrostatics => 1,
        Channel::Dispersion => 3,
        Channel::Repulsion => 5,
    }
}

/// Reads a user table and keeps the channels of `layout`.
pub fn read_user_table<R: BufRead>(
    reader: R,
    layout: TableLayout,
) -> Result<InterpolationTable, TableError> {
    let mut rows: Vec<[f64; COLUMNS]> = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|e| TableError::Parse {
            line: line_number,
            message: e.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('@') {
            continue;
        }

        let mut row = [0.0; COLUMNS];
        let mut count = 0;
        for token in trimmed.split_whitespace() {
            if count == COLUMNS {
                return Err(TableError::Parse {
                    line: line_number,
                    message: format!("expected {} columns, found more", COLUMNS),
                });
            }
            row[count] = token.parse().map_err(|_| TableError::Parse {
                line: line_number,
                message: format!("invalid number '{}'", token),
            })?;
            count += 1;
        }
        if count != COLUMNS {
            return Err(TableError::Parse {
                line: line_number,
                message: format!("expected {} columns, found {}", COLUMNS, count),
            });
        }

        if rows.len() == 1 && row[0] <= rows[0][0] {
            return Err(TableError::NonUniformSpacing { line: line_number });
        }
        if rows.len() >= 2 {
            let spacing = rows[1][0] - rows[0][0];
            let expected = rows.len() as f64 * spacing;
            if (row[0] - expected).abs() > SPACING_TOLERANCE * spacing.max(1.0) {
                return Err(TableError::NonUniformSpacing { line: line_number });
            }
        }
        if rows.is_empty() && row[0] != 0.0 {
            return Err(TableError::NonUniformSpacing { line: line_number });
        }
        rows.push(row);
    }

    if rows.len() < 2 {
        return Err(TableError::TooFewRows(rows.len()));
    }
    let scale = 1.0 / (rows[1][0] - rows[0][0]);
    let nodes: Vec<Vec<RadialValue>> = layout
        .channels()
        .iter()
        .map(|&channel| {
            let col = column_pair(channel);
            rows.iter()
                .map(|row| RadialValue::new(row[col], -row[col + 1]))
                .collect()
        })
        .collect();
    from_nodes(layout, scale, &nodes)
}

pub fn read_user_table_from_path(
    path: &Path,
    layout: TableLayout,
) -> Result<InterpolationTable, TableError> {
    let file = File::open(path).map_err(|e| TableError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    read_user_table(BufReader::new(file), layout)
}

/// Node values `(V, dV/dr)` of one channel, recovered from the spline coefficients.
fn node_value(table: &InterpolationTable, offset: usize, node: usize) -> RadialValue {
    let view = table.view();
    let rows = table.rows();
    let (row, eps) = if node < rows {
        (node, 0.0)
    } else {
        (rows - 1, 1.0)
    };
    let point = view.spline(
        &TableLookup {
            row: row * table.stride(),
            eps,
        },
        offset,
    );
    RadialValue::new(point.value, point.slope * table.scale())
}

/// Writes the nodes of `table` in the user table format; absent channels are written as zero.
pub fn write_user_table<W: Write>(table: &InterpolationTable, mut writer: W) -> std::io::Result<()> {
    writeln!(
        writer,
        "# {} table, scale {}, {} bins",
        table.layout(),
        table.scale(),
        table.rows()
    )?;
    writeln!(writer, "# r f -f' g -g' h -h'")?;
    let spacing = 1.0 / table.scale();
    for node in 0..=table.rows() {
        write!(writer, "{:e}", node as f64 * spacing)?;
        for channel in [Channel::Electrostatics, Channel::Dispersion, Channel::Repulsion] {
            let value = table
                .layout()
                .offset(channel)
                .map(|offset| node_value(table, offset, node))
                .unwrap_or_default();
            write!(writer, " {:e} {:e}", value.potential, -value.derivative)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn write_user_table_to_path(table: &InterpolationTable, path: &Path) -> Result<(), TableError> {
    let io_error = |e| TableError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = std::io::BufWriter::new(file);
    write_user_table(table, &mut writer).map_err(io_error)?;
    writer.flush().map_err(io_error)
}
