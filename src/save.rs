//! Text save format: one line per row, `0` for a dead cell and `1` for a live
//! one, rows joined by `\n` with no newline after the last row.

use std::{fs, path::Path};

use log::{debug, info};

use crate::{
    error::SaveError,
    proc::{CellState, Field},
};

type Result<T> = std::result::Result<T, SaveError>;

pub fn encode(field: &Field) -> String {
    let (w, h) = field.size();
    let mut s = String::with_capacity((w + 1) * h);

    for (i, row) in field.rows().iter().enumerate() {
        if i != 0 {
            s.push('\n');
        }
        for c in row {
            s.push(if c.is_alive() { '1' } else { '0' });
        }
    }
    s
}

/// Parses save data. The whole input is validated before a field is built.
///
/// A single trailing newline and `\r` line endings are accepted.
pub fn decode(s: &str) -> Result<Field> {
    let s = s.strip_suffix('\n').unwrap_or(s);
    if s.is_empty() {
        return Err(SaveError::Empty);
    }

    let mut rows: Vec<Vec<CellState>> = vec![];
    for (i, line) in s.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        let mut r = Vec::with_capacity(line.len());
        for (j, c) in line.chars().enumerate() {
            let state = CellState::try_from(c).map_err(|_| SaveError::Malformed {
                line: i + 1,
                column: j + 1,
                found: c,
            })?;
            r.push(state);
        }

        if let Some(first) = rows.first() {
            if first.len() != r.len() {
                return Err(SaveError::Ragged {
                    line: i + 1,
                    expected: first.len(),
                    found: r.len(),
                });
            }
        } else if r.is_empty() {
            return Err(SaveError::Empty);
        }
        rows.push(r);
    }

    Ok(Field::from_rows(rows)?)
}

pub fn load(path: impl AsRef<Path>) -> Result<Field> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let field = decode(&s)?;
    info!(
        "loaded {}x{} field from {}",
        field.size_x(),
        field.size_y(),
        path.display()
    );
    Ok(field)
}

pub fn save(path: impl AsRef<Path>, field: &Field) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, encode(field)).map_err(|source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("saved field with {} live cells to {}", field.population(), path.display());
    Ok(())
}
