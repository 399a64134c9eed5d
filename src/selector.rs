//! Selección de un registro de la tabla.

use tracing::debug;

use crate::error::{Error, Result};
use crate::normalizer::{normalize, NormalizerKind};
use crate::table::{Record, Table};

/// Base de numeración para la selección por posición.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionBase {
    /// La primera fila de datos es la 0
    Zero,
    /// La primera fila de datos es la 1
    One,
}

/// Cómo se localiza el registro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Por posición entre las filas de datos cargadas.
    ByPosition { base: PositionBase },
    /// Igualdad exacta (como texto, sin espacios) con una columna.
    ByRawIdentifier { column: String },
    /// Igualdad con la clave normalizada de una columna.
    ByNormalizedKey {
        column: String,
        kind: NormalizerKind,
    },
}

/// Resultado de una selección válida.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection<'a> {
    Found(&'a Record),
    /// Entrada vacía o `"0000"`: todavía no se ha pedido nada.
    NoSelection,
}

impl<'a> Selection<'a> {
    pub fn record(self) -> Option<&'a Record> {
        match self {
            Selection::Found(r) => Some(r),
            Selection::NoSelection => None,
        }
    }
}

/// Busca un registro según la estrategia. Con claves repetidas gana el
/// primero en el orden de la tabla.
pub fn select<'a>(
    table: &'a Table,
    strategy: &SelectionStrategy,
    arg: &str,
) -> Result<Selection<'a>> {
    match strategy {
        SelectionStrategy::ByPosition { base } => select_by_position(table, *base, arg),
        SelectionStrategy::ByRawIdentifier { column } => {
            let wanted = arg.trim();
            if wanted.is_empty() {
                return Ok(Selection::NoSelection);
            }
            let idx = column_index(table, column)?;
            table
                .records
                .iter()
                .find(|r| raw_value(r, idx).as_deref() == Some(wanted))
                .map(Selection::Found)
                .ok_or_else(|| Error::NotFound(format!("{} = {}", column, wanted)))
        }
        SelectionStrategy::ByNormalizedKey { column, kind } => {
            let wanted = match kind.query_key(arg) {
                Some(key) => key,
                None => return Ok(Selection::NoSelection),
            };
            let idx = column_index(table, column)?;
            let found = table
                .records
                .iter()
                .find(|r| key_value(r, idx, *kind).as_deref() == Some(wanted.as_str()));
            debug!(key = %wanted, found = found.is_some(), "búsqueda por clave");
            found
                .map(Selection::Found)
                .ok_or_else(|| Error::NotFound(format!("clave {}", wanted)))
        }
    }
}

fn select_by_position<'a>(
    table: &'a Table,
    base: PositionBase,
    arg: &str,
) -> Result<Selection<'a>> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Ok(Selection::NoSelection);
    }
    let n: usize = arg
        .parse()
        .map_err(|_| Error::Range(format!("{:?} no es un número de fila", arg)))?;

    let index = match base {
        PositionBase::Zero => Some(n),
        PositionBase::One => n.checked_sub(1),
    };

    index
        .and_then(|i| table.records.get(i))
        .map(Selection::Found)
        .ok_or_else(|| {
            Error::Range(format!(
                "la fila {} no existe (hay {} registros)",
                n,
                table.len()
            ))
        })
}

/// Argumentos válidos para la estrategia, en el orden de la tabla. Sirve de
/// ayuda cuando una búsqueda no encuentra nada.
pub fn available_keys(table: &Table, strategy: &SelectionStrategy) -> Result<Vec<String>> {
    let keys = match strategy {
        SelectionStrategy::ByPosition { base } => {
            let first = match base {
                PositionBase::Zero => 0,
                PositionBase::One => 1,
            };
            (first..first + table.len()).map(|n| n.to_string()).collect()
        }
        SelectionStrategy::ByRawIdentifier { column } => {
            let idx = column_index(table, column)?;
            table
                .records
                .iter()
                .filter_map(|r| raw_value(r, idx))
                .collect()
        }
        SelectionStrategy::ByNormalizedKey { column, kind } => {
            let idx = column_index(table, column)?;
            table
                .records
                .iter()
                .filter_map(|r| key_value(r, idx, *kind))
                .collect()
        }
    };
    Ok(keys)
}

fn column_index(table: &Table, column: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| Error::Config(format!("la columna {:?} no está en la tabla", column)))
}

fn raw_value(record: &Record, idx: usize) -> Option<String> {
    record.fields.get(idx).and_then(|(_, cell)| cell.raw_text())
}

fn key_value(record: &Record, idx: usize, kind: NormalizerKind) -> Option<String> {
    record
        .fields
        .get(idx)
        .and_then(|(_, cell)| normalize(kind, cell))
}
