//! Normalización de identificadores.
//!
//! Las hojas de origen guardan los identificadores como números, y lo que ve
//! una persona en la hoja no siempre coincide con el valor binario almacenado
//! (`45968.5801` se guarda como `45968.58009999...`). Cada estrategia deriva
//! una clave de texto comparable a partir del valor de una celda.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::table::Cell;

/// Ancho de las claves derivadas por redondeo.
pub const KEY_WIDTH: usize = 4;

/// Estrategia de normalización.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizerKind {
    /// Quita un sufijo `.0` literal del texto.
    StripSuffix,
    /// Parte entera (hacia abajo) del valor numérico.
    Truncate,
    /// Las 4 cifras decimales tras redondear como lo muestra la hoja.
    DecimalRound,
}

impl FromStr for NormalizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strip" | "sufijo" => Ok(NormalizerKind::StripSuffix),
            "truncar" | "truncate" => Ok(NormalizerKind::Truncate),
            "redondeo" | "round" => Ok(NormalizerKind::DecimalRound),
            other => Err(format!("normalizador desconocido: {}", other)),
        }
    }
}

impl fmt::Display for NormalizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizerKind::StripSuffix => "strip",
            NormalizerKind::Truncate => "truncar",
            NormalizerKind::DecimalRound => "redondeo",
        };
        f.write_str(name)
    }
}

impl NormalizerKind {
    /// Clave que se busca a partir de lo que escribe el usuario, en la misma
    /// forma que produce [`normalize`]. `None` si la entrada todavía no pide
    /// nada: vacía o `"0000"`. Solo `DecimalRound` completa con ceros, así
    /// que ahí `"0"` también equivale a `"0000"`.
    pub fn query_key(self, input: &str) -> Option<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "0000" {
            return None;
        }
        let key = match self {
            NormalizerKind::DecimalRound => pad_key(trimmed),
            NormalizerKind::StripSuffix => {
                trimmed.strip_suffix(".0").unwrap_or(trimmed).to_string()
            }
            NormalizerKind::Truncate => trimmed.to_string(),
        };
        (!key.is_empty() && key != "0000").then_some(key)
    }
}

/// Deriva la clave de una celda. `None` si la celda no tiene clave.
pub fn normalize(kind: NormalizerKind, cell: &Cell) -> Option<String> {
    match kind {
        NormalizerKind::StripSuffix => strip_suffix(cell),
        NormalizerKind::Truncate => truncate(cell),
        NormalizerKind::DecimalRound => decimal_round(cell),
    }
}

fn strip_suffix(cell: &Cell) -> Option<String> {
    let raw = cell.raw_text()?;
    let key = raw.strip_suffix(".0").unwrap_or(&raw).trim();
    // Solo los valores con forma numérica tienen clave
    key.parse::<f64>().ok()?;
    Some(key.to_string())
}

fn truncate(cell: &Cell) -> Option<String> {
    let value = cell.as_f64()?.floor();
    if value.abs() >= i64::MAX as f64 {
        return None;
    }
    Some((value as i64).to_string())
}

fn decimal_round(cell: &Cell) -> Option<String> {
    let decimal = match cell {
        Cell::Text(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()?
        }
        // La forma textual más corta de un f64 es la que escribió quien
        // rellenó la hoja, no la expansión binaria.
        _ => Decimal::from_str(&cell.as_f64()?.to_string()).ok()?,
    };

    let rounded = decimal.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.4}", rounded.abs());
    let fraction = text.rsplit_once('.').map(|(_, f)| f).unwrap_or("");
    Some(format!("{:0<width$}", fraction, width = KEY_WIDTH))
}

/// Completa con ceros a la izquierda una clave de solo dígitos más corta
/// que [`KEY_WIDTH`]. Cualquier otro texto se devuelve recortado.
pub fn pad_key(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>width$}", trimmed, width = KEY_WIDTH)
    } else {
        trimmed.to_string()
    }
}
