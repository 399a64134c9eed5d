//! Carga de archivos CSV o libros de cálculo en una [`Table`].
//!
//! Las etiquetas de columna se toman de la fila de encabezado y los datos
//! empiezan en una fila posterior configurable; las filas intermedias
//! (metadatos) se descartan.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::table::{Cell, Record, Table};

static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([ T]\d{2}:\d{2}(:\d{2}(\.\d+)?)?)?$").expect("regex válida")
});

/// Formato del archivo de entrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Texto separado por comas
    Csv,
    /// Libro de cálculo (xlsx, xlsm, xlsb, xls, ods)
    Workbook,
}

impl SourceFormat {
    /// Deduce el formato a partir de la extensión del archivo.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Workbook),
            _ => Err(Error::Format(format!(
                "extensión no soportada: {:?}",
                path.display().to_string()
            ))),
        }
    }
}

/// Opciones de carga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Fila (desde 0) de la que se toman las etiquetas
    pub header_row: usize,
    /// Primera fila (desde 0) con datos; las anteriores se descartan
    pub first_data_row: usize,
    /// Columnas iniciales a omitir
    pub skip_columns: usize,
    /// Hoja a leer en libros con varias hojas (por defecto, la primera)
    pub sheet_name: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            header_row: 0,
            first_data_row: 3,
            skip_columns: 0,
            sheet_name: None,
        }
    }
}

/// Carga un archivo ya leído en memoria.
pub fn load(bytes: &[u8], format: SourceFormat, options: &LoadOptions) -> Result<Table> {
    if bytes.is_empty() {
        return Err(Error::Format("el archivo está vacío".to_string()));
    }

    let grid = match format {
        SourceFormat::Csv => {
            if let Some(name) = &options.sheet_name {
                warn!(sheet = %name, "un CSV no tiene hojas; se ignora el nombre de hoja");
            }
            read_csv_grid(bytes)?
        }
        SourceFormat::Workbook => read_workbook_grid(bytes, options.sheet_name.as_deref())?,
    };

    let table = build_table(&grid, options)?;
    info!(
        columns = table.columns.len(),
        records = table.len(),
        "tabla cargada"
    );
    Ok(table)
}

/// Nombres de las hojas de un libro, en orden.
pub fn sheet_names(bytes: &[u8]) -> Result<Vec<String>> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    Ok(workbook.sheet_names())
}

fn read_csv_grid(bytes: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        grid.push(record.iter().map(|f| detect_type(&decode_field(f))).collect());
    }
    Ok(grid)
}

/// UTF-8 si es válido; si no, Latin-1 (CSV exportados por Excel en español).
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Tipo de un campo CSV: vacío, número, fecha ISO o texto.
fn detect_type(field: &str) -> Cell {
    let trimmed = field.trim();

    if trimmed.is_empty() {
        return Cell::Empty;
    }

    // "inf" y "NaN" se parsean como f64 pero son texto en una hoja
    if trimmed.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Cell::Number(n);
            }
        }
    }

    if let Some(value) = parse_iso_date(trimmed) {
        return Cell::Date {
            value,
            serial: None,
        };
    }

    Cell::Text(field.to_string())
}

fn parse_iso_date(s: &str) -> Option<NaiveDateTime> {
    if !ISO_DATE.is_match(s) {
        return None;
    }
    let s = s.replacen('T', " ", 1);
    if s.len() == 10 {
        return NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0);
    }
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M"))
        .ok()
}

fn read_workbook_grid(bytes: &[u8], sheet_name: Option<&str>) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let range = match sheet_name {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|n| n == name) {
                return Err(Error::NotFound(format!("no existe la hoja {:?}", name)));
            }
            workbook.worksheet_range(name)?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::Format("el libro no contiene hojas".to_string()))??,
    };

    // El rango empieza en la primera celda con contenido; se rellenan las
    // filas y columnas previas para conservar las posiciones de la hoja.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut grid = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_from_data));
        grid.push(cells);
    }
    debug!(rows = grid.len(), "hoja leída");
    Ok(grid)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Cell::Date {
                value,
                serial: Some(dt.as_f64()),
            },
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_iso_date(s) {
            Some(value) => Cell::Date {
                value,
                serial: None,
            },
            None => Cell::text(s.clone()),
        },
        Data::DurationIso(s) => Cell::text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

fn build_table(grid: &[Vec<Cell>], options: &LoadOptions) -> Result<Table> {
    if options.first_data_row <= options.header_row {
        return Err(Error::Config(format!(
            "la primera fila de datos ({}) debe ser posterior a la fila de encabezado ({})",
            options.first_data_row, options.header_row
        )));
    }

    let header = grid.get(options.header_row).ok_or_else(|| {
        Error::Config(format!(
            "la fila de encabezado {} no existe (el archivo tiene {} filas)",
            options.header_row,
            grid.len()
        ))
    })?;

    let width = header.len();
    if options.skip_columns >= width {
        return Err(Error::Config(format!(
            "no se pueden omitir {} columnas de {}",
            options.skip_columns, width
        )));
    }

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .skip(options.skip_columns)
        .map(|(i, cell)| {
            let label = cell.display("").trim().to_string();
            if label.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                label
            }
        })
        .collect();

    let records = grid
        .iter()
        .enumerate()
        .skip(options.first_data_row)
        .filter(|(_, row)| !row.iter().all(Cell::is_blank))
        .map(|(idx, row)| Record {
            row_number: idx + 1,
            fields: columns
                .iter()
                .cloned()
                .zip((options.skip_columns..width).map(|c| {
                    row.get(c).cloned().unwrap_or(Cell::Empty)
                }))
                .collect(),
        })
        .collect();

    Ok(Table { columns, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CSV: &str = "\
Codigo,Nombre,Fecha,Importe
meta,,,
meta,,,
A1,Ana,2025-11-07,10.5
A2,Luis,2025-11-08 09:30:00,20
";

    #[test]
    fn test_csv_header_and_data_rows() {
        let table = load(CSV.as_bytes(), SourceFormat::Csv, &LoadOptions::default()).unwrap();

        assert_eq!(table.columns, vec!["Codigo", "Nombre", "Fecha", "Importe"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].row_number, 4);
        assert_eq!(table.records[0].get("Importe"), Some(&Cell::Number(10.5)));
        assert_eq!(
            table.records[1].get("Fecha").map(|c| c.display("---")),
            Some("08/11/2025".to_string())
        );
    }

    #[test]
    fn test_skip_columns() {
        let options = LoadOptions {
            skip_columns: 2,
            ..Default::default()
        };
        let table = load(CSV.as_bytes(), SourceFormat::Csv, &options).unwrap();

        assert_eq!(table.columns, vec!["Fecha", "Importe"]);
        assert_eq!(table.records[1].fields.len(), 2);
    }

    #[test]
    fn test_invalid_configuration() {
        let skip_all = LoadOptions {
            skip_columns: 4,
            ..Default::default()
        };
        assert!(matches!(
            load(CSV.as_bytes(), SourceFormat::Csv, &skip_all),
            Err(Error::Config(_))
        ));

        let header_out = LoadOptions {
            header_row: 10,
            first_data_row: 11,
            ..Default::default()
        };
        assert!(matches!(
            load(CSV.as_bytes(), SourceFormat::Csv, &header_out),
            Err(Error::Config(_))
        ));

        let data_before_header = LoadOptions {
            header_row: 1,
            first_data_row: 1,
            ..Default::default()
        };
        assert!(matches!(
            load(CSV.as_bytes(), SourceFormat::Csv, &data_before_header),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_blank_labels_and_rows() {
        let csv = "Id,,Valor\nx,y,z\n1,2,3\n,,\n4,5,6\n";
        let options = LoadOptions {
            first_data_row: 2,
            ..Default::default()
        };
        let table = load(csv.as_bytes(), SourceFormat::Csv, &options).unwrap();

        assert_eq!(table.columns, vec!["Id", "Unnamed: 1", "Valor"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_latin1_csv() {
        let bytes = b"Descripci\xf3n\n-\n-\nCa\xf1er\xeda rota\n";
        let table = load(bytes, SourceFormat::Csv, &LoadOptions::default()).unwrap();

        assert_eq!(table.columns, vec!["Descripción"]);
        assert_eq!(
            table.records[0].get("Descripción"),
            Some(&Cell::Text("Cañería rota".to_string()))
        );
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(
            load(b"", SourceFormat::Csv, &LoadOptions::default()),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_garbage_workbook() {
        assert!(matches!(
            load(b"esto no es un libro", SourceFormat::Workbook, &LoadOptions::default()),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SourceFormat::from_path(Path::new("datos.CSV")).unwrap(),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("partes.xlsx")).unwrap(),
            SourceFormat::Workbook
        );
        assert!(SourceFormat::from_path(Path::new("notas.txt")).is_err());
    }
}
