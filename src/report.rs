//! Generación de informes de extremo a extremo y nombres de archivo.

use tracing::info;

use crate::document::{record_document, table_document, ReportLayout};
use crate::error::Result;
use crate::pdf::{render_pdf, Logo};
use crate::render::PageHeader;
use crate::selector::{select, Selection, SelectionStrategy};
use crate::table::{Record, Table};

/// Nombre del PDF del modo lote.
pub const BATCH_FILENAME: &str = "Informe_Completo.pdf";

/// Un PDF generado y el nombre sugerido para guardarlo.
#[derive(Debug, Clone)]
pub struct Report {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Recursos compartidos por todos los informes de una sesión.
#[derive(Debug, Clone, Default)]
pub struct ReportSettings {
    pub header: PageHeader,
    pub layout: ReportLayout,
    pub logo: Logo,
}

/// `Informe_Fila_{n}.pdf`, con `n` la fila de la hoja de origen.
pub fn row_filename(record: &Record) -> String {
    format!("Informe_Fila_{}.pdf", record.row_number)
}

/// `Parte_{id}.pdf`. Los caracteres no válidos en nombres de archivo se
/// cambian por `_`.
pub fn part_filename(id: &str) -> String {
    let safe: String = id
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("Parte_{}.pdf", safe)
}

/// Informe de un registro con los campos indicados, en ese orden.
pub fn record_report(
    record: &Record,
    fields: &[String],
    filename: String,
    settings: &ReportSettings,
) -> Result<Report> {
    let spec = record_document(record, fields, &settings.layout);
    let bytes = render_pdf(&spec, &settings.header, &settings.logo)?;
    info!(row = record.row_number, file = %filename, "informe generado");
    Ok(Report { filename, bytes })
}

/// Selecciona un registro y genera su informe. `Ok(None)` si la entrada
/// todavía no es una selección (vacía, o `"0000"` con claves de 4 cifras).
pub fn select_and_render(
    table: &Table,
    strategy: &SelectionStrategy,
    arg: &str,
    fields: &[String],
    settings: &ReportSettings,
) -> Result<Option<Report>> {
    let record = match select(table, strategy, arg)? {
        Selection::Found(record) => record,
        Selection::NoSelection => return Ok(None),
    };

    let filename = match strategy {
        SelectionStrategy::ByPosition { .. } => row_filename(record),
        SelectionStrategy::ByRawIdentifier { .. } => part_filename(arg),
        SelectionStrategy::ByNormalizedKey { kind, .. } => {
            part_filename(&kind.query_key(arg).unwrap_or_default())
        }
    };

    record_report(record, fields, filename, settings).map(Some)
}

/// Modo lote: todas las filas, una por página.
pub fn batch_report(table: &Table, settings: &ReportSettings) -> Result<Report> {
    let spec = table_document(table, &settings.layout);
    let bytes = render_pdf(&spec, &settings.header, &settings.logo)?;
    info!(records = table.len(), "informe por lotes generado");
    Ok(Report {
        filename: BATCH_FILENAME.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    #[test]
    fn test_filenames() {
        let record = Record {
            row_number: 6,
            fields: vec![("A".into(), Cell::Empty)],
        };
        assert_eq!(row_filename(&record), "Informe_Fila_6.pdf");
        assert_eq!(part_filename(" 0042 "), "Parte_0042.pdf");
        assert_eq!(part_filename("2025/11:7"), "Parte_2025_11_7.pdf");
    }
}
