//! Utilidades compartidas por las pruebas de integración.

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{Document, Object};
use rust_xlsxwriter::{Format, Workbook};

/// Valor de una celda de prueba.
pub enum V {
    S(&'static str),
    N(f64),
    /// Número de serie con formato de fecha
    D(f64),
    Blank,
}

/// Libro xlsx en memoria con una hoja por cada `(nombre, filas)`.
pub fn workbook(sheets: &[(&str, Vec<Vec<V>>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date = Format::new().set_num_format("dd/mm/yyyy hh:mm");

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match value {
                    V::S(s) => {
                        worksheet.write_string(r, c, *s).unwrap();
                    }
                    V::N(n) => {
                        worksheet.write_number(r, c, *n).unwrap();
                    }
                    V::D(n) => {
                        worksheet.write_number_with_format(r, c, *n, &date).unwrap();
                    }
                    V::Blank => {}
                }
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// Fragmento de texto de una página con su fuente.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub bold: bool,
    pub size: f32,
    pub text: String,
}

/// Textos de cada página de un PDF, en orden de dibujo.
pub fn page_spans(pdf: &[u8]) -> Vec<Vec<Span>> {
    let doc = Document::load_mem(pdf).expect("PDF válido");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let data = doc.get_page_content(page_id).unwrap();
            let content = Content::decode(&data).unwrap();
            let mut bold = false;
            let mut size = 0.0;
            let mut spans = Vec::new();
            for op in content.operations {
                match op.operator.as_str() {
                    "Tf" => {
                        bold = matches!(op.operands.first(), Some(Object::Name(n)) if n == b"F2");
                        size = op.operands.get(1).and_then(|o| o.as_float().ok()).unwrap_or(0.0);
                    }
                    "Tj" => {
                        if let Some(Object::String(bytes, _)) = op.operands.first() {
                            spans.push(Span {
                                bold,
                                size,
                                text: bytes.iter().map(|&b| b as char).collect(),
                            });
                        }
                    }
                    _ => {}
                }
            }
            spans
        })
        .collect()
}

/// Etiquetas de sección (negrita, 11 pt) de todas las páginas.
pub fn section_labels(pdf: &[u8]) -> Vec<String> {
    page_spans(pdf)
        .into_iter()
        .flatten()
        .filter(|s| s.bold && s.size == 11.0)
        .map(|s| s.text)
        .collect()
}

/// Todos los textos de una página.
pub fn page_texts(pdf: &[u8], page: usize) -> Vec<String> {
    page_spans(pdf)
        .swap_remove(page)
        .into_iter()
        .map(|s| s.text)
        .collect()
}
