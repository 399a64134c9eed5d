//! Maquetación de un [`DocumentSpec`] sobre páginas A4.
//!
//! Las medidas van en milímetros con origen en la esquina superior
//! izquierda; el backend ([`crate::pdf::PdfCanvas`]) las convierte a puntos
//! PDF. El motor de maquetación no conoce el formato de salida: solo llama
//! a un [`Canvas`].

use crate::document::{Block, DocumentSpec, Signature};

/// Página A4 vertical, en mm
pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 10.0;
/// Margen inferior con salto de página automático
pub const BOTTOM_MARGIN: f32 = 15.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Margen interior de las celdas de texto
const CELL_MARGIN: f32 = 1.0;
const PT_TO_MM: f32 = 25.4 / 72.0;

/// Posición y tamaño del logotipo de cabecera.
pub const LOGO_RECT: Rect = Rect {
    x: MARGIN,
    y: 8.0,
    w: CONTENT_WIDTH,
    h: 28.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Fuente y tamaño (en puntos).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub weight: FontWeight,
    pub size: f32,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        Self {
            weight: FontWeight::Regular,
            size,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            weight: FontWeight::Bold,
            size,
        }
    }
}

const TITLE: TextStyle = TextStyle::bold(15.0);
const COUNTER: TextStyle = TextStyle::bold(12.0);
const LABEL: TextStyle = TextStyle::bold(11.0);
const BODY: TextStyle = TextStyle::regular(10.0);
const MARK: TextStyle = TextStyle::bold(10.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Relleno gris (0 = negro, 255 = blanco) o solo contorno. Un rectángulo
/// de alto 0 con contorno es una línea.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Fill(u8),
    Stroke,
}

/// Cabecera que se repite en cada página.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    /// Título centrado, también usado si no hay logotipo.
    pub title: String,
    /// Intentar dibujar el logotipo en lugar del título.
    pub use_logo: bool,
}

impl Default for PageHeader {
    fn default() -> Self {
        Self {
            title: "Informe Detallado de Registro".to_string(),
            use_logo: false,
        }
    }
}

/// Capacidad de dibujo que necesita la maquetación.
pub trait Canvas {
    /// Empieza una página nueva en blanco.
    fn begin_page(&mut self);

    /// Escribe una línea de texto con la línea base en `baseline`.
    fn draw_text(&mut self, x: f32, baseline: f32, text: &str, style: TextStyle);

    fn draw_rect(&mut self, rect: Rect, paint: Paint);

    /// Dibuja la imagen de cabecera. Devuelve `false` si no hay imagen.
    fn draw_image_or_fallback(&mut self, rect: Rect) -> bool;
}

/// Coloca todos los bloques en páginas. Siempre produce al menos una página.
pub fn layout<C: Canvas>(spec: &DocumentSpec, header: &PageHeader, canvas: &mut C) {
    let mut writer = Writer {
        canvas,
        header,
        y: MARGIN,
    };
    writer.add_page();

    for block in &spec.blocks {
        match block {
            Block::Counter(text) => {
                writer.new_page_if_overflow(10.0);
                let baseline = baseline(writer.y, 8.0, COUNTER);
                writer.canvas.draw_text(MARGIN + CELL_MARGIN, baseline, text, COUNTER);
                writer.y += 10.0;
            }
            Block::Section { label, value } => {
                writer.band(label);
                writer.paragraph(value);
            }
            Block::Group { title, entries } => {
                writer.band(title);
                for (label, value) in entries {
                    writer.paragraph(&format!("{}: {}", label, value));
                }
            }
            Block::Checkbox { caption } => writer.checkbox(caption),
            Block::Signatures { left, right } => writer.signatures(left, right),
            Block::PageBreak => writer.add_page(),
        }
    }
}

struct Writer<'a, C: Canvas> {
    canvas: &'a mut C,
    header: &'a PageHeader,
    /// Posición vertical actual en mm desde el borde superior
    y: f32,
}

impl<C: Canvas> Writer<'_, C> {
    fn add_page(&mut self) {
        self.canvas.begin_page();
        self.y = MARGIN;

        if self.header.use_logo && self.canvas.draw_image_or_fallback(LOGO_RECT) {
            self.y = LOGO_RECT.y + LOGO_RECT.h + 6.0;
            return;
        }

        let x = MARGIN + (CONTENT_WIDTH - text_width(&self.header.title, TITLE)) / 2.0;
        let baseline = baseline(self.y, 10.0, TITLE);
        self.canvas
            .draw_text(x.max(MARGIN), baseline, &self.header.title, TITLE);
        self.y += 20.0;
    }

    fn new_page_if_overflow(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT - BOTTOM_MARGIN {
            self.add_page();
        }
    }

    /// Etiqueta en mayúsculas sobre fondo gris claro.
    fn band(&mut self, label: &str) {
        let text = label.to_uppercase();
        for line in wrap_text(&text, CONTENT_WIDTH - 2.0 * CELL_MARGIN, LABEL) {
            self.new_page_if_overflow(8.0);
            self.canvas.draw_rect(
                Rect {
                    x: MARGIN,
                    y: self.y,
                    w: CONTENT_WIDTH,
                    h: 8.0,
                },
                Paint::Fill(240),
            );
            let baseline = baseline(self.y, 8.0, LABEL);
            self.canvas
                .draw_text(MARGIN + CELL_MARGIN, baseline, &line, LABEL);
            self.y += 8.0;
        }
        self.y += 2.0;
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap_text(text, CONTENT_WIDTH - 2.0 * CELL_MARGIN, BODY) {
            self.new_page_if_overflow(6.0);
            let baseline = baseline(self.y, 6.0, BODY);
            self.canvas
                .draw_text(MARGIN + CELL_MARGIN, baseline, &line, BODY);
            self.y += 6.0;
        }
        self.y += 4.0;
    }

    fn checkbox(&mut self, caption: &str) {
        self.new_page_if_overflow(8.0);
        let square = Rect {
            x: MARGIN,
            y: self.y + 1.5,
            w: 5.0,
            h: 5.0,
        };
        self.canvas.draw_rect(square, Paint::Stroke);
        let baseline = baseline(self.y, 8.0, MARK);
        let mark_x = square.x + (square.w - text_width("X", MARK)) / 2.0;
        self.canvas.draw_text(mark_x, baseline, "X", MARK);
        self.canvas
            .draw_text(MARGIN + 8.0, baseline, caption, BODY);
        self.y += 8.0;
    }

    fn signatures(&mut self, left: &Signature, right: &Signature) {
        self.new_page_if_overflow(35.0);
        // Espacio para firmar a mano
        self.y += 15.0;

        let column = CONTENT_WIDTH / 2.0;
        for (i, signature) in [left, right].into_iter().enumerate() {
            let x = MARGIN + column * i as f32;
            self.canvas.draw_rect(
                Rect {
                    x: x + 10.0,
                    y: self.y,
                    w: column - 20.0,
                    h: 0.0,
                },
                Paint::Stroke,
            );
            self.centered(x, column, self.y + 1.0, &signature.caption, MARK);
            self.centered(x, column, self.y + 7.0, &signature.name, BODY);
        }
        self.y += 20.0;
    }

    fn centered(&mut self, x: f32, width: f32, top: f32, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        let offset = ((width - text_width(text, style)) / 2.0).max(0.0);
        self.canvas
            .draw_text(x + offset, baseline(top, 6.0, style), text, style);
    }
}

/// Línea base del texto centrado verticalmente en una celda de alto `h`.
fn baseline(top: f32, h: f32, style: TextStyle) -> f32 {
    top + 0.5 * h + 0.3 * style.size * PT_TO_MM
}

/// Ancho aproximado en mm de un texto en Helvetica.
pub fn text_width(text: &str, style: TextStyle) -> f32 {
    let em: f32 = text.chars().map(|c| char_width(c, style.weight)).sum();
    em * style.size * PT_TO_MM
}

/// Ancho de un carácter en fracción de em, por grupos de la métrica de
/// Helvetica.
fn char_width(c: char, weight: FontWeight) -> f32 {
    let w = match c {
        'i' | 'j' | 'l' | '\'' | '|' => 0.222,
        ' ' | '.' | ',' | ':' | ';' | '!' | 'I' | 'f' | 't' | '/' | '[' | ']' => 0.278,
        'r' | '(' | ')' | '-' | '"' => 0.333,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' | 'J' => 0.5,
        'm' | 'M' => 0.833,
        'w' | 'W' => 0.75,
        '@' | '%' => 0.889,
        c if c.is_ascii_digit() => 0.556,
        c if c.is_uppercase() => 0.7,
        _ => 0.556,
    };
    match weight {
        FontWeight::Regular => w,
        FontWeight::Bold => w * 1.06,
    }
}

/// Parte un texto en líneas de como mucho `max_width` mm. Respeta los saltos
/// de línea y corta las palabras más largas que una línea.
pub fn wrap_text(text: &str, max_width: f32, style: TextStyle) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate, style) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            // Palabra más larga que la línea
            for c in word.chars() {
                current.push(c);
                if text_width(&current, style) > max_width {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{record_document, table_document, ReportLayout};
    use crate::table::{Cell, Record, Table};

    /// Canvas que registra las llamadas.
    #[derive(Default)]
    struct Recorder {
        pages: Vec<Vec<Call>>,
        logo: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Text(String, TextStyle, f32),
        Rect(Rect, Paint),
        Image,
    }

    impl Recorder {
        fn texts(&self, page: usize) -> Vec<&str> {
            self.pages[page]
                .iter()
                .filter_map(|c| match c {
                    Call::Text(t, _, _) => Some(t.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn bold_band_texts(&self) -> Vec<&str> {
            self.pages
                .iter()
                .flatten()
                .filter_map(|c| match c {
                    Call::Text(t, style, _) if *style == LABEL => Some(t.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Canvas for Recorder {
        fn begin_page(&mut self) {
            self.pages.push(Vec::new());
        }

        fn draw_text(&mut self, _x: f32, baseline: f32, text: &str, style: TextStyle) {
            if let Some(page) = self.pages.last_mut() {
                page.push(Call::Text(text.to_string(), style, baseline));
            }
        }

        fn draw_rect(&mut self, rect: Rect, paint: Paint) {
            if let Some(page) = self.pages.last_mut() {
                page.push(Call::Rect(rect, paint));
            }
        }

        fn draw_image_or_fallback(&mut self, _rect: Rect) -> bool {
            if self.logo {
                if let Some(page) = self.pages.last_mut() {
                    page.push(Call::Image);
                }
            }
            self.logo
        }
    }

    fn record(fields: &[(&str, &str)]) -> Record {
        Record {
            row_number: 4,
            fields: fields
                .iter()
                .map(|(l, v)| (l.to_string(), Cell::text(*v)))
                .collect(),
        }
    }

    #[test]
    fn test_sections_draw_uppercase_labels_in_order() {
        let rec = record(&[("Lugar", "Nave 2"), ("Causa", "Desgaste")]);
        let fields = vec!["Lugar".to_string(), "Causa".to_string()];
        let spec = record_document(&rec, &fields, &ReportLayout::default());

        let mut recorder = Recorder::default();
        layout(&spec, &PageHeader::default(), &mut recorder);

        assert_eq!(recorder.pages.len(), 1);
        assert_eq!(
            recorder.texts(0),
            vec!["Informe Detallado de Registro", "LUGAR", "Nave 2", "CAUSA", "Desgaste"]
        );
        let gray_bands = recorder.pages[0]
            .iter()
            .filter(|c| matches!(c, Call::Rect(_, Paint::Fill(240))))
            .count();
        assert_eq!(gray_bands, 2);
        assert_eq!(recorder.bold_band_texts(), vec!["LUGAR", "CAUSA"]);
    }

    #[test]
    fn test_logo_replaces_title_when_available() {
        let spec = DocumentSpec::default();

        let mut with_logo = Recorder {
            logo: true,
            ..Default::default()
        };
        layout(&spec, &PageHeader { use_logo: true, ..Default::default() }, &mut with_logo);
        assert_eq!(with_logo.pages[0], vec![Call::Image]);

        let mut without_logo = Recorder::default();
        layout(&spec, &PageHeader { use_logo: true, ..Default::default() }, &mut without_logo);
        assert_eq!(without_logo.texts(0), vec!["Informe Detallado de Registro"]);
    }

    #[test]
    fn test_long_text_overflows_to_new_page() {
        let long = "palabra ".repeat(2000);
        let rec = record(&[("Observaciones", long.as_str())]);
        let spec = record_document(&rec, &["Observaciones".to_string()], &ReportLayout::default());

        let mut recorder = Recorder::default();
        layout(&spec, &PageHeader::default(), &mut recorder);

        assert!(recorder.pages.len() > 1);
        for page in &recorder.pages {
            for call in page {
                if let Call::Text(_, _, baseline) = call {
                    assert!(*baseline <= PAGE_HEIGHT - BOTTOM_MARGIN);
                }
            }
        }
        // Cada página repite la cabecera
        for i in 0..recorder.pages.len() {
            assert_eq!(recorder.texts(i)[0], "Informe Detallado de Registro");
        }
    }

    #[test]
    fn test_batch_one_page_per_record() {
        let table = Table {
            columns: vec!["A".into()],
            records: vec![record(&[("A", "1")]), record(&[("A", "2")])],
        };
        let spec = table_document(&table, &ReportLayout::default());

        let mut recorder = Recorder::default();
        layout(&spec, &PageHeader::default(), &mut recorder);

        assert_eq!(recorder.pages.len(), 2);
        assert_eq!(recorder.texts(1)[1], "Registro 2 de 2");
    }

    #[test]
    fn test_batch_record_overflow_adds_pages() {
        let long = "palabra ".repeat(2000);
        let table = Table {
            columns: vec!["A".into()],
            records: vec![
                record(&[("A", "1")]),
                record(&[("A", long.as_str())]),
                record(&[("A", "3")]),
            ],
        };
        let spec = table_document(&table, &ReportLayout::default());

        let mut recorder = Recorder::default();
        layout(&spec, &PageHeader::default(), &mut recorder);

        assert!(recorder.pages.len() > 3);
        let counters: Vec<&str> = (0..recorder.pages.len())
            .flat_map(|i| recorder.texts(i))
            .filter(|t| t.starts_with("Registro "))
            .collect();
        assert_eq!(counters, vec!["Registro 1 de 3", "Registro 2 de 3", "Registro 3 de 3"]);
        // El último registro empieza en la última página
        let last = recorder.pages.len() - 1;
        assert_eq!(recorder.texts(last)[1], "Registro 3 de 3");
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("uno dos tres", 1000.0, BODY);
        assert_eq!(lines, vec!["uno dos tres"]);

        let lines = wrap_text("línea uno\nlínea dos", 1000.0, BODY);
        assert_eq!(lines, vec!["línea uno", "línea dos"]);

        let word = "x".repeat(200);
        let lines = wrap_text(&word, 50.0, BODY);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, BODY) <= 50.0));
        assert_eq!(lines.concat(), word);

        assert_eq!(wrap_text("", 50.0, BODY), vec![String::new()]);
    }
}
