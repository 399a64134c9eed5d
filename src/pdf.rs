//! Backend PDF de la maquetación, construido con lopdf.
//!
//! Usa las fuentes estándar Helvetica y Helvetica-Bold con codificación
//! WinAnsi, así que no hace falta incrustar ninguna fuente.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use tracing::{debug, info, warn};

use crate::document::DocumentSpec;
use crate::error::Result;
use crate::render::{
    layout, Canvas, FontWeight, PageHeader, Paint, Rect, TextStyle, PAGE_HEIGHT, PAGE_WIDTH,
};

/// Nombre por defecto del logotipo de cabecera.
pub const DEFAULT_LOGO: &str = "encabezado.png";

const LOGO_NAME: &str = "Logo";

fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// Imagen de cabecera opcional. Se carga una sola vez; si falta o no se
/// puede decodificar, los informes usan el título de texto.
#[derive(Debug, Clone, Default)]
pub struct Logo {
    image: Option<Stream>,
}

impl Logo {
    /// Lee y decodifica la imagen. Nunca falla: un problema solo deja el
    /// logotipo como no disponible.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(bytes) => Self::from_bytes(bytes),
            Err(e) => {
                warn!(path = %path.display(), "logotipo no disponible: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match lopdf::xobject::image_from(bytes) {
            Ok(image) => {
                debug!("logotipo cargado");
                Self { image: Some(image) }
            }
            Err(e) => {
                warn!("no se pudo decodificar el logotipo: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn unavailable() -> Self {
        Self { image: None }
    }

    pub fn available(&self) -> bool {
        self.image.is_some()
    }
}

/// [`Canvas`] que acumula las operaciones de cada página y las convierte en
/// un documento PDF en [`PdfCanvas::finish`].
pub struct PdfCanvas {
    pages: Vec<Vec<Operation>>,
    logo: Option<Stream>,
    substitutions: usize,
}

impl PdfCanvas {
    pub fn new(logo: &Logo) -> Self {
        Self {
            pages: Vec::new(),
            logo: logo.image.clone(),
            substitutions: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Genera el documento y lo devuelve en memoria.
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.substitutions > 0 {
            debug!(
                substitutions = self.substitutions,
                "caracteres sin representación sustituidos por '?'"
            );
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font_dict("Helvetica"));
        let bold_id = doc.add_object(font_dict("Helvetica-Bold"));
        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        };
        if let Some(image) = self.logo {
            let image_id = doc.add_object(image);
            resources.set("XObject", dictionary! { LOGO_NAME => image_id });
        }
        let resources_id = doc.add_object(resources);

        let mut pages = self.pages;
        if pages.is_empty() {
            pages.push(Vec::new());
        }

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    mm_to_pt(PAGE_WIDTH).into(),
                    mm_to_pt(PAGE_HEIGHT).into(),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let info_id = doc.add_object(dictionary! {
            "Producer" => Object::string_literal("informe-registros"),
        });
        doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        info!(pages = count, bytes = buffer.len(), "PDF generado");
        Ok(buffer)
    }
}

fn font_dict(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn font_name(weight: FontWeight) -> &'static str {
    match weight {
        FontWeight::Regular => "F1",
        FontWeight::Bold => "F2",
    }
}

impl Canvas for PdfCanvas {
    fn begin_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn draw_text(&mut self, x: f32, baseline: f32, text: &str, style: TextStyle) {
        let (bytes, replaced) = encode_win_ansi(text);
        self.substitutions += replaced;

        let y = mm_to_pt(PAGE_HEIGHT - baseline);
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![font_name(style.weight).into(), style.size.into()],
        ));
        ops.push(Operation::new("Td", vec![mm_to_pt(x).into(), y.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(bytes, StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    fn draw_rect(&mut self, rect: Rect, paint: Paint) {
        let x = mm_to_pt(rect.x);
        let bottom = mm_to_pt(PAGE_HEIGHT - rect.y - rect.h);
        let w = mm_to_pt(rect.w);
        let h = mm_to_pt(rect.h);

        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        match paint {
            Paint::Fill(gray) => {
                ops.push(Operation::new("g", vec![(gray as f32 / 255.0).into()]));
                ops.push(Operation::new("re", vec![x.into(), bottom.into(), w.into(), h.into()]));
                ops.push(Operation::new("f", vec![]));
            }
            Paint::Stroke if rect.h == 0.0 => {
                ops.push(Operation::new("w", vec![0.5_f32.into()]));
                ops.push(Operation::new("m", vec![x.into(), bottom.into()]));
                ops.push(Operation::new("l", vec![(x + w).into(), bottom.into()]));
                ops.push(Operation::new("S", vec![]));
            }
            Paint::Stroke => {
                ops.push(Operation::new("w", vec![0.5_f32.into()]));
                ops.push(Operation::new("re", vec![x.into(), bottom.into(), w.into(), h.into()]));
                ops.push(Operation::new("S", vec![]));
            }
        }
        ops.push(Operation::new("Q", vec![]));
    }

    fn draw_image_or_fallback(&mut self, rect: Rect) -> bool {
        if self.logo.is_none() {
            return false;
        }
        let x = mm_to_pt(rect.x);
        let bottom = mm_to_pt(PAGE_HEIGHT - rect.y - rect.h);
        let w = mm_to_pt(rect.w);
        let h = mm_to_pt(rect.h);

        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), bottom.into()],
        ));
        ops.push(Operation::new("Do", vec![LOGO_NAME.into()]));
        ops.push(Operation::new("Q", vec![]));
        true
    }
}

/// Codifica el texto en WinAnsi. Los caracteres sin representación se
/// sustituyen por `?`; devuelve también cuántos se sustituyeron.
pub fn encode_win_ansi(text: &str) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(text.len());
    let mut replaced = 0;

    for c in text.chars() {
        let byte = match c {
            '\t' => Some(b' '),
            ' '..='~' | '\u{a0}'..='\u{ff}' => Some(c as u32 as u8),
            '€' => Some(0x80),
            '…' => Some(0x85),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            _ => None,
        };
        match byte {
            Some(b) => out.push(b),
            None => {
                out.push(b'?');
                replaced += 1;
            }
        }
    }

    (out, replaced)
}

/// Maqueta el documento y devuelve los bytes del PDF.
pub fn render_pdf(spec: &DocumentSpec, header: &PageHeader, logo: &Logo) -> Result<Vec<u8>> {
    let mut canvas = PdfCanvas::new(logo);
    layout(spec, header, &mut canvas);
    debug!(pages = canvas.page_count(), "maquetación terminada");
    canvas.finish()
}
