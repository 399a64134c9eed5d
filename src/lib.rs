//! Informes PDF a partir de filas de una hoja de cálculo.
//!
//! El flujo es siempre el mismo: [`load`] lee un CSV o un libro de cálculo
//! en una [`Table`], [`select`] localiza un registro (por posición, por un
//! identificador o por una clave normalizada) y [`render_pdf`] maqueta el
//! documento descrito por [`record_document`] o [`table_document`].

pub mod document;
pub mod error;
pub mod loader;
pub mod normalizer;
pub mod pdf;
pub mod render;
pub mod report;
pub mod selector;
pub mod table;

pub use document::{
    record_document, table_document, Block, ClosingBlock, DocumentSpec, ReportLayout,
    SectionGroup, Signature, DEFAULT_PLACEHOLDER,
};
pub use error::{Error, Result};
pub use loader::{load, sheet_names, LoadOptions, SourceFormat};
pub use normalizer::{normalize, pad_key, NormalizerKind};
pub use pdf::{render_pdf, Logo, PdfCanvas, DEFAULT_LOGO};
pub use render::{layout, Canvas, PageHeader};
pub use report::{batch_report, record_report, select_and_render, Report, ReportSettings};
pub use selector::{available_keys, select, PositionBase, Selection, SelectionStrategy};
pub use table::{Cell, Record, Table};
