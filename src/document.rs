//! Descripción del contenido del informe como una lista de bloques.
//!
//! Aquí solo se decide *qué* aparece y en qué orden; la colocación en la
//! página la hace [`crate::render::layout`].

use tracing::debug;

use crate::table::{Record, Table};

/// Texto usado para valores ausentes o en blanco.
pub const DEFAULT_PLACEHOLDER: &str = "---";

/// Un bloque del informe.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Contador de página en modo lote: "Registro i de N".
    Counter(String),
    /// Etiqueta sobre fondo gris y el valor como párrafo.
    Section { label: String, value: String },
    /// Sección agrupada con subcampos `etiqueta: valor`.
    Group {
        title: String,
        entries: Vec<(String, String)>,
    },
    /// Casilla marcada con una "X" y su texto.
    Checkbox { caption: String },
    /// Dos firmas en columnas.
    Signatures { left: Signature, right: Signature },
    PageBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub caption: String,
    pub name: String,
}

/// Lista ordenada de bloques del documento.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSpec {
    pub blocks: Vec<Block>,
}

impl DocumentSpec {
    /// Etiquetas de las secciones simples, en orden.
    pub fn section_labels(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Section { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Grupo de campos que se muestran juntos bajo un título, solo si tienen
/// valor (p. ej. las dos descripciones excluyentes de "TIPO DE INCIDENCIA").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionGroup {
    pub title: String,
    pub fields: Vec<String>,
}

/// Bloque de cierre: casillas de conformidad y firmas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingBlock {
    pub checkboxes: Vec<String>,
    pub preparer_caption: String,
    pub preparer: String,
    pub approver_caption: String,
    pub approver: String,
}

impl Default for ClosingBlock {
    fn default() -> Self {
        Self {
            checkboxes: vec![
                "Conforme con la información registrada".to_string(),
                "Conforme con las medidas adoptadas".to_string(),
            ],
            preparer_caption: "Elaborado por".to_string(),
            preparer: String::new(),
            approver_caption: "Aprobado por".to_string(),
            approver: String::new(),
        }
    }
}

/// Opciones de contenido del informe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    pub placeholder: String,
    pub group: Option<SectionGroup>,
    pub closing: Option<ClosingBlock>,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            group: None,
            closing: None,
        }
    }
}

/// Bloques para un registro. Los campos que el registro no tiene se
/// muestran con el marcador.
pub fn record_document(record: &Record, fields: &[String], layout: &ReportLayout) -> DocumentSpec {
    let placeholder = layout.placeholder.as_str();
    let mut blocks = Vec::with_capacity(fields.len() + 4);
    let mut group_emitted = false;

    for label in fields {
        if let Some(group) = &layout.group {
            if group.fields.contains(label) {
                // El grupo ocupa el lugar de su primer campo
                if !group_emitted {
                    blocks.push(group_block(record, group, placeholder));
                    group_emitted = true;
                }
                continue;
            }
        }

        let value = match record.get(label) {
            Some(cell) => cell.display(placeholder),
            None => {
                debug!(field = %label, row = record.row_number, "campo ausente");
                placeholder.to_string()
            }
        };
        blocks.push(Block::Section {
            label: label.clone(),
            value,
        });
    }

    if let Some(group) = &layout.group {
        if !group_emitted {
            blocks.push(group_block(record, group, placeholder));
        }
    }

    if let Some(closing) = &layout.closing {
        blocks.extend(closing_blocks(closing));
    }

    DocumentSpec { blocks }
}

/// Modo lote: cada registro empieza en una página nueva con todas las
/// columnas, sin filtros ni grupos. Un registro que no cabe en una página
/// continúa en las siguientes, así que el documento tiene N páginas solo si
/// cada registro cabe en una.
pub fn table_document(table: &Table, layout: &ReportLayout) -> DocumentSpec {
    let total = table.len();
    let mut blocks = Vec::new();

    for (i, record) in table.records.iter().enumerate() {
        if i > 0 {
            blocks.push(Block::PageBreak);
        }
        blocks.push(Block::Counter(format!("Registro {} de {}", i + 1, total)));
        blocks.extend(record.fields.iter().map(|(label, cell)| Block::Section {
            label: label.clone(),
            value: cell.display(&layout.placeholder),
        }));
    }

    DocumentSpec { blocks }
}

fn group_block(record: &Record, group: &SectionGroup, placeholder: &str) -> Block {
    let entries: Vec<(String, String)> = group
        .fields
        .iter()
        .filter_map(|label| {
            let cell = record.get(label)?;
            (!cell.is_blank()).then(|| (label.clone(), cell.display(placeholder)))
        })
        .collect();

    if entries.is_empty() {
        return Block::Section {
            label: group.title.clone(),
            value: placeholder.to_string(),
        };
    }

    Block::Group {
        title: group.title.clone(),
        entries,
    }
}

fn closing_blocks(closing: &ClosingBlock) -> Vec<Block> {
    let mut blocks: Vec<Block> = closing
        .checkboxes
        .iter()
        .map(|caption| Block::Checkbox {
            caption: caption.clone(),
        })
        .collect();
    blocks.push(Block::Signatures {
        left: Signature {
            caption: closing.preparer_caption.clone(),
            name: closing.preparer.clone(),
        },
        right: Signature {
            caption: closing.approver_caption.clone(),
            name: closing.approver.clone(),
        },
    });
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use pretty_assertions::assert_eq;

    fn record() -> Record {
        Record {
            row_number: 7,
            fields: vec![
                ("Parte".into(), Cell::Number(15.0)),
                ("Leve".into(), Cell::Empty),
                ("Grave".into(), Cell::Text("Rotura de tubería".into())),
                ("Lugar".into(), Cell::Text("Nave 2".into())),
            ],
        }
    }

    fn labels(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sections_follow_field_order() {
        let spec = record_document(
            &record(),
            &labels(&["Lugar", "Parte", "Falta"]),
            &ReportLayout::default(),
        );
        assert_eq!(
            spec.blocks,
            vec![
                Block::Section {
                    label: "Lugar".into(),
                    value: "Nave 2".into()
                },
                Block::Section {
                    label: "Parte".into(),
                    value: "15".into()
                },
                Block::Section {
                    label: "Falta".into(),
                    value: "---".into()
                },
            ]
        );
    }

    #[test]
    fn test_group_only_keeps_present_fields() {
        let layout = ReportLayout {
            group: Some(SectionGroup {
                title: "TIPO DE INCIDENCIA".into(),
                fields: labels(&["Leve", "Grave"]),
            }),
            ..Default::default()
        };
        let spec = record_document(&record(), &labels(&["Parte", "Leve", "Grave", "Lugar"]), &layout);

        assert_eq!(spec.section_labels(), vec!["Parte", "Lugar"]);
        assert_eq!(
            spec.blocks[1],
            Block::Group {
                title: "TIPO DE INCIDENCIA".into(),
                entries: vec![("Grave".into(), "Rotura de tubería".into())],
            }
        );
    }

    #[test]
    fn test_empty_group_shows_placeholder() {
        let layout = ReportLayout {
            group: Some(SectionGroup {
                title: "TIPO DE INCIDENCIA".into(),
                fields: labels(&["Leve"]),
            }),
            ..Default::default()
        };
        let spec = record_document(&record(), &labels(&["Parte"]), &layout);

        assert_eq!(
            spec.blocks.last(),
            Some(&Block::Section {
                label: "TIPO DE INCIDENCIA".into(),
                value: "---".into()
            })
        );
    }

    #[test]
    fn test_closing_block() {
        let layout = ReportLayout {
            closing: Some(ClosingBlock {
                preparer: "Ana Ruiz".into(),
                approver: "Luis Gil".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let spec = record_document(&record(), &labels(&["Parte"]), &layout);

        assert_eq!(spec.blocks.len(), 4);
        assert!(matches!(spec.blocks[1], Block::Checkbox { .. }));
        assert!(matches!(spec.blocks[2], Block::Checkbox { .. }));
        match &spec.blocks[3] {
            Block::Signatures { left, right } => {
                assert_eq!(left.name, "Ana Ruiz");
                assert_eq!(right.name, "Luis Gil");
            }
            other => panic!("bloque inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_table_document_counters() {
        let table = Table {
            columns: labels(&["Parte", "Leve", "Grave", "Lugar"]),
            records: vec![record(), record(), record()],
        };
        let spec = table_document(&table, &ReportLayout::default());

        let counters: Vec<&Block> = spec
            .blocks
            .iter()
            .filter(|b| matches!(b, Block::Counter(_)))
            .collect();
        assert_eq!(
            counters,
            vec![
                &Block::Counter("Registro 1 de 3".into()),
                &Block::Counter("Registro 2 de 3".into()),
                &Block::Counter("Registro 3 de 3".into()),
            ]
        );
        assert_eq!(
            spec.blocks.iter().filter(|b| **b == Block::PageBreak).count(),
            2
        );
        assert_eq!(spec.section_labels().len(), 12);
    }
}
