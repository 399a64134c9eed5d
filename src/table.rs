//! Modelo de datos: celdas, registros y tablas cargadas de una hoja.

use chrono::NaiveDateTime;

/// Valor escalar de una celda.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Fecha. `serial` conserva el número de serie de la hoja de cálculo
    /// cuando el origen lo proporciona.
    Date {
        value: NaiveDateTime,
        serial: Option<f64>,
    },
    Empty,
}

impl Cell {
    /// Celda de texto; el texto en blanco se convierte en `Empty`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    /// `true` para celdas vacías, texto en blanco o NaN.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
            Cell::Date { .. } => false,
        }
    }

    /// Texto tal como se muestra en el informe. Las fechas van en
    /// `DD/MM/YYYY` sin hora y los valores ausentes usan `placeholder`.
    pub fn display(&self, placeholder: &str) -> String {
        if self.is_blank() {
            return placeholder.to_string();
        }
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Date { value, .. } => value.format("%d/%m/%Y").to_string(),
            Cell::Empty => placeholder.to_string(),
        }
    }

    /// Texto de la celda para compararlo con lo que escribe el usuario: el
    /// texto recortado, o el número tal como se ve en la hoja (`123`, no
    /// `123.0`). `None` si está en blanco.
    pub fn raw_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Date { value, .. } => Some(value.format("%d/%m/%Y").to_string()),
            Cell::Empty => None,
        }
    }

    /// Valor numérico de la celda, si lo tiene. Las fechas devuelven su
    /// número de serie.
    pub fn as_f64(&self) -> Option<f64> {
        let n = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Date { serial, .. } => (*serial)?,
            Cell::Empty => return None,
        };
        n.is_finite().then_some(n)
    }
}

/// Formatea un número como lo vería una persona: los enteros sin `.0`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Un registro (fila) de la tabla.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Número de fila en la hoja de origen, empezando en 1.
    pub row_number: usize,
    /// Pares etiqueta/valor en el orden de las columnas.
    pub fields: Vec<(String, Cell)>,
}

impl Record {
    /// Valor del primer campo con esa etiqueta.
    pub fn get(&self, label: &str) -> Option<&Cell> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| c)
    }

    /// Etiqueta corta para listas de selección: `Fila 4: Juan Pérez...`.
    pub fn summary(&self) -> String {
        let first = self
            .fields
            .first()
            .map(|(_, c)| c.display(""))
            .unwrap_or_default();
        let first: String = first.chars().take(20).collect();
        format!("Fila {}: {}...", self.row_number, first)
    }
}

/// Tabla cargada: etiquetas de columna y registros en orden.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Índice de la primera columna con esa etiqueta.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }
}
