//! Tipos de error de la biblioteca.

use thiserror::Error;

/// Resultado usado en todo el crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errores que pueden ocurrir al cargar, seleccionar o generar un informe.
///
/// Los problemas de codificación de caracteres en el PDF no aparecen aquí:
/// se corrigen en el momento sustituyendo el carácter por `?`.
#[derive(Debug, Error)]
pub enum Error {
    /// El archivo subido no se puede leer como datos tabulares.
    #[error("Formato no válido: {0}")]
    Format(String),

    /// Configuración de filas/columnas inválida.
    #[error("Configuración no válida: {0}")]
    Config(String),

    /// Posición de fila fuera de rango.
    #[error("Fila fuera de rango: {0}")]
    Range(String),

    /// Ningún registro (u hoja) coincide con lo buscado.
    #[error("No encontrado: {0}")]
    NotFound(String),

    /// Error de E/S
    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),

    /// Error al construir el documento PDF
    #[error("Error PDF: {0}")]
    Pdf(#[from] lopdf::Error),
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Format(format!("CSV: {}", e))
    }
}

impl From<calamine::Error> for Error {
    fn from(e: calamine::Error) -> Self {
        Error::Format(format!("libro de cálculo: {}", e))
    }
}
