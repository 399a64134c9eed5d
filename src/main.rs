//! Informe de Registros - generador de PDF desde hojas de cálculo
//!
//! Lee un archivo CSV o un libro de cálculo (etiquetas en la fila 1, datos
//! desde la fila 4 por defecto), localiza un registro y guarda un informe
//! PDF con sus campos.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use informe_registros::{
    available_keys, batch_report, load, select_and_render, ClosingBlock, Error, LoadOptions,
    Logo, NormalizerKind, PageHeader, PositionBase, Report, ReportLayout, ReportSettings,
    SectionGroup, SelectionStrategy, SourceFormat, Table, DEFAULT_LOGO, DEFAULT_PLACEHOLDER,
};
use rfd::FileDialog;
use tracing_subscriber::EnvFilter;

/// Cuántas claves se muestran como ayuda cuando una búsqueda falla.
const KEYS_HINT: usize = 20;

#[derive(Parser)]
#[command(name = "informe-registros")]
#[command(
    author,
    version,
    about = "Genera informes PDF a partir de filas de una hoja de cálculo"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Informe PDF de un registro
    Informe {
        #[command(flatten)]
        origen: SourceArgs,

        #[command(flatten)]
        seleccion: SelectionArgs,

        #[command(flatten)]
        diseno: LayoutArgs,

        /// Campos a incluir, separados por comas (por defecto, todas las
        /// columnas cargadas)
        #[arg(long, value_delimiter = ',')]
        campos: Vec<String>,

        /// Archivo PDF de salida (por defecto, el nombre sugerido)
        #[arg(short, long)]
        salida: Option<PathBuf>,
    },

    /// Informe con todas las filas, una por página
    Lote {
        #[command(flatten)]
        origen: SourceArgs,

        #[command(flatten)]
        diseno: LayoutArgs,

        /// Archivo PDF de salida
        #[arg(short, long)]
        salida: Option<PathBuf>,
    },

    /// Lista las claves válidas para buscar registros
    Claves {
        #[command(flatten)]
        origen: SourceArgs,

        /// Columna identificadora (sin ella se listan posiciones)
        #[arg(long)]
        columna_id: Option<String>,

        /// Comparar el valor crudo de la columna, sin normalizar
        #[arg(long)]
        crudo: bool,

        /// Normalizador de claves: strip, truncar o redondeo
        #[arg(long, default_value = "redondeo")]
        normalizador: NormalizerKind,

        /// Número máximo de claves a mostrar (0 = todas)
        #[arg(long, default_value_t = 0)]
        limite: usize,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Archivo de entrada (xlsx, xls, ods o csv). Sin él se abre un diálogo.
    entrada: Option<PathBuf>,

    /// Hoja del libro (por defecto, la primera)
    #[arg(long)]
    hoja: Option<String>,

    /// Fila de las etiquetas (desde 0)
    #[arg(long, default_value_t = 0)]
    fila_encabezado: usize,

    /// Primera fila de datos (desde 0)
    #[arg(long, default_value_t = 3)]
    fila_datos: usize,

    /// Columnas iniciales a omitir
    #[arg(long, default_value_t = 0)]
    omitir_columnas: usize,
}

#[derive(Args)]
struct SelectionArgs {
    /// Número de registro entre las filas de datos (desde 1)
    #[arg(long, conflicts_with_all = ["id", "clave"])]
    posicion: Option<String>,

    /// Numerar las posiciones desde 0
    #[arg(long)]
    base_cero: bool,

    /// Valor exacto de la columna identificadora
    #[arg(long, requires = "columna_id", conflicts_with = "clave")]
    id: Option<String>,

    /// Clave normalizada (p. ej. las 4 cifras del número de parte)
    #[arg(long, requires = "columna_id")]
    clave: Option<String>,

    /// Columna identificadora para --id y --clave
    #[arg(long)]
    columna_id: Option<String>,

    /// Normalizador de claves: strip, truncar o redondeo
    #[arg(long, default_value = "redondeo")]
    normalizador: NormalizerKind,
}

impl SelectionArgs {
    fn strategy(&self) -> Result<(SelectionStrategy, String)> {
        let column = self.columna_id.clone().unwrap_or_default();
        if let Some(arg) = &self.posicion {
            let base = if self.base_cero {
                PositionBase::Zero
            } else {
                PositionBase::One
            };
            return Ok((SelectionStrategy::ByPosition { base }, arg.clone()));
        }
        if let Some(arg) = &self.id {
            return Ok((SelectionStrategy::ByRawIdentifier { column }, arg.clone()));
        }
        if let Some(arg) = &self.clave {
            let strategy = SelectionStrategy::ByNormalizedKey {
                column,
                kind: self.normalizador,
            };
            return Ok((strategy, arg.clone()));
        }
        bail!("Indique el registro con --posicion, --id o --clave.")
    }
}

#[derive(Args)]
struct LayoutArgs {
    /// Título de la cabecera (también si falta el logotipo)
    #[arg(long, default_value = "Informe Detallado de Registro")]
    titulo: String,

    /// Imagen de cabecera
    #[arg(long, default_value = DEFAULT_LOGO)]
    logo: PathBuf,

    /// No usar imagen de cabecera
    #[arg(long)]
    sin_logo: bool,

    /// Texto para valores vacíos
    #[arg(long, default_value = DEFAULT_PLACEHOLDER)]
    marcador: String,

    /// Título del grupo de campos condicionales
    #[arg(long, default_value = "TIPO DE INCIDENCIA")]
    grupo_titulo: String,

    /// Campos del grupo, separados por comas; solo se muestran si tienen valor
    #[arg(long, value_delimiter = ',')]
    grupo_campos: Vec<String>,

    /// Añadir casillas de conformidad y firmas al final
    #[arg(long)]
    conforme: bool,

    /// Nombre de quien elabora el informe
    #[arg(long, default_value = "")]
    elaborado: String,

    /// Nombre de quien lo aprueba
    #[arg(long, default_value = "")]
    aprobado: String,
}

impl LayoutArgs {
    fn settings(&self) -> ReportSettings {
        let logo = if self.sin_logo {
            Logo::unavailable()
        } else {
            Logo::load(&self.logo)
        };

        let group = (!self.grupo_campos.is_empty()).then(|| SectionGroup {
            title: self.grupo_titulo.clone(),
            fields: self.grupo_campos.clone(),
        });
        let closing = self.conforme.then(|| ClosingBlock {
            preparer: self.elaborado.clone(),
            approver: self.aprobado.clone(),
            ..Default::default()
        });

        ReportSettings {
            header: PageHeader {
                title: self.titulo.clone(),
                use_logo: !self.sin_logo,
            },
            layout: ReportLayout {
                placeholder: self.marcador.clone(),
                group,
                closing,
            },
            logo,
        }
    }
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Informe {
            origen,
            seleccion,
            diseno,
            campos,
            salida,
        } => informe(&origen, &seleccion, &diseno, campos, salida.as_deref()),
        Commands::Lote {
            origen,
            diseno,
            salida,
        } => lote(&origen, &diseno, salida.as_deref()),
        Commands::Claves {
            origen,
            columna_id,
            crudo,
            normalizador,
            limite,
        } => {
            let strategy = match columna_id {
                None => SelectionStrategy::ByPosition {
                    base: PositionBase::One,
                },
                Some(column) if crudo => SelectionStrategy::ByRawIdentifier { column },
                Some(column) => SelectionStrategy::ByNormalizedKey {
                    column,
                    kind: normalizador,
                },
            };
            claves(&origen, &strategy, limite)
        }
    }
}

fn cargar(origen: &SourceArgs) -> Result<Table> {
    let path = match &origen.entrada {
        Some(path) => path.clone(),
        None => {
            println!("Seleccione el archivo a procesar...");
            FileDialog::new()
                .add_filter("Hojas de cálculo", &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"])
                .set_title("Seleccionar archivo")
                .pick_file()
                .context("No se seleccionó ningún archivo.")?
        }
    };

    println!("Procesando: {:?}", path);

    let format = SourceFormat::from_path(&path)?;
    let bytes =
        std::fs::read(&path).with_context(|| format!("No se pudo leer '{}'", path.display()))?;
    let options = LoadOptions {
        header_row: origen.fila_encabezado,
        first_data_row: origen.fila_datos,
        skip_columns: origen.omitir_columnas,
        sheet_name: origen.hoja.clone(),
    };
    let table = load(&bytes, format, &options)
        .with_context(|| format!("No se pudo cargar '{}'", path.display()))?;

    println!(
        "Se cargaron {} registros con {} columnas.",
        table.len(),
        table.columns.len()
    );
    Ok(table)
}

fn informe(
    origen: &SourceArgs,
    seleccion: &SelectionArgs,
    diseno: &LayoutArgs,
    campos: Vec<String>,
    salida: Option<&Path>,
) -> Result<()> {
    let table = cargar(origen)?;
    let (strategy, arg) = seleccion.strategy()?;

    let fields = if campos.is_empty() {
        table.columns.clone()
    } else {
        campos
    };
    println!("Columnas que aparecerán en el PDF: {}", fields.join(", "));

    let settings = diseno.settings();
    match select_and_render(&table, &strategy, &arg, &fields, &settings) {
        Ok(Some(report)) => guardar(&report, salida),
        Ok(None) => {
            println!("No hay ningún registro seleccionado.");
            Ok(())
        }
        Err(Error::NotFound(what)) => {
            let keys = available_keys(&table, &strategy)?;
            println!("Claves disponibles ({} en total):", keys.len());
            for key in keys.iter().take(KEYS_HINT) {
                println!("  {}", key);
            }
            bail!("No se encontró ningún registro: {}", what)
        }
        Err(e) => Err(e.into()),
    }
}

fn lote(origen: &SourceArgs, diseno: &LayoutArgs, salida: Option<&Path>) -> Result<()> {
    let table = cargar(origen)?;
    let report = batch_report(&table, &diseno.settings())?;
    guardar(&report, salida)
}

fn claves(origen: &SourceArgs, strategy: &SelectionStrategy, limite: usize) -> Result<()> {
    let table = cargar(origen)?;
    let keys = available_keys(&table, strategy)?;
    let shown = if limite == 0 { keys.len() } else { limite };

    // Solo las posiciones corresponden una a una con los registros
    if let SelectionStrategy::ByPosition { .. } = strategy {
        for (key, record) in keys.iter().zip(&table.records).take(shown) {
            println!("{:>6}  {}", key, record.summary());
        }
    } else {
        for key in keys.iter().take(shown) {
            println!("{}", key);
        }
    }
    Ok(())
}

fn guardar(report: &Report, salida: Option<&Path>) -> Result<()> {
    let path = salida
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&report.filename));
    std::fs::write(&path, &report.bytes)
        .with_context(|| format!("No se pudo guardar '{}'", path.display()))?;
    println!("\n✓ Informe guardado correctamente: {:?}", path);
    Ok(())
}
