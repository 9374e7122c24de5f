//! tag-inventory: inventario dinámico (formato de scripts de inventario)
//! construido a partir de objetos VM etiquetados en Postgres.
pub mod cli;
pub mod logging;

pub use cli::{render, run, CliError, CommandLine, Mode};
