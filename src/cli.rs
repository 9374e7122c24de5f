//! Interfaz de línea de comandos.
//!
//! La plataforma invoca el script con `--list` (inventario completo) o con
//! `--host <nombre>` (variables de un host). Como `--list` ya incluye
//! `_meta.hostvars`, `--host` sólo se usa en herramientas que no lo leen.

use std::io::Write;

use clap::Parser;
use inventory_domain::{HostSource, InventoryBuilder};
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "tag-inventory")]
#[command(about = "Dynamic inventory built from tagged VM objects.", version)]
pub struct CommandLine {
    /// Print the whole inventory (default when no flag is given)
    #[arg(long, conflicts_with = "host")]
    pub list: bool,
    /// Print the variables of a single host
    #[arg(long, value_name = "HOSTNAME")]
    pub host: Option<String>,
    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    List,
    Host(String),
}

impl CommandLine {
    pub fn mode(&self) -> Mode {
        match &self.host {
            Some(name) => Mode::Host(name.clone()),
            None => Mode::List,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Obtiene los hosts, arma el inventario y devuelve el JSON a imprimir.
pub fn render(cmd: &CommandLine, source: &dyn HostSource, builder: &InventoryBuilder) -> Result<String, CliError> {
    let hosts = source.fetch_hosts();
    let doc = builder.build(&hosts);
    info!("inventory built: hosts={} groups={}", doc.host_count(), doc.groups.len());
    let out = match cmd.mode() {
        Mode::List => to_json(&doc, cmd.pretty)?,
        Mode::Host(name) => match doc.host_vars(&name) {
            Some(vars) => to_json(vars, cmd.pretty)?,
            None => {
                warn!("host not found in inventory: {name}");
                to_json(&serde_json::Map::new(), cmd.pretty)?
            }
        },
    };
    Ok(out)
}

/// Igual que `render`, escribiendo el resultado (con salto final) en `out`.
pub fn run<W: Write>(cmd: &CommandLine,
                     source: &dyn HostSource,
                     builder: &InventoryBuilder,
                     out: &mut W)
                     -> Result<(), CliError> {
    let json = render(cmd, source, builder)?;
    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(())
}
