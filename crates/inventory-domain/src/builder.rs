//! Ensamblado del inventario a partir de registros de host.
//!
//! Función pura: sin I/O, determinista dado el mismo orden de entrada.

use std::env;

use log::debug;

use crate::rules::{classify, Classification};
use crate::{HostRecord, HostVars, InventoryDocument};

/// Job de métricas para hosts gestionados.
pub const DEFAULT_JOB_NAME: &str = "generic-prometheus-job-name";
/// Job de métricas para hosts UNKNOWN.
pub const FALLBACK_JOB_NAME: &str = "generic-metrics";
/// Descripción estática publicada en cada host.
pub const DEFAULT_SERVER_DESCRIPTION: &str = "Server in my org";

/// Etiquetas estáticas que el builder copia en las hostvars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryBuilder {
    pub job_name: String,
    pub fallback_job_name: String,
    pub server_description: String,
}

impl Default for InventoryBuilder {
    fn default() -> Self {
        Self { job_name: DEFAULT_JOB_NAME.to_string(),
               fallback_job_name: FALLBACK_JOB_NAME.to_string(),
               server_description: DEFAULT_SERVER_DESCRIPTION.to_string() }
    }
}

impl InventoryBuilder {
    /// Valores por defecto con overrides opcionales desde el entorno:
    /// `INVENTORY_JOB_NAME`, `INVENTORY_FALLBACK_JOB_NAME`,
    /// `INVENTORY_SERVER_DESCRIPTION`. Valores vacíos se ignoran.
    pub fn from_env() -> Self {
        let read = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self { job_name: read("INVENTORY_JOB_NAME").unwrap_or(defaults.job_name),
               fallback_job_name: read("INVENTORY_FALLBACK_JOB_NAME").unwrap_or(defaults.fallback_job_name),
               server_description: read("INVENTORY_SERVER_DESCRIPTION").unwrap_or(defaults.server_description) }
    }

    /// Variables del host según su clasificación. `connected_hosts` queda
    /// vacío: no se calcula todavía.
    pub fn host_vars(&self, classification: &Classification) -> HostVars {
        let job_name = if classification.is_managed() {
            self.job_name.clone()
        } else {
            self.fallback_job_name.clone()
        };
        HostVars { job_name,
                   env_name: classification.env_name().map(str::to_owned),
                   server_description: self.server_description.clone(),
                   connected_hosts: Vec::new() }
    }

    /// Clasifica cada host, lo agrega a sus grupos y escribe sus hostvars.
    /// Un hostname repetido sobrescribe sus hostvars y puede aparecer dos
    /// veces en un mismo grupo.
    pub fn build(&self, hosts: &[HostRecord]) -> InventoryDocument {
        let mut doc = InventoryDocument::new();
        for host in hosts {
            let hostname = host.object_name.as_str();
            let classification = classify(host);
            let groups = classification.groups();
            debug!("classify host={hostname} region={:?} groups={groups:?}", host.app_region);
            for group in &groups {
                doc.add_to_group(group, hostname);
            }
            doc.set_host_vars(hostname, self.host_vars(&classification));
        }
        debug!("build:done hosts={} groups={}", doc.host_count(), doc.groups.len());
        doc
    }
}

/// Atajo con las etiquetas por defecto.
pub fn build(hosts: &[HostRecord]) -> InventoryDocument {
    InventoryBuilder::default().build(hosts)
}
