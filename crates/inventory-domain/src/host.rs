//! Registro de host tal como lo entrega el fetcher.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Un objeto descubierto (VM) con su marca de equipo/región ya extraída.
///
/// - `datasource_name`: sistema de origen; se conserva pero no participa en
///   la clasificación.
/// - `object_id`: identificador opaco, único dentro de un datasource.
/// - `object_name`: hostname canónico, clave en la salida.
/// - `app_region`: primer tag con el prefijo configurado, si existe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub datasource_name: String,
    pub object_id: String,
    pub object_name: String,
    pub app_region: Option<String>,
}

impl HostRecord {
    /// Construye un registro validando que el hostname no esté vacío (se usa
    /// como clave del mapa de hostvars).
    pub fn new(datasource_name: impl Into<String>,
               object_id: impl Into<String>,
               object_name: impl Into<String>,
               app_region: Option<String>)
               -> Result<Self, DomainError> {
        let object_name = object_name.into();
        if object_name.trim().is_empty() {
            return Err(DomainError::ValidationError("object_name vacío".to_string()));
        }
        Ok(Self { datasource_name: datasource_name.into(),
                  object_id: object_id.into(),
                  object_name,
                  app_region })
    }
}

/// Fuente de hosts consumida por el builder.
///
/// Contrato: devuelve una secuencia finita ya filtrada. Los fallos de la
/// fuente se degradan a lista vacía dentro de la implementación; el llamador
/// nunca ve un error.
pub trait HostSource {
    fn fetch_hosts(&self) -> Vec<HostRecord>;
}

/// Fuente en memoria (tests y ejecución sin base de datos).
#[derive(Debug, Clone, Default)]
pub struct InMemoryHostSource {
    hosts: Vec<HostRecord>,
}

impl InMemoryHostSource {
    pub fn new(hosts: Vec<HostRecord>) -> Self {
        Self { hosts }
    }
}

impl HostSource for InMemoryHostSource {
    fn fetch_hosts(&self) -> Vec<HostRecord> {
        self.hosts.clone()
    }
}
