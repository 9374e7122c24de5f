//! Carga de configuración de conexión y de consulta desde variables de
//! entorno (opcionalmente desde `.env`).
//!
//! Conexión: `DB_NAME`, `DB_USERNAME`, `DB_PASSWORD`, `DB_HOSTNAME`,
//! `DB_PORT`, o bien `DATABASE_URL` completo (tiene prioridad).

use std::env;
use std::fmt;
use std::time::Duration;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, PersistenceError> {
    match var(key) {
        None => Ok(None),
        Some(raw) => raw.trim()
                        .parse()
                        .map(Some)
                        .map_err(|_| PersistenceError::Config(format!("{key} inválido: {raw}"))),
    }
}

/// Parámetros de conexión. Campos ausentes quedan fuera del connection
/// string y libpq aplica sus valores por defecto.
#[derive(Clone, Default)]
pub struct DbConfig {
    pub url: Option<String>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub connect_timeout: Duration,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
         .field("url", &self.url.as_ref().map(|_| "<redacted>"))
         .field("dbname", &self.dbname)
         .field("user", &self.user)
         .field("password", &self.password.as_ref().map(|_| "<redacted>"))
         .field("host", &self.host)
         .field("port", &self.port)
         .field("connect_timeout", &self.connect_timeout)
         .finish()
    }
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        // asegura que .env se haya cargado
        init_dotenv();
        let secs = parse_var::<u64>("DB_CONNECT_TIMEOUT_SECS")?.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        if secs == 0 {
            return Err(PersistenceError::Config("DB_CONNECT_TIMEOUT_SECS debe ser > 0".into()));
        }
        Ok(Self { url: var("DATABASE_URL"),
                  dbname: var("DB_NAME"),
                  user: var("DB_USERNAME"),
                  password: var("DB_PASSWORD"),
                  host: var("DB_HOSTNAME"),
                  port: parse_var("DB_PORT")?,
                  connect_timeout: Duration::from_secs(secs) })
    }

    /// Connection string para libpq. Con `url` definido se usa tal cual; si
    /// no, se arma en formato `clave='valor'` escapando `\` y `'`.
    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let port = self.port.map(|p| p.to_string());
        let timeout = self.connect_timeout.as_secs().max(1).to_string();
        let pairs = [("host", self.host.as_deref()),
                     ("port", port.as_deref()),
                     ("dbname", self.dbname.as_deref()),
                     ("user", self.user.as_deref()),
                     ("password", self.password.as_deref()),
                     ("connect_timeout", Some(timeout.as_str()))];
        pairs.iter()
             .filter_map(|(k, v)| v.map(|v| format!("{k}='{}'", escape_value(v))))
             .collect::<Vec<_>>()
             .join(" ")
    }
}

fn escape_value(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Parámetros de la consulta de hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostQuery {
    /// Código de tipo de entidad (`SystemEntityId`).
    pub entity_type: i32,
    /// Grupo de caché del inventario (`CacheGroup`).
    pub cache_group: i32,
    /// Tipos de conexión del datasource aceptados (`ConnectionTypeId`).
    pub connection_types: Vec<i32>,
    /// Patrón `ILIKE` que al menos un valor de tag debe cumplir.
    pub tag_pattern: String,
    /// Prefijo que identifica el tag de equipo/región.
    pub region_prefix: String,
}

impl Default for HostQuery {
    fn default() -> Self {
        Self { entity_type: 3001,
               cache_group: 4,
               connection_types: vec![5, 8, 10],
               tag_pattern: "%TEAMNAME".to_string(),
               region_prefix: "TEAMNAME-".to_string() }
    }
}

impl HostQuery {
    /// Valores por defecto con overrides `INVENTORY_ENTITY_TYPE`,
    /// `INVENTORY_CACHE_GROUP`, `INVENTORY_CONNECTION_TYPES` (lista separada
    /// por comas), `INVENTORY_TAG_PATTERN`, `INVENTORY_REGION_PREFIX`.
    pub fn from_env() -> Result<Self, PersistenceError> {
        init_dotenv();
        let defaults = Self::default();
        let connection_types = match var("INVENTORY_CONNECTION_TYPES") {
            None => defaults.connection_types,
            Some(raw) => parse_code_list(&raw)?,
        };
        Ok(Self { entity_type: parse_var("INVENTORY_ENTITY_TYPE")?.unwrap_or(defaults.entity_type),
                  cache_group: parse_var("INVENTORY_CACHE_GROUP")?.unwrap_or(defaults.cache_group),
                  connection_types,
                  tag_pattern: var("INVENTORY_TAG_PATTERN").unwrap_or(defaults.tag_pattern),
                  region_prefix: var("INVENTORY_REGION_PREFIX").unwrap_or(defaults.region_prefix) })
    }
}

/// Parsea `"5, 8,10"` → `[5, 8, 10]`. Una lista vacía es un error: la
/// consulta no devolvería nada.
pub fn parse_code_list(raw: &str) -> Result<Vec<i32>, PersistenceError> {
    let codes = raw.split(',')
                   .map(str::trim)
                   .filter(|s| !s.is_empty())
                   .map(|s| s.parse::<i32>()
                             .map_err(|_| PersistenceError::Config(format!("código de conexión inválido: {s}"))))
                   .collect::<Result<Vec<_>, _>>()?;
    if codes.is_empty() {
        return Err(PersistenceError::Config("INVENTORY_CONNECTION_TYPES vacío".into()));
    }
    Ok(codes)
}
