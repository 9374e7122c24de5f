//! Host Fetcher sobre Postgres (Diesel).
//!
//! - Pool r2d2 de una sola conexión, construido sin conexión anticipada: el
//!   primer checkout es quien descubre si la base está disponible.
//! - `load_hosts` ejecuta la consulta parametrizada y mapea filas a
//!   `HostRecord`, descartando (con log) las filas con tags malformados.
//! - `PgHostFetcher` implementa `HostSource`: cualquier fallo de conexión o
//!   consulta se registra y degrada a lista vacía.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::{Array, Integer, Json, Nullable, Text};
use log::{debug, error, warn};
use serde_json::Value;

use inventory_domain::{HostRecord, HostSource};

use crate::config::{DbConfig, HostQuery};
use crate::error::PersistenceError;
use crate::tags::{extract_app_region, normalize_tags};

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar el pool real o uno apuntando a un destino inalcanzable
/// en tests. Debe devolver una conexión válida o `PersistenceError::Connection`.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        Ok(self.pool.get()?)
    }
}

/// Objetos de tipo VM en el grupo de caché indicado, de datasources con los
/// tipos de conexión aceptados, que tengan al menos un tag que cumpla el
/// patrón. Parámetros: $1 entity type, $2 cache group, $3 connection types,
/// $4 patrón ILIKE.
///
/// `jsonb_each_text` sólo se aplica a tags de tipo objeto (sobre cualquier
/// otro tipo Postgres aborta la sentencia completa). Los tags guardados como
/// texto serializado se filtran buscando el patrón dentro del texto y se
/// parsean del lado Rust; arreglos y escalares quedan fuera.
pub const HOSTS_QUERY: &str = r#"
SELECT
    COALESCE(d."Name"::text, '') AS datasource_name,
    a."ObjectId"::text AS object_id,
    a."ObjectName"::text AS object_name,
    cast(a."Object"::json AS json) -> 'tags' AS tags
FROM
    dbo."Objects" a
INNER JOIN
    dbo."ObjectInventory" b ON a."InventoryId" = b."Id"
INNER JOIN
    dbo."Datasource" d ON b."DatasourceId" = d."DatasourceId"
WHERE
    a."SystemEntityId" = $1
    AND b."CacheGroup" = $2
    AND d."ConnectionTypeId" = ANY($3)
    AND CASE jsonb_typeof(cast(a."Object"::jsonb AS jsonb) -> 'tags')
        WHEN 'object' THEN EXISTS (
            SELECT 1
            FROM jsonb_each_text(cast(a."Object"::jsonb AS jsonb) -> 'tags') AS kv
            WHERE kv.value ILIKE $4
        )
        WHEN 'string' THEN
            ((cast(a."Object"::jsonb AS jsonb) -> 'tags') #>> '{}') ILIKE ('%' || $4 || '%')
        ELSE false
    END
"#;

/// Fila devuelta por `HOSTS_QUERY`.
#[derive(QueryableByName, Debug, Clone)]
pub struct HostRow {
    #[diesel(sql_type = Text)]
    pub datasource_name: String,
    #[diesel(sql_type = Text)]
    pub object_id: String,
    #[diesel(sql_type = Text)]
    pub object_name: String,
    #[diesel(sql_type = Nullable<Json>)]
    pub tags: Option<Value>,
}

/// Mapea una fila a `HostRecord`. Devuelve `None` (y loguea) si el payload
/// de tags no se puede normalizar o el hostname es vacío: la fila no debe
/// aparecer en el inventario, ni siquiera como UNKNOWN.
pub fn host_from_row(row: HostRow, region_prefix: &str) -> Option<HostRecord> {
    let tags = match normalize_tags(row.tags.as_ref()) {
        Ok(tags) => tags,
        Err(e) => {
            warn!("skip row object_id={} name={}: {e}", row.object_id, row.object_name);
            return None;
        }
    };
    let app_region = extract_app_region(&tags, region_prefix);
    match HostRecord::new(row.datasource_name, row.object_id.clone(), row.object_name, app_region) {
        Ok(host) => Some(host),
        Err(e) => {
            warn!("skip row object_id={}: {e}", row.object_id);
            None
        }
    }
}

/// Ejecuta la consulta sobre una conexión ya abierta y mapea las filas.
pub fn load_hosts(conn: &mut PgConnection, query: &HostQuery) -> Result<Vec<HostRecord>, PersistenceError> {
    debug!("load_hosts:start entity_type={} cache_group={} connection_types={:?}",
           query.entity_type,
           query.cache_group,
           query.connection_types);
    let rows: Vec<HostRow> = diesel::sql_query(HOSTS_QUERY).bind::<Integer, _>(query.entity_type)
                                                            .bind::<Integer, _>(query.cache_group)
                                                            .bind::<Array<Integer>, _>(query.connection_types.clone())
                                                            .bind::<Text, _>(query.tag_pattern.clone())
                                                            .load(conn)?;
    let total = rows.len();
    let hosts: Vec<HostRecord> = rows.into_iter()
                                     .filter_map(|row| host_from_row(row, &query.region_prefix))
                                     .collect();
    debug!("load_hosts:done rows={total} hosts={}", hosts.len());
    Ok(hosts)
}

/// Determina si un error es transitorio (reintentar con backoff).
///
/// Los fallos de checkout del pool no cuentan: r2d2 ya esperó su
/// `connection_timeout` antes de rendirse.
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("terminating connection due to administrator command")
            || m.contains("server closed the connection unexpectedly")
        }
        _ => false,
    }
}

/// Retry simple con backoff lineal (hasta 3 reintentos: 15ms, 30ms, 45ms).
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Fetcher de hosts sobre Postgres.
pub struct PgHostFetcher<P: ConnectionProvider> {
    pub provider: P,
    pub query: HostQuery,
}

impl<P: ConnectionProvider> PgHostFetcher<P> {
    pub fn new(provider: P, query: HostQuery) -> Self {
        Self { provider, query }
    }

    /// Variante que propaga el error (el trait lo degrada a lista vacía).
    pub fn try_fetch_hosts(&self) -> Result<Vec<HostRecord>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            load_hosts(&mut conn, &self.query)
        })
    }
}

impl PgHostFetcher<PoolProvider> {
    /// Carga `.env`, lee conexión y parámetros de consulta y arma el fetcher.
    pub fn from_env() -> Result<Self, PersistenceError> {
        let pool = build_pool_from_env()?;
        Ok(Self::new(PoolProvider { pool }, HostQuery::from_env()?))
    }
}

impl<P: ConnectionProvider> HostSource for PgHostFetcher<P> {
    fn fetch_hosts(&self) -> Vec<HostRecord> {
        match self.try_fetch_hosts() {
            Ok(hosts) => hosts,
            Err(e) => {
                error!("fetch_hosts failed, returning empty inventory: {e}");
                Vec::new()
            }
        }
    }
}

/// Construye el pool (tamaño 1, sin conexiones inactivas mínimas). No abre
/// conexión: el primer `get()` espera como máximo `connect_timeout`.
pub fn build_pool(cfg: &DbConfig) -> Result<PgPool, PersistenceError> {
    if cfg.connect_timeout.is_zero() {
        return Err(PersistenceError::Config("connect_timeout debe ser > 0".into()));
    }
    let manager = ConnectionManager::<PgConnection>::new(cfg.connection_string());
    let pool = r2d2::Pool::builder().max_size(1)
                                    .min_idle(Some(0))
                                    .connection_timeout(cfg.connect_timeout)
                                    .build_unchecked(manager);
    Ok(pool)
}

/// Helper: carga `.env`, lee `DbConfig` y construye el pool.
pub fn build_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = DbConfig::from_env()?;
    debug!("build_pool_from_env cfg={cfg:?}");
    build_pool(&cfg)
}
