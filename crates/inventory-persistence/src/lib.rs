//! inventory-persistence
//!
//! Host Fetcher sobre Postgres (Diesel + r2d2). Lee los objetos descubiertos
//! y sus tags, normaliza el payload de tags y entrega `HostRecord` listos
//! para el builder del dominio.
//!
//! Módulos:
//! - `config`: carga de conexión y parámetros de consulta desde el entorno.
//! - `pg`: pool, proveedor de conexiones, consulta y `PgHostFetcher`.
//! - `tags`: normalización del payload de tags y extracción de la región.

pub mod config;
pub mod error;
pub mod pg;
pub mod tags;

pub use config::{init_dotenv, DbConfig, HostQuery};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, load_hosts, ConnectionProvider, PgHostFetcher, PgPool, PoolProvider};
