//! inventory-domain
//!
//! Modelo de datos y reglas de clasificación del inventario dinámico.
//! No realiza I/O: recibe `HostRecord` ya normalizados (ver
//! `inventory-persistence`) y produce un `InventoryDocument` listo para
//! serializar.
//!
//! Módulos:
//! - `host`: registro plano de host y el trait `HostSource`.
//! - `inventory`: documento de salida (`_meta.hostvars` + grupos).
//! - `rules`: tablas ordenadas de entorno/rol y `classify`.
//! - `builder`: ensamblado del documento.

pub mod builder;
pub mod error;
pub mod host;
pub mod inventory;
pub mod rules;

pub use builder::{build, InventoryBuilder};
pub use error::DomainError;
pub use host::{HostRecord, HostSource, InMemoryHostSource};
pub use inventory::{Group, HostVars, InventoryDocument, Meta};
pub use rules::{classify, Classification};
