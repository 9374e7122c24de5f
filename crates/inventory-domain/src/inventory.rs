//! Documento de inventario dinámico.
//!
//! Forma serializada (contrato de scripts de inventario):
//! `{"_meta": {"hostvars": {<host>: {...}}}, "<grupo>": {"hosts": [...]}, ...}`.
//! Los mapas conservan el orden de inserción para que dos ejecuciones con la
//! misma entrada produzcan bytes idénticos.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Variables por host publicadas en `_meta.hostvars`.
///
/// `env_name` se omite en la salida cuando el host no cayó en un entorno
/// reconocido (rama UNKNOWN o entorno sin token en el hostname).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostVars {
    pub job_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_name: Option<String>,
    pub server_description: String,
    #[serde(default)]
    pub connected_hosts: Vec<String>,
}

/// Lista de hosts de un grupo, en orden de llegada (se permiten duplicados).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub hostvars: IndexMap<String, HostVars>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(rename = "_meta")]
    pub meta: Meta,
    #[serde(flatten)]
    pub groups: IndexMap<String, Group>,
}

impl InventoryDocument {
    /// Documento vacío: sólo `_meta` con `hostvars` vacío.
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega `hostname` al grupo, creándolo en el primer uso.
    pub fn add_to_group(&mut self, group: &str, hostname: &str) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .hosts
            .push(hostname.to_string());
    }

    /// Escribe las variables del host; una entrada previa con el mismo nombre
    /// se reemplaza (conserva su posición original).
    pub fn set_host_vars(&mut self, hostname: &str, vars: HostVars) {
        self.meta.hostvars.insert(hostname.to_string(), vars);
    }

    pub fn host_vars(&self, hostname: &str) -> Option<&HostVars> {
        self.meta.hostvars.get(hostname)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn host_count(&self) -> usize {
        self.meta.hostvars.len()
    }

    /// Serializa a JSON (compacto o indentado).
    pub fn to_json(&self, pretty: bool) -> Result<String, DomainError> {
        let out = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(job: &str, env: Option<&str>) -> HostVars {
        HostVars { job_name: job.into(),
                   env_name: env.map(str::to_owned),
                   server_description: "desc".into(),
                   connected_hosts: vec![] }
    }

    #[test]
    fn empty_document_serializes_meta_only() {
        let doc = InventoryDocument::new();
        let v: serde_json::Value = serde_json::from_str(&doc.to_json(false).unwrap()).unwrap();
        assert_eq!(v, json!({"_meta": {"hostvars": {}}}));
    }

    #[test]
    fn meta_key_comes_first_and_groups_keep_insertion_order() {
        let mut doc = InventoryDocument::new();
        doc.add_to_group("WEB", "h1");
        doc.add_to_group("DEV", "h1");
        doc.set_host_vars("h1", vars("job", Some("DEV_ENVIRONMENT")));
        let s = doc.to_json(false).unwrap();
        assert!(s.starts_with("{\"_meta\":"));
        assert!(s.find("\"WEB\"").unwrap() < s.find("\"DEV\"").unwrap());
    }

    #[test]
    fn unset_env_name_is_omitted() {
        let mut doc = InventoryDocument::new();
        doc.set_host_vars("h1", vars("generic-metrics", None));
        let v: serde_json::Value = serde_json::from_str(&doc.to_json(false).unwrap()).unwrap();
        assert!(v["_meta"]["hostvars"]["h1"].get("env_name").is_none());
        assert_eq!(v["_meta"]["hostvars"]["h1"]["connected_hosts"], json!([]));
    }

    #[test]
    fn set_host_vars_overwrites_in_place() {
        let mut doc = InventoryDocument::new();
        doc.set_host_vars("a", vars("one", None));
        doc.set_host_vars("b", vars("two", None));
        doc.set_host_vars("a", vars("three", None));
        let keys: Vec<&String> = doc.meta.hostvars.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(doc.host_vars("a").unwrap().job_name, "three");
    }

    #[test]
    fn parses_back_from_inventory_json() {
        let raw = json!({
            "_meta": {"hostvars": {"h": {"job_name": "j", "server_description": "d", "connected_hosts": []}}},
            "UNKNOWN": {"hosts": ["h"]}
        });
        let doc: InventoryDocument = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.group("UNKNOWN").unwrap().hosts, vec!["h"]);
        assert_eq!(doc.host_vars("h").unwrap().env_name, None);
    }
}
