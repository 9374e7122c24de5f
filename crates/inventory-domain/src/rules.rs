//! Reglas de clasificación por subcadena.
//!
//! Las reglas se expresan como tablas ordenadas evaluadas con "primera
//! coincidencia gana". Todas las comparaciones son `contains` sensibles a
//! mayúsculas sobre el hostname o la región.

use crate::HostRecord;

/// Tokens que, presentes en la región, marcan al host como gestionado.
pub const MANAGED_REGION_TOKENS: &[&str] = &["DEV", "TEST1", "TEST2"];

/// Token de hostname que marca al host como gestionado aunque la región no
/// lo haga (o no exista).
pub const MANAGED_HOSTNAME_TOKEN: &str = "TEST";

/// Grupo de descarte para hosts no gestionados.
pub const UNKNOWN_GROUP: &str = "UNKNOWN";

/// Regla de entorno: token buscado en el hostname, grupo y etiqueta asignados.
#[derive(Debug, PartialEq, Eq)]
pub struct EnvRule {
    pub token: &'static str,
    pub group: &'static str,
    pub env_name: &'static str,
}

/// Regla de rol: cualquiera de `tokens` en el hostname agrega `groups`.
#[derive(Debug, PartialEq, Eq)]
pub struct RoleRule {
    pub tokens: &'static [&'static str],
    pub groups: &'static [&'static str],
}

/// Orden relevante: DEV se evalúa antes que TEST1 y TEST2.
pub const ENV_RULES: &[EnvRule] = &[EnvRule { token: "DEV", group: "DEV", env_name: "DEV_ENVIRONMENT" },
                                    EnvRule { token: "TEST1", group: "TEST1", env_name: "TEST1_ENVIRONMENT" },
                                    EnvRule { token: "TEST2", group: "TEST2", env_name: "TEST2_ENVIRONMENT" }];

/// Orden relevante: WEB se evalúa antes que APP.
pub const ROLE_RULES: &[RoleRule] = &[RoleRule { tokens: &["HTTP", "WEB"], groups: &["WEB", "WEB_PATCHING"] },
                                      RoleRule { tokens: &["APP", "TOMCAT"], groups: &["APP", "TOMCAT_PATCHING"] }];

/// Resultado de clasificar un host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Host gestionado. `env_name` es `None` cuando ningún token de entorno
    /// aparece en el hostname; en ese caso `groups` queda vacío.
    Managed {
        env_name: Option<&'static str>,
        groups: Vec<&'static str>,
    },
    /// Host fuera de los entornos gestionados (grupo UNKNOWN).
    Unknown,
}

impl Classification {
    pub fn is_managed(&self) -> bool {
        matches!(self, Classification::Managed { .. })
    }

    pub fn env_name(&self) -> Option<&'static str> {
        match self {
            Classification::Managed { env_name, .. } => *env_name,
            Classification::Unknown => None,
        }
    }

    /// Grupos a los que pertenece el host, en el orden en que se asignan.
    pub fn groups(&self) -> Vec<&'static str> {
        match self {
            Classification::Managed { groups, .. } => groups.clone(),
            Classification::Unknown => vec![UNKNOWN_GROUP],
        }
    }
}

/// Predicado "entorno gestionado". Una región ausente nunca contiene nada.
pub fn is_managed(host: &HostRecord) -> bool {
    let region_match = host.app_region
                           .as_deref()
                           .is_some_and(|region| MANAGED_REGION_TOKENS.iter().any(|t| region.contains(t)));
    region_match || host.object_name.contains(MANAGED_HOSTNAME_TOKEN)
}

fn match_env(hostname: &str) -> Option<&'static EnvRule> {
    ENV_RULES.iter().find(|rule| hostname.contains(rule.token))
}

fn match_role(hostname: &str) -> Option<&'static RoleRule> {
    ROLE_RULES.iter()
              .find(|rule| rule.tokens.iter().any(|t| hostname.contains(t)))
}

/// Clasifica un host. Los roles sólo se evalúan dentro de un entorno
/// reconocido: un host UNKNOWN nunca recibe WEB/APP.
pub fn classify(host: &HostRecord) -> Classification {
    if !is_managed(host) {
        return Classification::Unknown;
    }
    let hostname = host.object_name.as_str();
    let Some(env) = match_env(hostname) else {
        return Classification::Managed { env_name: None, groups: Vec::new() };
    };
    let mut groups = vec![env.group];
    if let Some(role) = match_role(hostname) {
        groups.extend_from_slice(role.groups);
    }
    Classification::Managed { env_name: Some(env.env_name), groups }
}
