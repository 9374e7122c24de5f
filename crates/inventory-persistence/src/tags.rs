//! Normalización del payload de tags.
//!
//! La columna de tags llega como JSON ya parseado o como texto JSON
//! serializado (según cómo el origen guardó el objeto). Ambas formas deben
//! ser un mapa; la lista de entradas `{"tag": "..."}` vive bajo la clave
//! `$values`.

use serde_json::Value;

use crate::PersistenceError;

/// Clave del arreglo envuelto.
pub const VALUES_KEY: &str = "$values";
/// Clave del valor dentro de cada entrada de tag.
pub const TAG_KEY: &str = "tag";

/// Reduce el payload a la lista de entradas de tag.
///
/// - ausente / `null` / texto vacío / objeto vacío → lista vacía
/// - objeto → su arreglo `$values` (vacío si no existe)
/// - texto → se parsea como JSON; el resultado debe ser un objeto
/// - texto inválido, arreglo suelto o cualquier otro tipo → `MalformedTags`
pub fn normalize_tags(payload: Option<&Value>) -> Result<Vec<Value>, PersistenceError> {
    match payload {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(Vec::new()),
        Some(Value::String(raw)) => {
            let parsed: Value = serde_json::from_str(raw)?;
            match parsed {
                Value::Object(_) => normalize_tags(Some(&parsed)),
                _ => Err(PersistenceError::MalformedTags(format!("serialized tags are not a map: {raw}"))),
            }
        }
        Some(Value::Object(map)) => match map.get(VALUES_KEY) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(other) => Err(PersistenceError::MalformedTags(format!("{VALUES_KEY} is not an array: {other}"))),
        },
        Some(other) => Err(PersistenceError::MalformedTags(format!("unexpected tags type: {other}"))),
    }
}

/// Primer valor de tag que comienza con `prefix`. Entradas que no son objeto
/// o cuyo `tag` no es texto se ignoran.
pub fn extract_app_region(tags: &[Value], prefix: &str) -> Option<String> {
    tags.iter()
        .filter_map(|entry| entry.get(TAG_KEY).and_then(Value::as_str))
        .find(|value| value.starts_with(prefix))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_payload_with_values_wrapper() {
        let payload = json!({"$values": [{"tag": "OWNER-X"}, {"tag": "TEAMNAME-DEV"}]});
        let tags = normalize_tags(Some(&payload)).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(extract_app_region(&tags, "TEAMNAME-").as_deref(), Some("TEAMNAME-DEV"));
    }

    #[test]
    fn serialized_text_payload_is_parsed() {
        let payload = Value::String(r#"{"$values":[{"tag":"TEAMNAME-TEST1"}]}"#.to_string());
        let tags = normalize_tags(Some(&payload)).unwrap();
        assert_eq!(extract_app_region(&tags, "TEAMNAME-").as_deref(), Some("TEAMNAME-TEST1"));
    }

    #[test]
    fn missing_or_empty_payload_yields_no_tags() {
        assert!(normalize_tags(None).unwrap().is_empty());
        assert!(normalize_tags(Some(&Value::Null)).unwrap().is_empty());
        assert!(normalize_tags(Some(&json!(""))).unwrap().is_empty());
        assert!(normalize_tags(Some(&json!({}))).unwrap().is_empty());
    }

    #[test]
    fn invalid_text_is_malformed() {
        let err = normalize_tags(Some(&json!("{not json"))).unwrap_err();
        assert!(matches!(err, PersistenceError::MalformedTags(_)));
    }

    #[test]
    fn non_text_non_map_payload_is_malformed() {
        assert!(matches!(normalize_tags(Some(&json!(42))), Err(PersistenceError::MalformedTags(_))));
        assert!(matches!(normalize_tags(Some(&json!(true))), Err(PersistenceError::MalformedTags(_))));
        assert!(matches!(normalize_tags(Some(&json!({"$values": "x"}))), Err(PersistenceError::MalformedTags(_))));
    }

    #[test]
    fn bare_array_is_malformed() {
        let payload = json!([{"tag": "TEAMNAME-DEV"}]);
        assert!(matches!(normalize_tags(Some(&payload)), Err(PersistenceError::MalformedTags(_))));
        let text = json!(r#"[{"tag":"TEAMNAME-DEV"}]"#);
        assert!(matches!(normalize_tags(Some(&text)), Err(PersistenceError::MalformedTags(_))));
        assert!(matches!(normalize_tags(Some(&json!("\"TEAMNAME-DEV\""))), Err(PersistenceError::MalformedTags(_))));
    }

    #[test]
    fn first_matching_prefix_wins() {
        let tags = vec![json!({"tag": "TEAMNAME-TEST2"}), json!({"tag": "TEAMNAME-DEV"})];
        assert_eq!(extract_app_region(&tags, "TEAMNAME-").as_deref(), Some("TEAMNAME-TEST2"));
    }

    #[test]
    fn odd_entries_are_ignored() {
        let tags = vec![json!("TEAMNAME-DEV"), json!({"tag": 7}), json!({"name": "TEAMNAME-DEV"})];
        assert_eq!(extract_app_region(&tags, "TEAMNAME-"), None);
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        let tags = vec![json!({"tag": "teamname-dev"})];
        assert_eq!(extract_app_region(&tags, "TEAMNAME-"), None);
    }
}
