use serde::de::DeserializeOwned;

/// Deserialize a manifest with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(describe)
}

/// Same for an already-parsed node, e.g. one class entry of a manifest.
pub fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, String> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(describe)
}

fn describe<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> String {
    let path = err.path().to_string();
    format!("at JSON path {path} → {}", err.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Entry {
        #[allow(dead_code)]
        name: String,
    }

    #[test]
    fn errors_name_the_offending_path() {
        let err = from_str_with_path::<Vec<Entry>>(r#"[{"name": "a"}, {"name": 3}]"#).unwrap_err();
        assert!(err.starts_with("at JSON path [1].name"), "{err}");

        let err = from_value_with_path::<Entry>(serde_json::json!({})).unwrap_err();
        assert!(err.contains("name"), "{err}");
    }
}
