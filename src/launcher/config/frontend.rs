use serde::de::DeserializeOwned;
use tracing::warn;

use super::Document;

pub const DEFAULT_TITLE: &str = "nvim-ui";

/// Settings read by the built-in front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendSettings {
    pub title: String,
    pub log_chunks: bool,
}

impl Default for FrontendSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            log_chunks: false,
        }
    }
}

/// Pick the front-end keys out of the document.
///
/// Keys with the wrong type fall back to their defaults; other front-ends may
/// interpret the same document differently.
pub fn parse_frontend_section(document: &Document) -> FrontendSettings {
    FrontendSettings {
        title: read_key::<String>(document, "title")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        log_chunks: read_key::<bool>(document, "log_chunks").unwrap_or(false),
    }
}

fn read_key<T: DeserializeOwned>(document: &Document, key: &'static str) -> Option<T> {
    let value = document.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(
                target: "nvim_ui::config",
                key,
                reason = %err,
                "Ignoring configuration key with unexpected type"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(value: serde_json::Value) -> Document {
        value.as_object().cloned().expect("fixture is an object")
    }

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(
            parse_frontend_section(&Document::new()),
            FrontendSettings::default()
        );
    }

    #[test]
    fn known_keys_are_read() {
        let settings =
            parse_frontend_section(&document(json!({ "title": "work", "log_chunks": true })));
        assert_eq!(settings.title, "work");
        assert!(settings.log_chunks);
    }

    #[test]
    fn mistyped_keys_fall_back() {
        let settings =
            parse_frontend_section(&document(json!({ "title": 7, "log_chunks": "yes" })));
        assert_eq!(settings, FrontendSettings::default());
    }
}
