// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Picker hints read from the agent's own TOML config.
//!
//! Only a handful of keys matter:
//!
//! ```toml
//! model = "gpt-5"
//! model_reasoning_effort = "medium"
//!
//! [profiles.fast]
//! model = "gpt-5-mini"
//!
//! [notice.model_migrations]
//! "gpt-5" = "gpt-5.1"
//! ```
//!
//! Anything missing or malformed simply yields an absent hint.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

/// Read-only hints used to build the settings picker lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptionHints {
    pub default_model: Option<String>,
    /// Replacement suggested for `default_model` by the agent's migration notice.
    pub migrated_model: Option<String>,
    pub default_reasoning_effort: Option<String>,
    /// Profile names in the order they appear in the file.
    pub profiles: Vec<String>,
}

impl OptionHints {
    /// Extract hints from TOML text.  Parse failures produce empty hints.
    pub fn from_toml_str(text: &str) -> Self {
        let root: toml::Table = match toml::from_str(text) {
            Ok(t) => t,
            Err(e) => {
                warn!("agent config is not valid TOML, ignoring hints: {e}");
                return Self::default();
            }
        };

        let default_model = non_blank(root.get("model"));
        let default_reasoning_effort = non_blank(root.get("model_reasoning_effort"));

        let profiles = root
            .get("profiles")
            .and_then(toml::Value::as_table)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();

        let migrated_model = default_model.as_deref().and_then(|current| {
            let migrations = root
                .get("notice")
                .and_then(|n| n.get("model_migrations"))
                .and_then(toml::Value::as_table)?;
            non_blank(migrations.get(current))
        });

        Self { default_model, migrated_model, default_reasoning_effort, profiles }
    }
}

/// Load hints from `path`.  A missing or unreadable file yields empty hints.
pub fn load_hints(path: &Path) -> OptionHints {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            debug!(path = %path.display(), "loading option hints");
            OptionHints::from_toml_str(&text)
        }
        Err(e) => {
            debug!(path = %path.display(), "no option hints: {e}");
            OptionHints::default()
        }
    }
}

fn non_blank(v: Option<&toml::Value>) -> Option<String> {
    v.and_then(toml::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_model_effort_and_profiles_in_file_order() {
        let h = OptionHints::from_toml_str(
            r#"
model = "gpt-5"
model_reasoning_effort = "high"

[profiles.zeta]
model = "a"

[profiles.alpha]
model = "b"
"#,
        );
        assert_eq!(h.default_model.as_deref(), Some("gpt-5"));
        assert_eq!(h.default_reasoning_effort.as_deref(), Some("high"));
        assert_eq!(h.profiles, vec!["zeta".to_string(), "alpha".to_string()]);
        assert!(h.migrated_model.is_none());
    }

    #[test]
    fn migration_only_applies_to_the_default_model() {
        let h = OptionHints::from_toml_str(
            r#"
model = "gpt-5"

[notice.model_migrations]
"gpt-4" = "gpt-4.1"
"gpt-5" = "gpt-5.1"
"#,
        );
        assert_eq!(h.migrated_model.as_deref(), Some("gpt-5.1"));

        let h = OptionHints::from_toml_str(
            r#"
[notice.model_migrations]
"gpt-5" = "gpt-5.1"
"#,
        );
        assert!(h.migrated_model.is_none(), "no default model, nothing to migrate");
    }

    #[test]
    fn blank_values_are_absent() {
        let h = OptionHints::from_toml_str("model = \"   \"\n");
        assert!(h.default_model.is_none());
    }

    #[test]
    fn invalid_toml_yields_empty_hints() {
        assert_eq!(OptionHints::from_toml_str("model = = ="), OptionHints::default());
    }

    #[test]
    fn missing_file_yields_empty_hints() {
        let h = load_hints(Path::new("/tmp/tandem_no_such_agent_config.toml"));
        assert_eq!(h, OptionHints::default());
    }

    #[test]
    fn load_hints_from_disk() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "model = \"o3\"\n[profiles.work]\nmodel = \"o4\"").unwrap();
        let h = load_hints(f.path());
        assert_eq!(h.default_model.as_deref(), Some("o3"));
        assert_eq!(h.profiles, vec!["work".to_string()]);
    }
}
