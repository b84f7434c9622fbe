// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Candidate lists for the settings pickers.
//!
//! Every list is `(default)` first and `Custom…` last, with field-specific
//! entries in between.  Values are unique within a list: the first entry for a
//! value wins.

use serde::Serialize;
use tandem_config::OptionHints;

use super::PickerField;

/// Value of the entry that opens free-text editing instead of setting a value.
pub const CUSTOM_VALUE: &str = "__custom__";
pub const CUSTOM_LABEL: &str = "Custom…";

pub const REASONING_EFFORTS: [&str; 4] = ["low", "medium", "high", "xhigh"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerOption {
    /// Written into the draft when chosen.  Empty means "default".
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PickerOption {
    fn new(value: impl Into<String>, label: impl Into<String>, description: Option<String>) -> Self {
        Self { value: value.into(), label: label.into(), description }
    }

    pub fn is_custom(&self) -> bool {
        self.value == CUSTOM_VALUE
    }
}

#[derive(Default)]
struct OptionList(Vec<PickerOption>);

impl OptionList {
    fn push(&mut self, option: PickerOption) {
        if !self.contains(&option.value) {
            self.0.push(option);
        }
    }

    fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|o| o.value == value)
    }

    /// Add the draft's value as "(current)" unless blank or already listed.
    fn push_current(&mut self, current: &str) {
        let current = current.trim();
        if !current.is_empty() {
            self.push(PickerOption::new(current, format!("{current} (current)"), None));
        }
    }
}

/// Build the candidate list for `field` given the hints and the draft value.
pub fn build_options(field: PickerField, hints: &OptionHints, current: &str) -> Vec<PickerOption> {
    let mut list = OptionList::default();

    match field {
        PickerField::Model => {
            list.push(default_entry(hints.default_model.as_deref()));
            if let Some(m) = &hints.migrated_model {
                list.push(PickerOption::new(m, m, Some("Suggested upgrade".into())));
            }
            if let Some(m) = &hints.default_model {
                list.push(PickerOption::new(m, m, Some("Configured model".into())));
            }
        }
        PickerField::ReasoningEffort => {
            list.push(default_entry(hints.default_reasoning_effort.as_deref()));
            for effort in REASONING_EFFORTS {
                list.push(PickerOption::new(effort, effort, None));
            }
            if let Some(e) = &hints.default_reasoning_effort {
                list.push(PickerOption::new(e, format!("{e} (default)"), None));
            }
        }
        PickerField::Profile => {
            list.push(default_entry(None));
            for p in &hints.profiles {
                list.push(PickerOption::new(p, p, None));
            }
        }
    }

    list.push_current(current);
    list.push(PickerOption::new(CUSTOM_VALUE, CUSTOM_LABEL, Some("Type a value".into())));
    list.0
}

fn default_entry(external: Option<&str>) -> PickerOption {
    let description = match external {
        Some(v) => format!("Use the agent default ({v})"),
        None => "Use the agent default".to_string(),
    };
    PickerOption::new("", "(default)", Some(description))
}

/// Index of the entry whose value matches the draft, else 0.
pub fn initial_selection(options: &[PickerOption], current: &str) -> usize {
    let current = current.trim();
    options.iter().position(|o| o.value == current).unwrap_or(0)
}

// ─── Unit tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(opts: &[PickerOption]) -> Vec<&str> {
        opts.iter().map(|o| o.label.as_str()).collect()
    }

    fn hints() -> OptionHints {
        OptionHints {
            default_model: Some("gpt".into()),
            migrated_model: Some("gpt2".into()),
            ..OptionHints::default()
        }
    }

    #[test]
    fn model_list_orders_migration_before_default() {
        let opts = build_options(PickerField::Model, &hints(), "");
        assert_eq!(labels(&opts), ["(default)", "gpt2", "gpt", "Custom…"]);
        assert!(opts[3].is_custom());
        assert_eq!(opts[0].value, "");
        assert_eq!(opts[0].description.as_deref(), Some("Use the agent default (gpt)"));
    }

    #[test]
    fn current_model_is_appended_once() {
        let opts = build_options(PickerField::Model, &hints(), "o3");
        assert_eq!(labels(&opts), ["(default)", "gpt2", "gpt", "o3 (current)", "Custom…"]);

        let opts = build_options(PickerField::Model, &hints(), "gpt");
        assert_eq!(labels(&opts), ["(default)", "gpt2", "gpt", "Custom…"]);
    }

    #[test]
    fn migration_equal_to_default_is_not_duplicated() {
        let h = OptionHints {
            default_model: Some("gpt".into()),
            migrated_model: Some("gpt".into()),
            ..OptionHints::default()
        };
        let opts = build_options(PickerField::Model, &h, "");
        assert_eq!(labels(&opts), ["(default)", "gpt", "Custom…"]);
    }

    #[test]
    fn effort_list_has_fixed_levels() {
        let opts = build_options(PickerField::ReasoningEffort, &OptionHints::default(), "");
        assert_eq!(labels(&opts), ["(default)", "low", "medium", "high", "xhigh", "Custom…"]);
    }

    #[test]
    fn unknown_external_effort_is_labelled_default() {
        let h = OptionHints { default_reasoning_effort: Some("minimal".into()), ..OptionHints::default() };
        let opts = build_options(PickerField::ReasoningEffort, &h, "turbo");
        assert_eq!(
            labels(&opts),
            ["(default)", "low", "medium", "high", "xhigh", "minimal (default)", "turbo (current)", "Custom…"]
        );

        let h = OptionHints { default_reasoning_effort: Some("high".into()), ..OptionHints::default() };
        let opts = build_options(PickerField::ReasoningEffort, &h, "high");
        assert_eq!(labels(&opts), ["(default)", "low", "medium", "high", "xhigh", "Custom…"]);
    }

    #[test]
    fn profiles_keep_hint_order() {
        let h = OptionHints { profiles: vec!["work".into(), "fast".into()], ..OptionHints::default() };
        let opts = build_options(PickerField::Profile, &h, "");
        assert_eq!(labels(&opts), ["(default)", "work", "fast", "Custom…"]);
        assert_eq!(opts[0].description.as_deref(), Some("Use the agent default"));
    }

    #[test]
    fn values_are_unique() {
        let h = OptionHints { profiles: vec!["a".into(), "a".into(), "b".into()], ..OptionHints::default() };
        let opts = build_options(PickerField::Profile, &h, "b");
        let mut values: Vec<&str> = opts.iter().map(|o| o.value.as_str()).collect();
        let n = values.len();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), n);
    }

    #[test]
    fn initial_selection_matches_draft() {
        let opts = build_options(PickerField::Model, &hints(), "gpt");
        assert_eq!(initial_selection(&opts, "gpt"), 2);
        assert_eq!(initial_selection(&opts, ""), 0);
        assert_eq!(initial_selection(&opts, "nope"), 0);
    }
}
