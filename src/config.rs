// src/config.rs
//
// Site constants, scrape tuning and the requirements-sheet config file.

use std::error::Error;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::model::RequirementRule;

// Site
pub const BASE_URL: &str = "https://www.realmeye.com";
pub const USER_AGENT: &str = "realm-requirements-sheet-bot/0.2";

// Wiki paths
pub const CLASSES_PATH: &str = "/wiki/classes";
pub const ITEMS_PATH: &str = "/wiki/equipment";

/// Item category pages and the `item_type` marker each one implies.
pub const CATEGORY_PATHS: &[(&str, &str)] = &[
    ("/wiki/weapons", "Weapon"),
    ("/wiki/ability-items", "Ability"),
    ("/wiki/armor", "Armor"),
    ("/wiki/rings", "Ring"),
];

/// Category whose untiered "family" rows expand into per-tier records.
pub const RING_CATEGORY: &str = "Ring";

// Net
pub const TIMEOUT_S: u64 = 30;
pub const RETRIES: u32 = 3;
pub const BACKOFF_MS: u64 = 1_500;
pub const POLITE_DELAY_MS: u64 = 500; // be polite
pub const PROXY_BYPASS_VAR: &str = "REALMEYE_DISABLE_PROXY";

// Local layout
pub const RAW_DIR: &str = "data/raw";
pub const NORMALIZED_DIR: &str = "data/normalized";
pub const ASSETS_DIR: &str = "assets";
pub const CONFIG_PATH: &str = "config/requirements-sheet.json";

/// Check the raw config shape, collecting every problem instead of stopping
/// at the first one.
pub fn validate_requirements_config(config: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(rules) = config.get("requirements").and_then(Value::as_array) else {
        errors.push(s!("config.requirements must be a list"));
        return errors;
    };

    for (index, rule) in rules.iter().enumerate() {
        let Some(rule) = rule.as_object() else {
            errors.push(format!("requirements[{index}] must be an object"));
            continue;
        };
        for key in ["id", "label"] {
            let ok = rule
                .get(key)
                .and_then(Value::as_str)
                .is_some_and(|v| !v.trim().is_empty());
            if !ok {
                errors.push(format!("requirements[{index}].{key} must be a non-empty string"));
            }
        }
        for key in ["required_items", "required_classes"] {
            if let Some(v) = rule.get(key) {
                if !v.is_array() {
                    errors.push(format!("requirements[{index}].{key} must be a list when provided"));
                }
            }
        }
    }
    errors
}

/// Load and validate the requirement rules from the config file.
pub fn load_requirements(path: &Path) -> Result<Vec<RequirementRule>, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    let config: Value = serde_json::from_str(&text)?;

    let errors = validate_requirements_config(&config);
    if !errors.is_empty() {
        return Err(format!("Invalid config:\n - {}", errors.join("\n - ")).into());
    }

    let rules = serde_json::from_value(config["requirements"].clone())?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_without_requirements_list_fails_fast() {
        let errors = validate_requirements_config(&json!({ "requirements": "nope" }));
        assert_eq!(errors, vec!["config.requirements must be a list"]);
    }

    #[test]
    fn config_errors_are_collected_not_short_circuited() {
        let config = json!({
            "requirements": [
                { "id": "", "label": "Ok label" },
                "not-an-object",
                { "id": "r2", "label": "Fine", "required_items": {} },
            ]
        });
        let errors = validate_requirements_config(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("requirements[0].id"));
        assert!(errors[1].contains("requirements[1] must be an object"));
        assert!(errors[2].contains("requirements[2].required_items"));
    }

    #[test]
    fn valid_config_passes() {
        let config = json!({
            "requirements": [
                { "id": "r1", "label": "Starter", "required_classes": ["class-knight"] }
            ]
        });
        assert!(validate_requirements_config(&config).is_empty());
    }
}
