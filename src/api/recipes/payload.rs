//! Input normalization and validation for recipe payloads.
//!
//! The same endpoints serve structured JSON bodies and multipart form
//! submissions. Forms flatten arrays to strings (and clients may pre-serialize
//! them as JSON to preserve embedded commas), so `ingredients` can arrive as a
//! native array, a JSON-encoded array string, or a plain comma-separated
//! string. All shapes converge on one canonical payload here; the ambiguity
//! never leaks past this module.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const TITLE_MIN_CHARS: usize = 2;
pub const TITLE_MAX_CHARS: usize = 120;
pub const INGREDIENTS_MAX: usize = 50;
pub const INSTRUCTIONS_MAX_CHARS: usize = 2000;

/// Wire-level recipe fields, held as raw JSON values until validated.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct RawRecipePayload {
    /// Recipe title, 2-120 characters
    #[schema(value_type = Option<String>)]
    pub title: Option<Value>,
    /// Ingredient list: array of strings, JSON-encoded array string, or
    /// comma-separated string
    #[schema(value_type = Option<Object>)]
    pub ingredients: Option<Value>,
    /// Free-text instructions, up to 2000 characters
    #[schema(value_type = Option<String>)]
    pub instructions: Option<Value>,
}

/// Canonical payload produced by a successful validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipePayload {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
}

/// Field name to list of violation messages.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

/// Canonicalize the `ingredients` field into an ordered list of trimmed,
/// non-empty strings. A string value is first tried as a JSON array; if that
/// fails it is split on commas. Any other shape normalizes to an empty list,
/// which validation then rejects.
pub fn normalize_ingredients(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(Value::String(text)) => {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
                items.iter().filter_map(scalar_to_string).collect()
            } else {
                text.split(',')
                    .map(str::trim)
                    .filter(|piece| !piece.is_empty())
                    .map(str::to_string)
                    .collect()
            }
        }
        _ => Vec::new(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Validate a raw payload, collecting every violation per field rather than
/// stopping at the first. On success no further trimming is needed anywhere
/// downstream.
pub fn validate(raw: &RawRecipePayload) -> Result<RecipePayload, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = match raw.title.as_ref() {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            let length = trimmed.chars().count();
            if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&length) {
                errors.entry("title").or_default().push(format!(
                    "title must be between {TITLE_MIN_CHARS} and {TITLE_MAX_CHARS} characters"
                ));
            }
            trimmed.to_string()
        }
        Some(_) => {
            errors
                .entry("title")
                .or_default()
                .push("title must be a string".to_string());
            String::new()
        }
        None => {
            errors
                .entry("title")
                .or_default()
                .push("title is required".to_string());
            String::new()
        }
    };

    let ingredients = normalize_ingredients(raw.ingredients.as_ref());
    if ingredients.is_empty() {
        errors
            .entry("ingredients")
            .or_default()
            .push("ingredients must contain at least 1 item".to_string());
    } else if ingredients.len() > INGREDIENTS_MAX {
        errors
            .entry("ingredients")
            .or_default()
            .push(format!("ingredients must contain at most {INGREDIENTS_MAX} items"));
    }

    let instructions = match raw.instructions.as_ref() {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.chars().count() > INSTRUCTIONS_MAX_CHARS {
                errors.entry("instructions").or_default().push(format!(
                    "instructions must be at most {INSTRUCTIONS_MAX_CHARS} characters"
                ));
            }
            trimmed.to_string()
        }
        None | Some(Value::Null) => String::new(),
        Some(_) => {
            errors
                .entry("instructions")
                .or_default()
                .push("instructions must be a string".to_string());
            String::new()
        }
    };

    if errors.is_empty() {
        Ok(RecipePayload {
            title,
            ingredients,
            instructions,
        })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(title: Value, ingredients: Value, instructions: Value) -> RawRecipePayload {
        RawRecipePayload {
            title: Some(title),
            ingredients: Some(ingredients),
            instructions: Some(instructions),
        }
    }

    #[test]
    fn test_normalize_native_array() {
        let value = json!(["  egg ", "flour", ""]);
        assert_eq!(normalize_ingredients(Some(&value)), vec!["egg", "flour"]);
    }

    #[test]
    fn test_normalize_json_encoded_string() {
        let value = json!("[\"egg\",\"flour\"]");
        assert_eq!(normalize_ingredients(Some(&value)), vec!["egg", "flour"]);
    }

    #[test]
    fn test_normalize_comma_separated_string() {
        let value = json!(" egg , flour ,, ");
        assert_eq!(normalize_ingredients(Some(&value)), vec!["egg", "flour"]);
    }

    #[test]
    fn test_json_encoding_preserves_embedded_commas() {
        let value = json!("[\"salt, coarse\",\"pepper\"]");
        assert_eq!(
            normalize_ingredients(Some(&value)),
            vec!["salt, coarse", "pepper"]
        );
    }

    #[test]
    fn test_normalize_equivalence_between_shapes() {
        let native = json!(["egg", "flour"]);
        let encoded = json!("[\"egg\",\"flour\"]");
        let joined = json!("egg,flour");
        assert_eq!(
            normalize_ingredients(Some(&native)),
            normalize_ingredients(Some(&encoded))
        );
        assert_eq!(
            normalize_ingredients(Some(&native)),
            normalize_ingredients(Some(&joined))
        );
    }

    #[test]
    fn test_normalize_array_with_mixed_scalars() {
        let value = json!(["egg", 3, true, {"nested": 1}, null]);
        assert_eq!(
            normalize_ingredients(Some(&value)),
            vec!["egg", "3", "true"]
        );
    }

    #[test]
    fn test_normalize_non_sequence_json_string_falls_back_to_split() {
        // Parses as JSON but not as an array, so the comma fallback applies
        let value = json!("{\"egg\": 1}");
        assert_eq!(
            normalize_ingredients(Some(&value)),
            vec!["{\"egg\": 1}".to_string()]
        );
    }

    #[test]
    fn test_normalize_other_types_yield_empty() {
        assert!(normalize_ingredients(Some(&json!(42))).is_empty());
        assert!(normalize_ingredients(Some(&json!({"a": 1}))).is_empty());
        assert!(normalize_ingredients(Some(&json!(null))).is_empty());
        assert!(normalize_ingredients(None).is_empty());
    }

    #[test]
    fn test_validate_happy_path() {
        let payload = validate(&raw(
            json!("  Carbonara "),
            json!(["spaghetti", "egg", "pecorino"]),
            json!(" Boil pasta... "),
        ))
        .unwrap();
        assert_eq!(payload.title, "Carbonara");
        assert_eq!(payload.ingredients, vec!["spaghetti", "egg", "pecorino"]);
        assert_eq!(payload.instructions, "Boil pasta...");
    }

    #[test]
    fn test_validate_instructions_optional() {
        let payload = validate(&RawRecipePayload {
            title: Some(json!("Carbonara")),
            ingredients: Some(json!(["egg"])),
            instructions: None,
        })
        .unwrap();
        assert_eq!(payload.instructions, "");
    }

    #[test]
    fn test_title_bounds() {
        let ok = |title: String| {
            validate(&raw(json!(title), json!(["egg"]), json!(""))).is_ok()
        };
        assert!(!ok("x".to_string()));
        assert!(ok("xy".to_string()));
        assert!(ok("x".repeat(120)));
        assert!(!ok("x".repeat(121)));
    }

    #[test]
    fn test_title_length_counts_chars_after_trim() {
        // 121 chars with surrounding whitespace trims down to the limit
        let title = format!("  {}  ", "è".repeat(120));
        assert!(validate(&raw(json!(title), json!(["egg"]), json!(""))).is_ok());
    }

    #[test]
    fn test_ingredients_bounds() {
        let ok = |count: usize| {
            let items: Vec<String> = (0..count).map(|i| format!("item{i}")).collect();
            validate(&raw(json!("Pasta"), json!(items), json!(""))).is_ok()
        };
        assert!(!ok(0));
        assert!(ok(1));
        assert!(ok(50));
        assert!(!ok(51));
    }

    #[test]
    fn test_instructions_bounds() {
        let ok = |len: usize| {
            validate(&raw(json!("Pasta"), json!(["egg"]), json!("x".repeat(len)))).is_ok()
        };
        assert!(ok(0));
        assert!(ok(2000));
        assert!(!ok(2001));
    }

    #[test]
    fn test_whitespace_only_ingredients_rejected() {
        let errors = validate(&raw(json!("Pasta"), json!(["  ", ""]), json!(""))).unwrap_err();
        assert!(errors.contains_key("ingredients"));
    }

    #[test]
    fn test_missing_title_reported() {
        let errors = validate(&RawRecipePayload {
            title: None,
            ingredients: Some(json!(["egg"])),
            instructions: None,
        })
        .unwrap_err();
        assert_eq!(errors["title"], vec!["title is required"]);
    }

    #[test]
    fn test_non_string_title_reported() {
        let errors = validate(&raw(json!(42), json!(["egg"]), json!(""))).unwrap_err();
        assert_eq!(errors["title"], vec!["title must be a string"]);
    }

    #[test]
    fn test_all_violations_collected() {
        let errors = validate(&raw(json!("x"), json!([]), json!(42))).unwrap_err();
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("ingredients"));
        assert!(errors.contains_key("instructions"));
    }

    #[test]
    fn test_unicode_passes_through_unmodified() {
        let payload = validate(&raw(
            json!("Tiramisù"),
            json!(["300 g di savoiardi", "Cacao amaro q.b."]),
            json!("Monta i tuorli con lo zucchero…"),
        ))
        .unwrap();
        assert_eq!(payload.title, "Tiramisù");
        assert_eq!(payload.instructions, "Monta i tuorli con lo zucchero…");
    }
}
