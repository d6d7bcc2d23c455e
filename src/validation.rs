//! Schema validation helpers.
//!
//! This module validates a configuration `serde_json::Value` against a [`Schema`]
//! before it is planned: presence of required attributes, attribute types, nested
//! block cardinality, value validators and deprecation warnings.
//!
//! # Example
//!
//! ```
//! use checkly_provider::schema::{Attribute, Schema, Validator};
//! use checkly_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "frequency",
//!         Attribute::required_int64().with_validator(Validator::one_of_int([1, 5, 10])),
//!     );
//!
//! let diagnostics = validate(&schema, &json!({"name": "api", "frequency": 5}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "api", "frequency": 7}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("frequency".to_string()));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, NestedBlock,
    Schema, Validator,
};
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed attributes are skipped (provider sets these)
/// - Attributes not declared in the schema are rejected
/// - Attribute types must match the schema
/// - Validators are checked on present values
/// - Deprecated attributes that are set produce warnings
/// - Nested blocks are validated recursively with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => {
            // Null is valid for optional blocks, but we can't validate further
            return;
        },
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value)))
                    .with_attribute_if_not_empty(path),
            );
            return;
        },
    };

    for key in obj.keys() {
        if !block.attributes.contains_key(key) && !block.blocks.contains_key(key) {
            let key_path = join_path(path, key);
            diagnostics.push(
                Diagnostic::error(format!("Unsupported argument '{}'", key_path))
                    .with_detail("An argument with this name is not expected here")
                    .with_attribute(key_path),
            );
        }
    }

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        let attr_value = obj.get(name);
        validate_attribute(attr, attr_value, &attr_path, diagnostics);
    }

    for (name, nested_block) in &block.blocks {
        let block_path = join_path(path, name);
        let block_value = obj.get(name);
        validate_nested_block(nested_block, block_value, &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Computed-only attributes are set by the provider
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            if diagnostics.len() == before {
                if let Some(validator) = &attr.validator {
                    validate_value(validator, &attr.attr_type, v, path, diagnostics);
                }
            }
            if let Some(message) = &attr.deprecated {
                diagnostics.push(
                    Diagnostic::warning(format!("Attribute '{}' is deprecated", path))
                        .with_detail(message.clone())
                        .with_attribute(path),
                );
            }
        },
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::Set(element_type) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, item, &item_path, diagnostics);
                }
            },
            None => diagnostics.push(type_error(path, "set", value)),
        },
        AttributeType::Map(element_type) => match value.as_object() {
            Some(entries) => {
                for (key, item) in entries {
                    let item_path = format!("{}.{}", path, key);
                    validate_attribute_type(element_type, item, &item_path, diagnostics);
                }
            },
            None => diagnostics.push(type_error(path, "map", value)),
        },
    }
}

/// Apply a validator to a type-checked value. Collections are validated
/// element by element.
fn validate_value(
    validator: &Validator,
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (attr_type, value) {
        (AttributeType::Set(inner), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_value(validator, inner, item, &item_path, diagnostics);
            }
            return;
        },
        (AttributeType::Map(inner), Value::Object(entries)) => {
            for (key, item) in entries {
                let item_path = format!("{}.{}", path, key);
                validate_value(validator, inner, item, &item_path, diagnostics);
            }
            return;
        },
        _ => {},
    }

    let problem = match validator {
        Validator::OneOf { values } => match value.as_str() {
            Some(s) if values.iter().any(|v| v == s) => None,
            _ => Some(format!(
                "expected one of [{}], got {}",
                values.join(", "),
                value
            )),
        },
        Validator::OneOfInt { values } => match as_int(value) {
            Some(i) if values.contains(&i) => None,
            _ => Some(format!(
                "expected one of [{}], got {}",
                values
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                value
            )),
        },
        Validator::IntRange { min, max } => match as_int(value) {
            Some(i) if (*min..=*max).contains(&i) => None,
            _ => Some(format!(
                "expected a value between {} and {}, got {}",
                min, max, value
            )),
        },
        Validator::StringLength { min, max } => match value.as_str() {
            Some(s) if (*min..=*max).contains(&s.chars().count()) => None,
            _ => Some(format!(
                "expected length between {} and {}, got {}",
                min, max, value
            )),
        },
        Validator::Url => match value.as_str() {
            Some(s) if is_http_url(s) => None,
            _ => Some(format!("expected an http(s) URL, got {}", value)),
        },
    };

    if let Some(detail) = problem {
        diagnostics.push(
            Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                .with_detail(detail)
                .with_attribute(path),
        );
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        if nested.min_items > 0 {
            diagnostics.push(
                Diagnostic::error(format!("Missing required block '{}'", path))
                    .with_detail(format!("At least {} block(s) required", nested.min_items))
                    .with_attribute(path),
            );
        }
        return;
    };

    match (nested.nesting_mode, value) {
        (BlockNestingMode::Single, item) => validate_block(&nested.block, item, path, diagnostics),
        (BlockNestingMode::List | BlockNestingMode::Set, Value::Array(items)) => {
            check_item_count(nested, items.len(), path, diagnostics);
            for (i, item) in items.iter().enumerate() {
                validate_block(&nested.block, item, &format!("{}.{}", path, i), diagnostics);
            }
        },
        (BlockNestingMode::Map, Value::Object(items)) => {
            check_item_count(nested, items.len(), path, diagnostics);
            for (key, item) in items {
                validate_block(&nested.block, item, &format!("{}.{}", path, key), diagnostics);
            }
        },
        (mode, other) => {
            let expected = if mode == BlockNestingMode::Map { "map" } else { "list" };
            diagnostics.push(
                Diagnostic::error(format!("Expected {} for block '{}'", expected, path))
                    .with_detail(format!("Got {}", value_type_name(other)))
                    .with_attribute(path),
            );
        },
    }
}

/// `max_items == 0` leaves the count unbounded.
fn check_item_count(nested: &NestedBlock, len: usize, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let len = len as u32;
    let problem = if len < nested.min_items {
        Some(format!("requires at least {} item(s), got {}", nested.min_items, len))
    } else if nested.max_items > 0 && len > nested.max_items {
        Some(format!("allows at most {} item(s), got {}", nested.max_items, len))
    } else {
        None
    };
    if let Some(problem) = problem {
        diagnostics.push(
            Diagnostic::error(format!("Block '{}' {}", path, problem)).with_attribute(path),
        );
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    as_int(value).is_some()
}

fn as_int(value: &Value) -> Option<i64> {
    let n = value.as_number()?;
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn is_http_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        )),
        attribute: Some(path.to_string()),
    }
}

trait DiagnosticExt {
    fn with_attribute_if_not_empty(self, path: &str) -> Self;
}

impl DiagnosticExt for Diagnostic {
    fn with_attribute_if_not_empty(self, path: &str) -> Self {
        if path.is_empty() {
            self
        } else {
            self.with_attribute(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema};
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!({"name": "test"}));
        assert!(diagnostics.is_empty());

        // Missing required
        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        // Null value
        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        // Wrong type
        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("group_order", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"group_order": 42})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"group_order": null})).is_empty());
        assert_eq!(
            validate(&schema, &json!({"group_order": "not a number"})).len(),
            1
        );
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"id": 123})).is_empty());
    }

    #[test]
    fn test_validate_unknown_attribute() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!({"name": "a", "nmae": "b"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("nmae".to_string()));
        assert!(diagnostics[0].summary.contains("Unsupported argument"));
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute("frequency", Attribute::required_int64());

        assert!(validate(&schema, &json!({"frequency": 42})).is_empty());
        assert!(validate(&schema, &json!({"frequency": 42.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"frequency": 42.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"frequency": "42"})).len(), 1);
    }

    #[test]
    fn test_validate_set_of_strings() {
        let schema = Schema::v0().with_attribute("tags", Attribute::optional_string_set());

        assert!(validate(&schema, &json!({"tags": ["a", "b"]})).is_empty());

        let diagnostics = validate(&schema, &json!({"tags": ["a", 123]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("tags.1".to_string()));

        let diagnostics = validate(&schema, &json!({"tags": "a"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].detail, Some("Expected set, got string".to_string()));
    }

    #[test]
    fn test_validate_map() {
        let schema = Schema::v0().with_attribute(
            "headers",
            Attribute::new(
                AttributeType::map(AttributeType::String),
                AttributeFlags::required(),
            ),
        );

        assert!(validate(&schema, &json!({"headers": {"X-A": "1"}})).is_empty());

        let diagnostics = validate(&schema, &json!({"headers": {"X-A": "1", "X-B": 2}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("headers.X-B".to_string()));
    }

    #[test]
    fn test_validate_one_of_validators() {
        let schema = Schema::v0()
            .with_attribute(
                "method",
                Attribute::optional_string().with_validator(Validator::one_of(["GET", "POST"])),
            )
            .with_attribute(
                "frequency",
                Attribute::optional_int64().with_validator(Validator::one_of_int([1, 5, 10])),
            );

        assert!(validate(&schema, &json!({"method": "GET", "frequency": 5})).is_empty());

        let diagnostics = validate(&schema, &json!({"method": "FETCH", "frequency": 3}));
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|d| d.summary.starts_with("Invalid value")));
    }

    #[test]
    fn test_validate_range_and_length_validators() {
        let schema = Schema::v0()
            .with_attribute(
                "threshold",
                Attribute::optional_int64().with_validator(Validator::int_range(1, 30)),
            )
            .with_attribute(
                "slug_name",
                Attribute::optional_string().with_validator(Validator::string_length(1, 10)),
            );

        assert!(validate(&schema, &json!({"threshold": 30, "slug_name": "eu"})).is_empty());
        assert_eq!(validate(&schema, &json!({"threshold": 31})).len(), 1);
        assert_eq!(validate(&schema, &json!({"slug_name": ""})).len(), 1);
    }

    #[test]
    fn test_validate_validator_applies_to_set_elements() {
        let schema = Schema::v0().with_attribute(
            "locations",
            Attribute::optional_string_set().with_validator(Validator::one_of(["eu-west-1"])),
        );

        let diagnostics = validate(&schema, &json!({"locations": ["eu-west-1", "mars-1"]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("locations.1".to_string()));
    }

    #[test]
    fn test_validate_url_validator() {
        let schema = Schema::v0().with_attribute(
            "url",
            Attribute::required_string().with_validator(Validator::Url),
        );

        assert!(validate(&schema, &json!({"url": "https://example.com"})).is_empty());
        assert_eq!(validate(&schema, &json!({"url": "example.com"})).len(), 1);
        assert_eq!(validate(&schema, &json!({"url": "https://"})).len(), 1);
    }

    #[test]
    fn test_validate_deprecated_attribute_warns() {
        let schema = Schema::v0().with_attribute(
            "double_check",
            Attribute::optional_bool().with_deprecation("Use retry_strategy instead"),
        );

        assert!(validate(&schema, &json!({})).is_empty());

        let diagnostics = validate(&schema, &json!({"double_check": true}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Warning);
        assert!(!crate::schema::has_errors(&diagnostics));
    }

    #[test]
    fn test_validate_nested_block_single() {
        let schema = Schema::v0().with_block(
            "config",
            NestedBlock::single(Block::new().with_attribute("enabled", Attribute::required_bool())),
        );

        assert!(validate(&schema, &json!({"config": {"enabled": true}})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());

        let diagnostics = validate(&schema, &json!({"config": {"enabled": "yes"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("config.enabled".to_string()));
    }

    #[test]
    fn test_validate_nested_block_list() {
        let schema = Schema::v0().with_block(
            "assertion",
            NestedBlock::list(Block::new().with_attribute("source", Attribute::required_string()))
                .with_min_items(1)
                .with_max_items(3),
        );

        assert!(validate(
            &schema,
            &json!({"assertion": [{"source": "STATUS_CODE"}, {"source": "TEXT_BODY"}]})
        )
        .is_empty());

        let diagnostics = validate(&schema, &json!({"assertion": []}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"assertion": [{"source": "A"}, {"source": "B"}, {"source": "C"}, {"source": "D"}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 3"));

        let diagnostics = validate(&schema, &json!({"assertion": [{"source": 1}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("assertion.0.source".to_string())
        );
    }

    #[test]
    fn test_validate_required_block_and_wrong_shape() {
        let schema = Schema::v0().with_block(
            "request",
            NestedBlock::at_most_one(Block::new().with_attribute("url", Attribute::required_string()))
                .with_min_items(1),
        );

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.starts_with("Missing required block"));

        let diagnostics = validate(&schema, &json!({"request": {"url": "https://a.io"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].detail, Some("Got object".to_string()));
    }

    #[test]
    fn test_validate_deeply_nested() {
        let schema = Schema::v0().with_block(
            "card",
            NestedBlock::list(
                Block::new()
                    .with_attribute("name", Attribute::required_string())
                    .with_block(
                        "service_attachment",
                        NestedBlock::list(
                            Block::new().with_attribute("service_id", Attribute::required_string()),
                        ),
                    ),
            ),
        );

        assert!(validate(
            &schema,
            &json!({"card": [{"name": "API", "service_attachment": [{"service_id": "s-1"}]}]}),
        )
        .is_empty());

        let diagnostics = validate(
            &schema,
            &json!({"card": [{"name": "API", "service_attachment": [{"service_id": 1}]}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("card.0.service_attachment.0.service_id".to_string())
        );
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }
}
