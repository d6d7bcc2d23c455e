//! Schema-driven planning.
//!
//! The host sends the proposed state (configuration merged with prior state)
//! and expects back the state the provider will converge to. Planning fills
//! in defaults, keeps provider-computed values from the prior state, and lists
//! the top-level attributes that change. A change to a `force_new` attribute
//! or block turns the plan into a replacement.
//!
//! Values are compared canonically: `null`, absent, `[]` and `{}` are all
//! "unset", and set-typed values compare without regard to order. This is what
//! keeps a second apply of unchanged configuration a no-op.

use serde_json::{Map, Value};

use crate::schema::{AttributeType, Block, BlockNestingMode, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Plan the transition from `prior` to `proposed` for a resource with `schema`.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    let prior = prior.filter(|p| !p.is_null());

    if proposed.is_null() {
        let changes = match prior {
            Some(Value::Object(obj)) => {
                let mut keys: Vec<&String> = obj.keys().collect();
                keys.sort();
                keys.into_iter()
                    .filter_map(|k| {
                        canonical(&obj[k]).map(|_| AttributeChange::removed(k.clone(), obj[k].clone()))
                    })
                    .collect()
            },
            _ => Vec::new(),
        };
        return PlanResult::with_changes(Value::Null, changes, false);
    }

    let mut planned = proposed.clone();
    apply_defaults(&schema.block, &mut planned);
    if let Some(prior) = prior {
        carry_computed(&schema.block, &mut planned, prior);
    }

    let empty = Map::new();
    let before = prior.and_then(Value::as_object).unwrap_or(&empty);
    let after = planned.as_object().unwrap_or(&empty);

    let mut names: Vec<&String> = schema
        .block
        .attributes
        .keys()
        .chain(schema.block.blocks.keys())
        .collect();
    names.sort();

    let mut changes = Vec::new();
    let mut requires_replace = false;
    for name in names {
        let old = before.get(name).filter(|v| canonical(v).is_some());
        let new = after.get(name).filter(|v| canonical(v).is_some());
        let set_like = is_set_like(&schema.block, name);
        if same_value(old, new, set_like) {
            continue;
        }

        // Computed values that are not known yet are not changes on their own.
        if new.is_none() && is_computed(&schema.block, name) {
            continue;
        }

        if prior.is_some() && forces_new(&schema.block, name) {
            requires_replace = true;
        }
        changes.push(AttributeChange::new(name.clone(), old.cloned(), new.cloned()));
    }

    PlanResult::with_changes(planned, changes, requires_replace)
}

/// Fill in schema defaults for absent attributes, recursively through nested blocks.
pub fn apply_defaults(block: &Block, value: &mut Value) {
    let Value::Object(obj) = value else {
        return;
    };

    for (name, attr) in &block.attributes {
        let slot = obj.entry(name.clone()).or_insert(Value::Null);
        if slot.is_null() {
            if let Some(default) = &attr.default {
                *slot = default.clone();
            }
        }
    }

    for (name, nested) in &block.blocks {
        let slot = obj.entry(name.clone()).or_insert_with(|| match nested.nesting_mode {
            BlockNestingMode::List | BlockNestingMode::Set => Value::Array(Vec::new()),
            BlockNestingMode::Single | BlockNestingMode::Map => Value::Null,
        });
        match (nested.nesting_mode, slot) {
            (BlockNestingMode::Single, item @ Value::Object(_)) => {
                apply_defaults(&nested.block, item);
            },
            (_, Value::Array(items)) => {
                for item in items {
                    apply_defaults(&nested.block, item);
                }
            },
            (BlockNestingMode::Map, Value::Object(items)) => {
                for item in items.values_mut() {
                    apply_defaults(&nested.block, item);
                }
            },
            _ => {},
        }
    }
}

/// Copy computed attribute values and computed blocks the configuration
/// leaves unset from the prior state. Nested blocks are matched by position.
fn carry_computed(block: &Block, planned: &mut Value, prior: &Value) {
    let (Value::Object(obj), Value::Object(prior_obj)) = (planned, prior) else {
        return;
    };

    for (name, attr) in &block.attributes {
        if !attr.flags.computed {
            continue;
        }
        let unset = obj.get(name).map_or(true, Value::is_null);
        if unset {
            if let Some(previous) = prior_obj.get(name).filter(|v| !v.is_null()) {
                obj.insert(name.clone(), previous.clone());
            }
        }
    }

    for (name, nested) in &block.blocks {
        let unset = obj.get(name).map_or(true, |v| canonical(v).is_none());
        if nested.computed && unset {
            if let Some(previous) = prior_obj.get(name).filter(|v| canonical(v).is_some()) {
                obj.insert(name.clone(), previous.clone());
            }
            continue;
        }

        let (Some(current), Some(previous)) = (obj.get_mut(name), prior_obj.get(name)) else {
            continue;
        };
        match (current, previous) {
            (Value::Array(items), Value::Array(prior_items)) => {
                for (item, prior_item) in items.iter_mut().zip(prior_items) {
                    carry_computed(&nested.block, item, prior_item);
                }
            },
            (item @ Value::Object(_), prior_item @ Value::Object(_)) => {
                carry_computed(&nested.block, item, prior_item);
            },
            _ => {},
        }
    }
}

fn is_computed(block: &Block, name: &str) -> bool {
    block
        .attributes
        .get(name)
        .is_some_and(|a| a.flags.computed)
        || block.blocks.get(name).is_some_and(|b| b.computed)
}

fn forces_new(block: &Block, name: &str) -> bool {
    block.attributes.get(name).is_some_and(|a| a.force_new)
        || block.blocks.get(name).is_some_and(|b| b.force_new)
}

fn is_set_like(block: &Block, name: &str) -> bool {
    block
        .attributes
        .get(name)
        .is_some_and(|a| matches!(a.attr_type, AttributeType::Set(_)))
        || block
            .blocks
            .get(name)
            .is_some_and(|b| b.nesting_mode == BlockNestingMode::Set)
}

fn same_value(old: Option<&Value>, new: Option<&Value>, set_like: bool) -> bool {
    match (old.and_then(canonical), new.and_then(canonical)) {
        (None, None) => true,
        (Some(a), Some(b)) if set_like => sorted_elements(&a) == sorted_elements(&b),
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn sorted_elements(value: &Value) -> Vec<String> {
    let mut elements: Vec<String> = match value {
        Value::Array(items) => items.iter().map(Value::to_string).collect(),
        other => vec![other.to_string()],
    };
    elements.sort();
    elements.dedup();
    elements
}

/// Canonical form used for comparison: unset values (including the empty
/// string) become `None`, and unset members of objects are dropped.
fn canonical(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => {
            let items: Vec<Value> = items
                .iter()
                .map(|v| canonical(v).unwrap_or(Value::Null))
                .collect();
            if items.is_empty() {
                None
            } else {
                Some(Value::Array(items))
            }
        },
        Value::Object(obj) => {
            let obj: Map<String, Value> = obj
                .iter()
                .filter_map(|(k, v)| canonical(v).map(|v| (k.clone(), v)))
                .collect();
            if obj.is_empty() {
                None
            } else {
                Some(Value::Object(obj))
            }
        },
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, NestedBlock};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::v0()
            .with_id()
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "frequency",
                Attribute::optional_int64().with_default(json!(10)),
            )
            .with_attribute("locations", Attribute::optional_string_set())
            .with_attribute("host", Attribute::optional_string().with_force_new())
            .with_block(
                "retry_strategy",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("type", Attribute::required_string())
                        .with_attribute(
                            "max_retries",
                            Attribute::optional_int64().with_default(json!(2)),
                        )
                        .with_attribute("token", Attribute::computed_string()),
                )
                .with_max_items(1),
            )
    }

    #[test]
    fn test_plan_create_applies_defaults() {
        let result = plan(
            &schema(),
            None,
            &json!({"name": "api", "retry_strategy": [{"type": "FIXED"}]}),
        );

        assert_eq!(result.planned_state["frequency"], 10);
        assert_eq!(result.planned_state["retry_strategy"][0]["max_retries"], 2);
        assert!(result.planned_state["id"].is_null());
        assert!(!result.requires_replace);
        assert_eq!(
            result.changed_paths(),
            vec!["frequency", "name", "retry_strategy"]
        );
    }

    #[test]
    fn test_plan_keeps_explicit_values_over_defaults() {
        let result = plan(&schema(), None, &json!({"name": "api", "frequency": 1}));
        assert_eq!(result.planned_state["frequency"], 1);
    }

    #[test]
    fn test_plan_is_idempotent_for_unchanged_config() {
        let prior = json!({
            "id": "c-1",
            "name": "api",
            "frequency": 10,
            "locations": ["us-east-1", "eu-west-1"],
            "host": null,
            "retry_strategy": [{"type": "FIXED", "max_retries": 2, "token": "t"}]
        });
        let proposed = json!({
            "name": "api",
            "locations": ["eu-west-1", "us-east-1"],
            "retry_strategy": [{"type": "FIXED"}]
        });

        let result = plan(&schema(), Some(&prior), &proposed);
        assert!(!result.has_changes(), "{:?}", result.changes);
        assert_eq!(result.planned_state["id"], "c-1");
        assert_eq!(result.planned_state["retry_strategy"][0]["token"], "t");
    }

    #[test]
    fn test_plan_update_in_place() {
        let prior = json!({"id": "c-1", "name": "api", "frequency": 10});
        let result = plan(&schema(), Some(&prior), &json!({"name": "api", "frequency": 5}));

        assert_eq!(result.changed_paths(), vec!["frequency"]);
        assert!(!result.requires_replace);
        assert_eq!(result.planned_state["id"], "c-1");
    }

    #[test]
    fn test_plan_force_new_requires_replace() {
        let prior = json!({"id": "c-1", "name": "api", "host": "a.example.com"});
        let result = plan(
            &schema(),
            Some(&prior),
            &json!({"name": "api", "host": "b.example.com"}),
        );

        assert!(result.requires_replace);
        assert_eq!(result.changed_paths(), vec!["host"]);
    }

    #[test]
    fn test_plan_empty_block_equals_missing_block() {
        let prior = json!({"id": "c-1", "name": "api", "frequency": 10, "retry_strategy": []});
        let result = plan(&schema(), Some(&prior), &json!({"name": "api"}));
        assert!(!result.has_changes());
    }

    #[test]
    fn test_plan_keeps_computed_block_from_prior() {
        let schema = Schema::v0()
            .with_id()
            .with_attribute("name", Attribute::required_string())
            .with_block(
                "alert_settings",
                NestedBlock::at_most_one(
                    Block::new().with_attribute("escalation_type", Attribute::optional_string()),
                )
                .computed(),
            );
        let prior = json!({
            "id": "c-1",
            "name": "api",
            "alert_settings": [{"escalation_type": "RUN_BASED"}]
        });

        let result = plan(&schema, Some(&prior), &json!({"name": "api"}));
        assert!(!result.has_changes());
        assert_eq!(
            result.planned_state["alert_settings"][0]["escalation_type"],
            "RUN_BASED"
        );

        let result = plan(
            &schema,
            Some(&prior),
            &json!({"name": "api", "alert_settings": [{"escalation_type": "TIME_BASED"}]}),
        );
        assert_eq!(result.changed_paths(), vec!["alert_settings"]);
    }

    #[test]
    fn test_plan_empty_string_equals_unset() {
        let prior = json!({"id": "c-1", "name": "api", "frequency": 10, "host": ""});
        let result = plan(&schema(), Some(&prior), &json!({"name": "api"}));
        assert!(!result.has_changes());
    }

    #[test]
    fn test_plan_destroy() {
        let prior = json!({"id": "c-1", "name": "api", "host": null});
        let result = plan(&schema(), Some(&prior), &Value::Null);

        assert!(result.planned_state.is_null());
        assert_eq!(result.changed_paths(), vec!["id", "name"]);
        assert!(!result.requires_replace);
    }
}
