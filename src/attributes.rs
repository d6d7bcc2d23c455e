//! Typed access to attribute maps.
//!
//! Resource state and configuration arrive as JSON objects whose shape follows
//! the resource schema: scalars, sets and maps as plain JSON values, nested
//! blocks as arrays of objects. [`Attributes`] reads those values into Rust
//! types with the host's zero-value semantics (an unset string reads as `""`,
//! an unset number as `0`), and [`AttributeWriter`] produces the canonical
//! form back: sets sorted and de-duplicated, maps with sorted keys, empty
//! strings written as `null`.
//!
//! Models implement [`FromAttributes`] and [`ToAttributes`] on top of these;
//! for any normalized model `m`, reading back what `m.to_attributes()` wrote
//! yields `m` again.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::ProviderError;

/// Conversion from an attribute map into a typed value.
pub trait FromAttributes: Sized {
    /// Read `Self` from the attributes.
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError>;
}

/// Conversion from a typed value into an attribute map.
pub trait ToAttributes {
    /// Write `self` as attributes.
    fn to_attributes(&self) -> AttributeWriter;
}

/// A read-only, typed view over an attribute map.
#[derive(Debug, Clone)]
pub struct Attributes<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> Attributes<'a> {
    /// View a JSON value as an attribute map. The value must be an object.
    pub fn new(value: &'a Value) -> Result<Self, ProviderError> {
        match value {
            Value::Object(map) => Ok(Self {
                map,
                path: String::new(),
            }),
            other => Err(ProviderError::Validation(format!(
                "expected an attribute object, got {}",
                type_name(other)
            ))),
        }
    }

    /// The path of this view, e.g. `request.0`; empty at the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw value of an attribute, `None` when absent or null.
    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    /// Whether the attribute is set to a non-empty value.
    pub fn is_set(&self, name: &str) -> bool {
        match self.raw(name) {
            None => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(obj)) => !obj.is_empty(),
            Some(_) => true,
        }
    }

    /// A string attribute; unset reads as `""`.
    pub fn string(&self, name: &str) -> Result<String, ProviderError> {
        Ok(self.opt_string(name)?.unwrap_or_default())
    }

    /// A string attribute; unset or empty reads as `None`.
    pub fn opt_string(&self, name: &str) -> Result<Option<String>, ProviderError> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.type_error(name, "string", other)),
        }
    }

    /// A string attribute that must be set.
    pub fn required_string(&self, name: &str) -> Result<String, ProviderError> {
        self.opt_string(name)?.ok_or_else(|| {
            ProviderError::Validation(format!("attribute '{}' is required", self.child(name)))
        })
    }

    /// An integer attribute; unset reads as `0`.
    pub fn int(&self, name: &str) -> Result<i64, ProviderError> {
        Ok(self.opt_int(name)?.unwrap_or_default())
    }

    /// An integer attribute; unset reads as `None`.
    pub fn opt_int(&self, name: &str) -> Result<Option<i64>, ProviderError> {
        match self.raw(name) {
            None => Ok(None),
            Some(v @ Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| self.type_error(name, "integer", v)),
            Some(other) => Err(self.type_error(name, "integer", other)),
        }
    }

    /// A boolean attribute; unset reads as `false`.
    pub fn bool(&self, name: &str) -> Result<bool, ProviderError> {
        Ok(self.opt_bool(name)?.unwrap_or_default())
    }

    /// A boolean attribute; unset reads as `None`.
    pub fn opt_bool(&self, name: &str) -> Result<Option<bool>, ProviderError> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.type_error(name, "bool", other)),
        }
    }

    /// A list of strings in configured order.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, ProviderError> {
        let Some(value) = self.raw(name) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.type_error(name, "list", value))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.type_error(name, "list of strings", value))
            })
            .collect()
    }

    /// A set of strings, sorted and de-duplicated.
    pub fn string_set(&self, name: &str) -> Result<Vec<String>, ProviderError> {
        let mut items = self.string_list(name)?;
        items.sort();
        items.dedup();
        Ok(items)
    }

    /// A map of strings.
    pub fn string_map(&self, name: &str) -> Result<BTreeMap<String, String>, ProviderError> {
        let Some(value) = self.raw(name) else {
            return Ok(BTreeMap::new());
        };
        let obj = value
            .as_object()
            .ok_or_else(|| self.type_error(name, "map", value))?;
        obj.iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k.clone(), s.clone())),
                Value::Null => Ok((k.clone(), String::new())),
                other => Err(self.type_error(&format!("{}.{}", name, k), "string", other)),
            })
            .collect()
    }

    /// All items of a nested block.
    pub fn blocks(&self, name: &str) -> Result<Vec<Attributes<'a>>, ProviderError> {
        match self.raw(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => Ok(Attributes {
                        map,
                        path: format!("{}.{}", self.child(name), i),
                    }),
                    other => Err(self.type_error(&format!("{}.{}", name, i), "object", other)),
                })
                .collect(),
            Some(Value::Object(map)) => Ok(vec![Attributes {
                map,
                path: format!("{}.0", self.child(name)),
            }]),
            Some(other) => Err(self.type_error(name, "block", other)),
        }
    }

    /// The first item of a nested block, if any.
    pub fn block(&self, name: &str) -> Result<Option<Attributes<'a>>, ProviderError> {
        Ok(self.blocks(name)?.into_iter().next())
    }

    /// Read a nested block into a typed value.
    pub fn read_block<T: FromAttributes>(&self, name: &str) -> Result<Option<T>, ProviderError> {
        self.block(name)?
            .map(|attrs| T::from_attributes(&attrs))
            .transpose()
    }

    /// Read every item of a nested block into typed values.
    pub fn read_blocks<T: FromAttributes>(&self, name: &str) -> Result<Vec<T>, ProviderError> {
        self.blocks(name)?
            .iter()
            .map(T::from_attributes)
            .collect()
    }

    fn child(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }

    fn type_error(&self, name: &str, expected: &str, got: &Value) -> ProviderError {
        ProviderError::Validation(format!(
            "attribute '{}': expected {}, got {}",
            self.child(name),
            expected,
            type_name(got)
        ))
    }
}

/// Builds an attribute map in canonical form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeWriter {
    map: Map<String, Value>,
}

impl AttributeWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute to a JSON value.
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.map.insert(name.to_string(), value.into());
        self
    }

    /// Set an optional attribute; `None` is written as `null`.
    pub fn set_opt<T: Into<Value>>(self, name: &str, value: Option<T>) -> Self {
        let value = value.map_or(Value::Null, Into::into);
        self.set(name, value)
    }

    /// Set a string attribute; the empty string is written as `null`.
    pub fn set_string(self, name: &str, value: &str) -> Self {
        if value.is_empty() {
            self.set(name, Value::Null)
        } else {
            self.set(name, value)
        }
    }

    /// Set an optional string attribute; `None` and `""` are written as `null`.
    pub fn set_opt_string(self, name: &str, value: Option<&str>) -> Self {
        self.set_string(name, value.unwrap_or_default())
    }

    /// Set a list of strings, keeping order.
    pub fn set_string_list<I, S>(self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<Value> = values
            .into_iter()
            .map(|s| Value::String(s.as_ref().to_string()))
            .collect();
        self.set(name, Value::Array(items))
    }

    /// Set a set of strings, sorted and de-duplicated.
    pub fn set_string_set<I, S>(self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items: Vec<String> = values
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        items.sort();
        items.dedup();
        self.set_string_list(name, items)
    }

    /// Set a map of strings.
    pub fn set_string_map<'k, I>(self, name: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'k String, &'k String)>,
    {
        let sorted: BTreeMap<&String, &String> = entries.into_iter().collect();
        let map: Map<String, Value> = sorted
            .into_iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.set(name, Value::Object(map))
    }

    /// Set a nested block holding at most one item.
    pub fn set_block(self, name: &str, block: Option<AttributeWriter>) -> Self {
        self.set_blocks(name, block)
    }

    /// Set a nested block from a list of items.
    pub fn set_blocks<I>(self, name: &str, blocks: I) -> Self
    where
        I: IntoIterator<Item = AttributeWriter>,
    {
        let items: Vec<Value> = blocks.into_iter().map(AttributeWriter::finish).collect();
        self.set(name, Value::Array(items))
    }

    /// Write a typed value as a single-item block.
    pub fn write_block<T: ToAttributes>(self, name: &str, value: Option<&T>) -> Self {
        self.set_block(name, value.map(ToAttributes::to_attributes))
    }

    /// Write typed values as block items.
    pub fn write_blocks<'t, T, I>(self, name: &str, values: I) -> Self
    where
        T: ToAttributes + 't,
        I: IntoIterator<Item = &'t T>,
    {
        self.set_blocks(name, values.into_iter().map(ToAttributes::to_attributes))
    }

    /// Finish and return the attribute object.
    pub fn finish(self) -> Value {
        Value::Object(self.map)
    }

    /// Finish and return the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.map
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Read a value back from what it wrote. Used by round-trip tests.
#[cfg(test)]
pub(crate) fn round_trip<T>(value: &T) -> T
where
    T: FromAttributes + ToAttributes,
{
    let written = value.to_attributes().finish();
    let attrs = Attributes::new(&written).expect("writer produces an object");
    T::from_attributes(&attrs).expect("written attributes read back")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_values_for_unset_attributes() {
        let value = json!({"name": null});
        let attrs = Attributes::new(&value).unwrap();

        assert_eq!(attrs.string("name").unwrap(), "");
        assert_eq!(attrs.opt_string("name").unwrap(), None);
        assert_eq!(attrs.int("frequency").unwrap(), 0);
        assert!(!attrs.bool("activated").unwrap());
        assert!(attrs.string_set("tags").unwrap().is_empty());
        assert!(attrs.string_map("headers").unwrap().is_empty());
        assert!(attrs.block("request").unwrap().is_none());
    }

    #[test]
    fn test_typed_reads() {
        let value = json!({
            "name": "api",
            "frequency": 10.0,
            "activated": true,
            "tags": ["b", "a", "b"],
            "headers": {"X-B": "2", "X-A": "1"}
        });
        let attrs = Attributes::new(&value).unwrap();

        assert_eq!(attrs.string("name").unwrap(), "api");
        assert_eq!(attrs.int("frequency").unwrap(), 10);
        assert!(attrs.bool("activated").unwrap());
        assert_eq!(attrs.string_set("tags").unwrap(), vec!["a", "b"]);
        assert_eq!(attrs.string_list("tags").unwrap(), vec!["b", "a", "b"]);
        assert_eq!(
            attrs.string_map("headers").unwrap().keys().collect::<Vec<_>>(),
            vec!["X-A", "X-B"]
        );
    }

    #[test]
    fn test_type_error_names_nested_path() {
        let value = json!({"request": [{"url": 42}]});
        let attrs = Attributes::new(&value).unwrap();
        let request = attrs.block("request").unwrap().unwrap();
        assert_eq!(request.path(), "request.0");

        let err = request.string("url").unwrap_err();
        assert_eq!(
            err.message(),
            "attribute 'request.0.url': expected string, got number"
        );
    }

    #[test]
    fn test_required_string() {
        let value = json!({"name": ""});
        let attrs = Attributes::new(&value).unwrap();
        assert!(attrs.required_string("name").is_err());
    }

    #[test]
    fn test_block_accepts_single_object() {
        let value = json!({"heartbeat": {"period": 1}});
        let attrs = Attributes::new(&value).unwrap();
        let heartbeat = attrs.block("heartbeat").unwrap().unwrap();
        assert_eq!(heartbeat.int("period").unwrap(), 1);
    }

    #[test]
    fn test_writer_canonical_form() {
        let headers: BTreeMap<String, String> =
            [("X-B".to_string(), "2".to_string())].into_iter().collect();
        let value = AttributeWriter::new()
            .set("frequency", 5)
            .set_string("script", "")
            .set_opt_string("runtime_id", Some("2024.02"))
            .set_string_set("tags", ["prod", "api", "prod"])
            .set_string_map("headers", &headers)
            .set_block("request", None)
            .set_blocks("assertion", vec![AttributeWriter::new().set("source", "STATUS_CODE")])
            .finish();

        assert_eq!(
            value,
            json!({
                "frequency": 5,
                "script": null,
                "runtime_id": "2024.02",
                "tags": ["api", "prod"],
                "headers": {"X-B": "2"},
                "request": [],
                "assertion": [{"source": "STATUS_CODE"}]
            })
        );
    }

    #[test]
    fn test_new_rejects_non_object() {
        assert!(Attributes::new(&json!([1, 2])).is_err());
    }
}
