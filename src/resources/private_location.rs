//! `checkly_private_location`

use serde_json::json;

use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::{PrivateLocation, PrivateLocationKey};
use crate::schema::{Attribute, Diagnostic, Schema, Validator};

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl ResourceModel for PrivateLocation {
    const TYPE_NAME: &'static str = "checkly_private_location";

    fn schema() -> Schema {
        Schema::v0()
            .with_description("Private locations run checks from inside your own network.")
            .with_id()
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::string_length(1, 255)),
            )
            .with_attribute(
                "slug_name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Identifier checks use to select the location."),
            )
            .with_attribute(
                "icon",
                Attribute::optional_string()
                    .with_default(json!("location"))
                    .with_description("Octicon shown next to the location name."),
            )
            .with_attribute(
                "keys",
                Attribute::computed_string_set()
                    .sensitive()
                    .with_description("API keys agents use to connect."),
            )
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        match config.opt_string("slug_name") {
            Ok(Some(slug)) if !is_valid_slug(&slug) => vec![Diagnostic::error(format!(
                "Invalid slug_name '{}'",
                slug
            ))
            .with_detail("Use lowercase letters, digits and dashes, not starting or ending with a dash.")
            .with_attribute("slug_name")],
            _ => Vec::new(),
        }
    }

    fn preserve_from(&mut self, known: &Self) {
        let has_raw_key = self.keys.iter().any(|k| !k.raw_key.is_empty());
        if !has_raw_key {
            self.keys = known.keys.clone();
        }
    }
}

impl FromAttributes for PrivateLocation {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = PrivateLocation::default();
        let keys = attrs
            .string_set("keys")?
            .into_iter()
            .map(|raw_key| PrivateLocationKey {
                raw_key,
                ..Default::default()
            })
            .collect();
        Ok(Self {
            id: attrs.string("id")?,
            name: attrs.string("name")?,
            slug_name: attrs.string("slug_name")?,
            icon: attrs.opt_string("icon")?.unwrap_or(defaults.icon),
            keys,
        })
    }
}

impl ToAttributes for PrivateLocation {
    fn to_attributes(&self) -> AttributeWriter {
        let raw_keys = self
            .keys
            .iter()
            .map(|k| k.raw_key.as_str())
            .filter(|k| !k.is_empty());
        AttributeWriter::new()
            .set_string("id", &self.id)
            .set_string("name", &self.name)
            .set_string("slug_name", &self.slug_name)
            .set_string("icon", &self.icon)
            .set_string_set("keys", raw_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::round_trip;
    use crate::plan::plan;

    fn location() -> PrivateLocation {
        PrivateLocation {
            id: "pl-1".into(),
            name: "Office".into(),
            slug_name: "office-ams".into(),
            keys: vec![PrivateLocationKey {
                raw_key: "pl_abc".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip() {
        let location = location();
        assert_eq!(round_trip(&location), location);
    }

    #[test]
    fn test_masked_keys_replaced_by_known() {
        let mut read = PrivateLocation {
            keys: vec![PrivateLocationKey {
                id: "k1".into(),
                raw_key: String::new(),
                masked_key: "pl_***".into(),
            }],
            ..location()
        };
        read.preserve_from(&location());
        assert_eq!(read.to_attributes().finish()["keys"], json!(["pl_abc"]));
    }

    #[test]
    fn test_keys_carried_by_plan() {
        let state = location().to_attributes().finish();
        let config = json!({"name": "Office", "slug_name": "office-ams"});
        let result = plan(&PrivateLocation::schema(), Some(&state), &config);
        assert!(!result.has_changes(), "{:?}", result.changes);
        assert_eq!(result.planned_state["keys"], json!(["pl_abc"]));
        assert_eq!(result.planned_state["icon"], "location");
    }

    #[test]
    fn test_slug_validation() {
        for (slug, ok) in [("office-ams", true), ("Office", false), ("-x", false), ("a_b", false)] {
            let config = json!({"name": "n", "slug_name": slug});
            let diags = PrivateLocation::validate(&Attributes::new(&config).unwrap());
            assert_eq!(diags.is_empty(), ok, "{}", slug);
        }
    }
}
