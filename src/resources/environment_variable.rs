//! `checkly_environment_variable`: account-wide variables, identified by key.

use serde_json::json;

use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::GlobalEnvironmentVariable;
use crate::schema::{Attribute, Diagnostic, Schema};

impl ResourceModel for GlobalEnvironmentVariable {
    const TYPE_NAME: &'static str = "checkly_environment_variable";

    fn schema() -> Schema {
        Schema::v0()
            .with_description("Environment variables available to every check of the account.")
            .with_id()
            .with_attribute("key", Attribute::required_string().with_force_new())
            .with_attribute("value", Attribute::required_string().sensitive())
            .with_attribute(
                "locked",
                Attribute::optional_bool()
                    .with_default(json!(false))
                    .with_description("Locked values are hidden in the web UI."),
            )
            .with_attribute(
                "secret",
                Attribute::optional_bool()
                    .with_default(json!(false))
                    .with_force_new()
                    .with_description("Secret values are never returned by the API."),
            )
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        let locked = config.bool("locked").unwrap_or_default();
        let secret = config.bool("secret").unwrap_or_default();
        if locked && secret {
            return vec![Diagnostic::warning("locked has no effect on secret variables")
                .with_attribute("locked")];
        }
        Vec::new()
    }

    fn preserve_from(&mut self, known: &Self) {
        if self.secret && known.key == self.key {
            self.value = known.value.clone();
        }
    }
}

impl FromAttributes for GlobalEnvironmentVariable {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let key = match attrs.opt_string("key")? {
            Some(key) => key,
            None => attrs.string("id")?,
        };
        Ok(Self {
            key,
            value: attrs.string("value")?,
            locked: attrs.bool("locked")?,
            secret: attrs.bool("secret")?,
        })
    }
}

impl ToAttributes for GlobalEnvironmentVariable {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("id", &self.key)
            .set_string("key", &self.key)
            .set("value", self.value.as_str())
            .set("locked", self.locked)
            .set("secret", self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::round_trip;
    use crate::plan::plan;

    fn secret() -> GlobalEnvironmentVariable {
        GlobalEnvironmentVariable {
            key: "API_TOKEN".into(),
            value: "s3cr3t".into(),
            secret: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip() {
        let var = secret();
        assert_eq!(round_trip(&var), var);
        assert_eq!(var.to_attributes().finish()["id"], "API_TOKEN");
    }

    #[test]
    fn test_secret_value_preserved() {
        let mut read = GlobalEnvironmentVariable {
            value: String::new(),
            ..secret()
        };
        read.preserve_from(&secret());
        assert_eq!(read.value, "s3cr3t");

        let mut plain = GlobalEnvironmentVariable {
            key: "REGION".into(),
            value: "eu".into(),
            ..Default::default()
        };
        let known = GlobalEnvironmentVariable {
            value: "us".into(),
            ..plain.clone()
        };
        plain.preserve_from(&known);
        assert_eq!(plain.value, "eu");
    }

    #[test]
    fn test_key_change_replaces() {
        let state = secret().to_attributes().finish();
        let mut config = state.clone();
        config["key"] = json!("OTHER_TOKEN");
        let result = plan(&GlobalEnvironmentVariable::schema(), Some(&state), &config);
        assert!(result.requires_replace);
    }

    #[test]
    fn test_import_reads_key_from_id() {
        let state = json!({"id": "API_TOKEN"});
        let var = GlobalEnvironmentVariable::from_attributes(&Attributes::new(&state).unwrap()).unwrap();
        assert_eq!(var.key, "API_TOKEN");
    }
}
