//! `checkly_trigger_check` and `checkly_trigger_group`
//!
//! A trigger is a token that runs a check or group when its URL is called.
//! Triggers are addressed by the id of what they run and cannot be updated.

use serde_json::Value;

use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::client::ChecklyClient;
use crate::error::ProviderError;
use crate::models::{trigger_url, TriggerCheck, TriggerGroup};
use crate::schema::{Attribute, Schema};

fn trigger_schema(target: &str, target_attribute: Attribute) -> Schema {
    Schema::v0()
        .with_description(format!("A token that runs a {} on demand.", target))
        .with_id()
        .with_attribute(format!("{}_id", target), target_attribute.with_force_new())
        .with_attribute(
            "token",
            Attribute::computed_string()
                .sensitive()
                .with_description("The trigger token."),
        )
        .with_attribute(
            "url",
            Attribute::computed_string().with_description("Calling this URL runs the target."),
        )
}

fn with_url(mut state: Value, client: &ChecklyClient, kind: &str, id: &str, token: &str) -> Value {
    if let Value::Object(map) = &mut state {
        let url = if token.is_empty() {
            Value::Null
        } else {
            Value::String(trigger_url(client.base_url(), kind, id, token))
        };
        map.insert("url".to_string(), url);
    }
    state
}

impl ResourceModel for TriggerCheck {
    const TYPE_NAME: &'static str = "checkly_trigger_check";
    const UPDATABLE: bool = false;

    fn schema() -> Schema {
        trigger_schema("check", Attribute::required_string())
    }

    fn decorate(&self, state: Value, client: &ChecklyClient) -> Value {
        with_url(state, client, "checks", &self.check_id, &self.token)
    }
}

impl FromAttributes for TriggerCheck {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let check_id = match attrs.opt_string("check_id")? {
            Some(id) => id,
            None => attrs.string("id")?,
        };
        Ok(Self {
            check_id,
            token: attrs.string("token")?,
        })
    }
}

impl ToAttributes for TriggerCheck {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("id", &self.check_id)
            .set_string("check_id", &self.check_id)
            .set_string("token", &self.token)
    }
}

impl ResourceModel for TriggerGroup {
    const TYPE_NAME: &'static str = "checkly_trigger_group";
    const UPDATABLE: bool = false;

    fn schema() -> Schema {
        trigger_schema("group", Attribute::required_int64())
    }

    fn decorate(&self, state: Value, client: &ChecklyClient) -> Value {
        with_url(
            state,
            client,
            "check-groups",
            &self.group_id.to_string(),
            &self.token,
        )
    }
}

impl FromAttributes for TriggerGroup {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let group_id = match attrs.opt_int("group_id")? {
            Some(id) => id,
            None => super::common::numeric_id(attrs)?,
        };
        Ok(Self {
            group_id,
            token: attrs.string("token")?,
        })
    }
}

impl ToAttributes for TriggerGroup {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_opt_string("id", super::common::numeric_id_value(self.group_id).as_deref())
            .set_opt("group_id", (self.group_id != 0).then_some(self.group_id))
            .set_string("token", &self.token)
    }
}
