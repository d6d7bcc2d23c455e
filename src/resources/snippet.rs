//! `checkly_snippet`

use super::common::{numeric_id, numeric_id_value};
use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::Snippet;
use crate::schema::{Attribute, Schema};

impl ResourceModel for Snippet {
    const TYPE_NAME: &'static str = "checkly_snippet";

    fn schema() -> Schema {
        Schema::v0()
            .with_description("Snippets are scripts shared by the setup and teardown of checks.")
            .with_id()
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the snippet."),
            )
            .with_attribute(
                "script",
                Attribute::required_string().with_description("Node.js code run by the snippet."),
            )
    }
}

impl FromAttributes for Snippet {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            id: numeric_id(attrs)?,
            name: attrs.string("name")?,
            script: attrs.string("script")?,
        })
    }
}

impl ToAttributes for Snippet {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_opt_string("id", numeric_id_value(self.id).as_deref())
            .set_string("name", &self.name)
            .set_string("script", &self.script)
    }
}
