//! `checkly_maintenance_windows`

use super::common::{numeric_id, numeric_id_value};
use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::account::REPEAT_UNITS;
use crate::models::MaintenanceWindow;
use crate::schema::{Attribute, Diagnostic, Schema, Validator};

impl ResourceModel for MaintenanceWindow {
    const TYPE_NAME: &'static str = "checkly_maintenance_windows";

    fn schema() -> Schema {
        Schema::v0()
            .with_description("Maintenance windows pause checks with matching tags.")
            .with_id()
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "starts_at",
                Attribute::required_string().with_description("Start of the window, ISO 8601."),
            )
            .with_attribute(
                "ends_at",
                Attribute::required_string().with_description("End of the window, ISO 8601."),
            )
            .with_attribute(
                "repeat_unit",
                Attribute::optional_string().with_validator(Validator::one_of(REPEAT_UNITS)),
            )
            .with_attribute(
                "repeat_interval",
                Attribute::optional_int64().with_validator(Validator::int_range(1, 365)),
            )
            .with_attribute("repeat_ends_at", Attribute::optional_string())
            .with_attribute(
                "tags",
                Attribute::optional_string_set()
                    .with_description("Checks and groups with any of these tags are paused."),
            )
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if !config.is_set("repeat_unit") {
            for name in ["repeat_interval", "repeat_ends_at"] {
                if config.is_set(name) {
                    diags.push(
                        Diagnostic::error(format!("{} requires repeat_unit", name))
                            .with_attribute(name),
                    );
                }
            }
        }
        // ISO 8601 timestamps in the same format order lexically.
        if let (Ok(Some(starts)), Ok(Some(ends))) =
            (config.opt_string("starts_at"), config.opt_string("ends_at"))
        {
            if starts.len() == ends.len() && ends <= starts {
                diags.push(
                    Diagnostic::error("ends_at must be after starts_at").with_attribute("ends_at"),
                );
            }
        }
        diags
    }
}

impl FromAttributes for MaintenanceWindow {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            id: numeric_id(attrs)?,
            name: attrs.string("name")?,
            starts_at: attrs.string("starts_at")?,
            ends_at: attrs.string("ends_at")?,
            repeat_unit: attrs.opt_string("repeat_unit")?,
            repeat_ends_at: attrs.opt_string("repeat_ends_at")?,
            repeat_interval: attrs.opt_int("repeat_interval")?,
            tags: attrs.string_set("tags")?,
        })
    }
}

impl ToAttributes for MaintenanceWindow {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_opt_string("id", numeric_id_value(self.id).as_deref())
            .set_string("name", &self.name)
            .set_string("starts_at", &self.starts_at)
            .set_string("ends_at", &self.ends_at)
            .set_opt_string("repeat_unit", self.repeat_unit.as_deref())
            .set_opt_string("repeat_ends_at", self.repeat_ends_at.as_deref())
            .set_opt("repeat_interval", self.repeat_interval)
            .set_string_set("tags", &self.tags)
    }
}
