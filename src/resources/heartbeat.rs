//! `checkly_heartbeat`

use serde_json::json;

use super::common::{validate_alert_settings, with_alerting};
use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::check::HEARTBEAT_UNITS;
use crate::models::{Heartbeat, HeartbeatCheck};
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema, Validator};

/// Longest period and grace time the API accepts.
const MAX_SECONDS: i64 = 365 * 86400;
const MIN_PERIOD_SECONDS: i64 = 30;

fn heartbeat_block() -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_attribute(
                "period",
                Attribute::required_int64().with_description("How often you expect a ping."),
            )
            .with_attribute(
                "period_unit",
                Attribute::required_string().with_validator(Validator::one_of(HEARTBEAT_UNITS)),
            )
            .with_attribute(
                "grace",
                Attribute::required_int64()
                    .with_description("How long to wait for a late ping before alerting."),
            )
            .with_attribute(
                "grace_unit",
                Attribute::required_string().with_validator(Validator::one_of(HEARTBEAT_UNITS)),
            )
            .with_attribute(
                "ping_token",
                Attribute::computed_string().with_description("Token to use in the ping URL."),
            ),
    )
    .with_min_items(1)
    .with_max_items(1)
}

impl FromAttributes for Heartbeat {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            period: attrs.int("period")?,
            period_unit: attrs.string("period_unit")?,
            grace: attrs.int("grace")?,
            grace_unit: attrs.string("grace_unit")?,
            ping_token: attrs.string("ping_token")?,
        })
    }
}

impl ToAttributes for Heartbeat {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set("period", self.period)
            .set_string("period_unit", &self.period_unit)
            .set("grace", self.grace)
            .set_string("grace_unit", &self.grace_unit)
            .set_string("ping_token", &self.ping_token)
    }
}

fn check_duration(
    block: &Attributes<'_>,
    amount: &str,
    unit: &str,
    min_seconds: i64,
    diags: &mut Vec<Diagnostic>,
) {
    let (Ok(Some(value)), Ok(Some(unit_name))) = (block.opt_int(amount), block.opt_string(unit))
    else {
        return;
    };
    let Some(unit_seconds) = Heartbeat::unit_seconds(&unit_name) else {
        return;
    };
    let seconds = value.saturating_mul(unit_seconds);
    if !(min_seconds..=MAX_SECONDS).contains(&seconds) {
        diags.push(
            Diagnostic::error(format!(
                "{} must be between {} seconds and 365 days, got {} {}",
                amount, min_seconds, value, unit_name
            ))
            .with_attribute(format!("{}.{}", block.path(), amount)),
        );
    }
}

impl ResourceModel for HeartbeatCheck {
    const TYPE_NAME: &'static str = "checkly_heartbeat";

    fn schema() -> Schema {
        let schema = Schema::v0()
            .with_description("Heartbeats monitor scheduled jobs that ping Checkly when they run.")
            .with_id()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("activated", Attribute::required_bool())
            .with_attribute("muted", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute("tags", Attribute::optional_string_set())
            .with_block("heartbeat", heartbeat_block());
        with_alerting(schema)
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if let Ok(Some(heartbeat)) = config.block("heartbeat") {
            check_duration(&heartbeat, "period", "period_unit", MIN_PERIOD_SECONDS, &mut diags);
            check_duration(&heartbeat, "grace", "grace_unit", 0, &mut diags);
        }
        diags.extend(validate_alert_settings(config));
        diags
    }
}

impl FromAttributes for HeartbeatCheck {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = HeartbeatCheck::default();
        Ok(Self {
            id: attrs.string("id")?,
            name: attrs.string("name")?,
            activated: attrs.opt_bool("activated")?.unwrap_or(defaults.activated),
            muted: attrs.bool("muted")?,
            tags: attrs.string_set("tags")?,
            alert_settings: attrs.read_block("alert_settings")?,
            use_global_alert_settings: attrs.bool("use_global_alert_settings")?,
            alert_channel_subscriptions: attrs.read_blocks("alert_channel_subscription")?,
            heartbeat: attrs.read_block("heartbeat")?.unwrap_or_default(),
        })
    }
}

impl ToAttributes for HeartbeatCheck {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("id", &self.id)
            .set_string("name", &self.name)
            .set("activated", self.activated)
            .set("muted", self.muted)
            .set_string_set("tags", &self.tags)
            .write_block("alert_settings", self.alert_settings.as_ref())
            .set("use_global_alert_settings", self.use_global_alert_settings)
            .write_blocks("alert_channel_subscription", &self.alert_channel_subscriptions)
            .write_block("heartbeat", Some(&self.heartbeat))
    }
}
