//! `checkly_alert_channel`
//!
//! A channel is configured through exactly one of the `email`, `slack`,
//! `sms`, `call`, `webhook`, `opsgenie` or `pagerduty` blocks. The block that
//! is set picks the channel type; the others must stay empty.

use serde_json::json;

use super::check::HTTP_METHODS;
use super::common::{numeric_id, numeric_id_value};
use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::common::{map_from_pairs, pairs_from_map};
use crate::models::{
    AlertChannel, AlertChannelConfig, EmailConfig, OpsgenieConfig, PagerdutyConfig, PhoneConfig,
    SlackConfig, WebhookConfig,
};
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema, Validator};

/// Channel blocks in the order they are checked.
pub const CHANNEL_BLOCKS: [&str; 7] =
    ["email", "slack", "sms", "call", "webhook", "opsgenie", "pagerduty"];

const OPSGENIE_REGIONS: [&str; 2] = ["EU", "US"];
const OPSGENIE_PRIORITIES: [&str; 5] = ["P1", "P2", "P3", "P4", "P5"];
const WEBHOOK_TYPES: [&str; 7] = [
    "WEBHOOK_DISCORD",
    "WEBHOOK_FIREHYDRANT",
    "WEBHOOK_GITLAB_ALERT",
    "WEBHOOK_SPIKESH",
    "WEBHOOK_SPLUNK",
    "WEBHOOK_MSTEAMS",
    "WEBHOOK_TELEGRAM",
];

fn channel_block(block: Block) -> NestedBlock {
    NestedBlock::at_most_one(block)
}

fn phone_block() -> Block {
    Block::new()
        .with_attribute("name", Attribute::required_string())
        .with_attribute(
            "number",
            Attribute::required_string().with_description("The mobile number in E.164 format."),
        )
}

fn channel_blocks(schema: Schema) -> Schema {
    schema
        .with_block(
            "email",
            channel_block(Block::new().with_attribute(
                "address",
                Attribute::required_string().with_description("The email address of this channel."),
            )),
        )
        .with_block(
            "slack",
            channel_block(
                Block::new()
                    .with_attribute(
                        "url",
                        Attribute::required_string()
                            .with_validator(Validator::Url)
                            .with_description("The Slack webhook URL."),
                    )
                    .with_attribute("channel", Attribute::required_string()),
            ),
        )
        .with_block("sms", channel_block(phone_block()))
        .with_block("call", channel_block(phone_block()))
        .with_block(
            "webhook",
            channel_block(
                Block::new()
                    .with_attribute("name", Attribute::required_string())
                    .with_attribute("url", Attribute::required_string().with_validator(Validator::Url))
                    .with_attribute(
                        "method",
                        Attribute::optional_string()
                            .with_default(json!("POST"))
                            .with_validator(Validator::one_of(HTTP_METHODS)),
                    )
                    .with_attribute("headers", Attribute::optional_string_map())
                    .with_attribute("query_parameters", Attribute::optional_string_map())
                    .with_attribute("template", Attribute::optional_string())
                    .with_attribute("webhook_secret", Attribute::optional_string().sensitive())
                    .with_attribute(
                        "webhook_type",
                        Attribute::optional_string()
                            .with_validator(Validator::one_of(WEBHOOK_TYPES))
                            .with_description("Integration preset the webhook template follows."),
                    ),
            ),
        )
        .with_block(
            "opsgenie",
            channel_block(
                Block::new()
                    .with_attribute("name", Attribute::required_string())
                    .with_attribute("api_key", Attribute::required_string().sensitive())
                    .with_attribute(
                        "region",
                        Attribute::required_string().with_validator(Validator::one_of(OPSGENIE_REGIONS)),
                    )
                    .with_attribute(
                        "priority",
                        Attribute::required_string()
                            .with_validator(Validator::one_of(OPSGENIE_PRIORITIES)),
                    ),
            ),
        )
        .with_block(
            "pagerduty",
            channel_block(
                Block::new()
                    .with_attribute("account", Attribute::optional_string())
                    .with_attribute("service_key", Attribute::required_string().sensitive())
                    .with_attribute("service_name", Attribute::optional_string()),
            ),
        )
}

impl ResourceModel for AlertChannel {
    const TYPE_NAME: &'static str = "checkly_alert_channel";

    fn schema() -> Schema {
        let schema = Schema::v0()
            .with_description("Alert channels deliver notifications when checks fail or recover.")
            .with_id()
            .with_attribute(
                "send_recovery",
                Attribute::optional_bool().with_default(json!(true)),
            )
            .with_attribute("send_failure", Attribute::optional_bool().with_default(json!(true)))
            .with_attribute(
                "send_degraded",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute(
                "ssl_expiry",
                Attribute::optional_bool()
                    .with_default(json!(false))
                    .with_description("Notify about expiring SSL certificates."),
            )
            .with_attribute(
                "ssl_expiry_threshold",
                Attribute::optional_int64()
                    .with_default(json!(AlertChannel::DEFAULT_SSL_EXPIRY_THRESHOLD))
                    .with_validator(Validator::int_range(1, 30))
                    .with_description("Days before certificate expiry to notify."),
            );
        channel_blocks(schema)
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        let set: Vec<&str> = CHANNEL_BLOCKS
            .iter()
            .copied()
            .filter(|name| config.is_set(name))
            .collect();
        match set.as_slice() {
            [_] => Vec::new(),
            [] => vec![Diagnostic::error("An alert channel needs a channel block")
                .with_detail(format!("Set exactly one of: {}.", CHANNEL_BLOCKS.join(", ")))],
            several => vec![Diagnostic::error("Conflicting alert channel blocks").with_detail(
                format!("Only one channel block may be set, got: {}.", several.join(", ")),
            )],
        }
    }
}

fn read_phone(block: &Attributes<'_>) -> Result<PhoneConfig, ProviderError> {
    Ok(PhoneConfig {
        name: block.string("name")?,
        number: block.string("number")?,
    })
}

fn read_config(attrs: &Attributes<'_>) -> Result<AlertChannelConfig, ProviderError> {
    if let Some(block) = attrs.block("email")? {
        return Ok(AlertChannelConfig::Email(EmailConfig {
            address: block.string("address")?,
        }));
    }
    if let Some(block) = attrs.block("slack")? {
        return Ok(AlertChannelConfig::Slack(SlackConfig {
            url: block.string("url")?,
            channel: block.string("channel")?,
        }));
    }
    if let Some(block) = attrs.block("sms")? {
        return Ok(AlertChannelConfig::Sms(read_phone(&block)?));
    }
    if let Some(block) = attrs.block("call")? {
        return Ok(AlertChannelConfig::Call(read_phone(&block)?));
    }
    if let Some(block) = attrs.block("webhook")? {
        let defaults = WebhookConfig::default();
        return Ok(AlertChannelConfig::Webhook(WebhookConfig {
            name: block.string("name")?,
            url: block.string("url")?,
            method: block.opt_string("method")?.unwrap_or(defaults.method),
            headers: pairs_from_map(&block.string_map("headers")?),
            query_parameters: pairs_from_map(&block.string_map("query_parameters")?),
            template: block.string("template")?,
            webhook_secret: block.string("webhook_secret")?,
            webhook_type: block.string("webhook_type")?,
        }));
    }
    if let Some(block) = attrs.block("opsgenie")? {
        return Ok(AlertChannelConfig::Opsgenie(OpsgenieConfig {
            name: block.string("name")?,
            api_key: block.string("api_key")?,
            region: block.string("region")?,
            priority: block.string("priority")?,
        }));
    }
    if let Some(block) = attrs.block("pagerduty")? {
        return Ok(AlertChannelConfig::Pagerduty(PagerdutyConfig {
            account: block.string("account")?,
            service_key: block.string("service_key")?,
            service_name: block.string("service_name")?,
        }));
    }
    Err(ProviderError::Validation(format!(
        "alert channel has none of the blocks {}",
        CHANNEL_BLOCKS.join(", ")
    )))
}

fn write_phone(config: &PhoneConfig) -> AttributeWriter {
    AttributeWriter::new()
        .set_string("name", &config.name)
        .set_string("number", &config.number)
}

fn write_config(writer: AttributeWriter, config: &AlertChannelConfig) -> AttributeWriter {
    let (name, block) = match config {
        AlertChannelConfig::Email(c) => ("email", AttributeWriter::new().set_string("address", &c.address)),
        AlertChannelConfig::Slack(c) => (
            "slack",
            AttributeWriter::new()
                .set_string("url", &c.url)
                .set_string("channel", &c.channel),
        ),
        AlertChannelConfig::Sms(c) => ("sms", write_phone(c)),
        AlertChannelConfig::Call(c) => ("call", write_phone(c)),
        AlertChannelConfig::Webhook(c) => (
            "webhook",
            AttributeWriter::new()
                .set_string("name", &c.name)
                .set_string("url", &c.url)
                .set_string("method", &c.method)
                .set_string_map("headers", &map_from_pairs(&c.headers))
                .set_string_map("query_parameters", &map_from_pairs(&c.query_parameters))
                .set_string("template", &c.template)
                .set_string("webhook_secret", &c.webhook_secret)
                .set_string("webhook_type", &c.webhook_type),
        ),
        AlertChannelConfig::Opsgenie(c) => (
            "opsgenie",
            AttributeWriter::new()
                .set_string("name", &c.name)
                .set_string("api_key", &c.api_key)
                .set_string("region", &c.region)
                .set_string("priority", &c.priority),
        ),
        AlertChannelConfig::Pagerduty(c) => (
            "pagerduty",
            AttributeWriter::new()
                .set_string("account", &c.account)
                .set_string("service_key", &c.service_key)
                .set_string("service_name", &c.service_name),
        ),
    };

    CHANNEL_BLOCKS.iter().fold(writer, |writer, channel| {
        let item = (*channel == name).then(|| block.clone());
        writer.set_block(channel, item)
    })
}

impl FromAttributes for AlertChannel {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = AlertChannel::default();
        Ok(Self {
            id: numeric_id(attrs)?,
            config: read_config(attrs)?,
            send_recovery: attrs.opt_bool("send_recovery")?.unwrap_or(defaults.send_recovery),
            send_failure: attrs.opt_bool("send_failure")?.unwrap_or(defaults.send_failure),
            send_degraded: attrs.bool("send_degraded")?,
            ssl_expiry: attrs.bool("ssl_expiry")?,
            ssl_expiry_threshold: attrs
                .opt_int("ssl_expiry_threshold")?
                .unwrap_or(defaults.ssl_expiry_threshold),
        })
    }
}

impl ToAttributes for AlertChannel {
    fn to_attributes(&self) -> AttributeWriter {
        let writer = AttributeWriter::new()
            .set_opt_string("id", numeric_id_value(self.id).as_deref())
            .set("send_recovery", self.send_recovery)
            .set("send_failure", self.send_failure)
            .set("send_degraded", self.send_degraded)
            .set("ssl_expiry", self.ssl_expiry)
            .set("ssl_expiry_threshold", self.ssl_expiry_threshold);
        write_config(writer, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::round_trip;
    use crate::models::KeyValue;
    use crate::plan::plan;
    use crate::validation::validate;

    fn channels() -> Vec<AlertChannel> {
        let configs = vec![
            AlertChannelConfig::Email(EmailConfig {
                address: "ops@example.com".into(),
            }),
            AlertChannelConfig::Slack(SlackConfig {
                url: "https://hooks.slack.com/services/x".into(),
                channel: "#alerts".into(),
            }),
            AlertChannelConfig::Sms(PhoneConfig {
                name: "oncall".into(),
                number: "+31612345678".into(),
            }),
            AlertChannelConfig::Call(PhoneConfig {
                name: "oncall".into(),
                number: "+31612345678".into(),
            }),
            AlertChannelConfig::Webhook(WebhookConfig {
                name: "hook".into(),
                url: "https://example.com/hook".into(),
                method: "PUT".into(),
                headers: vec![KeyValue::new("X-A", "1"), KeyValue::new("X-B", "2")],
                template: "{\"check\": \"{{CHECK_NAME}}\"}".into(),
                webhook_type: "WEBHOOK_MSTEAMS".into(),
                ..Default::default()
            }),
            AlertChannelConfig::Opsgenie(OpsgenieConfig {
                name: "genie".into(),
                api_key: "key".into(),
                region: "EU".into(),
                priority: "P2".into(),
            }),
            AlertChannelConfig::Pagerduty(PagerdutyConfig {
                service_key: "svc".into(),
                ..Default::default()
            }),
        ];
        configs
            .into_iter()
            .enumerate()
            .map(|(i, config)| AlertChannel {
                id: i as i64 + 1,
                config,
                ssl_expiry: true,
                ssl_expiry_threshold: 14,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_round_trip_every_channel_type() {
        for channel in channels() {
            assert_eq!(round_trip(&channel), channel, "{}", channel.config.kind());
        }
    }

    #[test]
    fn test_only_selected_block_written() {
        let state = channels()[1].to_attributes().finish();
        assert_eq!(state["slack"][0]["channel"], "#alerts");
        for name in ["email", "sms", "call", "webhook", "opsgenie", "pagerduty"] {
            assert_eq!(state[name], json!([]), "{}", name);
        }
    }

    #[test]
    fn test_state_validates_and_plans_clean() {
        for channel in channels() {
            let state = channel.to_attributes().finish();
            assert!(validate(&AlertChannel::schema(), &state).is_empty());
            assert!(AlertChannel::validate(&Attributes::new(&state).unwrap()).is_empty());
            assert!(!plan(&AlertChannel::schema(), Some(&state), &state).has_changes());
        }
    }

    #[test]
    fn test_exactly_one_channel_block() {
        let none = json!({"send_recovery": true});
        let diags = AlertChannel::validate(&Attributes::new(&none).unwrap());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());

        let both = json!({
            "email": [{"address": "a@example.com"}],
            "sms": [{"name": "n", "number": "+1"}]
        });
        let diags = AlertChannel::validate(&Attributes::new(&both).unwrap());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.as_deref().unwrap_or_default().contains("email, sms"));

        let empty_block = json!({"email": [{"address": "a@example.com"}], "sms": []});
        assert!(AlertChannel::validate(&Attributes::new(&empty_block).unwrap()).is_empty());
    }

    #[test]
    fn test_missing_channel_block_is_read_error() {
        let config = json!({"send_recovery": true});
        assert!(AlertChannel::from_attributes(&Attributes::new(&config).unwrap()).is_err());
    }

    #[test]
    fn test_ssl_expiry_threshold_range() {
        let config = json!({"email": [{"address": "a@example.com"}], "ssl_expiry_threshold": 31});
        let diags = validate(&AlertChannel::schema(), &config);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("ssl_expiry_threshold"));
    }

    #[test]
    fn test_sparse_webhook_reads_default_method() {
        let config = json!({"webhook": [{"name": "h", "url": "https://example.com"}]});
        let channel = AlertChannel::from_attributes(&Attributes::new(&config).unwrap()).unwrap();
        match channel.config {
            AlertChannelConfig::Webhook(hook) => assert_eq!(hook.method, "POST"),
            other => panic!("unexpected config {:?}", other),
        }
        assert!(channel.send_failure);
    }
}
