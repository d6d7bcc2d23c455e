//! Alert channels.
//!
//! On the wire a channel is `{"type": "SLACK", "config": {...}, ...}` where the
//! shape of `config` depends on `type`. [`AlertChannelConfig`] holds exactly
//! one of those shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{is_zero, nullable, KeyValue};
use crate::client::Endpoint;

/// Delivery by email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailConfig {
    /// Recipient address.
    #[serde(deserialize_with = "nullable")]
    pub address: String,
}

/// Delivery to a Slack incoming webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackConfig {
    /// Incoming webhook URL.
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    /// Channel override, e.g. `#ops`.
    #[serde(deserialize_with = "nullable")]
    pub channel: String,
}

/// Used for both SMS and phone call channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhoneConfig {
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Phone number in E.164 format.
    #[serde(deserialize_with = "nullable")]
    pub number: String,
}

/// Delivery by HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookConfig {
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Target URL.
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    /// Request method, `POST` unless set.
    #[serde(deserialize_with = "nullable")]
    pub method: String,
    /// Extra request headers.
    #[serde(deserialize_with = "nullable")]
    pub headers: Vec<KeyValue>,
    /// Extra query parameters.
    #[serde(deserialize_with = "nullable")]
    pub query_parameters: Vec<KeyValue>,
    /// Request body template.
    #[serde(deserialize_with = "nullable")]
    pub template: String,
    /// Secret used to sign the request.
    #[serde(deserialize_with = "nullable")]
    pub webhook_secret: String,
    /// Integration preset, e.g. `WEBHOOK_MSTEAMS`.
    #[serde(deserialize_with = "nullable")]
    pub webhook_type: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            method: "POST".to_string(),
            headers: Vec::new(),
            query_parameters: Vec::new(),
            template: String::new(),
            webhook_secret: String::new(),
            webhook_type: String::new(),
        }
    }
}

/// Delivery to Opsgenie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpsgenieConfig {
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Opsgenie API key.
    #[serde(deserialize_with = "nullable")]
    pub api_key: String,
    /// Opsgenie region, `US` or `EU`.
    #[serde(deserialize_with = "nullable")]
    pub region: String,
    /// Alert priority, `P1` to `P5`.
    #[serde(deserialize_with = "nullable")]
    pub priority: String,
}

/// Delivery to PagerDuty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagerdutyConfig {
    /// PagerDuty account name.
    #[serde(deserialize_with = "nullable")]
    pub account: String,
    /// Integration key of the service.
    #[serde(deserialize_with = "nullable")]
    pub service_key: String,
    /// Name of the service.
    #[serde(deserialize_with = "nullable")]
    pub service_name: String,
}

/// Where an alert channel delivers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertChannelConfig {
    /// `EMAIL`
    Email(EmailConfig),
    /// `SLACK`
    Slack(SlackConfig),
    /// `SMS`
    Sms(PhoneConfig),
    /// `CALL`
    Call(PhoneConfig),
    /// `WEBHOOK`
    Webhook(WebhookConfig),
    /// `OPSGENIE`
    Opsgenie(OpsgenieConfig),
    /// `PAGERDUTY`
    Pagerduty(PagerdutyConfig),
}

impl AlertChannelConfig {
    /// The wire discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Email(_) => "EMAIL",
            Self::Slack(_) => "SLACK",
            Self::Sms(_) => "SMS",
            Self::Call(_) => "CALL",
            Self::Webhook(_) => "WEBHOOK",
            Self::Opsgenie(_) => "OPSGENIE",
            Self::Pagerduty(_) => "PAGERDUTY",
        }
    }

    fn to_config(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Email(c) => serde_json::to_value(c),
            Self::Slack(c) => serde_json::to_value(c),
            Self::Sms(c) | Self::Call(c) => serde_json::to_value(c),
            Self::Webhook(c) => serde_json::to_value(c),
            Self::Opsgenie(c) => serde_json::to_value(c),
            Self::Pagerduty(c) => serde_json::to_value(c),
        }
    }

    fn from_config(kind: &str, config: Value) -> Result<Self, String> {
        let config = if config.is_null() {
            Value::Object(Default::default())
        } else {
            config
        };
        let decoded = match kind {
            "EMAIL" => serde_json::from_value(config).map(Self::Email),
            "SLACK" => serde_json::from_value(config).map(Self::Slack),
            "SMS" => serde_json::from_value(config).map(Self::Sms),
            "CALL" => serde_json::from_value(config).map(Self::Call),
            "WEBHOOK" => serde_json::from_value(config).map(Self::Webhook),
            "OPSGENIE" => serde_json::from_value(config).map(Self::Opsgenie),
            "PAGERDUTY" => serde_json::from_value(config).map(Self::Pagerduty),
            other => return Err(format!("unknown alert channel type '{}'", other)),
        };
        decoded.map_err(|e| format!("invalid {} config: {}", kind, e))
    }
}

impl Default for AlertChannelConfig {
    fn default() -> Self {
        Self::Email(EmailConfig::default())
    }
}

/// An alert channel and when it is notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AlertChannelWire", into = "AlertChannelWire")]
pub struct AlertChannel {
    /// Assigned by the API; `0` until created.
    pub id: i64,
    /// Channel type and its settings.
    pub config: AlertChannelConfig,
    /// Notify when a check recovers.
    pub send_recovery: bool,
    /// Notify when a check fails.
    pub send_failure: bool,
    /// Notify when a check degrades.
    pub send_degraded: bool,
    /// Notify about expiring certificates.
    pub ssl_expiry: bool,
    /// Days before expiry to notify.
    pub ssl_expiry_threshold: i64,
}

impl AlertChannel {
    /// Days before certificate expiry, unless configured.
    pub const DEFAULT_SSL_EXPIRY_THRESHOLD: i64 = 30;
}

impl Default for AlertChannel {
    fn default() -> Self {
        Self {
            id: 0,
            config: AlertChannelConfig::default(),
            send_recovery: true,
            send_failure: true,
            send_degraded: false,
            ssl_expiry: false,
            ssl_expiry_threshold: Self::DEFAULT_SSL_EXPIRY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AlertChannelWire {
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "nullable")]
    id: i64,
    #[serde(rename = "type", deserialize_with = "nullable")]
    kind: String,
    config: Value,
    #[serde(deserialize_with = "nullable")]
    send_recovery: bool,
    #[serde(deserialize_with = "nullable")]
    send_failure: bool,
    #[serde(deserialize_with = "nullable")]
    send_degraded: bool,
    #[serde(deserialize_with = "nullable")]
    ssl_expiry: bool,
    #[serde(deserialize_with = "nullable")]
    ssl_expiry_threshold: i64,
}

impl Default for AlertChannelWire {
    fn default() -> Self {
        let channel = AlertChannel::default();
        Self {
            id: 0,
            kind: String::new(),
            config: Value::Null,
            send_recovery: channel.send_recovery,
            send_failure: channel.send_failure,
            send_degraded: channel.send_degraded,
            ssl_expiry: channel.ssl_expiry,
            ssl_expiry_threshold: channel.ssl_expiry_threshold,
        }
    }
}

impl TryFrom<AlertChannelWire> for AlertChannel {
    type Error = String;

    fn try_from(wire: AlertChannelWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            config: AlertChannelConfig::from_config(&wire.kind, wire.config)?,
            send_recovery: wire.send_recovery,
            send_failure: wire.send_failure,
            send_degraded: wire.send_degraded,
            ssl_expiry: wire.ssl_expiry,
            ssl_expiry_threshold: wire.ssl_expiry_threshold,
        })
    }
}

impl From<AlertChannel> for AlertChannelWire {
    fn from(channel: AlertChannel) -> Self {
        Self {
            id: channel.id,
            kind: channel.config.kind().to_string(),
            // Config structs only hold strings and lists; encoding cannot fail.
            config: channel.config.to_config().unwrap_or(Value::Null),
            send_recovery: channel.send_recovery,
            send_failure: channel.send_failure,
            send_degraded: channel.send_degraded,
            ssl_expiry: channel.ssl_expiry,
            ssl_expiry_threshold: channel.ssl_expiry_threshold,
        }
    }
}

impl Endpoint for AlertChannel {
    const COLLECTION: &'static str = "/v1/alert-channels";

    fn remote_id(&self) -> Option<String> {
        (self.id != 0).then(|| self.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_slack() {
        let channel: AlertChannel = serde_json::from_value(json!({
            "id": 12,
            "type": "SLACK",
            "config": {"url": "https://hooks.slack.com/x", "channel": "#alerts"},
            "sendRecovery": false,
            "sendFailure": true,
            "sendDegraded": true,
            "sslExpiry": true,
            "sslExpiryThreshold": 14
        }))
        .unwrap();

        assert_eq!(channel.id, 12);
        assert_eq!(
            channel.config,
            AlertChannelConfig::Slack(SlackConfig {
                url: "https://hooks.slack.com/x".into(),
                channel: "#alerts".into(),
            })
        );
        assert!(!channel.send_recovery);
        assert_eq!(channel.ssl_expiry_threshold, 14);
    }

    #[test]
    fn test_encode_webhook() {
        let channel = AlertChannel {
            config: AlertChannelConfig::Webhook(WebhookConfig {
                name: "hook".into(),
                url: "https://example.com/hook".into(),
                headers: vec![KeyValue::new("X-Token", "t")],
                ..Default::default()
            }),
            ..Default::default()
        };

        let wire = serde_json::to_value(&channel).unwrap();
        assert!(wire.get("id").is_none());
        assert_eq!(wire["type"], "WEBHOOK");
        assert_eq!(wire["config"]["method"], "POST");
        assert_eq!(wire["config"]["headers"][0]["key"], "X-Token");
        assert_eq!(wire["sslExpiryThreshold"], 30);
    }

    #[test]
    fn test_sms_and_call_share_config_shape() {
        let sms: AlertChannel = serde_json::from_value(json!({
            "type": "SMS",
            "config": {"name": "oncall", "number": "+3112345678"}
        }))
        .unwrap();
        let call: AlertChannel = serde_json::from_value(json!({
            "type": "CALL",
            "config": {"name": "oncall", "number": "+3112345678"}
        }))
        .unwrap();

        assert_eq!(sms.config.kind(), "SMS");
        assert_eq!(call.config.kind(), "CALL");
        assert!(sms.send_recovery);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<AlertChannel, _> =
            serde_json::from_value(json!({"type": "PIGEON", "config": {}}));
        assert!(result.is_err());
    }
}
