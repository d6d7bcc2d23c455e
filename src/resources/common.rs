//! Schema fragments and attribute conversions shared by several resources.

use serde_json::json;

use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::{
    AlertChannelSubscription, AlertSettings, Assertion, BasicAuth, EnvironmentVariable,
    Escalation, ParallelRunFailureThreshold, Reminders, RetryStrategy,
};
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema, Validator};

/// Assertion comparisons the API understands.
pub const COMPARISONS: [&str; 14] = [
    "EQUALS",
    "NOT_EQUALS",
    "HAS_KEY",
    "NOT_HAS_KEY",
    "HAS_VALUE",
    "NOT_HAS_VALUE",
    "IS_EMPTY",
    "NOT_EMPTY",
    "GREATER_THAN",
    "LESS_THAN",
    "CONTAINS",
    "NOT_CONTAINS",
    "IS_NULL",
    "NOT_NULL",
];

/// Address families for requests and static IPs.
pub const IP_FAMILIES: [&str; 2] = ["IPv4", "IPv6"];

/// Read the `id` attribute as a numeric id; unset reads as `0`.
pub fn numeric_id(attrs: &Attributes<'_>) -> Result<i64, ProviderError> {
    match attrs.opt_string("id")? {
        None => Ok(0),
        Some(id) => id.parse().map_err(|_| {
            ProviderError::Validation(format!("attribute 'id': '{}' is not a numeric id", id))
        }),
    }
}

/// Write a numeric id; `0` is written as `null`.
pub fn numeric_id_value(id: i64) -> Option<String> {
    (id != 0).then(|| id.to_string())
}

/// An optional integer reference where `0` means unset.
pub fn opt_ref(attrs: &Attributes<'_>, name: &str) -> Result<Option<i64>, ProviderError> {
    Ok(attrs.opt_int(name)?.filter(|v| *v != 0))
}

// Alert settings

/// The `alert_settings` block: escalation, reminders and the parallel
/// run failure threshold.
pub fn alert_settings_block() -> NestedBlock {
    let run_based = Block::new().with_attribute(
        "failed_run_threshold",
        Attribute::optional_int64()
            .with_default(json!(Escalation::DEFAULT_FAILED_RUN_THRESHOLD))
            .with_validator(Validator::one_of_int([1, 2, 3, 4, 5]))
            .with_description("Consecutive failed runs before an alert is sent."),
    );
    let time_based = Block::new().with_attribute(
        "minutes_failing_threshold",
        Attribute::optional_int64()
            .with_default(json!(Escalation::DEFAULT_MINUTES_FAILING_THRESHOLD))
            .with_validator(Validator::one_of_int([5, 10, 15, 30]))
            .with_description("Minutes a check must be failing before an alert is sent."),
    );
    let reminders = Block::new()
        .with_attribute(
            "amount",
            Attribute::optional_int64()
                .with_default(json!(0))
                .with_validator(Validator::one_of_int([0, 1, 2, 3, 4, 5, 100000])),
        )
        .with_attribute(
            "interval",
            Attribute::optional_int64()
                .with_default(json!(5))
                .with_validator(Validator::one_of_int([5, 10, 15, 30])),
        );
    let parallel = Block::new()
        .with_attribute(
            "enabled",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "percentage",
            Attribute::optional_int64()
                .with_default(json!(10))
                .with_validator(Validator::one_of_int((1..=10).map(|p| p * 10))),
        );

    NestedBlock::at_most_one(
        Block::new()
            .with_attribute(
                "escalation_type",
                Attribute::optional_string()
                    .with_default(json!(Escalation::RUN_BASED))
                    .with_validator(Validator::one_of([Escalation::RUN_BASED, Escalation::TIME_BASED]))
                    .with_description("Determines what type of escalation to use."),
            )
            .with_block(
                "run_based_escalation",
                NestedBlock::at_most_one(run_based).computed(),
            )
            .with_block(
                "time_based_escalation",
                NestedBlock::at_most_one(time_based).computed(),
            )
            .with_block("reminders", NestedBlock::at_most_one(reminders).computed())
            .with_block(
                "parallel_run_failure_threshold",
                NestedBlock::at_most_one(parallel).computed(),
            ),
    )
    .computed()
}

impl FromAttributes for AlertSettings {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let failed_run_threshold = match attrs.block("run_based_escalation")? {
            Some(block) => block.opt_int("failed_run_threshold")?,
            None => None,
        };
        let minutes_failing_threshold = match attrs.block("time_based_escalation")? {
            Some(block) => block.opt_int("minutes_failing_threshold")?,
            None => None,
        };
        let escalation = Escalation::from_parts(
            &attrs.string("escalation_type")?,
            failed_run_threshold,
            minutes_failing_threshold,
        )
        .map_err(ProviderError::Validation)?;

        let defaults = Reminders::default();
        let reminders = match attrs.block("reminders")? {
            Some(block) => Reminders {
                amount: block.opt_int("amount")?.unwrap_or(defaults.amount),
                interval: block.opt_int("interval")?.unwrap_or(defaults.interval),
            },
            None => defaults,
        };

        let defaults = ParallelRunFailureThreshold::default();
        let parallel_run_failure_threshold = match attrs.block("parallel_run_failure_threshold")? {
            Some(block) => ParallelRunFailureThreshold {
                enabled: block.opt_bool("enabled")?.unwrap_or(defaults.enabled),
                percentage: block.opt_int("percentage")?.unwrap_or(defaults.percentage),
            },
            None => defaults,
        };

        Ok(Self {
            escalation,
            reminders,
            parallel_run_failure_threshold,
        })
    }
}

impl ToAttributes for AlertSettings {
    fn to_attributes(&self) -> AttributeWriter {
        let (run_based, time_based) = match self.escalation {
            Escalation::RunBased {
                failed_run_threshold,
            } => (
                Some(AttributeWriter::new().set("failed_run_threshold", failed_run_threshold)),
                None,
            ),
            Escalation::TimeBased {
                minutes_failing_threshold,
            } => (
                None,
                Some(
                    AttributeWriter::new()
                        .set("minutes_failing_threshold", minutes_failing_threshold),
                ),
            ),
        };
        AttributeWriter::new()
            .set("escalation_type", self.escalation.kind())
            .set_block("run_based_escalation", run_based)
            .set_block("time_based_escalation", time_based)
            .set_block(
                "reminders",
                Some(
                    AttributeWriter::new()
                        .set("amount", self.reminders.amount)
                        .set("interval", self.reminders.interval),
                ),
            )
            .set_block(
                "parallel_run_failure_threshold",
                Some(
                    AttributeWriter::new()
                        .set("enabled", self.parallel_run_failure_threshold.enabled)
                        .set("percentage", self.parallel_run_failure_threshold.percentage),
                ),
            )
    }
}

/// Rejects an escalation block that does not match `escalation_type`.
pub fn validate_alert_settings(config: &Attributes<'_>) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let Ok(blocks) = config.blocks("alert_settings") else {
        return diags;
    };
    for settings in blocks {
        let kind = settings
            .opt_string("escalation_type")
            .ok()
            .flatten()
            .unwrap_or_else(|| Escalation::RUN_BASED.to_string());
        let unused = if kind == Escalation::TIME_BASED {
            "run_based_escalation"
        } else {
            "time_based_escalation"
        };
        if settings.is_set(unused) {
            diags.push(
                Diagnostic::error(format!(
                    "{} is not used with escalation_type {}",
                    unused, kind
                ))
                .with_attribute(format!("{}.{}", settings.path(), unused)),
            );
        }
    }
    diags
}

// Alert channel subscriptions

/// Alert channels a check or group notifies.
pub fn alert_channel_subscription_block() -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_attribute(
                "channel_id",
                Attribute::required_int64().with_description("The id of the alert channel."),
            )
            .with_attribute("activated", Attribute::required_bool()),
    )
}

impl FromAttributes for AlertChannelSubscription {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            alert_channel_id: attrs.int("channel_id")?,
            activated: attrs.bool("activated")?,
        })
    }
}

impl ToAttributes for AlertChannelSubscription {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set("channel_id", self.alert_channel_id)
            .set("activated", self.activated)
    }
}

/// Add the alerting attributes every check-like resource carries.
pub fn with_alerting(schema: Schema) -> Schema {
    schema
        .with_block("alert_settings", alert_settings_block())
        .with_attribute(
            "use_global_alert_settings",
            Attribute::optional_bool()
                .with_default(json!(false))
                .with_description("When true, the account level alert settings are used."),
        )
        .with_block("alert_channel_subscription", alert_channel_subscription_block())
}

// Retry strategy

/// The `retry_strategy` block. Computed, since the API fills a default.
pub fn retry_strategy_block() -> NestedBlock {
    NestedBlock::at_most_one(
        Block::new()
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_validator(Validator::one_of(RetryStrategy::TYPES))
                    .with_description("Determines which type of retry strategy to use."),
            )
            .with_attribute(
                "base_backoff_seconds",
                Attribute::optional_int64()
                    .with_default(json!(RetryStrategy::DEFAULT_BASE_BACKOFF_SECONDS)),
            )
            .with_attribute(
                "max_retries",
                Attribute::optional_int64()
                    .with_default(json!(RetryStrategy::DEFAULT_MAX_RETRIES))
                    .with_validator(Validator::int_range(1, 10)),
            )
            .with_attribute(
                "max_duration_seconds",
                Attribute::optional_int64()
                    .with_default(json!(RetryStrategy::DEFAULT_MAX_DURATION_SECONDS))
                    .with_validator(Validator::int_range(0, 600)),
            )
            .with_attribute(
                "same_region",
                Attribute::optional_bool().with_default(json!(RetryStrategy::DEFAULT_SAME_REGION)),
            ),
    )
    .computed()
}

impl FromAttributes for RetryStrategy {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Self::from_parts(
            &attrs.string("type")?,
            attrs
                .opt_int("base_backoff_seconds")?
                .unwrap_or(Self::DEFAULT_BASE_BACKOFF_SECONDS),
            attrs
                .opt_int("max_retries")?
                .unwrap_or(Self::DEFAULT_MAX_RETRIES),
            attrs
                .opt_int("max_duration_seconds")?
                .unwrap_or(Self::DEFAULT_MAX_DURATION_SECONDS),
            attrs
                .opt_bool("same_region")?
                .unwrap_or(Self::DEFAULT_SAME_REGION),
        )
        .map_err(ProviderError::Validation)
    }
}

impl ToAttributes for RetryStrategy {
    fn to_attributes(&self) -> AttributeWriter {
        let (base_backoff_seconds, max_retries, max_duration_seconds, same_region) = self.flat();
        AttributeWriter::new()
            .set("type", self.kind())
            .set("base_backoff_seconds", base_backoff_seconds)
            .set("max_retries", max_retries)
            .set("max_duration_seconds", max_duration_seconds)
            .set("same_region", same_region)
    }
}

/// Fields a retry strategy type ignores may only hold their defaults.
pub fn validate_retry_strategy(config: &Attributes<'_>) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let Ok(Some(strategy)) = config.block("retry_strategy") else {
        return diags;
    };
    let kind = strategy.opt_string("type").ok().flatten().unwrap_or_default();
    let ignored: &[(&str, i64)] = match kind.as_str() {
        "NO_RETRIES" => &[
            ("base_backoff_seconds", RetryStrategy::DEFAULT_BASE_BACKOFF_SECONDS),
            ("max_retries", RetryStrategy::DEFAULT_MAX_RETRIES),
            ("max_duration_seconds", RetryStrategy::DEFAULT_MAX_DURATION_SECONDS),
        ],
        "SINGLE_RETRY" => &[
            ("max_retries", RetryStrategy::DEFAULT_MAX_RETRIES),
            ("max_duration_seconds", RetryStrategy::DEFAULT_MAX_DURATION_SECONDS),
        ],
        _ => &[],
    };
    for (name, default) in ignored {
        if let Ok(Some(value)) = strategy.opt_int(name) {
            if value != *default {
                diags.push(
                    Diagnostic::error(format!("{} is not used by retry strategy {}", name, kind))
                        .with_attribute(format!("{}.{}", strategy.path(), name)),
                );
            }
        }
    }
    if kind == "NO_RETRIES" {
        if let Ok(Some(false)) = strategy.opt_bool("same_region") {
            diags.push(
                Diagnostic::error("same_region is not used by retry strategy NO_RETRIES")
                    .with_attribute(format!("{}.same_region", strategy.path())),
            );
        }
    }
    diags
}

// Environment variables

/// Inline `environment_variable` blocks of checks and groups.
pub fn environment_variable_block() -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_attribute("key", Attribute::required_string())
            .with_attribute("value", Attribute::required_string())
            .with_attribute("locked", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute("secret", Attribute::optional_bool().with_default(json!(false))),
    )
}

impl FromAttributes for EnvironmentVariable {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            key: attrs.string("key")?,
            value: attrs.string("value")?,
            locked: attrs.bool("locked")?,
            secret: attrs.bool("secret")?,
        })
    }
}

impl ToAttributes for EnvironmentVariable {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set("key", self.key.as_str())
            .set("value", self.value.as_str())
            .set("locked", self.locked)
            .set("secret", self.secret)
    }
}

/// Secret values come back masked; keep the ones the provider knows, by key.
pub fn preserve_secret_values(current: &mut [EnvironmentVariable], known: &[EnvironmentVariable]) {
    for var in current.iter_mut().filter(|v| v.secret) {
        if let Some(previous) = known.iter().find(|k| k.key == var.key) {
            var.value = previous.value.clone();
        }
    }
}

// Assertions

/// An assertion block accepting the given sources.
pub fn assertion_block(sources: &[&str]) -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_attribute(
                "source",
                Attribute::required_string().with_validator(Validator::one_of(sources.iter().copied())),
            )
            .with_attribute("property", Attribute::optional_string())
            .with_attribute(
                "comparison",
                Attribute::required_string().with_validator(Validator::one_of(COMPARISONS)),
            )
            .with_attribute("target", Attribute::optional_string()),
    )
}

impl FromAttributes for Assertion {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            source: attrs.string("source")?,
            property: attrs.string("property")?,
            comparison: attrs.string("comparison")?,
            target: attrs.string("target")?,
        })
    }
}

impl ToAttributes for Assertion {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("source", &self.source)
            .set_string("property", &self.property)
            .set_string("comparison", &self.comparison)
            .set_string("target", &self.target)
    }
}

// Basic auth

/// Credentials sent with HTTP basic auth.
pub fn basic_auth_block() -> NestedBlock {
    NestedBlock::at_most_one(
        Block::new()
            .with_attribute("username", Attribute::required_string())
            .with_attribute("password", Attribute::required_string().sensitive()),
    )
}

impl FromAttributes for BasicAuth {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            username: attrs.string("username")?,
            password: attrs.string("password")?,
        })
    }
}

impl ToAttributes for BasicAuth {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("username", &self.username)
            .set_string("password", &self.password)
    }
}

/// The API reports "no basic auth" as empty credentials.
pub fn normalize_basic_auth(auth: Option<BasicAuth>) -> Option<BasicAuth> {
    auth.filter(|a| !a.username.is_empty() || !a.password.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::round_trip;
    use crate::validation::validate;
    use serde_json::Value;

    #[test]
    fn test_alert_settings_round_trip() {
        let run_based = AlertSettings {
            escalation: Escalation::RunBased {
                failed_run_threshold: 3,
            },
            reminders: Reminders {
                amount: 2,
                interval: 10,
            },
            parallel_run_failure_threshold: ParallelRunFailureThreshold {
                enabled: true,
                percentage: 50,
            },
        };
        assert_eq!(round_trip(&run_based), run_based);

        let time_based = AlertSettings {
            escalation: Escalation::TimeBased {
                minutes_failing_threshold: 15,
            },
            ..Default::default()
        };
        assert_eq!(round_trip(&time_based), time_based);
    }

    #[test]
    fn test_alert_settings_writes_only_selected_escalation() {
        let settings = AlertSettings::default().to_attributes().finish();
        assert_eq!(settings["escalation_type"], "RUN_BASED");
        assert_eq!(settings["run_based_escalation"], json!([{"failed_run_threshold": 1}]));
        assert_eq!(settings["time_based_escalation"], json!([]));
    }

    #[test]
    fn test_alert_settings_sparse_config() {
        let config = json!({"escalation_type": "TIME_BASED"});
        let attrs = Attributes::new(&config).unwrap();
        let settings = AlertSettings::from_attributes(&attrs).unwrap();
        assert_eq!(
            settings.escalation,
            Escalation::TimeBased {
                minutes_failing_threshold: 5
            }
        );
        assert_eq!(settings.reminders, Reminders::default());
    }

    #[test]
    fn test_validate_alert_settings_mismatched_block() {
        let config = json!({
            "alert_settings": [{
                "escalation_type": "TIME_BASED",
                "run_based_escalation": [{"failed_run_threshold": 2}]
            }]
        });
        let diags = validate_alert_settings(&Attributes::new(&config).unwrap());
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].attribute.as_deref(),
            Some("alert_settings.0.run_based_escalation")
        );
    }

    #[test]
    fn test_retry_strategy_round_trip() {
        let strategies = [
            RetryStrategy::NoRetries,
            RetryStrategy::SingleRetry {
                base_backoff_seconds: 30,
                same_region: false,
            },
            RetryStrategy::Backoff {
                kind: crate::models::BackoffKind::Linear,
                base_backoff_seconds: 10,
                max_retries: 4,
                max_duration_seconds: 300,
                same_region: true,
            },
        ];
        for strategy in strategies {
            assert_eq!(round_trip(&strategy), strategy);
        }
    }

    #[test]
    fn test_validate_retry_strategy_ignored_fields() {
        let config = json!({
            "retry_strategy": [{"type": "SINGLE_RETRY", "max_retries": 5, "max_duration_seconds": 600}]
        });
        let diags = validate_retry_strategy(&Attributes::new(&config).unwrap());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("max_retries"));

        let config = json!({"retry_strategy": [{"type": "FIXED", "max_retries": 5}]});
        assert!(validate_retry_strategy(&Attributes::new(&config).unwrap()).is_empty());
    }

    #[test]
    fn test_retry_strategy_unknown_type() {
        let config = json!({"type": "RANDOM"});
        assert!(RetryStrategy::from_attributes(&Attributes::new(&config).unwrap()).is_err());
    }

    #[test]
    fn test_preserve_secret_values() {
        let known = vec![EnvironmentVariable {
            key: "TOKEN".into(),
            value: "s3cr3t".into(),
            secret: true,
            ..Default::default()
        }];
        let mut current = vec![
            EnvironmentVariable {
                key: "TOKEN".into(),
                value: "******".into(),
                secret: true,
                ..Default::default()
            },
            EnvironmentVariable {
                key: "PLAIN".into(),
                value: "v".into(),
                ..Default::default()
            },
        ];
        preserve_secret_values(&mut current, &known);
        assert_eq!(current[0].value, "s3cr3t");
        assert_eq!(current[1].value, "v");
    }

    #[test]
    fn test_assertion_schema_rejects_unknown_source() {
        let schema = Schema::v0().with_block("assertion", assertion_block(&["STATUS_CODE"]));
        let diags = validate(
            &schema,
            &json!({"assertion": [{"source": "BODY", "comparison": "EQUALS"}]}),
        );
        assert!(!diags.is_empty());
    }

    #[test]
    fn test_numeric_id() {
        let value = json!({"id": "42"});
        assert_eq!(numeric_id(&Attributes::new(&value).unwrap()).unwrap(), 42);
        let value = json!({"id": "abc"});
        assert!(numeric_id(&Attributes::new(&value).unwrap()).is_err());
        let value = Value::Object(Default::default());
        assert_eq!(numeric_id(&Attributes::new(&value).unwrap()).unwrap(), 0);
    }

    #[test]
    fn test_normalize_basic_auth() {
        assert!(normalize_basic_auth(Some(BasicAuth::default())).is_none());
        let auth = BasicAuth {
            username: "u".into(),
            password: "p".into(),
        };
        assert_eq!(normalize_basic_auth(Some(auth.clone())), Some(auth));
    }
}
