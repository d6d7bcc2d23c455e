//! Shapes shared by several API object types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A key/value pair as the API encodes headers and query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyValue {
    /// Header or parameter name.
    #[serde(deserialize_with = "nullable")]
    pub key: String,
    /// Header or parameter value.
    #[serde(deserialize_with = "nullable")]
    pub value: String,
    /// Hide the value in the Checkly UI.
    #[serde(deserialize_with = "nullable")]
    pub locked: bool,
}

impl KeyValue {
    /// An unlocked pair.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            locked: false,
        }
    }
}

/// Turn a map into key/value pairs ordered by key.
pub fn pairs_from_map(map: &BTreeMap<String, String>) -> Vec<KeyValue> {
    map.iter().map(|(k, v)| KeyValue::new(k, v)).collect()
}

/// Collapse key/value pairs into a map; later duplicates win.
pub fn map_from_pairs(pairs: &[KeyValue]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|kv| (kv.key.clone(), kv.value.clone()))
        .collect()
}

/// HTTP basic authentication credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicAuth {
    /// User name.
    #[serde(deserialize_with = "nullable")]
    pub username: String,
    /// Password, sent as is.
    #[serde(deserialize_with = "nullable")]
    pub password: String,
}

/// A variable attached to a check or group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentVariable {
    /// Variable name.
    #[serde(deserialize_with = "nullable")]
    pub key: String,
    /// Variable value; empty on read when `secret`.
    #[serde(deserialize_with = "nullable")]
    pub value: String,
    /// Hide the value in the Checkly UI.
    #[serde(deserialize_with = "nullable")]
    pub locked: bool,
    /// The API never returns the value again.
    #[serde(deserialize_with = "nullable")]
    pub secret: bool,
}

/// A response assertion of an API check or monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Assertion {
    /// What to inspect, e.g. `STATUS_CODE` or `JSON_BODY`.
    #[serde(deserialize_with = "nullable")]
    pub source: String,
    /// Header name or JSON path, depending on the source.
    #[serde(deserialize_with = "nullable")]
    pub property: String,
    /// Comparison operator, e.g. `EQUALS`.
    #[serde(deserialize_with = "nullable")]
    pub comparison: String,
    /// Expected value.
    #[serde(deserialize_with = "nullable")]
    pub target: String,
}

/// Subscription of a check or group to an alert channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertChannelSubscription {
    /// Numeric id of the channel.
    #[serde(deserialize_with = "nullable")]
    pub alert_channel_id: i64,
    /// Whether the channel receives alerts.
    #[serde(deserialize_with = "nullable")]
    pub activated: bool,
}

/// When an alert fires for a failing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Alert after a number of consecutive failed runs.
    RunBased {
        /// Failed runs before alerting, 1 to 5.
        failed_run_threshold: i64,
    },
    /// Alert once the check has been failing for a while.
    TimeBased {
        /// Minutes of failure before alerting.
        minutes_failing_threshold: i64,
    },
}

impl Escalation {
    /// Discriminator of [`Escalation::RunBased`].
    pub const RUN_BASED: &'static str = "RUN_BASED";
    /// Discriminator of [`Escalation::TimeBased`].
    pub const TIME_BASED: &'static str = "TIME_BASED";
    /// Threshold used when a run based block leaves it out.
    pub const DEFAULT_FAILED_RUN_THRESHOLD: i64 = 1;
    /// Threshold used when a time based block leaves it out.
    pub const DEFAULT_MINUTES_FAILING_THRESHOLD: i64 = 5;

    /// The discriminator value of this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RunBased { .. } => Self::RUN_BASED,
            Self::TimeBased { .. } => Self::TIME_BASED,
        }
    }

    /// Build the variant named by `kind`, using the threshold for that kind.
    pub fn from_parts(
        kind: &str,
        failed_run_threshold: Option<i64>,
        minutes_failing_threshold: Option<i64>,
    ) -> Result<Self, String> {
        match kind {
            "" | Self::RUN_BASED => Ok(Self::RunBased {
                failed_run_threshold: failed_run_threshold
                    .unwrap_or(Self::DEFAULT_FAILED_RUN_THRESHOLD),
            }),
            Self::TIME_BASED => Ok(Self::TimeBased {
                minutes_failing_threshold: minutes_failing_threshold
                    .unwrap_or(Self::DEFAULT_MINUTES_FAILING_THRESHOLD),
            }),
            other => Err(format!("unknown escalation type '{}'", other)),
        }
    }
}

impl Default for Escalation {
    fn default() -> Self {
        Self::RunBased {
            failed_run_threshold: Self::DEFAULT_FAILED_RUN_THRESHOLD,
        }
    }
}

/// Reminder notifications while a check keeps failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reminders {
    /// How many reminders to send; `0` disables them.
    #[serde(deserialize_with = "nullable")]
    pub amount: i64,
    /// Minutes between reminders.
    #[serde(deserialize_with = "nullable")]
    pub interval: i64,
}

impl Default for Reminders {
    fn default() -> Self {
        Self {
            amount: 0,
            interval: 5,
        }
    }
}

/// Alert only when this share of parallel runs fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParallelRunFailureThreshold {
    /// Whether the threshold applies.
    #[serde(deserialize_with = "nullable")]
    pub enabled: bool,
    /// Share of failed runs, in percent.
    #[serde(deserialize_with = "nullable")]
    pub percentage: i64,
}

impl Default for ParallelRunFailureThreshold {
    fn default() -> Self {
        Self {
            enabled: false,
            percentage: 10,
        }
    }
}

/// Alerting behavior of a check or group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AlertSettingsWire", into = "AlertSettingsWire")]
pub struct AlertSettings {
    /// When the first alert fires.
    pub escalation: Escalation,
    /// Follow-up alerts.
    pub reminders: Reminders,
    /// Threshold for checks running in parallel.
    pub parallel_run_failure_threshold: ParallelRunFailureThreshold,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AlertSettingsWire {
    #[serde(deserialize_with = "nullable")]
    escalation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_based_escalation: Option<RunBasedWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_based_escalation: Option<TimeBasedWire>,
    reminders: Option<Reminders>,
    parallel_run_failure_threshold: Option<ParallelRunFailureThreshold>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RunBasedWire {
    #[serde(deserialize_with = "nullable")]
    failed_run_threshold: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TimeBasedWire {
    #[serde(deserialize_with = "nullable")]
    minutes_failing_threshold: i64,
}

impl TryFrom<AlertSettingsWire> for AlertSettings {
    type Error = String;

    fn try_from(wire: AlertSettingsWire) -> Result<Self, Self::Error> {
        let escalation = Escalation::from_parts(
            &wire.escalation_type,
            wire.run_based_escalation.map(|r| r.failed_run_threshold),
            wire.time_based_escalation.map(|t| t.minutes_failing_threshold),
        )?;
        Ok(Self {
            escalation,
            reminders: wire.reminders.unwrap_or_default(),
            parallel_run_failure_threshold: wire.parallel_run_failure_threshold.unwrap_or_default(),
        })
    }
}

impl From<AlertSettings> for AlertSettingsWire {
    fn from(settings: AlertSettings) -> Self {
        let mut wire = AlertSettingsWire {
            escalation_type: settings.escalation.kind().to_string(),
            reminders: Some(settings.reminders),
            parallel_run_failure_threshold: Some(settings.parallel_run_failure_threshold),
            ..Default::default()
        };
        match settings.escalation {
            Escalation::RunBased {
                failed_run_threshold,
            } => {
                wire.run_based_escalation = Some(RunBasedWire {
                    failed_run_threshold,
                })
            },
            Escalation::TimeBased {
                minutes_failing_threshold,
            } => {
                wire.time_based_escalation = Some(TimeBasedWire {
                    minutes_failing_threshold,
                })
            },
        }
        wire
    }
}

/// Delay growth between retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    /// The same delay before every retry.
    Fixed,
    /// The delay grows by the base backoff each time.
    Linear,
    /// The delay doubles each time.
    Exponential,
}

impl BackoffKind {
    /// The API name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "FIXED",
            Self::Linear => "LINEAR",
            Self::Exponential => "EXPONENTIAL",
        }
    }
}

/// How a failed check run is retried.
///
/// Only the fields of the selected variant are kept; whatever the API sends
/// for the others is dropped on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RetryStrategyWire", into = "RetryStrategyWire")]
pub enum RetryStrategy {
    /// Failed runs are not retried.
    NoRetries,
    /// One retry after a fixed delay.
    SingleRetry {
        /// Delay before the retry.
        base_backoff_seconds: i64,
        /// Retry from the region that failed.
        same_region: bool,
    },
    /// Several retries with a growing delay.
    Backoff {
        /// How the delay grows.
        kind: BackoffKind,
        /// Delay before the first retry.
        base_backoff_seconds: i64,
        /// Upper bound on retries, 1 to 10.
        max_retries: i64,
        /// Upper bound on the time spent retrying, up to 600.
        max_duration_seconds: i64,
        /// Retry from the region that failed.
        same_region: bool,
    },
}

impl RetryStrategy {
    /// Every discriminator the API accepts.
    pub const TYPES: [&'static str; 5] =
        ["FIXED", "LINEAR", "EXPONENTIAL", "SINGLE_RETRY", "NO_RETRIES"];
    /// Default delay before the first retry.
    pub const DEFAULT_BASE_BACKOFF_SECONDS: i64 = 60;
    /// Default retry count.
    pub const DEFAULT_MAX_RETRIES: i64 = 2;
    /// Default retry time budget.
    pub const DEFAULT_MAX_DURATION_SECONDS: i64 = 600;
    /// Retries stay in the failing region by default.
    pub const DEFAULT_SAME_REGION: bool = true;

    /// The discriminator value of this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoRetries => "NO_RETRIES",
            Self::SingleRetry { .. } => "SINGLE_RETRY",
            Self::Backoff { kind, .. } => kind.as_str(),
        }
    }

    /// Build the variant named by `kind` from flat fields.
    pub fn from_parts(
        kind: &str,
        base_backoff_seconds: i64,
        max_retries: i64,
        max_duration_seconds: i64,
        same_region: bool,
    ) -> Result<Self, String> {
        let backoff = |kind| Self::Backoff {
            kind,
            base_backoff_seconds,
            max_retries,
            max_duration_seconds,
            same_region,
        };
        match kind {
            "FIXED" => Ok(backoff(BackoffKind::Fixed)),
            "LINEAR" => Ok(backoff(BackoffKind::Linear)),
            "EXPONENTIAL" => Ok(backoff(BackoffKind::Exponential)),
            "SINGLE_RETRY" => Ok(Self::SingleRetry {
                base_backoff_seconds,
                same_region,
            }),
            "NO_RETRIES" => Ok(Self::NoRetries),
            other => Err(format!("unknown retry strategy type '{}'", other)),
        }
    }

    /// The flat fields, with defaults for those the variant does not use:
    /// `(base_backoff_seconds, max_retries, max_duration_seconds, same_region)`.
    pub fn flat(&self) -> (i64, i64, i64, bool) {
        match *self {
            Self::NoRetries => (
                Self::DEFAULT_BASE_BACKOFF_SECONDS,
                Self::DEFAULT_MAX_RETRIES,
                Self::DEFAULT_MAX_DURATION_SECONDS,
                Self::DEFAULT_SAME_REGION,
            ),
            Self::SingleRetry {
                base_backoff_seconds,
                same_region,
            } => (
                base_backoff_seconds,
                Self::DEFAULT_MAX_RETRIES,
                Self::DEFAULT_MAX_DURATION_SECONDS,
                same_region,
            ),
            Self::Backoff {
                base_backoff_seconds,
                max_retries,
                max_duration_seconds,
                same_region,
                ..
            } => (
                base_backoff_seconds,
                max_retries,
                max_duration_seconds,
                same_region,
            ),
        }
    }
}

impl fmt::Display for RetryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RetryStrategyWire {
    #[serde(rename = "type", deserialize_with = "nullable")]
    kind: String,
    #[serde(deserialize_with = "nullable")]
    base_backoff_seconds: i64,
    #[serde(deserialize_with = "nullable")]
    max_retries: i64,
    #[serde(deserialize_with = "nullable")]
    max_duration_seconds: i64,
    #[serde(deserialize_with = "nullable")]
    same_region: bool,
}

impl Default for RetryStrategyWire {
    fn default() -> Self {
        Self {
            kind: "FIXED".to_string(),
            base_backoff_seconds: RetryStrategy::DEFAULT_BASE_BACKOFF_SECONDS,
            max_retries: RetryStrategy::DEFAULT_MAX_RETRIES,
            max_duration_seconds: RetryStrategy::DEFAULT_MAX_DURATION_SECONDS,
            same_region: RetryStrategy::DEFAULT_SAME_REGION,
        }
    }
}

impl TryFrom<RetryStrategyWire> for RetryStrategy {
    type Error = String;

    fn try_from(wire: RetryStrategyWire) -> Result<Self, Self::Error> {
        Self::from_parts(
            &wire.kind,
            wire.base_backoff_seconds,
            wire.max_retries,
            wire.max_duration_seconds,
            wire.same_region,
        )
    }
}

impl From<RetryStrategy> for RetryStrategyWire {
    fn from(strategy: RetryStrategy) -> Self {
        let (base_backoff_seconds, max_retries, max_duration_seconds, same_region) =
            strategy.flat();
        Self {
            kind: strategy.kind().to_string(),
            base_backoff_seconds,
            max_retries,
            max_duration_seconds,
            same_region,
        }
    }
}

/// Numeric ids are left out of request bodies until the API assigns one.
pub(crate) fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// The API sends `null` for unset fields; read it as the field type's
/// default, the same as a missing key.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alert_settings_run_based_wire() {
        let settings: AlertSettings = serde_json::from_value(json!({
            "escalationType": "RUN_BASED",
            "runBasedEscalation": {"failedRunThreshold": 2},
            "timeBasedEscalation": {"minutesFailingThreshold": 10},
            "reminders": {"amount": 1, "interval": 10}
        }))
        .unwrap();

        assert_eq!(
            settings.escalation,
            Escalation::RunBased {
                failed_run_threshold: 2
            }
        );
        assert_eq!(settings.reminders.amount, 1);
        assert_eq!(settings.parallel_run_failure_threshold.percentage, 10);

        let wire = serde_json::to_value(&settings).unwrap();
        assert_eq!(wire["escalationType"], "RUN_BASED");
        assert_eq!(wire["runBasedEscalation"]["failedRunThreshold"], 2);
        assert!(wire.get("timeBasedEscalation").is_none());
    }

    #[test]
    fn test_alert_settings_time_based_defaults() {
        let settings: AlertSettings =
            serde_json::from_value(json!({"escalationType": "TIME_BASED"})).unwrap();
        assert_eq!(
            settings.escalation,
            Escalation::TimeBased {
                minutes_failing_threshold: 5
            }
        );
    }

    #[test]
    fn test_alert_settings_unknown_escalation() {
        let result: Result<AlertSettings, _> =
            serde_json::from_value(json!({"escalationType": "SOMETIMES"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_retry_strategy_drops_irrelevant_fields() {
        let strategy: RetryStrategy = serde_json::from_value(json!({
            "type": "SINGLE_RETRY",
            "baseBackoffSeconds": 30,
            "maxRetries": 1,
            "maxDurationSeconds": 60,
            "sameRegion": false
        }))
        .unwrap();
        assert_eq!(
            strategy,
            RetryStrategy::SingleRetry {
                base_backoff_seconds: 30,
                same_region: false
            }
        );

        let wire = serde_json::to_value(strategy).unwrap();
        assert_eq!(
            wire,
            json!({
                "type": "SINGLE_RETRY",
                "baseBackoffSeconds": 30,
                "maxRetries": 2,
                "maxDurationSeconds": 600,
                "sameRegion": false
            })
        );
    }

    #[test]
    fn test_retry_strategy_backoff_kinds() {
        for kind in ["FIXED", "LINEAR", "EXPONENTIAL"] {
            let strategy: RetryStrategy =
                serde_json::from_value(json!({"type": kind, "maxRetries": 4})).unwrap();
            assert_eq!(strategy.kind(), kind);
            assert_eq!(strategy.flat().1, 4);
        }

        let none: RetryStrategy = serde_json::from_value(json!({"type": "NO_RETRIES"})).unwrap();
        assert_eq!(none, RetryStrategy::NoRetries);
        assert_eq!(none.to_string(), "NO_RETRIES");
    }

    #[test]
    fn test_key_value_map_conversion() {
        let pairs = vec![KeyValue::new("b", "2"), KeyValue::new("a", "1")];
        let map = map_from_pairs(&pairs);
        assert_eq!(
            pairs_from_map(&map),
            vec![KeyValue::new("a", "1"), KeyValue::new("b", "2")]
        );
    }
}
