//! Checks, check groups and heartbeats.

use serde::{Deserialize, Serialize};

use super::common::{
    is_zero, nullable, AlertChannelSubscription, AlertSettings, Assertion, BasicAuth, EnvironmentVariable,
    KeyValue, RetryStrategy,
};
use crate::client::Endpoint;

/// Check kinds the `checkly_check` resource manages.
pub const CHECK_TYPES: [&str; 3] = ["API", "BROWSER", "MULTI_STEP"];

/// Scheduling intervals in minutes. `0` means high frequency, refined
/// through `frequency_offset`.
pub const FREQUENCIES: [i64; 13] = [0, 1, 2, 5, 10, 15, 30, 60, 120, 180, 360, 720, 1440];

/// The HTTP request an API check performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Request {
    /// HTTP method.
    #[serde(deserialize_with = "nullable")]
    pub method: String,
    /// Target URL.
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    /// Follow 3xx responses.
    #[serde(deserialize_with = "nullable")]
    pub follow_redirects: bool,
    /// Skip certificate validation.
    #[serde(rename = "skipSSL", deserialize_with = "nullable")]
    pub skip_ssl: bool,
    /// Request body.
    #[serde(deserialize_with = "nullable")]
    pub body: String,
    /// One of `NONE`, `JSON`, `FORM`, `RAW` or `GRAPHQL`.
    #[serde(deserialize_with = "nullable")]
    pub body_type: String,
    /// Request headers.
    #[serde(deserialize_with = "nullable")]
    pub headers: Vec<KeyValue>,
    /// Query string parameters.
    #[serde(deserialize_with = "nullable")]
    pub query_parameters: Vec<KeyValue>,
    /// Assertions on the response.
    #[serde(deserialize_with = "nullable")]
    pub assertions: Vec<Assertion>,
    /// Credentials sent with the request.
    pub basic_auth: Option<BasicAuth>,
    /// `IPv4` or `IPv6`.
    #[serde(deserialize_with = "nullable")]
    pub ip_family: String,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: String::new(),
            follow_redirects: true,
            skip_ssl: false,
            body: String::new(),
            body_type: "NONE".to_string(),
            headers: Vec::new(),
            query_parameters: Vec::new(),
            assertions: Vec::new(),
            basic_auth: None,
            ip_family: "IPv4".to_string(),
        }
    }
}

/// An API, browser or multi-step check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Check {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// One of [`CHECK_TYPES`].
    #[serde(deserialize_with = "nullable")]
    pub check_type: String,
    /// Minutes between runs, one of [`FREQUENCIES`].
    #[serde(deserialize_with = "nullable")]
    pub frequency: i64,
    /// Seconds between runs for sub-minute frequencies.
    pub frequency_offset: Option<i64>,
    /// Run on schedule.
    #[serde(deserialize_with = "nullable")]
    pub activated: bool,
    /// Suppress alert notifications.
    #[serde(deserialize_with = "nullable")]
    pub muted: bool,
    /// Invert the result: a failing request passes.
    #[serde(deserialize_with = "nullable")]
    pub should_fail: bool,
    /// Run in every location at once instead of round robin.
    #[serde(deserialize_with = "nullable")]
    pub run_parallel: bool,
    /// Public locations to run from.
    #[serde(deserialize_with = "nullable")]
    pub locations: Vec<String>,
    /// Slugs of private locations to run from.
    #[serde(deserialize_with = "nullable")]
    pub private_locations: Vec<String>,
    /// Playwright script of a browser or multi-step check.
    #[serde(deserialize_with = "nullable")]
    pub script: String,
    /// Milliseconds above which a run is degraded.
    #[serde(deserialize_with = "nullable")]
    pub degraded_response_time: i64,
    /// Milliseconds above which a run fails.
    #[serde(deserialize_with = "nullable")]
    pub max_response_time: i64,
    /// Variables exposed to scripts.
    #[serde(deserialize_with = "nullable")]
    pub environment_variables: Vec<EnvironmentVariable>,
    /// Free-form labels.
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Snippet run before the check.
    pub setup_snippet_id: Option<i64>,
    /// Snippet run after the check.
    pub tear_down_snippet_id: Option<i64>,
    /// Inline script run before the check.
    #[serde(deserialize_with = "nullable")]
    pub local_setup_script: String,
    /// Inline script run after the check.
    #[serde(deserialize_with = "nullable")]
    pub local_tear_down_script: String,
    /// Runtime version, e.g. `2024.02`.
    pub runtime_id: Option<String>,
    /// Own alert settings, used unless `use_global_alert_settings`.
    pub alert_settings: Option<AlertSettings>,
    /// Use the account alert settings.
    #[serde(deserialize_with = "nullable")]
    pub use_global_alert_settings: bool,
    /// Alert channels notified by this object.
    #[serde(deserialize_with = "nullable")]
    pub alert_channel_subscriptions: Vec<AlertChannelSubscription>,
    /// HTTP request of an API check.
    pub request: Option<Request>,
    /// Check group this belongs to.
    pub group_id: Option<i64>,
    /// Position within the group.
    pub group_order: Option<i64>,
    /// Retries after a failed run.
    pub retry_strategy: Option<RetryStrategy>,
}

impl Default for Check {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            check_type: "API".to_string(),
            frequency: 10,
            frequency_offset: None,
            activated: true,
            muted: false,
            should_fail: false,
            run_parallel: false,
            locations: Vec::new(),
            private_locations: Vec::new(),
            script: String::new(),
            degraded_response_time: 15000,
            max_response_time: 30000,
            environment_variables: Vec::new(),
            tags: Vec::new(),
            setup_snippet_id: None,
            tear_down_snippet_id: None,
            local_setup_script: String::new(),
            local_tear_down_script: String::new(),
            runtime_id: None,
            alert_settings: None,
            use_global_alert_settings: false,
            alert_channel_subscriptions: Vec::new(),
            request: None,
            group_id: None,
            group_order: None,
            retry_strategy: None,
        }
    }
}

impl Endpoint for Check {
    const COLLECTION: &'static str = "/v1/checks";

    fn create_path(&self) -> String {
        format!("{}?autoAssignAlerts=false", Self::COLLECTION)
    }

    fn update_path(id: &str) -> String {
        format!("{}/{}?autoAssignAlerts=false", Self::COLLECTION, id)
    }

    fn remote_id(&self) -> Option<String> {
        Some(self.id.clone()).filter(|id| !id.is_empty())
    }
}

/// Request defaults applied to the API checks of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiCheckDefaults {
    /// Base URL prepended to member check URLs.
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    /// Request headers.
    #[serde(deserialize_with = "nullable")]
    pub headers: Vec<KeyValue>,
    /// Query string parameters.
    #[serde(deserialize_with = "nullable")]
    pub query_parameters: Vec<KeyValue>,
    /// Assertions on the response.
    #[serde(deserialize_with = "nullable")]
    pub assertions: Vec<Assertion>,
    /// Credentials sent with the request.
    pub basic_auth: Option<BasicAuth>,
}

/// A group of checks sharing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckGroup {
    /// Assigned by the API; `0` until created.
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "nullable")]
    pub id: i64,
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Checks run at the same time when the group is triggered.
    #[serde(deserialize_with = "nullable")]
    pub concurrency: i64,
    /// Run member checks on schedule.
    #[serde(deserialize_with = "nullable")]
    pub activated: bool,
    /// Suppress alerts of member checks.
    #[serde(deserialize_with = "nullable")]
    pub muted: bool,
    /// Run in every location at once instead of round robin.
    #[serde(deserialize_with = "nullable")]
    pub run_parallel: bool,
    /// Public locations to run from.
    #[serde(deserialize_with = "nullable")]
    pub locations: Vec<String>,
    /// Slugs of private locations to run from.
    #[serde(deserialize_with = "nullable")]
    pub private_locations: Vec<String>,
    /// Free-form labels.
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Variables exposed to scripts.
    #[serde(deserialize_with = "nullable")]
    pub environment_variables: Vec<EnvironmentVariable>,
    /// Snippet run before the check.
    pub setup_snippet_id: Option<i64>,
    /// Snippet run after the check.
    pub tear_down_snippet_id: Option<i64>,
    /// Inline script run before the check.
    #[serde(deserialize_with = "nullable")]
    pub local_setup_script: String,
    /// Inline script run after the check.
    #[serde(deserialize_with = "nullable")]
    pub local_tear_down_script: String,
    /// Runtime version, e.g. `2024.02`.
    pub runtime_id: Option<String>,
    /// Own alert settings, used unless `use_global_alert_settings`.
    pub alert_settings: Option<AlertSettings>,
    /// Use the account alert settings.
    #[serde(deserialize_with = "nullable")]
    pub use_global_alert_settings: bool,
    /// Alert channels notified by this object.
    #[serde(deserialize_with = "nullable")]
    pub alert_channel_subscriptions: Vec<AlertChannelSubscription>,
    /// Request defaults for member API checks.
    #[serde(deserialize_with = "nullable")]
    pub api_check_defaults: ApiCheckDefaults,
    /// Retries after a failed run.
    pub retry_strategy: Option<RetryStrategy>,
}

impl Default for CheckGroup {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            concurrency: 1,
            activated: true,
            muted: false,
            run_parallel: false,
            locations: Vec::new(),
            private_locations: Vec::new(),
            tags: Vec::new(),
            environment_variables: Vec::new(),
            setup_snippet_id: None,
            tear_down_snippet_id: None,
            local_setup_script: String::new(),
            local_tear_down_script: String::new(),
            runtime_id: None,
            alert_settings: None,
            use_global_alert_settings: true,
            alert_channel_subscriptions: Vec::new(),
            api_check_defaults: ApiCheckDefaults::default(),
            retry_strategy: None,
        }
    }
}

impl Endpoint for CheckGroup {
    const COLLECTION: &'static str = "/v1/check-groups";

    fn remote_id(&self) -> Option<String> {
        (self.id != 0).then(|| self.id.to_string())
    }
}

/// Time units accepted for heartbeat periods and grace times.
pub const HEARTBEAT_UNITS: [&str; 4] = ["seconds", "minutes", "hours", "days"];

/// The expected ping cadence of a heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Heartbeat {
    /// Expected time between pings.
    #[serde(deserialize_with = "nullable")]
    pub period: i64,
    /// One of [`HEARTBEAT_UNITS`].
    #[serde(deserialize_with = "nullable")]
    pub period_unit: String,
    /// Extra time allowed before alerting.
    #[serde(deserialize_with = "nullable")]
    pub grace: i64,
    /// One of [`HEARTBEAT_UNITS`].
    #[serde(deserialize_with = "nullable")]
    pub grace_unit: String,
    /// Token in the ping URL. Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub ping_token: String,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            period: 1,
            period_unit: "days".to_string(),
            grace: 1,
            grace_unit: "hours".to_string(),
            ping_token: String::new(),
        }
    }
}

impl Heartbeat {
    /// Seconds in one `unit`, `None` for an unknown unit.
    pub fn unit_seconds(unit: &str) -> Option<i64> {
        match unit {
            "seconds" => Some(1),
            "minutes" => Some(60),
            "hours" => Some(3600),
            "days" => Some(86400),
            _ => None,
        }
    }
}

/// A check that expects to be pinged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeartbeatCheck {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Expect pings.
    #[serde(deserialize_with = "nullable")]
    pub activated: bool,
    /// Suppress alert notifications.
    #[serde(deserialize_with = "nullable")]
    pub muted: bool,
    /// Free-form labels.
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Own alert settings, used unless `use_global_alert_settings`.
    pub alert_settings: Option<AlertSettings>,
    /// Use the account alert settings.
    #[serde(deserialize_with = "nullable")]
    pub use_global_alert_settings: bool,
    /// Alert channels notified by this object.
    #[serde(deserialize_with = "nullable")]
    pub alert_channel_subscriptions: Vec<AlertChannelSubscription>,
    /// Ping schedule.
    #[serde(deserialize_with = "nullable")]
    pub heartbeat: Heartbeat,
}

impl Default for HeartbeatCheck {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            activated: true,
            muted: false,
            tags: Vec::new(),
            alert_settings: None,
            use_global_alert_settings: false,
            alert_channel_subscriptions: Vec::new(),
            heartbeat: Heartbeat::default(),
        }
    }
}

impl Endpoint for HeartbeatCheck {
    const COLLECTION: &'static str = "/v1/checks/heartbeat";

    fn read_path(id: &str) -> String {
        format!("/v1/checks/{}", id)
    }

    fn update_path(id: &str) -> String {
        format!("{}/{}", Self::COLLECTION, id)
    }

    fn remote_id(&self) -> Option<String> {
        Some(self.id.clone()).filter(|id| !id.is_empty())
    }
}
