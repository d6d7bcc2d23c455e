//! Typed mirrors of Checkly API objects.
//!
//! Field names follow the API's camelCase JSON. Unions the API encodes with
//! a discriminator field (escalation, retry strategy, alert channel type) are
//! Rust enums converted through private wire structs.

pub mod account;
pub mod alert_channel;
pub mod check;
pub mod common;
pub mod dashboard;
pub mod monitor;

pub use account::{
    trigger_url, ClientCertificate, GlobalEnvironmentVariable, MaintenanceWindow, PrivateLocation,
    PrivateLocationKey, Snippet, StaticIp, TriggerCheck, TriggerGroup,
};
pub use alert_channel::{
    AlertChannel, AlertChannelConfig, EmailConfig, OpsgenieConfig, PagerdutyConfig, PhoneConfig,
    SlackConfig, WebhookConfig,
};
pub use check::{ApiCheckDefaults, Check, CheckGroup, Heartbeat, HeartbeatCheck, Request};
pub use common::{
    AlertChannelSubscription, AlertSettings, Assertion, BackoffKind, BasicAuth,
    EnvironmentVariable, Escalation, KeyValue, ParallelRunFailureThreshold, Reminders,
    RetryStrategy,
};
pub use dashboard::{Dashboard, DashboardKey, StatusPage, StatusPageCard, StatusPageService};
pub use monitor::{
    DnsMonitor, DnsRequest, IcmpMonitor, IcmpRequest, MonitorSettings, TcpMonitor, TcpRequest,
    UrlMonitor, UrlRequest,
};
