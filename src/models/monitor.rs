//! Uptime monitors: TCP, URL, DNS and ICMP.
//!
//! Monitors are created under their own collection (`/v1/checks/tcp`, ...)
//! but read and deleted through the generic check path.

use serde::{Deserialize, Serialize};

use super::common::{
    nullable, AlertChannelSubscription, AlertSettings, Assertion, RetryStrategy,
};
use crate::client::Endpoint;

/// Settings every monitor kind shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    /// Display name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Minutes between runs.
    #[serde(deserialize_with = "nullable")]
    pub frequency: i64,
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
    /// Check group this belongs to.
    pub group_id: Option<i64>,
    /// Position within the group.
    pub group_order: Option<i64>,
    /// Retries after a failed run.
    pub retry_strategy: Option<RetryStrategy>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            frequency: 10,
            activated: true,
            muted: false,
            should_fail: false,
            run_parallel: false,
            locations: Vec::new(),
            private_locations: Vec::new(),
            tags: Vec::new(),
            alert_settings: None,
            use_global_alert_settings: false,
            alert_channel_subscriptions: Vec::new(),
            group_id: None,
            group_order: None,
            retry_strategy: None,
        }
    }
}

macro_rules! monitor_endpoint {
    ($ty:ty, $collection:literal) => {
        impl Endpoint for $ty {
            const COLLECTION: &'static str = $collection;

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
    };
}

/// What a TCP monitor connects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TcpRequest {
    /// Target host.
    #[serde(deserialize_with = "nullable")]
    pub hostname: String,
    /// Target port.
    #[serde(deserialize_with = "nullable")]
    pub port: i64,
    /// Payload written after connecting.
    #[serde(deserialize_with = "nullable")]
    pub data: String,
    /// `IPv4` or `IPv6`.
    #[serde(deserialize_with = "nullable")]
    pub ip_family: String,
    /// Assertions on the response.
    #[serde(deserialize_with = "nullable")]
    pub assertions: Vec<Assertion>,
}

impl Default for TcpRequest {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            port: 0,
            data: String::new(),
            ip_family: "IPv4".to_string(),
            assertions: Vec::new(),
        }
    }
}

/// A TCP connection monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TcpMonitor {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Fields shared by every monitor.
    #[serde(flatten)]
    pub settings: MonitorSettings,
    /// Milliseconds above which a run is degraded.
    #[serde(deserialize_with = "nullable")]
    pub degraded_response_time: i64,
    /// Milliseconds above which a run fails.
    #[serde(deserialize_with = "nullable")]
    pub max_response_time: i64,
    /// The TCP request.
    #[serde(deserialize_with = "nullable")]
    pub request: TcpRequest,
}

impl TcpMonitor {
    /// Degraded threshold in milliseconds, unless configured.
    pub const DEFAULT_DEGRADED_RESPONSE_TIME: i64 = 4000;
    /// Failure threshold in milliseconds, unless configured.
    pub const DEFAULT_MAX_RESPONSE_TIME: i64 = 5000;
}

impl Default for TcpMonitor {
    fn default() -> Self {
        Self {
            id: String::new(),
            settings: MonitorSettings::default(),
            degraded_response_time: Self::DEFAULT_DEGRADED_RESPONSE_TIME,
            max_response_time: Self::DEFAULT_MAX_RESPONSE_TIME,
            request: TcpRequest::default(),
        }
    }
}

monitor_endpoint!(TcpMonitor, "/v1/checks/tcp");

/// What a URL monitor requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UrlRequest {
    /// Target URL.
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    /// Follow 3xx responses.
    #[serde(deserialize_with = "nullable")]
    pub follow_redirects: bool,
    /// Skip certificate validation.
    #[serde(rename = "skipSSL", deserialize_with = "nullable")]
    pub skip_ssl: bool,
    /// `IPv4` or `IPv6`.
    #[serde(deserialize_with = "nullable")]
    pub ip_family: String,
    /// Assertions on the response.
    #[serde(deserialize_with = "nullable")]
    pub assertions: Vec<Assertion>,
}

impl Default for UrlRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            follow_redirects: true,
            skip_ssl: false,
            ip_family: "IPv4".to_string(),
            assertions: Vec::new(),
        }
    }
}

/// An HTTP(S) availability monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UrlMonitor {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Fields shared by every monitor.
    #[serde(flatten)]
    pub settings: MonitorSettings,
    /// Milliseconds above which a run is degraded.
    #[serde(deserialize_with = "nullable")]
    pub degraded_response_time: i64,
    /// Milliseconds above which a run fails.
    #[serde(deserialize_with = "nullable")]
    pub max_response_time: i64,
    /// The HTTP request.
    #[serde(deserialize_with = "nullable")]
    pub request: UrlRequest,
}

impl UrlMonitor {
    /// Degraded threshold in milliseconds, unless configured.
    pub const DEFAULT_DEGRADED_RESPONSE_TIME: i64 = 3000;
    /// Failure threshold in milliseconds, unless configured.
    pub const DEFAULT_MAX_RESPONSE_TIME: i64 = 5000;
}

impl Default for UrlMonitor {
    fn default() -> Self {
        Self {
            id: String::new(),
            settings: MonitorSettings::default(),
            degraded_response_time: Self::DEFAULT_DEGRADED_RESPONSE_TIME,
            max_response_time: Self::DEFAULT_MAX_RESPONSE_TIME,
            request: UrlRequest::default(),
        }
    }
}

monitor_endpoint!(UrlMonitor, "/v1/checks/url");

/// DNS record types a DNS monitor can query.
pub const DNS_RECORD_TYPES: [&str; 8] = ["A", "AAAA", "CNAME", "MX", "NS", "TXT", "SOA", "PTR"];

/// What a DNS monitor resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsRequest {
    /// One of [`DNS_RECORD_TYPES`].
    #[serde(deserialize_with = "nullable")]
    pub record_type: String,
    /// Name to resolve.
    #[serde(deserialize_with = "nullable")]
    pub query: String,
    /// Resolver to ask.
    #[serde(deserialize_with = "nullable")]
    pub name_server: String,
    /// Resolver port.
    #[serde(deserialize_with = "nullable")]
    pub port: i64,
    /// `UDP` or `TCP`.
    #[serde(deserialize_with = "nullable")]
    pub protocol: String,
    /// Assertions on the response.
    #[serde(deserialize_with = "nullable")]
    pub assertions: Vec<Assertion>,
}

impl Default for DnsRequest {
    fn default() -> Self {
        Self {
            record_type: "A".to_string(),
            query: String::new(),
            name_server: String::new(),
            port: 53,
            protocol: "UDP".to_string(),
            assertions: Vec::new(),
        }
    }
}

/// A DNS resolution monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsMonitor {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Fields shared by every monitor.
    #[serde(flatten)]
    pub settings: MonitorSettings,
    /// Milliseconds above which a run is degraded.
    #[serde(deserialize_with = "nullable")]
    pub degraded_response_time: i64,
    /// Milliseconds above which a run fails.
    #[serde(deserialize_with = "nullable")]
    pub max_response_time: i64,
    /// The DNS request.
    #[serde(deserialize_with = "nullable")]
    pub request: DnsRequest,
}

impl DnsMonitor {
    /// Degraded threshold in milliseconds, unless configured.
    pub const DEFAULT_DEGRADED_RESPONSE_TIME: i64 = 500;
    /// Failure threshold in milliseconds, unless configured.
    pub const DEFAULT_MAX_RESPONSE_TIME: i64 = 1000;
}

impl Default for DnsMonitor {
    fn default() -> Self {
        Self {
            id: String::new(),
            settings: MonitorSettings::default(),
            degraded_response_time: Self::DEFAULT_DEGRADED_RESPONSE_TIME,
            max_response_time: Self::DEFAULT_MAX_RESPONSE_TIME,
            request: DnsRequest::default(),
        }
    }
}

monitor_endpoint!(DnsMonitor, "/v1/checks/dns");

/// What an ICMP monitor pings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IcmpRequest {
    /// Target host.
    #[serde(deserialize_with = "nullable")]
    pub hostname: String,
    /// `IPv4` or `IPv6`.
    #[serde(deserialize_with = "nullable")]
    pub ip_family: String,
    /// Echo requests sent per run.
    #[serde(deserialize_with = "nullable")]
    pub ping_count: i64,
    /// Assertions on the response.
    #[serde(deserialize_with = "nullable")]
    pub assertions: Vec<Assertion>,
}

impl Default for IcmpRequest {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            ip_family: "IPv4".to_string(),
            ping_count: 10,
            assertions: Vec::new(),
        }
    }
}

/// An ICMP ping monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IcmpMonitor {
    /// Assigned by the API.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    /// Fields shared by every monitor.
    #[serde(flatten)]
    pub settings: MonitorSettings,
    /// Packet loss percentage above which a run is degraded.
    #[serde(deserialize_with = "nullable")]
    pub degraded_packet_loss_threshold: i64,
    /// Packet loss percentage above which a run fails.
    #[serde(deserialize_with = "nullable")]
    pub max_packet_loss_threshold: i64,
    /// The ping request.
    #[serde(deserialize_with = "nullable")]
    pub request: IcmpRequest,
}

impl IcmpMonitor {
    /// Degraded packet loss percentage, unless configured.
    pub const DEFAULT_DEGRADED_PACKET_LOSS: i64 = 10;
    /// Failure packet loss percentage, unless configured.
    pub const DEFAULT_MAX_PACKET_LOSS: i64 = 20;
}

impl Default for IcmpMonitor {
    fn default() -> Self {
        Self {
            id: String::new(),
            settings: MonitorSettings::default(),
            degraded_packet_loss_threshold: Self::DEFAULT_DEGRADED_PACKET_LOSS,
            max_packet_loss_threshold: Self::DEFAULT_MAX_PACKET_LOSS,
            request: IcmpRequest::default(),
        }
    }
}

monitor_endpoint!(IcmpMonitor, "/v1/checks/icmp");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_monitor_settings_flatten() {
        let monitor = TcpMonitor {
            settings: MonitorSettings {
                name: "db".into(),
                locations: vec!["eu-west-1".into()],
                ..Default::default()
            },
            request: TcpRequest {
                hostname: "db.example.com".into(),
                port: 5432,
                ..Default::default()
            },
            ..Default::default()
        };

        let wire = serde_json::to_value(&monitor).unwrap();
        assert_eq!(wire["name"], "db");
        assert_eq!(wire["locations"], json!(["eu-west-1"]));
        assert_eq!(wire["request"]["port"], 5432);
        assert_eq!(wire["degradedResponseTime"], 4000);

        let back: TcpMonitor = serde_json::from_value(wire).unwrap();
        assert_eq!(back, monitor);
    }

    #[test]
    fn test_monitor_decodes_null_fields_as_empty() {
        let monitor: UrlMonitor = serde_json::from_value(json!({
            "id": "m-1",
            "name": "site",
            "privateLocations": null,
            "tags": null,
            "request": {"url": "https://example.com", "assertions": null}
        }))
        .unwrap();

        assert_eq!(monitor.settings.name, "site");
        assert!(monitor.settings.private_locations.is_empty());
        assert!(monitor.settings.tags.is_empty());
        assert!(monitor.request.assertions.is_empty());
    }

    #[test]
    fn test_monitor_paths() {
        assert_eq!(UrlMonitor::default().create_path(), "/v1/checks/url");
        assert_eq!(UrlMonitor::read_path("m"), "/v1/checks/m");
        assert_eq!(DnsMonitor::update_path("m"), "/v1/checks/dns/m");
        assert_eq!(IcmpMonitor::delete_path("m"), "/v1/checks/m");
    }

    #[test]
    fn test_defaults() {
        let dns = DnsMonitor::default();
        assert_eq!(dns.degraded_response_time, 500);
        assert_eq!(dns.request.port, 53);

        let icmp = IcmpMonitor::default();
        assert_eq!(icmp.request.ping_count, 10);
        assert_eq!(icmp.max_packet_loss_threshold, 20);
    }
}
