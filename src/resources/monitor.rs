//! Uptime monitors: `checkly_tcp_monitor`, `checkly_url_monitor`,
//! `checkly_dns_monitor` and `checkly_icmp_monitor`.
//!
//! The four share scheduling, alerting and retry attributes with checks and
//! differ in their `request` block and response thresholds.

use serde_json::json;

use super::check::with_scheduling;
use super::common::{
    assertion_block, opt_ref, validate_alert_settings, validate_retry_strategy, with_alerting,
    IP_FAMILIES,
};
use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::check::FREQUENCIES;
use crate::models::monitor::DNS_RECORD_TYPES;
use crate::models::{
    DnsMonitor, DnsRequest, IcmpMonitor, IcmpRequest, MonitorSettings, TcpMonitor, TcpRequest,
    UrlMonitor, UrlRequest,
};
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema, Validator};

const TCP_ASSERTION_SOURCES: [&str; 2] = ["RESPONSE_DATA", "RESPONSE_TIME"];
const URL_ASSERTION_SOURCES: [&str; 1] = ["STATUS_CODE"];
const DNS_ASSERTION_SOURCES: [&str; 3] = ["RESPONSE_CODE", "TEXT_ANSWER", "RESPONSE_TIME"];
const ICMP_ASSERTION_SOURCES: [&str; 2] = ["LATENCY", "JSON_RESPONSE"];
const DNS_PROTOCOLS: [&str; 2] = ["UDP", "TCP"];

/// Upper bound of monitor response time thresholds, in milliseconds.
const MAX_RESPONSE_TIME_LIMIT: i64 = 5000;

fn monitor_schema(description: &str) -> Schema {
    let schema = Schema::v0().with_description(description).with_id();
    with_alerting(with_scheduling(schema, &FREQUENCIES))
}

fn response_time_attributes(schema: Schema, degraded: i64, max: i64) -> Schema {
    schema
        .with_attribute(
            "degraded_response_time",
            Attribute::optional_int64()
                .with_default(json!(degraded))
                .with_validator(Validator::int_range(0, MAX_RESPONSE_TIME_LIMIT))
                .with_description("Response time in milliseconds after which the monitor is degraded."),
        )
        .with_attribute(
            "max_response_time",
            Attribute::optional_int64()
                .with_default(json!(max))
                .with_validator(Validator::int_range(0, MAX_RESPONSE_TIME_LIMIT))
                .with_description("Response time in milliseconds after which the monitor fails."),
        )
}

fn request_block(block: Block) -> NestedBlock {
    NestedBlock::list(block).with_min_items(1).with_max_items(1)
}

fn ip_family_attribute() -> Attribute {
    Attribute::optional_string()
        .with_default(json!("IPv4"))
        .with_validator(Validator::one_of(IP_FAMILIES))
}

fn read_settings(attrs: &Attributes<'_>) -> Result<MonitorSettings, ProviderError> {
    let defaults = MonitorSettings::default();
    Ok(MonitorSettings {
        name: attrs.string("name")?,
        frequency: attrs.opt_int("frequency")?.unwrap_or(defaults.frequency),
        activated: attrs.opt_bool("activated")?.unwrap_or(defaults.activated),
        muted: attrs.bool("muted")?,
        should_fail: attrs.bool("should_fail")?,
        run_parallel: attrs.bool("run_parallel")?,
        locations: attrs.string_set("locations")?,
        private_locations: attrs.string_set("private_locations")?,
        tags: attrs.string_set("tags")?,
        alert_settings: attrs.read_block("alert_settings")?,
        use_global_alert_settings: attrs.bool("use_global_alert_settings")?,
        alert_channel_subscriptions: attrs.read_blocks("alert_channel_subscription")?,
        group_id: opt_ref(attrs, "group_id")?,
        group_order: opt_ref(attrs, "group_order")?,
        retry_strategy: attrs.read_block("retry_strategy")?,
    })
}

fn write_settings(writer: AttributeWriter, settings: &MonitorSettings) -> AttributeWriter {
    writer
        .set_string("name", &settings.name)
        .set("frequency", settings.frequency)
        .set("activated", settings.activated)
        .set("muted", settings.muted)
        .set("should_fail", settings.should_fail)
        .set("run_parallel", settings.run_parallel)
        .set_string_set("locations", &settings.locations)
        .set_string_set("private_locations", &settings.private_locations)
        .set_string_set("tags", &settings.tags)
        .write_block("alert_settings", settings.alert_settings.as_ref())
        .set("use_global_alert_settings", settings.use_global_alert_settings)
        .write_blocks("alert_channel_subscription", &settings.alert_channel_subscriptions)
        .set_opt("group_id", settings.group_id)
        .set_opt("group_order", settings.group_order)
        .write_block("retry_strategy", settings.retry_strategy.as_ref())
}

/// Warn when the degraded threshold lies above the failure threshold.
fn check_thresholds(config: &Attributes<'_>, degraded: &str, max: &str) -> Option<Diagnostic> {
    let degraded_value = config.opt_int(degraded).ok().flatten()?;
    let max_value = config.opt_int(max).ok().flatten()?;
    (degraded_value > max_value).then(|| {
        Diagnostic::warning(format!("{} is greater than {}", degraded, max))
            .with_detail(format!(
                "The monitor is never degraded before it fails ({} > {}).",
                degraded_value, max_value
            ))
            .with_attribute(degraded)
    })
}

fn validate_monitor(config: &Attributes<'_>, degraded: &str, max: &str) -> Vec<Diagnostic> {
    let mut diags = validate_alert_settings(config);
    diags.extend(validate_retry_strategy(config));
    diags.extend(check_thresholds(config, degraded, max));
    diags
}

// TCP

impl FromAttributes for TcpRequest {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = TcpRequest::default();
        Ok(Self {
            hostname: attrs.string("hostname")?,
            port: attrs.int("port")?,
            data: attrs.string("data")?,
            ip_family: attrs.opt_string("ip_family")?.unwrap_or(defaults.ip_family),
            assertions: attrs.read_blocks("assertion")?,
        })
    }
}

impl ToAttributes for TcpRequest {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("hostname", &self.hostname)
            .set("port", self.port)
            .set_string("data", &self.data)
            .set_string("ip_family", &self.ip_family)
            .write_blocks("assertion", &self.assertions)
    }
}

impl ResourceModel for TcpMonitor {
    const TYPE_NAME: &'static str = "checkly_tcp_monitor";

    fn schema() -> Schema {
        let schema = monitor_schema("TCP monitors check that a host accepts connections on a port.");
        response_time_attributes(
            schema,
            Self::DEFAULT_DEGRADED_RESPONSE_TIME,
            Self::DEFAULT_MAX_RESPONSE_TIME,
        )
        .with_block(
            "request",
            request_block(
                Block::new()
                    .with_attribute(
                        "hostname",
                        Attribute::required_string().with_description("The host to connect to."),
                    )
                    .with_attribute(
                        "port",
                        Attribute::required_int64().with_validator(Validator::int_range(1, 65535)),
                    )
                    .with_attribute(
                        "data",
                        Attribute::optional_string()
                            .with_description("Data sent to the host after connecting."),
                    )
                    .with_attribute("ip_family", ip_family_attribute())
                    .with_block("assertion", assertion_block(&TCP_ASSERTION_SOURCES)),
            ),
        )
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        validate_monitor(config, "degraded_response_time", "max_response_time")
    }
}

impl FromAttributes for TcpMonitor {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            id: attrs.string("id")?,
            settings: read_settings(attrs)?,
            degraded_response_time: attrs
                .opt_int("degraded_response_time")?
                .unwrap_or(Self::DEFAULT_DEGRADED_RESPONSE_TIME),
            max_response_time: attrs
                .opt_int("max_response_time")?
                .unwrap_or(Self::DEFAULT_MAX_RESPONSE_TIME),
            request: attrs.read_block("request")?.unwrap_or_default(),
        })
    }
}

impl ToAttributes for TcpMonitor {
    fn to_attributes(&self) -> AttributeWriter {
        write_settings(AttributeWriter::new().set_string("id", &self.id), &self.settings)
            .set("degraded_response_time", self.degraded_response_time)
            .set("max_response_time", self.max_response_time)
            .write_block("request", Some(&self.request))
    }
}

// URL

impl FromAttributes for UrlRequest {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = UrlRequest::default();
        Ok(Self {
            url: attrs.string("url")?,
            follow_redirects: attrs
                .opt_bool("follow_redirects")?
                .unwrap_or(defaults.follow_redirects),
            skip_ssl: attrs.bool("skip_ssl")?,
            ip_family: attrs.opt_string("ip_family")?.unwrap_or(defaults.ip_family),
            assertions: attrs.read_blocks("assertion")?,
        })
    }
}

impl ToAttributes for UrlRequest {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("url", &self.url)
            .set("follow_redirects", self.follow_redirects)
            .set("skip_ssl", self.skip_ssl)
            .set_string("ip_family", &self.ip_family)
            .write_blocks("assertion", &self.assertions)
    }
}

impl ResourceModel for UrlMonitor {
    const TYPE_NAME: &'static str = "checkly_url_monitor";

    fn schema() -> Schema {
        let schema = monitor_schema("URL monitors check that a URL responds with the expected status.");
        response_time_attributes(
            schema,
            Self::DEFAULT_DEGRADED_RESPONSE_TIME,
            Self::DEFAULT_MAX_RESPONSE_TIME,
        )
        .with_block(
            "request",
            request_block(
                Block::new()
                    .with_attribute("url", Attribute::required_string().with_validator(Validator::Url))
                    .with_attribute(
                        "follow_redirects",
                        Attribute::optional_bool().with_default(json!(true)),
                    )
                    .with_attribute("skip_ssl", Attribute::optional_bool().with_default(json!(false)))
                    .with_attribute("ip_family", ip_family_attribute())
                    .with_block("assertion", assertion_block(&URL_ASSERTION_SOURCES)),
            ),
        )
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        validate_monitor(config, "degraded_response_time", "max_response_time")
    }
}

impl FromAttributes for UrlMonitor {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            id: attrs.string("id")?,
            settings: read_settings(attrs)?,
            degraded_response_time: attrs
                .opt_int("degraded_response_time")?
                .unwrap_or(Self::DEFAULT_DEGRADED_RESPONSE_TIME),
            max_response_time: attrs
                .opt_int("max_response_time")?
                .unwrap_or(Self::DEFAULT_MAX_RESPONSE_TIME),
            request: attrs.read_block("request")?.unwrap_or_default(),
        })
    }
}

impl ToAttributes for UrlMonitor {
    fn to_attributes(&self) -> AttributeWriter {
        write_settings(AttributeWriter::new().set_string("id", &self.id), &self.settings)
            .set("degraded_response_time", self.degraded_response_time)
            .set("max_response_time", self.max_response_time)
            .write_block("request", Some(&self.request))
    }
}

// DNS

impl FromAttributes for DnsRequest {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = DnsRequest::default();
        Ok(Self {
            record_type: attrs.opt_string("record_type")?.unwrap_or(defaults.record_type),
            query: attrs.string("query")?,
            name_server: attrs.string("name_server")?,
            port: attrs.opt_int("port")?.unwrap_or(defaults.port),
            protocol: attrs.opt_string("protocol")?.unwrap_or(defaults.protocol),
            assertions: attrs.read_blocks("assertion")?,
        })
    }
}

impl ToAttributes for DnsRequest {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("record_type", &self.record_type)
            .set_string("query", &self.query)
            .set_string("name_server", &self.name_server)
            .set("port", self.port)
            .set_string("protocol", &self.protocol)
            .write_blocks("assertion", &self.assertions)
    }
}

impl ResourceModel for DnsMonitor {
    const TYPE_NAME: &'static str = "checkly_dns_monitor";

    fn schema() -> Schema {
        let schema = monitor_schema("DNS monitors check that a name resolves as expected.");
        response_time_attributes(
            schema,
            Self::DEFAULT_DEGRADED_RESPONSE_TIME,
            Self::DEFAULT_MAX_RESPONSE_TIME,
        )
        .with_block(
            "request",
            request_block(
                Block::new()
                    .with_attribute(
                        "record_type",
                        Attribute::required_string().with_validator(Validator::one_of(DNS_RECORD_TYPES)),
                    )
                    .with_attribute(
                        "query",
                        Attribute::required_string().with_description("The name to resolve."),
                    )
                    .with_attribute(
                        "name_server",
                        Attribute::optional_string()
                            .with_description("The name server to ask. The default resolver when unset."),
                    )
                    .with_attribute(
                        "port",
                        Attribute::optional_int64()
                            .with_default(json!(53))
                            .with_validator(Validator::int_range(1, 65535)),
                    )
                    .with_attribute(
                        "protocol",
                        Attribute::optional_string()
                            .with_default(json!("UDP"))
                            .with_validator(Validator::one_of(DNS_PROTOCOLS)),
                    )
                    .with_block("assertion", assertion_block(&DNS_ASSERTION_SOURCES)),
            ),
        )
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        validate_monitor(config, "degraded_response_time", "max_response_time")
    }
}

impl FromAttributes for DnsMonitor {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            id: attrs.string("id")?,
            settings: read_settings(attrs)?,
            degraded_response_time: attrs
                .opt_int("degraded_response_time")?
                .unwrap_or(Self::DEFAULT_DEGRADED_RESPONSE_TIME),
            max_response_time: attrs
                .opt_int("max_response_time")?
                .unwrap_or(Self::DEFAULT_MAX_RESPONSE_TIME),
            request: attrs.read_block("request")?.unwrap_or_default(),
        })
    }
}

impl ToAttributes for DnsMonitor {
    fn to_attributes(&self) -> AttributeWriter {
        write_settings(AttributeWriter::new().set_string("id", &self.id), &self.settings)
            .set("degraded_response_time", self.degraded_response_time)
            .set("max_response_time", self.max_response_time)
            .write_block("request", Some(&self.request))
    }
}

// ICMP

impl FromAttributes for IcmpRequest {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = IcmpRequest::default();
        Ok(Self {
            hostname: attrs.string("hostname")?,
            ip_family: attrs.opt_string("ip_family")?.unwrap_or(defaults.ip_family),
            ping_count: attrs.opt_int("ping_count")?.unwrap_or(defaults.ping_count),
            assertions: attrs.read_blocks("assertion")?,
        })
    }
}

impl ToAttributes for IcmpRequest {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("hostname", &self.hostname)
            .set_string("ip_family", &self.ip_family)
            .set("ping_count", self.ping_count)
            .write_blocks("assertion", &self.assertions)
    }
}

impl ResourceModel for IcmpMonitor {
    const TYPE_NAME: &'static str = "checkly_icmp_monitor";

    fn schema() -> Schema {
        monitor_schema("ICMP monitors ping a host and watch latency and packet loss.")
            .with_attribute(
                "degraded_packet_loss_threshold",
                Attribute::optional_int64()
                    .with_default(json!(Self::DEFAULT_DEGRADED_PACKET_LOSS))
                    .with_validator(Validator::int_range(0, 100))
                    .with_description("Packet loss percentage after which the monitor is degraded."),
            )
            .with_attribute(
                "max_packet_loss_threshold",
                Attribute::optional_int64()
                    .with_default(json!(Self::DEFAULT_MAX_PACKET_LOSS))
                    .with_validator(Validator::int_range(0, 100))
                    .with_description("Packet loss percentage after which the monitor fails."),
            )
            .with_block(
                "request",
                request_block(
                    Block::new()
                        .with_attribute("hostname", Attribute::required_string())
                        .with_attribute("ip_family", ip_family_attribute())
                        .with_attribute(
                            "ping_count",
                            Attribute::optional_int64()
                                .with_default(json!(10))
                                .with_validator(Validator::int_range(1, 50)),
                        )
                        .with_block("assertion", assertion_block(&ICMP_ASSERTION_SOURCES)),
                ),
            )
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        validate_monitor(config, "degraded_packet_loss_threshold", "max_packet_loss_threshold")
    }
}

impl FromAttributes for IcmpMonitor {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            id: attrs.string("id")?,
            settings: read_settings(attrs)?,
            degraded_packet_loss_threshold: attrs
                .opt_int("degraded_packet_loss_threshold")?
                .unwrap_or(Self::DEFAULT_DEGRADED_PACKET_LOSS),
            max_packet_loss_threshold: attrs
                .opt_int("max_packet_loss_threshold")?
                .unwrap_or(Self::DEFAULT_MAX_PACKET_LOSS),
            request: attrs.read_block("request")?.unwrap_or_default(),
        })
    }
}

impl ToAttributes for IcmpMonitor {
    fn to_attributes(&self) -> AttributeWriter {
        write_settings(AttributeWriter::new().set_string("id", &self.id), &self.settings)
            .set("degraded_packet_loss_threshold", self.degraded_packet_loss_threshold)
            .set("max_packet_loss_threshold", self.max_packet_loss_threshold)
            .write_block("request", Some(&self.request))
    }
}
