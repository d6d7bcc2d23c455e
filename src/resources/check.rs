//! `checkly_check`: API, browser and multi-step checks.

use serde_json::json;

use super::common::{
    assertion_block, basic_auth_block, environment_variable_block, normalize_basic_auth, opt_ref,
    preserve_secret_values, retry_strategy_block, validate_alert_settings,
    validate_retry_strategy, with_alerting, IP_FAMILIES,
};
use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::check::{CHECK_TYPES, FREQUENCIES};
use crate::models::common::{map_from_pairs, pairs_from_map};
use crate::models::{Check, Request};
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema, Validator};

const MAX_RESPONSE_TIME_LIMIT: i64 = 30000;

/// Request methods an API check or webhook may use.
pub const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "HEAD", "DELETE", "PATCH", "OPTIONS"];
/// Encodings of an API check request body.
pub const BODY_TYPES: [&str; 5] = ["NONE", "JSON", "FORM", "RAW", "GRAPHQL"];
/// What an API check assertion can inspect.
pub const API_ASSERTION_SOURCES: [&str; 5] =
    ["STATUS_CODE", "JSON_BODY", "HEADERS", "TEXT_BODY", "RESPONSE_TIME"];

/// Offsets in seconds allowed for high frequency checks.
pub const FREQUENCY_OFFSETS: [i64; 3] = [10, 20, 30];

/// The single `request` block of an API check.
pub fn request_block() -> NestedBlock {
    NestedBlock::at_most_one(
        Block::new()
            .with_attribute(
                "method",
                Attribute::optional_string()
                    .with_default(json!("GET"))
                    .with_validator(Validator::one_of(HTTP_METHODS)),
            )
            .with_attribute("url", Attribute::required_string().with_validator(Validator::Url))
            .with_attribute(
                "follow_redirects",
                Attribute::optional_bool().with_default(json!(true)),
            )
            .with_attribute("skip_ssl", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute("headers", Attribute::optional_string_map())
            .with_attribute("query_parameters", Attribute::optional_string_map())
            .with_attribute("body", Attribute::optional_string())
            .with_attribute(
                "body_type",
                Attribute::optional_string()
                    .with_default(json!("NONE"))
                    .with_validator(Validator::one_of(BODY_TYPES)),
            )
            .with_attribute(
                "ip_family",
                Attribute::optional_string()
                    .with_default(json!("IPv4"))
                    .with_validator(Validator::one_of(IP_FAMILIES)),
            )
            .with_block("assertion", assertion_block(&API_ASSERTION_SOURCES))
            .with_block("basic_auth", basic_auth_block().computed()),
    )
}

impl FromAttributes for Request {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = Request::default();
        Ok(Self {
            method: attrs.opt_string("method")?.unwrap_or(defaults.method),
            url: attrs.string("url")?,
            follow_redirects: attrs
                .opt_bool("follow_redirects")?
                .unwrap_or(defaults.follow_redirects),
            skip_ssl: attrs.bool("skip_ssl")?,
            body: attrs.string("body")?,
            body_type: attrs.opt_string("body_type")?.unwrap_or(defaults.body_type),
            headers: pairs_from_map(&attrs.string_map("headers")?),
            query_parameters: pairs_from_map(&attrs.string_map("query_parameters")?),
            assertions: attrs.read_blocks("assertion")?,
            basic_auth: normalize_basic_auth(attrs.read_block("basic_auth")?),
            ip_family: attrs.opt_string("ip_family")?.unwrap_or(defaults.ip_family),
        })
    }
}

impl ToAttributes for Request {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("method", &self.method)
            .set_string("url", &self.url)
            .set("follow_redirects", self.follow_redirects)
            .set("skip_ssl", self.skip_ssl)
            .set_string_map("headers", &map_from_pairs(&self.headers))
            .set_string_map("query_parameters", &map_from_pairs(&self.query_parameters))
            .set_string("body", &self.body)
            .set_string("body_type", &self.body_type)
            .set_string("ip_family", &self.ip_family)
            .write_blocks("assertion", &self.assertions)
            .write_block("basic_auth", normalize_basic_auth(self.basic_auth.clone()).as_ref())
    }
}

/// Attributes shared with monitors: scheduling, placement and grouping.
pub fn with_scheduling(schema: Schema, frequencies: &[i64]) -> Schema {
    schema
        .with_attribute(
            "name",
            Attribute::required_string().with_description("The name of the check."),
        )
        .with_attribute(
            "frequency",
            Attribute::required_int64()
                .with_validator(Validator::one_of_int(frequencies.iter().copied()))
                .with_description("How often the check should run in minutes."),
        )
        .with_attribute(
            "activated",
            Attribute::required_bool().with_description("Determines if the check is running or not."),
        )
        .with_attribute("muted", Attribute::optional_bool().with_default(json!(false)))
        .with_attribute("should_fail", Attribute::optional_bool().with_default(json!(false)))
        .with_attribute("run_parallel", Attribute::optional_bool().with_default(json!(false)))
        .with_attribute(
            "locations",
            Attribute::optional_string_set().with_description("Public locations the check runs from."),
        )
        .with_attribute("private_locations", Attribute::optional_string_set())
        .with_attribute("tags", Attribute::optional_string_set())
        .with_attribute(
            "group_id",
            Attribute::optional_int64().with_description("The id of the check group this check is part of."),
        )
        .with_attribute("group_order", Attribute::optional_int64())
        .with_block("retry_strategy", retry_strategy_block())
}

impl ResourceModel for Check {
    const TYPE_NAME: &'static str = "checkly_check";

    fn schema() -> Schema {
        let schema = Schema::v0()
            .with_description("Checks allow you to monitor key webapp flows, backend API's and more.")
            .with_id()
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_validator(Validator::one_of(CHECK_TYPES))
                    .with_force_new()
                    .with_description("The type of the check: API, BROWSER or MULTI_STEP."),
            )
            .with_attribute(
                "frequency_offset",
                Attribute::optional_int64()
                    .computed()
                    .with_validator(Validator::one_of_int(FREQUENCY_OFFSETS))
                    .with_description("Seconds between runs for high frequency checks (frequency 0)."),
            )
            .with_attribute(
                "script",
                Attribute::optional_string().with_description("Code of a browser or multi-step check."),
            )
            .with_attribute(
                "degraded_response_time",
                Attribute::optional_int64()
                    .with_default(json!(15000))
                    .with_validator(Validator::int_range(0, MAX_RESPONSE_TIME_LIMIT)),
            )
            .with_attribute(
                "max_response_time",
                Attribute::optional_int64()
                    .with_default(json!(MAX_RESPONSE_TIME_LIMIT))
                    .with_validator(Validator::int_range(0, MAX_RESPONSE_TIME_LIMIT)),
            )
            .with_block("environment_variable", environment_variable_block())
            .with_attribute("setup_snippet_id", Attribute::optional_int64())
            .with_attribute("teardown_snippet_id", Attribute::optional_int64())
            .with_attribute("local_setup_script", Attribute::optional_string())
            .with_attribute("local_teardown_script", Attribute::optional_string())
            .with_attribute(
                "runtime_id",
                Attribute::optional_string().with_description("The runtime version used to run the check."),
            )
            .with_block("request", request_block());
        with_alerting(with_scheduling(schema, &FREQUENCIES))
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        let check_type = config.opt_string("type").ok().flatten().unwrap_or_default();

        match check_type.as_str() {
            "API" if !config.is_set("request") => {
                diags.push(
                    Diagnostic::error("API checks require a request block").with_attribute("request"),
                );
            },
            "BROWSER" | "MULTI_STEP" if !config.is_set("script") => {
                diags.push(
                    Diagnostic::error(format!("{} checks require a script", check_type))
                        .with_attribute("script"),
                );
            },
            _ => {},
        }

        if config.is_set("frequency_offset") {
            if let Ok(Some(frequency)) = config.opt_int("frequency") {
                if frequency != 0 {
                    diags.push(
                        Diagnostic::error("frequency_offset can only be set when frequency is 0")
                            .with_attribute("frequency_offset"),
                    );
                }
            }
        }

        if let (Ok(Some(degraded)), Ok(Some(max))) = (
            config.opt_int("degraded_response_time"),
            config.opt_int("max_response_time"),
        ) {
            if degraded > max {
                diags.push(
                    Diagnostic::warning("degraded_response_time is larger than max_response_time")
                        .with_attribute("degraded_response_time"),
                );
            }
        }

        diags.extend(validate_alert_settings(config));
        diags.extend(validate_retry_strategy(config));
        diags
    }

    fn preserve_from(&mut self, known: &Self) {
        preserve_secret_values(&mut self.environment_variables, &known.environment_variables);
        if let (Some(current), Some(previous)) = (self.request.as_mut(), known.request.as_ref()) {
            if let (Some(auth), Some(prev_auth)) =
                (current.basic_auth.as_mut(), previous.basic_auth.as_ref())
            {
                if auth.username == prev_auth.username && auth.password.is_empty() {
                    auth.password = prev_auth.password.clone();
                }
            }
        }
    }
}

impl FromAttributes for Check {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = Check::default();
        Ok(Self {
            id: attrs.string("id")?,
            name: attrs.string("name")?,
            check_type: attrs.opt_string("type")?.unwrap_or(defaults.check_type),
            frequency: attrs.int("frequency")?,
            frequency_offset: opt_ref(attrs, "frequency_offset")?,
            activated: attrs.opt_bool("activated")?.unwrap_or(defaults.activated),
            muted: attrs.bool("muted")?,
            should_fail: attrs.bool("should_fail")?,
            run_parallel: attrs.bool("run_parallel")?,
            locations: attrs.string_set("locations")?,
            private_locations: attrs.string_set("private_locations")?,
            script: attrs.string("script")?,
            degraded_response_time: attrs
                .opt_int("degraded_response_time")?
                .unwrap_or(defaults.degraded_response_time),
            max_response_time: attrs
                .opt_int("max_response_time")?
                .unwrap_or(defaults.max_response_time),
            environment_variables: attrs.read_blocks("environment_variable")?,
            tags: attrs.string_set("tags")?,
            setup_snippet_id: opt_ref(attrs, "setup_snippet_id")?,
            tear_down_snippet_id: opt_ref(attrs, "teardown_snippet_id")?,
            local_setup_script: attrs.string("local_setup_script")?,
            local_tear_down_script: attrs.string("local_teardown_script")?,
            runtime_id: attrs.opt_string("runtime_id")?,
            alert_settings: attrs.read_block("alert_settings")?,
            use_global_alert_settings: attrs.bool("use_global_alert_settings")?,
            alert_channel_subscriptions: attrs.read_blocks("alert_channel_subscription")?,
            request: attrs.read_block("request")?,
            group_id: opt_ref(attrs, "group_id")?,
            group_order: opt_ref(attrs, "group_order")?,
            retry_strategy: attrs.read_block("retry_strategy")?,
        })
    }
}

impl ToAttributes for Check {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("id", &self.id)
            .set_string("name", &self.name)
            .set_string("type", &self.check_type)
            .set("frequency", self.frequency)
            .set_opt("frequency_offset", self.frequency_offset)
            .set("activated", self.activated)
            .set("muted", self.muted)
            .set("should_fail", self.should_fail)
            .set("run_parallel", self.run_parallel)
            .set_string_set("locations", &self.locations)
            .set_string_set("private_locations", &self.private_locations)
            .set_string("script", &self.script)
            .set("degraded_response_time", self.degraded_response_time)
            .set("max_response_time", self.max_response_time)
            .write_blocks("environment_variable", &self.environment_variables)
            .set_string_set("tags", &self.tags)
            .set_opt("setup_snippet_id", self.setup_snippet_id)
            .set_opt("teardown_snippet_id", self.tear_down_snippet_id)
            .set_string("local_setup_script", &self.local_setup_script)
            .set_string("local_teardown_script", &self.local_tear_down_script)
            .set_opt_string("runtime_id", self.runtime_id.as_deref())
            .write_block("alert_settings", self.alert_settings.as_ref())
            .set("use_global_alert_settings", self.use_global_alert_settings)
            .write_blocks("alert_channel_subscription", &self.alert_channel_subscriptions)
            .write_block("request", self.request.as_ref())
            .set_opt("group_id", self.group_id)
            .set_opt("group_order", self.group_order)
            .write_block("retry_strategy", self.retry_strategy.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::round_trip;
    use crate::models::{
        AlertChannelSubscription, AlertSettings, Assertion, BasicAuth, EnvironmentVariable,
        KeyValue, RetryStrategy,
    };
    use crate::plan::plan;
    use crate::validation::validate;

    fn api_check() -> Check {
        Check {
            id: "c0ffee".into(),
            name: "Public API".into(),
            check_type: "API".into(),
            frequency: 5,
            locations: vec!["eu-central-1".into(), "us-east-1".into()],
            tags: vec!["api".into(), "prod".into()],
            environment_variables: vec![EnvironmentVariable {
                key: "TOKEN".into(),
                value: "t".into(),
                secret: true,
                ..Default::default()
            }],
            alert_settings: Some(AlertSettings::default()),
            alert_channel_subscriptions: vec![AlertChannelSubscription {
                alert_channel_id: 7,
                activated: true,
            }],
            request: Some(Request {
                method: "POST".into(),
                url: "https://api.example.com/health".into(),
                headers: vec![KeyValue::new("Accept", "application/json")],
                assertions: vec![Assertion {
                    source: "STATUS_CODE".into(),
                    comparison: "EQUALS".into(),
                    target: "200".into(),
                    ..Default::default()
                }],
                basic_auth: Some(BasicAuth {
                    username: "u".into(),
                    password: "p".into(),
                }),
                ..Default::default()
            }),
            group_id: Some(12),
            group_order: Some(1),
            retry_strategy: Some(RetryStrategy::NoRetries),
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip_api_check() {
        let check = api_check();
        assert_eq!(round_trip(&check), check);
    }

    #[test]
    fn test_round_trip_browser_check() {
        let check = Check {
            id: "b1".into(),
            name: "Login flow".into(),
            check_type: "BROWSER".into(),
            frequency: 0,
            frequency_offset: Some(10),
            script: "await page.goto('https://example.com')".into(),
            runtime_id: Some("2024.02".into()),
            setup_snippet_id: Some(3),
            ..Default::default()
        };
        assert_eq!(round_trip(&check), check);
    }

    #[test]
    fn test_written_state_is_valid_config() {
        let state = api_check().to_attributes().finish();
        let diags = validate(&Check::schema(), &state);
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_state_is_stable_under_plan() {
        let state = api_check().to_attributes().finish();
        let result = plan(&Check::schema(), Some(&state), &state);
        assert!(!result.has_changes(), "{:?}", result.changes);
    }

    #[test]
    fn test_config_order_does_not_matter() {
        let state = api_check().to_attributes().finish();
        let mut config = state.clone();
        config["locations"] = json!(["us-east-1", "eu-central-1"]);
        config["tags"] = json!(["prod", "api"]);
        config["alert_settings"] = json!([]);
        config["retry_strategy"] = json!([]);

        let result = plan(&Check::schema(), Some(&state), &config);
        assert!(!result.has_changes(), "{:?}", result.changes);
    }

    #[test]
    fn test_type_change_replaces() {
        let state = api_check().to_attributes().finish();
        let mut config = state.clone();
        config["type"] = json!("MULTI_STEP");
        config["script"] = json!("test()");

        let result = plan(&Check::schema(), Some(&state), &config);
        assert!(result.requires_replace);
    }

    #[test]
    fn test_validate_api_check_requires_request() {
        let config = json!({"name": "x", "type": "API", "frequency": 5, "activated": true});
        let diags = Check::validate(&Attributes::new(&config).unwrap());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("request"));
    }

    #[test]
    fn test_validate_browser_check_requires_script() {
        let config = json!({"name": "x", "type": "BROWSER", "frequency": 5, "activated": true});
        let diags = Check::validate(&Attributes::new(&config).unwrap());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("script"));
    }

    #[test]
    fn test_validate_frequency_offset() {
        let config = json!({
            "name": "x", "type": "BROWSER", "frequency": 5, "activated": true,
            "script": "test()", "frequency_offset": 10
        });
        let diags = Check::validate(&Attributes::new(&config).unwrap());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("frequency_offset"));

        let mut config = config;
        config["frequency"] = json!(0);
        assert!(Check::validate(&Attributes::new(&config).unwrap()).is_empty());
    }

    #[test]
    fn test_schema_rejects_bad_frequency() {
        let config = json!({
            "name": "x", "type": "BROWSER", "frequency": 7, "activated": true, "script": "t()"
        });
        assert!(!validate(&Check::schema(), &config).is_empty());
    }

    #[test]
    fn test_preserve_masked_values() {
        let known = api_check();
        let mut current = api_check();
        current.environment_variables[0].value = "****".into();
        if let Some(auth) = current.request.as_mut().and_then(|r| r.basic_auth.as_mut()) {
            auth.password = String::new();
        }

        current.preserve_from(&known);
        assert_eq!(current, known);
    }

    #[test]
    fn test_sparse_config_reads_defaults() {
        let config = json!({
            "name": "x", "type": "API", "frequency": 1, "activated": true,
            "request": [{"url": "https://example.com"}]
        });
        let check = Check::from_attributes(&Attributes::new(&config).unwrap()).unwrap();
        assert_eq!(check.max_response_time, 30000);
        let request = check.request.unwrap();
        assert_eq!(request.method, "GET");
        assert!(request.follow_redirects);
        assert!(request.basic_auth.is_none());
    }
}
