//! `checkly_check_group`

use serde_json::json;

use super::check::API_ASSERTION_SOURCES;
use super::common::{
    assertion_block, basic_auth_block, environment_variable_block, normalize_basic_auth,
    numeric_id, numeric_id_value, opt_ref, preserve_secret_values, retry_strategy_block,
    validate_alert_settings, validate_retry_strategy, with_alerting,
};
use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::common::{map_from_pairs, pairs_from_map};
use crate::models::{ApiCheckDefaults, CheckGroup};
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema, Validator};

fn api_check_defaults_block() -> NestedBlock {
    NestedBlock::at_most_one(
        Block::new()
            .with_attribute(
                "url",
                Attribute::optional_string()
                    .with_description("Base url prepended to the request url of API checks in the group."),
            )
            .with_attribute("headers", Attribute::optional_string_map())
            .with_attribute("query_parameters", Attribute::optional_string_map())
            .with_block("assertion", assertion_block(&API_ASSERTION_SOURCES))
            .with_block("basic_auth", basic_auth_block().computed()),
    )
    .computed()
}

impl FromAttributes for ApiCheckDefaults {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            url: attrs.string("url")?,
            headers: pairs_from_map(&attrs.string_map("headers")?),
            query_parameters: pairs_from_map(&attrs.string_map("query_parameters")?),
            assertions: attrs.read_blocks("assertion")?,
            basic_auth: normalize_basic_auth(attrs.read_block("basic_auth")?),
        })
    }
}

impl ToAttributes for ApiCheckDefaults {
    fn to_attributes(&self) -> AttributeWriter {
        AttributeWriter::new()
            .set_string("url", &self.url)
            .set_string_map("headers", &map_from_pairs(&self.headers))
            .set_string_map("query_parameters", &map_from_pairs(&self.query_parameters))
            .write_blocks("assertion", &self.assertions)
            .write_block("basic_auth", normalize_basic_auth(self.basic_auth.clone()).as_ref())
    }
}

impl ResourceModel for CheckGroup {
    const TYPE_NAME: &'static str = "checkly_check_group";

    fn schema() -> Schema {
        let schema = Schema::v0()
            .with_description("Check groups let you group checks and share settings between them.")
            .with_id()
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the check group."),
            )
            .with_attribute(
                "concurrency",
                Attribute::required_int64()
                    .with_validator(Validator::int_range(1, 1000))
                    .with_description("How many checks of the group run at the same time."),
            )
            .with_attribute("activated", Attribute::required_bool())
            .with_attribute("muted", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute("run_parallel", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute("locations", Attribute::optional_string_set())
            .with_attribute("private_locations", Attribute::optional_string_set())
            .with_attribute("tags", Attribute::optional_string_set())
            .with_block("environment_variable", environment_variable_block())
            .with_attribute("setup_snippet_id", Attribute::optional_int64())
            .with_attribute("teardown_snippet_id", Attribute::optional_int64())
            .with_attribute("local_setup_script", Attribute::optional_string())
            .with_attribute("local_teardown_script", Attribute::optional_string())
            .with_attribute("runtime_id", Attribute::optional_string())
            .with_block("api_check_defaults", api_check_defaults_block())
            .with_block("retry_strategy", retry_strategy_block());
        with_alerting(schema)
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        let mut diags = validate_alert_settings(config);
        diags.extend(validate_retry_strategy(config));
        diags
    }

    fn preserve_from(&mut self, known: &Self) {
        preserve_secret_values(&mut self.environment_variables, &known.environment_variables);
    }
}

impl FromAttributes for CheckGroup {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = CheckGroup::default();
        Ok(Self {
            id: numeric_id(attrs)?,
            name: attrs.string("name")?,
            concurrency: attrs.opt_int("concurrency")?.unwrap_or(defaults.concurrency),
            activated: attrs.opt_bool("activated")?.unwrap_or(defaults.activated),
            muted: attrs.bool("muted")?,
            run_parallel: attrs.bool("run_parallel")?,
            locations: attrs.string_set("locations")?,
            private_locations: attrs.string_set("private_locations")?,
            tags: attrs.string_set("tags")?,
            environment_variables: attrs.read_blocks("environment_variable")?,
            setup_snippet_id: opt_ref(attrs, "setup_snippet_id")?,
            tear_down_snippet_id: opt_ref(attrs, "teardown_snippet_id")?,
            local_setup_script: attrs.string("local_setup_script")?,
            local_tear_down_script: attrs.string("local_teardown_script")?,
            runtime_id: attrs.opt_string("runtime_id")?,
            alert_settings: attrs.read_block("alert_settings")?,
            use_global_alert_settings: attrs.bool("use_global_alert_settings")?,
            alert_channel_subscriptions: attrs.read_blocks("alert_channel_subscription")?,
            api_check_defaults: attrs.read_block("api_check_defaults")?.unwrap_or_default(),
            retry_strategy: attrs.read_block("retry_strategy")?,
        })
    }
}

impl ToAttributes for CheckGroup {
    fn to_attributes(&self) -> AttributeWriter {
        let api_check_defaults =
            Some(&self.api_check_defaults).filter(|d| **d != ApiCheckDefaults::default());
        AttributeWriter::new()
            .set_opt_string("id", numeric_id_value(self.id).as_deref())
            .set_string("name", &self.name)
            .set("concurrency", self.concurrency)
            .set("activated", self.activated)
            .set("muted", self.muted)
            .set("run_parallel", self.run_parallel)
            .set_string_set("locations", &self.locations)
            .set_string_set("private_locations", &self.private_locations)
            .set_string_set("tags", &self.tags)
            .write_blocks("environment_variable", &self.environment_variables)
            .set_opt("setup_snippet_id", self.setup_snippet_id)
            .set_opt("teardown_snippet_id", self.tear_down_snippet_id)
            .set_string("local_setup_script", &self.local_setup_script)
            .set_string("local_teardown_script", &self.local_tear_down_script)
            .set_opt_string("runtime_id", self.runtime_id.as_deref())
            .write_block("alert_settings", self.alert_settings.as_ref())
            .set("use_global_alert_settings", self.use_global_alert_settings)
            .write_blocks("alert_channel_subscription", &self.alert_channel_subscriptions)
            .write_block("api_check_defaults", api_check_defaults)
            .write_block("retry_strategy", self.retry_strategy.as_ref())
    }
}
