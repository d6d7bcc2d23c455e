//! `checkly_dashboard`

use serde_json::json;

use super::ResourceModel;
use crate::attributes::{AttributeWriter, Attributes, FromAttributes, ToAttributes};
use crate::error::ProviderError;
use crate::models::dashboard::{DASHBOARD_PAGINATION_RATES, DASHBOARD_REFRESH_RATES, DASHBOARD_WIDTHS};
use crate::models::{Dashboard, DashboardKey};
use crate::schema::{Attribute, Diagnostic, Schema, Validator};

impl ResourceModel for Dashboard {
    const TYPE_NAME: &'static str = "checkly_dashboard";

    fn schema() -> Schema {
        Schema::v0()
            .with_description("Public dashboards show the status of a set of checks.")
            .with_id()
            .with_attribute(
                "custom_url",
                Attribute::required_string()
                    .with_description("Subdomain of checklyhq.com the dashboard is served on."),
            )
            .with_attribute("custom_domain", Attribute::optional_string())
            .with_attribute("logo", Attribute::optional_string())
            .with_attribute("favicon", Attribute::optional_string())
            .with_attribute("link", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("header", Attribute::optional_string())
            .with_attribute(
                "width",
                Attribute::optional_string()
                    .with_default(json!("FULL"))
                    .with_validator(Validator::one_of(DASHBOARD_WIDTHS)),
            )
            .with_attribute(
                "refresh_rate",
                Attribute::optional_int64()
                    .with_default(json!(60))
                    .with_validator(Validator::one_of_int(DASHBOARD_REFRESH_RATES)),
            )
            .with_attribute("paginate", Attribute::optional_bool().with_default(json!(true)))
            .with_attribute(
                "pagination_rate",
                Attribute::optional_int64()
                    .with_default(json!(60))
                    .with_validator(Validator::one_of_int(DASHBOARD_PAGINATION_RATES)),
            )
            .with_attribute(
                "checks_per_page",
                Attribute::optional_int64()
                    .with_default(json!(15))
                    .with_validator(Validator::int_range(1, 20)),
            )
            .with_attribute(
                "use_tags_and_operator",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute("hide_tags", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute(
                "enable_incidents",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute("expand_checks", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute("show_header", Attribute::optional_bool().with_default(json!(true)))
            .with_attribute("custom_css", Attribute::optional_string())
            .with_attribute("show_p95", Attribute::optional_bool().with_default(json!(true)))
            .with_attribute("show_p99", Attribute::optional_bool().with_default(json!(true)))
            .with_attribute(
                "is_private",
                Attribute::optional_bool()
                    .with_default(json!(false))
                    .with_description("Private dashboards need an access key."),
            )
            .with_attribute(
                "tags",
                Attribute::optional_string_set()
                    .with_description("Checks with any of these tags are shown."),
            )
            .with_attribute(
                "key",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The access key of a private dashboard."),
            )
    }

    fn validate(config: &Attributes<'_>) -> Vec<Diagnostic> {
        let paginate = config.opt_bool("paginate").ok().flatten().unwrap_or(true);
        if !paginate && config.is_set("pagination_rate") {
            return vec![Diagnostic::warning("pagination_rate has no effect without paginate")
                .with_attribute("pagination_rate")];
        }
        Vec::new()
    }

    fn preserve_from(&mut self, known: &Self) {
        let has_raw_key = self.keys.iter().any(|k| !k.raw_key.is_empty());
        if !has_raw_key && known.keys.iter().any(|k| !k.raw_key.is_empty()) {
            self.keys = known.keys.clone();
        }
    }
}

impl FromAttributes for Dashboard {
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self, ProviderError> {
        let defaults = Dashboard::default();
        let keys = attrs
            .opt_string("key")?
            .map(|raw_key| DashboardKey {
                raw_key,
                masked_key: String::new(),
            })
            .into_iter()
            .collect();
        Ok(Self {
            dashboard_id: attrs.string("id")?,
            custom_url: attrs.string("custom_url")?,
            custom_domain: attrs.string("custom_domain")?,
            logo: attrs.string("logo")?,
            favicon: attrs.string("favicon")?,
            link: attrs.string("link")?,
            description: attrs.string("description")?,
            header: attrs.string("header")?,
            width: attrs.opt_string("width")?.unwrap_or(defaults.width),
            refresh_rate: attrs.opt_int("refresh_rate")?.unwrap_or(defaults.refresh_rate),
            paginate: attrs.opt_bool("paginate")?.unwrap_or(defaults.paginate),
            pagination_rate: attrs
                .opt_int("pagination_rate")?
                .unwrap_or(defaults.pagination_rate),
            checks_per_page: attrs
                .opt_int("checks_per_page")?
                .unwrap_or(defaults.checks_per_page),
            use_tags_and_operator: attrs.bool("use_tags_and_operator")?,
            hide_tags: attrs.bool("hide_tags")?,
            enable_incidents: attrs.bool("enable_incidents")?,
            expand_checks: attrs.bool("expand_checks")?,
            show_header: attrs.opt_bool("show_header")?.unwrap_or(defaults.show_header),
            custom_css: attrs.string("custom_css")?,
            show_p95: attrs.opt_bool("show_p95")?.unwrap_or(defaults.show_p95),
            show_p99: attrs.opt_bool("show_p99")?.unwrap_or(defaults.show_p99),
            is_private: attrs.bool("is_private")?,
            tags: attrs.string_set("tags")?,
            keys,
        })
    }
}

impl ToAttributes for Dashboard {
    fn to_attributes(&self) -> AttributeWriter {
        let key = self.keys.first().map(|k| k.raw_key.as_str());
        AttributeWriter::new()
            .set_string("id", &self.dashboard_id)
            .set_string("custom_url", &self.custom_url)
            .set_string("custom_domain", &self.custom_domain)
            .set_string("logo", &self.logo)
            .set_string("favicon", &self.favicon)
            .set_string("link", &self.link)
            .set_string("description", &self.description)
            .set_string("header", &self.header)
            .set_string("width", &self.width)
            .set("refresh_rate", self.refresh_rate)
            .set("paginate", self.paginate)
            .set("pagination_rate", self.pagination_rate)
            .set("checks_per_page", self.checks_per_page)
            .set("use_tags_and_operator", self.use_tags_and_operator)
            .set("hide_tags", self.hide_tags)
            .set("enable_incidents", self.enable_incidents)
            .set("expand_checks", self.expand_checks)
            .set("show_header", self.show_header)
            .set_string("custom_css", &self.custom_css)
            .set("show_p95", self.show_p95)
            .set("show_p99", self.show_p99)
            .set("is_private", self.is_private)
            .set_string_set("tags", &self.tags)
            .set_opt_string("key", key)
    }
}
