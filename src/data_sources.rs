//! Data sources: read-only lookups against the Checkly API.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::attributes::{AttributeWriter, Attributes};
use crate::client::ChecklyClient;
use crate::error::ProviderError;
use crate::models::StaticIp;
use crate::resources::common::IP_FAMILIES;
use crate::schema::{Attribute, Diagnostic, Schema, Validator};

/// A data source type as the provider dispatches to it.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The data source type name.
    fn type_name(&self) -> &'static str;

    /// The attribute schema.
    fn schema(&self) -> Schema;

    /// Cross-field checks the schema cannot express.
    fn validate(&self, _config: &Value) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Read the data described by `config`.
    async fn read(&self, client: &ChecklyClient, config: &Value) -> Result<Value, ProviderError>;
}

/// `checkly_static_ips`: the public addresses checks run from.
pub struct StaticIps;

impl StaticIps {
    /// The data source type name.
    pub const TYPE_NAME: &'static str = "checkly_static_ips";

    /// Keep the addresses matching the filters, sorted and de-duplicated.
    /// Empty filters match everything.
    pub fn filter(ips: &[StaticIp], locations: &[String], ip_family: Option<&str>) -> Vec<String> {
        let mut addresses: Vec<String> = ips
            .iter()
            .filter(|ip| locations.is_empty() || locations.contains(&ip.region))
            .filter(|ip| ip_family.map_or(true, |family| ip.family() == family))
            .map(|ip| ip.address.clone())
            .collect();
        addresses.sort();
        addresses.dedup();
        addresses
    }

    /// An id derived from the filters, so reading the same query twice yields
    /// the same id.
    fn id(locations: &[String], ip_family: Option<&str>) -> String {
        let locations = if locations.is_empty() {
            "all".to_string()
        } else {
            locations.join(",")
        };
        format!("static-ips:{}:{}", locations, ip_family.unwrap_or("all"))
    }
}

#[async_trait]
impl DataSource for StaticIps {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Static IP addresses Checkly runs checks from.")
            .with_id()
            .with_attribute(
                "locations",
                Attribute::optional_string_set()
                    .with_description("Only include addresses of these locations."),
            )
            .with_attribute(
                "ip_family",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(IP_FAMILIES))
                    .with_description("Only include IPv4 or IPv6 addresses."),
            )
            .with_attribute(
                "addresses",
                Attribute::computed_string_set().with_description("The matching addresses."),
            )
    }

    async fn read(&self, client: &ChecklyClient, config: &Value) -> Result<Value, ProviderError> {
        let attrs = Attributes::new(config)?;
        let locations = attrs.string_set("locations")?;
        let ip_family = attrs.opt_string("ip_family")?;

        let ips: Vec<StaticIp> = client
            .list(StaticIp::PATH)
            .await
            .map_err(|e| ProviderError::from_api(Self::TYPE_NAME, e))?;
        let addresses = Self::filter(&ips, &locations, ip_family.as_deref());
        tracing::debug!(
            data_source_type = Self::TYPE_NAME,
            total = ips.len(),
            matched = addresses.len(),
            "Read static IPs"
        );

        Ok(AttributeWriter::new()
            .set_string("id", &Self::id(&locations, ip_family.as_deref()))
            .set_string_set("locations", &locations)
            .set_opt_string("ip_family", ip_family.as_deref())
            .set_string_set("addresses", &addresses)
            .finish())
    }
}

/// All data source types, keyed by type name.
pub fn registry() -> BTreeMap<&'static str, Arc<dyn DataSource>> {
    let sources: Vec<Arc<dyn DataSource>> = vec![Arc::new(StaticIps)];
    sources.into_iter().map(|s| (s.type_name(), s)).collect()
}
