//! The Checkly provider: dispatches host requests to resource and data
//! source types.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::{ChecklyClient, HttpTransport, Transport};
use crate::config::ProviderConfig;
use crate::data_sources::{self, DataSource};
use crate::error::ProviderError;
use crate::plan::plan;
use crate::resources::{self, Resource};
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation::validate;

/// Provider for the Checkly monitoring API.
pub struct ChecklyProvider {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
    transport: Option<Arc<dyn Transport>>,
    client: RwLock<Option<Arc<ChecklyClient>>>,
}

impl Default for ChecklyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecklyProvider {
    /// A provider that talks to the API over HTTPS once configured.
    pub fn new() -> Self {
        Self {
            resources: resources::registry(),
            data_sources: data_sources::registry(),
            transport: None,
            client: RwLock::new(None),
        }
    }

    /// A provider that sends every request through `transport` instead of
    /// HTTPS. Credentials are still required by `configure`.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::new()
        }
    }

    fn resource(&self, resource_type: &str) -> Result<&Arc<dyn Resource>, ProviderError> {
        self.resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&Arc<dyn DataSource>, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    async fn client(&self) -> Result<Arc<ChecklyClient>, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider used before it was configured".to_string())
        })
    }

    fn build_client(&self, config: &ProviderConfig) -> Result<ChecklyClient, ProviderError> {
        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(
                HttpTransport::new(
                    config.api_url.clone(),
                    config.api_key.clone(),
                    config.account_id.clone(),
                )
                .map_err(|e| ProviderError::Configuration(e.to_string()))?,
            ),
        };
        Ok(ChecklyClient::new(transport, config.api_url.clone(), config.timeout))
    }
}

#[async_trait::async_trait]
impl ProviderService for ChecklyProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        let schema = self
            .resources
            .iter()
            .fold(schema, |schema, (name, r)| schema.with_resource(*name, r.schema()));
        self.data_sources
            .iter()
            .fold(schema, |schema, (name, d)| schema.with_data_source(*name, d.schema()))
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&ProviderConfig::schema(), &config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = validate(&ProviderConfig::schema(), &config);
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }
        let settings = match ProviderConfig::from_config(&config) {
            Ok(settings) => settings,
            Err(err) => return Ok(vec![err.into()]),
        };
        let client = self.build_client(&settings)?;

        info!(
            api_url = %settings.api_url,
            account_id = settings.account_id.as_deref().unwrap_or("-"),
            timeout = ?settings.timeout,
            "Provider configured"
        );
        *self.client.write().await = Some(Arc::new(client));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        debug!("Provider client released");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let mut diagnostics = validate(&resource.schema(), &config);
        diagnostics.extend(resource.validate(&config));
        Ok(diagnostics)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(plan(&resource.schema(), prior_state.as_ref(), &proposed_state))
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.create(&client, &planned_state).await
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.read(&client, &current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.update(&client, &prior_state, &planned_state).await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.delete(&client, &current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let state = resource.import(&client, id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let mut diagnostics = validate(&data_source.schema(), &config);
        diagnostics.extend(data_source.validate(&config));
        Ok(diagnostics)
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let client = self.client().await?;
        data_source.read(&client, &config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeChecklyApi;
    use serde_json::json;

    fn provider() -> ChecklyProvider {
        ChecklyProvider::with_transport(Arc::new(FakeChecklyApi::new()))
    }

    #[tokio::test]
    async fn test_schema_lists_every_type() {
        let schema = provider().schema();
        assert_eq!(schema.resources.len(), 18);
        assert!(schema.resources.contains_key("checkly_check"));
        assert!(schema.data_sources.contains_key("checkly_static_ips"));
        assert!(schema.provider.block.attributes["api_key"].flags.sensitive);
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = provider();
        let err = provider
            .validate_resource_config("checkly_widget", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));

        let err = provider
            .read_data_source("checkly_widgets", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_operations_before_configure() {
        let err = provider()
            .create("checkly_snippet", json!({"name": "s", "script": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_rejects_wrong_types() {
        let diagnostics = provider().configure(json!({"api_key": 42})).await.unwrap();
        assert!(has_errors(&diagnostics));
    }

    #[tokio::test]
    async fn test_stop_releases_client() {
        let provider = provider();
        let diagnostics = provider.configure(json!({"api_key": "cu_test"})).await.unwrap();
        assert!(!has_errors(&diagnostics));
        provider.stop().await.unwrap();
        let err = provider.read("checkly_snippet", json!({"id": "1"})).await.unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_resource_validation_combines_schema_and_rules() {
        let provider = provider();
        let diagnostics = provider
            .validate_resource_config(
                "checkly_maintenance_windows",
                json!({"name": "w", "starts_at": "2024-01-01T00:00:00Z", "repeat_interval": 2}),
            )
            .await
            .unwrap();
        let attributes: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert!(attributes.contains(&"ends_at"), "{:?}", diagnostics);
        assert!(attributes.contains(&"repeat_interval"), "{:?}", diagnostics);
    }
}
