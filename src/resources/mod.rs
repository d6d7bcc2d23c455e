//! Resource types managed by the provider.
//!
//! Every resource follows the same pattern: a schema, a conversion between
//! attributes and a typed API model, cross-field validation, and CRUD through
//! the [`ChecklyClient`]. [`ResourceModel`] captures the per-type parts and
//! [`ModelResource`] supplies the shared lifecycle, so the registry can hold
//! every type behind the object-safe [`Resource`] trait.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::attributes::{Attributes, FromAttributes, ToAttributes};
use crate::client::{ApiError, ChecklyClient, Endpoint};
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};

pub mod alert_channel;
pub mod check;
pub mod check_group;
pub mod client_certificate;
pub mod common;
pub mod dashboard;
pub mod environment_variable;
pub mod heartbeat;
pub mod maintenance_window;
pub mod monitor;
pub mod private_location;
pub mod snippet;
pub mod status_page;
pub mod trigger;

/// A resource type as the provider dispatches to it.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The resource type name, e.g. `checkly_check`.
    fn type_name(&self) -> &'static str;

    /// The attribute schema.
    fn schema(&self) -> Schema;

    /// Cross-field checks the schema cannot express.
    fn validate(&self, config: &Value) -> Vec<Diagnostic>;

    /// Create the object and return its state.
    async fn create(&self, client: &ChecklyClient, planned: &Value) -> Result<Value, ProviderError>;

    /// Refresh the state. Returns `Value::Null` when the object is gone.
    async fn read(&self, client: &ChecklyClient, state: &Value) -> Result<Value, ProviderError>;

    /// Update the object in place and return its new state.
    async fn update(
        &self,
        client: &ChecklyClient,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the object. Deleting an object that is already gone succeeds.
    async fn delete(&self, client: &ChecklyClient, state: &Value) -> Result<(), ProviderError>;

    /// Read an existing object by its import id.
    async fn import(&self, client: &ChecklyClient, id: &str) -> Result<Value, ProviderError>;
}

/// The per-type half of a resource.
///
/// For a normalized model `m`, `from_attributes(m.to_attributes())` is `m`.
pub trait ResourceModel: Endpoint + FromAttributes + ToAttributes + Clone + 'static {
    /// The resource type name.
    const TYPE_NAME: &'static str;

    /// Whether the API can update the object in place. When it cannot,
    /// every configurable attribute is `force_new`.
    const UPDATABLE: bool = true;

    /// The attribute schema.
    fn schema() -> Schema;

    /// Cross-field checks on raw configuration.
    fn validate(_config: &Attributes<'_>) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Restore values the API does not return (write-only or masked) from
    /// the version of the object the provider last knew.
    fn preserve_from(&mut self, _known: &Self) {}

    /// Attributes derived from the model and client settings.
    fn decorate(&self, state: Value, _client: &ChecklyClient) -> Value {
        state
    }
}

/// Adapts a [`ResourceModel`] to [`Resource`].
pub struct ModelResource<M>(PhantomData<fn() -> M>);

impl<M> ModelResource<M> {
    /// Create the adapter.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M> Default for ModelResource<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ResourceModel> ModelResource<M> {
    fn model(value: &Value) -> Result<M, ProviderError> {
        M::from_attributes(&Attributes::new(value)?)
    }

    fn state(model: &M, client: &ChecklyClient) -> Value {
        model.decorate(model.to_attributes().finish(), client)
    }

    fn api_error(op: &str, err: ApiError) -> ProviderError {
        ProviderError::from_api(&format!("{} {}", M::TYPE_NAME, op), err)
    }

    fn state_id(state: &Value) -> Option<String> {
        state
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    fn require_id(state: &Value, op: &str) -> Result<String, ProviderError> {
        Self::state_id(state).ok_or_else(|| {
            ProviderError::Validation(format!("{} {}: state has no id", M::TYPE_NAME, op))
        })
    }
}

#[async_trait]
impl<M: ResourceModel> Resource for ModelResource<M> {
    fn type_name(&self) -> &'static str {
        M::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        M::schema()
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        match Attributes::new(config) {
            Ok(attrs) => M::validate(&attrs),
            Err(err) => vec![Diagnostic::error(err.message().to_string())],
        }
    }

    async fn create(&self, client: &ChecklyClient, planned: &Value) -> Result<Value, ProviderError> {
        let model = Self::model(planned)?;
        let mut created = client
            .create(&model)
            .await
            .map_err(|e| Self::api_error("create", e))?;
        created.preserve_from(&model);

        tracing::info!(
            resource_type = M::TYPE_NAME,
            id = %created.remote_id().unwrap_or_default(),
            "Created resource"
        );
        Ok(Self::state(&created, client))
    }

    async fn read(&self, client: &ChecklyClient, state: &Value) -> Result<Value, ProviderError> {
        let Some(id) = Self::state_id(state) else {
            return Ok(Value::Null);
        };

        let mut current = match client.get::<M>(&id).await {
            Ok(current) => current,
            Err(err) if err.is_not_found() => {
                tracing::warn!(resource_type = M::TYPE_NAME, %id, "Resource gone, removing from state");
                return Ok(Value::Null);
            },
            Err(err) => return Err(Self::api_error("read", err)),
        };
        if let Ok(known) = Self::model(state) {
            current.preserve_from(&known);
        }
        Ok(Self::state(&current, client))
    }

    async fn update(
        &self,
        client: &ChecklyClient,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value, ProviderError> {
        if !M::UPDATABLE {
            return Err(ProviderError::Unimplemented(format!(
                "{} cannot be updated in place",
                M::TYPE_NAME
            )));
        }
        let id = Self::require_id(prior, "update")?;
        let model = Self::model(planned)?;
        let mut updated = client
            .update(&id, &model)
            .await
            .map_err(|e| Self::api_error("update", e))?;
        updated.preserve_from(&model);

        tracing::info!(resource_type = M::TYPE_NAME, %id, "Updated resource");
        Ok(Self::state(&updated, client))
    }

    async fn delete(&self, client: &ChecklyClient, state: &Value) -> Result<(), ProviderError> {
        let id = Self::require_id(state, "delete")?;
        match client.delete::<M>(&id).await {
            Ok(()) => {
                tracing::info!(resource_type = M::TYPE_NAME, %id, "Deleted resource");
                Ok(())
            },
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(Self::api_error("delete", err)),
        }
    }

    async fn import(&self, client: &ChecklyClient, id: &str) -> Result<Value, ProviderError> {
        let current = client
            .get::<M>(id)
            .await
            .map_err(|e| Self::api_error("import", e))?;
        Ok(Self::state(&current, client))
    }
}

/// All resource types, keyed by type name.
pub fn registry() -> BTreeMap<&'static str, Arc<dyn Resource>> {
    let resources: Vec<Arc<dyn Resource>> = vec![
        Arc::new(ModelResource::<crate::models::Check>::new()),
        Arc::new(ModelResource::<crate::models::CheckGroup>::new()),
        Arc::new(ModelResource::<crate::models::AlertChannel>::new()),
        Arc::new(ModelResource::<crate::models::Dashboard>::new()),
        Arc::new(ModelResource::<crate::models::StatusPage>::new()),
        Arc::new(ModelResource::<crate::models::StatusPageService>::new()),
        Arc::new(ModelResource::<crate::models::HeartbeatCheck>::new()),
        Arc::new(ModelResource::<crate::models::TcpMonitor>::new()),
        Arc::new(ModelResource::<crate::models::UrlMonitor>::new()),
        Arc::new(ModelResource::<crate::models::DnsMonitor>::new()),
        Arc::new(ModelResource::<crate::models::IcmpMonitor>::new()),
        Arc::new(ModelResource::<crate::models::Snippet>::new()),
        Arc::new(ModelResource::<crate::models::GlobalEnvironmentVariable>::new()),
        Arc::new(ModelResource::<crate::models::PrivateLocation>::new()),
        Arc::new(ModelResource::<crate::models::MaintenanceWindow>::new()),
        Arc::new(ModelResource::<crate::models::ClientCertificate>::new()),
        Arc::new(ModelResource::<crate::models::TriggerCheck>::new()),
        Arc::new(ModelResource::<crate::models::TriggerGroup>::new()),
    ];
    resources.into_iter().map(|r| (r.type_name(), r)).collect()
}
