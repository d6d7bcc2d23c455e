//! The gRPC plugin server.
//!
//! [`ProviderService`] is the typed surface a provider implements. [`serve`]
//! binds a local port, prints the handshake line the host reads from stdout,
//! and answers the host's requests until SIGTERM or SIGINT arrives. On a
//! signal the server stops accepting connections, gives in-flight requests
//! up to [`ServeOptions::shutdown_timeout`] to finish, and then calls
//! [`ProviderService::stop`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::generated as pb;
use crate::schema::{
    Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, ProviderSchema, Schema,
};
use crate::types::{
    ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};

/// The operations the host drives a provider through.
///
/// States and configurations are JSON objects shaped by the schemas the
/// provider returns from [`schema`](Self::schema). Errors that concern the
/// user's configuration are returned as diagnostics; a [`ProviderError`]
/// means the operation itself failed.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// The schemas of the provider block, every resource and every data
    /// source.
    fn schema(&self) -> ProviderSchema;

    /// Type names the provider serves, derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        let mut resources: Vec<String> = schema.resources.keys().cloned().collect();
        let mut data_sources: Vec<String> = schema.data_sources.keys().cloned().collect();
        resources.sort();
        data_sources.sort();
        ProviderMetadata {
            resources,
            data_sources,
            capabilities: Default::default(),
        }
    }

    /// Check the provider block without acting on it.
    async fn validate_provider_config(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(vec![])
    }

    /// Apply the provider block. Resource operations are only valid after a
    /// configure without errors.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Release what `configure` acquired.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Check a resource configuration.
    async fn validate_resource_config(
        &self,
        _resource_type: &str,
        _config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(vec![])
    }

    /// Bring state written under an older schema version up to date.
    async fn upgrade_resource_state(
        &self,
        _resource_type: &str,
        _version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        Ok(state)
    }

    /// Compute the state that applying `proposed_state` would produce.
    /// `prior_state` is `None` for a create; a null `proposed_state` plans
    /// a destroy.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create the remote object and return its state.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh the state. A null result removes the resource from state.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update the remote object in place.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Read an existing remote object into state.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::Unimplemented(format!(
            "import is not supported for {}",
            resource_type
        )))
    }

    /// Check a data source configuration.
    async fn validate_data_source_config(
        &self,
        _data_source_type: &str,
        _config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(vec![])
    }

    /// Read a data source.
    async fn read_data_source(&self, data_source_type: &str, _config: Value) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

// =========================================================================
// Wire conversion
// =========================================================================

/// Decode a JSON payload. Empty or malformed bytes decode as null.
fn decode(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|err| {
        warn!(error = %err, "Discarding malformed JSON payload");
        Value::Null
    })
}

fn encode(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

impl From<Diagnostic> for pb::Diagnostic {
    fn from(diag: Diagnostic) -> Self {
        let severity = match diag.severity {
            DiagnosticSeverity::Error => pb::diagnostic::Severity::Error,
            DiagnosticSeverity::Warning => pb::diagnostic::Severity::Warning,
        };
        Self {
            severity: severity as i32,
            summary: diag.summary,
            detail: diag.detail.unwrap_or_default(),
            attribute: diag.attribute.unwrap_or_default(),
        }
    }
}

fn to_proto(diagnostics: Vec<Diagnostic>) -> Vec<pb::Diagnostic> {
    diagnostics.into_iter().map(Into::into).collect()
}

fn error_diagnostics(err: ProviderError) -> Vec<pb::Diagnostic> {
    vec![Diagnostic::error(err.to_string()).into()]
}

fn nesting_mode(mode: BlockNestingMode) -> pb::nested_block::NestingMode {
    match mode {
        BlockNestingMode::Single => pb::nested_block::NestingMode::Single,
        BlockNestingMode::List => pb::nested_block::NestingMode::List,
        BlockNestingMode::Set => pb::nested_block::NestingMode::Set,
        BlockNestingMode::Map => pb::nested_block::NestingMode::Map,
    }
}

impl From<&Block> for pb::Block {
    fn from(block: &Block) -> Self {
        let attributes = block
            .attributes
            .iter()
            .map(|(name, attr)| pb::Attribute {
                name: name.clone(),
                r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
                required: attr.flags.required,
                optional: attr.flags.optional,
                computed: attr.flags.computed,
                sensitive: attr.flags.sensitive,
                description: attr.description.clone().unwrap_or_default(),
                force_new: attr.force_new,
                default_value: attr.default.as_ref().map(encode).unwrap_or_default(),
                deprecation_message: attr.deprecated.clone().unwrap_or_default(),
            })
            .collect();
        let block_types = block
            .blocks
            .iter()
            .map(|(name, nested)| pb::NestedBlock {
                type_name: name.clone(),
                block: Some((&nested.block).into()),
                nesting_mode: nesting_mode(nested.nesting_mode) as i32,
                min_items: nested.min_items as i32,
                max_items: nested.max_items as i32,
                force_new: nested.force_new,
                computed: nested.computed,
            })
            .collect();
        Self {
            attributes,
            block_types,
            description: block.description.clone().unwrap_or_default(),
        }
    }
}

impl From<&Schema> for pb::Schema {
    fn from(schema: &Schema) -> Self {
        Self {
            version: schema.version as i64,
            block: Some((&schema.block).into()),
        }
    }
}

fn log_diagnostics(operation: &str, type_name: &str, diagnostics: &[Diagnostic]) {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        warn!(operation, type_name, errors, "Validation reported errors");
    } else {
        debug!(operation, type_name, warnings = diagnostics.len(), "Validation passed");
    }
}

// =========================================================================
// gRPC service
// =========================================================================

/// Adapts a [`ProviderService`] to the generated gRPC trait.
struct GrpcProvider<P: ProviderService> {
    provider: Arc<P>,
}

type GrpcResult<T> = Result<Response<T>, Status>;

#[tonic::async_trait]
impl<P: ProviderService> pb::provider_server::Provider for GrpcProvider<P> {
    #[instrument(skip_all, name = "grpc.get_metadata")]
    async fn get_metadata(&self, _request: Request<pb::GetMetadataRequest>) -> GrpcResult<pb::GetMetadataResponse> {
        let metadata = self.provider.metadata();
        debug!(
            resources = metadata.resources.len(),
            data_sources = metadata.data_sources.len(),
            "Metadata served"
        );
        Ok(Response::new(pb::GetMetadataResponse {
            server_capabilities: Some(pb::ServerCapabilities {
                plan_destroy: metadata.capabilities.plan_destroy,
            }),
            resources: metadata.resources,
            data_sources: metadata.data_sources,
            diagnostics: vec![],
        }))
    }

    #[instrument(skip_all, name = "grpc.get_schema")]
    async fn get_schema(&self, _request: Request<pb::GetSchemaRequest>) -> GrpcResult<pb::GetSchemaResponse> {
        let schema = self.provider.schema();
        debug!(
            resources = schema.resources.len(),
            data_sources = schema.data_sources.len(),
            "Schema served"
        );
        Ok(Response::new(pb::GetSchemaResponse {
            provider: Some((&schema.provider).into()),
            resources: schema
                .resources
                .iter()
                .map(|(name, s)| (name.clone(), s.into()))
                .collect(),
            data_sources: schema
                .data_sources
                .iter()
                .map(|(name, s)| (name.clone(), s.into()))
                .collect(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip_all, name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: Request<pb::ValidateProviderConfigRequest>,
    ) -> GrpcResult<pb::ValidateProviderConfigResponse> {
        let config = decode(&request.into_inner().config);
        let diagnostics = match self.provider.validate_provider_config(config).await {
            Ok(diagnostics) => {
                log_diagnostics("validate_provider_config", "provider", &diagnostics);
                to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Provider config validation failed");
                error_diagnostics(e)
            },
        };
        Ok(Response::new(pb::ValidateProviderConfigResponse { diagnostics }))
    }

    #[instrument(skip_all, name = "grpc.configure")]
    async fn configure(&self, request: Request<pb::ConfigureRequest>) -> GrpcResult<pb::ConfigureResponse> {
        let config = decode(&request.into_inner().config);
        let diagnostics = match self.provider.configure(config).await {
            Ok(diagnostics) => {
                log_diagnostics("configure", "provider", &diagnostics);
                to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Configure failed");
                error_diagnostics(e)
            },
        };
        Ok(Response::new(pb::ConfigureResponse { diagnostics }))
    }

    #[instrument(skip_all, name = "grpc.stop")]
    async fn stop(&self, _request: Request<pb::StopRequest>) -> GrpcResult<pb::StopResponse> {
        let error = match self.provider.stop().await {
            Ok(()) => String::new(),
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            },
        };
        Ok(Response::new(pb::StopResponse { error }))
    }

    #[instrument(skip_all, name = "grpc.validate_resource_config", fields(resource_type = %request.get_ref().resource_type))]
    async fn validate_resource_config(
        &self,
        request: Request<pb::ValidateResourceConfigRequest>,
    ) -> GrpcResult<pb::ValidateResourceConfigResponse> {
        let req = request.into_inner();
        let config = decode(&req.config);
        let diagnostics = match self
            .provider
            .validate_resource_config(&req.resource_type, config)
            .await
        {
            Ok(diagnostics) => {
                log_diagnostics("validate_resource_config", &req.resource_type, &diagnostics);
                to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Resource config validation failed");
                error_diagnostics(e)
            },
        };
        Ok(Response::new(pb::ValidateResourceConfigResponse { diagnostics }))
    }

    #[instrument(skip_all, name = "grpc.upgrade_resource_state", fields(resource_type = %request.get_ref().resource_type))]
    async fn upgrade_resource_state(
        &self,
        request: Request<pb::UpgradeResourceStateRequest>,
    ) -> GrpcResult<pb::UpgradeResourceStateResponse> {
        let req = request.into_inner();
        let state = decode(&req.raw_state);
        let response = match self
            .provider
            .upgrade_resource_state(&req.resource_type, req.version, state)
            .await
        {
            Ok(upgraded) => {
                debug!(from_version = req.version, "State upgraded");
                pb::UpgradeResourceStateResponse {
                    upgraded_state: encode(&upgraded),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(from_version = req.version, error = %e, "State upgrade failed");
                pb::UpgradeResourceStateResponse {
                    upgraded_state: vec![],
                    diagnostics: error_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip_all, name = "grpc.plan", fields(resource_type = %request.get_ref().resource_type))]
    async fn plan(&self, request: Request<pb::PlanRequest>) -> GrpcResult<pb::PlanResponse> {
        let req = request.into_inner();
        let prior_state = Some(decode(&req.prior_state)).filter(|v| !v.is_null());
        let proposed_state = decode(&req.proposed_state);
        let config = decode(&req.config);

        let response = match self
            .provider
            .plan(&req.resource_type, prior_state, proposed_state, config)
            .await
        {
            Ok(result) => {
                info!(
                    changes = result.changes.len(),
                    requires_replace = result.requires_replace,
                    "Planned"
                );
                pb::PlanResponse {
                    planned_state: encode(&result.planned_state),
                    changes: result.changes.into_iter().map(Into::into).collect(),
                    requires_replace: result.requires_replace,
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Plan failed");
                pb::PlanResponse {
                    diagnostics: error_diagnostics(e),
                    ..Default::default()
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip_all, name = "grpc.create", fields(resource_type = %request.get_ref().resource_type))]
    async fn create(&self, request: Request<pb::CreateRequest>) -> GrpcResult<pb::CreateResponse> {
        let req = request.into_inner();
        let response = match self
            .provider
            .create(&req.resource_type, decode(&req.planned_state))
            .await
        {
            Ok(state) => pb::CreateResponse {
                state: encode(&state),
                diagnostics: vec![],
            },
            Err(e) => {
                error!(error = %e, "Create failed");
                pb::CreateResponse {
                    state: vec![],
                    diagnostics: error_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip_all, name = "grpc.read", fields(resource_type = %request.get_ref().resource_type))]
    async fn read(&self, request: Request<pb::ReadRequest>) -> GrpcResult<pb::ReadResponse> {
        let req = request.into_inner();
        let response = match self
            .provider
            .read(&req.resource_type, decode(&req.current_state))
            .await
        {
            Ok(state) => pb::ReadResponse {
                state: encode(&state),
                diagnostics: vec![],
            },
            Err(e) => {
                error!(error = %e, "Read failed");
                pb::ReadResponse {
                    state: vec![],
                    diagnostics: error_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip_all, name = "grpc.update", fields(resource_type = %request.get_ref().resource_type))]
    async fn update(&self, request: Request<pb::UpdateRequest>) -> GrpcResult<pb::UpdateResponse> {
        let req = request.into_inner();
        let response = match self
            .provider
            .update(
                &req.resource_type,
                decode(&req.prior_state),
                decode(&req.planned_state),
            )
            .await
        {
            Ok(state) => pb::UpdateResponse {
                state: encode(&state),
                diagnostics: vec![],
            },
            Err(e) => {
                error!(error = %e, "Update failed");
                pb::UpdateResponse {
                    state: vec![],
                    diagnostics: error_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip_all, name = "grpc.delete", fields(resource_type = %request.get_ref().resource_type))]
    async fn delete(&self, request: Request<pb::DeleteRequest>) -> GrpcResult<pb::DeleteResponse> {
        let req = request.into_inner();
        let diagnostics = match self
            .provider
            .delete(&req.resource_type, decode(&req.current_state))
            .await
        {
            Ok(()) => vec![],
            Err(e) => {
                error!(error = %e, "Delete failed");
                error_diagnostics(e)
            },
        };
        Ok(Response::new(pb::DeleteResponse { diagnostics }))
    }

    #[instrument(skip_all, name = "grpc.import_resource_state", fields(resource_type = %request.get_ref().resource_type, id = %request.get_ref().id))]
    async fn import_resource_state(
        &self,
        request: Request<pb::ImportResourceStateRequest>,
    ) -> GrpcResult<pb::ImportResourceStateResponse> {
        let req = request.into_inner();

        let response = match self.provider.import_resource(&req.resource_type, &req.id).await {
            Ok(imported) => {
                info!(count = imported.len(), "Imported");
                pb::ImportResourceStateResponse {
                    imported: imported
                        .into_iter()
                        .map(|r| pb::ImportedResource {
                            resource_type: r.resource_type,
                            state: encode(&r.state),
                        })
                        .collect(),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Import failed");
                pb::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: error_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip_all, name = "grpc.validate_data_source_config", fields(data_source_type = %request.get_ref().data_source_type))]
    async fn validate_data_source_config(
        &self,
        request: Request<pb::ValidateDataSourceConfigRequest>,
    ) -> GrpcResult<pb::ValidateDataSourceConfigResponse> {
        let req = request.into_inner();
        let diagnostics = match self
            .provider
            .validate_data_source_config(&req.data_source_type, decode(&req.config))
            .await
        {
            Ok(diagnostics) => {
                log_diagnostics("validate_data_source_config", &req.data_source_type, &diagnostics);
                to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Data source config validation failed");
                error_diagnostics(e)
            },
        };
        Ok(Response::new(pb::ValidateDataSourceConfigResponse { diagnostics }))
    }

    #[instrument(skip_all, name = "grpc.read_data_source", fields(data_source_type = %request.get_ref().data_source_type))]
    async fn read_data_source(
        &self,
        request: Request<pb::ReadDataSourceRequest>,
    ) -> GrpcResult<pb::ReadDataSourceResponse> {
        let req = request.into_inner();
        let response = match self
            .provider
            .read_data_source(&req.data_source_type, decode(&req.config))
            .await
        {
            Ok(state) => pb::ReadDataSourceResponse {
                state: encode(&state),
                diagnostics: vec![],
            },
            Err(e) => {
                error!(error = %e, "Data source read failed");
                pb::ReadDataSourceResponse {
                    state: vec![],
                    diagnostics: error_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }
}

// =========================================================================
// Serving
// =========================================================================

/// Options for [`serve_with_options`].
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// How long in-flight requests may run after a shutdown signal.
    /// Default: 30 seconds.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServeOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Resolve when SIGTERM or SIGINT (CTRL+C on Windows) arrives.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = sigint.recv() => info!("Received SIGINT"),
                }
            },
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Signal handlers unavailable, waiting for CTRL+C only");
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            },
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received CTRL+C"),
            Err(e) => {
                warn!(error = %e, "CTRL+C handler unavailable, serving until killed");
                std::future::pending::<()>().await;
            },
        }
    }
}

/// Serve `provider` on a free local port until a shutdown signal.
///
/// The first line on stdout is the handshake
/// `CHECKLY_PROVIDER|<protocol version>|<address>`.
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// [`serve`] with custom options.
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve_until(provider, listener, options, wait_for_shutdown_signal()).await
}

/// Serve on a specific address until a shutdown signal.
pub async fn serve_on<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    serve_until(provider, listener, options, wait_for_shutdown_signal()).await
}

/// Serve on `listener` until `shutdown` resolves, then drain in-flight
/// requests for at most `options.shutdown_timeout` and stop the provider.
pub async fn serve_until<P, F>(
    provider: P,
    listener: TcpListener,
    options: ServeOptions,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    P: ProviderService,
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    println!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr);
    info!(address = %addr, protocol = PROTOCOL_VERSION, "Provider server listening");

    let provider = Arc::new(provider);
    let service = pb::provider_server::ProviderServer::new(GrpcProvider {
        provider: Arc::clone(&provider),
    });

    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();
    let server = Server::builder().add_service(service).serve_with_incoming_shutdown(
        tokio_stream::wrappers::TcpListenerStream::new(listener),
        async {
            let _ = drain_rx.await;
        },
    );
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            if let Err(e) = result {
                error!(error = %e, "Server failed");
                return Err(e.into());
            }
        },
        () = shutdown => {
            let _ = drain_tx.send(());
            match tokio::time::timeout(options.shutdown_timeout, &mut server).await {
                Ok(Ok(())) => debug!("In-flight requests drained"),
                Ok(Err(e)) => {
                    error!(error = %e, "Server failed during shutdown");
                    return Err(e.into());
                },
                Err(_) => warn!(
                    timeout = ?options.shutdown_timeout,
                    "Shutdown timeout exceeded, abandoning in-flight requests"
                ),
            }
        },
    }

    if let Err(e) = provider.stop().await {
        warn!(error = %e, "Provider stop failed");
    }
    info!("Provider server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ChecklyProvider;
    use crate::testing::FakeChecklyApi;
    use pb::provider_server::Provider as _;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn grpc() -> GrpcProvider<ChecklyProvider> {
        GrpcProvider {
            provider: Arc::new(ChecklyProvider::with_transport(Arc::new(FakeChecklyApi::new()))),
        }
    }

    fn bytes(value: Value) -> Vec<u8> {
        encode(&value)
    }

    #[tokio::test]
    async fn test_get_schema_maps_block_flags() {
        let response = grpc()
            .get_schema(Request::new(pb::GetSchemaRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.resources.len(), 18);

        let check = response.resources["checkly_check"].block.as_ref().unwrap();
        let request = check
            .block_types
            .iter()
            .find(|b| b.type_name == "request")
            .unwrap();
        let basic_auth = request
            .block
            .as_ref()
            .unwrap()
            .block_types
            .iter()
            .find(|b| b.type_name == "basic_auth")
            .unwrap();
        assert!(basic_auth.computed);

        let provider = response.provider.unwrap().block.unwrap();
        let api_key = provider.attributes.iter().find(|a| a.name == "api_key").unwrap();
        assert!(api_key.sensitive);
    }

    #[tokio::test]
    async fn test_metadata_is_sorted() {
        let response = grpc()
            .get_metadata(Request::new(pb::GetMetadataRequest {}))
            .await
            .unwrap()
            .into_inner();
        let mut sorted = response.resources.clone();
        sorted.sort();
        assert_eq!(response.resources, sorted);
        assert_eq!(response.data_sources, vec!["checkly_static_ips"]);
    }

    #[tokio::test]
    async fn test_errors_become_diagnostics() {
        let service = grpc();
        let response = service
            .create(Request::new(pb::CreateRequest {
                resource_type: "checkly_snippet".into(),
                planned_state: bytes(json!({"name": "s", "script": "x"})),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(response.state.is_empty());
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].severity,
            pb::diagnostic::Severity::Error as i32
        );
    }

    #[tokio::test]
    async fn test_configure_then_create_over_grpc() {
        let service = grpc();
        let configured = service
            .configure(Request::new(pb::ConfigureRequest {
                config: bytes(json!({"api_key": "cu_test"})),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(configured.diagnostics.is_empty());

        let created = service
            .create(Request::new(pb::CreateRequest {
                resource_type: "checkly_snippet".into(),
                planned_state: bytes(json!({"name": "s", "script": "x"})),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
        let state: Value = serde_json::from_slice(&created.state).unwrap();
        assert_eq!(state["id"], "1");
    }

    #[tokio::test]
    async fn test_plan_with_empty_prior_is_create() {
        let response = grpc()
            .plan(Request::new(pb::PlanRequest {
                resource_type: "checkly_snippet".into(),
                prior_state: vec![],
                proposed_state: bytes(json!({"name": "s", "script": "x"})),
                config: bytes(json!({"name": "s", "script": "x"})),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(response.diagnostics.is_empty());
        assert!(!response.changes.is_empty());
        assert!(!response.requires_replace);
    }

    #[tokio::test]
    async fn test_validation_diagnostics_keep_attribute() {
        let response = grpc()
            .validate_resource_config(Request::new(pb::ValidateResourceConfigRequest {
                resource_type: "checkly_snippet".into(),
                config: bytes(json!({"name": "s"})),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(response
            .diagnostics
            .iter()
            .any(|d| d.attribute == "script"));
    }

    #[test]
    fn test_malformed_payload_decodes_as_null() {
        assert_eq!(decode(b""), Value::Null);
        assert_eq!(decode(b"{not json"), Value::Null);
        assert_eq!(decode(b"{\"a\":1}"), json!({"a": 1}));
    }

    struct Stoppable(Arc<AtomicBool>);

    #[async_trait::async_trait]
    impl ProviderService for Stoppable {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
        }

        async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(vec![])
        }

        async fn stop(&self) -> Result<(), ProviderError> {
            self.0.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn plan(
            &self,
            _resource_type: &str,
            _prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            Ok(PlanResult::no_change(proposed_state))
        }

        async fn create(&self, _resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn read(&self, _resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
            Ok(current_state)
        }

        async fn update(
            &self,
            _resource_type: &str,
            _prior_state: Value,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn delete(&self, _resource_type: &str, _current_state: Value) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_signal_then_stops_provider() {
        let stopped = Arc::new(AtomicBool::new(false));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let serving = serve_until(
            Stoppable(Arc::clone(&stopped)),
            listener,
            ServeOptions::new().with_shutdown_timeout(Duration::from_millis(10)),
            async {
                let _ = rx.await;
            },
        );
        let signal = async {
            // Still serving well past the shutdown timeout.
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(!stopped.load(Ordering::SeqCst));
            tx.send(()).unwrap();
        };

        let (result, ()) = tokio::join!(serving, signal);
        assert!(result.is_ok());
        assert!(stopped.load(Ordering::SeqCst));
    }
}
