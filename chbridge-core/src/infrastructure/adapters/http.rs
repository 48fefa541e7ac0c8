// chbridge-core/src/infrastructure/adapters/http.rs

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

// Imports Hexagonaux
use crate::domain::error::DomainError;
use crate::domain::schema::{ColumnName, TableName};
use crate::domain::source::{ConnectionParams, Credential, Session};
use crate::domain::transfer::{ExportRequest, IngestReceipt, IngestRequest};
use crate::error::BridgeError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::DataSource;

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    token: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestionResponse {
    message: String,
    records_processed: usize,
}

/// Which family of call failed; decides how a non-success status is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Connect,
    Schema,
    Export,
    Ingest,
}

/// `DataSource` over the ClickHouse bridge service's JSON API.
pub struct HttpDataSource {
    client: Client,
    base: Url,
}

impl HttpDataSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InfrastructureError> {
        let base = Url::parse(base_url).map_err(|e| {
            InfrastructureError::ConfigError(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(InfrastructureError::ConfigError(format!(
                "Base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chbridge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, BridgeError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                InfrastructureError::ConfigError(format!("Base URL '{}' cannot carry a path", self.base))
            })?
            .pop_if_empty()
            .push(path);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send(&self, call: Call, request: RequestBuilder) -> Result<Response, BridgeError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(%status, ?call, "Data source answered with a failure status");
        Err(classify_failure(call, status, &body).into())
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    #[instrument(skip(self, params), fields(host = %params.host, port = params.port))]
    async fn connect(&self, params: &ConnectionParams) -> Result<Session, BridgeError> {
        let url = self.endpoint("connect", &[])?;
        let start = Instant::now();
        let response = self
            .send(Call::Connect, self.client.post(url).json(params))
            .await?;
        let body: ConnectResponse = response.json().await.map_err(transport_error)?;
        debug!("Connect answered in {:.2?}", start.elapsed());

        let message = body.message.unwrap_or_default();
        match body.token.filter(|t| !t.is_empty()) {
            Some(token) => Ok(Session {
                credential: Credential::new(token),
                message,
            }),
            None => Err(DomainError::Unauthorized(if message.is_empty() {
                "Failed to establish connection.".into()
            } else {
                message
            })
            .into()),
        }
    }

    #[instrument(skip_all)]
    async fn validate(&self, credential: &Credential) -> Result<bool, BridgeError> {
        let url = self.endpoint("validate", &[])?;
        let response = self
            .send(
                Call::Schema,
                self.client.get(url).bearer_auth(credential.expose()),
            )
            .await;
        match response {
            Ok(r) => r.json::<bool>().await.map_err(transport_error),
            // A refused token is simply not valid anymore.
            Err(BridgeError::Domain(DomainError::Unauthorized(_))) => Ok(false),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all)]
    async fn list_tables(&self, credential: &Credential) -> Result<Vec<TableName>, BridgeError> {
        let url = self.endpoint("tables", &[])?;
        let response = self
            .send(
                Call::Schema,
                self.client.get(url).bearer_auth(credential.expose()),
            )
            .await?;
        response.json().await.map_err(transport_error)
    }

    #[instrument(skip(self, credential))]
    async fn list_columns(
        &self,
        credential: &Credential,
        table: &str,
    ) -> Result<Vec<ColumnName>, BridgeError> {
        let url = self.endpoint("columns", &[("table", table)])?;
        let response = self
            .send(
                Call::Schema,
                self.client.get(url).bearer_auth(credential.expose()),
            )
            .await?;
        response.json().await.map_err(transport_error)
    }

    #[instrument(skip_all, fields(table = %request.table))]
    async fn export_table(
        &self,
        credential: &Credential,
        request: &ExportRequest,
    ) -> Result<String, BridgeError> {
        let url = self.endpoint(
            "export",
            &[
                ("table", request.table.as_str()),
                ("filePath", request.destination.as_str()),
            ],
        )?;
        let response = self
            .send(
                Call::Export,
                self.client
                    .post(url)
                    .bearer_auth(credential.expose())
                    .json(&request.columns),
            )
            .await?;
        response.text().await.map_err(transport_error)
    }

    #[instrument(skip_all, fields(table = %request.table, rows = request.rows.len()))]
    async fn ingest_rows(
        &self,
        credential: &Credential,
        request: &IngestRequest,
    ) -> Result<IngestReceipt, BridgeError> {
        let batch_size = request.batch_size.to_string();
        let url = self.endpoint(
            "ingest",
            &[("table", request.table.as_str()), ("batchSize", batch_size.as_str())],
        )?;
        let response = self
            .send(
                Call::Ingest,
                self.client
                    .post(url)
                    .bearer_auth(credential.expose())
                    .json(&request.rows),
            )
            .await?;
        let body: IngestionResponse = response.json().await.map_err(transport_error)?;
        Ok(IngestReceipt {
            message: body.message,
            records_processed: body.records_processed,
        })
    }

    fn name(&self) -> &str {
        "clickhouse-http"
    }
}

// Unreachable hosts and timeouts are transport failures; a body that does not
// decode is a malformed response.
fn transport_error(err: reqwest::Error) -> BridgeError {
    if err.is_decode() {
        return DomainError::Transport(format!("Malformed response from data source: {}", err))
            .into();
    }
    InfrastructureError::Http(err).into()
}

fn classify_failure(call: Call, status: StatusCode, body: &str) -> DomainError {
    let detail = failure_detail(body);

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return DomainError::Unauthorized(if detail.is_empty() {
            status.to_string()
        } else {
            detail
        });
    }

    match call {
        // The connect endpoint reports bad credentials and unreachable databases alike.
        Call::Connect => DomainError::Unauthorized(if detail.is_empty() {
            "Failed to establish connection.".into()
        } else {
            detail
        }),
        Call::Schema => DomainError::Transport(if detail.is_empty() {
            format!("Data source answered {}", status)
        } else {
            format!("Data source answered {}: {}", status, detail)
        }),
        // Blank detail falls back to the generic message in `user_message`.
        Call::Export => DomainError::Export(detail),
        Call::Ingest => DomainError::Ingest(detail),
    }
}

// Failure bodies are either plain text or a JSON object with a `message` field.
fn failure_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct WithMessage {
        message: Option<String>,
    }

    let body = body.trim();
    match serde_json::from_str::<WithMessage>(body) {
        Ok(WithMessage { message }) => message.unwrap_or_default().trim().to_string(),
        Err(_) => body.to_string(),
    }
}
