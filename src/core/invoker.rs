//! SOAP transport over HTTPS.
//!
//! Each call builds its own HTTP client: no pooled connection is reused
//! between calls, TLS 1.2+ with full certificate and hostname checks.

use crate::core::xml::{self, ServiceDescription};
use crate::domain::model::{DefinitionSource, RpcRequest, ServiceEndpoint};
use crate::domain::ports::RpcTransport;
use crate::utils::error::{BrtError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub timeout: Duration,
    /// Refuse plaintext addresses. Only stub servers in tests turn this off.
    pub https_only: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            https_only: true,
        }
    }
}

impl TransportSettings {
    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .https_only(self.https_only)
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| BrtError::transport(format!("failed to build HTTP client: {}", e)))
    }
}

pub struct SoapInvoker {
    settings: TransportSettings,
    // parsed definitions, kept for the life of the invoker
    descriptions: Mutex<HashMap<DefinitionSource, ServiceDescription>>,
}

impl SoapInvoker {
    pub fn new(settings: TransportSettings) -> Self {
        Self {
            settings,
            descriptions: Mutex::new(HashMap::new()),
        }
    }

    async fn describe(&self, source: &DefinitionSource) -> Result<ServiceDescription> {
        let known = self
            .descriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(source)
            .cloned();
        if let Some(known) = known {
            return Ok(known);
        }

        let document = match source {
            DefinitionSource::Cached(path) => {
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    BrtError::transport(format!(
                        "cached service definition {} unreadable: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            DefinitionSource::Remote(url) => {
                tracing::debug!("Fetching service definition: {}", url);
                let response = self.settings.http_client()?.get(url).send().await?;
                if !response.status().is_success() {
                    return Err(BrtError::transport(format!(
                        "service definition {} returned HTTP {}",
                        url,
                        response.status()
                    )));
                }
                response.text().await?
            }
        };

        let description = xml::parse_definition(&document)?;
        self.descriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source.clone(), description.clone());
        Ok(description)
    }
}

impl Default for SoapInvoker {
    fn default() -> Self {
        Self::new(TransportSettings::default())
    }
}

#[async_trait]
impl RpcTransport for SoapInvoker {
    async fn call(
        &self,
        endpoint: &ServiceEndpoint,
        request: &RpcRequest,
    ) -> Result<serde_json::Value> {
        let description = self.describe(&endpoint.definition).await?;

        let address = endpoint
            .invocation_address
            .clone()
            .or(description.address)
            .ok_or_else(|| {
                BrtError::transport(format!(
                    "no address for {}: none configured and none in {}",
                    endpoint.operation_key, endpoint.definition
                ))
            })?;

        let envelope = xml::build_envelope(&description.target_namespace, request);
        tracing::debug!(
            operation = request.operation,
            address = %address,
            "Calling BRT service"
        );

        let response = self
            .settings
            .http_client()?
            .post(&address)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(operation = request.operation, %status, "BRT response received");

        match (status.is_success(), xml::parse_response(&body)) {
            (true, parsed) => parsed,
            // SOAP 1.1 servers report faults with HTTP 500
            (false, Err(fault)) if xml::is_soap_fault(&fault) => Err(fault),
            (false, _) => Err(BrtError::transport(format!(
                "{} returned HTTP {}",
                request.operation, status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_require_https() {
        let settings = TransportSettings::default();
        assert!(settings.https_only);
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert!(settings.http_client().is_ok());
    }

    #[tokio::test]
    async fn test_cached_definition_is_read_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("def.wsdl");
        std::fs::write(
            &path,
            r#"<definitions targetNamespace="http://wsr.brt.it/"><service><port><address location="https://example.test/svc"/></port></service></definitions>"#,
        )
        .unwrap();

        let invoker = SoapInvoker::default();
        let source = DefinitionSource::Cached(path.clone());
        let description = invoker.describe(&source).await.unwrap();
        assert_eq!(description.address.as_deref(), Some("https://example.test/svc"));

        // memoized: a deleted file no longer matters
        std::fs::remove_file(&path).unwrap();
        assert!(invoker.describe(&source).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_cached_definition_is_transport_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = DefinitionSource::Cached(dir.path().join("gone.wsdl"));

        let err = SoapInvoker::default().describe(&source).await.unwrap_err();

        assert!(matches!(err, BrtError::Transport { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_plain_http_address_is_refused() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("def.wsdl");
        std::fs::write(
            &path,
            r#"<definitions targetNamespace="http://wsr.brt.it/"><service><port><address location="http://127.0.0.1:9/svc"/></port></service></definitions>"#,
        )
        .unwrap();

        let endpoint = ServiceEndpoint {
            operation_key: "legenda_esiti".to_string(),
            definition: DefinitionSource::Cached(path),
            invocation_address: None,
        };
        let err = SoapInvoker::default()
            .call(&endpoint, &RpcRequest::new("GetLegendaEsiti"))
            .await
            .unwrap_err();

        assert!(matches!(err, BrtError::Transport { .. }));
    }
}
