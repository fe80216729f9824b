//! Public entry point: the BRT tracking operations.
//!
//! Every operation goes through the same gate: throttle, resolve the
//! endpoint, make one remote call, check ESITO, map the payload. Legends
//! repeat the throttle/call/check part once per page.

use crate::adapters::WsdlCache;
use crate::config::BrtConfig;
use crate::core::invoker::SoapInvoker;
use crate::core::mapper;
use crate::core::pagination::{collect_legend, LegendSpec};
use crate::core::rate_limiter::{FixedWindowRateLimiter, GLOBAL_WINDOW};
use crate::core::resolver::EndpointResolver;
use crate::core::status;
use crate::domain::model::{
    EventLegendEntry, Operation, RpcRequest, ShipmentIdLookup, ShipmentRecord, StatusLegendEntry,
};
use crate::domain::ports::{RateLimiter, RpcTransport};
use crate::utils::error::{BrtError, Result};
use crate::utils::validation::validate_required_field;
use serde_json::Value;
use std::sync::Arc;

pub struct BrtTrackingClient<T: RpcTransport> {
    transport: T,
    resolver: EndpointResolver,
    limiter: Arc<dyn RateLimiter>,
    client_id: Option<String>,
    language: String,
}

impl BrtTrackingClient<SoapInvoker> {
    /// Builds a SOAP client with its own rate limiter.
    pub fn from_config(config: &BrtConfig) -> Self {
        let limiter = Arc::new(FixedWindowRateLimiter::new(config.throttle_per_minute));
        Self::from_config_with_limiter(config, limiter)
    }

    /// Clients sharing `limiter` share one call budget.
    pub fn from_config_with_limiter(config: &BrtConfig, limiter: Arc<dyn RateLimiter>) -> Self {
        let settings = config.transport_settings();
        let mut resolver = EndpointResolver::new(config.wsdl.clone(), config.locations.clone());
        if config.cache_wsdl_locally {
            resolver = resolver.with_cache(Arc::new(WsdlCache::new(
                &config.wsdl_cache_path,
                config.definition_urls(),
                settings.clone(),
            )));
        }

        let client = Self::new(SoapInvoker::new(settings), resolver, limiter)
            .with_language(config.language.clone());
        match &config.client_id {
            Some(id) => client.with_client_id(id.clone()),
            None => client,
        }
    }
}

impl<T: RpcTransport> BrtTrackingClient<T> {
    pub fn new(transport: T, resolver: EndpointResolver, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            transport,
            resolver,
            limiter,
            client_id: None,
            language: String::new(),
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn client_id(&self) -> Result<&str> {
        validate_required_field("client_id", &self.client_id).map(String::as_str)
    }

    /// The legend services take the client id as an integer.
    fn numeric_client_id(&self) -> Result<i64> {
        let id = self.client_id()?;
        id.trim()
            .parse()
            .map_err(|_| BrtError::InvalidConfigValue {
                field: "client_id".to_string(),
                value: id.to_string(),
                reason: "Legend services need a numeric client id".to_string(),
            })
    }

    fn language_or_default(&self, lang: Option<&str>) -> String {
        lang.map(str::to_string)
            .unwrap_or_else(|| self.language.clone())
    }

    fn throttle(&self) -> Result<()> {
        if self.limiter.try_acquire(GLOBAL_WINDOW) {
            return Ok(());
        }
        tracing::warn!("BRT minute quota exhausted, rejecting call");
        Err(BrtError::throttled("BRT minute quota exceeded"))
    }

    /// Legends take the first page's slot before resolving the endpoint,
    /// every later page takes its own.
    fn throttle_page(&self, first_page: &mut bool) -> Result<()> {
        if std::mem::take(first_page) {
            return Ok(());
        }
        self.throttle()
    }

    async fn call(&self, operation: Operation, request: RpcRequest) -> Result<Value> {
        self.throttle()?;
        let endpoint = self.resolver.resolve(operation.key()).await?;
        let response = self.transport.call(&endpoint, &request).await?;
        status::check(&response, false)?;
        Ok(response)
    }

    /// Full tracking document for a BRT shipment id (format FFFSSNNNNNNN).
    /// `year` 0 or `None` means the current year.
    pub async fn track_by_id(
        &self,
        shipment_id: &str,
        year: Option<i32>,
        lang: Option<&str>,
    ) -> Result<ShipmentRecord> {
        let request = RpcRequest::new(Operation::TrackingById.rpc_name())
            .text("LINGUA_ISO639_ALPHA2", self.language_or_default(lang))
            .int("SPEDIZIONE_ANNO", i64::from(year.unwrap_or(0)))
            .text("SPEDIZIONE_BRT_ID", shipment_id);

        let response = self.call(Operation::TrackingById, request).await?;
        Ok(mapper::shipment(&response))
    }

    /// BRT shipment id from the sender's numeric reference (RMN).
    pub async fn shipment_id_by_rmn(&self, reference: &str) -> Result<String> {
        let request = RpcRequest::new(Operation::IdByRmn.rpc_name())
            .text("CLIENTE_ID", self.client_id()?)
            .text("RIFERIMENTO_MITTENTE_NUMERICO", reference);

        let response = self.call(Operation::IdByRmn, request).await?;
        Ok(mapper::shipment_id(&response))
    }

    /// BRT shipment id from the sender's alphanumeric reference (RMA).
    pub async fn shipment_id_by_rma(&self, reference: &str) -> Result<String> {
        let request = RpcRequest::new(Operation::IdByRma.rpc_name())
            .text("CLIENTE_ID", self.client_id()?)
            .text("RIFERIMENTO_MITTENTE_ALFABETICO", reference);

        let response = self.call(Operation::IdByRma, request).await?;
        Ok(mapper::shipment_id(&response))
    }

    pub async fn shipment_id_by_parcel(&self, parcel_id: &str) -> Result<ShipmentIdLookup> {
        let request = RpcRequest::new(Operation::IdByParcel.rpc_name())
            .text("CLIENTE_ID", self.client_id()?)
            .text("COLLO_ID", parcel_id);

        let response = self.call(Operation::IdByParcel, request).await?;
        Ok(mapper::shipment_id_lookup(&response))
    }

    /// Complete status (esiti) legend, fetched 20 rows at a time.
    pub async fn status_legend(&self, lang: Option<&str>) -> Result<Vec<StatusLegendEntry>> {
        let client_id = self.numeric_client_id()?;
        let lang = self.language_or_default(lang);
        self.throttle()?;
        let endpoint = self
            .resolver
            .resolve(Operation::StatusLegend.key())
            .await?;
        let endpoint = &endpoint;
        let mut first_page = true;

        collect_legend(
            LegendSpec::status_legend(),
            move |cursor: i64| {
                let request = RpcRequest::new(Operation::StatusLegend.rpc_name())
                    .text("LINGUA_ISO639_ALPHA2", lang.clone())
                    .int("ULTIMO_ID_RICEVUTO", cursor)
                    .int("CLIENTE_ID", client_id);
                let gate = self.throttle_page(&mut first_page);
                async move {
                    gate?;
                    self.transport.call(endpoint, &request).await
                }
            },
            mapper::status_legend_entry,
            mapper::status_legend_key,
        )
        .await
    }

    /// Complete event legend, fetched 200 rows at a time.
    pub async fn event_legend(&self, lang: Option<&str>) -> Result<Vec<EventLegendEntry>> {
        let client_id = self.numeric_client_id()?;
        let lang = self.language_or_default(lang);
        self.throttle()?;
        let endpoint = self
            .resolver
            .resolve(Operation::EventLegend.key())
            .await?;
        let endpoint = &endpoint;
        let mut first_page = true;

        collect_legend(
            LegendSpec::event_legend(),
            move |cursor: String| {
                let request = RpcRequest::new(Operation::EventLegend.rpc_name())
                    .text("LINGUA_ISO639_ALPHA2", lang.clone())
                    .text("ULTIMO_ID_RICEVUTO", cursor)
                    .int("CLIENTE_ID", client_id);
                let gate = self.throttle_page(&mut first_page);
                async move {
                    gate?;
                    self.transport.call(endpoint, &request).await
                }
            },
            mapper::event_legend_entry,
            mapper::event_legend_key,
        )
        .await
    }
}
