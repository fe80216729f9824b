use crate::adapters::WsdlCache;
use crate::domain::model::{DefinitionSource, ServiceEndpoint};
use crate::utils::error::{BrtError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps operation keys to their service definition and invocation address.
#[derive(Debug, Clone, Default)]
pub struct EndpointResolver {
    definitions: HashMap<String, String>,
    locations: HashMap<String, String>,
    cache: Option<Arc<WsdlCache>>,
}

impl EndpointResolver {
    pub fn new(definitions: HashMap<String, String>, locations: HashMap<String, String>) -> Self {
        Self {
            definitions,
            locations,
            cache: None,
        }
    }

    /// Serve definitions from the local patched cache instead of the remote URL.
    pub fn with_cache(mut self, cache: Arc<WsdlCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn resolve(&self, key: &str) -> Result<ServiceEndpoint> {
        let url = self
            .definitions
            .get(key)
            .ok_or_else(|| BrtError::UnknownOperation {
                key: key.to_string(),
            })?;

        let definition = match &self.cache {
            Some(cache) => DefinitionSource::Cached(cache.get_patched(url).await?),
            None => DefinitionSource::Remote(url.clone()),
        };

        Ok(ServiceEndpoint {
            operation_key: key.to_string(),
            definition,
            invocation_address: self.locations.get(key).cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invoker::TransportSettings;

    fn resolver() -> EndpointResolver {
        EndpointResolver::new(
            HashMap::from([(
                "id_by_rma".to_string(),
                "https://wsr.brt.it:10052/web/GetIdSpedizioneByRMAService/GetIdSpedizioneByRMA?wsdl"
                    .to_string(),
            )]),
            HashMap::from([(
                "id_by_rma".to_string(),
                "https://wsr.brt.it:10052/web/GetIdSpedizioneByRMAService/GetIdSpedizioneByRMA"
                    .to_string(),
            )]),
        )
    }

    #[tokio::test]
    async fn test_resolve_configured_key() {
        let endpoint = resolver().resolve("id_by_rma").await.unwrap();

        assert_eq!(endpoint.operation_key, "id_by_rma");
        assert!(matches!(endpoint.definition, DefinitionSource::Remote(ref url) if url.ends_with("?wsdl")));
        assert_eq!(
            endpoint.invocation_address.as_deref(),
            Some("https://wsr.brt.it:10052/web/GetIdSpedizioneByRMAService/GetIdSpedizioneByRMA")
        );
    }

    #[tokio::test]
    async fn test_unknown_key_fails_without_touching_the_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache_dir = dir.path().join("wsdl");
        // an unreachable source: any download attempt would be skipped, but
        // would still create the cache directory
        let cache = WsdlCache::new(
            &cache_dir,
            vec!["https://127.0.0.1:9/never?wsdl".to_string()],
            TransportSettings::default(),
        );

        let err = resolver()
            .with_cache(Arc::new(cache))
            .resolve("legenda_esiti")
            .await
            .unwrap_err();

        assert!(matches!(err, BrtError::UnknownOperation { ref key } if key == "legenda_esiti"));
        assert!(!cache_dir.exists());
    }

    #[tokio::test]
    async fn test_cached_definition_is_used_when_present() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = "https://wsr.brt.it:10052/web/GetIdSpedizioneByRMAService/GetIdSpedizioneByRMA?wsdl";
        let cache = WsdlCache::new(dir.path(), vec![url.to_string()], TransportSettings::default());
        let path = cache.path_for(url);
        std::fs::write(&path, "<definitions/>").unwrap();

        let endpoint = resolver()
            .with_cache(Arc::new(cache))
            .resolve("id_by_rma")
            .await
            .unwrap();

        assert_eq!(endpoint.definition, DefinitionSource::Cached(path));
    }
}
