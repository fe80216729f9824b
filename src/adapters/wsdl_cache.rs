use crate::core::invoker::TransportSettings;
use crate::utils::error::{BrtError, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// BRT serves its definitions over https but advertises http endpoints in
/// them. The cache keeps a local copy of each definition with the
/// `location` attributes rewritten to https.
#[derive(Debug, Clone)]
pub struct WsdlCache {
    cache_dir: PathBuf,
    sources: Vec<String>,
    transport: TransportSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheReport {
    pub cached: Vec<PathBuf>,
    /// Source URL and the reason it was skipped.
    pub skipped: Vec<(String, String)>,
}

fn location_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?i)location="http://"#).expect("location pattern is valid"))
}

impl WsdlCache {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        sources: Vec<String>,
        transport: TransportSettings,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            sources,
            transport,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// File name depends only on the source URL, never on its content.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.cache_dir.join(format!("{}.wsdl", hex::encode(digest)))
    }

    pub fn patch(xml: &str) -> String {
        location_pattern()
            .replace_all(xml, r#"location="https://"#)
            .into_owned()
    }

    /// Downloads, patches and writes every configured definition. A failing
    /// source is skipped and reported, the rest are still cached.
    pub async fn cache_and_patch(&self) -> Result<CacheReport> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let mut report = CacheReport::default();
        for url in &self.sources {
            match self.download(url).await {
                Ok(xml) => {
                    let path = self.path_for(url);
                    tokio::fs::write(&path, Self::patch(&xml)).await?;
                    tracing::debug!("Cached {} -> {}", url, path.display());
                    report.cached.push(path);
                }
                Err(e) => {
                    tracing::warn!("⚠️ Skipping WSDL {}: {}", url, e);
                    report.skipped.push((url.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            "WSDL cache refreshed: {} cached, {} skipped",
            report.cached.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Local patched copy of `url`, populating the cache on first use.
    pub async fn get_patched(&self, url: &str) -> Result<PathBuf> {
        let path = self.path_for(url);
        if tokio::fs::try_exists(&path).await? {
            return Ok(path);
        }

        self.cache_and_patch().await?;
        if tokio::fs::try_exists(&path).await? {
            Ok(path)
        } else {
            Err(BrtError::transport(format!(
                "service definition {} could not be cached",
                url
            )))
        }
    }

    async fn download(&self, url: &str) -> Result<String> {
        let response = self.transport.http_client()?.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BrtError::transport(format!("HTTP {}", response.status())));
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_rewrites_only_location_attributes() {
        let xml = r#"<soap:address LOCATION="http://wsr.brt.it:10041/web/X"/><import namespace="http://wsr.brt.it/"/><soap:address location="https://already/secure"/>"#;
        let patched = WsdlCache::patch(xml);

        assert!(patched.contains(r#"location="https://wsr.brt.it:10041/web/X""#));
        assert!(patched.contains(r#"namespace="http://wsr.brt.it/""#));
        assert!(patched.contains(r#"location="https://already/secure""#));
    }

    #[test]
    fn test_path_for_is_stable_and_url_specific() {
        let cache = WsdlCache::new("/tmp/brt", vec![], TransportSettings::default());
        let a = cache.path_for("https://wsr.brt.it:10052/web/A?wsdl");
        let b = cache.path_for("https://wsr.brt.it:10052/web/B?wsdl");

        assert_eq!(a, cache.path_for("https://wsr.brt.it:10052/web/A?wsdl"));
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(Path::new("/tmp/brt")));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("wsdl"));
    }
}
