use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;

use crate::cache::ResponseCache;
use crate::error::ChargeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadInfo {
    pub bytes: u64,
    pub from_cache: bool,
}

/// Retrieves a dataset archive to a local file.
pub trait ArchiveFetcher {
    fn download(&self, url: &str, destination: &Path) -> Result<DownloadInfo, ChargeError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    cache: Option<ResponseCache>,
}

impl HttpFetcher {
    pub fn new(cache: Option<ResponseCache>) -> Result<Self, ChargeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("cpdata/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ChargeError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| ChargeError::Http(err.to_string()))?;
        Ok(Self { client, cache })
    }

    fn write_response_to_file(
        &self,
        url: &str,
        mut response: reqwest::blocking::Response,
        destination: &Path,
    ) -> Result<u64, ChargeError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "request failed".to_string());
            return Err(ChargeError::HttpStatus {
                url: url.to_string(),
                status,
                message,
            });
        }
        let mut file =
            File::create(destination).map_err(|err| ChargeError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file).map_err(|err| ChargeError::Http(err.to_string()))
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn download(&self, url: &str, destination: &Path) -> Result<DownloadInfo, ChargeError> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.lookup(url)? {
                tracing::info!(url, cached = %body, "using cached response");
                let bytes = fs::copy(body.as_std_path(), destination)
                    .map_err(|err| ChargeError::Filesystem(err.to_string()))?;
                return Ok(DownloadInfo {
                    bytes,
                    from_cache: true,
                });
            }
        }

        tracing::info!(url, "downloading");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| ChargeError::Http(err.to_string()))?;
        tracing::info!(status = response.status().as_u16(), "response received");
        let bytes = self.write_response_to_file(url, response, destination)?;

        if let Some(cache) = &self.cache {
            cache.store(url, destination)?;
        }
        Ok(DownloadInfo {
            bytes,
            from_cache: false,
        })
    }
}
