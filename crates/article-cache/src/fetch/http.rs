use std::path::PathBuf;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use super::{
    FetchError, FetchedResource, ResourceFetcher, ResponseMetadata, is_acceptable_status,
};
use crate::{CacheConfig, FetcherConfig};

const DOWNLOAD_PREFIX: &str = ".download-";

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(5)
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if config.use_system_proxy {
        // reqwest picks up system proxy settings unless no_proxy() is called
        info!("Using system proxy settings for downloads");
    } else {
        client_builder = client_builder.no_proxy();
        debug!("Proxy disabled for downloads");
    }

    client_builder.build()
}

/// Fetcher that streams HTTP response bodies into temp files
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    download_dir: PathBuf,
}

impl HttpFetcher {
    pub fn new(client: Client, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, reqwest::Error> {
        let client = create_client(&config.fetcher)?;
        Ok(Self::new(client, config.download_dir()))
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !is_acceptable_status(status) {
            debug!(url = %url, status = %status, "Unexpected response status");
            return Err(FetchError::UnexpectedStatus(status));
        }

        let metadata = ResponseMetadata::from_headers(status, response.headers().clone());

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let staged = tempfile::Builder::new()
            .prefix(DOWNLOAD_PREFIX)
            .tempfile_in(&self.download_dir)?;
        // The TempPath deletes the partial file if anything below fails
        let (file, temp_path) = staged.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut total = 0usize;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            total += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_data().await?;

        debug!(url = %url, bytes = total, path = ?temp_path, "Downloaded resource");

        Ok(FetchedResource {
            temp_file: Some(temp_path),
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(dir: &std::path::Path) -> HttpFetcher {
        let client = create_client(&FetcherConfig {
            use_system_proxy: false,
            ..FetcherConfig::default()
        })
        .unwrap();
        HttpFetcher::new(client, dir)
    }

    #[tokio::test]
    async fn test_fetch_success_streams_to_temp_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/mobile-html/Dog"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"abc123\"")
                    .set_body_raw("<html></html>", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("{}/api/rest_v1/page/mobile-html/Dog", server.uri())).unwrap();
        let fetched = fetcher(dir.path()).fetch(&url).await.unwrap();

        assert_eq!(fetched.metadata.etag.as_deref(), Some("\"abc123\""));
        assert_eq!(fetched.metadata.mime_type.as_deref(), Some("text/html"));
        let temp = fetched.temp_file.unwrap();
        assert_eq!(std::fs::read_to_string(&temp).unwrap(), "<html></html>");
    }

    #[tokio::test]
    async fn test_fetch_404_is_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = fetcher(dir.path()).fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::UnexpectedStatus(s) if s.as_u16() == 404));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        // Port 9 (discard) is almost never listening on loopback
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher(dir.path()).fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
