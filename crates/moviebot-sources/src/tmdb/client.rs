use crate::error::UpstreamError;
use crate::tmdb::api::{self, TmdbMovieDetails, TmdbPage, TmdbWatchProviders, TRENDING_LIMIT};
use crate::traits::MetadataSource;
use async_trait::async_trait;
use moviebot_config::TmdbConfig;
use moviebot_models::{AvailabilityInfo, MovieDetail, MovieId, MovieSummary};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Create a reqwest Client whose every request is bounded by `timeout`
pub fn create_tmdb_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(concat!("moviebot/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    image_base_url: String,
    language: String,
    timeout: Duration,
}

impl TmdbClient {
    pub fn new(api_key: String, config: &TmdbConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            client: Arc::new(create_tmdb_client(timeout)),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            timeout,
        }
    }

    async fn get_json<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<T, UpstreamError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(path = path, "TMDB request");

        let response = self
            .client
            .get(&url)
            // Also bounds requests made through the fallback client
            .timeout(self.timeout)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(path = path, error = %e, "TMDB request failed");
                UpstreamError::from(e)
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            warn!(path = path, status = status, "TMDB returned an error status");
            return Err(UpstreamError::status(status, &error_text));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    fn source_name(&self) -> &str {
        "tmdb"
    }

    async fn search_by_title(&self, query: &str) -> Result<Vec<MovieSummary>, UpstreamError> {
        let page: TmdbPage = self
            .get_json(
                "/search/movie",
                &[("query", query), ("include_adult", "false"), ("language", self.language.as_str())],
            )
            .await?;
        Ok(api::to_summaries(page, None))
    }

    async fn fetch_trending(&self) -> Result<Vec<MovieSummary>, UpstreamError> {
        let page: TmdbPage = self
            .get_json("/trending/movie/day", &[("language", self.language.as_str())])
            .await?;
        Ok(api::to_summaries(page, Some(TRENDING_LIMIT)))
    }

    async fn fetch_details(&self, movie_id: MovieId) -> Result<MovieDetail, UpstreamError> {
        let details: TmdbMovieDetails = self
            .get_json(&format!("/movie/{}", movie_id), &[("language", self.language.as_str())])
            .await?;
        Ok(api::to_detail(details))
    }

    async fn fetch_availability(&self, movie_id: MovieId) -> Result<AvailabilityInfo, UpstreamError> {
        let providers: TmdbWatchProviders = self
            .get_json(&format!("/movie/{}/watch/providers", movie_id), &[])
            .await?;
        Ok(api::to_availability(providers))
    }

    fn poster_url(&self, poster_path: &str) -> String {
        format!("{}{}", self.image_base_url, poster_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Instant;

    /// Answer every connection on a local port with `response`, or hold it open
    /// unanswered when `None`. Returns the base URL.
    fn spawn_stub_server(response: Option<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                match &response {
                    Some(raw) => {
                        let _ = stream.write_all(raw.as_bytes());
                    }
                    // Keep the socket open without ever answering
                    None => held.push(stream),
                }
            }
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: &str) -> TmdbClient {
        let config = TmdbConfig {
            base_url: base_url.to_string(),
            timeout_secs: 1,
            ..TmdbConfig::default()
        };
        TmdbClient::new("test-key".to_string(), &config)
    }

    #[test]
    fn test_poster_url() {
        let client = client_for("https://api.themoviedb.org/3/");
        assert_eq!(
            client.poster_url("/abc.jpg"),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(client.source_name(), "tmdb");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_error() {
        // Port 9 on localhost refuses connections
        let client = client_for("http://127.0.0.1:9");
        let err = client.search_by_title("Interstellar").await.unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::Transport(_) | UpstreamError::Timeout | UpstreamError::Status { .. }
        ));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let client = client_for(&spawn_stub_server(None));
        let started = Instant::now();

        let err = client.fetch_details(1).await.unwrap_err();

        assert!(matches!(err, UpstreamError::Timeout), "unexpected error: {err:?}");
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_error_status_keeps_truncated_body() {
        let body = "e".repeat(900);
        let response = format!(
            "HTTP/1.1 401 Unauthorized\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let client = client_for(&spawn_stub_server(Some(response)));

        let err = client.search_by_title("Interstellar").await.unwrap_err();

        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body.len(), crate::error::MAX_ERROR_BODY_CHARS);
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }
}
