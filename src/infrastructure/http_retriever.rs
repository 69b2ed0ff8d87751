// HTTP retriever - downloads segment CSV exports from a station API
use crate::application::retriever::{RetrievalError, Retriever};
use crate::domain::station::{DateRange, StationRow};
use crate::infrastructure::config::RetrieverConfig;
use crate::infrastructure::station_csv::{artifact_path, read_station_rows, StationCsvError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: reqwest::Client,
    url: String,
    api_key: String,
    artifact_dir: PathBuf,
    metric_count: usize,
    timeout: Duration,
}

impl HttpRetriever {
    pub fn new(url: String, config: &RetrieverConfig, metric_count: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            artifact_dir: config.artifact_dir.clone(),
            metric_count,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn build_query_url(&self, segment: &DateRange) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}start={}&end={}&apiKey={}",
            self.url,
            separator,
            segment.start.format("%Y-%m-%d"),
            segment.end.format("%Y-%m-%d"),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn fetch(&self, segment: &DateRange) -> Result<Vec<StationRow>, RetrievalError> {
        let url = self.build_query_url(segment);

        let response = self
            .client
            .get(&url)
            .header("Accept", "text/csv")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout(self.timeout.as_secs())
                } else {
                    RetrievalError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api { status, body });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let path = artifact_path(&self.artifact_dir, segment);
        tokio::fs::write(&path, body.as_bytes())
            .await
            .map_err(|source| StationCsvError::Io {
                path: path.clone(),
                source,
            })?;

        let (_, rows) = read_station_rows(&path, self.metric_count)?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Router};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use tempfile::{tempdir, TempDir};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/export", addr)
    }

    fn retriever(url: String, dir: &TempDir) -> HttpRetriever {
        let config = RetrieverConfig {
            api_key: "a b".into(),
            artifact_dir: dir.path().to_path_buf(),
            ..RetrieverConfig::default()
        };
        HttpRetriever::new(url, &config, 1)
    }

    fn segment() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 6, 11).unwrap(),
        )
    }

    #[test]
    fn test_build_query_url() {
        let dir = tempdir().unwrap();
        let r = retriever("https://station.test/export/".into(), &dir);
        assert_eq!(
            r.build_query_url(&segment()),
            "https://station.test/export?start=2020-06-01&end=2020-06-11&apiKey=a%20b"
        );

        let r = retriever("https://station.test/export?format=csv".into(), &dir);
        assert!(r.build_query_url(&segment()).contains("?format=csv&start="));
    }

    #[tokio::test]
    async fn test_download_writes_artifact() {
        let router = Router::new().route(
            "/export",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                format!("dt,temp\n{} 00:00:00,12.5\n", q["start"])
            }),
        );
        let dir = tempdir().unwrap();
        let r = retriever(serve(router).await, &dir);

        let rows = r.fetch(&segment()).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values, vec![Some(12.5)]);
        assert!(dir.path().join("20200601-20200611.csv").is_file());
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_result() {
        let router = Router::new().route("/export", get(|| async { "" }));
        let dir = tempdir().unwrap();
        let r = retriever(serve(router).await, &dir);

        assert!(r.fetch(&segment()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_fatal() {
        let router = Router::new().route(
            "/export",
            get(|| async { (StatusCode::UNAUTHORIZED, "invalid apiKey") }),
        );
        let dir = tempdir().unwrap();
        let r = retriever(serve(router).await, &dir);

        let err = r.fetch(&segment()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Api { status: 401, .. }));
    }
}
