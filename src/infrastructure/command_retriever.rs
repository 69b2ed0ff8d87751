// External-command retriever - runs the station download script per segment
use crate::application::retriever::{RetrievalError, Retriever};
use crate::domain::station::{DateRange, StationRow};
use crate::infrastructure::config::RetrieverConfig;
use crate::infrastructure::station_csv::{artifact_path, read_station_rows};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Invokes `<program> [args...] <start> <end> <api_key>` in the artifact
/// directory and reads back the `<start>-<end>.csv` file it leaves there.
#[derive(Debug, Clone)]
pub struct CommandRetriever {
    program: String,
    args: Vec<String>,
    api_key: String,
    artifact_dir: PathBuf,
    metric_count: usize,
    timeout: Duration,
}

impl CommandRetriever {
    pub fn new(config: &RetrieverConfig, metric_count: usize) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            api_key: config.api_key.clone(),
            artifact_dir: config.artifact_dir.clone(),
            metric_count,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl Retriever for CommandRetriever {
    async fn fetch(&self, segment: &DateRange) -> Result<Vec<StationRow>, RetrievalError> {
        let start = segment.start.format("%Y-%m-%d").to_string();
        let end = segment.end.format("%Y-%m-%d").to_string();

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&start)
            .arg(&end)
            .arg(&self.api_key)
            .current_dir(&self.artifact_dir)
            .kill_on_drop(true);

        tracing::debug!("Running {} for {}", self.program, segment);
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| RetrievalError::Timeout(self.timeout.as_secs()))?
            .map_err(RetrievalError::Spawn)?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(RetrievalError::CommandFailed {
                status: output.status.to_string(),
                output: text.trim().to_string(),
            });
        }

        let path = artifact_path(&self.artifact_dir, segment);
        if !path.is_file() {
            return Err(RetrievalError::MissingArtifact {
                segment: *segment,
                path,
            });
        }

        let (_, rows) = read_station_rows(&path, self.metric_count)?;
        Ok(rows)
    }
}
