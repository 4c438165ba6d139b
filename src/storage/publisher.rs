use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    error::{ScanError, ScanResult},
    types::AnalysisResult,
};

/// Writes analysis results to the artifact served by the read API.
///
/// The document is written to a hidden sibling file and renamed over the
/// target, so readers see either the previous artifact or the new one.
pub struct ResultPublisher {
    path: PathBuf,
}

impl ResultPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn publish(&self, result: &AnalysisResult) -> ScanResult<()> {
        let payload = serde_json::to_vec_pretty(result).map_err(|e| self.write_failure(e.into()))?;
        let temp_path = self.temp_path();

        if let Err(e) = tokio::fs::write(&temp_path, &payload).await {
            self.discard(&temp_path).await;
            return Err(self.write_failure(e));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            self.discard(&temp_path).await;
            return Err(self.write_failure(e));
        }

        info!(
            "Published {} opportunities to {}",
            result.opportunity_count,
            self.path.display()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(".");
        name.push(self.path.file_name().unwrap_or_else(|| "results.json".as_ref()));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn discard(&self, temp_path: &Path) {
        match tokio::fs::remove_file(temp_path).await {
            Ok(()) => debug!("Removed temporary file {}", temp_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove temporary file {}: {}", temp_path.display(), e),
        }
    }

    fn write_failure(&self, source: std::io::Error) -> ScanError {
        ScanError::WriteFailure {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn sample_result(bridge_rate: i64) -> AnalysisResult {
        AnalysisResult::new(BigDecimal::from(bridge_rate), Vec::new())
    }

    #[tokio::test]
    async fn test_publish_writes_document_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let publisher = ResultPublisher::new(&path);

        let result = sample_result(60000);
        publisher.publish(&result).await.unwrap();

        let written: AnalysisResult =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, result);

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_replaces_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let publisher = ResultPublisher::new(&path);

        publisher.publish(&sample_result(60000)).await.unwrap();
        publisher.publish(&sample_result(61000)).await.unwrap();

        let written: AnalysisResult =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written.bridge_rate, BigDecimal::from(61000));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("results.json");
        let publisher = ResultPublisher::new(&path);

        let err = publisher.publish(&sample_result(60000)).await.unwrap_err();
        assert!(matches!(err, ScanError::WriteFailure { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_rename_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the rename fail.
        let path = dir.path().join("results.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"previous").unwrap();

        let publisher = ResultPublisher::new(&path);
        assert!(publisher.publish(&sample_result(60000)).await.is_err());

        assert_eq!(std::fs::read(path.join("keep")).unwrap(), b"previous");
        assert!(!dir.path().join(".results.json.tmp").exists());
    }
}
