// # File Target Sink
//
// Writes the discovery document to the file Prometheus watches.
//
// ## Atomicity
//
// Prometheus re-reads the file whenever it changes, so a half-written file
// would drop every target until the next cycle. The document is written to
// a temporary file in the same directory, flushed, then renamed over the
// target path.
//
// ## Permissions
//
// On unix the file is published with mode 0644 so a monitoring process
// running as another user can read it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::discovery::StaticSdConfig;
use crate::traits::TargetSink;

/// Mode of the published file
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// File-based target sink with atomic replacement
///
/// # Example
///
/// ```rust,no_run
/// use poolsd_core::discovery::StaticSdConfig;
/// use poolsd_core::sink::FileTargetSink;
/// use poolsd_core::traits::TargetSink;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = FileTargetSink::new("/var/run/poolsd/config.json").await?;
///
///     let document = StaticSdConfig::from_targets(vec!["10.0.0.1".into()]);
///     sink.publish(&document).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileTargetSink {
    path: PathBuf,
}

impl FileTargetSink {
    /// Create a file sink, creating the parent directory if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::output(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
            tracing::debug!("Created discovery directory {}", parent.display());
        }

        Ok(Self { path })
    }

    /// Path of the published file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temporary file for atomic writes: `<file name>.tmp`
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write the rendered document to the temporary file
    async fn write_temp(&self, temp_path: &Path, content: &[u8]) -> Result<(), Error> {
        let mut file = fs::File::create(temp_path).await.map_err(|e| {
            Error::output(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.write_all(content).await.map_err(|e| {
            Error::output(format!(
                "Failed to write to temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::output(format!(
                "Failed to flush temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            Error::output(format!(
                "Failed to sync temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp_path, std::fs::Permissions::from_mode(FILE_MODE))
                .await
                .map_err(|e| {
                    Error::output(format!(
                        "Failed to set permissions on {}: {}",
                        temp_path.display(),
                        e
                    ))
                })?;
        }

        Ok(())
    }
}

#[async_trait]
impl TargetSink for FileTargetSink {
    async fn publish(&self, document: &StaticSdConfig) -> Result<(), Error> {
        let content = document.to_json()?;

        let temp_path = self.temp_path();
        if let Err(e) = self.write_temp(&temp_path, &content).await {
            // A leftover temp file is truncated by the next cycle
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::output(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(
            "Discovery file written: {} ({} targets)",
            self.path.display(),
            document.target_count()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
