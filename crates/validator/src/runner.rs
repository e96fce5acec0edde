//! Execution of external validation programs.
//!
//! A validation program is started with the content identifier as its only
//! argument. The candidate bytes are written to its standard input, its
//! standard output is the validated content and every line it writes to
//! standard error is a diagnostic. Exit status zero accepts the content.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use confparts_types::ContentIdentifier;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, ValidationError};

/// Time a killed program gets to flush standard error before its drain is abandoned.
const STDERR_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Configuration for running validation programs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Seconds a program may run before it is killed. `None` or zero waits
    /// indefinitely.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,

    /// Where [`ExternalValidator::validate`] writes the validated content.
    #[serde(default)]
    pub result_path: Option<PathBuf>,
}

fn default_timeout_secs() -> Option<u64> {
    Some(300)
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            result_path: None,
        }
    }
}

impl ValidatorConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_result_path(mut self, result_path: impl Into<PathBuf>) -> Self {
        self.result_path = Some(result_path.into());
        self
    }
}

/// Content accepted by a validation program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPart {
    /// What the program wrote to standard output. This replaces the uploaded
    /// bytes for persistence.
    pub validated_bytes: Vec<u8>,
    /// Lines written to standard error. Non-fatal on success.
    pub warnings: Vec<String>,
}

/// Runs operator-supplied validation programs.
#[derive(Debug, Clone, Default)]
pub struct ExternalValidator {
    config: ValidatorConfig,
}

impl ExternalValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate `file_bytes` and write the validated content to the configured
    /// result path.
    ///
    /// # Returns
    /// The warning lines the program wrote to standard error
    pub async fn validate(
        &self,
        program: &Path,
        file_bytes: &[u8],
        content_identifier: &ContentIdentifier,
    ) -> Result<Vec<String>> {
        let validated = self.run(program, file_bytes, content_identifier).await?;

        if let Some(path) = &self.config.result_path {
            persist(path, &validated.validated_bytes).await?;
            debug!(
                "Wrote {} validated bytes to {}",
                validated.validated_bytes.len(),
                path.display()
            );
        }

        Ok(validated.warnings)
    }

    /// Run `program` against `file_bytes` and collect its output.
    ///
    /// Standard input, standard output and standard error are serviced by
    /// three separate tasks so that a program producing a lot of output on
    /// one stream never stalls on a full pipe while we wait on another.
    pub async fn run(
        &self,
        program: &Path,
        file_bytes: &[u8],
        content_identifier: &ContentIdentifier,
    ) -> Result<ValidatedPart> {
        info!(
            "Validating {} bytes of '{}' with {}",
            file_bytes.len(),
            content_identifier,
            program.display()
        );

        let io_error = |source| ValidationError::Io {
            program: program.to_path_buf(),
            source,
        };

        let mut child = Command::new(program)
            .arg(content_identifier.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ValidationError::Launch {
                program: program.to_path_buf(),
                source,
            })?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(io_error(std::io::Error::other(
                "standard streams of the validation program were not captured",
            )));
        };

        let (line_tx, mut line_rx) = mpsc::unbounded_channel();
        let mut feeder = tokio::spawn(feed_stdin(stdin, file_bytes.to_vec()));
        let mut stdout_task = tokio::spawn(drain_bytes(stdout));
        let mut stderr_task = tokio::spawn(drain_lines(stderr, line_tx));

        let outcome = {
            let collect =
                collect_output(&mut child, &mut feeder, &mut stdout_task, &mut stderr_task);
            match self.config.timeout() {
                Some(limit) => tokio::time::timeout(limit, collect).await.ok(),
                None => Some(collect.await),
            }
        };

        let Some(outcome) = outcome else {
            let timeout = self.config.timeout().unwrap_or_default();
            warn!(
                "Validation program {} exceeded {:?}, killing it",
                program.display(),
                timeout
            );
            if let Err(e) = child.kill().await {
                warn!("Failed to kill validation program {}: {}", program.display(), e);
            }
            feeder.abort();
            stdout_task.abort();
            // A finished drain has already handed over all of its lines.
            if !stderr_task.is_finished()
                && tokio::time::timeout(STDERR_GRACE_PERIOD, &mut stderr_task)
                    .await
                    .is_err()
            {
                stderr_task.abort();
            }

            return Err(ValidationError::TimedOut {
                program: program.to_path_buf(),
                timeout,
                stderr: received_lines(&mut line_rx).await,
            });
        };

        let (status, validated_bytes) = outcome.map_err(io_error)?;
        let stderr = received_lines(&mut line_rx).await;

        if !status.success() {
            warn!(
                "Validation program {} rejected '{}' ({}), {} stderr line(s)",
                program.display(),
                content_identifier,
                status,
                stderr.len()
            );
            return Err(ValidationError::Rejected {
                program: program.to_path_buf(),
                content_identifier: content_identifier.clone(),
                status,
                stderr,
            });
        }

        info!(
            "Validation of '{}' succeeded with {} warning(s), {} validated bytes",
            content_identifier,
            stderr.len(),
            validated_bytes.len()
        );

        Ok(ValidatedPart {
            validated_bytes,
            warnings: stderr,
        })
    }
}

/// Wait for the program to exit and for every stream task to finish.
async fn collect_output(
    child: &mut Child,
    feeder: &mut JoinHandle<std::io::Result<()>>,
    stdout_task: &mut JoinHandle<std::io::Result<Vec<u8>>>,
    stderr_task: &mut JoinHandle<std::io::Result<()>>,
) -> std::io::Result<(ExitStatus, Vec<u8>)> {
    let status = child.wait().await?;
    let validated = flatten(stdout_task.await)?;
    flatten(stderr_task.await)?;
    flatten(feeder.await)?;
    Ok((status, validated))
}

fn flatten<T>(
    joined: std::result::Result<std::io::Result<T>, tokio::task::JoinError>,
) -> std::io::Result<T> {
    joined.map_err(std::io::Error::other)?
}

async fn feed_stdin(mut stdin: ChildStdin, bytes: Vec<u8>) -> std::io::Result<()> {
    let written = match stdin.write_all(&bytes).await {
        Ok(()) => stdin.shutdown().await,
        Err(e) => Err(e),
    };

    match written {
        // The program may decide without reading all of its input.
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!("Validation program closed stdin early");
            Ok(())
        }
        other => other,
    }
}

async fn drain_bytes<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(buffer)
}

/// Forward every line of `reader` to `lines`, without its terminator.
///
/// A final terminator does not produce a trailing empty line.
pub(crate) async fn drain_lines<R: AsyncRead + Unpin>(
    reader: R,
    lines: mpsc::UnboundedSender<String>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }

        let text = decode_line(&line);
        debug!(stderr = %text, "Validation program stderr");
        if lines.send(text).is_err() {
            break;
        }
    }

    Ok(())
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

async fn received_lines(lines: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut received = Vec::new();
    while let Some(line) = lines.recv().await {
        received.push(line);
    }
    received
}

async fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let persist_error = |source| ValidationError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(persist_error)?;
    }

    tokio::fs::write(path, bytes).await.map_err(persist_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn lines_of(input: &'static [u8]) -> Vec<String> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drain_lines(input, tx).await.unwrap();
        received_lines(&mut rx).await
    }

    #[tokio::test]
    async fn test_final_terminator_does_not_add_empty_line() {
        assert_eq!(lines_of(b"first\nsecond\n").await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_unterminated_last_line_is_kept() {
        assert_eq!(lines_of(b"first\nsecond").await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_crlf_and_inner_empty_lines() {
        assert_eq!(
            lines_of(b"one\r\n\r\nthree\n").await,
            vec!["one", "", "three"]
        );
    }

    #[tokio::test]
    async fn test_empty_stream_has_no_lines() {
        assert!(lines_of(b"").await.is_empty());
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        assert_eq!(ValidatorConfig::default().timeout(), Some(Duration::from_secs(300)));
        assert_eq!(ValidatorConfig::default().with_timeout(Some(0)).timeout(), None);
        assert_eq!(ValidatorConfig::default().with_timeout(None).timeout(), None);
    }
}
