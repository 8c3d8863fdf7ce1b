//! Interpreter driver backed by a child process

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::runtime::Runtime;

use super::diagnostics::{normalize, split_output};
use super::workspace::Workspace;
use super::{DriverError, InterpreterDriver};
use crate::config::RunnerConfig;

/// Runs `<interpreter> <generated-source> [args...]` inside a fresh workspace.
#[derive(Debug)]
pub struct ProcessDriver {
    interpreter: PathBuf,
    args: Vec<String>,
    source_extension: String,
    timeout: Option<Duration>,
    runtime: Runtime,
}

impl ProcessDriver {
    pub fn new(config: &RunnerConfig) -> Result<Self, DriverError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("plane-test-driver")
            .enable_all()
            .build()?;

        Ok(Self {
            interpreter: absolute_program(&config.interpreter),
            args: config.interpreter_args.clone(),
            source_extension: config.source_extension.clone(),
            timeout: config.timeout,
            runtime,
        })
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Spawn the interpreter and collect its merged stdout/stderr bytes.
    async fn execute(&self, workspace: &Workspace) -> Result<Vec<u8>, DriverError> {
        // One pipe for both streams keeps their relative order.
        let (reader, writer) = io::pipe()?;
        let stdout_writer = writer.try_clone()?;

        let mut command = tokio::process::Command::new(&self.interpreter);
        command
            .arg(workspace.source_file_name())
            .args(&self.args)
            .current_dir(workspace.root())
            .stdin(Stdio::null())
            .stdout(stdout_writer)
            .stderr(writer)
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| DriverError::Launch {
            program: self.interpreter.clone(),
            source,
        })?;
        // Release our copies of the write end so the reader sees EOF.
        drop(command);

        // Anything the interpreter started inherits the write end, so EOF
        // can come after the interpreter itself exits.
        let collect = async {
            let output = read_merged(reader).await?;
            let status = child.wait().await?;
            tracing::debug!(%status, "interpreter exited");
            Ok::<_, DriverError>(output)
        };

        let Some(limit) = self.timeout else {
            return collect.await;
        };
        let outcome = tokio::time::timeout(limit, collect).await;
        match outcome {
            Ok(output) => output,
            Err(_) => {
                tracing::warn!(timeout = ?limit, "interpreter timed out, killing it");
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "failed to kill interpreter");
                }
                Err(DriverError::Timeout { after: limit })
            }
        }
    }
}

/// Read the merged output pipe to EOF without holding a blocking thread.
#[cfg(unix)]
async fn read_merged(reader: io::PipeReader) -> io::Result<Vec<u8>> {
    use std::os::fd::OwnedFd;
    use tokio::io::AsyncReadExt;

    let mut receiver = tokio::net::unix::pipe::Receiver::from_owned_fd(OwnedFd::from(reader))?;
    let mut buf = Vec::new();
    receiver.read_to_end(&mut buf).await?;
    Ok(buf)
}

#[cfg(not(unix))]
async fn read_merged(reader: io::PipeReader) -> io::Result<Vec<u8>> {
    use std::io::Read;

    tokio::task::spawn_blocking(move || {
        let mut reader = reader;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    })
    .await
    .map_err(io::Error::other)?
}

impl InterpreterDriver for ProcessDriver {
    #[tracing::instrument(skip_all, fields(files = files.len()))]
    fn run(&self, source: &str, files: &BTreeMap<String, String>) -> Result<String, DriverError> {
        let workspace = Workspace::create(source, files, &self.source_extension)?;
        tracing::debug!(root = %workspace.root().display(), "created workspace");

        let raw = self.runtime.block_on(self.execute(&workspace))?;
        let text = normalize(&String::from_utf8_lossy(&raw));
        split_output(&text).map(str::to_string)
    }
}

/// Resolve a path-like program name against the current directory.
///
/// The child runs in the workspace, so a relative path would otherwise be
/// looked up from there. Bare names are left for `PATH` lookup.
fn absolute_program(program: &Path) -> PathBuf {
    if program.components().count() > 1 || program.exists() {
        std::path::absolute(program).unwrap_or_else(|_| program.to_path_buf())
    } else {
        program.to_path_buf()
    }
}
