use crate::cancel::CancelToken;
use crate::error::{LibrarianError, Result};
use crate::hooks::HookContext;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs the apply-version script for one library
pub struct HookExecutor;

impl HookExecutor {
    /// Run `script` in `workdir` with the `LIBRARIAN_*` variables of `context`.
    ///
    /// A non-zero exit fails with the script's captured output, so the manifest is
    /// left untouched for that library. The script is killed as soon as `cancel`
    /// fires, and never started if it already has.
    pub fn execute(
        script: &Path,
        workdir: &Path,
        context: &HookContext,
        cancel: &CancelToken,
    ) -> Result<()> {
        if !script.is_file() {
            return Err(LibrarianError::hook(format!(
                "Apply-version script not found: {}",
                script.display()
            )));
        }
        let step = format!("running apply-version hook for '{}'", context.library);
        cancel.check(&step)?;

        debug!(
            script = %script.display(),
            library = %context.library,
            version = %context.version,
            "running apply-version hook"
        );

        let mut child = Command::new(script)
            .current_dir(workdir)
            .envs(context.to_env_vars())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                LibrarianError::hook(format!("Cannot run {}: {}", script.display(), e))
            })?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if let Err(e) = cancel.check(&step) {
                warn!(library = %context.library, "killing apply-version hook");
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
            thread::sleep(POLL_INTERVAL);
        };

        if status.success() {
            return Ok(());
        }

        let code = status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        let stderr = stderr.join().unwrap_or_default();
        let stdout = stdout.join().unwrap_or_default();
        let detail = if stderr.trim().is_empty() { stdout } else { stderr };
        Err(LibrarianError::hook(format!(
            "{} failed for '{}' with exit code {}: {}",
            script.display(),
            context.library,
            code,
            detail.trim()
        )))
    }
}

/// Read a child pipe to the end on its own thread so the child never blocks on it
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}
