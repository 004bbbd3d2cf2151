use crate::cancel::CancelToken;
use crate::error::Result;
use crate::hooks::{HookContext, HookExecutor};
use std::path::PathBuf;

/// Writes a chosen version into a library's on-disk artifacts
pub trait VersionApplier {
    fn apply(&self, context: &HookContext) -> Result<()>;
}

/// Leaves library files untouched; only the manifest records the version
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopApplier;

impl VersionApplier for NoopApplier {
    fn apply(&self, _context: &HookContext) -> Result<()> {
        Ok(())
    }
}

/// Runs a configured script per library
#[derive(Debug, Clone)]
pub struct ScriptApplier {
    script: PathBuf,
    workdir: PathBuf,
    cancel: CancelToken,
}

impl ScriptApplier {
    /// `script` relative paths resolve against `workdir`
    pub fn new(script: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        let script = script.into();
        let script = if script.is_relative() {
            workdir.join(script)
        } else {
            script
        };
        ScriptApplier {
            script,
            workdir,
            cancel: CancelToken::new(),
        }
    }

    /// Abort a running script once `cancel` fires
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn script(&self) -> &std::path::Path {
        &self.script
    }
}

impl VersionApplier for ScriptApplier {
    fn apply(&self, context: &HookContext) -> Result<()> {
        HookExecutor::execute(&self.script, &self.workdir, context, &self.cancel)
    }
}
