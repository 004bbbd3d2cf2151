use std::collections::HashMap;

/// What the apply-version hook needs to know about one library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookContext {
    /// Library name as written in the manifest
    pub library: String,
    /// Version being applied
    pub version: String,
    /// Version before this release; empty for a first release
    pub previous_version: String,
    /// Library output directory, relative to the repository root
    pub output: String,
}

impl HookContext {
    /// Convert context to environment variables for the hook script
    ///
    /// Maps context fields to LIBRARIAN_* environment variables
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();

        env.insert("LIBRARIAN_LIBRARY".to_string(), self.library.clone());
        env.insert("LIBRARIAN_VERSION".to_string(), self.version.clone());
        env.insert("LIBRARIAN_OUTPUT".to_string(), self.output.clone());

        if !self.previous_version.is_empty() {
            env.insert(
                "LIBRARIAN_PREVIOUS_VERSION".to_string(),
                self.previous_version.clone(),
            );
        }

        env
    }
}
