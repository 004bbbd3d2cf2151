use crate::error::{LibrarianError, Result};

/// Tag format used when a library record does not declare one
pub const DEFAULT_TAG_FORMAT: &str = "{name}/v{version}";

const NAME_PLACEHOLDER: &str = "{name}";
const VERSION_PLACEHOLDER: &str = "{version}";

/// Tag naming template (e.g., "{name}/v{version}", "v{version}")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFormat {
    pub template: String,
}

impl TagFormat {
    /// Create a new tag format; an empty template falls back to the default
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        if template.trim().is_empty() {
            TagFormat::default()
        } else {
            TagFormat { template }
        }
    }

    /// Check that the template can identify a release
    pub fn validate(&self) -> Result<()> {
        if !self.template.contains(VERSION_PLACEHOLDER) {
            return Err(LibrarianError::tag(format!(
                "Tag format '{}' must contain the {} placeholder",
                self.template, VERSION_PLACEHOLDER
            )));
        }
        Ok(())
    }

    /// Render a tag name, substituting each placeholder exactly once
    ///
    /// Example: template="{name}/v{version}", name="lib1", version="1.2.3" -> "lib1/v1.2.3"
    pub fn render(&self, name: &str, version: &str) -> Result<String> {
        self.validate()?;

        let mut slots: Vec<(usize, &str, &str)> = [
            (NAME_PLACEHOLDER, name),
            (VERSION_PLACEHOLDER, version),
        ]
        .into_iter()
        .filter_map(|(placeholder, value)| {
            self.template
                .find(placeholder)
                .map(|pos| (pos, placeholder, value))
        })
        .collect();
        slots.sort_by_key(|(pos, _, _)| *pos);

        // Single pass so substituted values are never re-scanned
        let mut rendered = String::with_capacity(self.template.len() + name.len() + version.len());
        let mut cursor = 0;
        for (pos, placeholder, value) in slots {
            rendered.push_str(&self.template[cursor..pos]);
            rendered.push_str(value);
            cursor = pos + placeholder.len();
        }
        rendered.push_str(&self.template[cursor..]);
        Ok(rendered)
    }
}

impl Default for TagFormat {
    fn default() -> Self {
        TagFormat {
            template: DEFAULT_TAG_FORMAT.to_string(),
        }
    }
}
