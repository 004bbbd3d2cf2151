use regex::Regex;

const HEADER_PATTERN: &str =
    r"^(?P<type>[A-Za-z]+)(?:\((?P<scope>[^)]*)\))?(?P<bang>!)?:\s*(?P<subject>.*)$";
const FOOTER_PATTERN: &str = r"^(?P<key>BREAKING CHANGE|BREAKING-CHANGE|[A-Za-z][A-Za-z0-9-]*)(?::\s|\s#)(?P<value>.*)$";
const NESTED_BEGIN: &str = "BEGIN_NESTED_COMMIT";
const NESTED_END: &str = "END_NESTED_COMMIT";

/// Structured form of one conventional commit, attributed to a library.
///
/// Consumed read-only by the change classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommitRecord {
    pub r#type: String,
    pub scope: Option<String>,
    pub subject: String,
    pub is_breaking: bool,
    /// Came from a nested block (bulk regeneration) rather than the commit itself
    pub is_nested: bool,
    /// Footers in message order
    pub footers: Vec<(String, String)>,
    pub library_id: String,
    pub commit_hash: String,
}

impl ConventionalCommitRecord {
    /// Build a bare record, mostly useful in tests and for synthetic commits
    pub fn new(r#type: impl Into<String>, subject: impl Into<String>) -> Self {
        ConventionalCommitRecord {
            r#type: r#type.into(),
            scope: None,
            subject: subject.into(),
            is_breaking: false,
            is_nested: false,
            footers: Vec::new(),
            library_id: String::new(),
            commit_hash: String::new(),
        }
    }

    pub fn breaking(mut self) -> Self {
        self.is_breaking = true;
        self
    }

    pub fn nested(mut self) -> Self {
        self.is_nested = true;
        self
    }

    /// First footer value for `key`; later duplicates are not meaningful
    pub fn footer(&self, key: &str) -> Option<&str> {
        self.footers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a raw commit message into conventional commit records.
///
/// Supported header formats:
/// - type(scope)!: subject
/// - type(scope): subject
/// - type!: subject
/// - type: subject
///
/// Text between `BEGIN_NESTED_COMMIT` / `END_NESTED_COMMIT` lines is parsed as
/// additional records flagged `is_nested`. The outer message yields a record when it is
/// conventional, or as a `chore` fallback when there are no nested blocks.
pub fn parse_message(
    message: &str,
    commit_hash: &str,
    library_id: &str,
) -> Vec<ConventionalCommitRecord> {
    let (outer, nested_blocks) = split_nested(message);
    let mut records = Vec::new();

    match parse_single(&outer) {
        Some(record) => records.push(record),
        None if nested_blocks.is_empty() => {
            let subject = outer.trim().lines().next().unwrap_or_default().trim();
            records.push(ConventionalCommitRecord::new("chore", subject));
        }
        None => {}
    }

    for block in nested_blocks {
        if let Some(record) = parse_single(&block) {
            records.push(record.nested());
        }
    }

    for record in &mut records {
        record.commit_hash = commit_hash.to_string();
        record.library_id = library_id.to_string();
    }

    records
}

fn split_nested(message: &str) -> (String, Vec<String>) {
    let mut outer = Vec::new();
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in message.lines() {
        let trimmed = line.trim();
        if trimmed == NESTED_BEGIN {
            current = Some(Vec::new());
        } else if trimmed == NESTED_END {
            if let Some(lines) = current.take() {
                blocks.push(lines.join("\n"));
            }
        } else if let Some(lines) = current.as_mut() {
            lines.push(line);
        } else {
            outer.push(line);
        }
    }

    // An unterminated block still counts as nested content
    if let Some(lines) = current {
        blocks.push(lines.join("\n"));
    }

    (outer.join("\n"), blocks)
}

fn parse_single(message: &str) -> Option<ConventionalCommitRecord> {
    let trimmed = message.trim();
    let mut lines = trimmed.lines();
    let header = lines.next()?.trim();

    let captures = Regex::new(HEADER_PATTERN)
        .ok()
        .and_then(|re| re.captures(header))?;

    let r#type = captures
        .name("type")
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default();
    let scope = captures
        .name("scope")
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());
    let has_bang = captures.name("bang").is_some();
    let subject = captures
        .name("subject")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let footers = parse_footers(lines.collect::<Vec<_>>().as_slice());
    let footer_breaking = footers
        .iter()
        .any(|(k, _)| k == "BREAKING CHANGE" || k == "BREAKING-CHANGE");

    Some(ConventionalCommitRecord {
        r#type,
        scope,
        subject,
        is_breaking: has_bang || footer_breaking,
        is_nested: false,
        footers,
        library_id: String::new(),
        commit_hash: String::new(),
    })
}

/// Footers are the trailing paragraph whose lines look like `Key: value` or `Key #value`.
fn parse_footers(body: &[&str]) -> Vec<(String, String)> {
    let Some(re) = Regex::new(FOOTER_PATTERN).ok() else {
        return Vec::new();
    };

    let mut footers = Vec::new();
    for line in body {
        if let Some(captures) = re.captures(line.trim_end()) {
            let key = captures.name("key").map(|m| m.as_str()).unwrap_or_default();
            let value = captures
                .name("value")
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            footers.push((key.to_string(), value.to_string()));
        } else if let Some((_, last)) = footers.last_mut() {
            // Continuation line of a multi-line footer value
            if !line.trim().is_empty() {
                last.push('\n');
                last.push_str(line.trim());
            }
        }
    }
    footers
}
