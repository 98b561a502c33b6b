use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// Tried in order; the first capture wins.
static REPO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"github\.com/([a-zA-Z0-9_.-]+/[a-zA-Z0-9_.-]+)").expect("valid regex"),
        Regex::new(r"([a-zA-Z0-9_.-]+/[a-zA-Z0-9_.-]+)").expect("valid regex"),
    ]
});

/// A validated `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryIdentifier(String);

impl RepositoryIdentifier {
    /// Parse an `owner/name` pair, stripping a trailing `.git`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.strip_suffix(".git").unwrap_or(raw);
        let (owner, name) = trimmed.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn owner(&self) -> &str {
        self.0.split_once('/').map(|(owner, _)| owner).unwrap_or(&self.0)
    }

    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, name)| name).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Find the repository a free-text directive refers to.
///
/// A `github.com/owner/name` URL takes precedence over any other
/// `owner/name` looking pair in the text.
pub fn extract_repo_name(directive: &str) -> Option<RepositoryIdentifier> {
    REPO_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(directive)
            .and_then(|caps| caps.get(1))
            .and_then(|m| RepositoryIdentifier::parse(m.as_str()))
    })
}

/// Turn a repository name into a document title: `my-cool_repo` -> `My Cool Repo`.
pub fn format_repo_title(name: &str) -> String {
    name.split(['-', '_'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
