use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::classifier::TechStack;
use crate::insights::Insights;
use crate::package_manager::PackageManagerInfo;

/// Repository metadata as reported by the host's repository endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepositoryMetadata {
    pub full_name: String,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub topics: Vec<String>,
    pub default_branch: String,
}

/// A blob entry of the recursive tree listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub size: Option<u64>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: None,
        }
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Blob entries of a tree listing plus the host's truncation flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeListing {
    pub entries: Vec<FileEntry>,
    pub truncated: bool,
}

impl TreeListing {
    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.path.clone()).collect()
    }
}

/// Decoded contents of the selected critical files, kept in selection order.
///
/// Serializes as a JSON object keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriticalFiles {
    files: Vec<(String, String)>,
}

impl CriticalFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the content of `path`.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        let path = path.into();
        let content = content.into();
        match self.files.iter_mut().find(|(existing, _)| *existing == path) {
            Some(slot) => slot.1 = content,
            None => self.files.push((path, content)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(existing, _)| existing == path)
            .map(|(_, content)| content.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(path, content)| (path.as_str(), content.as_str()))
    }

    pub fn contents(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(_, content)| content.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Serialize for CriticalFiles {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.files.len()))?;
        for (path, content) in &self.files {
            map.serialize_entry(path, content)?;
        }
        map.end()
    }
}

/// A non-fatal per-file failure recorded during extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoftFailure {
    pub path: String,
    pub reason: String,
}

/// Everything the pipeline learned about one repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub repo_data: RepositoryMetadata,
    pub tech_stack: TechStack,
    pub insights: Insights,
    pub package_manager: PackageManagerInfo,
    pub file_tree: String,
    pub key_file_contents: CriticalFiles,
    /// Set when the host truncated the tree listing.
    pub tree_truncated: bool,
    pub soft_failures: Vec<SoftFailure>,
}

impl AnalysisResult {
    /// One-line summary for terminal display
    pub fn summary(&self) -> String {
        format!(
            "{} | languages: [{}] | frameworks: [{}] | architecture: {} | package manager: {}",
            self.repo_data.full_name,
            self.tech_stack.languages.join(", "),
            self.tech_stack.frameworks.join(", "),
            self.insights.architecture,
            self.package_manager.name
        )
    }
}
