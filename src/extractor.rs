use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::github::RepositoryHost;
use crate::identifier::RepositoryIdentifier;
use crate::types::{CriticalFiles, FileEntry, SoftFailure};

/// File names (final path segment, case-sensitive) worth downloading.
pub const CRITICAL_FILES: &[&str] = &[
    "package.json",
    "composer.json",
    "README.md",
    "README.mdx",
    "vercel.json",
    "netlify.toml",
    "dockerfile",
    "docker-compose.yml",
    "tsconfig.json",
    "jsconfig.json",
    "vite.config.ts",
    "webpack.config.js",
    "next.config.js",
    "next.config.mjs",
    "prisma/schema.prisma",
    ".env.example",
    "requirements.txt",
    "pom.xml",
];

pub const MAX_CRITICAL_FILES: usize = 10;

/// First `limit` entries whose file name is on the allow-list, in listing order.
pub fn select_critical_files<'a>(entries: &'a [FileEntry], limit: usize) -> Vec<&'a FileEntry> {
    entries
        .iter()
        .filter(|entry| CRITICAL_FILES.contains(&entry.file_name()))
        .take(limit)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub files: CriticalFiles,
    pub failures: Vec<SoftFailure>,
}

pub struct CriticalFileExtractor {
    host: Arc<dyn RepositoryHost>,
    limit: usize,
}

impl CriticalFileExtractor {
    pub fn new(host: Arc<dyn RepositoryHost>) -> Self {
        Self {
            host,
            limit: MAX_CRITICAL_FILES,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Download the selected files concurrently. A failed file is recorded and
    /// skipped; it never fails the batch.
    pub async fn extract(&self, repo: &RepositoryIdentifier, entries: &[FileEntry]) -> ExtractionReport {
        let selected = select_critical_files(entries, self.limit);
        debug!(repo = %repo, count = selected.len(), "Reading critical files");

        let fetches = selected.into_iter().map(|entry| {
            let host = Arc::clone(&self.host);
            let path = entry.path.clone();
            async move {
                match host.fetch_file_content(repo, &path).await {
                    Ok(content) => Ok((path, content)),
                    Err(e) => Err(SoftFailure {
                        path,
                        reason: e.to_string(),
                    }),
                }
            }
        });

        let mut report = ExtractionReport::default();
        for outcome in join_all(fetches).await {
            match outcome {
                Ok((path, content)) => report.files.insert(path, content),
                Err(failure) => {
                    warn!(path = %failure.path, reason = %failure.reason, "Could not read critical file");
                    report.failures.push(failure);
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RepodocError, Result};
    use crate::types::{RepositoryMetadata, TreeListing};
    use async_trait::async_trait;

    struct FakeHost;

    #[async_trait]
    impl RepositoryHost for FakeHost {
        async fn fetch_metadata(&self, _repo: &RepositoryIdentifier) -> Result<RepositoryMetadata> {
            unreachable!()
        }

        async fn fetch_tree(&self, _repo: &RepositoryIdentifier, _branch: &str) -> Result<TreeListing> {
            unreachable!()
        }

        async fn fetch_file_content(&self, _repo: &RepositoryIdentifier, path: &str) -> Result<String> {
            if path.contains("broken") {
                Err(RepodocError::Other("500 from host".to_string()))
            } else {
                Ok(format!("content of {}", path))
            }
        }
    }

    fn entries(paths: &[&str]) -> Vec<FileEntry> {
        paths.iter().map(|p| FileEntry::new(*p)).collect()
    }

    #[test]
    fn test_selection_matches_final_segment_case_sensitively() {
        let list = entries(&["src/index.ts", "web/package.json", "README.MD", "README.md", "Dockerfile"]);
        let selected: Vec<&str> = select_critical_files(&list, MAX_CRITICAL_FILES)
            .iter()
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(selected, vec!["web/package.json", "README.md"]);
    }

    #[test]
    fn test_selection_is_capped_in_listing_order() {
        let paths: Vec<String> = (0..15).map(|i| format!("pkg{}/package.json", i)).collect();
        let list: Vec<FileEntry> = paths.iter().map(FileEntry::new).collect();
        let selected = select_critical_files(&list, MAX_CRITICAL_FILES);
        assert_eq!(selected.len(), 10);
        assert_eq!(selected[0].path, "pkg0/package.json");
        assert_eq!(selected[9].path, "pkg9/package.json");
    }

    #[tokio::test]
    async fn test_extract_collects_soft_failures() {
        let extractor = CriticalFileExtractor::new(Arc::new(FakeHost));
        let repo = RepositoryIdentifier::parse("octo/widgets").unwrap();
        let list = entries(&["package.json", "broken/tsconfig.json", "src/lib.rs", ".env.example"]);

        let report = extractor.extract(&repo, &list).await;

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files.get("package.json"), Some("content of package.json"));
        assert_eq!(report.files.get(".env.example"), Some("content of .env.example"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "broken/tsconfig.json");
        assert!(report.failures[0].reason.contains("500"));
    }

    #[tokio::test]
    async fn test_extract_respects_custom_limit() {
        let extractor = CriticalFileExtractor::new(Arc::new(FakeHost)).with_limit(1);
        let repo = RepositoryIdentifier::parse("octo/widgets").unwrap();
        let list = entries(&["package.json", "tsconfig.json"]);

        let report = extractor.extract(&repo, &list).await;
        assert_eq!(report.files.len(), 1);
        assert!(report.failures.is_empty());
    }
}
