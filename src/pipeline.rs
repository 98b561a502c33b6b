use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::AnalysisCache;
use crate::classifier::TechStackClassifier;
use crate::config::AppConfig;
use crate::error::{RepodocError, Result};
use crate::extractor::CriticalFileExtractor;
use crate::generation::{GeminiClient, GenerationInvoker, RetryPolicy};
use crate::github::{GitHubClient, RepositoryHost};
use crate::identifier::{extract_repo_name, RepositoryIdentifier};
use crate::package_manager::detect_package_manager;
use crate::prompt::PromptComposer;
use crate::tree::FileTreeRenderer;
use crate::types::AnalysisResult;

/// Runs the repository analysis against a host.
pub struct RepositoryAnalyzer {
    host: Arc<dyn RepositoryHost>,
    extractor: CriticalFileExtractor,
    classifier: TechStackClassifier,
    renderer: FileTreeRenderer,
}

impl RepositoryAnalyzer {
    pub fn new(host: Arc<dyn RepositoryHost>) -> Self {
        Self {
            extractor: CriticalFileExtractor::new(Arc::clone(&host)),
            host,
            classifier: TechStackClassifier::new(),
            renderer: FileTreeRenderer::new(),
        }
    }

    pub async fn analyze(&self, repo: &RepositoryIdentifier) -> Result<AnalysisResult> {
        let started = Instant::now();
        info!(repo = %repo, "Starting repository analysis");

        let repo_data = self.host.fetch_metadata(repo).await?;
        let listing = self.host.fetch_tree(repo, &repo_data.default_branch).await?;
        if listing.truncated {
            warn!(
                repo = %repo,
                files = listing.entries.len(),
                "File listing was truncated by the host; continuing with a partial tree"
            );
        }

        let extraction = self.extractor.extract(repo, &listing.entries).await;
        let classification =
            self.classifier
                .classify(&listing.entries, &extraction.files, repo_data.language.as_deref());

        let paths = listing.paths();
        let file_tree = self.renderer.render(&paths);
        let package_manager = detect_package_manager(&paths);

        info!(
            repo = %repo,
            files = paths.len(),
            critical_files = extraction.files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Repository analysis finished"
        );

        Ok(AnalysisResult {
            repo_data,
            tech_stack: classification.tech_stack,
            insights: classification.insights,
            package_manager,
            file_tree,
            key_file_contents: extraction.files,
            tree_truncated: listing.truncated,
            soft_failures: extraction.failures,
        })
    }
}

/// Turns a free-text directive into a generated document.
pub struct DocumentService {
    analyzer: RepositoryAnalyzer,
    cache: Arc<AnalysisCache>,
    composer: PromptComposer,
    invoker: Option<GenerationInvoker>,
}

impl DocumentService {
    pub fn new(analyzer: RepositoryAnalyzer, cache: Arc<AnalysisCache>, invoker: Option<GenerationInvoker>) -> Self {
        Self {
            analyzer,
            cache,
            composer: PromptComposer::new(),
            invoker,
        }
    }

    /// Wire the GitHub and Gemini clients from configuration. Without a
    /// generation key the service can still analyze and compose prompts.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let host = Arc::new(GitHubClient::new(&config.github)?);
        let cache = Arc::new(AnalysisCache::from_config(&config.cache));

        let invoker = match GeminiClient::new(&config.generation) {
            Ok(client) => {
                info!(model = client.model(), "Generation enabled");
                Some(GenerationInvoker::new(
                    Arc::new(client),
                    RetryPolicy::from_config(&config.generation),
                ))
            }
            Err(e) => {
                warn!("Generation disabled: {}", e);
                None
            }
        };

        Ok(Self::new(RepositoryAnalyzer::new(host), cache, invoker))
    }

    pub fn can_generate(&self) -> bool {
        self.invoker.is_some()
    }

    /// Repository referenced by `directive`.
    pub fn resolve(&self, directive: &str) -> Result<RepositoryIdentifier> {
        if directive.trim().is_empty() {
            return Err(RepodocError::EmptyPrompt);
        }
        extract_repo_name(directive).ok_or_else(|| RepodocError::InvalidRepository(directive.to_string()))
    }

    /// Cached analysis when fresh, otherwise a new one (which is then cached).
    pub async fn analysis_for(&self, repo: &RepositoryIdentifier) -> Result<Arc<AnalysisResult>> {
        if let Some(cached) = self.cache.get(repo) {
            info!(repo = %repo, "Serving analysis from cache");
            return Ok(cached);
        }

        let analysis = Arc::new(self.analyzer.analyze(repo).await?);
        debug!("{}", analysis.summary());
        self.cache.put(repo, Arc::clone(&analysis));
        Ok(analysis)
    }

    pub async fn analyze(&self, directive: &str) -> Result<Arc<AnalysisResult>> {
        let repo = self.resolve(directive)?;
        self.analysis_for(&repo).await
    }

    pub async fn compose_prompt(&self, directive: &str) -> Result<String> {
        let analysis = self.analyze(directive).await?;
        Ok(self.composer.compose(&analysis))
    }

    /// Full pipeline. Returns the generated markdown unchanged.
    pub async fn generate(&self, directive: &str) -> Result<String> {
        let invoker = self
            .invoker
            .as_ref()
            .ok_or_else(|| RepodocError::Other("GEMINI_API_KEY environment variable is not set".to_string()))?;

        let prompt = self.compose_prompt(directive).await?;
        info!(prompt_len = prompt.len(), "Invoking generation service");
        Ok(invoker.invoke(&prompt).await?)
    }
}
