pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod identifier;
pub mod github;
pub mod extractor;
pub mod classifier;
pub mod insights;
pub mod tree;
pub mod package_manager;
pub mod cache;
pub mod prompt;
pub mod generation;
pub mod pipeline;
pub mod http;
pub mod cli;

// Re-export commonly used types
pub use types::*;
pub use error::{GenerationError, RepodocError, Result};
pub use config::AppConfig;
pub use identifier::{extract_repo_name, format_repo_title, RepositoryIdentifier};
pub use github::{GitHubClient, RepositoryHost};
pub use extractor::CriticalFileExtractor;
pub use classifier::{Category, TechStack, TechStackClassifier};
pub use insights::{Architecture, Insights};
pub use tree::FileTreeRenderer;
pub use package_manager::{detect_package_manager, PackageManagerInfo};
pub use cache::{AnalysisCache, Clock, ManualClock, SystemClock};
pub use prompt::PromptComposer;
pub use generation::{GeminiClient, GenerationInvoker, RetryPolicy, Sleeper, TextGenerator, TokioSleeper};
pub use pipeline::{DocumentService, RepositoryAnalyzer};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
