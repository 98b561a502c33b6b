use serde::{Serialize, Serializer};
use std::fmt;

use crate::classifier::TechStack;

const BACKEND_FRAMEWORKS: &[&str] = &["Express", "NestJS", "Fastify", "Laravel"];
const SPA_FRAMEWORKS: &[&str] = &["React", "Vue", "SvelteKit", "Angular"];

/// Architectural archetype inferred once all paths have been scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Architecture {
    Monorepo,
    FullStackFramework,
    BackendService,
    SinglePageApplication,
    #[default]
    Unknown,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Monorepo => "Monorepo",
            Architecture::FullStackFramework => "Full-stack Framework (Next.js)",
            Architecture::BackendService => "Backend Service / API",
            Architecture::SinglePageApplication => "Single Page Application (SPA)",
            Architecture::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Architecture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Project-level facts derived from file paths.
///
/// The flags only ever go from `false` to `true` during a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Insights {
    #[serde(rename = "isMonorepo")]
    pub is_monorepo: bool,
    #[serde(rename = "hasTests")]
    pub has_tests: bool,
    #[serde(rename = "hasCI")]
    pub has_ci: bool,
    #[serde(rename = "hasAPI")]
    pub has_api: bool,
    pub architecture: Architecture,
}

impl Insights {
    /// Fold one lower-cased path into the flags.
    pub fn observe_path(&mut self, lower_path: &str) {
        if lower_path.contains("test") || lower_path.contains("spec") {
            self.has_tests = true;
        }
        if lower_path.contains(".github/workflows") {
            self.has_ci = true;
        }
        if lower_path.contains("/api/") || lower_path.contains("/routes/") || lower_path.contains("/controllers/") {
            self.has_api = true;
        }
        if lower_path.starts_with("packages/")
            || lower_path.contains("lerna.json")
            || lower_path.contains("pnpm-workspace.yaml")
        {
            self.is_monorepo = true;
        }
    }

    /// Key/value pairs in display order, as rendered into the prompt.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("isMonorepo", self.is_monorepo.to_string()),
            ("hasTests", self.has_tests.to_string()),
            ("hasCI", self.has_ci.to_string()),
            ("hasAPI", self.has_api.to_string()),
            ("architecture", self.architecture.to_string()),
        ]
    }
}

/// Pick the archetype. Monorepo layout beats a full-stack framework, which
/// beats backend frameworks, which beat SPA frameworks.
pub fn resolve_architecture(insights: &Insights, stack: &TechStack) -> Architecture {
    let has_any = |names: &[&str]| stack.frameworks.iter().any(|f| names.contains(&f.as_str()));

    if insights.is_monorepo {
        Architecture::Monorepo
    } else if stack.frameworks.iter().any(|f| f == "Next.js") {
        Architecture::FullStackFramework
    } else if has_any(BACKEND_FRAMEWORKS) {
        Architecture::BackendService
    } else if has_any(SPA_FRAMEWORKS) {
        Architecture::SinglePageApplication
    } else {
        Architecture::Unknown
    }
}
