use serde::{Deserialize, Serialize};

/// How to install dependencies and start the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManagerInfo {
    pub name: String,
    pub install_command: String,
    pub run_command: String,
}

impl PackageManagerInfo {
    fn new(name: &str, install: &str, run: &str) -> Self {
        Self {
            name: name.to_string(),
            install_command: install.to_string(),
            run_command: run.to_string(),
        }
    }

    pub fn yarn() -> Self {
        Self::new("Yarn", "yarn install", "yarn dev")
    }

    pub fn pnpm() -> Self {
        Self::new("PNPM", "pnpm install", "pnpm dev")
    }

    pub fn bun() -> Self {
        Self::new("Bun", "bun install", "bun dev")
    }

    pub fn npm() -> Self {
        Self::new("NPM", "npm install", "npm run dev")
    }

    /// No recognised manifest or lockfile.
    pub fn unknown() -> Self {
        Self::new("Unknown", "N/A", "N/A")
    }

    pub fn is_unknown(&self) -> bool {
        self.name == "Unknown"
    }
}

// Checked in order; the first file name present decides.
const MARKERS: &[(&str, fn() -> PackageManagerInfo)] = &[
    ("yarn.lock", PackageManagerInfo::yarn),
    ("pnpm-lock.yaml", PackageManagerInfo::pnpm),
    ("bun.lockb", PackageManagerInfo::bun),
    ("package.json", PackageManagerInfo::npm),
];

pub fn detect_package_manager<S: AsRef<str>>(paths: &[S]) -> PackageManagerInfo {
    MARKERS
        .iter()
        .find(|(marker, _)| {
            paths
                .iter()
                .any(|path| path.as_ref().rsplit('/').next() == Some(*marker))
        })
        .map(|(_, info)| info())
        .unwrap_or_else(PackageManagerInfo::unknown)
}
