use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::info;

use crate::config::AppConfig;
use crate::pipeline::DocumentService;
use crate::types::AnalysisResult;

#[derive(Debug, Parser)]
#[command(name = "repodoc")]
#[command(version, about = "Generate a README for a public GitHub repository", long_about = None)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./repodoc.toml when present)
    #[arg(short, long, global = true, env = "REPODOC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a repository and generate its README
    Generate(GenerateArgs),
    /// Run the analysis only
    Analyze(AnalyzeArgs),
    /// Print the prompt that would be sent to the model
    Prompt(PromptArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Free text naming the repository, e.g. "document facebook/react"
    pub directive: String,

    /// Write the markdown to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    pub directive: String,

    /// Print the full analysis as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PromptArgs {
    pub directive: String,
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => AppConfig::load().context("Failed to load configuration"),
    }
}

pub struct CliApp {
    service: DocumentService,
    verbose: bool,
}

impl CliApp {
    pub fn new(config: &AppConfig, verbose: bool) -> Result<Self> {
        info!("Initializing repodoc CLI");
        let service = DocumentService::from_config(config).context("Failed to build the document service")?;
        Ok(Self { service, verbose })
    }

    pub fn with_service(service: DocumentService, verbose: bool) -> Self {
        Self { service, verbose }
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Generate(args) => self.generate(args).await,
            Commands::Analyze(args) => self.analyze(args).await,
            Commands::Prompt(args) => self.prompt(args).await,
        }
    }

    pub async fn generate(&self, args: GenerateArgs) -> Result<()> {
        let start_time = Instant::now();
        let markdown = self
            .service
            .generate(&args.directive)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

        match args.output {
            Some(path) => {
                fs::write(&path, &markdown)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{} {}", "✓ README written to".green(), path.display());
            }
            None => println!("{}", markdown),
        }

        if self.verbose {
            eprintln!("{}", format!("Generated in {:?}", start_time.elapsed()).dimmed());
        }
        Ok(())
    }

    pub async fn analyze(&self, args: AnalyzeArgs) -> Result<()> {
        let analysis = self
            .service
            .analyze(&args.directive)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

        if args.json {
            let json = serde_json::to_string_pretty(&*analysis).context("Failed to serialize analysis to JSON")?;
            println!("{}", json);
        } else {
            println!("{}", format_analysis(&analysis));
        }
        Ok(())
    }

    pub async fn prompt(&self, args: PromptArgs) -> Result<()> {
        let prompt = self
            .service
            .compose_prompt(&args.directive)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        println!("{}", prompt);
        Ok(())
    }
}

/// Human-readable analysis report.
pub fn format_analysis(analysis: &AnalysisResult) -> String {
    let repo = &analysis.repo_data;
    let mut lines = vec![
        format!("{} {}", "📦".bold(), repo.full_name.bold().cyan()),
        format!("   {}", repo.description.as_deref().unwrap_or("N/A")),
        format!("   ★ {}  forks {}", repo.stargazers_count, repo.forks_count),
        String::new(),
        "Tech stack".bold().to_string(),
    ];

    if analysis.tech_stack.is_empty() {
        lines.push("   (nothing detected)".dimmed().to_string());
    }
    for (category, labels) in analysis.tech_stack.non_empty() {
        lines.push(format!("   {:<12} {}", category.as_str(), labels.join(", ")));
    }

    lines.push(String::new());
    lines.push("Insights".bold().to_string());
    for (key, value) in analysis.insights.entries() {
        lines.push(format!("   {:<12} {}", key, value));
    }

    let pm = &analysis.package_manager;
    lines.push(String::new());
    lines.push(format!("{} {} ({} / {})", "Package manager".bold(), pm.name, pm.install_command, pm.run_command));

    if analysis.tree_truncated {
        lines.push("⚠ The host truncated the file listing; results may be partial".yellow().to_string());
    }
    for failure in &analysis.soft_failures {
        lines.push(format!("{} {}: {}", "⚠ skipped".yellow(), failure.path, failure.reason));
    }

    lines.push(String::new());
    lines.push("File structure".bold().to_string());
    lines.push(analysis.file_tree.trim_end().to_string());
    lines.join("\n")
}
