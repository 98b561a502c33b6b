use std::fmt::Write;

use crate::identifier::format_repo_title;
use crate::types::AnalysisResult;

const WRITER_BRIEF: &str = r##"You are "Genesis", a world-class technical writer and senior software architect. Your mission is to write a stunning, insightful and comprehensive README.md based on the structured analysis of the GitHub repository provided below.

**Primary goal:** produce a complete, ready-to-use README.md in Markdown.

**Mandatory format and style rules:**
1.  **Title:** start with the H1 title "# ✨ {title}".
2.  **Badges:** right after the title, add a row of relevant shields.io badges for the most important technologies identified (language, main framework, linters).
3.  **Project description:** use a Markdown blockquote (`>`) for the description. If the description is "N/A", write a concise one-sentence summary based on the repository name and the tech stack.
4.  **Section headers:** every H2 header MUST start with a descriptive emoji. Use these:
    - `✨ Key Features`
    - `🛠️ Tech Stack`
    - `🏛️ Architecture Overview`
    - `🚀 Getting Started`
    - `📂 File Structure`
5.  **Key Features:**
    - This is the most important section. Do NOT just list files.
    - You MUST synthesize and infer high-level features from file names, the tech stack and the key file contents.
    - Example: seeing 'src/routes/auth/jwt.ts' and 'prisma/schema.prisma' should lead to a feature such as "**Secure JWT Authentication:** handles sign-up, login and protected routes with JSON Web Tokens."
    - Present features as a bullet list with bold feature names.
6.  **Tech Stack:**
    - Build a standard Markdown table with three columns: 'Category', 'Technology' and 'Notes'.
    - Fill it logically from the tech stack data provided.
7.  **Getting Started:**
    - Give clear, numbered setup steps.
    - Include cloning the repository, installing dependencies (with the detected package manager commands) and running the development server.
    - Every command goes inside a ```bash code block.
8.  **File Structure:**
    - Include the provided ASCII file tree inside a ``` code block without a language tag.
    - Add a short high-level explanation of the main directories (for example 'src', 'packages', 'public')."##;

/// Serializes an analysis into the single prompt sent to the writer model.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer;

impl PromptComposer {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(&self, analysis: &AnalysisResult) -> String {
        let title = format_repo_title(&analysis.repo_data.name);
        let mut prompt = WRITER_BRIEF.replace("{title}", &title);

        prompt.push_str("\n\n**RAW ANALYSIS DATA (use this to build the README):**\n");
        prompt.push_str(&self.analysis_block(analysis));
        prompt.push_str("\n\nNow write the complete README.md.\n");
        prompt
    }

    /// The `<analysis>` payload on its own.
    pub fn analysis_block(&self, analysis: &AnalysisResult) -> String {
        let repo = &analysis.repo_data;
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "<analysis>");
        let _ = writeln!(out, "  <repo_info>");
        let _ = writeln!(out, "    <name>{}</name>", repo.full_name);
        let _ = writeln!(out, "    <description>{}</description>", or_na(repo.description.as_deref()));
        let _ = writeln!(out, "    <language>{}</language>", or_na(repo.language.as_deref()));
        let _ = writeln!(out, "    <stars>{}</stars>", repo.stargazers_count);
        let _ = writeln!(out, "    <forks>{}</forks>", repo.forks_count);
        if !repo.topics.is_empty() {
            let _ = writeln!(out, "    <topics>{}</topics>", repo.topics.join(", "));
        }
        let _ = writeln!(out, "  </repo_info>");

        let _ = writeln!(out, "  <tech_stack>");
        for (category, labels) in analysis.tech_stack.non_empty() {
            let tag = category.as_str();
            let _ = writeln!(out, "    <{tag}>{}</{tag}>", labels.join(", "));
        }
        let _ = writeln!(out, "  </tech_stack>");

        let _ = writeln!(out, "  <insights>");
        for (key, value) in analysis.insights.entries() {
            let _ = writeln!(out, "    <{key}>{value}</{key}>");
        }
        let _ = writeln!(out, "  </insights>");

        let pm = &analysis.package_manager;
        let _ = writeln!(out, "  <getting_started>");
        let _ = writeln!(out, "    <package_manager>{}</package_manager>", pm.name);
        let _ = writeln!(out, "    <install_command>{}</install_command>", pm.install_command);
        let _ = writeln!(out, "    <run_command>{}</run_command>", pm.run_command);
        let _ = writeln!(out, "  </getting_started>");

        let _ = writeln!(out, "  <file_tree>");
        out.push_str(&analysis.file_tree);
        let _ = writeln!(out, "  </file_tree>");

        let contents = serde_json::to_string(&analysis.key_file_contents).unwrap_or_else(|_| "{}".to_string());
        let _ = writeln!(out, "  <key_file_contents>");
        let _ = writeln!(out, "{}", contents);
        let _ = writeln!(out, "  </key_file_contents>");
        let _ = write!(out, "</analysis>");
        out
    }
}

fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "N/A",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Category, TechStack};
    use crate::insights::{Architecture, Insights};
    use crate::package_manager::PackageManagerInfo;
    use crate::types::{CriticalFiles, RepositoryMetadata};

    fn analysis() -> AnalysisResult {
        let mut stack = TechStack::default();
        stack.push(Category::Languages, "TypeScript");
        stack.push(Category::Frameworks, "React");
        stack.push(Category::Styling, "Tailwind CSS");

        let mut files = CriticalFiles::new();
        files.insert("package.json", "{\"name\":\"ui-kit\"}");

        AnalysisResult {
            repo_data: RepositoryMetadata {
                full_name: "octo/ui-kit".to_string(),
                name: "ui-kit".to_string(),
                description: None,
                language: Some("TypeScript".to_string()),
                stargazers_count: 42,
                forks_count: 7,
                topics: vec!["react".to_string(), "components".to_string()],
                default_branch: "main".to_string(),
            },
            tech_stack: stack,
            insights: Insights {
                has_ci: true,
                architecture: Architecture::SinglePageApplication,
                ..Insights::default()
            },
            package_manager: PackageManagerInfo::pnpm(),
            file_tree: "/\n└── package.json\n".to_string(),
            key_file_contents: files,
            tree_truncated: false,
            soft_failures: vec![],
        }
    }

    #[test]
    fn test_prompt_has_title_and_rules() {
        let prompt = PromptComposer::new().compose(&analysis());
        assert!(prompt.contains("# ✨ Ui Kit"));
        assert!(prompt.contains("🚀 Getting Started"));
        assert!(prompt.trim_end().ends_with("Now write the complete README.md."));
    }

    #[test]
    fn test_prompt_carries_the_whole_brief() {
        let prompt = PromptComposer::new().compose(&analysis());
        assert!(prompt.starts_with("You are \"Genesis\""));
        assert!(prompt.contains("1.  **Title:** start with the H1 title \"# ✨ Ui Kit\"."));
        assert!(prompt.contains("**Tech Stack:**"));
        assert!(prompt.contains("(for example 'src', 'packages', 'public')."));

        let brief_end = prompt.find("'public').").unwrap();
        let data_start = prompt.find("**RAW ANALYSIS DATA").unwrap();
        assert!(brief_end < data_start);
    }

    #[test]
    fn test_analysis_block_contents() {
        let block = PromptComposer::new().analysis_block(&analysis());

        assert!(block.starts_with("<analysis>"));
        assert!(block.ends_with("</analysis>"));
        assert!(block.contains("<name>octo/ui-kit</name>"));
        assert!(block.contains("<description>N/A</description>"));
        assert!(block.contains("<stars>42</stars>"));
        assert!(block.contains("<topics>react, components</topics>"));
        assert!(block.contains("<frameworks>React</frameworks>"));
        assert!(block.contains("<styling>Tailwind CSS</styling>"));
        assert!(!block.contains("<databases>"));
        assert!(block.contains("<hasCI>true</hasCI>"));
        assert!(block.contains("<isMonorepo>false</isMonorepo>"));
        assert!(block.contains("<architecture>Single Page Application (SPA)</architecture>"));
        assert!(block.contains("<install_command>pnpm install</install_command>"));
        assert!(block.contains("└── package.json"));
        assert!(block.contains(r#"{"package.json":"{\"name\":\"ui-kit\"}"}"#));
    }
}
