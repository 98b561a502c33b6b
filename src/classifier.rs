use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::insights::{resolve_architecture, Insights};
use crate::types::{CriticalFiles, FileEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Languages,
    Frameworks,
    Databases,
    Tools,
    Deployment,
    Styling,
    Linting,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Languages,
        Category::Frameworks,
        Category::Databases,
        Category::Tools,
        Category::Deployment,
        Category::Styling,
        Category::Linting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Languages => "languages",
            Category::Frameworks => "frameworks",
            Category::Databases => "databases",
            Category::Tools => "tools",
            Category::Deployment => "deployment",
            Category::Styling => "styling",
            Category::Linting => "linting",
        }
    }
}

/// `dependency` present in the manifest implies `label` in `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRule {
    pub category: Category,
    pub dependency: &'static str,
    pub label: &'static str,
}

const fn rule(category: Category, dependency: &'static str, label: &'static str) -> DependencyRule {
    DependencyRule { category, dependency, label }
}

pub const DEPENDENCY_RULES: &[DependencyRule] = &[
    rule(Category::Frameworks, "react", "React"),
    rule(Category::Frameworks, "next", "Next.js"),
    rule(Category::Frameworks, "vue", "Vue"),
    rule(Category::Frameworks, "nuxt", "Nuxt.js"),
    rule(Category::Frameworks, "svelte", "SvelteKit"),
    rule(Category::Frameworks, "express", "Express"),
    rule(Category::Frameworks, "nestjs", "NestJS"),
    rule(Category::Frameworks, "fastify", "Fastify"),
    rule(Category::Frameworks, "angular", "Angular"),
    rule(Category::Frameworks, "laravel", "Laravel"),
    rule(Category::Databases, "prisma", "Prisma"),
    rule(Category::Databases, "mongoose", "Mongoose"),
    rule(Category::Databases, "drizzle-orm", "Drizzle ORM"),
    rule(Category::Databases, "typeorm", "TypeORM"),
    rule(Category::Databases, "sequelize", "Sequelize"),
    rule(Category::Databases, "firebase-admin", "Firebase"),
    rule(Category::Tools, "husky", "Husky"),
    rule(Category::Tools, "turbo", "Turborepo"),
    rule(Category::Tools, "jest", "Jest"),
    rule(Category::Tools, "vitest", "Vitest"),
    rule(Category::Tools, "cypress", "Cypress"),
    rule(Category::Tools, "storybook", "Storybook"),
    rule(Category::Tools, "vite", "Vite"),
    rule(Category::Tools, "webpack", "Webpack"),
    rule(Category::Deployment, "vercel", "Vercel"),
    rule(Category::Deployment, "netlify", "Netlify"),
    rule(Category::Styling, "tailwindcss", "Tailwind CSS"),
    rule(Category::Styling, "styled-components", "Styled C."),
    rule(Category::Styling, "sass", "Sass"),
    rule(Category::Styling, "less", "Less"),
    rule(Category::Styling, "antd", "Ant Design"),
    rule(Category::Styling, "@mui/material", "MUI"),
    rule(Category::Styling, "shadcn-ui", "shadcn/ui"),
    rule(Category::Linting, "eslint", "ESLint"),
    rule(Category::Linting, "prettier", "Prettier"),
];

const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    (".py", "Python"),
    (".go", "Go"),
    (".java", "Java"),
    (".rs", "Rust"),
    (".php", "PHP"),
];

/// Rules that fire for one dependency name.
pub fn rules_for(dependency: &str) -> impl Iterator<Item = &'static DependencyRule> + '_ {
    DEPENDENCY_RULES.iter().filter(move |r| r.dependency == dependency)
}

/// Seven label sets; each keeps first-seen order and holds no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub databases: Vec<String>,
    pub tools: Vec<String>,
    pub deployment: Vec<String>,
    pub styling: Vec<String>,
    pub linting: Vec<String>,
}

impl TechStack {
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Languages => &self.languages,
            Category::Frameworks => &self.frameworks,
            Category::Databases => &self.databases,
            Category::Tools => &self.tools,
            Category::Deployment => &self.deployment,
            Category::Styling => &self.styling,
            Category::Linting => &self.linting,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Languages => &mut self.languages,
            Category::Frameworks => &mut self.frameworks,
            Category::Databases => &mut self.databases,
            Category::Tools => &mut self.tools,
            Category::Deployment => &mut self.deployment,
            Category::Styling => &mut self.styling,
            Category::Linting => &mut self.linting,
        }
    }

    /// Append `label` unless the category already has it.
    pub fn push(&mut self, category: Category, label: &str) {
        let labels = self.get_mut(category);
        if !labels.iter().any(|existing| existing == label) {
            labels.push(label.to_string());
        }
    }

    pub fn contains(&self, category: Category, label: &str) -> bool {
        self.get(category).iter().any(|existing| existing == label)
    }

    /// Put the declared primary language first unless it was already detected.
    pub fn prepend_language(&mut self, language: &str) {
        if !self.contains(Category::Languages, language) {
            self.languages.insert(0, language.to_string());
        }
    }

    /// Non-empty categories in canonical order.
    pub fn non_empty(&self) -> impl Iterator<Item = (Category, &[String])> + '_ {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
            .filter(|(_, labels)| !labels.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.non_empty().next().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub tech_stack: TechStack,
    pub insights: Insights,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TechStackClassifier;

impl TechStackClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a repository. Pure: the same input always gives the same output.
    pub fn classify(
        &self,
        entries: &[FileEntry],
        critical_files: &CriticalFiles,
        primary_language: Option<&str>,
    ) -> Classification {
        let mut stack = TechStack::default();
        let mut insights = Insights::default();

        if let Some(manifest) = find_manifest(critical_files) {
            for dependency in dependency_names(&manifest) {
                for rule in rules_for(&dependency) {
                    stack.push(rule.category, rule.label);
                }
            }
        }

        for entry in entries {
            let lower = entry.path.to_lowercase();
            for (extension, language) in EXTENSION_LANGUAGES {
                if lower.ends_with(extension) {
                    stack.push(Category::Languages, language);
                }
            }
            if lower.contains("dockerfile") {
                stack.push(Category::Deployment, "Docker");
            }
            insights.observe_path(&lower);
        }

        if let Some(language) = primary_language.filter(|l| !l.is_empty()) {
            stack.prepend_language(language);
        }

        insights.architecture = resolve_architecture(&insights, &stack);
        debug!(architecture = %insights.architecture, "Classification finished");

        Classification {
            tech_stack: stack,
            insights,
        }
    }
}

/// First critical file that parses as JSON with a `name` and a dependency section.
pub fn find_manifest(critical_files: &CriticalFiles) -> Option<Value> {
    critical_files.contents().find_map(|content| {
        let json: Value = serde_json::from_str(content).ok()?;
        let usable = is_truthy(json.get("name"))
            && (is_truthy(json.get("dependencies")) || is_truthy(json.get("devDependencies")));
        usable.then_some(json)
    })
}

/// Dependency then dev-dependency names, without repeats.
pub fn dependency_names(manifest: &Value) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = manifest.get(section).and_then(Value::as_object) {
            for name in deps.keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
    }
    names
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(_) => true,
    }
}
