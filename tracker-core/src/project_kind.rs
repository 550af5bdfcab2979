//! Project kind detection from marker files in the project root.

use std::path::Path;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    TypeScript,
    JavaScript,
    Python,
    Rust,
    Go,
    General,
}

impl ProjectKind {
    pub fn detect(root: &Path) -> Self {
        if root.join("package.json").exists() {
            if root.join("tsconfig.json").exists() || depends_on_typescript(root) {
                Self::TypeScript
            } else {
                Self::JavaScript
            }
        } else if root.join("pyproject.toml").exists() || root.join("setup.py").exists() {
            Self::Python
        } else if root.join("Cargo.toml").exists() {
            Self::Rust
        } else if root.join("go.mod").exists() {
            Self::Go
        } else {
            Self::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Go => "go",
            Self::General => "general",
        }
    }

    /// Node projects get the GPU performance profile during sessions.
    pub fn is_node(&self) -> bool {
        matches!(self, Self::TypeScript | Self::JavaScript)
    }

    pub fn agent_type(&self) -> &'static str {
        match self {
            Self::General => "general-purpose",
            other => other.as_str(),
        }
    }

    pub fn tech_stack(&self) -> &'static str {
        match self {
            Self::TypeScript => "TypeScript/Node.js",
            Self::JavaScript => "JavaScript/Node.js",
            Self::Python => "Python",
            Self::Rust => "Rust",
            Self::Go => "Go",
            Self::General => "Mixed/Unknown",
        }
    }

    pub fn commands(&self) -> &'static str {
        match self {
            Self::TypeScript | Self::JavaScript => "npm install, npm run build, npm test",
            Self::Python => "pip install -e ., python -m pytest, pre-commit run --all-files",
            Self::Rust => "cargo build, cargo test, cargo run",
            Self::Go => "go build ./..., go test ./..., go run .",
            Self::General => "See project documentation",
        }
    }

    pub fn capabilities(&self) -> &'static str {
        match self {
            Self::TypeScript => "TypeScript compilation, Node.js modules, package management",
            Self::JavaScript => "JavaScript modules, Node.js runtime, package management",
            Self::Python => "Python packages, testing frameworks, code quality tools",
            Self::Rust => "Rust compilation, dependency management, testing",
            Self::Go => "Go modules, toolchain builds, testing",
            Self::General => "General file operations and code analysis",
        }
    }

    /// Extra hints printed when a session starts.
    pub fn session_tips(&self) -> &'static [&'static str] {
        match self {
            Self::TypeScript => &[
                "TypeScript: npm run dev for development server",
                "Use npm run build to test compilation",
            ],
            Self::Python => &[
                "Python: pip install -e . for development install",
                "Run tests with pytest before completing tasks",
            ],
            _ => &[],
        }
    }
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn depends_on_typescript(root: &Path) -> bool {
    let Ok(raw) = std::fs::read_to_string(root.join("package.json")) else {
        return false;
    };
    let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&raw) else {
        tracing::debug!(root = %root.display(), "unparseable package.json");
        return false;
    };
    ["dependencies", "devDependencies"]
        .iter()
        .any(|section| manifest[section].get("typescript").is_some())
}
