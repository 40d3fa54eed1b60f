//! Language identification and the allow-list
//!
//! Maps class-attribute tokens to language IDs and holds the ordered set of
//! languages eligible for highlighting and auto-detection.

use anyhow::{bail, Result};

/// Supported language identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageId {
    Css,
    /// Django/Jinja template markup. No dedicated grammar; parsed as HTML
    /// with template tags passing through unstyled.
    Django,
    Html,
    JavaScript,
    /// Python console transcript (`>>>` prompts plus output lines).
    Pycon,
    Python,
    Bash,
    Rust,
    Json,
}

/// All languages the registry knows, in canonical-name order.
pub const ALL_LANGUAGES: &[LanguageId] = &[
    LanguageId::Bash,
    LanguageId::Css,
    LanguageId::Django,
    LanguageId::Html,
    LanguageId::JavaScript,
    LanguageId::Json,
    LanguageId::Pycon,
    LanguageId::Python,
    LanguageId::Rust,
];

impl LanguageId {
    /// Resolve a class-attribute token (e.g. "js", "python3") to a language
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "css" => Some(LanguageId::Css),
            "django" | "jinja" | "jinja2" | "htmldjango" => Some(LanguageId::Django),
            "html" | "htm" | "xhtml" => Some(LanguageId::Html),
            "js" | "javascript" | "mjs" | "cjs" | "jsx" => Some(LanguageId::JavaScript),
            "pycon" | "python-repl" | "python-console" => Some(LanguageId::Pycon),
            "python" | "py" | "python3" => Some(LanguageId::Python),
            "bash" | "sh" | "shell" | "zsh" | "console" => Some(LanguageId::Bash),
            "rust" | "rs" => Some(LanguageId::Rust),
            "json" => Some(LanguageId::Json),
            _ => None,
        }
    }

    /// Canonical identifier, as written in config files and class hints
    pub fn name(&self) -> &'static str {
        match self {
            LanguageId::Css => "css",
            LanguageId::Django => "django",
            LanguageId::Html => "html",
            LanguageId::JavaScript => "js",
            LanguageId::Pycon => "pycon",
            LanguageId::Python => "python",
            LanguageId::Bash => "bash",
            LanguageId::Rust => "rust",
            LanguageId::Json => "json",
        }
    }

    /// Get display name for the language
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageId::Css => "CSS",
            LanguageId::Django => "Django template",
            LanguageId::Html => "HTML",
            LanguageId::JavaScript => "JavaScript",
            LanguageId::Pycon => "Python console",
            LanguageId::Python => "Python",
            LanguageId::Bash => "Bash",
            LanguageId::Rust => "Rust",
            LanguageId::Json => "JSON",
        }
    }
}

/// The ordered set of languages eligible for highlighting.
///
/// Built once at startup from configuration and immutable afterwards.
/// Order matters: auto-detection breaks ties by allow-list position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    languages: Vec<LanguageId>,
}

impl AllowList {
    /// Mirror of the original deployment's language set
    pub const DEFAULT: &'static [&'static str] =
        &["css", "django", "js", "html", "pycon", "python"];

    /// Resolve identifier strings into an allow-list.
    ///
    /// Fails on the first identifier that doesn't match a known grammar, so
    /// a config typo surfaces at startup rather than as silently-skipped
    /// blocks.
    pub fn parse(identifiers: &[String]) -> Result<Self> {
        let mut languages = Vec::with_capacity(identifiers.len());
        for ident in identifiers {
            let Some(lang) = LanguageId::from_token(ident) else {
                let known: Vec<&str> = ALL_LANGUAGES.iter().map(|l| l.name()).collect();
                bail!(
                    "Unknown language identifier in allow-list: {:?} (known: {})",
                    ident,
                    known.join(", ")
                );
            };
            if !languages.contains(&lang) {
                languages.push(lang);
            }
        }
        Ok(Self { languages })
    }

    pub fn contains(&self, lang: LanguageId) -> bool {
        self.languages.contains(&lang)
    }

    /// Languages in configured order (detection tie-break order)
    pub fn iter(&self) -> impl Iterator<Item = LanguageId> + '_ {
        self.languages.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        let idents: Vec<String> = Self::DEFAULT.iter().map(|s| s.to_string()).collect();
        // DEFAULT only holds known identifiers
        Self::parse(&idents).unwrap_or(Self { languages: vec![] })
    }
}
