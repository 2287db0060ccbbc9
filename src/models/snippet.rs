use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single saved piece of code or markdown owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: Uuid,
    pub user_id: String,
    /// `None` means unfiled; unfiled snippets are listed on the home view.
    #[serde(default)]
    pub collection_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub language: SnippetLanguage,
    pub is_public: bool,
    pub is_favorite: bool,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub fork_count: u32,
    #[serde(default)]
    pub forked_from: Option<Uuid>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SnippetLanguage {
    Rust,
    JavaScript,
    TypeScript,
    Python,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    PHP,
    Ruby,
    Swift,
    Kotlin,
    Dart,
    HTML,
    CSS,
    SCSS,
    SQL,
    Bash,
    PowerShell,
    Yaml,
    Json,
    Xml,
    Markdown,
    Dockerfile,
    Toml,
    Ini,
    #[default]
    Text,
    Other(String),
}

impl SnippetLanguage {
    /// Every built-in language, in picker order.
    pub const ALL: [SnippetLanguage; 28] = [
        SnippetLanguage::Rust,
        SnippetLanguage::JavaScript,
        SnippetLanguage::TypeScript,
        SnippetLanguage::Python,
        SnippetLanguage::Go,
        SnippetLanguage::Java,
        SnippetLanguage::C,
        SnippetLanguage::Cpp,
        SnippetLanguage::CSharp,
        SnippetLanguage::PHP,
        SnippetLanguage::Ruby,
        SnippetLanguage::Swift,
        SnippetLanguage::Kotlin,
        SnippetLanguage::Dart,
        SnippetLanguage::HTML,
        SnippetLanguage::CSS,
        SnippetLanguage::SCSS,
        SnippetLanguage::SQL,
        SnippetLanguage::Bash,
        SnippetLanguage::PowerShell,
        SnippetLanguage::Yaml,
        SnippetLanguage::Json,
        SnippetLanguage::Xml,
        SnippetLanguage::Markdown,
        SnippetLanguage::Dockerfile,
        SnippetLanguage::Toml,
        SnippetLanguage::Ini,
        SnippetLanguage::Text,
    ];

    /// Stable identifier used on the wire and in the store file
    pub fn id(&self) -> &str {
        match self {
            SnippetLanguage::Rust => "rust",
            SnippetLanguage::JavaScript => "javascript",
            SnippetLanguage::TypeScript => "typescript",
            SnippetLanguage::Python => "python",
            SnippetLanguage::Go => "go",
            SnippetLanguage::Java => "java",
            SnippetLanguage::C => "c",
            SnippetLanguage::Cpp => "cpp",
            SnippetLanguage::CSharp => "csharp",
            SnippetLanguage::PHP => "php",
            SnippetLanguage::Ruby => "ruby",
            SnippetLanguage::Swift => "swift",
            SnippetLanguage::Kotlin => "kotlin",
            SnippetLanguage::Dart => "dart",
            SnippetLanguage::HTML => "html",
            SnippetLanguage::CSS => "css",
            SnippetLanguage::SCSS => "scss",
            SnippetLanguage::SQL => "sql",
            SnippetLanguage::Bash => "bash",
            SnippetLanguage::PowerShell => "powershell",
            SnippetLanguage::Yaml => "yaml",
            SnippetLanguage::Json => "json",
            SnippetLanguage::Xml => "xml",
            SnippetLanguage::Markdown => "markdown",
            SnippetLanguage::Dockerfile => "dockerfile",
            SnippetLanguage::Toml => "toml",
            SnippetLanguage::Ini => "ini",
            SnippetLanguage::Text => "text",
            SnippetLanguage::Other(name) => name,
        }
    }

    /// Get file extension for the language
    pub fn file_extension(&self) -> &str {
        match self {
            SnippetLanguage::Rust => "rs",
            SnippetLanguage::JavaScript => "js",
            SnippetLanguage::TypeScript => "ts",
            SnippetLanguage::Python => "py",
            SnippetLanguage::Go => "go",
            SnippetLanguage::Java => "java",
            SnippetLanguage::C => "c",
            SnippetLanguage::Cpp => "cpp",
            SnippetLanguage::CSharp => "cs",
            SnippetLanguage::PHP => "php",
            SnippetLanguage::Ruby => "rb",
            SnippetLanguage::Swift => "swift",
            SnippetLanguage::Kotlin => "kt",
            SnippetLanguage::Dart => "dart",
            SnippetLanguage::HTML => "html",
            SnippetLanguage::CSS => "css",
            SnippetLanguage::SCSS => "scss",
            SnippetLanguage::SQL => "sql",
            SnippetLanguage::Bash => "sh",
            SnippetLanguage::PowerShell => "ps1",
            SnippetLanguage::Yaml => "yaml",
            SnippetLanguage::Json => "json",
            SnippetLanguage::Xml => "xml",
            SnippetLanguage::Markdown => "md",
            SnippetLanguage::Dockerfile => "dockerfile",
            SnippetLanguage::Toml => "toml",
            SnippetLanguage::Ini => "ini",
            SnippetLanguage::Text => "txt",
            SnippetLanguage::Other(_) => "txt",
        }
    }

    /// Resolves a language from an identifier, display name or file extension.
    /// Anything unrecognized is kept verbatim as `Other`.
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        match trimmed.to_lowercase().as_str() {
            "rust" | "rs" => SnippetLanguage::Rust,
            "javascript" | "js" | "jsx" | "mjs" => SnippetLanguage::JavaScript,
            "typescript" | "ts" | "tsx" => SnippetLanguage::TypeScript,
            "python" | "py" => SnippetLanguage::Python,
            "go" | "golang" => SnippetLanguage::Go,
            "java" => SnippetLanguage::Java,
            "c" | "h" => SnippetLanguage::C,
            "cpp" | "c++" | "cc" | "cxx" | "hpp" => SnippetLanguage::Cpp,
            "csharp" | "c#" | "cs" => SnippetLanguage::CSharp,
            "php" => SnippetLanguage::PHP,
            "ruby" | "rb" => SnippetLanguage::Ruby,
            "swift" => SnippetLanguage::Swift,
            "kotlin" | "kt" => SnippetLanguage::Kotlin,
            "dart" => SnippetLanguage::Dart,
            "html" | "htm" => SnippetLanguage::HTML,
            "css" => SnippetLanguage::CSS,
            "scss" | "sass" => SnippetLanguage::SCSS,
            "sql" => SnippetLanguage::SQL,
            "bash" | "sh" | "shell" | "zsh" => SnippetLanguage::Bash,
            "powershell" | "ps1" => SnippetLanguage::PowerShell,
            "yaml" | "yml" => SnippetLanguage::Yaml,
            "json" => SnippetLanguage::Json,
            "xml" => SnippetLanguage::Xml,
            "markdown" | "md" => SnippetLanguage::Markdown,
            "dockerfile" | "docker" => SnippetLanguage::Dockerfile,
            "toml" => SnippetLanguage::Toml,
            "ini" | "conf" | "config" => SnippetLanguage::Ini,
            "" | "text" | "txt" | "plaintext" => SnippetLanguage::Text,
            _ => SnippetLanguage::Other(trimmed.to_string()),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            SnippetLanguage::Rust => "Rust",
            SnippetLanguage::JavaScript => "JavaScript",
            SnippetLanguage::TypeScript => "TypeScript",
            SnippetLanguage::Python => "Python",
            SnippetLanguage::Go => "Go",
            SnippetLanguage::Java => "Java",
            SnippetLanguage::C => "C",
            SnippetLanguage::Cpp => "C++",
            SnippetLanguage::CSharp => "C#",
            SnippetLanguage::PHP => "PHP",
            SnippetLanguage::Ruby => "Ruby",
            SnippetLanguage::Swift => "Swift",
            SnippetLanguage::Kotlin => "Kotlin",
            SnippetLanguage::Dart => "Dart",
            SnippetLanguage::HTML => "HTML",
            SnippetLanguage::CSS => "CSS",
            SnippetLanguage::SCSS => "SCSS",
            SnippetLanguage::SQL => "SQL",
            SnippetLanguage::Bash => "Bash",
            SnippetLanguage::PowerShell => "PowerShell",
            SnippetLanguage::Yaml => "YAML",
            SnippetLanguage::Json => "JSON",
            SnippetLanguage::Xml => "XML",
            SnippetLanguage::Markdown => "Markdown",
            SnippetLanguage::Dockerfile => "Dockerfile",
            SnippetLanguage::Toml => "TOML",
            SnippetLanguage::Ini => "INI",
            SnippetLanguage::Text => "Text",
            SnippetLanguage::Other(name) => name,
        }
    }

    /// Get short name for the language
    pub fn short_name(&self) -> &str {
        match self {
            SnippetLanguage::JavaScript => "JS",
            SnippetLanguage::TypeScript => "TS",
            SnippetLanguage::Python => "Py",
            SnippetLanguage::PowerShell => "PS",
            SnippetLanguage::Markdown => "MD",
            SnippetLanguage::Dockerfile => "Docker",
            other => other.display_name(),
        }
    }
}

impl From<String> for SnippetLanguage {
    fn from(value: String) -> Self {
        SnippetLanguage::from_name(&value)
    }
}

impl From<SnippetLanguage> for String {
    fn from(value: SnippetLanguage) -> Self {
        value.id().to_string()
    }
}

impl fmt::Display for SnippetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Input for creating a snippet. Identity, owner, fork count and timestamps
/// are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSnippet {
    pub title: String,
    pub content: String,
    pub language: SnippetLanguage,
    pub collection_id: Option<Uuid>,
    pub is_public: bool,
    pub is_favorite: bool,
    pub position: i64,
    pub forked_from: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

impl NewSnippet {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        language: SnippetLanguage,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            language,
            ..Self::default()
        }
    }

    pub fn in_collection(mut self, collection_id: Uuid) -> Self {
        self.collection_id = Some(collection_id);
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }
}

/// Partial update merged into an existing snippet.
///
/// `collection_id` is doubly optional: `None` leaves the filing untouched,
/// `Some(None)` moves the snippet back to the unfiled set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub language: Option<SnippetLanguage>,
    pub collection_id: Option<Option<Uuid>>,
    pub is_public: Option<bool>,
    pub is_favorite: Option<bool>,
    pub position: Option<i64>,
    pub tag_ids: Option<Vec<Uuid>>,
}

impl SnippetPatch {
    pub fn favorite(is_favorite: bool) -> Self {
        Self {
            is_favorite: Some(is_favorite),
            ..Self::default()
        }
    }

    pub fn public(is_public: bool) -> Self {
        Self {
            is_public: Some(is_public),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn file_into(collection_id: Option<Uuid>) -> Self {
        Self {
            collection_id: Some(collection_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Snippet {
    pub(crate) fn create(user_id: &str, data: NewSnippet) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            collection_id: data.collection_id,
            title: data.title,
            content: data.content,
            language: data.language,
            is_public: data.is_public,
            is_favorite: data.is_favorite,
            position: data.position,
            fork_count: 0,
            forked_from: data.forked_from,
            tag_ids: data.tag_ids,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `patch` into this snippet and bumps `updated_at`.
    pub fn apply(&mut self, patch: SnippetPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(language) = patch.language {
            self.language = language;
        }
        if let Some(collection_id) = patch.collection_id {
            self.collection_id = collection_id;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(is_favorite) = patch.is_favorite {
            self.is_favorite = is_favorite;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(tag_ids) = patch.tag_ids {
            self.tag_ids = tag_ids;
        }
        self.updated_at = Utc::now();
    }

    pub fn is_fork(&self) -> bool {
        self.forked_from.is_some()
    }

    pub fn is_unfiled(&self) -> bool {
        self.collection_id.is_none()
    }

    /// File name used when the content is handed to an external editor
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.language.file_extension())
    }

    pub fn get_line_count(&self) -> usize {
        self.content.lines().count()
    }

    pub fn get_preview(&self, max_lines: usize) -> String {
        self.content
            .lines()
            .take(max_lines)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_resolves_extensions_and_names() {
        assert_eq!(SnippetLanguage::from_name("js"), SnippetLanguage::JavaScript);
        assert_eq!(SnippetLanguage::from_name("TypeScript"), SnippetLanguage::TypeScript);
        assert_eq!(SnippetLanguage::from_name("yml"), SnippetLanguage::Yaml);
        assert_eq!(
            SnippetLanguage::from_name("zig"),
            SnippetLanguage::Other("zig".to_string())
        );
    }

    #[test]
    fn language_serializes_as_plain_string() {
        let json = serde_json::to_string(&SnippetLanguage::Cpp).unwrap();
        assert_eq!(json, "\"cpp\"");

        let parsed: SnippetLanguage = serde_json::from_str("\"py\"").unwrap();
        assert_eq!(parsed, SnippetLanguage::Python);
    }

    #[test]
    fn patch_clears_collection_and_bumps_timestamp() {
        let mut snippet = Snippet::create(
            "guest",
            NewSnippet::new("x", "y", SnippetLanguage::Rust).in_collection(Uuid::new_v4()),
        );
        let before = snippet.updated_at;

        snippet.apply(SnippetPatch::file_into(None));

        assert!(snippet.is_unfiled());
        assert!(snippet.updated_at >= before);
        assert_eq!(snippet.title, "x");
    }

    #[test]
    fn preview_limits_lines() {
        let snippet = Snippet::create(
            "guest",
            NewSnippet::new("t", "a\nb\nc\nd", SnippetLanguage::Text),
        );
        assert_eq!(snippet.get_preview(2), "a\nb");
        assert_eq!(snippet.get_line_count(), 4);
    }
}
