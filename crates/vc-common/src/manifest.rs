use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const MANIFEST_FILE: &str = "VC.toml";

/// The parsed VC.toml manifest.
#[derive(Debug, Clone)]
pub struct VcManifest {
    pub project: ProjectSection,
    pub diagnostics: DiagnosticsSection,
    /// The directory containing the VC.toml file.
    pub root_dir: PathBuf,
}

impl VcManifest {
    /// Entry source file, resolved against the manifest directory.
    pub fn entry_path(&self) -> PathBuf {
        self.root_dir.join(&self.project.entry)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    pub entry: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsSection {
    #[serde(default = "default_format")]
    pub format: String,
    /// Maximum number of errors to print; 0 means unlimited.
    #[serde(default)]
    pub max_errors: usize,
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        Self {
            format: default_format(),
            max_errors: 0,
        }
    }
}

impl DiagnosticsSection {
    pub fn format(&self) -> Result<DiagnosticFormat, ManifestError> {
        DiagnosticFormat::from_name(&self.format)
            .ok_or_else(|| ManifestError::InvalidFormat(self.format.clone()))
    }
}

fn default_format() -> String {
    "pretty".to_string()
}

/// How diagnostics are rendered on the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticFormat {
    /// Source excerpts with labels.
    Pretty,
    /// One line per diagnostic.
    Plain,
}

impl DiagnosticFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pretty" => Some(Self::Pretty),
            "plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

/// Raw TOML structure for deserialization.
#[derive(Deserialize)]
struct RawManifest {
    project: ProjectSection,
    #[serde(default)]
    diagnostics: DiagnosticsSection,
}

/// Errors that can occur when loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("no VC.toml found (searched from {0})")]
    NotFound(String),
    #[error("failed to read VC.toml: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid VC.toml: {0}")]
    ParseError(String),
    #[error("invalid VC.toml: [diagnostics] unknown format '{0}' (expected 'pretty' or 'plain')")]
    InvalidFormat(String),
    #[error("invalid VC.toml: [project] entry must not be empty")]
    EmptyEntry,
}

/// Walk up from `start_dir` looking for `VC.toml`.
pub fn find_manifest(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load and validate a VC.toml manifest from a file path.
pub fn load_manifest(path: &Path) -> Result<VcManifest, ManifestError> {
    let content = std::fs::read_to_string(path)?;
    let root_dir = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    parse_manifest(&content, root_dir)
}

/// Parse and validate a VC.toml manifest from a string.
pub fn parse_manifest(content: &str, root_dir: PathBuf) -> Result<VcManifest, ManifestError> {
    let raw: RawManifest =
        toml::from_str(content).map_err(|e| ManifestError::ParseError(e.to_string()))?;

    if raw.project.entry.trim().is_empty() {
        return Err(ManifestError::EmptyEntry);
    }
    raw.diagnostics.format()?;

    Ok(VcManifest {
        project: raw.project,
        diagnostics: raw.diagnostics,
        root_dir,
    })
}

/// Find and load the manifest starting from a directory.
pub fn find_and_load_manifest(start_dir: &Path) -> Result<VcManifest, ManifestError> {
    let manifest_path = find_manifest(start_dir)
        .ok_or_else(|| ManifestError::NotFound(start_dir.display().to_string()))?;
    load_manifest(&manifest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_manifest() {
        let toml = r#"
[project]
name = "demo"
entry = "src/main.vc"
"#;
        let manifest = parse_manifest(toml, PathBuf::from("/work")).unwrap();
        assert_eq!(manifest.project.name, "demo");
        assert_eq!(manifest.entry_path(), PathBuf::from("/work/src/main.vc"));
        assert_eq!(manifest.diagnostics.format().unwrap(), DiagnosticFormat::Pretty);
        assert_eq!(manifest.diagnostics.max_errors, 0);
    }

    #[test]
    fn parse_diagnostics_section() {
        let toml = r#"
[project]
name = "demo"
entry = "main.vc"

[diagnostics]
format = "plain"
max_errors = 10
"#;
        let manifest = parse_manifest(toml, PathBuf::from(".")).unwrap();
        assert_eq!(manifest.diagnostics.format().unwrap(), DiagnosticFormat::Plain);
        assert_eq!(manifest.diagnostics.max_errors, 10);
    }

    #[test]
    fn reject_unknown_format() {
        let toml = r#"
[project]
name = "demo"
entry = "main.vc"

[diagnostics]
format = "json"
"#;
        let err = parse_manifest(toml, PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidFormat(ref f) if f == "json"));
    }

    #[test]
    fn reject_missing_project() {
        let err = parse_manifest("[diagnostics]\nformat = \"plain\"\n", PathBuf::from("."))
            .unwrap_err();
        assert!(matches!(err, ManifestError::ParseError(_)));
    }

    #[test]
    fn reject_empty_entry() {
        let toml = "[project]\nname = \"demo\"\nentry = \"  \"\n";
        let err = parse_manifest(toml, PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, ManifestError::EmptyEntry));
    }

    #[test]
    fn find_manifest_walks_up() {
        let root = std::env::temp_dir().join(format!("vc-manifest-{}", std::process::id()));
        let nested = root.join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            root.join(MANIFEST_FILE),
            "[project]\nname = \"demo\"\nentry = \"main.vc\"\n",
        )
        .unwrap();

        let found = find_manifest(&nested).unwrap();
        assert_eq!(found, root.join(MANIFEST_FILE));
        let manifest = find_and_load_manifest(&nested).unwrap();
        assert_eq!(manifest.root_dir, root);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
