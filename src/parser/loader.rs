//! File and directory loading.
//!
//! A directory is parsed as one buffer: every matching file is read, each
//! preceded by a newline, and concatenated in file-name order. The
//! [`SourceSet`] remembers where each file starts so parse errors can be
//! reported against the file, line and column they came from.

use crate::config::Config;
use crate::error::{Result, TfModScanError};
use crate::parser::SKIP_FILES;
use crate::types::Configuration;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A position inside one of the files of a [`SourceSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File the offset falls into
    pub file: PathBuf,
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

/// The concatenated contents of one root.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    /// The path the set was loaded from
    pub root: PathBuf,
    text: String,
    /// (offset of the file's first byte in `text`, file path)
    segments: Vec<(usize, PathBuf)>,
}

impl SourceSet {
    /// Create an empty set for `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Append one file's contents, preceded by a newline separator.
    pub fn push(&mut self, file: impl Into<PathBuf>, contents: &str) {
        self.text.push('\n');
        self.segments.push((self.text.len(), file.into()));
        self.text.push_str(contents);
    }

    /// The concatenated buffer.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Files in concatenation order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.segments.iter().map(|(_, path)| path.as_path())
    }

    /// Map a byte offset of [`text`](Self::text) back to a file position.
    #[must_use]
    pub fn locate(&self, offset: usize) -> Option<Location> {
        let index = self.segments.partition_point(|(start, _)| *start <= offset);
        let (start, file) = self.segments.get(index.checked_sub(1)?)?;
        let before = self.text.get(*start..offset)?;
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |pos| pos + 1);
        let column = before[line_start..].chars().count() + 1;
        Some(Location {
            file: file.clone(),
            line,
            column,
        })
    }

    /// Parse the buffer, attaching file positions to any error.
    ///
    /// # Errors
    ///
    /// Returns `TfModScanError::Parse` wrapping the core error.
    pub fn parse(&self) -> Result<Configuration> {
        crate::parser::parse(&self.text).map_err(|source| {
            let location = source.offset().and_then(|offset| self.locate(offset));
            let (file, line, column) = match location {
                Some(loc) => (loc.file, Some(loc.line), Some(loc.column)),
                None => (self.root.clone(), None, None),
            };
            crate::err!(Parse {
                file: file,
                line: line,
                column: column,
                source: source,
            })
        })
    }
}

/// Terraform parser over files and directories.
pub struct TfParser {
    /// Configuration for loading behavior
    config: Config,
}

impl TfParser {
    /// Create a new parser with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Parse a single Terraform file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn parse_file(&self, path: &Path) -> Result<Configuration> {
        self.load_file(path).await?.parse()
    }

    /// Parse all Terraform files of a directory as one configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory doesn't exist, a file cannot be
    /// read, or the concatenated text fails to parse.
    pub async fn parse_directory(&self, path: &Path) -> Result<Configuration> {
        self.load_directory(path).await?.parse()
    }

    /// Load a root: a file is read as is, a directory is concatenated.
    ///
    /// # Errors
    ///
    /// Returns an error if the path doesn't exist or cannot be read.
    pub async fn load(&self, path: &Path) -> Result<SourceSet> {
        if path.is_dir() {
            self.load_directory(path).await
        } else {
            self.load_file(path).await
        }
    }

    /// Read one file into a [`SourceSet`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn load_file(&self, path: &Path) -> Result<SourceSet> {
        if !path.exists() {
            return Err(crate::err!(FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        tracing::debug!(file = %path.display(), "Reading file");
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TfModScanError::io(path, e, file!(), line!()))?;

        let mut set = SourceSet::new(path);
        set.push(path, &content);
        Ok(set)
    }

    /// Read every matching file directly inside `path` into a [`SourceSet`].
    ///
    /// Subdirectories are not descended into: each directory is its own
    /// Terraform root.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory doesn't exist or a file cannot be read.
    pub async fn load_directory(&self, path: &Path) -> Result<SourceSet> {
        if !path.is_dir() {
            return Err(crate::err!(DirectoryNotFound {
                path: path.to_path_buf(),
            }));
        }

        let mut set = SourceSet::new(path);
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.should_skip(e.path()))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read directory entry");
                    continue;
                }
            };

            let file_path = entry.path();
            if !entry.file_type().is_file() || !self.is_terraform_file(file_path) {
                continue;
            }

            tracing::debug!(file = %file_path.display(), "Reading file");
            let content = tokio::fs::read_to_string(file_path)
                .await
                .map_err(|e| TfModScanError::io(file_path, e, file!(), line!()))?;
            set.push(file_path, &content);
        }

        tracing::info!(
            path = %path.display(),
            files = set.segments.len(),
            bytes = set.text.len(),
            "Directory loaded"
        );

        Ok(set)
    }

    /// Check if a path should be skipped.
    fn should_skip(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if file_name.starts_with('.') {
            tracing::debug!(path = %path.display(), reason = "hidden file/directory", "Skipping path");
            return true;
        }

        if SKIP_FILES.iter().any(|s| file_name == *s) {
            tracing::debug!(path = %path.display(), reason = "known skip file", "Skipping path");
            return true;
        }

        if self.config.scan.exclude_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(file_name))
                .unwrap_or(false)
        }) {
            tracing::debug!(path = %path.display(), reason = "matches exclude pattern", "Skipping path");
            return true;
        }

        false
    }

    /// Check if a file has the configured Terraform extension.
    fn is_terraform_file(&self, path: &Path) -> bool {
        path.to_string_lossy().ends_with(&self.config.scan.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use std::fs;

    fn create_test_parser() -> TfParser {
        TfParser::new(&Config::default())
    }

    #[test]
    fn test_push_prefixes_newline() {
        let mut set = SourceSet::new("dir");
        set.push("a.tf", "x");
        set.push("b.tf", "y");
        assert_eq!(set.text(), "\nx\ny");
        assert_eq!(set.files().collect::<Vec<_>>(), [Path::new("a.tf"), Path::new("b.tf")]);
    }

    #[test]
    fn test_locate_maps_to_file() {
        let mut set = SourceSet::new("dir");
        set.push("a.tf", "module \"a\" {\n}\n");
        set.push("b.tf", "# header\n  héllo");

        let offset = set.text().find("héllo").unwrap();
        let loc = set.locate(offset).unwrap();
        assert_eq!(loc, Location { file: PathBuf::from("b.tf"), line: 2, column: 3 });

        let loc = set.locate(set.text().find('}').unwrap()).unwrap();
        assert_eq!(loc.file, PathBuf::from("a.tf"));
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 1);

        assert_eq!(set.locate(0), None);
    }

    #[test]
    fn test_parse_error_points_at_file() {
        let mut set = SourceSet::new("dir");
        set.push("a.tf", "module \"a\" {\n}\n");
        set.push("b.tf", "module \"b\" {\n  source \"./b\"\n}\n");

        let err = set.parse().unwrap_err();
        match err {
            TfModScanError::Parse { file, line, column, source, .. } => {
                assert_eq!(file, PathBuf::from("b.tf"));
                assert_eq!(line, Some(2));
                assert_eq!(column, Some(10));
                assert!(matches!(source, ParseError::UnexpectedToken { .. }));
            }
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_without_offset_points_at_root() {
        let mut set = SourceSet::new("dir");
        set.push("a.tf", "module \"a\" {");
        let err = set.parse().unwrap_err();
        assert!(matches!(err, TfModScanError::Parse { ref file, line: None, .. } if file == Path::new("dir")));
    }

    #[test]
    fn test_is_terraform_file() {
        let parser = create_test_parser();
        assert!(parser.is_terraform_file(Path::new("main.tf")));
        assert!(parser.is_terraform_file(Path::new("variables.tf")));
        assert!(!parser.is_terraform_file(Path::new("config.tf.json")));
        assert!(!parser.is_terraform_file(Path::new("readme.md")));
    }

    #[test]
    fn test_should_skip() {
        let parser = create_test_parser();
        assert!(parser.should_skip(Path::new(".terraform")));
        assert!(parser.should_skip(Path::new(".git")));
        assert!(parser.should_skip(Path::new("terraform.tfstate")));
        assert!(!parser.should_skip(Path::new("main.tf")));
    }

    #[test]
    fn test_should_skip_exclude_pattern() {
        let mut config = Config::default();
        config.scan.exclude_patterns.push("*_override.tf".to_string());
        let parser = TfParser::new(&config);
        assert!(parser.should_skip(Path::new("dev_override.tf")));
        assert!(!parser.should_skip(Path::new("main.tf")));
    }

    #[tokio::test]
    async fn test_load_directory_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.tf"), "module \"b\" {\n}\n").unwrap();
        fs::write(dir.path().join("a.tf"), "module \"a\" {\n}\n").unwrap();
        fs::write(dir.path().join("notes.md"), "module \"md\" {\n}\n").unwrap();
        fs::write(dir.path().join(".hidden.tf"), "module \"hidden\" {\n}\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.tf"), "module \"c\" {\n}\n").unwrap();

        let parser = create_test_parser();
        let set = parser.load_directory(dir.path()).await.unwrap();
        let names: Vec<_> = set
            .files()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.tf", "b.tf"]);

        let config = set.parse().unwrap();
        assert_eq!(config.modules.keys().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.tf");
        fs::write(&file, "module \"m\" {\n  source = \"./m\"\n}\n").unwrap();

        let config = create_test_parser().parse_file(&file).await.unwrap();
        assert_eq!(config.module("m").unwrap().source_path, "./m");
    }

    #[tokio::test]
    async fn test_missing_paths() {
        let parser = create_test_parser();
        let missing = Path::new("/definitely/not/here");
        assert!(matches!(
            parser.parse_directory(missing).await,
            Err(TfModScanError::DirectoryNotFound { .. })
        ));
        assert!(matches!(
            parser.parse_file(missing).await,
            Err(TfModScanError::FileNotFound { .. })
        ));
    }
}
