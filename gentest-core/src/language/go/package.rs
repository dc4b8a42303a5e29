//! Files of one Go package

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ResolvedConfig;
use crate::error::{GentestError, Result};
use crate::language::go::parser::{GoParser, GoSource};

/// The parsed files of one package. The first file is the one the user
/// pointed at; offsets without a marker are interpreted in it.
pub struct GoPackage {
    files: Vec<GoSource>,
}

impl GoPackage {
    /// Build a package from in-memory `(filename, source)` pairs
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self> {
        let mut parser = GoParser::new()?;
        let files = sources
            .iter()
            .map(|(name, source)| parser.parse(source, name))
            .collect::<Result<Vec<_>>>()?;
        Self::from_files(files)
    }

    fn from_files(files: Vec<GoSource>) -> Result<Self> {
        if files.is_empty() {
            return Err(GentestError::Parse {
                file: "<package>".to_string(),
                message: "a package needs at least one file".to_string(),
            });
        }
        Ok(GoPackage { files })
    }

    /// Load `path` plus every sibling `.go` file that declares the same
    /// package and is not excluded by the config. Siblings are read in
    /// file name order.
    pub fn load(path: &Path, config: &ResolvedConfig) -> Result<Self> {
        let mut parser = GoParser::new()?;
        let target = parse_file(&mut parser, path)?;
        let package_name = target.package_name().map(str::to_string);

        let mut files = vec![target];
        for sibling in sibling_go_files(path)? {
            if !config.should_include(&sibling) {
                debug!(file = %sibling.display(), "excluded by config");
                continue;
            }
            let file = parse_file(&mut parser, &sibling)?;
            if file.package_name() != package_name.as_deref() {
                debug!(file = %sibling.display(), "different package clause, skipping");
                continue;
            }
            files.push(file);
        }

        debug!(files = files.len(), package = ?package_name, "loaded package");
        Self::from_files(files)
    }

    pub fn files(&self) -> &[GoSource] {
        &self.files
    }

    pub fn file(&self, index: usize) -> Option<&GoSource> {
        self.files.get(index)
    }

    pub fn primary(&self) -> &GoSource {
        &self.files[0]
    }

    /// Package name declared by the primary file
    pub fn name(&self) -> Option<&str> {
        self.primary().package_name()
    }
}

fn parse_file(parser: &mut GoParser, path: &Path) -> Result<GoSource> {
    let source = std::fs::read_to_string(path)?;
    parser.parse(&source, &path.to_string_lossy())
}

fn sibling_go_files(path: &Path) -> Result<Vec<PathBuf>> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let target_name = path.file_name();

    let mut siblings = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let candidate = entry.path();
        if !entry.file_type()?.is_file() || candidate.file_name() == target_name {
            continue;
        }
        if candidate.extension().and_then(|e| e.to_str()) == Some("go") {
            siblings.push(candidate);
        }
    }

    // Sort files for deterministic order
    siblings.sort();
    Ok(siblings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_sources_keeps_order() {
        let pkg = GoPackage::from_sources(&[
            ("a.go", "package a\n\nfunc A() {}\n"),
            ("b.go", "package a\n\nfunc B() {}\n"),
        ])
        .unwrap();
        assert_eq!(pkg.files().len(), 2);
        assert_eq!(pkg.primary().path(), "a.go");
        assert_eq!(pkg.name(), Some("a"));
        assert!(pkg.file(2).is_none());
    }

    #[test]
    fn test_from_sources_rejects_empty_package() {
        assert!(GoPackage::from_sources(&[]).is_err());
    }

    #[test]
    fn test_load_collects_same_package_siblings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.go"), "package shop\n\nfunc Buy() {}\n").unwrap();
        fs::write(dir.path().join("types.go"), "package shop\n\ntype Cart struct{}\n").unwrap();
        fs::write(dir.path().join("main_test.go"), "package shop\n\nfunc TestBuy() {}\n").unwrap();
        fs::write(dir.path().join("other.go"), "package other\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "package shop\n").unwrap();

        let config = ResolvedConfig::defaults().unwrap();
        let pkg = GoPackage::load(&dir.path().join("main.go"), &config).unwrap();

        let paths: Vec<&str> = pkg.files().iter().map(|f| f.path()).collect();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("main.go"));
        assert!(paths[1].ends_with("types.go"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResolvedConfig::defaults().unwrap();
        let err = GoPackage::load(&dir.path().join("missing.go"), &config).err().unwrap();
        assert!(matches!(err, GentestError::Io(_)));
    }
}
