//! Configuration file support for gentest
//!
//! Loads per-package configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.gentestrc.json` in the target file's directory
//! 3. `gentest.config.json` in the target file's directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::locate::{Locator, MatchMode};
use crate::naming::{NameStyle, NamingOptions, DEFAULT_RESULT_PREFIX};

/// Default exclude patterns applied when no config is specified
const DEFAULT_EXCLUDES: &[&str] = &["**/*_test.go"];

/// Gentest configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GentestConfig {
    /// Emit `t.Parallel()` and `t.Cleanup` markers (default: false)
    #[serde(default)]
    pub parallel: Option<bool>,

    /// Span an offset must fall into (default: name)
    #[serde(default)]
    pub match_mode: Option<MatchMode>,

    /// Prefix for result variable names (default: "got")
    #[serde(default)]
    pub result_prefix: Option<String>,

    /// How prefixes join synthesized names (default: verbatim)
    #[serde(default)]
    pub name_style: Option<NameStyle>,

    /// Glob patterns for sibling files left out of the package (default: test files)
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    pub parallel: bool,
    pub match_mode: MatchMode,
    pub naming: NamingOptions,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    /// Exclude patterns as written, defaults included
    pub exclude_patterns: Vec<String>,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

/// Everything one generation run reads, fixed before the run starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub locator: Locator,
    pub match_mode: MatchMode,
    pub parallel: bool,
    pub naming: NamingOptions,
}

impl RunConfig {
    /// Defaults for everything but the locator
    pub fn new(locator: Locator) -> Self {
        RunConfig {
            locator,
            match_mode: MatchMode::default(),
            parallel: false,
            naming: NamingOptions::default(),
        }
    }
}

impl GentestConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(prefix) = &self.result_prefix {
            if !prefix.is_empty() && !is_go_identifier(prefix) {
                anyhow::bail!(
                    "result_prefix must be empty or a Go identifier, got {:?}",
                    prefix
                );
            }
        }

        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        // Compile exclude patterns (defaults when the user didn't specify any)
        let exclude_patterns: Vec<String> = if self.exclude.is_empty() {
            DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect()
        } else {
            self.exclude.clone()
        };
        let exclude = {
            let mut builder = GlobSetBuilder::new();
            for pattern in &exclude_patterns {
                builder.add(Glob::new(pattern)?);
            }
            builder.build()?
        };

        Ok(ResolvedConfig {
            parallel: self.parallel.unwrap_or(false),
            match_mode: self.match_mode.unwrap_or_default(),
            naming: NamingOptions {
                result_prefix: self
                    .result_prefix
                    .clone()
                    .unwrap_or_else(|| DEFAULT_RESULT_PREFIX.to_string()),
                style: self.name_style.unwrap_or_default(),
            },
            exclude,
            exclude_patterns,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Check if a sibling file should be loaded into the package
    pub fn should_include(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        !self.exclude.is_match(path_str.as_ref())
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        GentestConfig::default().resolve()
    }

    /// Per-run configuration seeded from the file values
    pub fn run_config(&self, locator: Locator) -> RunConfig {
        RunConfig {
            locator,
            match_mode: self.match_mode,
            parallel: self.parallel,
            naming: self.naming.clone(),
        }
    }
}

fn is_go_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}

/// Discover and load a config file from a directory
///
/// Search order:
/// 1. `.gentestrc.json`
/// 2. `gentest.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(dir: &Path) -> Result<Option<(GentestConfig, PathBuf)>> {
    for name in [".gentestrc.json", "gentest.config.json"] {
        let path = dir.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<GentestConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: GentestConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a target directory
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config in `dir`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(dir: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(dir)? {
            Some((config, path)) => (config, Some(path)),
            None => (GentestConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = GentestConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert!(!resolved.parallel);
        assert_eq!(resolved.match_mode, MatchMode::Name);
        assert_eq!(resolved.naming.result_prefix, "got");
        assert_eq!(resolved.naming.style, NameStyle::Verbatim);
        assert_eq!(resolved.exclude_patterns, vec!["**/*_test.go".to_string()]);
        assert!(resolved.config_path.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "parallel": true,
            "match_mode": "body",
            "result_prefix": "actual",
            "name_style": "camel_case",
            "exclude": ["**/gen_*.go"]
        }"#;
        let config: GentestConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert!(resolved.parallel);
        assert_eq!(resolved.match_mode, MatchMode::Body);
        assert_eq!(resolved.naming.result_prefix, "actual");
        assert_eq!(resolved.naming.style, NameStyle::CamelCase);
        assert!(!resolved.should_include(Path::new("pkg/gen_models.go")));
        // custom excludes replace the defaults
        assert!(resolved.should_include(Path::new("pkg/models_test.go")));
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"offset": 10}"#;
        let result: std::result::Result<GentestConfig, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_reject_invalid_prefix() {
        let json = r#"{"result_prefix": "9lives"}"#;
        let config: GentestConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());

        let json = r#"{"result_prefix": ""}"#;
        let config: GentestConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reject_invalid_glob_pattern() {
        let json = r#"{"exclude": ["[invalid"]}"#;
        let config: GentestConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_include_default_excludes() {
        let resolved = ResolvedConfig::defaults().unwrap();
        assert!(!resolved.should_include(Path::new("pkg/foo_test.go")));
        assert!(!resolved.should_include(Path::new("/abs/pkg/foo_test.go")));
        assert!(resolved.should_include(Path::new("pkg/foo.go")));
    }

    #[test]
    fn test_run_config_from_resolved() {
        let config: GentestConfig =
            serde_json::from_str(r#"{"parallel": true, "result_prefix": "out"}"#).unwrap();
        let resolved = config.resolve().unwrap();
        let run = resolved.run_config(Locator::Offset(42));
        assert_eq!(run.locator, Locator::Offset(42));
        assert!(run.parallel);
        assert_eq!(run.naming.result_prefix, "out");

        let plain = RunConfig::new(Locator::Comment("marker".to_string()));
        assert!(!plain.parallel);
        assert_eq!(plain.naming, NamingOptions::default());
    }

    #[test]
    fn test_discover_gentestrc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".gentestrc.json");
        fs::write(&config_path, r#"{"parallel": true}"#).unwrap();

        let result = discover_config(dir.path()).unwrap();
        assert!(result.is_some());
        let (config, path) = result.unwrap();
        assert_eq!(config.parallel, Some(true));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();

        // Create both config files - .gentestrc.json should win
        fs::write(dir.path().join(".gentestrc.json"), r#"{"result_prefix": "a"}"#).unwrap();
        fs::write(
            dir.path().join("gentest.config.json"),
            r#"{"result_prefix": "b"}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.result_prefix.as_deref(),
            Some("a"),
            ".gentestrc.json should take priority"
        );
    }

    #[test]
    fn test_discover_gentest_config_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gentest.config.json"), r#"{"match_mode": "body"}"#).unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.match_mode, Some(MatchMode::Body));
    }

    #[test]
    fn test_no_config_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover_config(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"name_style": "camel_case"}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path)).unwrap();
        assert_eq!(resolved.naming.style, NameStyle::CamelCase);
        assert_eq!(resolved.config_path, Some(config_path));
    }

    #[test]
    fn test_load_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".gentestrc.json");
        fs::write(&config_path, "{not json").unwrap();

        let err = load_and_resolve(dir.path(), None).unwrap_err();
        assert!(format!("{:#}", err).contains(".gentestrc.json"));
    }
}
