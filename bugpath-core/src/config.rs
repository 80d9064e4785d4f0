//! Configuration file support for bugpath
//!
//! Loads annotation and rendering settings from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.bugpathrc.json` in the working directory
//! 3. `bugpath.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::annotate::{AnnotateOptions, DEFAULT_FIXIT_MARKER};
use crate::highlight::Palette;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const DEFAULT_INDENT_WIDTH: usize = 2;
const MAX_INDENT_WIDTH: usize = 16;
const MAX_PALETTE_LEN: usize = 32;

/// bugpath configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BugpathConfig {
    /// Band colours by call depth, `#rgb` or `#rrggbb` (default: 8 built-in colours)
    #[serde(default)]
    pub palette: Option<Vec<String>>,

    /// Substring marking a step as a fix-it (default: " (fixit)")
    #[serde(default)]
    pub fixit_marker: Option<String>,

    /// Report `Returned allocated memory` with no open call as a mismatch
    #[serde(default)]
    pub strict_allocation_returns: Option<bool>,

    /// Spaces per indentation level in text output (default: 2)
    #[serde(default)]
    pub indent_width: Option<usize>,

    /// Glob patterns for input files to skip when a directory is given
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Resolved configuration with defaults applied and globs compiled
#[derive(Debug)]
pub struct ResolvedConfig {
    pub palette: Palette,
    pub fixit_marker: String,
    pub strict_allocation_returns: bool,
    pub indent_width: usize,
    /// Compiled exclude patterns (None if no excludes)
    pub exclude: Option<GlobSet>,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("colour pattern is valid")
    })
}

/// Check that a colour is a CSS hex colour
pub fn validate_color(color: &str) -> Result<()> {
    if !color_pattern().is_match(color) {
        anyhow::bail!("invalid colour {:?}: expected #rgb or #rrggbb", color);
    }
    Ok(())
}

impl BugpathConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref palette) = self.palette {
            if palette.is_empty() {
                anyhow::bail!("palette must contain at least one colour");
            }
            if palette.len() > MAX_PALETTE_LEN {
                anyhow::bail!(
                    "palette must contain at most {} colours (got {})",
                    MAX_PALETTE_LEN,
                    palette.len()
                );
            }
            for (i, color) in palette.iter().enumerate() {
                validate_color(color).with_context(|| format!("palette[{}]", i))?;
            }
        }

        if let Some(ref marker) = self.fixit_marker {
            if marker.is_empty() {
                anyhow::bail!("fixit_marker must not be empty");
            }
        }

        if let Some(width) = self.indent_width {
            if width == 0 || width > MAX_INDENT_WIDTH {
                anyhow::bail!(
                    "indent_width must be between 1 and {} (got {})",
                    MAX_INDENT_WIDTH,
                    width
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

        let palette = match &self.palette {
            Some(colors) => Palette::new(colors.clone())?,
            None => Palette::default(),
        };

        let exclude = if self.exclude.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.exclude {
                builder.add(Glob::new(pattern)?);
            }
            Some(builder.build()?)
        };

        Ok(ResolvedConfig {
            palette,
            fixit_marker: self
                .fixit_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_FIXIT_MARKER.to_string()),
            strict_allocation_returns: self.strict_allocation_returns.unwrap_or(false),
            indent_width: self.indent_width.unwrap_or(DEFAULT_INDENT_WIDTH),
            exclude,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Check if an input file should be read when walking a directory
    pub fn should_include(&self, path: &Path) -> bool {
        match self.exclude {
            Some(ref exclude) => !exclude.is_match(path.to_string_lossy().as_ref()),
            None => true,
        }
    }

    /// Options for the annotator
    pub fn annotate_options(&self) -> AnnotateOptions {
        AnnotateOptions {
            palette: self.palette.clone(),
            fixit_marker: self.fixit_marker.clone(),
            strict_allocation_returns: self.strict_allocation_returns,
        }
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        BugpathConfig::default().resolve()
    }
}

/// Discover and load a config file from a directory
///
/// Search order:
/// 1. `.bugpathrc.json`
/// 2. `bugpath.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(root: &Path) -> Result<Option<(BugpathConfig, PathBuf)>> {
    for name in [".bugpathrc.json", "bugpath.config.json"] {
        let path = root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<BugpathConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: BugpathConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Command-line values that replace config file values
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub palette: Option<Vec<String>>,
    pub fixit_marker: Option<String>,
    /// Only ever switches strict mode on
    pub strict_allocation_returns: bool,
    pub indent_width: Option<usize>,
}

impl BugpathConfig {
    /// Merge overrides into the file config; `resolve` validates the result
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if overrides.palette.is_some() {
            self.palette = overrides.palette;
        }
        if overrides.fixit_marker.is_some() {
            self.fixit_marker = overrides.fixit_marker;
        }
        if overrides.strict_allocation_returns {
            self.strict_allocation_returns = Some(true);
        }
        if overrides.indent_width.is_some() {
            self.indent_width = overrides.indent_width;
        }
    }
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config in `root`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    load_and_resolve_with_overrides(root, config_path, ConfigOverrides::default())
}

/// Load config, apply CLI overrides, then validate and resolve the merge
pub fn load_and_resolve_with_overrides(
    root: &Path,
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<ResolvedConfig> {
    let (mut config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(root)? {
            Some((config, path)) => (config, Some(path)),
            None => (BugpathConfig::default(), None),
        }
    };

    config.apply_overrides(overrides);

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
