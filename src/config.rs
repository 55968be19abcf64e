//! TOML configuration.
//!
//! Every section is optional. Running `clnav` without a config file is the
//! same as running it with an empty one.

use anyhow::{Context, Result};
use clause_nav_core::CoordinateOrigin;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScanConfig {
    /// Overrides the vertical axis convention the extractor declares for
    /// itself. Leave unset unless a document source is known to disagree.
    #[serde(default)]
    pub coordinate_origin: Option<CoordinateOrigin>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_prefetch_concurrency")]
    pub prefetch_concurrency: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            prefetch_concurrency: default_prefetch_concurrency(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}
fn default_prefetch_concurrency() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.pdf".to_string(), "**/*.txt".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct NavigationConfig {
    /// Page numbering of the rendering surface: 0 or 1.
    #[serde(default = "default_page_base")]
    pub page_base: u32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            page_base: default_page_base(),
        }
    }
}

fn default_page_base() -> u32 {
    1
}

impl NavigationConfig {
    /// Convert a 1-based page number to the surface's numbering.
    pub fn surface_page(&self, page: u32) -> u32 {
        page.saturating_sub(1) + self.page_base
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.extract.max_file_bytes == 0 {
        anyhow::bail!("extract.max_file_bytes must be > 0");
    }

    if config.extract.prefetch_concurrency == 0 {
        anyhow::bail!("extract.prefetch_concurrency must be >= 1");
    }

    if config.navigation.page_base > 1 {
        anyhow::bail!(
            "navigation.page_base must be 0 or 1, got {}",
            config.navigation.page_base
        );
    }

    if config.sources.include_globs.is_empty() {
        anyhow::bail!("sources.include_globs must not be empty");
    }

    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.scan.coordinate_origin, None);
        assert_eq!(config.extract.prefetch_concurrency, 4);
        assert_eq!(config.navigation.page_base, 1);
        assert_eq!(config.sources.include_globs.len(), 2);
    }

    #[test]
    fn parses_top_down_origin_and_zero_base() {
        let config = parse_config(
            r#"
[scan]
coordinate_origin = "top-down"

[navigation]
page_base = 0
"#,
        )
        .unwrap();
        assert_eq!(config.scan.coordinate_origin, Some(CoordinateOrigin::TopDown));
        assert_eq!(config.navigation.surface_page(2), 1);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(parse_config("[extract]\nprefetch_concurrency = 0").is_err());
        assert!(parse_config("[extract]\nmax_file_bytes = 0").is_err());
        assert!(parse_config("[navigation]\npage_base = 2").is_err());
        assert!(parse_config("[scan]\ncoordinate_origin = \"sideways\"").is_err());
    }
}
