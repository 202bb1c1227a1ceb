//! Configuration types for `castscrape.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::castxml::CastXml;

/// Root configuration. Every field has a default, so an empty file (or no
/// file at all) is a valid configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// castxml binary to invoke. Looked up on PATH when relative.
    pub binary: Option<PathBuf>,
    /// Directory the intermediate dump is written to. A disposable temp
    /// directory is used otherwise.
    pub temp_dir: Option<PathBuf>,
    /// Directories injected as `-I` flags.
    pub include_paths: Vec<PathBuf>,
    /// Extra clang-side arguments.
    pub clang_args: Vec<String>,
    /// Keep a copy of the intermediate XML dump in this directory.
    pub save_xml: Option<PathBuf>,
}

impl Config {
    /// Build the dumper handle this configuration describes.
    pub fn castxml(&self) -> CastXml {
        let mut tool = match &self.binary {
            Some(binary) => CastXml::new(binary.clone()),
            None => CastXml::default(),
        };
        if let Some(dir) = &self.temp_dir {
            tool = tool.with_temp_dir(dir.clone());
        }
        let mut args: Vec<String> = self
            .include_paths
            .iter()
            .map(|path| format!("-I{}", path.display()))
            .collect();
        args.extend(self.clang_args.iter().cloned());
        tool.with_clang_args(args)
    }
}

/// Load and parse a `castscrape.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
    Ok(config)
}
