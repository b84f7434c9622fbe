use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::Config;

/// Result of [`load_layered`]: the effective config plus the files that
/// contributed to it, lowest priority first.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: Config,
    pub sources: Vec<PathBuf>,
}

/// Where tandem looks for `config.toml`, lowest priority first.
fn discovered_layers() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/tandem/config.toml")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/tandem/config.toml"));
    }
    // Often the same file as above.
    if let Some(dir) = dirs::config_dir() {
        let p = dir.join("tandem/config.toml");
        if !paths.contains(&p) {
            paths.push(p);
        }
    }
    paths.push(PathBuf::from(".tandem/config.toml"));
    paths
}

/// Load the effective configuration.  `explicit` (the `--config` flag) is
/// applied last and must exist; discovered layers are optional.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<Config> {
    load_layered(explicit).map(|loaded| loaded.config)
}

pub fn load_layered(explicit: Option<&Path>) -> anyhow::Result<LoadedConfig> {
    let mut sources: Vec<PathBuf> =
        discovered_layers().into_iter().filter(|p| p.is_file()).collect();
    if let Some(p) = explicit {
        sources.push(PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()));
    }

    let mut merged = toml::Table::new();
    for path in &sources {
        debug!(path = %path.display(), "config layer");
        let layer = read_layer(path)?;
        overlay(&mut merged, layer);
    }

    let parsed: Result<Config, _> = toml::Value::Table(merged).try_into();
    let config = match parsed {
        Ok(c) => c,
        Err(e) => {
            warn!("config does not match schema, using defaults: {e}");
            Config::default()
        }
    };
    Ok(LoadedConfig { config, sources })
}

fn read_layer(path: &Path) -> anyhow::Result<toml::Table> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    text.parse::<toml::Table>()
        .with_context(|| format!("parsing config {}", path.display()))
}

/// Tables merge key by key; anything else in `top` replaces `base`.
fn overlay(base: &mut toml::Table, top: toml::Table) {
    for (key, value) in top {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(b)), toml::Value::Table(t)) => overlay(b, t),
            (_, v) => {
                base.insert(key, v);
            }
        }
    }
}
