use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::Result;
use color_eyre::eyre::{Context, eyre};
use directories::ProjectDirs;
use toml::Value;

mod merge;
pub mod model;

pub use model::{Config, Paths, ResumeConfig, SearchConfig};

const MAIN_CONFIG: &str = "config.toml";
const DROPIN_DIR: &str = "conf.d";
const APP_NAME: &str = "claude-sessions";
pub const ENV_CONFIG_DIR: &str = "CS_CONFIG_DIR";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub merged: Value,
    pub config_dir: PathBuf,
    pub sources: Vec<ConfigSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSourceKind {
    Main,
    DropIn,
}

#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: PathBuf,
}

impl ConfigSourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSourceKind::Main => "main",
            ConfigSourceKind::DropIn => "drop-in",
        }
    }
}

/// Load `config.toml` and `conf.d/*.toml` from the configuration directory.
///
/// A missing directory is not an error; defaults apply.
///
/// # Errors
///
/// Returns an error if any file cannot be read or parsed, or the merged
/// result fails validation.
pub fn load(dir_override: Option<&Path>) -> Result<LoadedConfig> {
    let config_dir = resolve_config_dir(dir_override)?;
    let sources = gather_sources(&config_dir)?;

    let mut merged_table = toml::map::Map::new();
    for source in &sources {
        let contents = fs::read_to_string(&source.path)
            .with_context(|| format!("failed to read {}", source.path.display()))?;
        let value: Value = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", source.path.display()))?;
        let Value::Table(table) = value else {
            return Err(eyre!(
                "{} must contain a TOML table at the top level",
                source.path.display()
            ));
        };
        merge::merge_tables(&mut merged_table, table, Some(&source.path))?;
        tracing::debug!(path = %source.path.display(), kind = source.kind.as_str(), "merged config source");
    }

    let merged = Value::Table(merged_table);
    let config = Config::from_value(&merged).wrap_err("invalid configuration")?;

    Ok(LoadedConfig {
        config,
        merged,
        config_dir,
        sources,
    })
}

fn resolve_config_dir(dir_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = dir_override {
        return Ok(path.to_path_buf());
    }

    if let Some(raw) = env::var(ENV_CONFIG_DIR)
        .ok()
        .filter(|raw| !raw.trim().is_empty())
    {
        return Ok(PathBuf::from(raw));
    }

    let project_dirs = ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| eyre!("unable to resolve platform directories for {APP_NAME}"))?;
    Ok(project_dirs.config_dir().to_path_buf())
}

fn gather_sources(root: &Path) -> Result<Vec<ConfigSource>> {
    if root.is_file() {
        return Ok(vec![ConfigSource {
            kind: ConfigSourceKind::Main,
            path: root.to_path_buf(),
        }]);
    }

    let mut sources = Vec::new();
    if !root.exists() {
        return Ok(sources);
    }

    let main = root.join(MAIN_CONFIG);
    if main.is_file() {
        sources.push(ConfigSource {
            kind: ConfigSourceKind::Main,
            path: main,
        });
    }

    let conf_d = root.join(DROPIN_DIR);
    if conf_d.is_dir() {
        sources.extend(
            read_toml_files(&conf_d)?
                .into_iter()
                .map(|path| ConfigSource {
                    kind: ConfigSourceKind::DropIn,
                    path,
                }),
        );
    }

    Ok(sources)
}

/// `*.toml` files directly inside `dir`, sorted by path.
fn read_toml_files(dir: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
        {
            files.insert(path);
        }
    }
    Ok(files)
}
