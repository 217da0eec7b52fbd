//! Layered configuration loading
//!
//! Sources are merged lowest priority first, so later layers override
//! earlier ones key by key:
//!
//! | Layer | Source |
//! |-------|--------|
//! | default | [`FileConfig::default`] |
//! | global | `$XDG_CONFIG_HOME/addy/config.toml` |
//! | project | `./addy.toml`, else `./.addy.toml` |
//! | explicit | `--config <path>` (must exist) |
//! | env | `ADDY_<SECTION>__<KEY>` |

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["addy.toml", ".addy.toml"];
const ENV_PREFIX: &str = "ADDY_";

/// One candidate TOML file and whether it is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub layer: &'static str,
    pub path: PathBuf,
    pub found: bool,
}

impl ConfigSource {
    fn discover(layer: &'static str, path: PathBuf) -> Self {
        let found = path.is_file();
        Self { layer, path, found }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Merge every layer into a [`FileConfig`]. An explicit path is always
    /// merged; a missing explicit file is an error rather than a silent skip.
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::from(Serialized::defaults(FileConfig::default()));
        for source in Self::file_sources().into_iter().filter(|s| s.found) {
            figment = figment.merge(Toml::file(&source.path));
        }
        if let Some(path) = config_path {
            if !path.is_file() {
                return Err(Box::new(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                ))));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: FileConfig = figment.extract().map_err(Box::new)?;
        tracing::debug!(
            tools = config.tools.enabled.len(),
            floor = config.nlp.confidence_floor,
            explicit = config_path.map(|p| p.display().to_string()),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// `--no-config`
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("addy").join("config.toml"))
    }

    /// First project file present in the working directory.
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_in(Path::new("."))
    }

    fn project_config_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Discovered file layers, lowest priority first.
    pub fn file_sources() -> Vec<ConfigSource> {
        let mut sources = Vec::new();
        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource::discover("global", path));
        }
        let project = Self::project_config_path().unwrap_or_else(|| PathBuf::from(PROJECT_FILES[0]));
        sources.push(ConfigSource::discover("project", project));
        sources
    }

    /// `--show-config`: the layers in the order they win.
    pub fn print_config_sources() {
        println!("Configuration sources (highest priority first):");
        println!("  [     ] env      {}<SECTION>__<KEY>", ENV_PREFIX);
        for source in Self::file_sources().iter().rev() {
            let mark = if source.found { "FOUND" } else { "     " };
            println!("  [{}] {:<8} {}", mark, source.layer, source.path.display());
        }
        println!("  [     ] default  built-in");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.nlp.confidence_floor, 0.5);
        assert!(config.security.require_confirmation);
    }

    #[test]
    fn test_global_path_is_under_addy() {
        if let Some(path) = ConfigLoader::global_config_path() {
            assert!(path.ends_with("addy/config.toml"));
        }
    }

    #[test]
    fn test_project_file_preference() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ConfigLoader::project_config_in(dir.path()), None);

        std::fs::write(dir.path().join(".addy.toml"), "").unwrap();
        assert_eq!(
            ConfigLoader::project_config_in(dir.path()),
            Some(dir.path().join(".addy.toml"))
        );

        std::fs::write(dir.path().join("addy.toml"), "").unwrap();
        assert_eq!(
            ConfigLoader::project_config_in(dir.path()),
            Some(dir.path().join("addy.toml"))
        );
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[nlp]\nconfidence_floor = 0.9\n\n[tools]\nenabled = [\"calculator\"]"
        )
        .unwrap();

        let path = file.path().to_path_buf();
        let config = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(config.nlp.confidence_floor, 0.9);
        assert_eq!(config.tools.enabled, vec!["calculator"]);
        assert_eq!(config.security.confirmation_timeout_secs, 30);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(ConfigLoader::load(Some(&path)).is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[security]\nconfirmation_timeout_secs = \"soon\"").unwrap();

        let path = file.path().to_path_buf();
        assert!(ConfigLoader::load(Some(&path)).is_err());
    }
}
