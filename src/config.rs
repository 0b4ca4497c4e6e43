//! Project configuration.
//!
//! Read from `i18n.toml` in the project directory and layered as
//! file → user settings → environment → CLI:
//!
//! ```toml
//! [locale]
//! source = "en"
//! targets = ["es", "fr"]
//!
//! [buckets.json]
//! include = ["locales/[locale].json"]
//!
//! [engine]
//! url = "https://engine.example.com"
//! ```
//!
//! `[locale]` inside an include path is replaced with the locale code.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::flags::RunFlags;

pub const CONFIG_FILE: &str = "i18n.toml";
pub const LOCALE_PLACEHOLDER: &str = "[locale]";
pub const API_KEY_ENV: &str = "LINGO_API_KEY";
pub const API_URL_ENV: &str = "LINGO_API_URL";

/// Bucket types the default pipeline knows how to read and write.
pub const SUPPORTED_BUCKETS: &[&str] = &["json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub source: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketConfig {
    #[serde(default)]
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub url: Option<String>,
}

/// Contents of `i18n.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub locale: LocaleConfig,
    #[serde(default)]
    pub buckets: BTreeMap<String, BucketConfig>,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Directory the config was loaded from; include paths are relative to it.
    #[serde(skip)]
    pub root: PathBuf,
}

impl ProjectConfig {
    /// Load `i18n.toml` from `project_dir`.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        if !path.exists() {
            bail!(
                "No {} found in {}. Create one to describe your locales and buckets.",
                CONFIG_FILE,
                project_dir.display()
            );
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.root = project_dir.to_path_buf();
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.locale.source.trim().is_empty() {
            bail!("[locale] source must not be empty");
        }
        for name in self.buckets.keys() {
            if !SUPPORTED_BUCKETS.contains(&name.as_str()) {
                bail!(
                    "Unsupported bucket type '{}'. Supported: {}",
                    name,
                    SUPPORTED_BUCKETS.join(", ")
                );
            }
        }
        Ok(())
    }

    /// Source locale after applying `--source-locale`.
    pub fn effective_source(&self, flags: &RunFlags) -> String {
        flags
            .source_locale
            .clone()
            .unwrap_or_else(|| self.locale.source.clone())
    }

    /// Target locales after applying `--target-locale`, without the source locale.
    pub fn effective_targets(&self, flags: &RunFlags) -> Vec<String> {
        let source = self.effective_source(flags);
        let targets = if flags.target_locale.is_empty() {
            &self.locale.targets
        } else {
            &flags.target_locale
        };
        let mut out: Vec<String> = Vec::new();
        for target in targets {
            if *target != source && !out.contains(target) {
                out.push(target.clone());
            }
        }
        out
    }
}

/// Per-user settings stored in `~/.lingo/settings.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
}

impl UserSettings {
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".lingo").join("settings.toml"))
    }

    /// Load user settings, treating a missing file as empty.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Engine credentials resolved from every configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_url: String,
}

impl Credentials {
    /// Resolve the API key and URL. Precedence, highest first:
    /// `--api-key`, environment, `i18n.toml` (URL only), user settings.
    pub fn resolve(
        flags: &RunFlags,
        project: &ProjectConfig,
        settings: &UserSettings,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = flags
            .api_key
            .clone()
            .or_else(|| env(API_KEY_ENV))
            .or_else(|| settings.auth.api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .with_context(|| {
                format!(
                    "No API key found. Pass --api-key, set {} or add [auth] api_key to ~/.lingo/settings.toml",
                    API_KEY_ENV
                )
            })?;
        let api_url = env(API_URL_ENV)
            .or_else(|| project.engine.url.clone())
            .or_else(|| settings.auth.api_url.clone())
            .filter(|u| !u.trim().is_empty())
            .with_context(|| {
                format!(
                    "No engine URL configured. Set [engine] url in {} or {}",
                    CONFIG_FILE, API_URL_ENV
                )
            })?;
        Ok(Self {
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[locale]
source = "en"
targets = ["es", "fr", "en"]

[buckets.json]
include = ["locales/[locale].json"]

[engine]
url = "https://engine.test/"
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_sample() {
        let config = ProjectConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.locale.source, "en");
        assert_eq!(config.buckets["json"].include, vec!["locales/[locale].json"]);
        assert_eq!(config.engine.url.as_deref(), Some("https://engine.test/"));
    }

    #[test]
    fn test_unsupported_bucket_rejected() {
        let err = ProjectConfig::parse(
            "[locale]\nsource = \"en\"\n[buckets.yaml]\ninclude = [\"a/[locale].yml\"]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unsupported bucket type 'yaml'"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = ProjectConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No i18n.toml found"));
    }

    #[test]
    fn test_load_sets_root() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), SAMPLE).unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(config.root, dir.path());
    }

    #[test]
    fn test_effective_targets_drop_source_and_duplicates() {
        let config = ProjectConfig::parse(SAMPLE).unwrap();
        let flags = RunFlags::default();
        assert_eq!(config.effective_targets(&flags), vec!["es", "fr"]);
    }

    #[test]
    fn test_cli_locales_override_config() {
        let config = ProjectConfig::parse(SAMPLE).unwrap();
        let flags = RunFlags {
            source_locale: Some("fr".into()),
            target_locale: vec!["de".into(), "fr".into()],
            ..RunFlags::default()
        };
        assert_eq!(config.effective_source(&flags), "fr");
        assert_eq!(config.effective_targets(&flags), vec!["de"]);
    }

    #[test]
    fn test_credentials_precedence() {
        let config = ProjectConfig::parse(SAMPLE).unwrap();
        let settings = UserSettings {
            auth: AuthSettings {
                api_key: Some("from-settings".into()),
                api_url: Some("https://settings.test".into()),
            },
        };

        let creds = Credentials::resolve(&RunFlags::default(), &config, &settings, no_env).unwrap();
        assert_eq!(creds.api_key, "from-settings");
        assert_eq!(creds.api_url, "https://engine.test");

        let env = |name: &str| match name {
            API_KEY_ENV => Some("from-env".to_string()),
            _ => None,
        };
        let creds = Credentials::resolve(&RunFlags::default(), &config, &settings, env).unwrap();
        assert_eq!(creds.api_key, "from-env");

        let flags = RunFlags {
            api_key: Some("from-flag".into()),
            ..RunFlags::default()
        };
        let creds = Credentials::resolve(&flags, &config, &settings, env).unwrap();
        assert_eq!(creds.api_key, "from-flag");
    }

    #[test]
    fn test_credentials_missing_key_fails() {
        let config = ProjectConfig::parse(SAMPLE).unwrap();
        let err = Credentials::resolve(
            &RunFlags::default(),
            &config,
            &UserSettings::default(),
            no_env,
        )
        .unwrap_err();
        assert!(err.to_string().contains("No API key found"));
    }

    #[test]
    fn test_user_settings_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let settings = UserSettings::load_from(&dir.path().join("settings.toml")).unwrap();
        assert!(settings.auth.api_key.is_none());
    }
}
