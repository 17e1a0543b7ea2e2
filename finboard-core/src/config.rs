//! Configuration management
//!
//! Settings live in `settings.json` in the finboard directory:
//! ```json
//! {
//!   "api": { "baseUrl": "http://localhost:8081/api/", "token": "..." },
//!   "import": { "separator": ";", "dateFormat": "yyyy-MM-dd", "quoteMode": "none" },
//!   "importProfiles": { "profiles": { ... } }
//! }
//! ```
//! Keys this crate does not manage are kept as they are when saving.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adapters::http::{RequestContext, API_TOKEN_ENV, API_URL_ENV, DEFAULT_API_URL};
use crate::domain::{CommonValues, DateFormat, QuoteMode, Separator, TargetField};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    import: ImportDefaults,
    #[serde(default)]
    import_profiles: ImportProfilesContainer,
    #[serde(flatten)]
    other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportProfilesContainer {
    #[serde(default)]
    profiles: BTreeMap<String, ImportProfile>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

/// Parser settings used when no profile is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDefaults {
    #[serde(default)]
    pub separator: Separator,
    #[serde(default)]
    pub date_format: DateFormat,
    #[serde(default)]
    pub quote_mode: QuoteMode,
}

/// A saved import setup for files of one shape, e.g. one bank's export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProfile {
    #[serde(default)]
    pub separator: Separator,
    #[serde(default)]
    pub date_format: DateFormat,
    #[serde(default)]
    pub quote_mode: QuoteMode,
    /// Header to target field; ignored headers are not stored
    #[serde(default)]
    pub column_mappings: BTreeMap<String, TargetField>,
    /// Overlay values, when the profile overrides the lookup defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_values: Option<CommonValues>,
}

/// Finboard configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub import: ImportDefaults,
    pub import_profiles: BTreeMap<String, ImportProfile>,
    raw: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default(), |_| None)
    }
}

impl Config {
    /// Load `settings.json` from `finboard_dir`, then apply
    /// `FINBOARD_API_URL` / `FINBOARD_API_TOKEN` on top
    pub fn load(finboard_dir: &Path) -> Result<Self> {
        Self::load_with_env(finboard_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with environment lookups supplied by the caller
    pub fn load_with_env<F>(finboard_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = read_settings(&finboard_dir.join(SETTINGS_FILE))?;
        Ok(Self::from_settings(raw, env))
    }

    fn from_settings<F>(raw: SettingsFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = env(API_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| raw.api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_token = env(API_TOKEN_ENV)
            .or_else(|| raw.api.token.clone())
            .filter(|t| !t.trim().is_empty());

        Self {
            api_url,
            api_token,
            import: raw.import,
            import_profiles: raw.import_profiles.profiles.clone(),
            raw,
        }
    }

    /// Write managed sections back, keeping everything else in the file
    ///
    /// Environment overrides are never persisted; only the import defaults
    /// and profiles are written.
    pub fn save(&self, finboard_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(finboard_dir)
            .with_context(|| format!("Failed to create {}", finboard_dir.display()))?;
        let settings_path = finboard_dir.join(SETTINGS_FILE);

        let mut settings = if settings_path.exists() {
            read_settings(&settings_path)?
        } else {
            self.raw.clone()
        };
        settings.import = self.import;
        settings.import_profiles.profiles = self.import_profiles.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }

    /// How to reach the API
    pub fn request_context(&self) -> RequestContext {
        RequestContext::new(self.api_url.clone(), self.api_token.clone())
    }

    pub fn profile(&self, name: &str) -> Option<&ImportProfile> {
        self.import_profiles.get(name)
    }

    /// Insert or replace a profile
    pub fn save_profile(&mut self, name: impl Into<String>, profile: ImportProfile) {
        self.import_profiles.insert(name.into(), profile);
    }

    pub fn remove_profile(&mut self, name: &str) -> Option<ImportProfile> {
        self.import_profiles.remove(name)
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.import_profiles.keys().map(String::as_str).collect()
    }
}

fn read_settings(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(SettingsFile::default());
    }
    serde_json::from_str(&content).with_context(|| format!("Invalid settings file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CreditDebit, TransactionType};
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_with_env(dir.path(), no_env).unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_token.is_none());
        assert_eq!(config.import, ImportDefaults::default());
        assert!(config.import_profiles.is_empty());
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"api": {"baseUrl": "http://file/api/", "token": "from-file"}}"#,
        )
        .unwrap();

        let config = Config::load_with_env(dir.path(), |key| match key {
            API_URL_ENV => Some("http://env/api/".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.api_url, "http://env/api/");
        assert_eq!(config.api_token.as_deref(), Some("from-file"));

        let context = config.request_context();
        assert_eq!(context.base_url, "http://env/api/");
        assert_eq!(context.token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_import_defaults_from_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"import": {"separator": ",", "dateFormat": "dd/MM/yyyy", "quoteMode": "rfc4180"}}"#,
        )
        .unwrap();

        let config = Config::load_with_env(dir.path(), no_env).unwrap();
        assert_eq!(config.import.separator, Separator::Comma);
        assert_eq!(config.import.date_format, DateFormat::DayMonthYearSlash);
        assert_eq!(config.import.quote_mode, QuoteMode::Rfc4180);
    }

    #[test]
    fn test_invalid_settings_file_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        assert!(Config::load_with_env(dir.path(), no_env).is_err());
    }

    #[test]
    fn test_profiles_round_trip_and_unknown_keys_survive() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"theme": "dark", "api": {"token": "secret", "retries": 3}, "importProfiles": {"accountMappings": {"a": "b"}}}"#,
        )
        .unwrap();

        let mut config = Config::load_with_env(dir.path(), no_env).unwrap();
        let mut profile = ImportProfile {
            separator: Separator::Pipe,
            ..ImportProfile::default()
        };
        profile
            .column_mappings
            .insert("Valor".to_string(), TargetField::Amount);
        profile.common_values = Some(CommonValues {
            category_id: 3,
            payment_type_id: 1,
            transaction_type: TransactionType::Single,
            credit_debit: CreditDebit::Credit,
        });
        config.save_profile("nubank", profile.clone());
        config.save(dir.path()).unwrap();

        let reloaded = Config::load_with_env(dir.path(), no_env).unwrap();
        assert_eq!(reloaded.profile("nubank"), Some(&profile));
        assert_eq!(reloaded.profile_names(), vec!["nubank"]);
        assert_eq!(reloaded.api_token.as_deref(), Some("secret"));

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap())
                .unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["api"]["retries"], 3);
        assert_eq!(raw["importProfiles"]["accountMappings"]["a"], "b");
        assert_eq!(
            raw["importProfiles"]["profiles"]["nubank"]["columnMappings"]["Valor"],
            "amount"
        );
    }

    #[test]
    fn test_remove_profile() {
        let mut config = Config::default();
        config.save_profile("a", ImportProfile::default());
        assert!(config.remove_profile("a").is_some());
        assert!(config.remove_profile("a").is_none());
    }
}
