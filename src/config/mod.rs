//! Configuration system (layered: code > env > config file).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use serde::Deserialize;
use tracing::warn;

use crate::error::{ChatwireError, Result};
use crate::provider::ProviderKind;

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<ChatwireConfig> = OnceLock::new();

const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";

const KEY_PROVIDER: &str = "provider";
const KEY_MODEL: &str = "model";
const KEY_SYSTEM_PROMPT: &str = "system_prompt";
const KEY_TELEGRAM_TOKEN: &str = "telegram_bot_token";
const KEY_TELEGRAM_API_BASE: &str = "telegram_api_base";

/// On-disk configuration (TOML).
///
/// ```toml
/// provider = "anthropic"
/// model = "claude-sonnet-4-5"
///
/// [api_keys]
/// anthropic = "sk-ant-..."
///
/// [telegram]
/// bot_token = "123:abc"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    #[serde(default)]
    pub base_urls: HashMap<String, String>,
    #[serde(default)]
    pub telegram: TelegramFileConfig,
}

/// `[telegram]` table of [`FileConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramFileConfig {
    pub bot_token: Option<String>,
    pub api_base: Option<String>,
}

/// Layered configuration for chatwire.
///
/// Later layers win: the config file is applied first, then environment
/// variables, then explicit `set_*` calls.
#[derive(Debug, Clone, Default)]
pub struct ChatwireConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl ChatwireConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the default config file (if any), then `.env` and the process
    /// environment on top of it.
    pub fn from_env() -> Self {
        let config = Self::new();
        let path = default_config_path();
        if path.exists() {
            if let Err(e) = config.load_file(&path) {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            }
        }
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Get (or create) the global default config.
    pub fn global() -> &'static ChatwireConfig {
        DEFAULT_CONFIG.get_or_init(Self::from_env)
    }

    /// Build a config from a TOML file only.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = Self::new();
        config.load_file(path)?;
        Ok(config)
    }

    /// Apply a TOML config file on top of the current values.
    pub fn load_file(&self, path: &Path) -> Result<()> {
        let raw = std::fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&raw)?;
        self.apply_file(&file);
        Ok(())
    }

    pub fn apply_file(&self, file: &FileConfig) {
        for (provider, key) in &file.api_keys {
            self.set_api_key(provider, key.clone());
        }
        for (provider, url) in &file.base_urls {
            self.set_base_url(provider, url.clone());
        }
        let values = [
            (KEY_PROVIDER, &file.provider),
            (KEY_MODEL, &file.model),
            (KEY_SYSTEM_PROMPT, &file.system_prompt),
            (KEY_TELEGRAM_TOKEN, &file.telegram.bot_token),
            (KEY_TELEGRAM_API_BASE, &file.telegram.api_base),
        ];
        for (key, value) in values {
            if let Some(value) = value {
                self.set_value(key, value.clone());
            }
        }
    }

    /// Apply environment variables resolved through `lookup`.
    pub fn apply_env(&self, lookup: impl Fn(&str) -> Option<String>) {
        let key_mappings = [
            ("OPENAI_API_KEY", "openai"),
            ("ANTHROPIC_API_KEY", "anthropic"),
        ];
        for (env_var, provider) in key_mappings {
            if let Some(key) = lookup(env_var) {
                self.set_api_key(provider, key);
            }
        }

        let url_mappings = [
            ("OPENAI_BASE_URL", "openai"),
            ("ANTHROPIC_BASE_URL", "anthropic"),
        ];
        for (env_var, provider) in url_mappings {
            if let Some(url) = lookup(env_var).filter(|u| !u.is_empty()) {
                self.set_base_url(provider, url);
            }
        }

        let value_mappings = [
            ("CHATWIRE_PROVIDER", KEY_PROVIDER),
            ("CHATWIRE_MODEL", KEY_MODEL),
            ("CHATWIRE_SYSTEM_PROMPT", KEY_SYSTEM_PROMPT),
            ("TELEGRAM_BOT_TOKEN", KEY_TELEGRAM_TOKEN),
            ("TELEGRAM_API_BASE", KEY_TELEGRAM_API_BASE),
        ];
        for (env_var, key) in value_mappings {
            if let Some(value) = lookup(env_var) {
                self.set_value(key, value);
            }
        }
    }

    pub fn set_api_key(&self, provider: &str, key: String) {
        if let Ok(mut keys) = self.api_keys.write() {
            keys.insert(provider.to_string(), key);
        }
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys.read().ok()?.get(provider).cloned()
    }

    pub fn set_base_url(&self, provider: &str, url: String) {
        if let Ok(mut urls) = self.base_urls.write() {
            urls.insert(provider.to_string(), url);
        }
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls.read().ok()?.get(provider).cloned()
    }

    fn set_value(&self, key: &str, value: String) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value);
        }
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    pub fn set_provider(&self, kind: ProviderKind) {
        self.set_value(KEY_PROVIDER, kind.to_string());
    }

    /// Selected provider, `openai` when unset.
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        match self.get_value(KEY_PROVIDER) {
            None => Ok(ProviderKind::OpenAi),
            Some(name) => name.parse().map_err(|_| {
                ChatwireError::Configuration(format!("Unknown provider '{name}'"))
            }),
        }
    }

    pub fn set_model(&self, model: impl Into<String>) {
        self.set_value(KEY_MODEL, model.into());
    }

    /// Configured model, or the default for `kind`.
    pub fn model_for(&self, kind: ProviderKind) -> String {
        self.get_value(KEY_MODEL).unwrap_or_else(|| {
            match kind {
                ProviderKind::OpenAi => DEFAULT_OPENAI_MODEL,
                ProviderKind::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            }
            .to_string()
        })
    }

    pub fn set_system_prompt(&self, prompt: impl Into<String>) {
        self.set_value(KEY_SYSTEM_PROMPT, prompt.into());
    }

    pub fn system_prompt(&self) -> Option<String> {
        self.get_value(KEY_SYSTEM_PROMPT)
    }

    pub fn set_telegram_bot_token(&self, token: impl Into<String>) {
        self.set_value(KEY_TELEGRAM_TOKEN, token.into());
    }

    pub fn telegram_bot_token(&self) -> Option<String> {
        self.get_value(KEY_TELEGRAM_TOKEN).filter(|t| !t.is_empty())
    }

    pub fn set_telegram_api_base(&self, base: impl Into<String>) {
        self.set_value(KEY_TELEGRAM_API_BASE, base.into());
    }

    pub fn telegram_api_base(&self) -> String {
        self.get_value(KEY_TELEGRAM_API_BASE)
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string())
    }

    /// Check if a provider has an API key configured.
    pub fn has_credentials(&self, provider: &str) -> bool {
        self.get_api_key(provider).is_some()
    }
}

/// Config file location: `$CHATWIRE_CONFIG`, else `~/.chatwire/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("CHATWIRE_CONFIG") {
        return PathBuf::from(path);
    }
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".chatwire"))
        .unwrap_or_else(|| PathBuf::from(".chatwire"))
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_overrides_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
provider = "anthropic"
model = "claude-from-file"

[api_keys]
anthropic = "file-key"

[telegram]
bot_token = "file-token"
"#,
        )
        .unwrap();

        let config = ChatwireConfig::from_file(&path).unwrap();
        config.apply_env(env(&[
            ("ANTHROPIC_API_KEY", "env-key"),
            ("CHATWIRE_MODEL", "claude-from-env"),
        ]));

        assert_eq!(config.provider_kind().unwrap(), ProviderKind::Anthropic);
        assert_eq!(config.get_api_key("anthropic").as_deref(), Some("env-key"));
        assert_eq!(config.model_for(ProviderKind::Anthropic), "claude-from-env");
        assert_eq!(config.telegram_bot_token().as_deref(), Some("file-token"));
    }

    #[test]
    fn explicit_setters_win_over_env() {
        let config = ChatwireConfig::new();
        config.apply_env(env(&[("OPENAI_API_KEY", "env-key")]));
        config.set_api_key("openai", "code-key".to_string());
        assert_eq!(config.get_api_key("openai").as_deref(), Some("code-key"));
    }

    #[test]
    fn defaults_when_unset() {
        let config = ChatwireConfig::new();
        assert_eq!(config.provider_kind().unwrap(), ProviderKind::OpenAi);
        assert_eq!(config.model_for(ProviderKind::OpenAi), "gpt-4o");
        assert_eq!(config.telegram_api_base(), "https://api.telegram.org");
        assert!(config.telegram_bot_token().is_none());
        assert!(!config.has_credentials("openai"));
    }

    #[test]
    fn empty_base_url_env_is_ignored() {
        let config = ChatwireConfig::new();
        config.apply_env(env(&[("OPENAI_BASE_URL", "")]));
        assert!(config.get_base_url("openai").is_none());
    }

    #[test]
    fn unknown_provider_is_a_configuration_error() {
        let config = ChatwireConfig::new();
        config.apply_env(env(&[("CHATWIRE_PROVIDER", "gemini")]));
        assert!(matches!(
            config.provider_kind(),
            Err(ChatwireError::Configuration(_))
        ));
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "provider = [").unwrap();
        assert!(matches!(
            ChatwireConfig::from_file(&path),
            Err(ChatwireError::ConfigFile(_))
        ));
    }
}
