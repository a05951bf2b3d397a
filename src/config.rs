use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub webapp: WebAppConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebAppConfig {
    /// HTTPS page opened by the `/start` button
    #[serde(default = "default_webapp_url")]
    pub url: String,
    #[serde(default = "default_button_text")]
    pub button_text: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessagesConfig {
    #[serde(default = "default_greeting")]
    pub greeting: String,
    /// Prepended verbatim to every echoed message
    #[serde(default = "default_echo_label")]
    pub echo_label: String,
}

impl Default for WebAppConfig {
    fn default() -> Self {
        Self {
            url: default_webapp_url(),
            button_text: default_button_text(),
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            echo_label: default_echo_label(),
        }
    }
}

fn default_webapp_url() -> String {
    "https://database-test-production.up.railway.app/".to_string()
}

fn default_button_text() -> String {
    "Открыть игру".to_string()
}

fn default_greeting() -> String {
    "Привет! Нажми на кнопку, чтобы открыть игру:".to_string()
}

fn default_echo_label() -> String {
    "Вы сказали: ".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;

        if config.telegram.bot_token.trim().is_empty() {
            bail!("telegram.bot_token must not be empty");
        }

        Ok(config)
    }
}
