use std::{fs, path::Path, str::FromStr};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use url::Url;

/// A link rendered in the navigation bar or the sidebar.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct NavEntry {
    pub label: String,
    pub path: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1111,
        }
    }
}

impl ServerSettings {
    pub fn local_url(&self) -> anyhow::Result<Url> {
        Ok(Url::from_str(&format!("http://{}:{}", self.host, self.port))?)
    }
}

/// Site-wide settings read from `config.toml`. Together with the layout
/// templates this is the shell every page is composed into.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    pub title: String,
    pub base_url: Url,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub stylesheets: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub navigation: Vec<NavEntry>,
    #[serde(default)]
    pub sidebar: Vec<NavEntry>,
    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,
    #[serde(default)]
    pub server: ServerSettings,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_highlight_theme() -> String {
    "base16-ocean.dark".to_string()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn make_permalink(&self, path: &str) -> anyhow::Result<Url> {
        let escaped = path.strip_suffix("index.html").unwrap_or(path);
        Ok(self.base_url.join(escaped)?)
    }
}
