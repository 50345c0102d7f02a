use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use toml::value::Datetime;
use url::Url;

pub const DEFAULT_TEMPLATE: &str = "page.html";
pub const DEFAULT_PAGE_TYPE: &str = "page";

#[derive(Deserialize, Default, Debug)]
pub struct FrontMatter {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub page_type: Option<String>,
    pub date: Option<Datetime>,
    pub template: Option<String>,
    pub description: Option<String>,
}

impl FrontMatter {
    pub fn date(&self) -> Option<NaiveDate> {
        let date = self.date.as_ref()?.date?;
        NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())
    }
}

/// What shortcodes and the markdown renderer get to see of a page while its
/// body is still being rendered.
#[derive(Serialize, Clone, Debug)]
pub struct PartialPage {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub page_type: String,
    pub date: Option<NaiveDate>,
    pub description: String,
    pub permalink: Url,
    /// URL of the content directory the page was read from; relative image
    /// links resolve against it.
    #[serde(skip)]
    pub asset_base: Url,
}

#[derive(Serialize, Clone, Debug)]
pub struct Page {
    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub output_path: PathBuf,
    #[serde(skip)]
    pub template_name: String,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub page_type: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub content: String,
    pub summary: Option<String>,
    pub permalink: Url,
    /// Site-absolute path of the page, e.g. `/docs/intro/`.
    pub path: String,
}

impl Page {
    pub fn new(
        partial: PartialPage,
        output_path: PathBuf,
        template_name: &str,
        content: String,
    ) -> Self {
        let name = output_path.to_string_lossy().to_string();
        let path = url_path(&name);

        Self {
            name,
            output_path,
            template_name: template_name.to_string(),
            title: partial.title,
            page_type: partial.page_type,
            description: partial.description,
            date: partial.date,
            content,
            summary: None,
            permalink: partial.permalink,
            path,
        }
    }
}

/// Converts an output path (`docs/intro/index.html`) to the path it is
/// served under (`/docs/intro/`).
pub fn url_path(name: &str) -> String {
    format!("/{}", name.strip_suffix("index.html").unwrap_or(name))
}

/// Inverse of [`url_path`]: maps a requested path to the output path of the
/// page that answers it.
pub fn page_key(request_path: &str) -> String {
    let path = request_path.trim_start_matches('/');

    if path.is_empty() || path.ends_with('/') {
        format!("{path}index.html")
    } else if std::path::Path::new(path).extension().is_none() {
        format!("{path}/index.html")
    } else {
        path.to_string()
    }
}
