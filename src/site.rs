use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use tera::Tera;
use walkdir::WalkDir;

use crate::{
    context::Context,
    frontmatter,
    highlighter::Highlighter,
    markdown::{render_content, BodyFormat},
    page::{page_key, FrontMatter, Page, PartialPage, DEFAULT_PAGE_TYPE, DEFAULT_TEMPLATE},
};

const ASSET_EXTENSIONS: [&str; 6] = ["png", "webp", "jpg", "jpeg", "gif", "svg"];

const MORE_MARKER: &str = "more";

/// Every page of the site, keyed by output path, plus the images found next
/// to them in the content tree.
#[derive(Default)]
pub struct Site {
    pub pages: BTreeMap<String, Page>,
    pub assets: BTreeMap<String, PathBuf>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the page answering a request path such as `/docs/intro/`.
    /// A dotted last segment (`/docs/release-0.5`) is tried as a file first
    /// and then as a directory.
    pub fn get(&self, request_path: &str) -> Option<&Page> {
        self.pages.get(&page_key(request_path)).or_else(|| {
            let dir = request_path.trim_matches('/');
            self.pages.get(&format!("{dir}/index.html"))
        })
    }

    pub fn asset(&self, request_path: &str) -> Option<&Path> {
        self.assets
            .get(request_path.trim_start_matches('/'))
            .map(PathBuf::as_path)
    }

    /// Reads and renders everything under `content/`.
    pub fn load(context: &Context, tera: &Tera, highlighter: &Highlighter) -> anyhow::Result<Self> {
        let mut site = Site::new();

        let content_dir: PathBuf = context.absolute("content");

        for entry in WalkDir::new(&content_dir).sort_by_file_name() {
            let entry = entry?;

            if !entry.file_type().is_file() {
                continue;
            }

            if entry.file_name().to_string_lossy().starts_with('_') {
                continue;
            }

            let relative = entry.path().strip_prefix(&content_dir)?;
            let extension = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");

            if ASSET_EXTENSIONS.contains(&extension) {
                tracing::debug!(path = %relative.display(), "found asset");
                site.assets
                    .insert(relative.to_string_lossy().to_string(), entry.path().into());
                continue;
            }

            let Some(format) = BodyFormat::from_extension(extension) else {
                tracing::warn!(path = %relative.display(), "skipping file with unknown extension");
                continue;
            };

            tracing::info!(path = %context.relative(entry.path())?.display(), "compiling");

            let contents = fs::read_to_string(entry.path())
                .with_context(|| format!("reading {}", entry.path().display()))?;

            let page = load_page(context, tera, highlighter, relative, format, &contents)
                .with_context(|| format!("compiling {}", relative.display()))?;

            site.pages.insert(page.name.clone(), page);
        }

        Ok(site)
    }
}

fn load_page(
    context: &Context,
    tera: &Tera,
    highlighter: &Highlighter,
    relative: &Path,
    format: BodyFormat,
    contents: &str,
) -> anyhow::Result<Page> {
    let (frontmatter, body) = frontmatter::parse::<FrontMatter>(contents)?;

    let template_name = frontmatter.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);

    let output_path = output_path(relative, Some(template_name));

    let permalink = context
        .config
        .make_permalink(&output_path.to_string_lossy())?;

    let asset_base = match relative.parent().map(Path::to_string_lossy) {
        Some(dir) if !dir.is_empty() => context.config.base_url.join(&format!("{dir}/"))?,
        _ => context.config.base_url.clone(),
    };

    let partial = PartialPage {
        date: frontmatter.date(),
        title: frontmatter.title,
        page_type: frontmatter
            .page_type
            .unwrap_or_else(|| DEFAULT_PAGE_TYPE.to_string()),
        description: frontmatter.description.unwrap_or_default(),
        permalink,
        asset_base,
    };

    let summary = summary_text(body)
        .map(|text| render_content(text, format, &partial, tera, highlighter))
        .transpose()?;

    let content = render_content(body, format, &partial, tera, highlighter)?;

    let mut page = Page::new(partial, output_path, template_name, content);
    page.summary = summary;

    Ok(page)
}

/// The part of a body before a `<!-- more -->` marker, if there is one.
fn summary_text(body: &str) -> Option<&str> {
    let mut last = 0;
    while let Some(offset) = body[last..].find("<!--") {
        let start = last + offset;
        let end = start + 4 + body[start + 4..].find("-->")?;

        if body[start + 4..end].trim().eq_ignore_ascii_case(MORE_MARKER) {
            return Some(&body[..start]);
        }

        last = end + 3;
    }

    None
}

pub fn output_path(relative_path: &Path, template_name: Option<&str>) -> PathBuf {
    let mut output_path = relative_path.with_extension("");
    if let Some(extension) = Path::new(template_name.unwrap_or("")).extension() {
        if extension.eq("html") {
            if output_path.file_name().is_some_and(|n| n.eq("index")) {
                output_path.pop();
            }
            output_path = output_path.join("index.html");
        } else {
            output_path = output_path.with_extension(extension);
        }
    }

    output_path
}
