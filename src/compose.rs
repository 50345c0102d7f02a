//! Composition of rendered pages into the site shell.
//!
//! The shell is the shared layout every page is embedded in: `<head>` with
//! the page title, the navigation bar, the sidebar and the footer. A default
//! layout is compiled into the binary; a site overrides any part of it by
//! shipping a template with the same name under `templates/`.

use std::sync::Arc;

use tera::Tera;

use crate::{
    config::Config,
    context::Context,
    functions::{get_section::GetSection, get_url::GetURL, markdown::Markdown},
    page::Page,
    site::Site,
};

const SHELL_TEMPLATE: &str = include_str!("theme/shell.html");
const PAGE_TEMPLATE: &str = include_str!("theme/page.html");

fn builtin_templates() -> anyhow::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("shell.html", SHELL_TEMPLATE),
        ("page.html", PAGE_TEMPLATE),
    ])?;
    Ok(tera)
}

pub fn setup_template_engine(context: &Context) -> anyhow::Result<Tera> {
    let template_dir = context.absolute("templates");

    // parse only: site templates may extend the builtin shell, which is
    // merged in before inheritance chains are built
    let mut tera = if template_dir.is_dir() {
        Tera::parse(&template_dir.join("**").join("*").to_string_lossy())?
    } else {
        Tera::default()
    };
    tera.extend(&builtin_templates()?)?;
    tera.build_inheritance_chains()?;

    tera.register_function("get_url", GetURL::new(context.config.base_url.clone()));
    tera.register_filter("markdown", Markdown {});

    tracing::info!(
        templates = ?tera.get_template_names().collect::<Vec<_>>(),
        "loaded templates"
    );

    Ok(tera)
}

/// Registers the functions that need the fully loaded site.
pub fn register_site_functions(tera: &mut Tera, site: Arc<Site>) {
    tera.register_function("get_section", GetSection::new(site));
}

/// Embeds `page` into the shell. A page without a title gets the site
/// title; the output depends on nothing but the page, the site and the
/// configuration.
pub fn render_page(
    config: &Config,
    tera: &Tera,
    page: &Page,
    site: &Site,
) -> anyhow::Result<String> {
    let mut ctx = tera::Context::new();

    let mut pages = site
        .pages
        .values()
        .filter(|p| p.date.is_some())
        .collect::<Vec<_>>();
    pages.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.name.cmp(&b.name)));

    let title = page.title.as_deref().unwrap_or(&config.title);

    ctx.insert("config", config);
    ctx.insert("title", title);
    ctx.insert("page", page);
    ctx.insert("pages", &pages);
    ctx.insert("navigation", &config.navigation);
    ctx.insert("sidebar", &config.sidebar);
    ctx.insert("current_url", &page.permalink);
    ctx.insert("current_path", &page.path);

    Ok(tera.render(&page.template_name, &ctx)?)
}

/// Composes every page of the site, keyed by output path.
pub fn render_site(
    config: &Config,
    tera: &Tera,
    site: &Site,
) -> anyhow::Result<Vec<(String, String)>> {
    site.pages
        .values()
        .map(|page| Ok((page.name.clone(), render_page(config, tera, page, site)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use url::Url;

    use crate::{
        config::NavEntry,
        page::{PartialPage, DEFAULT_TEMPLATE},
        site::tests::{load, write_site},
    };

    use super::*;

    fn config() -> Config {
        let mut config = Config::parse(
            r#"
            title = "couchdbkit"
            base_url = "https://docs.example.org/"
            footer = "<p>&copy; the authors</p>"
            "#,
        )
        .unwrap();
        config.navigation = vec![NavEntry {
            label: "home".to_string(),
            path: "/".to_string(),
        }];
        config
    }

    fn context() -> Context {
        Context::with_config(PathBuf::from("does/not/exist"), PathBuf::from("public"), config())
    }

    fn page(title: Option<&str>, body: &str) -> Page {
        let partial = PartialPage {
            title: title.map(str::to_string),
            page_type: "tutorial".to_string(),
            date: None,
            description: String::new(),
            permalink: Url::parse("https://docs.example.org/docs/getting-started/").unwrap(),
            asset_base: Url::parse("https://docs.example.org/docs/").unwrap(),
        };
        Page::new(
            partial,
            PathBuf::from("docs/getting-started/index.html"),
            DEFAULT_TEMPLATE,
            body.to_string(),
        )
    }

    fn compose(page: &Page) -> String {
        let context = context();
        let tera = setup_template_engine(&context).unwrap();
        render_page(&context.config, &tera, page, &Site::new()).unwrap()
    }

    fn between<'a>(haystack: &'a str, start: &str, end: &str) -> &'a str {
        let from = haystack.find(start).unwrap() + start.len();
        let to = from + haystack[from..].find(end).unwrap();
        &haystack[from..to]
    }

    fn unescape(text: &str) -> String {
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#x27;", "'")
            .replace("&#x2F;", "/")
            .replace("&amp;", "&")
    }

    #[test]
    fn composes_title_body_and_navigation() {
        let html = compose(&page(Some("Getting started"), "<p>Hello</p>"));

        let head = between(&html, "<head>", "</head>");
        assert!(head.contains("<title>Getting started</title>"));

        assert_eq!(between(&html, "<main id=\"content\">", "</main>"), "<p>Hello</p>");

        let nav = between(&html, "<nav id=\"navigation\">", "</nav>");
        assert!(nav.contains("<a href=\"/\">home</a>"));

        assert!(html.contains("<p>&copy; the authors</p>"));
        assert!(!html.contains("id=\"sidebar\""));
    }

    #[test]
    fn title_and_body_survive_composition() {
        let cases = [
            ("Getting started", "<p>Hello</p>"),
            (
                "Views & design docs",
                "<h1>Views</h1>\n<pre><code>view = db.view('a/b')</code></pre>",
            ),
            ("<Document> \"schema\" it's 1/2", ""),
        ];

        for (title, body) in cases {
            let html = compose(&page(Some(title), body));

            assert_eq!(unescape(between(&html, "<title>", "</title>")), title);
            assert_eq!(between(&html, "<main id=\"content\">", "</main>"), body);
        }
    }

    #[test]
    fn composition_is_idempotent() {
        let page = page(Some("Getting started"), "<p>Hello</p>");

        assert_eq!(compose(&page), compose(&page));
    }

    #[test]
    fn missing_title_falls_back_to_site_title() {
        let html = compose(&page(None, "<p>Hello</p>"));

        assert!(html.contains("<title>couchdbkit</title>"));
    }

    #[test]
    fn missing_body_renders_empty_content_region() {
        let html = compose(&page(Some("Empty"), ""));

        assert!(html.contains("<main id=\"content\"></main>"));
    }

    #[test]
    fn active_navigation_entry_is_marked() {
        let context = context();
        let mut config = context.config.clone();
        config.sidebar = vec![NavEntry {
            label: "Getting started".to_string(),
            path: "/docs/getting-started/".to_string(),
        }];
        let tera = setup_template_engine(&context).unwrap();

        let html = render_page(
            &config,
            &tera,
            &page(Some("Getting started"), "<p>Hello</p>"),
            &Site::new(),
        )
        .unwrap();

        let sidebar = between(&html, "<aside id=\"sidebar\">", "</aside>");
        assert!(sidebar
            .contains("<a href=\"/docs/getting-started/\" class=\"active\">Getting started</a>"));
    }

    #[test]
    fn site_templates_override_and_extend_the_shell() {
        let dir = tempfile::tempdir().unwrap();
        write_site(
            dir.path(),
            &[
                (
                    "templates/tutorial.html",
                    r#"{% extends "shell.html" %}{% block content %}<article>{{ page.content | safe }}</article>{% endblock content %}"#,
                ),
                (
                    "templates/section.html",
                    r#"{% extends "shell.html" %}{% block content %}
{%- set section = get_section(path="docs/", type="tutorial") -%}
{%- for p in section.pages %}<a href="{{ p.path | safe }}">{{ p.title }}</a>{% endfor -%}
{% endblock content %}"#,
                ),
                (
                    "content/docs/intro.md",
                    "+++\ntitle = \"Intro\"\ntype = \"tutorial\"\ntemplate = \"tutorial.html\"\n+++\nHello",
                ),
                (
                    "content/docs/index.md",
                    "+++\ntitle = \"Docs\"\ntemplate = \"section.html\"\n+++\n",
                ),
            ],
        );

        let (context, mut tera, site) = load(dir.path());
        let site = Arc::new(site);
        register_site_functions(&mut tera, site.clone());

        let intro = site.get("/docs/intro/").unwrap();
        let intro = render_page(&context.config, &tera, intro, &site).unwrap();
        assert!(intro.contains("<main id=\"content\"><article><p>Hello</p>\n</article></main>"));

        let docs = site.get("/docs/").unwrap();
        let docs = render_page(&context.config, &tera, docs, &site).unwrap();
        assert!(docs.contains("<a href=\"/docs/intro/\">Intro</a>"));
        assert!(docs.contains("<title>Docs</title>"));
    }

    #[test]
    fn demo_site_composes() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demo");
        let (context, mut tera, site) = load(&root);
        let site = Arc::new(site);
        register_site_functions(&mut tera, site.clone());

        let rendered: std::collections::HashMap<_, _> =
            render_site(&context.config, &tera, &site).unwrap().into_iter().collect();

        let home = &rendered["index.html"];
        assert!(home.contains("<div class=\"tip\">"));

        let docs = &rendered["docs/index.html"];
        assert!(docs.contains(
            "<a href=\"/docs/django/\">Django extension</a>: Use documents from <em>Django</em>"
        ));
        assert!(docs.contains("<a href=\"/docs/api/\">API reference</a>"));
        assert!(docs.contains("<a href=\"/docs/\" class=\"active\">docs</a>"));

        let tutorial = &rendered["docs/getting-started/index.html"];
        assert!(tutorial.contains("<title>Getting started</title>"));
        assert!(tutorial.contains("Greeting"));
        assert!(!tutorial.contains("```"));
    }
}
