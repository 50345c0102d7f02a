use std::path::Path;

use serde::Serialize;

use crate::{page::Page, site::Site};

#[derive(Serialize)]
pub struct Section {
    pub pages: Vec<Page>,
}

impl Section {
    /// Pages below `prefix`, excluding the directory's own index page,
    /// ordered newest first; undated pages follow in title order.
    pub fn collect(site: &Site, prefix: &Path, page_type: Option<&str>) -> Self {
        let index = prefix.join("index.html");

        let mut pages: Vec<Page> = site
            .pages
            .values()
            .filter(|p| p.output_path.starts_with(prefix) && p.output_path != index)
            .filter(|p| page_type.map_or(true, |t| p.page_type == t))
            .cloned()
            .collect();

        pages.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));

        Self { pages }
    }
}
