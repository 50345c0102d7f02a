use std::{collections::HashMap, path::Path, sync::Arc};

use crate::{section::Section, site::Site};

use super::{required_string_arg, string_arg};

/// `get_section(path="docs/", type="tutorial")` lists the pages under a
/// directory of the content tree, newest first.
pub struct GetSection {
    site: Arc<Site>,
}

impl GetSection {
    pub fn new(site: Arc<Site>) -> Self {
        Self { site }
    }
}

impl tera::Function for GetSection {
    fn call(&self, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        let path = required_string_arg(args, "path")?;
        let page_type = string_arg(args, "type")?;

        let mut prefix = Path::new(path.trim_start_matches('/')).to_path_buf();
        if prefix.extension().is_some() {
            prefix.pop();
        }

        let section = Section::collect(&self.site, &prefix, page_type.as_deref());

        Ok(tera::to_value(section)?)
    }
}
