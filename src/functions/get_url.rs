use std::collections::HashMap;
use url::Url;

use super::required_string_arg;

pub struct GetURL {
    base_url: Url,
}

impl GetURL {
    pub fn new(base_url: Url) -> Self {
        GetURL { base_url }
    }
}

impl tera::Function for GetURL {
    fn call(&self, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        let path = required_string_arg(args, "path")?;

        let result = self
            .base_url
            .join(path.trim().trim_start_matches('/'))
            .map_err(|e| tera::Error::msg(format!("invalid path '{path}': {e}")))?;

        Ok(tera::to_value::<String>(result.into())?)
    }

    fn is_safe(&self) -> bool {
        true
    }
}
