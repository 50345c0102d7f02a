pub mod get_section;
pub mod get_url;
pub mod markdown;

use std::collections::HashMap;

/// Fetches an optional string argument of a template function.
fn string_arg(args: &HashMap<String, tera::Value>, name: &str) -> tera::Result<Option<String>> {
    args.get(name)
        .cloned()
        .map(tera::from_value::<String>)
        .transpose()
        .map_err(Into::into)
}

fn required_string_arg(args: &HashMap<String, tera::Value>, name: &str) -> tera::Result<String> {
    string_arg(args, name)?.ok_or_else(|| tera::Error::msg(format!("missing `{name}` argument")))
}
