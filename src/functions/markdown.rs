use std::collections::HashMap;

use pulldown_cmark::html;

/// `{{ text | markdown }}`; with `inline=true` a single paragraph is
/// rendered without its `<p>` wrapper, for use inside links and list items.
pub struct Markdown {}

impl tera::Filter for Markdown {
    fn filter(
        &self,
        value: &tera::Value,
        args: &HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        let input = tera::from_value::<String>(value.clone())?;
        let inline = args
            .get("inline")
            .cloned()
            .map(tera::from_value::<bool>)
            .transpose()?
            .unwrap_or(false);

        let mut contents = String::new();
        html::push_html(&mut contents, pulldown_cmark::Parser::new(&input));

        if inline {
            let trimmed = contents.trim_end();
            if let Some(paragraph) = trimmed
                .strip_prefix("<p>")
                .and_then(|s| s.strip_suffix("</p>"))
                .filter(|s| !s.contains("<p>"))
            {
                contents = paragraph.to_string();
            }
        }

        Ok(tera::to_value(contents)?)
    }

    fn is_safe(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use tera::Filter;

    use super::*;

    fn render(text: &str, inline: bool) -> tera::Value {
        let args = HashMap::from([("inline".to_string(), tera::to_value(inline).unwrap())]);
        Markdown {}
            .filter(&tera::to_value(text).unwrap(), &args)
            .unwrap()
    }

    #[test]
    fn renders_markdown_text() {
        assert_eq!(
            render("Maps *documents* to objects", false),
            tera::to_value("<p>Maps <em>documents</em> to objects</p>\n").unwrap()
        );
    }

    #[test]
    fn inline_drops_single_paragraph_wrapper() {
        assert_eq!(
            render("Maps *documents* to objects", true),
            tera::to_value("Maps <em>documents</em> to objects").unwrap()
        );
    }

    #[test]
    fn inline_keeps_multiple_paragraphs() {
        assert_eq!(
            render("one\n\ntwo", true),
            tera::to_value("<p>one</p>\n<p>two</p>\n").unwrap()
        );
    }
}
