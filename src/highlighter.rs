use std::path::Path;

use anyhow::anyhow;
use syntect::{
    highlighting::{Theme, ThemeSet},
    html::highlighted_html_for_string,
    parsing::SyntaxSet,
};

pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    /// Loads the default syntaxes plus any `.sublime-syntax` files found in
    /// `syntax_dir`, which may not exist.
    pub fn new(syntax_dir: &Path, theme_name: &str) -> anyhow::Result<Self> {
        let mut syntax_set_builder = SyntaxSet::load_defaults_newlines().into_builder();
        if syntax_dir.is_dir() {
            syntax_set_builder.add_from_folder(syntax_dir, true)?;
        }
        let syntax_set = syntax_set_builder.build();

        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(theme_name)
            .ok_or_else(|| anyhow!("unknown highlight theme '{theme_name}'"))?;

        Ok(Self { syntax_set, theme })
    }

    pub fn highlight(&self, lang: &str, input: &str) -> anyhow::Result<String> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        Ok(highlighted_html_for_string(
            input,
            &self.syntax_set,
            syntax,
            &self.theme,
        )?)
    }
}
