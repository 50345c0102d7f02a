use anyhow::anyhow;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Tag};
use std::{ops::Range, str::FromStr};
use tera::Tera;
use url::Url;

use combine::{
    between,
    parser::{
        char::{spaces, string as Str},
        range::take_while,
        repeat::SepBy,
    },
    sep_by, EasyParser, Parser, Stream,
};

use crate::{highlighter::Highlighter, page::PartialPage};

/// How the text between shortcodes is turned into HTML.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyFormat {
    Markdown,
    /// Already marked up; copied through untouched.
    Html,
}

impl BodyFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    name: String,
    value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShortCode {
    name: String,
    arguments: Vec<Argument>,
}

pub fn lit<I>(l: &'static str) -> impl Parser<I, Output = String>
where
    I: Stream<Token = char>,
{
    Str(l).map(|s| s.to_string()).skip(spaces())
}

fn parse_shortcode(input: &str) -> anyhow::Result<ShortCode> {
    let ident = || take_while(|c: char| c.is_alphanumeric() || c == '_').skip(spaces());
    let literal_str = between(lit("\""), lit("\""), take_while(|c: char| c != '\"')).skip(spaces());
    let arg = (ident(), lit("="), literal_str).map(|t: (&str, String, &str)| Argument {
        name: t.0.to_string(),
        value: t.2.to_string(),
    });
    let arg_list: SepBy<Vec<_>, _, _> = sep_by(arg, lit(","));
    let args = between(lit("("), lit(")"), arg_list);

    let mut function = between(
        lit("{{"),
        lit("}}"),
        (ident(), args).map(|t: (&str, _)| ShortCode {
            name: t.0.to_string(),
            arguments: t.1,
        }),
    );

    let result = function
        .easy_parse(input)
        .map_err(|e| e.map_range(|r| format!("{:?}", r)))
        .map_err(|e| e.map_position(|p| p.translate_position(input)))?;

    Ok(result.0)
}

pub fn render_shortcode(input: &str, page: &PartialPage, tera: &Tera) -> anyhow::Result<String> {
    let shortcode = parse_shortcode(input)?;

    let template = tera
        .get_template_names()
        .filter_map(|name| Some((name, name.strip_prefix("shortcodes/")?)))
        .find(|(_, short_name)| {
            let stem = short_name.rsplit_once('.').map_or(*short_name, |(stem, _)| stem);
            stem == shortcode.name
        })
        .map(|(name, _)| name)
        .ok_or_else(|| anyhow!("unknown shortcode '{}'", shortcode.name))?;

    let mut ctx = tera::Context::new();

    for arg in &shortcode.arguments {
        ctx.insert(&arg.name, &arg.value);
    }

    ctx.insert("page", page);

    Ok(tera.render(template, &ctx)?)
}

pub fn render_markdown(
    input: &str,
    page: &PartialPage,
    highlighter: &Highlighter,
) -> anyhow::Result<String> {
    let mut events = vec![];

    let mut in_code_block = false;
    let mut lang = String::new();
    let mut code = String::new();

    for event in pulldown_cmark::Parser::new(input) {
        match event {
            Event::Start(Tag::Image(link_type, mut dest_url, title)) => {
                // images are copied next to the source file, and summaries
                // are shown on other pages, so links have to be absolute
                if Url::from_str(&dest_url).is_err() {
                    dest_url = page.asset_base.join(&dest_url)?.to_string().into();
                }
                events.push(Event::Start(Tag::Image(link_type, dest_url, title)));
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                lang = match kind {
                    CodeBlockKind::Fenced(name) => name.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
            }
            Event::Text(t) if in_code_block => {
                code.push_str(&t);
            }
            Event::End(Tag::CodeBlock(_)) if in_code_block => {
                let result = highlighter.highlight(&lang, &code)?;

                events.push(Event::Html(CowStr::from(result)));

                in_code_block = false;
                code.clear();
            }
            _ => events.push(event),
        }
    }

    let mut contents = String::new();
    html::push_html(&mut contents, events.into_iter());

    Ok(contents)
}

enum ContentRange {
    Text(Range<usize>),
    ShortCode(Range<usize>),
}

const HTML_CODE_TAGS: [(&str, &str); 2] = [("<pre", "</pre>"), ("<code", "</code>")];

/// Byte ranges of `input` holding code samples. Shortcodes inside them are
/// left as written.
fn code_ranges(input: &str, format: BodyFormat) -> Vec<Range<usize>> {
    match format {
        BodyFormat::Markdown => pulldown_cmark::Parser::new(input)
            .into_offset_iter()
            .filter_map(|(event, range)| match event {
                Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
                _ => None,
            })
            .collect(),
        BodyFormat::Html => html_code_ranges(input),
    }
}

fn html_code_ranges(input: &str) -> Vec<Range<usize>> {
    let mut ranges = vec![];

    let mut last = 0;
    while let Some((start, close)) = HTML_CODE_TAGS
        .iter()
        .filter_map(|(open, close)| Some((last + find_tag(&input[last..], open)?, *close)))
        .min_by_key(|(start, _)| *start)
    {
        let end = input[start..]
            .find(close)
            .map_or(input.len(), |end| start + end + close.len());
        ranges.push(start..end);
        last = end;
    }

    ranges
}

/// Position of an opening `tag` proper, so `<pre` doesn't match `<preview>`.
fn find_tag(input: &str, tag: &str) -> Option<usize> {
    input.match_indices(tag).map(|(i, _)| i).find(|&i| {
        matches!(
            input[i + tag.len()..].chars().next(),
            Some('>' | ' ' | '\t' | '\n' | '\r')
        )
    })
}

/// `{{ name(` opens a shortcode; anything else in braces is plain text,
/// such as a template variable in a Django sample.
fn opens_shortcode(input: &str) -> bool {
    let Some(rest) = input.strip_prefix("{{") else {
        return false;
    };
    let rest = rest.trim_start();
    let ident_len = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());

    ident_len > 0 && rest[ident_len..].trim_start().starts_with('(')
}

/// Renders a page body: shortcodes are expanded through their templates and
/// the text around them is rendered according to `format`.
pub fn render_content(
    input: &str,
    format: BodyFormat,
    page: &PartialPage,
    tera: &Tera,
    highlighter: &Highlighter,
) -> anyhow::Result<String> {
    let mut input = input.to_string();

    let code = code_ranges(&input, format);

    let mut ranges = vec![];

    let mut last = 0;
    let mut cursor = 0;
    while let Some(offset) = input[cursor..].find("{{") {
        let start = cursor + offset;

        if !opens_shortcode(&input[start..]) || code.iter().any(|r| r.contains(&start)) {
            cursor = start + 2;
            continue;
        }

        if start > last {
            ranges.push(ContentRange::Text(last..start));
        }

        let end = input[start..]
            .find("}}")
            .ok_or_else(|| anyhow!("unterminated shortcode"))?;

        ranges.push(ContentRange::ShortCode(start..start + end + 2));
        last = start + end + 2;
        cursor = last;
    }

    if last < input.len() {
        ranges.push(ContentRange::Text(last..input.len()))
    }

    ranges.reverse();

    for range in ranges {
        match range {
            ContentRange::Text(r) if format == BodyFormat::Markdown => input.replace_range(
                r.clone(),
                &render_markdown(&input[r.clone()], page, highlighter)?,
            ),
            ContentRange::Text(_) => {}
            ContentRange::ShortCode(r) => {
                input.replace_range(r.clone(), &render_shortcode(&input[r.clone()], page, tera)?)
            }
        }
    }

    Ok(input)
}
