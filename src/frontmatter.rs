use anyhow::anyhow;

const MARKER: &str = "+++";

/// Splits a content file into its TOML front matter and the remaining body.
/// Files that don't open with a `+++` marker get default front matter.
pub fn parse<D>(data: &str) -> anyhow::Result<(D, &str)>
where
    D: serde::de::DeserializeOwned + Default,
{
    let Some(rest) = data.trim_start_matches('\u{feff}').strip_prefix(MARKER) else {
        return Ok((D::default(), data));
    };

    let end = rest
        .find(MARKER)
        .ok_or_else(|| anyhow!("unterminated frontmatter"))?;

    let frontmatter = &rest[..end];
    let extra = &rest[end + MARKER.len()..];

    Ok((toml::from_str::<D>(frontmatter.trim())?, extra.trim_start()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize, Default, Debug, PartialEq)]
    struct Meta {
        title: Option<String>,
    }

    #[test]
    fn splits_frontmatter_and_body() {
        let (meta, body) =
            parse::<Meta>("+++\ntitle = \"Getting started\"\n+++\n\n# Hello\n").unwrap();

        assert_eq!(meta.title.as_deref(), Some("Getting started"));
        assert_eq!(body, "# Hello\n");
    }

    #[test]
    fn missing_frontmatter_uses_defaults() {
        let (meta, body) = parse::<Meta>("<p>Hello</p>").unwrap();

        assert_eq!(meta, Meta::default());
        assert_eq!(body, "<p>Hello</p>");
    }

    #[test]
    fn unterminated_frontmatter_is_an_error() {
        let err = parse::<Meta>("+++\ntitle = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn empty_body_is_allowed() {
        let (meta, body) = parse::<Meta>("+++\ntitle = \"Empty\"\n+++\n").unwrap();

        assert_eq!(meta.title.as_deref(), Some("Empty"));
        assert_eq!(body, "");
    }
}
