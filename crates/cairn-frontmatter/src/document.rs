//! Front-matter document parsing.
//!
//! A front-matter document is a text file that starts with a YAML header
//! fenced by `---` lines, followed by a free-form body:
//!
//! ```text
//! ---
//! id: ISS-1
//! title: Fix the login form
//! ---
//!
//! Body text in any format.
//! ```
//!
//! The header is deserialized into any [`DeserializeOwned`] type. Whether
//! unknown keys are rejected or kept is up to that type: a header struct
//! with a `#[serde(flatten)]` map keeps them, which is how forward-compatible
//! readers are written.
//!
//! # Examples
//!
//! ```
//! use cairn_frontmatter::document::parse_document;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Header {
//!     id: String,
//! }
//!
//! let doc = parse_document::<Header>("---\nid: ISS-1\n---\nHello\n").unwrap();
//! assert_eq!(doc.header.id, "ISS-1");
//! assert_eq!(doc.body, "Hello\n");
//! ```

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Opening and closing fence of the header block.
const FENCE: &str = "---";

/// YAML document-end marker, accepted as an alternative closing fence.
const DOCUMENT_END: &str = "...";

/// A parsed front-matter document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<H> {
    /// The deserialized header.
    pub header: H,
    /// Everything after the closing fence.
    pub body: String,
}

/// Splits a document into its raw header and body.
///
/// The first line must be `---`. The header runs until the next line that is
/// exactly `---` or `...` (trailing whitespace and `\r` are ignored). If the
/// body starts with a blank line, that single line break is dropped so that
/// the conventional `---\n\nBody` layout yields `Body`.
///
/// A leading UTF-8 byte order mark is ignored.
///
/// # Errors
///
/// - [`Error::MissingHeader`] if the first line is not a fence
/// - [`Error::UnterminatedHeader`] if no closing fence is found
pub fn split_front_matter(text: &str) -> Result<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines = text.split_inclusive('\n');
    let first = lines.next().ok_or(Error::MissingHeader)?;
    if first.trim_end() != FENCE {
        return Err(Error::MissingHeader);
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == FENCE || trimmed == DOCUMENT_END {
            let header = &text[header_start..offset];
            let rest = &text[offset + line.len()..];
            let body = rest
                .strip_prefix("\r\n")
                .or_else(|| rest.strip_prefix('\n'))
                .unwrap_or(rest);
            return Ok((header, body));
        }
        offset += line.len();
    }

    Err(Error::UnterminatedHeader)
}

/// Parses a front-matter document from a string.
///
/// # Errors
///
/// Returns an error if the header cannot be located (see
/// [`split_front_matter`]) or does not deserialize into `H`.
pub fn parse_document<H: DeserializeOwned>(text: &str) -> Result<Document<H>> {
    let (header, body) = split_front_matter(text)?;
    let header = serde_yaml::from_str(header)?;
    Ok(Document {
        header,
        body: body.to_string(),
    })
}

/// Reads and parses a front-matter document from a file.
///
/// The file is read in full; front-matter documents are small by nature.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, or any error from
/// [`parse_document`].
pub async fn read_document<H, P>(path: P) -> Result<Document<H>>
where
    H: DeserializeOwned,
    P: AsRef<Path>,
{
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    parse_document(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Header {
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(flatten)]
        extra: BTreeMap<String, serde_yaml::Value>,
    }

    #[test]
    fn split_basic_document() {
        let (header, body) = split_front_matter("---\nid: a\n---\nbody\n").unwrap();
        assert_eq!(header, "id: a\n");
        assert_eq!(body, "body\n");
    }

    #[test]
    fn split_drops_one_blank_line_after_fence() {
        let (_, body) = split_front_matter("---\nid: a\n---\n\n\nbody").unwrap();
        assert_eq!(body, "\nbody");
    }

    #[test]
    fn split_accepts_crlf() {
        let (header, body) = split_front_matter("---\r\nid: a\r\n---\r\n\r\nbody\r\n").unwrap();
        assert_eq!(header, "id: a\r\n");
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn split_accepts_document_end_marker() {
        let (header, body) = split_front_matter("---\nid: a\n...\nbody").unwrap();
        assert_eq!(header, "id: a\n");
        assert_eq!(body, "body");
    }

    #[test]
    fn split_ignores_byte_order_mark() {
        let (header, _) = split_front_matter("\u{feff}---\nid: a\n---\n").unwrap();
        assert_eq!(header, "id: a\n");
    }

    #[test]
    fn split_closing_fence_at_end_of_file() {
        let (header, body) = split_front_matter("---\nid: a\n---").unwrap();
        assert_eq!(header, "id: a\n");
        assert_eq!(body, "");
    }

    #[rstest]
    #[case::empty("")]
    #[case::no_fence("id: a\n")]
    #[case::fence_not_first("\n---\nid: a\n---\n")]
    #[case::indented_fence("  ---\nid: a\n---\n")]
    fn split_rejects_missing_header(#[case] text: &str) {
        assert!(matches!(
            split_front_matter(text),
            Err(Error::MissingHeader)
        ));
    }

    #[test]
    fn split_rejects_unterminated_header() {
        assert!(matches!(
            split_front_matter("---\nid: a\ntitle: b\n"),
            Err(Error::UnterminatedHeader)
        ));
    }

    #[test]
    fn parse_keeps_unknown_keys() {
        let doc =
            parse_document::<Header>("---\nid: a\ntitle: T\ngithub: 42\n---\nbody").unwrap();
        assert_eq!(doc.header.id, "a");
        assert_eq!(doc.header.title.as_deref(), Some("T"));
        assert_eq!(
            doc.header.extra.get("github").and_then(serde_yaml::Value::as_u64),
            Some(42)
        );
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn parse_reports_yaml_errors() {
        let result = parse_document::<Header>("---\nid: [unclosed\n---\n");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }

    #[test]
    fn parse_reports_missing_required_field() {
        let result = parse_document::<Header>("---\ntitle: T\n---\n");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }

    #[tokio::test]
    async fn read_document_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        tokio::fs::write(&path, "---\nid: x\n---\n# Heading\n")
            .await
            .unwrap();

        let doc = read_document::<Header, _>(&path).await.unwrap();
        assert_eq!(doc.header.id, "x");
        assert_eq!(doc.body, "# Heading\n");
    }

    #[tokio::test]
    async fn read_document_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_document::<Header, _>(dir.path().join("absent.md")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
