//! Fragment parsing, node construction and serialization.
//!
//! `Html` is not `Send`, so nothing in here is async: callers parse, drop,
//! await, then parse again to apply.

use scraper::node::Element;
use scraper::{Html, Node, Selector};
use std::sync::LazyLock;

use super::links::CANDIDATES;
use prefixer_core::Error;

pub const ICON_CLASS: &str = "favicon-prefix";
pub const WRAPPER_CLASS: &str = "favicon-nowrap";

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("invalid selector"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").expect("invalid selector"));

/// Parse `content` in body context.
///
/// Only truncated markup is a `ParseFailed`: EOF inside a tag, comment or
/// attribute, or a non-optional element still open at the end. Prose-level
/// slips (a bare `&`, a stray `<`, duplicate attributes, stray end tags)
/// are recovered the way browsers recover them.
pub fn parse_fragment(content: &str) -> Result<Html, Error> {
    let html = Html::parse_fragment(content);
    if let Some(error) = html.errors.iter().find(|e| is_structural(e)) {
        return Err(Error::ParseFailed(error.to_string()));
    }
    if !html.errors.is_empty() {
        tracing::debug!(errors = html.errors.len(), first = %html.errors[0], "recovered from parser errors");
    }
    Ok(html)
}

fn is_structural(error: &str) -> bool {
    error.starts_with("Saw EOF in state")
        || error == "Unexpected EOF"
        || (error.starts_with("Unexpected open tag") && error.ends_with("at end of body"))
}

/// Decorate the candidate anchors of `content`.
///
/// `icons[i]` is the icon URL for the i-th candidate anchor in document
/// order; `None` leaves that anchor alone. Each decorated anchor gets
/// `<img src=.. class="favicon-prefix" alt="">` as its first child and is
/// wrapped in `<span class="favicon-nowrap">`. The tree is serialized once.
pub fn decorate(content: &str, icons: &[Option<String>]) -> Result<String, Error> {
    let mut html = parse_fragment(content)?;

    let anchors: Vec<_> = html.select(&CANDIDATES).map(|anchor| anchor.id()).collect();
    if anchors.len() != icons.len() {
        return Err(Error::ParseFailed(format!(
            "expected {} candidate links, found {}",
            icons.len(),
            anchors.len()
        )));
    }

    let wrapper = template_element(&format!(r#"<span class="{WRAPPER_CLASS}"></span>"#), &SPAN)?;

    for (anchor_id, icon) in anchors.into_iter().zip(icons) {
        let Some(icon) = icon else {
            continue;
        };

        let img = icon_element(icon)?;
        let img_id = html.tree.orphan(Node::Element(img)).id();
        let span_id = html.tree.orphan(Node::Element(wrapper.clone())).id();

        let Some(mut anchor) = html.tree.get_mut(anchor_id) else {
            continue;
        };
        anchor.prepend_id(img_id);
        anchor.insert_id_before(span_id);

        if let Some(mut span) = html.tree.get_mut(span_id) {
            span.append_id(anchor_id);
        }
    }

    Ok(html.root_element().inner_html())
}

fn icon_element(src: &str) -> Result<Element, Error> {
    let markup = format!(
        r#"<img src="{}" class="{ICON_CLASS}" alt="">"#,
        html_escape::encode_double_quoted_attribute(src)
    );
    template_element(&markup, &IMG)
}

/// Build a detached element by parsing a one-element template.
fn template_element(markup: &str, selector: &Selector) -> Result<Element, Error> {
    Html::parse_fragment(markup)
        .select(selector)
        .next()
        .map(|element| element.value().clone())
        .ok_or_else(|| Error::ParseFailed(format!("template yielded no element: {markup}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment_accepts_wellformed() {
        assert!(parse_fragment("<article><p>Visit <a href=\"https://example.com\">site</a></p></article>").is_ok());
        assert!(parse_fragment("<p>one<p>two, left open").is_ok());
        assert!(parse_fragment("plain text").is_ok());
    }

    #[test]
    fn test_parse_fragment_rejects_truncated() {
        for input in [
            "<p>Visit <a href=\"https://example.com\">site</a",
            "<p><a href=\"https://example.com",
            "<div><a href=\"https://x.test\">x</a>",
            "<p>text <!-- unfinished",
        ] {
            assert!(matches!(parse_fragment(input), Err(Error::ParseFailed(_))), "{input}");
        }
    }

    #[test]
    fn test_parse_fragment_recovers_prose_errors() {
        for input in [
            "<p>&copy 2024 <a href=\"https://example.com\">site</a></p>",
            "<p>Tom &amp Jerry <a href=\"https://example.com\">site</a></p>",
            "<p>a < b <a href=\"https://example.com\">site</a></p>",
            "<a href=\"https://example.com\" class=\"x\" class=\"y\">site</a>",
            "<div/><p><a href=\"https://example.com\">site</a></p></div>",
            "</section>text",
        ] {
            let html = parse_fragment(input).unwrap_or_else(|e| panic!("{input}: {e}"));
            assert!(!html.errors.is_empty(), "{input} should have needed recovery");
        }
    }

    #[test]
    fn test_decorate_wraps_and_prepends() {
        let out = decorate(
            r#"<p>See <a href="https://example.com" title="t">site</a>.</p>"#,
            &[Some("https://blog.test/uploads/favicons/example.com.png".into())],
        )
        .unwrap();

        assert_eq!(
            out,
            r#"<p>See <span class="favicon-nowrap"><a href="https://example.com" title="t"><img src="https://blog.test/uploads/favicons/example.com.png" class="favicon-prefix" alt="">site</a></span>.</p>"#
        );
    }

    #[test]
    fn test_decorate_skips_none_entries() {
        let out = decorate(
            r#"<a href="https://a.test">a</a><a href="https://b.test">b</a>"#,
            &[None, Some("https://cdn.test/b.png".into())],
        )
        .unwrap();

        assert!(out.starts_with(r#"<a href="https://a.test">a</a><span class="favicon-nowrap">"#));
        assert_eq!(out.matches(ICON_CLASS).count(), 1);
    }

    #[test]
    fn test_decorate_escapes_icon_url() {
        let out = decorate(r#"<a href="https://a.test">a</a>"#, &[Some("https://cdn.test/x.png?a=1&b=\"2\"".into())]).unwrap();
        assert!(out.contains(r#"src="https://cdn.test/x.png?a=1&amp;b=&quot;2&quot;""#));
    }

    #[test]
    fn test_decorate_rejects_mismatched_plan() {
        let result = decorate(r#"<a href="https://a.test">a</a>"#, &[]);
        assert!(matches!(result, Err(Error::ParseFailed(_))));
    }
}
