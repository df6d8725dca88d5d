//! Candidate selection and per-link eligibility.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::domain::DomainResolver;

/// Anchors worth looking at: an `href`, no `nofavicon` rel, not yet decorated.
pub static CANDIDATES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href]:not([rel*="nofavicon"]):not([data-has-favicon])"#).expect("invalid selector")
});

static IMAGES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("invalid selector"));

/// Why a link is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    AlreadyDecorated,
    ContainsImage,
    EmptyHref,
    Internal,
    InvalidUrl,
}

/// Apply the eligibility rules to one anchor, in order.
///
/// Returns the trimmed href the favicon should be resolved for.
pub fn check_link(anchor: ElementRef<'_>, ignore_internal: bool, resolver: &DomainResolver) -> Result<String, Skip> {
    let element = anchor.value();

    if element.attr("data-has-favicon").is_some() {
        return Err(Skip::AlreadyDecorated);
    }

    if anchor.select(&IMAGES).next().is_some() {
        return Err(Skip::ContainsImage);
    }

    let href = element.attr("href").unwrap_or_default().trim();
    if href.is_empty() {
        return Err(Skip::EmptyHref);
    }

    if ignore_internal {
        if !resolver.is_external_url(href) {
            return Err(Skip::Internal);
        }
    } else if !resolver.is_valid_url(href) {
        return Err(Skip::InvalidUrl);
    }

    Ok(href.to_string())
}

/// One entry per candidate anchor in document order: the href to decorate,
/// or `None` when the anchor is skipped.
pub fn plan_links(html: &Html, ignore_internal: bool, resolver: &DomainResolver) -> Vec<Option<String>> {
    let plan: Vec<Option<String>> = html
        .select(&CANDIDATES)
        .map(|anchor| match check_link(anchor, ignore_internal, resolver) {
            Ok(href) => Some(href),
            Err(reason) => {
                tracing::debug!(href = anchor.value().attr("href").unwrap_or_default(), ?reason, "skipping link");
                None
            }
        })
        .collect();

    tracing::debug!(candidates = plan.len(), eligible = plan.iter().flatten().count(), "planned links");
    plan
}
