//! Domain to file name mapping.

use regex::Regex;
use std::sync::LazyLock;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}.-]").expect("valid regex"));
static UNDERSCORE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").expect("valid regex"));

/// Make `domain` safe to use as a file name while keeping its dots.
///
/// Everything except letters and decimal digits of any script, `.` and `-`
/// becomes `_` (this covers `< > : " | ? * \ /` and spaces). Runs of `_`
/// collapse to one and leading or trailing `_` are trimmed.
pub fn sanitize_domain_filename(domain: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(domain, "_");
    let collapsed = UNDERSCORE_RUNS.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}
