//! Group name templating.
//!
//! A template is literal text with any number of `%PATH%[n]` placeholders,
//! where `n` is a signed decimal integer. Each placeholder is replaced by a
//! `/`-separated segment of the path the template is evaluated against.
//!
//! # Index wrapping
//!
//! With `span = segments - 1`, an index above `span` is reduced by `span`
//! until it is no longer above it, and a negative index is raised by `span`
//! until it is no longer negative. For `Assets/Art/hero.png` (`span = 2`):
//!
//! | `n` | segment |
//! |-----|---------|
//! | 0   | `Assets` |
//! | 2   | `hero.png` |
//! | 3   | `Art` (3 - 2) |
//! | 5   | `Art` (5 - 2 - 2) |
//! | -1  | `Art` (-1 + 2) |
//! | -2  | `Assets` |
//!
//! Note this is not a plain modulo: `n == span` keeps the last segment and
//! `n == -span` lands on segment 0. A single-segment path has `span = 0`, so
//! any nonzero index is rejected with [`TemplateError::IndexDegenerate`].

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{TemplateError, TemplateResult};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%PATH%\[(-?[0-9]+)\]").expect("valid regex"));

/// Expand every `%PATH%[n]` in `template` using the segments of `path`.
///
/// Literal text around and between placeholders is kept verbatim.
pub fn resolve(template: &str, path: &str) -> TemplateResult<String> {
    let segments: Vec<&str> = path.split('/').collect();

    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        out.push_str(&template[last..whole.start]);
        out.push_str(segment_for(&caps, &segments, path)?);
        last = whole.end;
    }
    out.push_str(&template[last..]);

    Ok(out)
}

/// Returns `true` if `template` contains at least one placeholder.
pub fn has_placeholders(template: &str) -> bool {
    PLACEHOLDER_RE.is_match(template)
}

fn segment_for<'p>(
    caps: &Captures<'_>,
    segments: &[&'p str],
    path: &str,
) -> TemplateResult<&'p str> {
    let raw = &caps[1];
    let index: i64 = raw.parse().map_err(|_| TemplateError::IndexOutOfRange {
        raw: raw.to_string(),
    })?;

    let span = i64::try_from(segments.len() - 1).unwrap_or(i64::MAX);
    let wrapped = wrap_index(index, span).ok_or_else(|| TemplateError::IndexDegenerate {
        index,
        path: path.to_string(),
    })?;

    // `wrap_index` keeps the result in 0..=span.
    let slot = usize::try_from(wrapped).unwrap_or_default();
    Ok(segments[slot])
}

/// Wrap `index` into `0..=span`.
///
/// Same result as repeatedly subtracting `span` while `index > span` and
/// adding `span` while `index < 0`, computed without the loop. Returns `None`
/// when that loop would never finish (`span == 0` with a nonzero index).
pub fn wrap_index(index: i64, span: i64) -> Option<i64> {
    if span == 0 {
        return (index == 0).then_some(0);
    }
    let wrapped = if index > span {
        (index - 1).rem_euclid(span) + 1
    } else if index < 0 {
        index.rem_euclid(span)
    } else {
        index
    };
    Some(wrapped)
}
