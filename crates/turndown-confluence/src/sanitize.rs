//! Link target cleanup.
//!
//! Confluence decorates links with analytics and origin markers that are
//! meaningless outside the browser session that produced them.

use url::form_urlencoded;
use url::{ParseError, Url};

/// Query parameters stripped from every link target.
pub const TRACKING_PARAMS: &[&str] = &["atlOrigin", "focusedCommentId", "src"];

/// Remove tracking query parameters from a URL.
///
/// Remaining parameters are re-encoded in key order, so the result is stable
/// and `clean_url(clean_url(x)) == clean_url(x)`. URLs without a query are
/// returned trimmed but otherwise untouched; unparseable input is returned as
/// given.
///
/// ```rust
/// use turndown_confluence::clean_url;
///
/// assert_eq!(
///     clean_url("https://e.com/p?atlOrigin=x&keep=1"),
///     "https://e.com/p?keep=1"
/// );
/// ```
pub fn clean_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains('?') {
        return trimmed.to_string();
    }

    match Url::parse(trimmed) {
        Ok(mut url) => {
            let pairs = retained_pairs(url.query_pairs().into_owned());
            if pairs.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut().clear().extend_pairs(pairs);
            }
            url.to_string()
        }
        Err(ParseError::RelativeUrlWithoutBase) => clean_relative(trimmed),
        Err(err) => {
            tracing::trace!(url = raw, error = %err, "leaving unparseable url untouched");
            raw.to_string()
        }
    }
}

/// Relative targets (`/wiki/spaces/...`) cannot go through `Url`, so split
/// path, query and fragment by hand.
fn clean_relative(raw: &str) -> String {
    let (before_fragment, fragment) = match raw.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (raw, None),
    };
    let Some((path, query)) = before_fragment.split_once('?') else {
        return raw.to_string();
    };

    let pairs = retained_pairs(form_urlencoded::parse(query.as_bytes()).into_owned());

    let mut out = String::with_capacity(raw.len());
    out.push_str(path);
    if !pairs.is_empty() {
        out.push('?');
        out.push_str(
            &form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish(),
        );
    }
    if let Some(frag) = fragment {
        out.push('#');
        out.push_str(frag);
    }
    out
}

fn retained_pairs<I>(pairs: I) -> Vec<(String, String)>
where
    I: Iterator<Item = (String, String)>,
{
    let mut kept: Vec<(String, String)> = pairs
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_str()))
        .collect();
    // Stable: repeated keys keep their relative order
    kept.sort_by(|a, b| a.0.cmp(&b.0));
    kept
}
