//! The classifier itself.

use crate::ParsedLink;

/// Query parameter names that may carry a referral code.
const REFERRAL_PARAMS: [&str; 4] = ["code", "ref", "referral", "referralCode"];

/// Classify a raw URL into a deep-link intent.
///
/// Returns `None` for empty input and for anything that matches no rule.
/// Never panics: malformed URLs are handled by tolerant splitting rather
/// than a fallible parser.
pub fn parse(raw: &str) -> Option<ParsedLink> {
    let url = raw.trim();
    if url.is_empty() {
        return None;
    }

    // Auth markers are substring checks so they survive links whose token
    // material lives in a hash fragment or a structurally odd scheme URL.
    if url.contains("code=")
        || url.contains("access_token=")
        || url.contains("type=recovery")
        || url.contains("auth-callback")
    {
        return Some(ParsedLink::Auth {
            raw: url.to_string(),
        });
    }

    let (path, query) = path_and_query(url);

    if let Some(code) = referral_code(&path, &query) {
        return Some(ParsedLink::Referral {
            code,
            raw: url.to_string(),
        });
    }

    if let Some(id) = content_id(&path, "post") {
        return Some(ParsedLink::Post {
            id: id.to_string(),
            raw: url.to_string(),
        });
    }

    if let Some(id) = content_id(&path, "reel") {
        return Some(ParsedLink::Reel {
            id: id.to_string(),
            raw: url.to_string(),
        });
    }

    None
}

/// Extract a single query parameter value from a raw URL, if present.
///
/// Tolerant of malformed input; fragments are ignored.
pub fn query_param(raw: &str, name: &str) -> Option<String> {
    let (_, query) = path_and_query(raw.trim());
    lookup_param(&query, name)
}

/// Split a raw URL into (path, query), tolerating malformed input.
///
/// For web URLs the authority is dropped; for custom-scheme links the
/// "host" is really the first path segment (`committed://post/9` routes
/// to `/post/9`), so it is folded back into the path.
fn path_and_query(url: &str) -> (String, String) {
    let (scheme, rest) = match url.find("://") {
        Some(i) => (&url[..i], &url[i + 3..]),
        None => ("", url),
    };

    let rest = rest.split('#').next().unwrap_or("");
    let (before_query, query) = match rest.find('?') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, ""),
    };

    let path = if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
        match before_query.find('/') {
            Some(i) => before_query[i..].to_string(),
            None => String::new(),
        }
    } else if scheme.is_empty() {
        if before_query.starts_with('/') {
            before_query.to_string()
        } else {
            format!("/{before_query}")
        }
    } else {
        format!("/{}", before_query.trim_start_matches('/'))
    };

    (path, query.to_string())
}

/// Look up a query parameter by exact name.
fn lookup_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?;
        if key == name {
            let value = parts.next().unwrap_or("");
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// A referral code is recognized only on the pages that legitimately
/// carry one: a referral page, or the landing/auth/signup surfaces where
/// codes get dropped before the user has an account.
fn referral_code(path: &str, query: &str) -> Option<String> {
    let normalized = path.trim_end_matches('/');
    let eligible_path = path.contains("referral")
        || normalized.is_empty()
        || normalized == "/auth"
        || normalized == "/signup";
    if !eligible_path {
        return None;
    }

    REFERRAL_PARAMS
        .iter()
        .find_map(|name| lookup_param(query, name))
}

/// Match `/<kind>/<id>` with exactly one identifier segment.
fn content_id<'a>(path: &'a str, kind: &str) -> Option<&'a str> {
    let mut segments = path.split('/');
    // Leading slash yields an empty first segment.
    if !segments.next()?.is_empty() {
        return None;
    }
    if segments.next()? != kind {
        return None;
    }
    let id = segments.next()?;
    if segments.next().is_some() {
        return None;
    }
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(id)
}
