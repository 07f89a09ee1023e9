//! Reply contract and normalization of whatever the model sent back.

use reqwest::Url;
use serde::{Deserialize, Serialize, de};
use serde_json::Value;
use tracing::debug;

use crate::errors::ConciergeError;

/// Sentinel for "no link".
pub const NO_LINK: &str = "none";

/// Search-engine click-through wrappers: host match, path prefix, and the
/// query parameters that carry the real destination.
struct Redirector {
    host: fn(&str) -> bool,
    path_prefix: &'static str,
    params: &'static [&'static str],
}

const REDIRECTORS: &[Redirector] = &[
    Redirector {
        host: is_google_host,
        path_prefix: "/url",
        params: &["q", "url"],
    },
    Redirector {
        host: |h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"),
        path_prefix: "/l/",
        params: &["uddg"],
    },
    Redirector {
        host: |h| h == "bing.com" || h.ends_with(".bing.com"),
        path_prefix: "/ck/",
        params: &["u"],
    },
];

/// Whether the knowledge document answered the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Found,
    NotFound,
}

impl Status {
    /// Case-insensitive; `SUCCESS` counts as found. Anything else, including
    /// a missing value, is `NotFound`.
    pub fn from_model(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("FOUND") | Some("SUCCESS") => Status::Found,
            _ => Status::NotFound,
        }
    }
}

/// Outbound answer. All three fields are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConciergeResponse {
    pub conversational_reply: String,
    pub status: Status,
    /// Absolute http(s) URL or [`NO_LINK`].
    pub recommended_link: String,
}

/// What the model returned, before any trust is placed in it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReply {
    #[serde(default, alias = "conversational_reply")]
    conversational_reply: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default, alias = "recommended_link")]
    recommended_link: Option<Value>,
}

/// Reads the first JSON value of the payload, skipping a BOM and anything
/// before the first `{`. Trailing fences or prose are ignored.
fn read_first_object(raw: &str) -> Result<RawReply, serde_json::Error> {
    let body = raw.trim_start_matches('\u{feff}').trim();
    let start = body.find('{').unwrap_or(0);
    serde_json::Deserializer::from_str(&body[start..])
        .into_iter::<RawReply>()
        .next()
        .unwrap_or_else(|| Err(de::Error::custom("empty payload")))
}

/// Parses and normalizes the upstream payload.
///
/// # Errors
/// [`ConciergeError::UpstreamMalformed`] if the payload is not a JSON object,
/// lacks `conversationalReply`, or is FOUND with an empty reply.
pub fn parse_reply(raw: &str, fallback_phrase: &str) -> Result<ConciergeResponse, ConciergeError> {
    let reply = read_first_object(raw).map_err(|e| {
        ConciergeError::UpstreamMalformed(format!("payload is not the expected JSON object: {e}"))
    })?;

    let status = Status::from_model(reply.status.as_ref().and_then(Value::as_str));

    let text = match reply.conversational_reply {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => {
            return Err(ConciergeError::UpstreamMalformed(
                "payload is missing `conversationalReply`".into(),
            ));
        }
        Some(other) => {
            return Err(ConciergeError::UpstreamMalformed(format!(
                "`conversationalReply` must be a string, got {other}"
            )));
        }
    };

    let conversational_reply = match (text.is_empty(), status) {
        (false, _) => text,
        (true, Status::NotFound) => fallback_phrase.to_string(),
        (true, Status::Found) => {
            return Err(ConciergeError::UpstreamMalformed(
                "`conversationalReply` is empty for a FOUND answer".into(),
            ));
        }
    };

    let recommended_link = normalize_link(
        reply.recommended_link.as_ref().and_then(Value::as_str),
        status,
    );

    Ok(ConciergeResponse {
        conversational_reply,
        status,
        recommended_link,
    })
}

/// Link rules:
/// - search-engine redirect → the wrapped target
/// - other absolute http(s) URL → unchanged
/// - anything else (blank, "none"-like, paths, free text) → [`NO_LINK`]
///
/// The result is always an absolute http(s) URL or [`NO_LINK`], whatever `status` says.
pub fn normalize_link(raw: Option<&str>, status: Status) -> String {
    let link = raw.map(str::trim).unwrap_or_default();
    match parse_http_url(link) {
        Some(url) => unwrap_redirect(&url).unwrap_or_else(|| link.to_string()),
        None => {
            if status == Status::Found && !is_no_link(link) {
                debug!(link_len = link.len(), "dropping non-URL link on a FOUND answer");
            }
            NO_LINK.to_string()
        }
    }
}

/// Follows up to three nested redirect wrappers and returns the innermost target.
///
/// Returns `None` if `url` does not wrap another http(s) URL.
pub fn unwrap_redirect(url: &Url) -> Option<String> {
    let mut current = redirect_target(url)?;
    for _ in 0..2 {
        match parse_http_url(&current).and_then(|u| redirect_target(&u)) {
            Some(next) => current = next,
            None => break,
        }
    }
    Some(current)
}

fn redirect_target(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let redirector = REDIRECTORS
        .iter()
        .find(|r| (r.host)(host.as_str()) && url.path().starts_with(r.path_prefix))?;

    url.query_pairs()
        .filter(|(k, _)| {
            let key: &str = k;
            redirector.params.contains(&key)
        })
        .map(|(_, v)| v.trim().to_string())
        .find(|v| parse_http_url(v).is_some())
}

fn parse_http_url(s: &str) -> Option<Url> {
    Url::parse(s)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

/// `google.com`, `www.google.co.uk` and the like.
fn is_google_host(host: &str) -> bool {
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.strip_prefix("google.")
        .is_some_and(|tld| !tld.is_empty() && tld.split('.').all(|p| !p.is_empty()))
}

fn is_no_link(link: &str) -> bool {
    link.is_empty()
        || ["none", "null", "n/a", "na", "-"]
            .iter()
            .any(|s| link.eq_ignore_ascii_case(s))
}
