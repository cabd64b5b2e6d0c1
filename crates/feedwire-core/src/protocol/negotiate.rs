//! Format negotiation via the `format` query parameter.
//!
//! Advisory only: servers may honor it for their outbound stream, while the
//! decode path always auto-detects.

use url::Url;

use crate::error::{FeedError, Result};
use crate::protocol::format::Format;

/// Query parameter carrying the preferred outbound format.
pub const FORMAT_PARAM: &str = "format";

/// Build the socket URL for `base` with the preferred `format`.
///
/// `http`/`https` bases are rewritten to `ws`/`wss`. An existing `format`
/// pair is replaced; other query pairs are kept in order.
pub fn ws_url(base: &str, format: Format) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| FeedError::BadRequest(format!("invalid url {base:?}: {e}")))?;

    let scheme = match url.scheme() {
        "http" => Some("ws"),
        "https" => Some("wss"),
        "ws" | "wss" => None,
        other => {
            return Err(FeedError::BadRequest(format!(
                "unsupported url scheme: {other}"
            )))
        }
    };
    if let Some(s) = scheme {
        url.set_scheme(s)
            .map_err(|_| FeedError::BadRequest(format!("cannot switch {base:?} to {s}")))?;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != FORMAT_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(FORMAT_PARAM, format.as_str());

    Ok(url)
}

/// Read the preferred format back from a raw query string.
///
/// Missing or unknown values yield `None`; the last `format` pair wins.
pub fn requested_format(query: &str) -> Option<Format> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| k == FORMAT_PARAM)
        .filter_map(|(_, v)| v.parse::<Format>().ok())
        .last()
}
