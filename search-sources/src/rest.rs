//! Thin client for the PostgREST-style backend shared by the table sources.

use pinmap_search_core::SourceError;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::config::SourcesConfig;

const APIKEY: HeaderName = HeaderName::from_static("apikey");

#[derive(Clone, Debug)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(http: reqwest::Client, config: &SourcesConfig) -> Self {
        Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            api_key: config.backend_api_key.clone(),
        }
    }

    /// `GET /rest/v1/{table}` with the given query pairs, decoded as rows.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> Result<Vec<T>, SourceError> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        trace!(%url, ?query, "backend select");
        let resp = self
            .http
            .get(url)
            .headers(self.headers(bearer)?)
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        read_json(resp).await
    }

    fn headers(&self, bearer: Option<&str>) -> Result<HeaderMap, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if !self.api_key.is_empty() {
            headers.insert(APIKEY, header_value(&self.api_key)?);
        }
        if let Some(token) = bearer {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        }
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, SourceError> {
    HeaderValue::from_str(value)
        .map_err(|e| SourceError::Config(format!("invalid header value: {e}")))
}

pub(crate) fn transport(err: reqwest::Error) -> SourceError {
    SourceError::Transport(err.to_string())
}

/// Maps a non-success status to [`SourceError::Status`] and decodes the body
/// otherwise.
pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, SourceError> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
}

/// Row ids come back as numbers or strings depending on the table.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RowId {
        Text(String),
        Number(i64),
    }

    Ok(match RowId::deserialize(deserializer)? {
        RowId::Text(id) => id,
        RowId::Number(id) => id.to_string(),
    })
}

/// Strips characters that carry meaning inside a PostgREST filter value,
/// including the `ilike` wildcard `_` and escape `\`.
pub fn sanitize_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, '*' | ',' | '(' | ')' | '%' | '_' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `*term*` containment pattern for `ilike` filters.
pub(crate) fn contains_pattern(term: &str) -> String {
    format!("*{}*", sanitize_term(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_strips_filter_metacharacters() {
        assert_eq!(sanitize_term("a*b,c(d)e%f"), "abcdef");
        assert_eq!(sanitize_term("  main st  "), "main st");
        assert_eq!(sanitize_term("(*)"), "");
    }

    #[test]
    fn test_sanitize_strips_like_wildcard_and_escape() {
        assert_eq!(sanitize_term("a_b"), "ab");
        assert_eq!(sanitize_term(r"lake\_loon"), "lakeloon");
        assert_eq!(sanitize_term("\\"), "");
    }

    #[test]
    fn test_contains_pattern_wraps_sanitized_term() {
        assert_eq!(contains_pattern("lake,*"), "*lake*");
    }
}
