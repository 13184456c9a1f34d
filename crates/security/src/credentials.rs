//! Identity headers

use http::header::AUTHORIZATION;
use http::HeaderMap;

/// Header carrying the owner UID set by the gateway
pub const OWNER_UID_HEADER: &str = "jwt-sub";
/// Header carrying the owner id when no UID is present
pub const OWNER_ID_HEADER: &str = "owner-id";

/// Identity claims carried by a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// API token from `authorization: Bearer <token>`
    pub token: Option<String>,
    /// Owner UID from `jwt-sub`
    pub owner_uid: Option<String>,
    /// Owner id from `owner-id`
    pub owner_id: Option<String>,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = single(headers, AUTHORIZATION.as_str())
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).to_string())
            .filter(|token| !token.is_empty());

        Self {
            token,
            owner_uid: single(headers, OWNER_UID_HEADER).map(str::to_string),
            owner_id: single(headers, OWNER_ID_HEADER).map(str::to_string),
        }
    }

    /// Credentials naming an owner id directly
    pub fn owner(id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.owner_uid.is_none() && self.owner_id.is_none()
    }
}

/// Value of a header that must be sent exactly once; anything else reads as absent
fn single<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let mut values = headers.get_all(name).iter();
    let value = values.next()?;
    if values.next().is_some() {
        return None;
    }
    value.to_str().ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_reads_all_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        headers.insert(OWNER_UID_HEADER, HeaderValue::from_static("7a9c"));
        headers.insert(OWNER_ID_HEADER, HeaderValue::from_static("local-user"));

        let creds = Credentials::from_headers(&headers);
        assert_eq!(creds.token.as_deref(), Some("abc123"));
        assert_eq!(creds.owner_uid.as_deref(), Some("7a9c"));
        assert_eq!(creds.owner_id.as_deref(), Some("local-user"));
    }

    #[test]
    fn test_repeated_or_empty_headers_are_absent() {
        let mut headers = HeaderMap::new();
        headers.append(OWNER_ID_HEADER, HeaderValue::from_static("a"));
        headers.append(OWNER_ID_HEADER, HeaderValue::from_static("b"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));

        let creds = Credentials::from_headers(&headers);
        assert!(creds.is_empty());
    }
}
