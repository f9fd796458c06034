//! Parsing of the `Authorization` header used by the API.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use crate::Error;

/// The authentication scheme expected in the `Authorization` header.
pub const API_KEY_SCHEME: &str = "ApiKey";

/// The username and API key sent with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyCredentials {
    /// The username of the account the key belongs to.
    pub username: String,
    /// The API key issued to the account.
    pub api_key: String,
}

impl ApiKeyCredentials {
    /// Read the credentials from a header value of the form `ApiKey <username>:<api_key>`.
    ///
    /// The scheme is matched case-insensitively. Only the first colon separates the username
    /// from the key.
    ///
    /// # Errors
    /// Returns [Error::InvalidApiKey] if the value does not have the expected form.
    pub fn parse(header_value: &str) -> Result<Self, Error> {
        let (scheme, credentials) = header_value
            .trim()
            .split_once(' ')
            .ok_or(Error::InvalidApiKey)?;

        if !scheme.eq_ignore_ascii_case(API_KEY_SCHEME) {
            return Err(Error::InvalidApiKey);
        }

        let (username, api_key) = credentials
            .trim()
            .split_once(':')
            .ok_or(Error::InvalidApiKey)?;

        if username.is_empty() || api_key.is_empty() {
            return Err(Error::InvalidApiKey);
        }

        Ok(Self {
            username: username.to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    /// Get the credentials from the `Authorization` header.
    ///
    /// # Errors
    /// Returns [Error::MissingApiKey] if there is no `Authorization` header, or
    /// [Error::InvalidApiKey] if the header is malformed.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, Error> {
        let header_value = headers.get(AUTHORIZATION).ok_or(Error::MissingApiKey)?;
        let header_value = header_value.to_str().map_err(|_| Error::InvalidApiKey)?;

        Self::parse(header_value)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

    use crate::{Error, auth::credentials::ApiKeyCredentials};

    #[test]
    fn parses_username_and_key() {
        let got = ApiKeyCredentials::parse("ApiKey jamesl:0123abcd").unwrap();

        assert_eq!(
            got,
            ApiKeyCredentials {
                username: "jamesl".to_owned(),
                api_key: "0123abcd".to_owned()
            }
        );
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert!(ApiKeyCredentials::parse("apikey jamesl:0123abcd").is_ok());
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            ApiKeyCredentials::parse("Bearer jamesl:0123abcd"),
            Err(Error::InvalidApiKey)
        );
    }

    #[test]
    fn rejects_missing_parts() {
        for value in ["ApiKey", "ApiKey jamesl", "ApiKey :0123abcd", "ApiKey jamesl:"] {
            assert_eq!(
                ApiKeyCredentials::parse(value),
                Err(Error::InvalidApiKey),
                "want {value:?} to be rejected"
            );
        }
    }

    #[test]
    fn missing_header_is_reported() {
        let headers = HeaderMap::new();

        assert_eq!(
            ApiKeyCredentials::from_headers(&headers),
            Err(Error::MissingApiKey)
        );
    }

    #[test]
    fn reads_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static("ApiKey jamesl:0123abcd"),
        );

        let got = ApiKeyCredentials::from_headers(&headers).unwrap();

        assert_eq!(got.username, "jamesl");
        assert_eq!(got.api_key, "0123abcd");
    }
}
