use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    TokenReaderError, TokenReaderResult, AUTHENTICATION_URL_KEY, OAUTH_TOKEN_KEY,
    OAUTH_TOKEN_SECRET_KEY,
};

/// Represents response of token acquisition.
#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    /// OAuth Token
    pub oauth_token: String,
    /// OAuth Token Secret
    pub oauth_token_secret: String,
    /// Other contents
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

impl TokenResponse {
    /// Where the user has to go to authorize the request token.
    pub fn authentication_url(&self) -> Option<&str> {
        self.remain
            .get(AUTHENTICATION_URL_KEY)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// Read the fields of a token endpoint response.
///
/// The provider answers `application/x-www-form-urlencoded`; a JSON object
/// body is accepted as well.
pub fn read_token_fields(text: &str) -> HashMap<String, String> {
    if text.trim_start().starts_with('{') {
        if let Ok(object) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(text)
        {
            return object
                .into_iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => (k, s),
                    other => (k, other.to_string()),
                })
                .collect();
        }
    }
    url::form_urlencoded::parse(text.trim().as_bytes())
        .into_owned()
        .collect()
}

pub fn read_oauth_token(text: &str) -> TokenReaderResult<TokenResponse> {
    let mut destructured = read_token_fields(text);
    let oauth_token = destructured.remove(OAUTH_TOKEN_KEY);
    let oauth_token_secret = destructured.remove(OAUTH_TOKEN_SECRET_KEY);
    match (oauth_token, oauth_token_secret) {
        (Some(t), Some(s)) => Ok(TokenResponse {
            oauth_token: t,
            oauth_token_secret: s,
            remain: destructured,
        }),
        (None, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_KEY,
            text.to_string(),
        )),
        (_, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_SECRET_KEY,
            text.to_string(),
        )),
    }
}
