use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub trait SecretsProvider {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str);

    fn get_token_option_pair<'a>(&'a self) -> (Option<&'a str>, Option<&'a str>);
}

/// Token state of a client.
///
/// Transitions are driven by the client only:
/// `Unauthenticated -> RequestToken -> AccessToken`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Unauthenticated,
    /// Mid-handshake. The secret arrives with the request token response,
    /// the token itself only comes back with the user's callback.
    RequestToken {
        token: Option<String>,
        secret: Option<String>,
    },
    AccessToken { token: String, secret: String },
}

impl Session {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Session::AccessToken { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Unauthenticated => None,
            Session::RequestToken { token, .. } => token.as_deref(),
            Session::AccessToken { token, .. } => Some(token),
        }
    }

    pub fn secret(&self) -> Option<&str> {
        match self {
            Session::Unauthenticated => None,
            Session::RequestToken { secret, .. } => secret.as_deref(),
            Session::AccessToken { secret, .. } => Some(secret),
        }
    }
}

/// Consumer credentials together with the current session.
#[derive(Debug, Clone)]
pub struct Secrets {
    consumer_key: String,
    consumer_secret: String,
    session: Session,
}

impl Secrets {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Result<Self>
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        let consumer_key = consumer_key.into();
        let consumer_secret = consumer_secret.into();
        if consumer_key.is_empty() {
            return Err(Error::Configuration("consumer key is empty".into()));
        }
        if consumer_secret.is_empty() {
            return Err(Error::Configuration("consumer secret is empty".into()));
        }
        Ok(Secrets {
            consumer_key,
            consumer_secret,
            session: Session::Unauthenticated,
        })
    }

    /// Seed an already issued access token, skipping the handshake.
    pub fn token<TKey, TSecret>(self, token: TKey, token_secret: TSecret) -> Result<Self>
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        let token = token.into();
        let secret = token_secret.into();
        if token.is_empty() || secret.is_empty() {
            return Err(Error::Configuration(
                "access token and token secret must both be set".into(),
            ));
        }
        Ok(Secrets {
            session: Session::AccessToken { token, secret },
            ..self
        })
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// View of these secrets without any token, as used for the request
    /// token step.
    pub fn consumer_only(&self) -> ConsumerOnly<'_> {
        ConsumerOnly(self)
    }

    pub(crate) fn request_token_obtained(&mut self, secret: String) {
        self.session = Session::RequestToken {
            token: None,
            secret: Some(secret),
        };
    }

    /// Install the token returned on the callback next to the stored request
    /// secret.
    pub(crate) fn request_token_returned(&mut self, token: String) {
        let secret = match &self.session {
            Session::RequestToken { secret, .. } => secret.clone(),
            _ => None,
        };
        self.session = Session::RequestToken {
            token: Some(token),
            secret,
        };
    }

    pub(crate) fn access_token_obtained(&mut self, token: String, secret: String) {
        self.session = Session::AccessToken { token, secret };
    }
}

impl SecretsProvider for Secrets {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn get_token_option_pair<'a>(&'a self) -> (Option<&'a str>, Option<&'a str>) {
        (self.session.token(), self.session.secret())
    }
}

pub struct ConsumerOnly<'a>(&'a Secrets);

impl SecretsProvider for ConsumerOnly<'_> {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str) {
        self.0.get_consumer_key_pair()
    }

    fn get_token_option_pair<'a>(&'a self) -> (Option<&'a str>, Option<&'a str>) {
        (None, None)
    }
}
