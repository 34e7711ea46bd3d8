use std::{collections::HashMap, time::Duration};

use http::Method;
use serde_json::Value;
use url::Url;

use crate::{
    config::EnvSettings,
    request::build_url,
    token_reader::{read_oauth_token, read_token_fields},
    transport::{HttpRequest, ReqwestTransport, Transport},
    Config, Error, OAuthParameters, Params, Result, Secrets, SecretsProvider, Session,
    SignedRequest, Signer, AUTHENTICATION_URL_KEY, OAUTH_TOKEN_KEY, OAUTH_TOKEN_SECRET_KEY,
    OAUTH_VERIFIER_KEY,
};

pub const REQUEST_TOKEN_PATH: &str = "/oauth1/request_token/";
pub const ACCESS_TOKEN_PATH: &str = "/oauth1/access_token/";
/// `oauth_callback` used when no callback url is configured.
pub const OUT_OF_BAND: &str = "oob";

/// What came back from a signed call, before it is collapsed into
/// `Option<Value>` for the caller.
#[derive(Debug)]
pub(crate) enum ResponseOutcome {
    Json(Value),
    /// A body was received but it is not JSON.
    NotJson(serde_json::Error),
    Empty,
    /// Nothing was received at all.
    NoResponse,
}

impl ResponseOutcome {
    fn from_body(body: Option<String>) -> Self {
        match body {
            None => ResponseOutcome::NoResponse,
            Some(body) if body.trim().is_empty() => ResponseOutcome::Empty,
            Some(body) => match serde_json::from_str(&body) {
                Ok(value) => ResponseOutcome::Json(value),
                Err(err) => ResponseOutcome::NotJson(err),
            },
        }
    }

    fn into_value(self, method: &Method, url: &str) -> Option<Value> {
        match self {
            ResponseOutcome::Json(value) => Some(value),
            ResponseOutcome::NotJson(err) => {
                log::warn!("{} {} answered with a non JSON body : {}", method, url, err);
                None
            }
            ResponseOutcome::Empty => {
                log::warn!("{} {} answered with an empty body", method, url);
                None
            }
            ResponseOutcome::NoResponse => {
                log::warn!("{} {} received no response", method, url);
                None
            }
        }
    }
}

/// Builder of [`Client`], see [`Client::builder`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    consumer_key: String,
    consumer_secret: String,
    session: Option<Session>,
    config: Config,
}

impl ClientBuilder {
    /// Used as `oauth_callback` when asking for a request token.
    pub fn callback_url<T: Into<String>>(mut self, callback_url: T) -> Self {
        self.config.callback_url = Some(callback_url.into());
        self
    }

    /// Resume a session with an access token obtained earlier.
    pub fn token<TKey, TSecret>(mut self, token: TKey, token_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        self.session = Some(Session::AccessToken {
            token: token.into(),
            secret: token_secret.into(),
        });
        self
    }

    /// Resume a persisted [`Session`]. Only `AccessToken` sessions can be
    /// resumed, anything else fails the build.
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url<T: Into<String>>(mut self, base_url: T) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn api_version<T: Into<String>>(mut self, api_version: T) -> Self {
        self.config.api_version = api_version.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Build a client on top of the blocking reqwest transport.
    pub fn build(self) -> Result<Client<ReqwestTransport>> {
        let transport = ReqwestTransport::new(self.config.timeout)?;
        self.build_with_transport(transport)
    }

    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<Client<T>> {
        let mut secrets = Secrets::new(self.consumer_key, self.consumer_secret)?;
        match self.session {
            None => {}
            Some(Session::AccessToken { token, secret }) => {
                secrets = secrets.token(token, secret)?;
            }
            Some(_) => {
                return Err(Error::Configuration(
                    "only an access token session can be resumed".into(),
                ))
            }
        }
        self.config.validate()?;
        Ok(Client {
            transport,
            secrets,
            config: self.config,
        })
    }
}

/// OAuth 1.0a client of the Shapeways API.
///
/// Holds the consumer credentials and the token pair of one user session.
/// Calls block until the transport returns.
#[derive(Debug)]
pub struct Client<T: Transport> {
    transport: T,
    secrets: Secrets,
    config: Config,
}

impl Client<ReqwestTransport> {
    pub fn builder<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> ClientBuilder
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        ClientBuilder {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            session: None,
            config: Config::default(),
        }
    }

    /// Build a client from `SHAPEWAYS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let settings = EnvSettings::load()?;
        let mut builder = Client::builder(settings.consumer_key, settings.consumer_secret)
            .config(settings.config);
        if let Some((token, secret)) = settings.token {
            builder = builder.token(token, secret);
        }
        builder.build()
    }
}

impl<T: Transport> Client<T> {
    pub fn session(&self) -> &Session {
        self.secrets.session()
    }

    pub fn is_authorized(&self) -> bool {
        self.secrets.session().is_authorized()
    }

    pub fn token(&self) -> Option<&str> {
        self.secrets.session().token()
    }

    pub fn token_secret(&self) -> Option<&str> {
        self.secrets.session().secret()
    }

    pub fn consumer_key(&self) -> &str {
        self.secrets.consumer_key()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Full url of an API path.
    pub fn url(&self, path: &str) -> String {
        build_url(&self.config.base_url, path, &self.config.api_version)
    }

    /// Ask for a request token and return the url the user has to visit.
    ///
    /// `None` when the provider could not be reached or did not answer with
    /// an authentication url and a token secret.
    pub fn begin_authorization(&mut self) -> Option<String> {
        let url = self.url(REQUEST_TOKEN_PATH);
        let callback = self
            .config
            .callback_url
            .clone()
            .unwrap_or_else(|| OUT_OF_BAND.to_string());
        // the request token step never carries a token
        let signed = sign_token_request(
            &self.secrets.consumer_only(),
            &url,
            OAuthParameters::new().callback(callback),
        )?;
        let text = self.dispatch(signed, None)?;

        // the request token itself comes back with the user's callback
        let mut fields = read_token_fields(&text);
        let authentication_url = match take_non_empty(&mut fields, AUTHENTICATION_URL_KEY) {
            Some(authentication_url) => authentication_url,
            None => {
                log::warn!("request token response carries no authentication url");
                return None;
            }
        };
        let secret = match take_non_empty(&mut fields, OAUTH_TOKEN_SECRET_KEY) {
            Some(secret) => secret,
            None => {
                log::warn!("request token response carries no token secret");
                return None;
            }
        };
        self.secrets.request_token_obtained(secret);
        log::info!("request token obtained, waiting for user authorization");
        Some(authentication_url)
    }

    /// Exchange the request token and the user's verifier for an access
    /// token. Returns whether the session is now authorized.
    pub fn complete_authorization(&mut self, token: &str, verifier: &str) -> bool {
        self.secrets.request_token_returned(token.to_string());
        let url = self.url(ACCESS_TOKEN_PATH);
        let text = match sign_token_request(
            &self.secrets,
            &url,
            OAuthParameters::new().verifier(verifier),
        ) {
            Some(signed) => self.dispatch(signed, None),
            None => None,
        };
        let text = match text {
            Some(text) => text,
            None => return false,
        };

        match read_oauth_token(&text) {
            Ok(response)
                if response.oauth_token.is_empty() || response.oauth_token_secret.is_empty() =>
            {
                log::warn!("access token not granted : empty token in response");
                false
            }
            Ok(response) => {
                self.secrets
                    .access_token_obtained(response.oauth_token, response.oauth_token_secret);
                log::info!("access token obtained");
                true
            }
            Err(err) => {
                log::warn!("access token not granted : {}", err);
                false
            }
        }
    }

    /// [`complete_authorization`](Self::complete_authorization) with the
    /// `oauth_token` and `oauth_verifier` of the url the user was sent back
    /// to.
    pub fn complete_authorization_from_callback_url(&mut self, raw_url: &str) -> Result<bool> {
        let (token, verifier) = parse_callback_url(raw_url)?;
        Ok(self.complete_authorization(&token, &verifier))
    }

    /// Sign and send one API call, returning the decoded JSON body.
    ///
    /// GET and DELETE carry `params` in the query string, which is signed.
    /// PUT and POST carry them as a JSON body, which is not.
    ///
    /// Never fails: `None` covers network errors, empty and non JSON bodies
    /// alike.
    pub fn signed_request(&mut self, method: Method, url: &str, params: &Params) -> Option<Value> {
        let outcome = self.signed_request_outcome(method.clone(), url, params);
        outcome.into_value(&method, url)
    }

    pub fn get(&mut self, url: &str, params: &Params) -> Option<Value> {
        self.signed_request(Method::GET, url, params)
    }

    pub fn put(&mut self, url: &str, params: &Params) -> Option<Value> {
        self.signed_request(Method::PUT, url, params)
    }

    pub fn post(&mut self, url: &str, params: &Params) -> Option<Value> {
        self.signed_request(Method::POST, url, params)
    }

    pub fn delete(&mut self, url: &str, params: &Params) -> Option<Value> {
        self.signed_request(Method::DELETE, url, params)
    }

    pub(crate) fn signed_request_outcome(
        &mut self,
        method: Method,
        url: &str,
        params: &Params,
    ) -> ResponseOutcome {
        let mut url = match Url::parse(url) {
            Ok(url) => url,
            Err(err) => {
                log::warn!("invalid request url {} : {}", url, err);
                return ResponseOutcome::NoResponse;
            }
        };
        let body = if method == Method::PUT || method == Method::POST {
            Some(params.to_json_body())
        } else {
            if !params.is_empty() {
                url.query_pairs_mut().extend_pairs(params.to_query_pairs());
            }
            None
        };

        let signed = Signer::new(&self.secrets, OAuthParameters::new()).sign(
            method,
            url,
            std::iter::empty::<(&str, &str)>(),
        );
        ResponseOutcome::from_body(self.dispatch(signed, body))
    }

    /// Send a signed request and hand back whatever body could be obtained.
    fn dispatch(&mut self, signed: SignedRequest, body: Option<String>) -> Option<String> {
        let request = HttpRequest {
            method: signed.method().clone(),
            url: signed.url().clone(),
            authorization: signed.authorization(),
            body,
        };
        log::debug!("{} {}", request.method, request.url);
        match self.transport.execute(request) {
            Ok(response) => {
                if !response.status.is_success() {
                    log::warn!(
                        "{} {} answered {}",
                        signed.method(),
                        signed.url(),
                        response.status
                    );
                }
                Some(response.body)
            }
            Err(err) => {
                // the error is dropped here; callers judge the call by its body
                log::warn!("{} {} failed : {}", signed.method(), signed.url(), err);
                self.transport.last_response_body().map(str::to_string)
            }
        }
    }
}

fn take_non_empty(fields: &mut HashMap<String, String>, key: &str) -> Option<String> {
    fields.remove(key).filter(|value| !value.is_empty())
}

fn sign_token_request<S: SecretsProvider>(
    secrets: &S,
    url: &str,
    params: OAuthParameters<'_>,
) -> Option<SignedRequest> {
    match Url::parse(url) {
        Ok(url) => Some(
            Signer::new(secrets, params).sign(
                Method::POST,
                url,
                std::iter::empty::<(&str, &str)>(),
            ),
        ),
        Err(err) => {
            log::warn!("invalid token endpoint {} : {}", url, err);
            None
        }
    }
}

/// Pull `oauth_token` and `oauth_verifier` out of a callback url. Absolute
/// and relative urls are accepted, as well as a bare query string.
pub fn parse_callback_url(raw_url: &str) -> Result<(String, String)> {
    let without_fragment = raw_url.split('#').next().unwrap_or_default();
    let query = match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None => without_fragment,
    };
    let find = |key: &'static str| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| Error::MalformedCallback {
                key,
                url: raw_url.to_string(),
            })
    };
    Ok((find(OAUTH_TOKEN_KEY)?, find(OAUTH_VERIFIER_KEY)?))
}
