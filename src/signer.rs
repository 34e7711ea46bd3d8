//! OAuth 1.0a HMAC-SHA1 signing.
//!
//! Everything here is a pure function of its inputs: nonce and timestamp
//! are only generated when the caller did not pin them in
//! [`OAuthParameters`].
use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet};
use sha1::Sha1;
use url::Url;
use uuid::Uuid;

use crate::{
    SecretsProvider, OAUTH_CALLBACK_KEY, OAUTH_CONSUMER_KEY, OAUTH_NONCE_KEY,
    OAUTH_SIGNATURE_KEY, OAUTH_SIGNATURE_METHOD_KEY, OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY,
    OAUTH_VERIFIER_KEY, OAUTH_VERSION_KEY, REALM_KEY,
};

type HmacSha1 = Hmac<Sha1>;

pub const HMAC_SHA1: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";
const OAUTH_HEADER_PREFIX: &str = "OAuth ";

// https://tools.ietf.org/html/rfc5849#section-3.6
// * ALPHA, DIGIT, '-', '.', '_', '~' MUST NOT be encoded.
// * All other characters MUST be encoded.
// * The two hexadecimal characters used to represent encoded
//   characters MUST be uppercase.
const TARGETS_FOR_PARAMS: &AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// RFC 5849 section 3.6 percent encoding.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, TARGETS_FOR_PARAMS).to_string()
}

/// Base string URI (RFC 5849 section 3.4.1.2): lowercase scheme and host,
/// default ports dropped, no query or fragment.
pub fn base_string_uri(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// Normalized request parameters (RFC 5849 section 3.4.1.3.2).
///
/// Takes decoded pairs. `realm` and `oauth_signature` never take part.
pub fn normalize_parameters<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut encoded = params
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .filter(|(k, _)| k != REALM_KEY && k != OAUTH_SIGNATURE_KEY)
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .collect::<Vec<(String, String)>>();
    // sort by encoded key, then by encoded value
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<String>>()
        .join("&")
}

/// Signature base string. Query parameters on `url` are included together
/// with `params`.
pub fn signature_base_string<I, K, V>(http_method: &str, url: &Url, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect::<Vec<(String, String)>>();
    pairs.extend(
        params
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())),
    );
    let normalized = normalize_parameters(pairs);
    format!(
        "{}&{}&{}",
        percent_encode(&http_method.to_ascii_uppercase()),
        percent_encode(&base_string_uri(url)),
        percent_encode(&normalized)
    )
}

/// HMAC-SHA1 over `base_string`, keyed with `consumer_secret&token_secret`.
/// Returns the base64 digest (not percent encoded).
pub fn hmac_sha1_signature(
    base_string: &str,
    consumer_secret: &str,
    token_secret: Option<&str>,
) -> String {
    let sign_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret.unwrap_or(""))
    );
    let mut mac = HmacSha1::new_from_slice(sign_key.as_bytes())
        .expect("HMAC accepts keys of any size");
    mac.update(base_string.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Render `Authorization: OAuth ...`. `realm` comes first and is not
/// encoded; all oauth values are percent encoded and sorted by key.
pub fn authorization_header<'p, I>(realm: Option<&str>, oauth_params: I) -> String
where
    I: IntoIterator<Item = (&'p str, &'p str)>,
{
    let mut items = oauth_params
        .into_iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect::<Vec<(String, String)>>();
    items.sort();
    let mut fields = Vec::with_capacity(items.len() + 1);
    if let Some(realm) = realm {
        fields.push(format!("{}=\"{}\"", REALM_KEY, realm));
    }
    fields.extend(items.into_iter().map(|(k, v)| format!("{}=\"{}\"", k, v)));
    format!("{}{}", OAUTH_HEADER_PREFIX, fields.join(","))
}

pub fn generate_nonce() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn generate_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Per-request oauth_* options.
#[derive(Debug, Clone, Default)]
pub struct OAuthParameters<'a> {
    callback: Option<Cow<'a, str>>,
    nonce: Option<Cow<'a, str>>,
    realm: Option<Cow<'a, str>>,
    timestamp: Option<u64>,
    verifier: Option<Cow<'a, str>>,
    version: bool,
}

impl<'a> OAuthParameters<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn callback<T>(self, callback: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            callback: Some(callback.into()),
            ..self
        }
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the realm value
    pub fn realm<T>(self, realm: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            realm: Some(realm.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// set the oauth_verifier value
    pub fn verifier<T>(self, verifier: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            verifier: Some(verifier.into()),
            ..self
        }
    }

    /// set the oauth_version value (boolean)
    ///
    /// # Note
    /// When the version has value `true`, oauth_version will be set with "1.0".
    /// Otherwise, oauth_version will not be included in your request.
    pub fn version<T>(self, version: T) -> Self
    where
        T: Into<bool>,
    {
        OAuthParameters {
            version: version.into(),
            ..self
        }
    }
}

/// A signed request, ready to be handed to a transport.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: Method,
    url: Url,
    realm: Option<String>,
    oauth_parameters: Vec<(&'static str, String)>,
    signature: String,
}

impl SignedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Looks up one of the oauth_* fields, including `oauth_signature`.
    pub fn oauth_parameter(&self, key: &str) -> Option<&str> {
        self.oauth_parameters
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn authorization(&self) -> String {
        authorization_header(
            self.realm.as_deref(),
            self.oauth_parameters.iter().map(|(k, v)| (*k, v.as_str())),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    secrets: &'a TSecretsProvider,
    parameters: OAuthParameters<'a>,
}

impl<'a, TSecretsProvider> Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new(secrets: &'a TSecretsProvider, parameters: OAuthParameters<'a>) -> Self {
        Signer {
            secrets,
            parameters,
        }
    }

    /// Sign `method url` with `params` (decoded form/query pairs that are
    /// sent in addition to the url query).
    pub fn sign<I, K, V>(self, method: Method, url: Url, params: I) -> SignedRequest
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (consumer_key, consumer_secret) = self.secrets.get_consumer_key_pair();
        let (token, token_secret) = self.secrets.get_token_option_pair();
        let OAuthParameters {
            callback,
            nonce,
            realm,
            timestamp,
            verifier,
            version,
        } = self.parameters;

        let nonce = nonce.map(Cow::into_owned).unwrap_or_else(generate_nonce);
        let timestamp = timestamp.unwrap_or_else(generate_timestamp);

        let mut oauth_parameters = vec![
            (OAUTH_CONSUMER_KEY, consumer_key.to_string()),
            (OAUTH_NONCE_KEY, nonce),
            (OAUTH_SIGNATURE_METHOD_KEY, HMAC_SHA1.to_string()),
            (OAUTH_TIMESTAMP_KEY, timestamp.to_string()),
        ];
        if let Some(callback) = callback {
            oauth_parameters.push((OAUTH_CALLBACK_KEY, callback.into_owned()));
        }
        if let Some(token) = token {
            oauth_parameters.push((OAUTH_TOKEN_KEY, token.to_string()));
        }
        if let Some(verifier) = verifier {
            oauth_parameters.push((OAUTH_VERIFIER_KEY, verifier.into_owned()));
        }
        if version {
            oauth_parameters.push((OAUTH_VERSION_KEY, OAUTH_VERSION.to_string()));
        }

        let mut signed_params = params
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect::<Vec<(String, String)>>();
        signed_params.extend(
            oauth_parameters
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone())),
        );

        let base_string = signature_base_string(method.as_str(), &url, signed_params);
        log::debug!("oauth base string: {}", base_string);
        let signature = hmac_sha1_signature(&base_string, consumer_secret, token_secret);
        oauth_parameters.push((OAUTH_SIGNATURE_KEY, signature.clone()));

        SignedRequest {
            method,
            url,
            realm: realm.map(Cow::into_owned),
            oauth_parameters,
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Secrets;

    fn signed(
        secrets: &Secrets,
        params: OAuthParameters<'_>,
        method: Method,
        url: &str,
        body: &[(&str, &str)],
    ) -> SignedRequest {
        Signer::new(secrets, params).sign(method, Url::parse(url).unwrap(), body.iter().copied())
    }

    #[test]
    fn sign_rfc5849_initiate() {
        // https://tools.ietf.org/html/rfc5849#section-1.2
        let secrets = Secrets::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44").unwrap();
        let params = OAuthParameters::new()
            .nonce("wIjqoS")
            .timestamp(137_131_200u64)
            .callback("http://printer.example.com/ready")
            .realm("photos");
        let req = signed(
            &secrets,
            params,
            Method::POST,
            "https://photos.example.net/initiate",
            &[],
        );
        assert_eq!(req.signature(), "74KNZJeDHnMBp0EMJ9ZHt/XKycU=");
        // realm leads the header and stays out of the base string
        assert!(req.authorization().starts_with("OAuth realm=\"photos\",oauth_callback="));
        assert_eq!(req.oauth_parameter(REALM_KEY), None);
    }

    #[test]
    fn sign_rfc5849_get_with_token() {
        let secrets = Secrets::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44")
            .unwrap()
            .token("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00")
            .unwrap();
        let params = OAuthParameters::new()
            .nonce("chapoH")
            .timestamp(137_131_202u64)
            .realm("Photos");
        let req = signed(
            &secrets,
            params,
            Method::GET,
            "http://photos.example.net/photos?file=vacation.jpg&size=original",
            &[],
        );
        assert_eq!(req.signature(), "MdpQcU8iPSUjWoN/UDMsK2sui9I=");
    }

    #[test]
    fn sign_twitter_post_body() {
        // https://developer.twitter.com/ja/docs/basics/authentication/guides/creating-a-signature
        let secrets = Secrets::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        )
        .unwrap()
        .token(
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        )
        .unwrap();
        let params = OAuthParameters::new()
            .nonce("kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg")
            .timestamp(1_318_622_958u64)
            .version(true);
        let req = signed(
            &secrets,
            params,
            Method::POST,
            "https://api.twitter.com/1.1/statuses/update.json",
            &[
                ("include_entities", "true"),
                ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
            ],
        );
        assert_eq!(req.signature(), "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
        assert_eq!(req.oauth_parameter(OAUTH_VERSION_KEY), Some(OAUTH_VERSION));
    }

    #[test]
    fn base_string_rfc5849() {
        let url = Url::parse("http://photos.example.net/photos?file=vacation.jpg&size=original")
            .unwrap();
        let base = signature_base_string(
            "get",
            &url,
            vec![
                ("oauth_consumer_key", "dpf43f3p2l4k3l03"),
                ("oauth_token", "nnch734d00sl2jdk"),
                ("oauth_signature_method", "HMAC-SHA1"),
                ("oauth_timestamp", "137131202"),
                ("oauth_nonce", "chapoH"),
                ("realm", "Photos"),
            ],
        );
        assert_eq!(
            base,
            "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg%26\
             oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3DchapoH%26\
             oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D137131202%26\
             oauth_token%3Dnnch734d00sl2jdk%26size%3Doriginal"
        );
    }

    #[test]
    fn signature_is_deterministic_with_pinned_nonce_and_timestamp() {
        let secrets = Secrets::new("ck", "cs").unwrap().token("t", "ts").unwrap();
        let make = || {
            signed(
                &secrets,
                OAuthParameters::new().nonce("n0nce").timestamp(1_500_000_000u64),
                Method::GET,
                "https://api.shapeways.com/models/v1?page=2",
                &[],
            )
        };
        assert_eq!(make().signature(), make().signature());
        assert_eq!(make().authorization(), make().authorization());
    }

    #[test]
    fn fresh_nonce_per_request() {
        let secrets = Secrets::new("ck", "cs").unwrap();
        let url = "https://api.shapeways.com/api/v1";
        let a = signed(&secrets, OAuthParameters::new(), Method::GET, url, &[]);
        let b = signed(&secrets, OAuthParameters::new(), Method::GET, url, &[]);
        assert_ne!(a.oauth_parameter(OAUTH_NONCE_KEY), b.oauth_parameter(OAUTH_NONCE_KEY));
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn base_string_uri_normalization() {
        let url = Url::parse("HTTP://EXAMPLE.com:80/r%20v/X?id=123").unwrap();
        assert_eq!(base_string_uri(&url), "http://example.com/r%20v/X");
        let url = Url::parse("https://www.example.net:8080/?q=1").unwrap();
        assert_eq!(base_string_uri(&url), "https://www.example.net:8080/");
    }

    #[test]
    fn percent_encoding_keeps_unreserved() {
        assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("a-b.c_d~e"), "a-b.c_d~e");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn authorization_header_layout() {
        let header = authorization_header(
            Some("photos"),
            vec![
                ("oauth_signature", "74KNZJeDHnMBp0EMJ9ZHt/XKycU="),
                ("oauth_consumer_key", "dpf43f3p2l4k3l03"),
            ],
        );
        assert_eq!(
            header,
            "OAuth realm=\"photos\",oauth_consumer_key=\"dpf43f3p2l4k3l03\",\
             oauth_signature=\"74KNZJeDHnMBp0EMJ9ZHt%2FXKycU%3D\""
        );
    }

    #[test]
    fn header_carries_token_only_when_present() {
        let secrets = Secrets::new("ck", "cs").unwrap();
        let url = "https://api.shapeways.com/oauth1/request_token/v1";
        let req = signed(
            &secrets,
            OAuthParameters::new().callback("oob"),
            Method::POST,
            url,
            &[],
        );
        assert_eq!(req.oauth_parameter(OAUTH_TOKEN_KEY), None);
        assert_eq!(req.oauth_parameter(OAUTH_CALLBACK_KEY), Some("oob"));
        assert_eq!(req.oauth_parameter(OAUTH_SIGNATURE_METHOD_KEY), Some(HMAC_SHA1));
        assert!(req.authorization().starts_with("OAuth oauth_callback=\"oob\","));
        assert!(!req.authorization().contains(OAUTH_VERSION_KEY));
    }
}
