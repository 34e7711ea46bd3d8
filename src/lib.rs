/*!
shapeways-oauth1: an OAuth 1.0a client of the [Shapeways](https://www.shapeways.com) REST API.

# Overview

Requests are signed with HMAC-SHA1 and authorized through the
`Authorization` header. The client drives the three-legged handshake and
then exposes one method per API operation, each returning the decoded JSON
answer of the provider.

Structural mistakes (empty credentials, a missing required parameter, a
callback url without `oauth_token` / `oauth_verifier`) are returned as
[`Error`]. Anything that goes wrong on the wire is not: the call answers
`None` (or `false` for the token exchange) and the cause is logged through
the [`log`](https://crates.io/crates/log) facade.

# How to use

## Acquiring an access token

```no_run
use std::io;

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let mut client = shapeways_oauth1::Client::builder("[CONSUMER_KEY]", "[CONSUMER_SECRET]")
    .callback_url("https://example.com/shapeways/callback")
    .build()?;

// step 1: acquire a request token
let authentication_url = client
    .begin_authorization()
    .ok_or("request token not available")?;
println!("please access to: {}", authentication_url);

// step 2: the user comes back to the callback url
println!("paste the url you were redirected to: ");
let mut callback = String::new();
io::stdin().read_line(&mut callback)?;

// step 3: exchange it for an access token
if client.complete_authorization_from_callback_url(callback.trim())? {
    println!(
        "your token and secret is: \n token: {}\n secret: {}",
        client.token().unwrap_or_default(),
        client.token_secret().unwrap_or_default()
    );
}
# Ok(())
# }
```

## Calling the API

```no_run
use shapeways_oauth1::{Client, Params};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let mut client = Client::builder("[CONSUMER_KEY]", "[CONSUMER_SECRET]")
    .token("[ACCESS_TOKEN]", "[TOKEN_SECRET]")
    .build()?;

let model = client.add_model(
    Params::new()
        .field("fileName", "cube.stl")
        .field("hasRightsToModel", 1)
        .field("acceptTermsAndConditions", 1)
        .file(std::fs::read("cube.stl")?),
)?;
match model {
    Some(model) => println!("uploaded: {}", model),
    None => println!("upload failed"),
}
# Ok(())
# }
```
*/
mod client;
mod config;
mod error;
mod request;
pub mod resources;
mod secrets;
mod signer;
mod token_reader;
mod transport;
#[cfg(test)]
mod testing;

// exposed to external program
pub use client::{parse_callback_url, Client, ClientBuilder, ACCESS_TOKEN_PATH, REQUEST_TOKEN_PATH};
pub use config::{Config, EnvSettings, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
pub use error::{Error, Result, TokenReaderError, TokenReaderResult, TransportError, TransportResult};
pub use request::{build_url, Endpoint, ParamValue, Params};
pub use secrets::{ConsumerOnly, Secrets, SecretsProvider, Session};
pub use signer::{
    authorization_header, base_string_uri, hmac_sha1_signature, normalize_parameters,
    percent_encode, signature_base_string, OAuthParameters, SignedRequest, Signer,
};
pub use token_reader::{read_oauth_token, TokenResponse};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_token_secret`.
pub const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
/// Represents `realm`.
pub const REALM_KEY: &str = "realm";
/// Request token response field holding the user authorization url.
pub const AUTHENTICATION_URL_KEY: &str = "authentication_url";
/// Parameter carrying model and photo uploads.
pub const FILE_KEY: &str = "file";

// crate-private constant variables
pub(crate) const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
pub(crate) const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
pub(crate) const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
