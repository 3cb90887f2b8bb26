mod validator;

pub use validator::{has_json_extension, is_allowed_uri};

use core::fmt::{self, Display};
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
    http, Request, StatusCode, Uri,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{self, connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use twilight_model::id::{
    marker::{ApplicationMarker, GuildMarker},
    Id,
};

pub const APPLICATION_JSON: &str = "application/json";

#[derive(Debug)]
pub enum FetchError {
    Client(legacy::Error),
    Body(hyper::Error),
    Http(http::Error),
    Status(StatusCode),
    TooLarge,
}

impl From<legacy::Error> for FetchError {
    fn from(err: legacy::Error) -> Self {
        Self::Client(err)
    }
}

impl From<hyper::Error> for FetchError {
    fn from(err: hyper::Error) -> Self {
        Self::Body(err)
    }
}

impl From<http::Error> for FetchError {
    fn from(err: http::Error) -> Self {
        Self::Http(err)
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(err) => write!(f, "request failed: {err}"),
            Self::Body(err) => write!(f, "failed to read the body: {err}"),
            Self::Http(err) => write!(f, "malformed request: {err}"),
            Self::Status(status) => write!(f, "unexpected status {status}"),
            Self::TooLarge => f.write_str("payload too large"),
        }
    }
}

impl std::error::Error for FetchError {}

/// HTTPS client for everything that does not go through the Discord API client:
/// downloading uploaded attachments and registering the slash commands.
#[derive(Clone)]
pub struct Fetcher {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let https = HttpsConnectorBuilder::new().with_webpki_roots().https_only().enable_http1().build();
        let client = Client::builder(TokioExecutor::new()).build(https);
        Self { client }
    }

    /// Downloads a JSON document of at most `limit` bytes.
    pub async fn get_json(&self, uri: Uri, limit: usize) -> Result<Bytes, FetchError> {
        let request = Request::get(uri).header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON)).body(Full::default())?;
        let response = self.client.request(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        // Reject early when the server announces the size.
        let announced = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|length| length.to_str().ok())
            .and_then(|length| length.parse::<usize>().ok());
        if announced.is_some_and(|length| length > limit) {
            return Err(FetchError::TooLarge);
        }

        let bytes = response.into_body().collect().await?.to_bytes();
        if bytes.len() > limit {
            return Err(FetchError::TooLarge);
        }

        Ok(bytes)
    }

    /// Overwrites the application's slash commands with `commands`, either globally
    /// or for a single guild.
    pub async fn register_commands(
        &self,
        app: Id<ApplicationMarker>,
        guild: Option<Id<GuildMarker>>,
        token: &str,
        commands: &'static [u8],
    ) -> Result<(), FetchError> {
        let endpoint = match guild {
            Some(guild) => format!("https://discord.com/api/v10/applications/{app}/guilds/{guild}/commands"),
            None => format!("https://discord.com/api/v10/applications/{app}/commands"),
        };

        let request = Request::put(endpoint)
            .header(AUTHORIZATION, format!("Bot {token}"))
            .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
            .body(Full::new(Bytes::from_static(commands)))?;
        let response = self.client.request(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(())
    }
}
