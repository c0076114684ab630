use crate::domain::Credentials;
use oj_rank::Error;
use oj_rank::data_processing::{ApiReply, Method, RankSource};
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";
const LOGIN_SUCCEEDED: &str = "Succeeded";

#[derive(thiserror::Error, Debug)]
pub enum LoginError {
    #[error("two-factor authentication is enabled for this account, which isn't supported")]
    TwoFactorRequired,
    #[error("login rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Api(#[from] Error),
}

impl LoginError {
    /// Whether the site refused the session itself, rather than these credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth())
    }
}

/// Response envelope of the OnlineJudge API.
#[derive(Deserialize)]
struct Envelope {
    error: Option<String>,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    fn parse(reply: ApiReply, what: &str) -> Result<Self, Error> {
        if matches!(reply.status, 401 | 403) {
            return Err(Error::Auth(format!(
                "{} was refused with HTTP status {}",
                what, reply.status
            )));
        }
        if !(200..300).contains(&reply.status) {
            return Err(Error::Transport(format!(
                "{} failed with HTTP status {}",
                what, reply.status
            )));
        }
        serde_json::from_value(reply.body).map_err(|e| {
            Error::Transport(format!(
                "{} response doesn't match the expected JSON schema: {}",
                what, e
            ))
        })
    }

    fn message(&self) -> String {
        match (&self.data, &self.error) {
            (Value::String(message), _) => message.clone(),
            (_, Some(error)) => error.clone(),
            (data, None) => data.to_string(),
        }
    }
}

fn transport(context: &str) -> impl FnOnce(reqwest::Error) -> Error + '_ {
    move |e| Error::Transport(format!("{}: {}", context, e))
}

/// A cookie-carrying HTTP session with one OnlineJudge deployment.
#[derive(Debug)]
pub struct OjSession {
    client: Client,
    jar: Arc<Jar>,
    base: String,
    site: Url,
}

impl OjSession {
    pub fn new(site: &str) -> Result<Self, Error> {
        let base = site.trim_end_matches('/').to_owned();
        let site = Url::parse(&base)
            .map_err(|e| Error::Transport(format!("Invalid site URL '{}': {}", base, e)))?;
        let referer = HeaderValue::from_str(&base)
            .map_err(|e| Error::Transport(format!("Invalid site URL '{}': {}", base, e)))?;
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, referer);

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .default_headers(headers)
            .build()
            .map_err(transport("Failed to build the HTTP client"))?;
        Ok(Self {
            client,
            jar,
            base,
            site,
        })
    }

    pub fn site(&self) -> &str {
        &self.base
    }

    /// The CSRF token Django handed out, if any.
    pub fn csrf_token(&self) -> Option<String> {
        let cookies = self.jar.cookies(&self.site)?;
        let cookies = cookies.to_str().ok()?;
        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == CSRF_COOKIE)
            .map(|(_, value)| value.to_owned())
            .last()
    }

    /// Visits the profile endpoint, which hands out the CSRF cookie.
    /// Returns whether the session is already logged in.
    pub fn check_profile(&self) -> Result<bool, Error> {
        let reply = self.request(Method::Get, "/api/profile", &[])?;
        let envelope = Envelope::parse(reply, "Profile")?;
        Ok(envelope.error.is_none() && !envelope.data.is_null())
    }

    fn tfa_required(&self, credentials: &Credentials) -> Result<bool, Error> {
        let params = [("username", credentials.username.as_ref().to_owned())];
        let reply = self.request(Method::Post, "/api/tfa_required", &params)?;
        let envelope = Envelope::parse(reply, "Two-factor check")?;
        Ok(envelope.error.is_none() && envelope.data["result"].as_bool().unwrap_or(false))
    }

    /// Logs in with a username and password.
    #[tracing::instrument(
        name = "Logging in",
        skip(self, credentials),
        fields(username = %credentials.username.as_ref())
    )]
    pub fn login(&self, credentials: &Credentials) -> Result<(), LoginError> {
        if self.check_profile()? {
            tracing::info!("Session is already authenticated");
            return Ok(());
        }
        if self.tfa_required(credentials)? {
            return Err(LoginError::TwoFactorRequired);
        }
        let params = [
            ("username", credentials.username.as_ref().to_owned()),
            ("password", credentials.password.expose_secret().to_owned()),
        ];
        let reply = self.request(Method::Post, "/api/login", &params)?;
        let envelope = Envelope::parse(reply, "Login")?;
        if envelope.error.is_none() && envelope.data == LOGIN_SUCCEEDED {
            tracing::info!("Logged in");
            Ok(())
        } else {
            Err(LoginError::Rejected(envelope.message()))
        }
    }
}

impl RankSource for OjSession {
    #[tracing::instrument(name = "OnlineJudge request", skip(self, params), fields(method = ?method))]
    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<ApiReply, Error> {
        let url = format!("{}{}", self.base, path);
        let builder = match method {
            Method::Get => self.client.get(&url).query(params),
            Method::Post => {
                let body: serde_json::Map<String, Value> = params
                    .iter()
                    .map(|(key, value)| ((*key).to_owned(), Value::String(value.clone())))
                    .collect();
                let builder = self.client.post(&url).json(&body);
                match self.csrf_token() {
                    Some(token) => builder.header(CSRF_HEADER, token),
                    None => {
                        tracing::warn!("No {} cookie for POST {}", CSRF_COOKIE, path);
                        builder
                    }
                }
            }
        };

        let context = format!("Connection error: is {} down?", self.base);
        let response = builder.send().map_err(transport(&context))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(transport("Failed to read the HTTP response body"))?;
        tracing::debug!("HTTP {} with {} bytes", status.as_u16(), text.len());

        let body = match serde_json::from_str(&text) {
            Ok(body) => body,
            // Error pages aren't JSON; the status alone tells what went wrong
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => {
                return Err(Error::Transport(format!(
                    "{} didn't return JSON: {}",
                    path, e
                )));
            }
        };
        Ok(ApiReply {
            status: status.as_u16(),
            body,
        })
    }
}
