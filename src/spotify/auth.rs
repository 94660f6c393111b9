use base64::{engine::general_purpose::STANDARD as b64, Engine};
use error_stack::{Report, ResultExt};
use log::{debug, info, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{redirect, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use super::scope;
use super::state::{gen_random_str, STATE_LENGTH};
use crate::config::Config;
use crate::error::{LoginError, Result};
use crate::input::InputProvider;

pub struct AuthCodeNotPresent;
pub struct AuthCodePresent(String);
pub struct TokenIssued(TokenResponse);

pub trait AuthCodeStates: private::Sealed {}
impl AuthCodeStates for AuthCodeNotPresent {}
impl AuthCodeStates for AuthCodePresent {}
impl AuthCodeStates for TokenIssued {}

/// Client credentials moving through the authorization code flow.
///
/// The type parameter tracks what has been obtained so far, so the code can only be exchanged
/// once and a refresh is only possible after the exchange succeeded.
pub struct Credentials<AuthCodeState>
where
    AuthCodeState: AuthCodeStates,
{
    pub client_id: String,
    pub client_secret: String,
    authorization_code: AuthCodeState,
    state: String,
}

impl<S: AuthCodeStates> Credentials<S> {
    /// The anti-forgery `state` sent with the authorization request.
    pub fn state(&self) -> &str {
        &self.state
    }

    fn with<T: AuthCodeStates>(self, authorization_code: T) -> Credentials<T> {
        Credentials {
            client_id: self.client_id,
            client_secret: self.client_secret,
            authorization_code,
            state: self.state,
        }
    }
}

impl Credentials<AuthCodeNotPresent> {
    pub fn new(client_id: &str, client_secret: &str) -> Credentials<AuthCodeNotPresent> {
        Credentials {
            client_id: String::from(client_id),
            client_secret: String::from(client_secret),
            authorization_code: AuthCodeNotPresent,
            state: gen_random_str(STATE_LENGTH),
        }
    }

    /// Takes the client id and secret from the config, asking the operator for whatever is missing.
    pub fn from_config_or_prompt<I>(
        config: &Config,
        input: &mut I,
    ) -> Result<Credentials<AuthCodeNotPresent>>
    where
        I: InputProvider + ?Sized,
    {
        let client_id = match &config.client_id {
            Some(id) => id.clone(),
            None => prompt(input, "Enter client ID: ")?,
        };
        let client_secret = match &config.client_secret {
            Some(secret) => secret.clone(),
            None => prompt(input, "Enter client secret: ")?,
        };
        Ok(Credentials::new(&client_id, &client_secret))
    }

    pub fn authorization_url(&self, config: &Config) -> Result<Url> {
        let scopes = scope::to_scopes_string(&config.scopes);
        let params = serde_urlencoded::to_string(AuthCodeRequest {
            client_id: &self.client_id,
            response_type: "code",
            redirect_uri: &config.redirect_uri,
            state: &self.state,
            scope: &scopes,
        })
        .change_context(LoginError::InvalidUrl)
        .attach_printable("Error url-encoding authorization query")?;

        let mut url = config.authorize_url.clone();
        url.set_query(Some(&params));
        debug!("Built authorization url: {url}");
        Ok(url)
    }

    pub fn add_auth_code(self, auth_code: String) -> Credentials<AuthCodePresent> {
        self.with(AuthCodePresent(auth_code))
    }
}

impl Credentials<AuthCodePresent> {
    pub async fn get_access_token(
        self,
        http: &reqwest::Client,
        config: &Config,
    ) -> Result<Credentials<TokenIssued>> {
        info!("Requesting access and refresh tokens");
        let response = request_token(
            http,
            &config.token_url,
            &basic_auth_header(&self.client_id, &self.client_secret),
            &[
                ("grant_type", "authorization_code"),
                ("code", self.authorization_code.0.as_str()),
                ("redirect_uri", config.redirect_uri.as_str()),
            ],
        )
        .await?;

        let refresh_token = response.refresh_token.ok_or_else(|| {
            Report::new(LoginError::MalformedTokenResponse(
                "missing field `refresh_token`".into(),
            ))
        })?;

        Ok(self.with(TokenIssued(TokenResponse {
            tokens: TokenPair {
                access_token: response.access_token,
                refresh_token,
            },
            token_type: response.token_type,
            scope: response.scope,
            expires_in: response.expires_in,
            body: response.body,
        })))
    }
}

impl Credentials<TokenIssued> {
    pub fn token(&self) -> &TokenResponse {
        &self.authorization_code.0
    }

    pub fn into_token(self) -> TokenResponse {
        self.authorization_code.0
    }

    /// Mints a new access token with the refresh token from the previous response.
    pub async fn refresh(
        self,
        http: &reqwest::Client,
        config: &Config,
    ) -> Result<Credentials<TokenIssued>> {
        info!("Refreshing access token");
        let previous_refresh_token = self.authorization_code.0.tokens.refresh_token.clone();
        let response = request_token(
            http,
            &config.token_url,
            &basic_auth_header(&self.client_id, &self.client_secret),
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", previous_refresh_token.as_str()),
            ],
        )
        .await?;

        // Spotify only sometimes rotates the refresh token
        let refresh_token = response.refresh_token.unwrap_or(previous_refresh_token);

        Ok(self.with(TokenIssued(TokenResponse {
            tokens: TokenPair {
                access_token: response.access_token,
                refresh_token,
            },
            token_type: response.token_type,
            scope: response.scope,
            expires_in: response.expires_in,
            body: response.body,
        })))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// A successful token endpoint response.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub tokens: TokenPair,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
    /// The JSON body exactly as Spotify sent it.
    pub body: serde_json::Value,
}

/// `Authorization` header value for the token endpoint.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!("Basic {}", b64.encode(format!("{client_id}:{client_secret}")))
}

/// Checks that the authorize endpoint accepts the request.
///
/// Spotify answers a valid request with a redirect to its login page, so redirects are not
/// followed and count as success. Failures are only logged; the operator may still be able to
/// use the url.
pub async fn check_authorization_url(url: &Url) -> Option<StatusCode> {
    let client = match reqwest::Client::builder().redirect(redirect::Policy::none()).build() {
        Ok(c) => c,
        Err(e) => {
            warn!("Unable to build http client for the authorization endpoint: {e}");
            return None;
        }
    };

    match client.get(url.clone()).send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() || status.is_redirection() {
                debug!("Authorization endpoint answered {status}");
            } else {
                warn!("Failed to access authorization endpoint: {status}");
            }
            Some(status)
        }
        Err(e) => {
            warn!("Failed to access authorization endpoint: {e}");
            None
        }
    }
}

fn prompt<I: InputProvider + ?Sized>(input: &mut I, message: &str) -> Result<String> {
    Ok(input
        .read_line(message)
        .change_context(LoginError::Input)?
        .trim()
        .to_string())
}

#[derive(Serialize)]
struct AuthCodeRequest<'a> {
    client_id: &'a str,
    response_type: &'a str,
    redirect_uri: &'a str,
    state: &'a str,
    scope: &'a str,
}

#[derive(Deserialize, Debug)]
struct TokenBody {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct AuthenticationErrorResponse {
    error: String,
    error_description: Option<String>,
}

struct RawTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
    expires_in: Option<u64>,
    body: serde_json::Value,
}

async fn request_token(
    http: &reqwest::Client,
    token_url: &Url,
    authorization: &str,
    form: &[(&str, &str)],
) -> Result<RawTokenResponse> {
    let response = http
        .post(token_url.clone())
        .header(AUTHORIZATION, authorization)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .form(form)
        .send()
        .await
        .change_context(LoginError::Http)
        .attach_printable("Error sending request to the token endpoint")?;

    let status = response.status();
    let text = response
        .text()
        .await
        .change_context(LoginError::Http)
        .attach_printable("Unable to get text from token response")?;
    debug!("Token endpoint answered {status}: {text}");

    if status != StatusCode::OK {
        let (error, error_description) =
            match serde_json::from_str::<AuthenticationErrorResponse>(&text) {
                Ok(e) => (Some(e.error), e.error_description),
                Err(_) => (None, None),
            };
        return Err(Report::new(LoginError::TokenRequestRejected {
            status,
            error,
            error_description,
        })
        .attach_printable(text));
    }

    let body: serde_json::Value = serde_json::from_str(&text)
        .change_context(LoginError::MalformedTokenResponse("body is not json".into()))
        .attach_printable(text)?;
    let fields: TokenBody = serde_json::from_value(body.clone())
        .change_context(LoginError::MalformedTokenResponse("unexpected field types".into()))?;

    let access_token = fields.access_token.ok_or_else(|| {
        Report::new(LoginError::MalformedTokenResponse(
            "missing field `access_token`".into(),
        ))
    })?;

    Ok(RawTokenResponse {
        access_token,
        refresh_token: fields.refresh_token,
        token_type: fields.token_type,
        scope: fields.scope,
        expires_in: fields.expires_in,
        body,
    })
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::AuthCodeNotPresent {}
    impl Sealed for super::AuthCodePresent {}
    impl Sealed for super::TokenIssued {}
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::input::ScriptedInput;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "SPOTIFY_REDIRECT_URI" => Some("http://httpbin.org/anything".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn basic_auth_header_encodes_id_and_secret() {
        assert_eq!(basic_auth_header("abc", "xyz"), "Basic YWJjOnh5eg==");
    }

    #[test]
    fn new_credentials_get_a_fresh_state() {
        let a = Credentials::new("id", "secret");
        let b = Credentials::new("id", "secret");

        assert_eq!(a.state().len(), STATE_LENGTH);
        assert!(a.state().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a.state(), b.state());
    }

    #[test]
    fn authorization_url_carries_every_parameter() {
        let config = config();
        let creds = Credentials::new("my client", "secret");

        let url = creds.authorization_url(&config).unwrap();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(url.origin(), config.authorize_url.origin());
        assert_eq!(url.path(), "/authorize");
        assert_eq!(query.len(), 5);
        assert_eq!(query["client_id"], "my client");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["redirect_uri"], "http://httpbin.org/anything");
        assert_eq!(query["state"], creds.state());
        assert_eq!(query["scope"], "user-read-playback-state user-read-playback-position");
    }

    #[test]
    fn authorization_url_sends_redirect_uri_as_configured() {
        let config = Config::from_lookup(|key| match key {
            "SPOTIFY_REDIRECT_URI" => Some("http://127.0.0.1:8888".to_string()),
            _ => None,
        })
        .unwrap();
        let creds = Credentials::new("my client", "secret");

        let url = creds.authorization_url(&config).unwrap();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(query["redirect_uri"], "http://127.0.0.1:8888");
    }

    #[test]
    fn credentials_come_from_config_before_prompting() {
        let mut config = config();
        config.client_id = Some("configured".to_string());
        let mut input = ScriptedInput::new([" typed secret \n"]);

        let creds = Credentials::from_config_or_prompt(&config, &mut input).unwrap();

        assert_eq!(creds.client_id, "configured");
        assert_eq!(creds.client_secret, "typed secret");
        assert_eq!(input.prompts(), ["Enter client secret: "]);
    }

    #[test]
    fn missing_input_is_an_input_error() {
        let mut input = ScriptedInput::new(Vec::<String>::new());

        let report = Credentials::from_config_or_prompt(&config(), &mut input)
            .err()
            .unwrap();

        assert!(matches!(report.current_context(), LoginError::Input));
    }
}
