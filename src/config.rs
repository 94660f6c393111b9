use std::env;

use error_stack::{Report, ResultExt};
use log::{debug, warn};
use url::{Host, Url};

use crate::error::{LoginError, Result};
use crate::spotify::scope::{self, Scope, DEFAULT_SCOPES};

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const AUTHORIZATION_BASE_URL: &str = "https://accounts.spotify.com/authorize";
pub const ACCESS_TOKEN_BASE_URL: &str = "https://accounts.spotify.com/api/token";
pub const PLAYER_URL: &str = "https://api.spotify.com/v1/me/player";

/// How the authorization redirect gets back to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// The operator pastes the redirect url (or the bare code) into the console.
    Manual,
    /// A local http listener bound to the redirect uri receives the redirect.
    Listener,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Redirect uri exactly as configured; Spotify compares it byte for byte.
    pub redirect_uri: String,
    /// `redirect_uri` parsed, for binding the local listener.
    pub redirect_url: Url,
    pub authorize_url: Url,
    pub token_url: Url,
    pub player_url: Url,
    pub scopes: Vec<Scope>,
    pub capture: CaptureMode,
    pub open_browser: bool,
    pub check_player: bool,
}

impl Config {
    /// Reads `.env` if there is one, then the process environment.
    pub fn from_env() -> Result<Config> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => warn!("Ignoring unreadable .env file: {e}"),
        }
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let redirect_uri = lookup("SPOTIFY_REDIRECT_URI")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        let redirect_url = parse_url(
            Some(redirect_uri.as_str()),
            DEFAULT_REDIRECT_URI,
            "SPOTIFY_REDIRECT_URI must be an absolute url",
        )?;

        let capture = match lookup("SPOTIFY_LOGIN_CAPTURE").as_deref().map(str::trim) {
            None => default_capture_mode(&redirect_url),
            Some(v) if v.eq_ignore_ascii_case("manual") => CaptureMode::Manual,
            Some(v) if v.eq_ignore_ascii_case("listener") => CaptureMode::Listener,
            Some(v) => {
                return Err(Report::new(LoginError::Config(
                    "SPOTIFY_LOGIN_CAPTURE must be `manual` or `listener`",
                ))
                .attach_printable(v.to_string()))
            }
        };

        let scopes = match lookup("SPOTIFY_SCOPES") {
            Some(s) => scope::parse_scopes(&s)
                .change_context(LoginError::Config("SPOTIFY_SCOPES contains an unknown scope"))?,
            None => DEFAULT_SCOPES.to_vec(),
        };

        Ok(Config {
            client_id: lookup("SPOTIFY_CLIENT_ID"),
            client_secret: lookup("SPOTIFY_CLIENT_SECRET"),
            authorize_url: parse_url(
                lookup("SPOTIFY_AUTHORIZE_URL").as_deref(),
                AUTHORIZATION_BASE_URL,
                "SPOTIFY_AUTHORIZE_URL must be an absolute url",
            )?,
            token_url: parse_url(
                lookup("SPOTIFY_TOKEN_URL").as_deref(),
                ACCESS_TOKEN_BASE_URL,
                "SPOTIFY_TOKEN_URL must be an absolute url",
            )?,
            player_url: parse_url(
                lookup("SPOTIFY_PLAYER_URL").as_deref(),
                PLAYER_URL,
                "SPOTIFY_PLAYER_URL must be an absolute url",
            )?,
            open_browser: parse_bool(
                lookup("SPOTIFY_LOGIN_OPEN_BROWSER").as_deref(),
                "SPOTIFY_LOGIN_OPEN_BROWSER must be a boolean",
            )?,
            check_player: parse_bool(
                lookup("SPOTIFY_LOGIN_CHECK_PLAYER").as_deref(),
                "SPOTIFY_LOGIN_CHECK_PLAYER must be a boolean",
            )?,
            redirect_uri,
            redirect_url,
            scopes,
            capture,
        })
    }
}

/// Loopback redirect uris can be served by the local listener, anything else needs the operator.
fn default_capture_mode(redirect_uri: &Url) -> CaptureMode {
    let loopback = match redirect_uri.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };
    if loopback && redirect_uri.scheme() == "http" {
        CaptureMode::Listener
    } else {
        CaptureMode::Manual
    }
}

fn parse_url(value: Option<&str>, default: &str, msg: &'static str) -> Result<Url> {
    let raw = value.map(str::trim).unwrap_or(default);
    Url::parse(raw)
        .change_context(LoginError::Config(msg))
        .attach_printable_lazy(|| raw.to_string())
}

fn parse_bool(value: Option<&str>, msg: &'static str) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => {
            Err(Report::new(LoginError::Config(msg)).attach_printable(other.to_string()))
        }
    }
}
