//! Interactive check of the Spotify authorization code flow.
//!
//! [`run`] asks for client credentials, sends the operator to the authorize page, captures the
//! redirect, exchanges the code for tokens and refreshes the access token once.

use error_stack::ResultExt;
use log::{info, warn};

pub mod config;
pub mod error;
pub mod input;
pub mod spotify;

pub use config::{CaptureMode, Config};
pub use error::{LoginError, Result};
pub use input::{InputProvider, ScriptedInput, StdinInput};

use spotify::auth::{self, Credentials, TokenResponse};
use spotify::callback::{self, CallbackCaptureServer};
use spotify::player::{self, PlayerStatus};

/// Everything Spotify handed out during one run.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Response to the authorization code exchange.
    pub exchanged: TokenResponse,
    /// Response to the refresh that followed it.
    pub refreshed: TokenResponse,
    /// Result of the player check, when it was enabled.
    pub player: Option<PlayerStatus>,
}

pub async fn run<I>(config: &Config, input: &mut I) -> Result<LoginOutcome>
where
    I: InputProvider + ?Sized,
{
    let http = reqwest::Client::new();

    let creds = Credentials::from_config_or_prompt(config, input)?;
    let auth_url = creds.authorization_url(config)?;

    // bind before anyone can follow the url
    let listener = match config.capture {
        CaptureMode::Listener => Some(CallbackCaptureServer::bind(&config.redirect_url)?),
        CaptureMode::Manual => None,
    };

    auth::check_authorization_url(&auth_url).await;

    println!("Launch the following URL in your browser to authorize access: {auth_url}");
    if config.open_browser {
        if let Err(e) = webbrowser::open(auth_url.as_str()) {
            warn!("Error opening authorization url: {e}");
        }
    }

    let callback = match listener {
        Some(server) => {
            println!("Waiting for Spotify to redirect to {}", config.redirect_uri);
            tokio::task::spawn_blocking(move || server.capture())
                .await
                .change_context(LoginError::CallbackServer)??
        }
        None => {
            println!("After granting access, you will be redirected to a webpage.\n");
            callback::capture_manual(input)?
        }
    };

    let code = callback.parse_for_code(creds.state())?;
    info!("Received authorization code");

    let creds = creds.add_auth_code(code).get_access_token(&http, config).await?;
    println!("{}", pretty(&creds.token().body));
    let exchanged = creds.token().clone();

    let creds = creds.refresh(&http, config).await?;
    println!("{}", pretty(&creds.token().body));
    let refreshed = creds.into_token();

    let player = if config.check_player {
        let status =
            player::check_player(&http, &config.player_url, &refreshed.tokens.access_token).await;
        match &status {
            PlayerStatus::Active(body) => println!("{}", pretty(body)),
            PlayerStatus::Idle => println!("Access token works, nothing is playing right now."),
            PlayerStatus::Unavailable(_) => {}
        }
        Some(status)
    } else {
        None
    };

    Ok(LoginOutcome {
        exchanged,
        refreshed,
        player,
    })
}

fn pretty(body: &serde_json::Value) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
}
