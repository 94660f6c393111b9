use log::{debug, warn};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use url::Url;

/// What the player endpoint said about the account.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerStatus {
    /// Playback state as returned by Spotify.
    Active(serde_json::Value),
    /// The token works but nothing is playing.
    Idle,
    /// The request failed; carries the status when there was one.
    Unavailable(Option<StatusCode>),
}

/// Uses `access_token` against the player endpoint to show that it grants access.
pub async fn check_player(
    http: &reqwest::Client,
    player_url: &Url,
    access_token: &str,
) -> PlayerStatus {
    let header = match HeaderValue::from_str(&format!("Bearer {access_token}")) {
        Ok(h) => h,
        Err(e) => {
            warn!("Access token cannot be sent as a header: {e}");
            return PlayerStatus::Unavailable(None);
        }
    };

    let response = match http.get(player_url.clone()).header(AUTHORIZATION, header).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("Failed to reach the player endpoint: {e}");
            return PlayerStatus::Unavailable(None);
        }
    };

    match response.status() {
        StatusCode::NO_CONTENT => PlayerStatus::Idle,
        StatusCode::OK => match response.json::<serde_json::Value>().await {
            Ok(body) => PlayerStatus::Active(body),
            Err(e) => {
                warn!("Player endpoint returned an unreadable body: {e}");
                PlayerStatus::Unavailable(Some(StatusCode::OK))
            }
        },
        status => {
            debug!("Player endpoint body: {:?}", response.text().await.ok());
            warn!("Failed to read player state: {status}");
            PlayerStatus::Unavailable(Some(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn check(server: &MockServer, access_token: &str) -> PlayerStatus {
        let player_url = Url::parse(&format!("{}/v1/me/player", server.uri())).unwrap();
        check_player(&reqwest::Client::new(), &player_url, access_token).await
    }

    #[tokio::test]
    async fn active_playback_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/player"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "is_playing": true,
                "progress_ms": 1234
            })))
            .mount(&server)
            .await;

        let status = check(&server, "fresh").await;

        assert_eq!(
            status,
            PlayerStatus::Active(serde_json::json!({ "is_playing": true, "progress_ms": 1234 }))
        );
    }

    #[tokio::test]
    async fn no_content_means_idle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/player"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let status = check(&server, "fresh").await;

        assert_eq!(status, PlayerStatus::Idle);
    }

    #[tokio::test]
    async fn rejected_token_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/player"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "status": 401, "message": "Invalid access token" }
            })))
            .mount(&server)
            .await;

        let status = check(&server, "stale").await;

        assert_eq!(status, PlayerStatus::Unavailable(Some(StatusCode::UNAUTHORIZED)));
    }
}
