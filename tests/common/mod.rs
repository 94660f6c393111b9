use std::collections::HashMap;

use spotify_login::Config;
use wiremock::MockServer;

/// Config pointing every Spotify endpoint at `server`.
pub fn config_for(server: &MockServer, vars: &[(&str, &str)]) -> Config {
    let mut all: HashMap<String, String> = HashMap::from([
        ("SPOTIFY_AUTHORIZE_URL".to_string(), format!("{}/authorize", server.uri())),
        ("SPOTIFY_TOKEN_URL".to_string(), format!("{}/api/token", server.uri())),
        ("SPOTIFY_PLAYER_URL".to_string(), format!("{}/v1/me/player", server.uri())),
    ]);
    all.extend(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    Config::from_lookup(|key| all.get(key).cloned()).unwrap()
}
