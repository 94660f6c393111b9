use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    UgcImageUpload,
    UserModifyPlaybackState,
    UserReadPlaybackState,
    UserReadCurrentlyPlaying,
    UserFollowModify,
    UserFollowRead,
    UserReadRecentlyPlayed,
    UserReadPlaybackPosition,
    UserTopRead,
    PlaylistReadCollaborative,
    PlaylistModifyPublic,
    PlaylistReadPrivate,
    PlaylistModifyPrivate,
    AppRemoteControl,
    Streaming,
    UserReadEmail,
    UserReadPrivate,
    UserLibraryModify,
    UserLibraryRead,
}

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: [Scope; 2] = [
    Scope::UserReadPlaybackState,
    Scope::UserReadPlaybackPosition,
];

const ALL_SCOPES: [Scope; 19] = [
    Scope::UgcImageUpload,
    Scope::UserModifyPlaybackState,
    Scope::UserReadPlaybackState,
    Scope::UserReadCurrentlyPlaying,
    Scope::UserFollowModify,
    Scope::UserFollowRead,
    Scope::UserReadRecentlyPlayed,
    Scope::UserReadPlaybackPosition,
    Scope::UserTopRead,
    Scope::PlaylistReadCollaborative,
    Scope::PlaylistModifyPublic,
    Scope::PlaylistReadPrivate,
    Scope::PlaylistModifyPrivate,
    Scope::AppRemoteControl,
    Scope::Streaming,
    Scope::UserReadEmail,
    Scope::UserReadPrivate,
    Scope::UserLibraryModify,
    Scope::UserLibraryRead,
];

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::UgcImageUpload => "ugc-image-upload",
            Scope::UserModifyPlaybackState => "user-modify-playback-state",
            Scope::UserReadPlaybackState => "user-read-playback-state",
            Scope::UserReadCurrentlyPlaying => "user-read-currently-playing",
            Scope::UserFollowModify => "user-follow-modify",
            Scope::UserFollowRead => "user-follow-read",
            Scope::UserReadRecentlyPlayed => "user-read-recently-played",
            Scope::UserReadPlaybackPosition => "user-read-playback-position",
            Scope::UserTopRead => "user-top-read",
            Scope::PlaylistReadCollaborative => "playlist-read-collaborative",
            Scope::PlaylistModifyPublic => "playlist-modify-public",
            Scope::PlaylistReadPrivate => "playlist-read-private",
            Scope::PlaylistModifyPrivate => "playlist-modify-private",
            Scope::AppRemoteControl => "app-remote-control",
            Scope::Streaming => "streaming",
            Scope::UserReadEmail => "user-read-email",
            Scope::UserReadPrivate => "user-read-private",
            Scope::UserLibraryModify => "user-library-modify",
            Scope::UserLibraryRead => "user-library-read",
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Unknown scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_SCOPES
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| UnknownScope(s.to_string()))
    }
}

/// Space-separated scope list as used in the `scope` query parameter.
pub fn to_scopes_string<'a, I>(scopes: I) -> String
where
    I: IntoIterator<Item = &'a Scope>,
{
    scopes
        .into_iter()
        .map(Scope::as_str)
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Parses a whitespace-separated scope list.
pub fn parse_scopes(s: &str) -> Result<Vec<Scope>, UnknownScope> {
    s.split_whitespace().map(Scope::from_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scopes_string() {
        assert_eq!(
            to_scopes_string(&DEFAULT_SCOPES),
            "user-read-playback-state user-read-playback-position"
        );
    }

    #[test]
    fn every_scope_parses_back() {
        for scope in ALL_SCOPES {
            assert_eq!(scope.to_string().parse::<Scope>(), Ok(scope));
        }
    }

    #[test]
    fn parse_scopes_rejects_unknown() {
        assert_eq!(
            parse_scopes("streaming  user-top-read"),
            Ok(vec![Scope::Streaming, Scope::UserTopRead])
        );
        assert_eq!(
            parse_scopes("streaming not-a-scope"),
            Err(UnknownScope("not-a-scope".to_string()))
        );
    }
}
