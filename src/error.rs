use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, error_stack::Report<LoginError>>;

#[derive(thiserror::Error, Debug)]
pub enum LoginError {
    #[error("Error while reading console input")]
    Input,
    #[error("Invalid configuration: {0}")]
    Config(&'static str),
    #[error("Unable to build authorization url")]
    InvalidUrl,
    #[error("Error while capturing the authorization callback")]
    CallbackServer,
    #[error("Authorization was denied: {0}")]
    AuthorizationDenied(String),
    #[error("State sent to Spotify does not match the one returned")]
    StateMismatch,
    #[error("Auth code not present in callback")]
    MissingAuthorizationCode,
    #[error("Error sending request to Spotify")]
    Http,
    #[error(
        "Token request rejected with status {status}{}",
        describe_rejection(.error, .error_description)
    )]
    TokenRequestRejected {
        status: StatusCode,
        error: Option<String>,
        error_description: Option<String>,
    },
    #[error("Unable to parse token response: {0}")]
    MalformedTokenResponse(String),
}

fn describe_rejection(error: &Option<String>, description: &Option<String>) -> String {
    match (error, description) {
        (Some(e), Some(d)) => format!(": {e} ({d})"),
        (Some(e), None) => format!(": {e}"),
        (None, Some(d)) => format!(": {d}"),
        (None, None) => String::new(),
    }
}
