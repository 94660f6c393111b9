use std::io::Cursor;
use std::net::{SocketAddr, ToSocketAddrs};

use error_stack::{bail, Report, ResultExt};
use log::{debug, info, warn};
use serde::Deserialize;
use url::Url;

use crate::error::{LoginError, Result};
use crate::input::InputProvider;

const CLOSE_PAGE: &str = "<html><body><script>window.close();</script>\
    Authorization received, you can close this tab.</body></html>";
const MALFORMED_PAGE: &str = "<html><body>The authorization callback could not be read. \
    Check the console for details.</body></html>";

/// Query parameters Spotify appends to the redirect uri.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AuthCodeCallback {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}

impl AuthCodeCallback {
    pub fn from_query(query: &str) -> Result<AuthCodeCallback> {
        serde_urlencoded::from_str(query)
            .change_context(LoginError::CallbackServer)
            .attach_printable_lazy(|| format!("Error while parsing auth code callback: {query}"))
    }

    pub fn from_url(url: &Url) -> Result<AuthCodeCallback> {
        AuthCodeCallback::from_query(url.query().unwrap_or_default())
    }

    /// Returns the authorization code once the callback is known to answer our request.
    pub fn parse_for_code(self, state: &str) -> Result<String> {
        if let Some(error) = self.error {
            bail!(LoginError::AuthorizationDenied(error));
        }
        match self.state.as_deref() {
            Some(returned) if returned == state => {}
            returned => {
                return Err(Report::new(LoginError::StateMismatch)
                    .attach_printable(format!("sent: {state}"))
                    .attach_printable(format!("returned: {}", returned.unwrap_or("<none>"))))
            }
        }
        match self.code {
            Some(code) if !code.is_empty() => Ok(code),
            _ => bail!(LoginError::MissingAuthorizationCode),
        }
    }
}

/// Asks the operator for the page they were redirected to.
///
/// Accepts either the full redirect url or only the code, in which case the state is asked for
/// separately.
pub fn capture_manual<I>(input: &mut I) -> Result<AuthCodeCallback>
where
    I: InputProvider + ?Sized,
{
    let pasted = read_trimmed(
        input,
        "Paste the url you were redirected to, or only the characters after \"code\": ",
    )?;

    if let Ok(url) = Url::parse(&pasted) {
        let callback = AuthCodeCallback::from_url(&url)?;
        if callback.code.is_some() || callback.error.is_some() {
            return Ok(callback);
        }
        debug!("Pasted url carries no code, treating it as the code itself");
    }

    let state = read_trimmed(input, "Paste the characters after \"state\": ")?;
    Ok(AuthCodeCallback {
        code: Some(pasted),
        error: None,
        state: Some(state).filter(|s| !s.is_empty()),
    })
}

fn read_trimmed<I: InputProvider + ?Sized>(input: &mut I, prompt: &str) -> Result<String> {
    let line = input.read_line(prompt).change_context(LoginError::Input)?;
    Ok(line.trim().trim_matches('"').to_string())
}

/// Local http listener that receives the authorization redirect.
pub struct CallbackCaptureServer {
    server: tiny_http::Server,
    path: String,
}

impl CallbackCaptureServer {
    /// Listens on the host and port of `redirect_uri`.
    pub fn bind(redirect_uri: &Url) -> Result<CallbackCaptureServer> {
        let host = match redirect_uri.host_str() {
            Some(h) => h,
            None => bail!(LoginError::Config("SPOTIFY_REDIRECT_URI has no host to listen on")),
        };
        let port = match redirect_uri.port_or_known_default() {
            Some(p) => p,
            None => bail!(LoginError::Config("SPOTIFY_REDIRECT_URI has no port to listen on")),
        };
        CallbackCaptureServer::bind_addr(format!("{host}:{port}"), redirect_uri.path())
    }

    pub fn bind_addr<A: ToSocketAddrs>(addr: A, path: &str) -> Result<CallbackCaptureServer> {
        let server = match tiny_http::Server::http(addr) {
            Ok(s) => s,
            Err(e) => {
                return Err(Report::new(LoginError::CallbackServer)
                    .attach_printable(format!("Unable to start http server: {e}")))
            }
        };
        Ok(CallbackCaptureServer {
            server,
            path: path.to_string(),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Blocks until a request for the redirect path arrives and returns its parameters.
    pub fn capture(self) -> Result<AuthCodeCallback> {
        info!("Waiting for the authorization callback on {}", self.path);
        loop {
            let request = self
                .server
                .recv()
                .change_context(LoginError::CallbackServer)
                .attach_printable("Error receiving auth code callback request")?;

            let url = request.url().to_string();
            let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

            if path != self.path {
                debug!("Ignoring request for {url}");
                request
                    .respond(tiny_http::Response::empty(tiny_http::StatusCode(404)))
                    .change_context(LoginError::CallbackServer)?;
                continue;
            }

            let callback = match AuthCodeCallback::from_query(query) {
                Ok(c) => c,
                Err(report) => {
                    if let Err(e) = request.respond(html_response(MALFORMED_PAGE, 400)) {
                        warn!("Error responding to malformed callback request: {e}");
                    }
                    return Err(report);
                }
            };

            request
                .respond(html_response(CLOSE_PAGE, 200))
                .change_context(LoginError::CallbackServer)
                .attach_printable("Error responding to auth code callback request")?;

            return Ok(callback);
        }
    }
}

fn html_response(body: &str, status: u16) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let response =
        tiny_http::Response::from_string(body).with_status_code(tiny_http::StatusCode(status));
    match tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}
