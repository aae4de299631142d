//! Google OAuth helpers for the browser-based login.
//!
//! The flow: open `authorization_url()` in a browser, let Google redirect to
//! the configured redirect URI, take the `code` from that redirect and
//! exchange it with `ApiClient::exchange_oauth_code`. When the redirect URI
//! points at this machine, `CallbackListener` catches the redirect directly.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::Config;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const OAUTH_SCOPE: &str = "email profile";

/// How long to wait for the browser redirect
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 120;

/// Idle connections (browser preconnects) are dropped after this long
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Redirect URI must point at this machine to listen for it: {0}")]
    NotLoopback(String),

    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out waiting for the OAuth redirect")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the Google authorization URL for this client
pub fn authorization_url(config: &Config) -> Result<Url, OAuthError> {
    Url::parse_with_params(
        GOOGLE_AUTH_URL,
        &[
            ("client_id", config.oauth_client_id.as_str()),
            ("redirect_uri", config.oauth_redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", OAUTH_SCOPE),
            ("access_type", "offline"),
        ],
    )
    .map_err(|e| OAuthError::InvalidUrl(e.to_string()))
}

/// Query parameters Google appends to the redirect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse a raw query string (with or without the leading `?`)
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        // Any absolute base works; only the query is read back
        match Url::parse(&format!("http://localhost/?{}", query)) {
            Ok(url) => Self::from_parsed(&url),
            Err(_) => Self::default(),
        }
    }

    /// Parse a full redirect URL as pasted from the browser, or a bare query string
    pub fn from_url(input: &str) -> Result<Self, OAuthError> {
        let input = input.trim();
        if input.contains("://") {
            let url = Url::parse(input).map_err(|e| OAuthError::InvalidUrl(e.to_string()))?;
            Ok(Self::from_parsed(&url))
        } else {
            Ok(Self::from_query(input))
        }
    }

    fn from_parsed(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" if !value.is_empty() => params.code = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// One-shot loopback HTTP listener for the OAuth redirect.
pub struct CallbackListener {
    listener: TcpListener,
    path: String,
}

impl CallbackListener {
    /// Bind on the port of `redirect_uri`, which must be a loopback URL.
    /// Port 0 binds an ephemeral port (see `local_addr`).
    pub async fn bind(redirect_uri: &str) -> Result<Self, OAuthError> {
        let url = Url::parse(redirect_uri).map_err(|e| OAuthError::InvalidUrl(e.to_string()))?;
        match url.host_str() {
            Some("localhost") | Some("127.0.0.1") => {}
            _ => return Err(OAuthError::NotLoopback(redirect_uri.to_string())),
        }
        let port = url
            .port_or_known_default()
            .ok_or_else(|| OAuthError::InvalidUrl(redirect_uri.to_string()))?;

        let addr = format!("127.0.0.1:{}", port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| OAuthError::Bind { addr: addr.clone(), source })?;
        info!(addr = %addr, path = url.path(), "OAuth callback listener ready");

        Ok(Self {
            listener,
            path: url.path().to_string(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, OAuthError> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for the redirect, answer the browser and return its parameters.
    /// Requests for other paths get a 404 and the wait continues, as it does
    /// after a connection that fails or goes idle.
    pub async fn wait(self, timeout: Duration) -> Result<CallbackParams, OAuthError> {
        tokio::time::timeout(timeout, self.accept_loop())
            .await
            .map_err(|_| OAuthError::Timeout)?
    }

    async fn accept_loop(&self) -> Result<CallbackParams, OAuthError> {
        loop {
            let (mut socket, peer) = self.listener.accept().await?;
            debug!(peer = %peer, "OAuth callback connection");
            match tokio::time::timeout(CONNECTION_TIMEOUT, self.handle_connection(&mut socket)).await {
                Ok(Ok(Some(params))) => return Ok(params),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => warn!(peer = %peer, error = %e, "OAuth callback connection failed"),
                Err(_) => debug!(peer = %peer, "OAuth callback connection idle, dropping"),
            }
        }
    }

    async fn handle_connection(&self, socket: &mut TcpStream) -> Result<Option<CallbackParams>, OAuthError> {
        let (reader, mut writer) = socket.split();
        let mut reader = BufReader::new(reader);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        // Drain headers so the browser sees a clean response
        loop {
            let mut header = String::new();
            let n = reader.read_line(&mut header).await?;
            if n == 0 || header == "\r\n" || header == "\n" {
                break;
            }
        }

        // GET /auth/callback?code=... HTTP/1.1
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();
        let (path, query) = target.split_once('?').unwrap_or((target, ""));

        if method != "GET" || path != self.path {
            send_response(&mut writer, 404, "Not Found", "Not Found").await?;
            return Ok(None);
        }

        let params = CallbackParams::from_query(query);
        let page = if params.error.is_some() || params.code.is_none() {
            result_page("Authentication failed", "You can close this window and try again.")
        } else {
            result_page("Authentication received", "You can close this window and return to the terminal.")
        };
        send_response(&mut writer, 200, "OK", &page).await?;
        Ok(Some(params))
    }
}

async fn send_response<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    status_code: u16,
    status_text: &str,
    body: &str,
) -> Result<(), OAuthError> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_code,
        status_text,
        body.len(),
        body
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

fn result_page(title: &str, detail: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Reply.sh - {title}</title></head>\n\
         <body style=\"font-family: system-ui; text-align: center; padding: 50px;\">\n\
         <h1>{title}</h1>\n<p>{detail}</p>\n</body>\n</html>"
    )
}
