//! Authorization code transports
//!
//! The interactive part of the OAuth flow needs the authorization code the
//! provider hands back after consent. Two strategies deliver it:
//! - [`LoopbackTransport`]: a local HTTP listener receives the redirect
//! - [`ManualTransport`]: the user pastes the code (or the whole redirect URL)

use log::{debug, warn};
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;
use url::Url;

use super::secrets::ClientSecrets;
use crate::error::{Error, Result};

/// Delivers an authorization code for a prepared authorization URL
pub trait AuthorizationTransport {
    /// Redirect URI registered with the authorization request
    fn redirect_uri(&self, secrets: &ClientSecrets) -> String;

    /// Present the authorization URL to the user and wait for the code
    fn receive_code(&mut self, authorization_url: &str) -> Result<String>;
}

/// How long an accepted connection may stay silent before it is dropped
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Receives the OAuth redirect on a local TCP listener
pub struct LoopbackTransport {
    listener: TcpListener,
    port: u16,
    open_browser: bool,
    read_timeout: Duration,
}

impl LoopbackTransport {
    /// Bind an ephemeral port on the loopback interface
    pub fn bind() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        Ok(Self {
            listener,
            port,
            open_browser: true,
            read_timeout: CALLBACK_READ_TIMEOUT,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether to launch the system browser on the authorization URL
    pub fn open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Per-connection read timeout while waiting for the redirect
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

impl AuthorizationTransport for LoopbackTransport {
    fn redirect_uri(&self, _secrets: &ClientSecrets) -> String {
        format!("http://localhost:{}/", self.port)
    }

    fn receive_code(&mut self, authorization_url: &str) -> Result<String> {
        println!("\n=== Google Authentication Required ===");
        if self.open_browser {
            println!("Opening browser for authentication...");
            if let Err(e) = open::that(authorization_url) {
                warn!("Failed to open browser: {}. Please open the URL manually.", e);
            }
        }
        println!("If the browser doesn't open, visit: {}", authorization_url);
        println!("Waiting for authorization...");

        loop {
            let (mut stream, peer) = self.listener.accept()?;
            debug!("OAuth callback connection from {}", peer);
            let handled = stream
                .set_read_timeout(Some(self.read_timeout))
                .and_then(|()| handle_callback(&mut stream));
            match handled {
                Ok(Some(outcome)) => return outcome,
                Ok(None) => {}
                // A reset or silent socket must not cancel the login
                Err(e) => warn!("Dropping OAuth callback connection from {}: {}", peer, e),
            }
        }
    }
}

/// Read one callback request; `None` when it carried neither code nor error
fn handle_callback(stream: &mut TcpStream) -> io::Result<Option<Result<String>>> {
    let mut request_line = String::new();
    {
        let mut reader = BufReader::new(&*stream);
        reader.read_line(&mut request_line)?;
        // Drain the headers so closing the socket doesn't reset the connection
        let mut header = String::new();
        while reader.read_line(&mut header)? > 0 && !header.trim().is_empty() {
            header.clear();
        }
    }

    // Format: GET /?code=AUTH_CODE&scope=... HTTP/1.1
    let query = request_line
        .split_whitespace()
        .nth(1)
        .and_then(|path| Url::parse(&format!("http://localhost{}", path)).ok());

    let mut code = None;
    let mut error = None;
    if let Some(url) = &query {
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "code" => code = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }
    }

    let (status, body, outcome) = match (code, error) {
        (_, Some(err)) => (
            "400 Bad Request",
            "Authentication failed. Please try again.",
            Some(Err(Error::Auth(format!("OAuth error: {}", err)))),
        ),
        (Some(code), None) => (
            "200 OK",
            "Authentication successful! You can close this window.",
            Some(Ok(code)),
        ),
        // favicon and other stray requests
        (None, None) => ("404 Not Found", "Not found.", None),
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
        status, body
    );
    stream.write_all(response.as_bytes()).ok();
    stream.flush().ok();

    Ok(outcome)
}

/// Prints the authorization URL and reads back a pasted code or redirect URL
pub struct ManualTransport<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ManualTransport<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl ManualTransport<BufReader<Stdin>, Stdout> {
    /// Console-backed transport
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> AuthorizationTransport for ManualTransport<R, W> {
    fn redirect_uri(&self, secrets: &ClientSecrets) -> String {
        secrets
            .redirect_uris
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost".to_string())
    }

    fn receive_code(&mut self, authorization_url: &str) -> Result<String> {
        let rule = "=".repeat(70);
        writeln!(self.output, "\n{rule}")?;
        writeln!(self.output, "  MANUAL AUTHENTICATION REQUIRED")?;
        writeln!(self.output, "{rule}")?;
        writeln!(self.output, "\n1. Open this URL in your browser:")?;
        writeln!(self.output, "\n   {authorization_url}")?;
        writeln!(
            self.output,
            "\n2. After authorizing, you'll be redirected to a URL like:"
        )?;
        writeln!(self.output, "   http://localhost/?code=AUTHORIZATION_CODE&scope=...")?;
        writeln!(
            self.output,
            "\n3. Paste either the code or the full redirect URL below"
        )?;
        writeln!(self.output, "{rule}\n")?;
        write!(self.output, "Authorization code or redirect URL: ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;

        extract_authorization_code(&line).inspect_err(|e| {
            let _ = writeln!(self.output, "ERROR: {e}");
        })
    }
}

/// Pull the authorization code out of pasted text
///
/// Accepts a bare code, a full redirect URL (`http://localhost:8080/?code=...`)
/// or just its query string (`?code=...&scope=...`). An `error` parameter in
/// the redirect is reported as an authentication failure.
pub fn extract_authorization_code(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidAuthorizationInput);
    }

    if let Ok(url) = Url::parse(input) {
        return code_from_query(url.query().unwrap_or_default());
    }

    if input.contains("code=") || input.contains("error=") {
        let query = input.rsplit_once('?').map_or(input, |(_, query)| query);
        return code_from_query(query);
    }

    if input.contains(char::is_whitespace) {
        return Err(Error::InvalidAuthorizationInput);
    }

    Ok(input.to_string())
}

fn code_from_query(query: &str) -> Result<String> {
    let mut code = None;
    for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match name.as_ref() {
            "error" => return Err(Error::Auth(format!("OAuth error: {}", value))),
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            _ => {}
        }
    }
    code.ok_or(Error::InvalidAuthorizationInput)
}
