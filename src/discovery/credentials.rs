//! Connection credentials extracted from the target's command line.

use std::collections::HashMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::discovery::DiscoveryError;

const PORT_ARG: &str = "app-port";
const TOKEN_ARG: &str = "remoting-auth-token";

/// Basic `Authorization` header value for `username:secret`.
pub fn build_basic_auth(username: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, secret)))
}

/// Port and token of one running service instance.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub port: u16,
    pub token: String,
}

impl Credentials {
    /// Extract `app-port` and `remoting-auth-token` from parsed arguments.
    pub fn from_args(args: &HashMap<String, String>) -> Result<Self, DiscoveryError> {
        let port = args.get(PORT_ARG).ok_or(DiscoveryError::MissingArgument(PORT_ARG))?;
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| DiscoveryError::InvalidPort(port.clone()))?;
        let token = args
            .get(TOKEN_ARG)
            .ok_or(DiscoveryError::MissingArgument(TOKEN_ARG))?
            .clone();
        Ok(Self { port, token })
    }

    /// Authorization header for `username` and this token.
    pub fn auth_header(&self, username: &str) -> String {
        build_basic_auth(username, &self.token)
    }
}

// The token is a secret; keep it out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("port", &self.port)
            .field("token", &"<redacted>")
            .finish()
    }
}
