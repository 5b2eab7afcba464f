//! Session-gated routing.
//!
//! Every request path is either public, bypassed (API routes and static
//! assets) or protected. Protected paths need a session cookie; signed-in
//! users are sent away from the login and registration forms.

use portico_core::classify::PathClassification;
use portico_core::session::SessionToken;
use portico_core::{Error, Result};
use regex::Regex;

use crate::config::GateSettings;

/// What the gate does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Forward,
    /// Temporary redirect to this location.
    Redirect(String),
}

pub struct AuthGate {
    settings: GateSettings,
    excluded: Vec<Regex>,
}

impl AuthGate {
    pub fn new(settings: GateSettings) -> Result<Self> {
        let excluded = settings
            .excluded_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    Error::Config(format!("Invalid gate exclusion {:?}: {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { settings, excluded })
    }

    pub fn session_cookie(&self) -> &str {
        &self.settings.session_cookie
    }

    /// Paths the gate never runs for.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.iter().any(|re| re.is_match(path))
    }

    pub fn classify(&self, path: &str) -> PathClassification {
        if path.starts_with(&self.settings.api_prefix) || self.is_asset(path) {
            PathClassification::Bypassed
        } else if self.settings.public_paths.iter().any(|p| p == path) {
            PathClassification::Public
        } else {
            PathClassification::Protected
        }
    }

    pub fn decide(&self, path: &str, session: Option<&SessionToken>) -> GateDecision {
        match self.classify(path) {
            PathClassification::Bypassed => GateDecision::Forward,
            PathClassification::Public => {
                let on_auth_form = self.settings.auth_form_paths.iter().any(|p| p == path);
                if session.is_some() && on_auth_form {
                    GateDecision::Redirect(self.settings.landing_path.clone())
                } else {
                    GateDecision::Forward
                }
            }
            PathClassification::Protected => match session {
                Some(_) => GateDecision::Forward,
                None => GateDecision::Redirect(self.login_redirect(path)),
            },
        }
    }

    fn login_redirect(&self, path: &str) -> String {
        format!(
            "{}?{}={}",
            self.settings.login_path,
            self.settings.redirect_param,
            encode_query_value(path)
        )
    }

    fn is_asset(&self, path: &str) -> bool {
        if self
            .settings
            .asset_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return true;
        }
        match path.rsplit_once('.') {
            Some((_, ext)) => self.settings.asset_extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}

/// Percent-encode the bytes that would break a query value. `/` stays literal.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b' ' | b'"' | b'#' | b'%' | b'&' | b'+' | b'<' | b'>' | b'?' | b'=' => {
                out.push_str(&format!("%{:02X}", byte))
            }
            0x00..=0x1F | 0x7F..=0xFF => out.push_str(&format!("%{:02X}", byte)),
            _ => out.push(byte as char),
        }
    }
    out
}
