use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ScanError;

/// A username with an optional password, or the anonymous variant when the
/// username is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Credential {
    pub username: String,
    pub password: Option<String>,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty()
    }

    /// The `user[:pass]` part of a URL, `None` for anonymous access.
    pub fn userinfo(&self) -> Option<String> {
        if self.is_anonymous() {
            return None;
        }
        Some(match &self.password {
            Some(password) => format!("{}:{}", self.username, password),
            None => self.username.clone(),
        })
    }

    /// Parses a comma separated list, dropping repeats.
    ///
    /// An empty input yields an empty list; the candidate generator treats
    /// that as a single anonymous attempt.
    pub fn parse_list(s: &str) -> Result<Vec<Credential>, ScanError> {
        let mut seen = HashSet::new();
        let mut credentials = Vec::new();

        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let credential: Credential = token.parse()?;
            if seen.insert(credential.clone()) {
                credentials.push(credential);
            }
        }

        Ok(credentials)
    }
}

impl FromStr for Credential {
    type Err = ScanError;

    /// `user:pass`, `user` (no password) or `none` (anonymous).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") {
            return Ok(Credential::anonymous());
        }

        let (username, password) = match s.split_once(':') {
            Some((user, pass)) => (user, Some(pass).filter(|p| !p.is_empty())),
            None => (s, None),
        };

        if username.is_empty() {
            return Err(ScanError::InvalidConfig(format!("credential '{s}' has no username")));
        }
        if username.contains(['@', '/']) || password.is_some_and(|p| p.contains(['@', '/'])) {
            return Err(ScanError::InvalidConfig(format!(
                "credential '{s}' contains a URL delimiter"
            )));
        }

        Ok(Credential::new(username, password.map(str::to_string)))
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.userinfo() {
            Some(userinfo) => f.write_str(&userinfo),
            None => f.write_str("<anonymous>"),
        }
    }
}
