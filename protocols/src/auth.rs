use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as Base64;

const NONCE_COUNT: &str = "00000001";

/// A `WWW-Authenticate` challenge the prober knows how to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic,
    Digest {
        realm: String,
        nonce: String,
        opaque: Option<String>,
        qop_auth: bool,
    },
}

impl Challenge {
    /// Parses a single header value. Unknown schemes yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (scheme, params) = value.split_once(' ').unwrap_or((value, ""));

        if scheme.eq_ignore_ascii_case("basic") {
            return Some(Challenge::Basic);
        }
        if !scheme.eq_ignore_ascii_case("digest") {
            return None;
        }

        let params = parse_params(params);
        let lookup = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
        };

        Some(Challenge::Digest {
            realm: lookup("realm")?,
            nonce: lookup("nonce")?,
            opaque: lookup("opaque"),
            qop_auth: lookup("qop").is_some_and(|q| q.split(',').any(|o| o.trim() == "auth")),
        })
    }

    /// Picks the strongest supported challenge out of several headers.
    pub fn select<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut basic = None;
        for challenge in values.into_iter().filter_map(Challenge::parse) {
            match challenge {
                Challenge::Digest { .. } => return Some(challenge),
                Challenge::Basic => basic = Some(challenge),
            }
        }
        basic
    }

    /// Value for the `Authorization` header of a retried request.
    pub fn authorization(&self, username: &str, password: &str, method: &str, uri: &str) -> String {
        match self {
            Challenge::Basic => basic_authorization(username, password),
            Challenge::Digest {
                realm,
                nonce,
                opaque,
                qop_auth,
            } => {
                let ha1 = hex_md5(&format!("{username}:{realm}:{password}"));
                let ha2 = hex_md5(&format!("{method}:{uri}"));

                let mut header = format!("Digest username=\"{username}\", realm=\"{realm}\", nonce=\"{nonce}\", uri=\"{uri}\"");

                let response = if *qop_auth {
                    let cnonce = hex_md5(&format!("{nonce}:{username}"))[..16].to_string();
                    header.push_str(&format!(", qop=auth, nc={NONCE_COUNT}, cnonce=\"{cnonce}\""));
                    hex_md5(&format!("{ha1}:{nonce}:{NONCE_COUNT}:{cnonce}:auth:{ha2}"))
                } else {
                    hex_md5(&format!("{ha1}:{nonce}:{ha2}"))
                };
                header.push_str(&format!(", response=\"{response}\""));

                if let Some(opaque) = opaque {
                    header.push_str(&format!(", opaque=\"{opaque}\""));
                }
                header
            }
        }
    }
}

pub fn basic_authorization(username: &str, password: &str) -> String {
    format!("Basic {}", Base64.encode(format!("{username}:{password}")))
}

fn hex_md5(input: &str) -> String {
    format!("{:x}", md5::compute(input))
}

/// Splits `key="value", key=value` pairs, honouring commas inside quotes.
fn parse_params(s: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut rest = s.trim();

    while !rest.is_empty() {
        let Some((key, after_key)) = rest.split_once('=') else {
            break;
        };
        let key = key.trim().trim_start_matches(',').trim().to_string();
        let after_key = after_key.trim_start();

        let (value, remainder) = if let Some(quoted) = after_key.strip_prefix('"') {
            match quoted.split_once('"') {
                Some((value, remainder)) => (value.to_string(), remainder),
                None => (quoted.to_string(), ""),
            }
        } else {
            match after_key.split_once(',') {
                Some((value, remainder)) => (value.trim().to_string(), remainder),
                None => (after_key.trim().to_string(), ""),
            }
        };

        params.push((key, value));
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    params
}
