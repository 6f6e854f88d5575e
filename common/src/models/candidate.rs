//! Candidate endpoints: the cross product of open targets, credentials and
//! stream paths, produced lazily in target-major order.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::models::{Credential, Target};

/// An RTSP path, always starting with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PathTemplate(String);

impl PathTemplate {
    pub fn new(path: &str) -> Self {
        let path = path.trim();
        if path.starts_with('/') {
            Self(path.to_string())
        } else {
            Self(format!("/{path}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a comma separated list, dropping blanks and repeats.
    pub fn parse_list(s: &str) -> Vec<PathTemplate> {
        let mut seen = HashSet::new();
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathTemplate::new)
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One fully specified RTSP endpoint awaiting probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Position in generation order, used to keep reports stable.
    #[serde(skip)]
    pub ordinal: usize,
    pub target: Target,
    #[serde(skip)]
    pub credential: Credential,
    pub path: PathTemplate,
    pub url: String,
}

impl Candidate {
    pub fn new(ordinal: usize, target: Target, credential: Credential, path: PathTemplate) -> Self {
        let url = rtsp_url(&target, credential.userinfo().as_deref(), &path);
        Self {
            ordinal,
            target,
            credential,
            path,
            url,
        }
    }

    /// The URL without userinfo, as sent on the RTSP request line.
    pub fn request_uri(&self) -> String {
        rtsp_url(&self.target, None, &self.path)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// `rtsp://[userinfo@]host:port/path`
pub fn rtsp_url(target: &Target, userinfo: Option<&str>, path: &PathTemplate) -> String {
    match userinfo {
        Some(userinfo) => format!("rtsp://{userinfo}@{target}{path}"),
        None => format!("rtsp://{target}{path}"),
    }
}

/// Lazily walks targets × credentials × paths.
///
/// An empty credential list stands for a single anonymous attempt.
pub struct CandidateGenerator {
    targets: Vec<Target>,
    credentials: Vec<Credential>,
    paths: Vec<PathTemplate>,
    next: usize,
}

impl CandidateGenerator {
    pub fn new(targets: Vec<Target>, credentials: Vec<Credential>, paths: Vec<PathTemplate>) -> Self {
        let credentials = if credentials.is_empty() {
            vec![Credential::anonymous()]
        } else {
            credentials
        };

        Self {
            targets,
            credentials,
            paths,
            next: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.targets.len() * self.credentials.len() * self.paths.len()
    }
}

impl Iterator for CandidateGenerator {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.next >= self.total() {
            return None;
        }

        let ordinal = self.next;
        let per_target = self.credentials.len() * self.paths.len();
        let target = self.targets[ordinal / per_target];
        let credential = &self.credentials[(ordinal % per_target) / self.paths.len()];
        let path = &self.paths[ordinal % self.paths.len()];

        self.next += 1;
        Some(Candidate::new(ordinal, target, credential.clone(), path.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CandidateGenerator {}
