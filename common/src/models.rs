pub mod candidate;
pub mod credential;
pub mod report;
pub mod target;

pub use candidate::{Candidate, CandidateGenerator, PathTemplate};
pub use credential::Credential;
pub use report::{OpenPortResult, ProbeResult, RunStatus, ScanReport, ScanStats, VerifiedStream};
pub use target::Target;
