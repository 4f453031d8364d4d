pub mod finding;
pub mod request;

pub use finding::{sanitize_findings, Finding, RawFinding, INVALID_IMAGE};
pub use request::AnalyzeRequest;
