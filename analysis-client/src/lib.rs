//! Client side of the face analysis pipeline.
//!
//! Capture source → validation → normalizer → submission client → presentation,
//! driven by the [`workflow::Workflow`] state machine.

pub mod asset;
pub mod capture;
pub mod client;
pub mod config;
pub mod error;
pub mod findings;
pub mod normalizer;
pub mod presentation;
pub mod validation;
pub mod workflow;

pub use asset::ImageAsset;
pub use client::{AnalysisBackend, SubmissionClient};
pub use config::ClientConfig;
pub use error::ClientError;
pub use findings::AnalysisFinding;
pub use workflow::{Workflow, WorkflowState};
