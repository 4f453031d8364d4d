//! Capture → preview → analyze workflow.
//!
//! `Idle → Previewing → Analyzing → {Results | Error}`, with `reset` returning
//! to `Idle` from anywhere. At most one analysis runs at a time.

use crate::asset::ImageAsset;
use crate::capture::{CameraDevice, CameraSession, CaptureSource};
use crate::client::AnalysisBackend;
use crate::error::{CameraError, ClientError};
use crate::findings::AnalysisFinding;
use crate::normalizer::Normalizer;
use crate::validation::validate_upload;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    /// A normalized photo is ready to submit.
    Previewing { image: ImageAsset },
    Analyzing { image: ImageAsset },
    Results {
        image: ImageAsset,
        findings: Vec<AnalysisFinding>,
    },
    Error { image: ImageAsset, message: String },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Previewing { .. } => "previewing",
            WorkflowState::Analyzing { .. } => "analyzing",
            WorkflowState::Results { .. } => "showing results",
            WorkflowState::Error { .. } => "showing an error",
        }
    }

    /// States from which a new photo may be picked.
    fn accepts_new_image(&self) -> bool {
        matches!(
            self,
            WorkflowState::Idle | WorkflowState::Results { .. } | WorkflowState::Error { .. }
        )
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds the single in-flight slot; releases it on drop unless a reset already did.
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<u64>>,
    ticket: u64,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(slot: &'a Mutex<Option<u64>>, ticket: u64) -> Result<Self, ClientError> {
        let mut current = lock(slot);
        if current.is_some() {
            return Err(ClientError::AnalysisInProgress);
        }
        *current = Some(ticket);
        Ok(Self { slot, ticket })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut current = lock(self.slot);
        if *current == Some(self.ticket) {
            *current = None;
        }
    }
}

pub struct Workflow {
    backend: Arc<dyn AnalysisBackend>,
    normalizer: Normalizer,
    state: Mutex<WorkflowState>,
    in_flight: Mutex<Option<u64>>,
    /// Bumped by every reset while holding `state`; results from an older
    /// epoch are dropped.
    epoch: AtomicU64,
    next_ticket: AtomicU64,
    camera: Mutex<Option<CameraSession>>,
}

impl Workflow {
    pub fn new(backend: Arc<dyn AnalysisBackend>, normalizer: Normalizer) -> Self {
        Self {
            backend,
            normalizer,
            state: Mutex::new(WorkflowState::Idle),
            in_flight: Mutex::new(None),
            epoch: AtomicU64::new(0),
            next_ticket: AtomicU64::new(1),
            camera: Mutex::new(None),
        }
    }

    pub fn state(&self) -> WorkflowState {
        lock(&self.state).clone()
    }

    pub fn is_analyzing(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    pub fn camera_open(&self) -> bool {
        lock(&self.camera).is_some()
    }

    fn ensure_accepts_new_image(&self, action: &'static str) -> Result<(), ClientError> {
        let state = lock(&self.state);
        if state.accepts_new_image() {
            Ok(())
        } else {
            Err(ClientError::InvalidTransition {
                action,
                state: state.name(),
            })
        }
    }

    /// Validate and normalize a photo, then show it for review.
    ///
    /// Rejected photos leave the current state untouched.
    pub async fn select_image(&self, asset: ImageAsset) -> Result<(), ClientError> {
        self.ensure_accepts_new_image("select an image")?;
        validate_upload(&asset)?;

        let normalizer = self.normalizer;
        let normalized = tokio::task::spawn_blocking(move || normalizer.normalize(&asset))
            .await
            .map_err(|e| ClientError::Decode(format!("normalization task failed: {}", e)))??;

        let mut state = lock(&self.state);
        if !state.accepts_new_image() {
            return Err(ClientError::InvalidTransition {
                action: "select an image",
                state: state.name(),
            });
        }

        tracing::info!(
            file = %normalized.file_name,
            dimensions = ?normalized.dimensions,
            bytes = normalized.size(),
            "Image ready for analysis"
        );
        *state = WorkflowState::Previewing { image: normalized };
        Ok(())
    }

    /// Pull one photo from `source` and select it.
    pub async fn select_from(&self, source: &mut dyn CaptureSource) -> Result<(), ClientError> {
        self.ensure_accepts_new_image("select an image")?;
        let asset = source.capture().await?;
        self.select_image(asset).await
    }

    /// Start a camera preview. Replacing an open session releases the old device.
    pub fn open_camera(&self, device: Box<dyn CameraDevice>) -> Result<(), ClientError> {
        self.ensure_accepts_new_image("open the camera")?;

        let mut camera = lock(&self.camera);
        camera.take();
        *camera = Some(CameraSession::open(device)?);
        Ok(())
    }

    /// Snapshot the open camera, release it, and select the photo.
    pub async fn capture_photo(&self) -> Result<(), ClientError> {
        self.ensure_accepts_new_image("capture a photo")?;

        let photo = {
            let mut camera = lock(&self.camera);
            let mut session = camera.take().ok_or(CameraError::NotStreaming)?;
            session.take_photo()?
        };

        self.select_image(photo).await
    }

    /// Submit the previewed photo.
    ///
    /// A malformed server response counts as "no findings". Other failures put
    /// the workflow into `Error` and are returned to the caller.
    pub async fn analyze(&self) -> Result<Vec<AnalysisFinding>, ClientError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard::acquire(&self.in_flight, ticket)?;

        let (image, epoch) = {
            let mut state = lock(&self.state);
            let WorkflowState::Previewing { image } = &*state else {
                return Err(ClientError::InvalidTransition {
                    action: "analyze",
                    state: state.name(),
                });
            };
            let image = image.clone();
            *state = WorkflowState::Analyzing {
                image: image.clone(),
            };
            (image, self.epoch.load(Ordering::SeqCst))
        };

        let outcome = match self.backend.analyze(&image).await {
            Err(ClientError::MalformedResponse(reason)) => {
                tracing::warn!(%reason, "Malformed analysis response, treating as no findings");
                Ok(Vec::new())
            }
            other => other,
        };

        let mut state = lock(&self.state);
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("Workflow was reset during analysis, discarding result");
            return outcome;
        }

        *state = match &outcome {
            Ok(findings) => {
                tracing::info!(finding_count = findings.len(), "Analysis completed");
                WorkflowState::Results {
                    image,
                    findings: findings.clone(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Analysis failed");
                WorkflowState::Error {
                    image,
                    message: e.user_message(),
                }
            }
        };

        outcome
    }

    /// Back to `Idle`: forget the photo and results, release the camera and
    /// free the in-flight slot.
    pub fn reset(&self) {
        {
            // The epoch only moves under the state lock, so `analyze` can never
            // pair a pre-reset snapshot with a post-reset epoch.
            let mut state = lock(&self.state);
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *state = WorkflowState::Idle;
        }
        *lock(&self.in_flight) = None;
        lock(&self.camera).take();
    }
}
