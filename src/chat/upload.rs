// Single-file upload slot: Selected -> Uploading -> Done | Failed

use crate::client::AssistantBackend;
use crate::error::{TransportError, ValidationError};
use crate::events::{EventBroadcaster, UploadStatusPayload, EVENT_UPLOAD_STATUS_CHANGED};
use crate::models::{PendingUpload, UploadStatus};
use crate::utils::{display_name, lock_mutex_recover};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Rejected(ValidationError),
    /// Accepted by the service; the slot is empty again
    Uploaded(PathBuf),
    /// The slot keeps the file in `Failed` for a manual retry
    Failed(TransportError),
}

/// Holds at most one pending upload. Runs independently of the chat pipeline.
pub struct UploadSlot {
    pending: Mutex<Option<PendingUpload>>,
    backend: Arc<dyn AssistantBackend>,
    events: Arc<EventBroadcaster>,
}

impl UploadSlot {
    pub fn new(backend: Arc<dyn AssistantBackend>, events: Arc<EventBroadcaster>) -> Self {
        Self {
            pending: Mutex::new(None),
            backend,
            events,
        }
    }

    pub fn pending(&self) -> Option<PendingUpload> {
        lock_mutex_recover(&self.pending).clone()
    }

    /// Choose a file, replacing any earlier selection
    pub fn select(&self, path: impl AsRef<Path>) -> Result<PendingUpload, ValidationError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let metadata =
            std::fs::metadata(path).map_err(|_| ValidationError::FileNotFound(shown.clone()))?;
        if !metadata.is_file() {
            return Err(ValidationError::NotAFile(shown));
        }
        if metadata.len() == 0 {
            return Err(ValidationError::EmptyFile(shown));
        }

        let selection = PendingUpload {
            file: path.to_path_buf(),
            status: UploadStatus::Selected,
        };
        {
            let mut pending = lock_mutex_recover(&self.pending);
            if matches!(&*pending, Some(p) if p.status == UploadStatus::Uploading) {
                return Err(ValidationError::UploadInFlight);
            }
            *pending = Some(selection.clone());
        }

        self.broadcast_status(path, UploadStatus::Selected, None);
        Ok(selection)
    }

    /// Upload the selected file
    pub async fn upload(&self) -> UploadOutcome {
        let file = {
            let mut pending = lock_mutex_recover(&self.pending);
            match pending.as_mut() {
                None => return UploadOutcome::Rejected(ValidationError::NoFileSelected),
                Some(p) if p.status == UploadStatus::Uploading => {
                    return UploadOutcome::Rejected(ValidationError::UploadInFlight)
                }
                Some(p) => {
                    p.status = UploadStatus::Uploading;
                    p.file.clone()
                }
            }
        };
        self.broadcast_status(&file, UploadStatus::Uploading, None);

        match self.backend.upload(&file).await {
            Ok(()) => {
                *lock_mutex_recover(&self.pending) = None;
                log::info!("Uploaded {}", display_name(&file));
                self.broadcast_status(&file, UploadStatus::Done, None);
                UploadOutcome::Uploaded(file)
            }
            Err(e) => {
                if let Some(p) = lock_mutex_recover(&self.pending).as_mut() {
                    p.status = UploadStatus::Failed;
                }
                log::warn!("Upload of {} failed: {}", display_name(&file), e);
                self.broadcast_status(&file, UploadStatus::Failed, Some(e.to_string()));
                UploadOutcome::Failed(e)
            }
        }
    }

    fn broadcast_status(&self, file: &Path, status: UploadStatus, error: Option<String>) {
        self.events.broadcast(
            EVENT_UPLOAD_STATUS_CHANGED,
            UploadStatusPayload {
                file: display_name(file),
                status,
                error,
            },
        );
    }
}
