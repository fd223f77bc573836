//! Identity of the currently selected video
//!
//! Written by the upload pipeline once per successful upload and read when a
//! generation is submitted.

use serde::Serialize;
use std::fmt;
use std::sync::RwLock;
use tracing::{info, warn};

/// Opaque server-side identifier of an uploaded (and transcribed) video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct VideoId(String);

impl VideoId {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holder for the selected video identity
#[derive(Debug, Default)]
pub(crate) struct UploadIdentity {
    current: RwLock<Option<VideoId>>,
}

impl UploadIdentity {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record the identity produced by a successful upload.
    ///
    /// A later upload replaces the previous identity entirely.
    pub(crate) fn on_video_uploaded(&self, id: VideoId) {
        info!(video_id = %id, "Video uploaded");
        match self.current.write() {
            Ok(mut current) => *current = Some(id),
            Err(poisoned) => {
                warn!("Upload identity lock was poisoned, recovering");
                *poisoned.into_inner() = Some(id);
            }
        }
    }

    /// The identity of the most recent successful upload, if any
    pub(crate) fn get(&self) -> Option<VideoId> {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_until_uploaded() {
        let upload = UploadIdentity::new();
        assert!(upload.get().is_none());
    }

    #[test]
    fn test_new_upload_overwrites_identity() {
        let upload = UploadIdentity::new();
        upload.on_video_uploaded(VideoId::new("video-1"));
        upload.on_video_uploaded(VideoId::new("video-2"));
        assert_eq!(upload.get(), Some(VideoId::new("video-2")));
    }

    #[test]
    fn test_video_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&VideoId::new("abc-123")).expect("serialize");
        assert_eq!(json, "\"abc-123\"");
    }
}
