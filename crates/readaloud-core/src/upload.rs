//! Upload boundary: accepts exactly one PDF under the size ceiling.

use tracing::{debug, warn};

use crate::error::UploadRejection;
use crate::pdf::FileBlob;

/// Largest accepted upload (50 MB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Rules applied to files before they reach the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Maximum size in bytes.
    pub max_file_size: u64,
    /// Substring the media type must contain.
    pub accepted_type: String,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            accepted_type: "pdf".to_string(),
        }
    }
}

impl UploadPolicy {
    /// Check a single file. A wrong type is reported before a size problem.
    pub fn check<F: FileBlob + ?Sized>(&self, file: &F) -> Result<(), UploadRejection> {
        if !file.media_type().contains(&self.accepted_type) {
            return Err(UploadRejection::WrongType {
                media_type: file.media_type().to_string(),
            });
        }
        if file.size() > self.max_file_size {
            return Err(UploadRejection::TooLarge {
                size: file.size(),
                limit_mb: self.max_file_size / (1024 * 1024),
            });
        }
        Ok(())
    }

    /// Pick the single acceptable file out of a drop or picker selection.
    ///
    /// An empty selection is not an error and yields `Ok(None)`.
    pub fn accept_single<'a, F: FileBlob>(
        &self,
        files: &'a [F],
    ) -> Result<Option<&'a F>, UploadRejection> {
        let file = match files {
            [] => return Ok(None),
            [file] => file,
            _ => {
                warn!("Rejected drop of {} files", files.len());
                return Err(UploadRejection::TooManyFiles { count: files.len() });
            }
        };

        if let Err(rejection) = self.check(file) {
            warn!("Rejected upload {}: {:?}", file.name(), rejection);
            return Err(rejection);
        }

        debug!("Accepted upload {} ({} bytes)", file.name(), file.size());
        Ok(Some(file))
    }
}
