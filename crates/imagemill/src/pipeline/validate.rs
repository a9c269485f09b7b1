//! Upload validation before any transform runs.

use std::io::Read;

use crate::config::{UploadLimits, UploadPolicy};
use crate::error::RejectionReason;
use crate::types::RawUpload;

/// Rejects unacceptable uploads before the pipeline writes anything.
///
/// Checks run in order: MIME allow-list, declared size against the
/// policy ceiling, then a magic-byte sniff of the spooled file. The full
/// decodability check is completed by the decode stage; a decode failure
/// is still reported as [`RejectionReason::Undecodable`] before any
/// variant file exists.
pub struct Validator {
    limits: UploadLimits,
}

impl Validator {
    /// Create a new validator with the given upload policy.
    pub fn new(limits: UploadLimits) -> Self {
        Self { limits }
    }

    /// Validate an upload against the given size policy.
    ///
    /// Read-only: rejection never leaves anything behind.
    pub fn validate(&self, upload: &RawUpload, policy: &UploadPolicy) -> Result<(), RejectionReason> {
        let mime = upload.declared_mime.to_ascii_lowercase();
        if !self.limits.allowed_mime_types.iter().any(|m| m == &mime) {
            return Err(RejectionReason::UnsupportedFormat {
                mime: upload.declared_mime.clone(),
            });
        }

        if upload.declared_len > policy.max_bytes {
            return Err(RejectionReason::TooLarge {
                len: upload.declared_len,
                max: policy.max_bytes,
            });
        }

        // Spooled size can disagree with the declared size; the ceiling
        // applies to what is actually on disk.
        let actual_len = std::fs::metadata(&upload.temp_path)
            .map_err(|e| RejectionReason::Undecodable {
                message: format!("cannot stat upload: {}", e),
            })?
            .len();
        if actual_len > policy.max_bytes {
            return Err(RejectionReason::TooLarge {
                len: actual_len,
                max: policy.max_bytes,
            });
        }

        self.check_magic_bytes(upload)
    }

    /// Sniff the file header to verify it looks like an allow-listed raster format.
    fn check_magic_bytes(&self, upload: &RawUpload) -> Result<(), RejectionReason> {
        let mut file =
            std::fs::File::open(&upload.temp_path).map_err(|e| RejectionReason::Undecodable {
                message: format!("cannot open upload: {}", e),
            })?;

        let mut header = [0u8; 12];
        let bytes_read = file.read(&mut header).unwrap_or(0);

        if bytes_read < 4 {
            return Err(RejectionReason::Undecodable {
                message: "file too small to be a valid image".to_string(),
            });
        }

        if Self::is_valid_image_header(&header, bytes_read) {
            Ok(())
        } else {
            Err(RejectionReason::Undecodable {
                message: "unrecognized image header".to_string(),
            })
        }
    }

    /// Check if the header bytes match one of the accepted raster formats.
    fn is_valid_image_header(header: &[u8; 12], bytes_read: usize) -> bool {
        if bytes_read < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header[0] == 0xFF && header[1] == 0xD8 && header[2] == 0xFF {
            return true;
        }

        // PNG: 89 50 4E 47
        if header[0] == 0x89 && header[1] == b'P' && header[2] == b'N' && header[3] == b'G' {
            return true;
        }

        // GIF: GIF8
        if header[0] == b'G' && header[1] == b'I' && header[2] == b'F' && header[3] == b'8' {
            return true;
        }

        // WebP: RIFF....WEBP
        if header[0] == b'R' && header[1] == b'I' && header[2] == b'F' && header[3] == b'F' {
            if bytes_read >= 12 {
                return header[8] == b'W'
                    && header[9] == b'E'
                    && header[10] == b'B'
                    && header[11] == b'P';
            }
            // Truncated RIFF header, let the decoder decide
            return true;
        }

        false
    }
}
