//! Path-addressed blob storage for candidate/student photos and payment
//! receipts, consumed through a gateway trait like every other external
//! collaborator. Size caps are enforced here, before any bytes travel.

use mime::Mime;

use crate::program::students::domain::StudentId;

/// Upper bound for profile photos.
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;
/// Upper bound for payment receipts.
pub const MAX_RECEIPT_BYTES: u64 = 10 * 1024 * 1024;

/// What a blob is used for; picks the size cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    ProfilePhoto,
    PaymentReceipt,
}

impl MediaKind {
    pub const fn max_bytes(self) -> u64 {
        match self {
            MediaKind::ProfilePhoto => MAX_PHOTO_BYTES,
            MediaKind::PaymentReceipt => MAX_RECEIPT_BYTES,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MediaKind::ProfilePhoto => "profile photo",
            MediaKind::PaymentReceipt => "payment receipt",
        }
    }
}

/// Stored blob descriptor returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub path: String,
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("{kind} exceeds the {max} byte limit ({found} bytes)")]
    TooLarge { kind: &'static str, max: u64, found: u64 },
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("media backend failed: {0}")]
    Backend(String),
}

/// Gateway to the blob store.
pub trait MediaStore: Send + Sync {
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &Mime,
    ) -> Result<StoredMedia, MediaError>;
    fn download_url(&self, path: &str) -> Result<String, MediaError>;
    fn delete(&self, path: &str) -> Result<(), MediaError>;
}

/// `{collection}/{id}/profile.{ext}`
pub fn profile_photo_path(collection: &str, id: &str, extension: &str) -> String {
    format!("{collection}/{id}/profile.{extension}")
}

/// `payment-receipts/{studentId}/{timestamp}.{ext}`
pub fn receipt_path(student_id: &StudentId, timestamp_millis: i64, extension: &str) -> String {
    format!("payment-receipts/{}/{timestamp_millis}.{extension}", student_id.0)
}

/// Reject a blob that exceeds the cap for its kind.
pub fn check_size(kind: MediaKind, size: u64) -> Result<(), MediaError> {
    if size > kind.max_bytes() {
        return Err(MediaError::TooLarge {
            kind: kind.label(),
            max: kind.max_bytes(),
            found: size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_the_storage_layout() {
        assert_eq!(
            profile_photo_path("students", "stu-000001", "jpg"),
            "students/stu-000001/profile.jpg"
        );
        assert_eq!(
            receipt_path(&StudentId("stu-000001".to_string()), 1_765_432_100_000, "pdf"),
            "payment-receipts/stu-000001/1765432100000.pdf"
        );
    }

    #[test]
    fn size_caps_bound_each_kind() {
        assert!(check_size(MediaKind::ProfilePhoto, MAX_PHOTO_BYTES).is_ok());
        assert!(matches!(
            check_size(MediaKind::ProfilePhoto, MAX_PHOTO_BYTES + 1),
            Err(MediaError::TooLarge { .. })
        ));
        assert!(check_size(MediaKind::PaymentReceipt, MAX_RECEIPT_BYTES).is_ok());
        assert!(matches!(
            check_size(MediaKind::PaymentReceipt, MAX_RECEIPT_BYTES + 1),
            Err(MediaError::TooLarge { .. })
        ));
    }
}
