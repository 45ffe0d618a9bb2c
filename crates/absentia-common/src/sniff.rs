//! Attachment content sniffing.
//!
//! The document store returns raw bytes with no trustworthy declared MIME
//! type, so the kind is recovered from magic numbers instead — both when
//! validating an upload batch and when naming stored attachments for
//! download. The magic-number table must stay exactly as-is for
//! interoperability with previously stored documents.

/// Detected content kind of an attachment blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Pdf,
    Jpeg,
    Png,
    Unknown,
}

const PDF_MAGIC: [u8; 4] = [0x25, 0x50, 0x44, 0x46];
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

/// Sniff the kind of a binary blob from its leading magic bytes.
pub fn detect_file_kind(bytes: &[u8]) -> FileKind {
    if bytes.starts_with(&PDF_MAGIC) {
        FileKind::Pdf
    } else if bytes.starts_with(&JPEG_MAGIC) {
        FileKind::Jpeg
    } else if bytes.starts_with(&PNG_MAGIC) {
        FileKind::Png
    } else {
        FileKind::Unknown
    }
}

impl FileKind {
    /// Whether the kind is accepted as a request attachment.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// File extension used when generating a download name.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Unknown => "unknown",
        }
    }

    /// MIME type used when offering a stored attachment for download.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Unknown => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pdf() {
        assert_eq!(detect_file_kind(&[0x25, 0x50, 0x44, 0x46, 0x2D, 0x31]), FileKind::Pdf);
    }

    #[test]
    fn detects_jpeg() {
        assert_eq!(detect_file_kind(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), FileKind::Jpeg);
    }

    #[test]
    fn detects_png() {
        assert_eq!(detect_file_kind(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]), FileKind::Png);
    }

    #[test]
    fn unrecognized_bytes_are_unknown() {
        assert_eq!(detect_file_kind(b"hello world"), FileKind::Unknown);
        assert!(!detect_file_kind(b"hello world").is_accepted());
    }

    #[test]
    fn truncated_prefix_is_unknown() {
        // Fewer bytes than any magic number cannot match.
        assert_eq!(detect_file_kind(&[0x25, 0x50]), FileKind::Unknown);
        assert_eq!(detect_file_kind(&[]), FileKind::Unknown);
    }

    #[test]
    fn download_metadata_matches_kind() {
        assert_eq!(FileKind::Pdf.extension(), "pdf");
        assert_eq!(FileKind::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(FileKind::Png.mime_type(), "image/png");
        assert_eq!(FileKind::Unknown.mime_type(), "application/octet-stream");
    }
}
