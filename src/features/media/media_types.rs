use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    File,
}

struct MediaTypeInfo {
    ty: MediaType,
    extensions: &'static [&'static str],
    mime_types: &'static [&'static str],
    size_limit: u64,
}

static MEDIA_TYPES: [MediaTypeInfo; 4] = [
    MediaTypeInfo {
        ty: MediaType::Image,
        extensions: &[".png", ".jpg", ".gif", ".jpeg", ".bmp", ".svg", ".webp"],
        mime_types: &[
            "image/jpeg",
            "image/png",
            "image/gif",
            "image/svg+xml",
            "image/webp",
            "image/bmp",
        ],
        size_limit: 50 * MIB,
    },
    MediaTypeInfo {
        ty: MediaType::Video,
        extensions: &[".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".webm"],
        mime_types: &[
            "video/mp4",
            "video/x-msvideo",
            "video/quicktime",
            "video/x-ms-wmv",
            "video/x-flv",
            "video/x-matroska",
            "video/webm",
        ],
        size_limit: 2 * 1024 * MIB,
    },
    MediaTypeInfo {
        ty: MediaType::Audio,
        extensions: &[".mp3", ".wav", ".ogg", ".wma", ".aac", ".flac", ".alac"],
        mime_types: &[
            "audio/mpeg",
            "audio/wav",
            "audio/ogg",
            "audio/x-ms-wma",
            "audio/aac",
            "audio/flac",
            "audio/alac",
        ],
        size_limit: 12 * MIB,
    },
    MediaTypeInfo {
        ty: MediaType::File,
        extensions: &[
            ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".csv", ".txt", ".json", ".xml",
        ],
        mime_types: &[
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "text/csv",
            "text/plain",
            "application/json",
            "application/xml",
        ],
        size_limit: 150 * MIB,
    },
];

/// Largest per-type limit; bounds the upload request body
pub const MAX_UPLOAD_SIZE: u64 = 2 * 1024 * MIB;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

impl MediaType {
    fn info(self) -> &'static MediaTypeInfo {
        match self {
            MediaType::Image => &MEDIA_TYPES[0],
            MediaType::Video => &MEDIA_TYPES[1],
            MediaType::Audio => &MEDIA_TYPES[2],
            MediaType::File => &MEDIA_TYPES[3],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::File => "file",
        }
    }

    pub fn mime_types(self) -> &'static [&'static str] {
        self.info().mime_types
    }

    pub fn size_limit(self) -> u64 {
        self.info().size_limit
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MEDIA_TYPES
            .iter()
            .find(|info| info.ty.as_str() == s)
            .map(|info| info.ty)
            .ok_or(())
    }
}

/// Media type for an extension such as `.PNG`; `None` is "unknown"
pub fn get_media_type(extension: &str) -> Option<MediaType> {
    let extension = extension.to_ascii_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|info| info.extensions.contains(&extension.as_str()))
        .map(|info| info.ty)
}

/// Media type of a file name, from its last extension
pub fn media_type_of(file_name: &str) -> Option<MediaType> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| get_media_type(&format!(".{}", ext)))
}

pub fn get_mime_types(media_type: &str) -> &'static [&'static str] {
    media_type
        .parse::<MediaType>()
        .map(MediaType::mime_types)
        .unwrap_or(&[])
}

pub fn get_file_size_limit(media_type: &str) -> u64 {
    media_type
        .parse::<MediaType>()
        .map(MediaType::size_limit)
        .unwrap_or(0)
}

/// First mime type of the media type, or `application/octet-stream`
pub fn mime_type_for(media_type: &str) -> &'static str {
    get_mime_types(media_type)
        .first()
        .copied()
        .unwrap_or(DEFAULT_MIME_TYPE)
}
