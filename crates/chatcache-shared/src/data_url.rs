//! `data:` URL codec for file payloads.
//!
//! Payloads are embedded as `data:<mime>;base64,<body>` so that the files
//! record stays self-contained text and the UI can render a restored photo
//! without touching the network.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::FALLBACK_MIME;
use crate::error::DataUrlError;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Guess the mime type of an image payload from its magic bytes.
pub fn sniff_mime(payload: &[u8]) -> &'static str {
    match payload {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => FALLBACK_MIME,
    }
}

/// Encode `payload` as a base64 data URL, refusing payloads above `max_size`.
pub fn encode(payload: &[u8], max_size: usize) -> Result<String, DataUrlError> {
    if payload.len() > max_size {
        return Err(DataUrlError::TooLarge {
            size: payload.len(),
            max: max_size,
        });
    }

    let mime = sniff_mime(payload);
    let body = STANDARD.encode(payload);

    let mut url = String::with_capacity(SCHEME.len() + mime.len() + BASE64_MARKER.len() + 1 + body.len());
    url.push_str(SCHEME);
    url.push_str(mime);
    url.push_str(BASE64_MARKER);
    url.push(',');
    url.push_str(&body);
    Ok(url)
}
