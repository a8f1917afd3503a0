use crate::platform::{Attachment, PhotoVariant, RawMessage};

/// Normalize the media carried by `message`, if any.
///
/// Kinds are checked in a fixed order (photo, document, video, audio) and the
/// first one present wins. For photos the largest variant by area is used.
pub fn resolve(message: &RawMessage) -> Option<Attachment> {
    if let Some(best) = largest_photo(&message.photo) {
        return Some(Attachment::photo(best.file_id.clone()));
    }
    if let Some(document) = &message.document {
        return Some(Attachment::document(document.file_id.clone()));
    }
    if let Some(video) = &message.video {
        return Some(Attachment::video(video.file_id.clone()));
    }
    if let Some(audio) = &message.audio {
        return Some(Attachment::audio(audio.file_id.clone()));
    }
    None
}

/// First variant with the greatest width * height.
fn largest_photo(variants: &[PhotoVariant]) -> Option<&PhotoVariant> {
    // Ties keep the earlier variant (max_by_key would return the later one)
    variants.iter().fold(None, |best: Option<&PhotoVariant>, v| match best {
        Some(b) if b.area() >= v.area() => Some(b),
        _ => Some(v),
    })
}
