//! Cache keys for article images.
//!
//! Every rendition of an upload (original and `NNNpx-` thumbnails) shares one
//! item key, `host__ImageName`; the thumbnail width is reported separately as
//! the variant. Keys are NFC-normalized so composed and decomposed spellings
//! of a file name map to the same entry.

use unicode_normalization::UnicodeNormalization;
use url::Url;

const THUMB_SEGMENT: &str = "thumb";
const SIZE_SUFFIX: &str = "px-";

/// Percent-decoded image file name of an upload URL.
///
/// `/wikipedia/commons/thumb/a/ab/Dog.jpg/220px-Dog.jpg` and
/// `/wikipedia/commons/a/ab/Dog.jpg` both yield `Dog.jpg`.
pub fn image_name(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    let name = match segments.iter().position(|s| *s == THUMB_SEGMENT) {
        // thumb/<hash1>/<hash2>/<name>/<size>px-<name>
        Some(index) => segments.get(index + 3)?,
        None => segments.last()?,
    };
    // Invalid UTF-8 escapes are kept as written
    let decoded = urlencoding::decode(name)
        .map(|name| name.into_owned())
        .unwrap_or_else(|_| (*name).to_string());
    Some(decoded)
}

/// Width in pixels encoded in a thumbnail file name
pub fn size_prefix(url: &Url) -> Option<u32> {
    let last = url.path_segments()?.next_back()?;
    let (width, _) = last.split_once(SIZE_SUFFIX)?;
    width.parse().ok()
}

/// Item key shared by every rendition of an image
pub fn image_item_key(url: &Url) -> String {
    match (url.host_str(), image_name(url)) {
        (Some(host), Some(name)) => format!("{host}__{name}").nfc().collect(),
        _ => url.as_str().nfc().collect(),
    }
}

/// Variant identifier (thumbnail width) of an image URL
pub fn image_variant(url: &Url) -> Option<String> {
    size_prefix(url).map(|width| width.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_thumbnail_and_original_share_key() {
        let thumb = url("https://upload.wikimedia.org/wikipedia/commons/thumb/a/ab/Dog.jpg/220px-Dog.jpg");
        let original = url("https://upload.wikimedia.org/wikipedia/commons/a/ab/Dog.jpg");

        assert_eq!(image_item_key(&thumb), "upload.wikimedia.org__Dog.jpg");
        assert_eq!(image_item_key(&thumb), image_item_key(&original));
    }

    #[test]
    fn test_variant() {
        let thumb = url("https://upload.wikimedia.org/wikipedia/commons/thumb/a/ab/Dog.jpg/640px-Dog.jpg");
        assert_eq!(image_variant(&thumb).as_deref(), Some("640"));

        let original = url("https://upload.wikimedia.org/wikipedia/commons/a/ab/Dog.jpg");
        assert!(image_variant(&original).is_none());
    }

    #[test]
    fn test_composed_and_decomposed_names_share_key() {
        let composed = url("https://upload.wikimedia.org/wikipedia/commons/a/ab/Caf%C3%A9.jpg");
        let decomposed = url("https://upload.wikimedia.org/wikipedia/commons/a/ab/Cafe%CC%81.jpg");

        assert_eq!(image_item_key(&composed), "upload.wikimedia.org__Caf\u{e9}.jpg");
        assert_eq!(image_item_key(&composed), image_item_key(&decomposed));
    }

    #[test]
    fn test_thumbnail_name_is_decoded() {
        let thumb = url(
            "https://upload.wikimedia.org/wikipedia/commons/thumb/a/ab/Caf%C3%A9.jpg/320px-Caf%C3%A9.jpg",
        );
        assert_eq!(image_name(&thumb).as_deref(), Some("Caf\u{e9}.jpg"));
        assert_eq!(image_variant(&thumb).as_deref(), Some("320"));
    }

    #[test]
    fn test_url_without_path_falls_back_to_url() {
        let bare = url("https://upload.wikimedia.org/");
        assert_eq!(image_item_key(&bare), "https://upload.wikimedia.org/");
    }
}
