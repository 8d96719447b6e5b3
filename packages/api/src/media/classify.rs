//! MIME type classification and per-category upload options.

use store::MediaKind;

/// Longest edge, in pixels, images are scaled down to.
pub const IMAGE_MAX_WIDTH: u32 = 1080;
pub const IMAGE_FORMAT: &str = "jpg";

const IMAGE_TYPES: &[&str] = &["image/png", "image/jpg", "image/jpeg", "image/heic"];
const VIDEO_TYPES: &[&str] = &["video/mp4", "video/quicktime"];

/// Maps a declared MIME type to a media category.
///
/// Anything outside the allow-lists is treated as an image.
pub fn classify(mime_type: &str) -> MediaKind {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if IMAGE_TYPES.contains(&essence.as_str()) {
        MediaKind::Image
    } else if VIDEO_TYPES.contains(&essence.as_str()) {
        MediaKind::Video
    } else {
        tracing::warn!(mime_type, "unrecognised upload type, treating as image");
        MediaKind::Image
    }
}

/// `uploads/media/images` or `uploads/media/videos`.
pub fn folder_for(kind: MediaKind) -> String {
    format!("uploads/media/{}s", kind.as_str())
}

/// Width cap applied by the provider to uploaded images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: u32,
    pub crop: &'static str,
    pub format: &'static str,
}

impl ImageTransform {
    /// Provider transformation string, e.g. `c_limit,w_1080`.
    pub fn to_param(&self) -> String {
        format!("c_{},w_{}", self.crop, self.width)
    }
}

/// Everything the provider needs besides the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub kind: MediaKind,
    pub folder: String,
    pub tags: Vec<String>,
    pub overwrite: bool,
    /// `None` for video, which is stored as-is.
    pub transform: Option<ImageTransform>,
}

impl UploadPlan {
    pub fn for_mime(mime_type: &str, tags: Vec<String>) -> Self {
        let kind = classify(mime_type);
        let transform = match kind {
            MediaKind::Image => Some(ImageTransform {
                width: IMAGE_MAX_WIDTH,
                crop: "limit",
                format: IMAGE_FORMAT,
            }),
            MediaKind::Video => None,
        };
        Self {
            kind,
            folder: folder_for(kind),
            tags,
            overwrite: true,
            transform,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        self.kind.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_allow_lists() {
        for mime in ["image/png", "image/jpg", "image/jpeg", "image/heic"] {
            assert_eq!(classify(mime), MediaKind::Image, "{mime}");
        }
        for mime in ["video/mp4", "video/quicktime"] {
            assert_eq!(classify(mime), MediaKind::Video, "{mime}");
        }
    }

    #[test]
    fn test_classify_ignores_case_and_parameters() {
        assert_eq!(classify("VIDEO/MP4"), MediaKind::Video);
        assert_eq!(classify("image/png; charset=binary"), MediaKind::Image);
    }

    #[test]
    fn test_unknown_types_fall_back_to_image() {
        assert_eq!(classify("application/pdf"), MediaKind::Image);
        assert_eq!(classify("video/webm"), MediaKind::Image);
        assert_eq!(classify(""), MediaKind::Image);
    }

    #[test]
    fn test_image_plan() {
        let plan = UploadPlan::for_mime("image/png", vec!["fact".into()]);
        assert_eq!(plan.folder, "uploads/media/images");
        assert_eq!(plan.resource_type(), "image");
        assert!(plan.overwrite);
        let transform = plan.transform.unwrap();
        assert_eq!(transform.to_param(), "c_limit,w_1080");
        assert_eq!(transform.format, "jpg");
    }

    #[test]
    fn test_video_plan_has_no_transform() {
        let plan = UploadPlan::for_mime("video/mp4", vec![]);
        assert_eq!(plan.folder, "uploads/media/videos");
        assert_eq!(plan.resource_type(), "video");
        assert!(plan.transform.is_none());
    }
}
