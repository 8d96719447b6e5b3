//! # Media ingestion
//!
//! An uploaded file flows through three steps:
//!
//! 1. [`classify`] maps the declared MIME type to image or video
//!    (unknown types fall back to image).
//! 2. [`UploadPlan`] derives the destination folder
//!    (`uploads/media/{images,videos}`), tags and per-category options
//!    (images are width-capped at 1080 and converted to jpg; video is stored
//!    as-is).
//! 3. A [`MediaHost`] receives the plan and the byte stream and returns the
//!    secure URL and public id, which the caller persists on the owning record.
//!
//! [`MediaUploader`] runs the three steps. No retries, no local timeout.

mod classify;
mod cloudinary;
mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{classify, folder_for, ImageTransform, UploadPlan, IMAGE_FORMAT, IMAGE_MAX_WIDTH};
pub use cloudinary::{sign, CloudinaryClient, CloudinaryConfig, DEFAULT_API_BASE};
pub use upload::{
    DisabledMediaHost, MediaHost, MediaUploader, StoredMedia, UploadContent, UploadDescriptor,
    UploadError,
};
