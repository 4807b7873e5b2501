//! Request normalization: turn a user photo into an identification request.
//!
//! The service accepts JPEG uploads and rejects oversized payloads, so every
//! image is converted to RGB, downscaled so its longer edge is at most
//! [`MAX_EDGE`] pixels, and re-encoded as JPEG at [`JPEG_QUALITY`]. The
//! resulting [`IdentificationRequest`] knows how to lay itself out as the
//! multipart body and URL the service expects, but performs no I/O.

use std::fmt;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, RgbImage};
use tracing::debug;
use url::Url;

use crate::error::{ErrorKind, IdentifyError};
use crate::model::{Organ, Project};

/// Longest edge, in pixels, of the uploaded image.
pub const MAX_EDGE: u32 = 1024;

/// JPEG quality used for the upload.
pub const JPEG_QUALITY: u8 = 85;

/// File name reported for the uploaded image part.
pub const UPLOAD_FILE_NAME: &str = "plant.jpg";

/// A validated, transport-ready identification request.
///
/// Construct with [`build_request`] or [`build_request_from_image`]; the
/// constructors guarantee a non-empty API key and a JPEG payload whose
/// longer edge is at most [`MAX_EDGE`].
#[derive(Clone, PartialEq, Eq)]
pub struct IdentificationRequest {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
    project: Project,
    organ: Organ,
    api_key: String,
}

impl IdentificationRequest {
    /// The encoded JPEG payload.
    pub fn image_jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    /// Pixel dimensions of the encoded payload.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn project(&self) -> Project {
        self.project
    }

    pub fn organ(&self) -> Organ {
        self.organ
    }

    /// The trimmed API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Full request URL: `<base>/<project>?api-key=<key>`.
    pub fn endpoint(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(self.project.as_str());
        }
        url.query_pairs_mut().append_pair("api-key", &self.api_key);
        url
    }

    /// Lays the request out as a `multipart/form-data` body.
    ///
    /// The body has a text part `organs` and a file part `images`
    /// carrying the JPEG payload. The boundary is chosen so that it does
    /// not occur inside the payload.
    pub fn multipart_body(&self) -> MultipartBody {
        let boundary = pick_boundary(&self.jpeg);
        self.multipart_body_with_boundary(&boundary)
    }

    fn multipart_body_with_boundary(&self, boundary: &str) -> MultipartBody {
        let mut bytes = Vec::with_capacity(self.jpeg.len() + 512);

        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(b"Content-Disposition: form-data; name=\"organs\"\r\n\r\n");
        bytes.extend_from_slice(self.organ.as_str().as_bytes());
        bytes.extend_from_slice(b"\r\n");

        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"images\"; filename=\"{UPLOAD_FILE_NAME}\"\r\n"
            )
            .as_bytes(),
        );
        bytes.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
        bytes.extend_from_slice(&self.jpeg);
        bytes.extend_from_slice(b"\r\n");

        bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        MultipartBody {
            boundary: boundary.to_string(),
            bytes,
        }
    }
}

// The API key stays out of logs and panic messages.
impl fmt::Debug for IdentificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentificationRequest")
            .field("jpeg_bytes", &self.jpeg.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("project", &self.project)
            .field("organ", &self.organ)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// An encoded `multipart/form-data` request body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Builds an identification request from encoded image bytes.
///
/// # Errors
/// * [`ErrorKind::InvalidCredential`] if `api_key` is empty or whitespace.
///   The image is not touched in that case.
/// * [`ErrorKind::InvalidImage`] if the bytes cannot be decoded or the
///   image has zero area.
pub fn build_request(
    image_bytes: &[u8],
    api_key: &str,
    project: Project,
    organ: Organ,
) -> Result<IdentificationRequest, IdentifyError> {
    let api_key = validate_api_key(api_key)?;

    let image = image::load_from_memory(image_bytes).map_err(|source| {
        IdentifyError::with_detail(
            ErrorKind::InvalidImage,
            format!("failed to decode image: {source}"),
        )
    })?;

    normalize(image, api_key, project, organ)
}

/// Builds an identification request from an already decoded image.
///
/// Same validation and transform as [`build_request`].
pub fn build_request_from_image(
    image: DynamicImage,
    api_key: &str,
    project: Project,
    organ: Organ,
) -> Result<IdentificationRequest, IdentifyError> {
    let api_key = validate_api_key(api_key)?;
    normalize(image, api_key, project, organ)
}

fn validate_api_key(api_key: &str) -> Result<String, IdentifyError> {
    let trimmed = api_key.trim();
    if trimmed.is_empty() {
        return Err(IdentifyError::with_detail(
            ErrorKind::InvalidCredential,
            "API key is required",
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize(
    image: DynamicImage,
    api_key: String,
    project: Project,
    organ: Organ,
) -> Result<IdentificationRequest, IdentifyError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(IdentifyError::with_detail(
            ErrorKind::InvalidImage,
            format!("image has zero area ({width}x{height})"),
        ));
    }

    let rgb = image.into_rgb8();
    let (target_w, target_h) = fit_within(width, height, MAX_EDGE);
    let rgb = if (target_w, target_h) == (width, height) {
        rgb
    } else {
        debug!(
            from = format!("{width}x{height}"),
            to = format!("{target_w}x{target_h}"),
            "Downscaling image for upload"
        );
        image::imageops::resize(&rgb, target_w, target_h, FilterType::Lanczos3)
    };

    let jpeg = encode_jpeg(&rgb)?;
    debug!(
        width = target_w,
        height = target_h,
        bytes = jpeg.len(),
        "Encoded upload payload"
    );

    Ok(IdentificationRequest {
        jpeg,
        width: target_w,
        height: target_h,
        project,
        organ,
        api_key,
    })
}

/// Dimensions that fit inside a `max_edge` square, preserving aspect ratio.
///
/// Images already inside the square are returned unchanged; otherwise the
/// longer edge becomes exactly `max_edge` and the shorter edge is rounded,
/// never below one pixel.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge {
        return (width, height);
    }

    let scale = |short: u32| -> u32 {
        ((short as f64 * max_edge as f64 / longest as f64).round() as u32).max(1)
    };

    if width >= height {
        (max_edge, scale(height))
    } else {
        (scale(width), max_edge)
    }
}

fn encode_jpeg(rgb: &RgbImage) -> Result<Vec<u8>, IdentifyError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|source| {
            IdentifyError::with_detail(
                ErrorKind::InvalidImage,
                format!("failed to encode JPEG: {source}"),
            )
        })?;
    Ok(jpeg)
}

fn pick_boundary(payload: &[u8]) -> String {
    let mut counter: u32 = 0;
    loop {
        let candidate = format!("plantid-boundary-{counter:08x}");
        if !contains_subslice(payload, candidate.as_bytes()) {
            return candidate;
        }
        counter = counter.wrapping_add(1);
    }
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
