//! File selection, MIME validation and preview generation.

use base64::{Engine as _, engine::general_purpose};
use image::ImageFormat;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("not an image file (declared type: {mime:?})")]
    NotAnImage { mime: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// A file picked by the user, together with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    /// File name sent along with the multipart part.
    pub name: String,
    /// Declared MIME type; empty when the extension is unknown.
    pub mime: String,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = declared_mime(&path);
        Self { path, name, mime }
    }

    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime)
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>, UploadError> {
        fs::read(&self.path).map_err(|source| UploadError::Read {
            path: self.path.clone(),
            source,
        })
    }
}

/// RGBA pixels ready to be uploaded as a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Locally rendered preview of the selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub file_name: String,
    /// `data:<mime>;base64,...` URL of the raw file bytes.
    pub data_url: String,
    /// Pixels for display; `None` for formats that cannot be decoded
    /// locally (SVG, AVIF, damaged files).
    pub image: Option<DecodedImage>,
}

/// Content type a file picker would declare for `path`, judged by extension.
pub fn declared_mime(path: &Path) -> String {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return String::new();
    };
    let ext = ext.to_ascii_lowercase();
    if ext == "svg" {
        return "image/svg+xml".to_string();
    }
    if let Some(format) = ImageFormat::from_extension(&ext) {
        return format.to_mime_type().to_string();
    }
    match ext.as_str() {
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "mp4" => "video/mp4",
        _ => "",
    }
    .to_string()
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, UploadError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

/// Reads the selected file and renders it for preview.
///
/// Only a failed read is an error; undecodable bytes still give a preview
/// with a data URL and no pixels.
pub fn read_preview(file: &SelectedFile) -> Result<Preview, UploadError> {
    let bytes = file.read_bytes()?;
    let image = match decode_image(&bytes) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::debug!(file = %file.name, "no pixels for preview: {e}");
            None
        }
    };
    Ok(Preview {
        file_name: file.name.clone(),
        data_url: to_data_url(&file.mime, &bytes),
        image,
    })
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 160, 60, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}
