use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Image extensions accepted as an editor background.
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn mime_type_for(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// Load an image file and encode it as a `data:` URL.
pub fn image_to_data_url(path: &Path) -> Result<String, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mime = mime_type_for(&ext)
        .ok_or_else(|| format!("Unsupported file extension: .{}", ext))?;

    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read image {}: {}", path.display(), e))?;

    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}
