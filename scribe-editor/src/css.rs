/// Validate a background image before it is spliced into a CSS `url(...)`.
/// Only base64 PNG and JPEG data URLs are accepted.
pub fn sanitize_image_data_url(value: &str) -> Option<String> {
    let v = value.trim();
    let payload = ["data:image/png;base64,", "data:image/jpeg;base64,"]
        .iter()
        .find_map(|prefix| v.strip_prefix(prefix))?;
    if payload.is_empty() {
        return None;
    }
    if payload
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
    {
        return Some(v.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_png_and_jpeg() {
        assert_eq!(
            sanitize_image_data_url("data:image/png;base64,iVBORw0KGgo="),
            Some("data:image/png;base64,iVBORw0KGgo=".to_string())
        );
        assert_eq!(
            sanitize_image_data_url("  data:image/jpeg;base64,/9j/4AAQ+w==  "),
            Some("data:image/jpeg;base64,/9j/4AAQ+w==".to_string())
        );
    }

    #[test]
    fn rejects_other_schemes_and_types() {
        assert_eq!(sanitize_image_data_url("https://example.com/a.png"), None);
        assert_eq!(sanitize_image_data_url("data:image/svg+xml;base64,PHN2Zz4="), None);
        assert_eq!(sanitize_image_data_url("data:image/png;base64,"), None);
        assert_eq!(sanitize_image_data_url(""), None);
    }

    #[test]
    fn rejects_css_breakout() {
        assert_eq!(
            sanitize_image_data_url("data:image/png;base64,AA==\"); background: url(evil"),
            None
        );
        assert_eq!(
            sanitize_image_data_url("data:image/png;base64,AA==</style><script>"),
            None
        );
    }
}
