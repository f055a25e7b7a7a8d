//! File-name handling for uploaded report photos

use chrono::{DateTime, Utc};
use std::path::Path;

use crate::features::issue_reports::dtos::UploadedImage;
use crate::shared::constants::ALLOWED_IMAGE_EXTENSIONS;

/// Lower-cased extension if it is on the allow-list
fn allowed_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_IMAGE_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Keeps uploads with an allowed extension and non-empty content; the rest are dropped.
pub fn accepted_images(images: Vec<UploadedImage>) -> Vec<UploadedImage> {
    images
        .into_iter()
        .filter(|image| {
            let keep = !image.data.is_empty() && allowed_extension(&image.file_name).is_some();
            if !keep {
                tracing::debug!("Dropping upload '{}'", image.file_name);
            }
            keep
        })
        .collect()
}

/// Reduce a client file name to ASCII letters, digits, `.`, `_` and `-`.
///
/// Path separators and whitespace become `_`, leading and trailing dots and underscores are
/// stripped. Returns `None` if nothing usable is left.
pub fn sanitize_file_name(file_name: &str) -> Option<String> {
    let cleaned: String = file_name
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('_'),
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Collision-resistant blob name: microsecond timestamp prefix plus the sanitized name.
/// Falls back to `image.<ext>` when sanitizing loses the extension.
pub fn stored_file_name(file_name: &str, now: DateTime<Utc>) -> Option<String> {
    let ext = allowed_extension(file_name)?;
    let name = sanitize_file_name(file_name)
        .filter(|name| allowed_extension(name).as_deref() == Some(ext.as_str()))
        .unwrap_or_else(|| format!("image.{}", ext));

    Some(format!("{}_{}", now.format("%Y%m%d%H%M%S%6f"), name))
}

/// MIME type used when the client did not send one
pub fn content_type_for(file_name: &str) -> &'static str {
    match allowed_extension(file_name).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn upload(name: &str, data: &[u8]) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            content_type: None,
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_png_kept_exe_dropped() {
        let kept = accepted_images(vec![upload("photo.png", b"png"), upload("tool.exe", b"MZ")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].file_name, "photo.png");
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let kept = accepted_images(vec![
            upload("A.JPG", b"1"),
            upload("b.Jpeg", b"1"),
            upload("c.GIF", b"1"),
            upload("no_extension", b"1"),
            upload("png", b"1"),
            upload("empty.png", b""),
        ]);
        let names: Vec<&str> = kept.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["A.JPG", "b.Jpeg", "c.GIF"]);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name("my photo.png").as_deref(),
            Some("my_photo.png")
        );
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("etc_passwd")
        );
        assert_eq!(sanitize_file_name("相片.png").as_deref(), Some("png"));
        assert_eq!(sanitize_file_name("..."), None);
    }

    #[test]
    fn test_stored_file_name() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();

        assert_eq!(
            stored_file_name("crack.PNG", now).as_deref(),
            Some("20250304050607000000_crack.PNG")
        );
        assert_eq!(
            stored_file_name("相片.jpg", now).as_deref(),
            Some("20250304050607000000_image.jpg")
        );
        assert_eq!(stored_file_name("virus.exe", now), None);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }
}
