//! Utility functions for filename resolution and path manipulation

use crate::config::FileCollisionAction;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Why a target path could not be produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionError {
    /// File exists and the collision action is Skip
    Exists(PathBuf),
    /// Every numbered alternative is taken
    Exhausted(PathBuf),
}

impl std::fmt::Display for CollisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollisionError::Exists(path) => write!(
                f,
                "{} already exists and collision action is skip",
                path.display()
            ),
            CollisionError::Exhausted(path) => write!(
                f,
                "could not find a unique filename for {} after {} attempts",
                path.display(),
                MAX_RENAME_ATTEMPTS
            ),
        }
    }
}

/// Get a unique path for a file, handling collisions according to the specified action
///
/// For Rename, `voters_1.xlsx` becomes `voters_1 (1).xlsx`, then `voters_1 (2).xlsx`, etc.
/// For Skip, an existing file is an error. For Overwrite, the path is returned unchanged.
///
/// # Examples
///
/// ```
/// use export_dl::utils::get_unique_path;
/// use export_dl::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/export-dl-doc/voters_1.xlsx");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// assert_eq!(unique, path);
/// ```
pub fn get_unique_path(
    path: &Path,
    action: FileCollisionAction,
) -> Result<PathBuf, CollisionError> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(CollisionError::Exists(path.to_path_buf()));
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("export");
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().unwrap_or_else(|| Path::new("."));

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(CollisionError::Exhausted(path.to_path_buf()))
        }
    }
}

/// Extract the suggested filename from a `Content-Disposition` header value
///
/// Handles `filename="..."`, unquoted `filename=...` and RFC 5987 `filename*=UTF-8''...`
/// (plain `filename=` wins when both are present). Surrounding quotes are stripped.
/// Returns `None` when no usable name is present.
///
/// # Examples
///
/// ```
/// use export_dl::utils::filename_from_content_disposition;
///
/// assert_eq!(
///     filename_from_content_disposition("attachment; filename=\"voters_1.xlsx\""),
///     Some("voters_1.xlsx".to_string())
/// );
/// assert_eq!(filename_from_content_disposition("inline"), None);
/// ```
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut encoded = None;

    for part in value.split(';') {
        let part = part.trim();
        let Some((name, raw)) = part.split_once('=') else {
            continue;
        };

        match name.trim().to_ascii_lowercase().as_str() {
            "filename" => {
                let filename = raw.trim().trim_matches(|c| c == '"' || c == '\'');
                if let Some(clean) = sanitize_filename(filename) {
                    return Some(clean);
                }
            }
            "filename*" => {
                // Format is: charset'lang'encoded-filename
                let raw = raw.trim().trim_matches('"');
                let encoded_name = raw.rfind('\'').map_or(raw, |idx| &raw[idx + 1..]);
                if let Ok(decoded) = urlencoding::decode(encoded_name) {
                    encoded = sanitize_filename(&decoded);
                }
            }
            _ => {}
        }
    }

    encoded
}

/// Reduce a server-supplied name to a safe single path component
///
/// Keeps only the last path component, drops control characters and rejects
/// names that are empty or consist only of dots.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();
    let trimmed = last.trim();

    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        return None;
    }
    Some(trimmed.to_string())
}

/// Extract the suggested filename from an HTTP response
///
/// Reads the `Content-Disposition` header; `None` when the header is absent,
/// not valid UTF-8/ASCII or carries no filename.
pub fn extract_filename_from_response(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(filename_from_content_disposition)
}
