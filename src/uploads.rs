//! Leaf image upload store
//!
//! Uploaded images are written under `{static_dir}/uploads` with a unix
//! timestamp prefix and a sanitized filename, and served back at
//! `/static/uploads/<name>`.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File type not allowed: {0}")]
    DisallowedType(String),

    #[error("Filename '{0}' has no usable characters")]
    EmptyName(String),

    #[error("Failed to store upload at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// True if the filename carries an allowed image extension
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied filename to a safe ASCII name.
///
/// Path separators become spaces, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped, and leading/trailing `.`/`_` are
/// stripped so the result cannot escape the upload directory.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Storage name for an upload: `{unix_ts}_{secure_name}`
pub fn stored_name(filename: &str, unix_ts: i64) -> Result<String, UploadError> {
    if !allowed_file(filename) {
        return Err(UploadError::DisallowedType(filename.to_string()));
    }
    let secure = secure_filename(filename);
    if secure.is_empty() || !allowed_file(&secure) {
        return Err(UploadError::EmptyName(filename.to_string()));
    }
    Ok(format!("{}_{}", unix_ts, secure))
}

pub fn public_url(stored: &str) -> String {
    format!("{}/{}", UPLOADS_URL_PREFIX, stored)
}

fn is_image_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(allowed_file)
        .unwrap_or(false)
}

/// First image in the uploads directory (by name), for the demo page
pub fn first_uploaded_image(upload_dir: &Path) -> Option<String> {
    let mut names: Vec<String> = std::fs::read_dir(upload_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_path(path))
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();
    names.sort();
    names.into_iter().next().map(|n| public_url(&n))
}

/// Image for the demo page: `{static_dir}/{sample}` if present, else the
/// first uploaded image. Touches the filesystem synchronously.
pub fn demo_image(static_dir: &Path, sample: &str, upload_dir: &Path) -> Option<String> {
    if static_dir.join(sample).is_file() {
        Some(format!("/static/{}", sample))
    } else {
        first_uploaded_image(upload_dir)
    }
}

/// Persist an upload; returns its public URL
#[cfg(feature = "api")]
pub async fn save_upload(upload_dir: &Path, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
    let stored = stored_name(filename, chrono::Utc::now().timestamp())?;
    let path: PathBuf = upload_dir.join(&stored);
    let io_err = |source| UploadError::Io {
        path: path.display().to_string(),
        source,
    };

    tokio::fs::create_dir_all(upload_dir).await.map_err(io_err)?;
    tokio::fs::write(&path, bytes).await.map_err(io_err)?;

    tracing::info!("File saved successfully to: {}", path.display());
    Ok(public_url(&stored))
}

/// Startup check that uploads can be written
pub fn check_upload_dir(upload_dir: &Path) -> Result<(), UploadError> {
    let probe: PathBuf = upload_dir.join(".write_test");
    let io_err = |source| UploadError::Io {
        path: probe.display().to_string(),
        source,
    };
    std::fs::create_dir_all(upload_dir).map_err(io_err)?;
    std::fs::write(&probe, b"test").map_err(io_err)?;
    std::fs::remove_file(&probe).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions() {
        assert!(allowed_file("leaf.png"));
        assert!(allowed_file("LEAF.JPG"));
        assert!(allowed_file("field.photo.jpeg"));
        assert!(!allowed_file("leaf.gif"));
        assert!(!allowed_file("jpg"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My Leaf Photo.jpg"), "My_Leaf_Photo.jpg");
        assert_eq!(secure_filename("../../etc/passwd.png"), "etc_passwd.png");
        assert_eq!(secure_filename("C:\\Users\\me\\rice.png"), "C_Users_me_rice.png");
        assert_eq!(secure_filename("lá»a.png"), "la.png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn test_stored_name() {
        assert_eq!(stored_name("leaf 1.png", 1700000000).unwrap(), "1700000000_leaf_1.png");
        assert!(matches!(stored_name("notes.txt", 1), Err(UploadError::DisallowedType(_))));
        assert!(matches!(stored_name("ééé.png", 1), Err(UploadError::EmptyName(_))));
        assert!(matches!(stored_name("/.png", 1), Err(UploadError::EmptyName(_))));
        assert_eq!(public_url("1_a.png"), "/static/uploads/1_a.png");
    }

    #[test]
    fn test_first_uploaded_image() {
        let dir = std::env::temp_dir().join(format!("advisor_uploads_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.join("2_b.jpg"), b"x").unwrap();
        std::fs::write(dir.join("1_a.png"), b"x").unwrap();

        assert_eq!(first_uploaded_image(&dir), Some("/static/uploads/1_a.png".to_string()));
        check_upload_dir(&dir).unwrap();

        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(first_uploaded_image(&dir), None);
    }

    #[test]
    fn test_demo_image_prefers_sample() {
        let root = std::env::temp_dir().join(format!("advisor_demo_{}", std::process::id()));
        let upload_dir = root.join("uploads");
        std::fs::create_dir_all(&upload_dir).unwrap();
        std::fs::write(upload_dir.join("1_leaf.jpg"), b"x").unwrap();

        assert_eq!(
            demo_image(&root, "img/rice_sample.jpg", &upload_dir),
            Some("/static/uploads/1_leaf.jpg".to_string())
        );

        std::fs::create_dir_all(root.join("img")).unwrap();
        std::fs::write(root.join("img/rice_sample.jpg"), b"x").unwrap();
        assert_eq!(
            demo_image(&root, "img/rice_sample.jpg", &upload_dir),
            Some("/static/img/rice_sample.jpg".to_string())
        );

        std::fs::remove_dir_all(&root).ok();
    }
}
