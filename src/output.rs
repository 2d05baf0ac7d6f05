//! Saving a finished post to disk.

use crate::ai::mime::{decode_data_uri, extension_for_mime};
use crate::models::PostArtifact;
use crate::{Error, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SavedPost {
    pub dir: PathBuf,
    pub text_path: PathBuf,
    pub image_path: Option<PathBuf>,
}

/// Write the post under `root/<date>_<uuid>/` as `post.txt` plus the decoded
/// image, if there is one.
pub fn save_post(post: &PostArtifact, root: &Path) -> Result<SavedPost> {
    if post.text.is_empty() {
        return Err(Error::Generic("There is no post to save".to_string()));
    }

    let date = Local::now().format("%Y-%m-%d").to_string();
    let dir = root.join(format!("{}_{}", date, Uuid::new_v4()));
    fs::create_dir_all(&dir)?;

    let text_path = dir.join("post.txt");
    fs::write(&text_path, &post.text)?;
    info!("Saved post text at: {}", text_path.display());

    let image_path = match &post.image_data {
        Some(uri) => {
            let (mime, bytes) = decode_data_uri(uri)?;
            let path = dir.join(format!("image.{}", extension_for_mime(&mime)));
            fs::write(&path, &bytes)?;
            info!("Saved image ({} bytes) at: {}", bytes.len(), path.display());
            Some(path)
        }
        None => None,
    };

    Ok(SavedPost {
        dir,
        text_path,
        image_path,
    })
}
