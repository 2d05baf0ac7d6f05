//! Copy-and-share boundary
//!
//! Copies the post text to the system clipboard and opens the social network
//! composer so the user can paste it. Both actions are host primitives hidden
//! behind traits; the outcome is transient feedback, unrelated to the
//! workflow state.

use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn copy_text(&self, text: &str) -> Result<()>;
}

#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    Idle,
    Copied,
    Failed,
}

impl CopyStatus {
    pub fn message(self) -> &'static str {
        match self {
            CopyStatus::Idle => "Share on LinkedIn",
            CopyStatus::Copied => "Text copied! Paste it into LinkedIn",
            CopyStatus::Failed => "Could not copy the text. Try again.",
        }
    }
}

/// Copy `text`, then open `url`. The link is only opened after a
/// successful copy; a failure to open it does not undo the copy.
pub async fn share_post(
    text: &str,
    clipboard: &dyn Clipboard,
    opener: &dyn LinkOpener,
    url: &str,
) -> CopyStatus {
    if text.trim().is_empty() {
        warn!("Nothing to share: post text is empty");
        return CopyStatus::Failed;
    }

    if let Err(e) = clipboard.copy_text(text).await {
        warn!("Failed to copy post to clipboard: {}", e);
        return CopyStatus::Failed;
    }
    info!("Copied {} chars to clipboard", text.chars().count());

    if let Err(e) = opener.open(url).await {
        warn!("Failed to open {}: {}", url, e);
    }

    CopyStatus::Copied
}

/// Pipes text into the platform clipboard tool.
pub struct SystemClipboard;

impl SystemClipboard {
    fn candidates() -> Vec<(&'static str, Vec<&'static str>)> {
        if cfg!(target_os = "macos") {
            vec![("pbcopy", vec![])]
        } else if cfg!(windows) {
            vec![("clip", vec![])]
        } else {
            vec![
                ("wl-copy", vec![]),
                ("xclip", vec!["-selection", "clipboard"]),
                ("xsel", vec!["--clipboard", "--input"]),
            ]
        }
    }

    async fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Share(format!("{} has no stdin", program)))?;
        stdin.write_all(text.as_bytes()).await?;
        drop(stdin);

        let status = child.wait().await?;
        if !status.success() {
            return Err(Error::Share(format!("{} exited with {}", program, status)));
        }
        Ok(())
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn copy_text(&self, text: &str) -> Result<()> {
        let mut last_error = Error::Share("No clipboard tool available".to_string());
        for (program, args) in Self::candidates() {
            match Self::pipe_to(program, &args, text).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!("Clipboard tool {} failed: {}", program, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

/// Opens URLs with the platform's default handler.
pub struct SystemLinkOpener;

#[async_trait]
impl LinkOpener for SystemLinkOpener {
    async fn open(&self, url: &str) -> Result<()> {
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", ""]);
            command
        } else {
            Command::new("xdg-open")
        };

        let status = command
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        if !status.success() {
            return Err(Error::Share(format!("Opening {} exited with {}", url, status)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const URL: &str = "https://www.linkedin.com/feed/";

    #[derive(Clone, Default)]
    struct RecordingClipboard {
        copied: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Clipboard for RecordingClipboard {
        async fn copy_text(&self, text: &str) -> Result<()> {
            if self.fail {
                return Err(Error::Share("clipboard unavailable".to_string()));
            }
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingOpener {
        opened: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl LinkOpener for RecordingOpener {
        async fn open(&self, url: &str) -> Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(Error::Share("no browser".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_share_copies_then_opens_composer() {
        let clipboard = RecordingClipboard::default();
        let opener = RecordingOpener::default();

        let status = share_post("Mi post", &clipboard, &opener, URL).await;

        assert_eq!(status, CopyStatus::Copied);
        assert_eq!(*clipboard.copied.lock().unwrap(), vec!["Mi post"]);
        assert_eq!(*opener.opened.lock().unwrap(), vec![URL]);
    }

    #[tokio::test]
    async fn test_copy_failure_does_not_open_link() {
        let clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        let opener = RecordingOpener::default();

        let status = share_post("Mi post", &clipboard, &opener, URL).await;

        assert_eq!(status, CopyStatus::Failed);
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_still_counts_as_copied() {
        let clipboard = RecordingClipboard::default();
        let opener = RecordingOpener {
            fail: true,
            ..Default::default()
        };

        let status = share_post("Mi post", &clipboard, &opener, URL).await;

        assert_eq!(status, CopyStatus::Copied);
    }

    #[tokio::test]
    async fn test_empty_text_is_not_shared() {
        let clipboard = RecordingClipboard::default();
        let opener = RecordingOpener::default();

        let status = share_post("  ", &clipboard, &opener, URL).await;

        assert_eq!(status, CopyStatus::Failed);
        assert!(clipboard.copied.lock().unwrap().is_empty());
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(CopyStatus::Idle.message(), "Share on LinkedIn");
        assert!(CopyStatus::Copied.message().contains("copied"));
        assert!(CopyStatus::Failed.message().contains("Could not copy"));
    }
}
