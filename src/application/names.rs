//! Final file names handed out to finished tracks.
//!
//! A title shared by several tracks of one album is never given to any of
//! them: each gets `<title> (<index>).<ext>`, so the names on disk only depend
//! on the tags and indices, not on which track finished first. Titles made of
//! digits only are qualified the same way, since `<index>.<ext>` is where
//! tracks are downloaded to.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::domain::TrackError;

#[derive(Debug, Default)]
pub struct NameRegistry {
    claims: Mutex<Claims>,
}

#[derive(Debug, Default)]
struct Claims {
    owners: HashMap<PathBuf, Claim>,
    /// Files moved off a name once it turned out to be shared.
    moved: HashMap<PathBuf, PathBuf>,
}

#[derive(Debug, Clone, Copy)]
enum Claim {
    Owned(usize),
    Shared,
}

impl NameRegistry {
    /// Move the download of track `index` at `from` to its name for `title`.
    pub async fn place(
        &self,
        from: &Path,
        title: &str,
        ext: &str,
        index: usize,
    ) -> Result<PathBuf, TrackError> {
        let target = from.with_file_name(format!("{}.{}", title, ext));
        let qualified = qualified_name(from, title, ext, index);

        if is_index_name(title) {
            move_to(from, &qualified).await?;
            return Ok(qualified);
        }

        let mut claims = self.claims.lock().await;
        match claims.owners.get(&target).copied() {
            None => {
                if rename_no_clobber(from, &target).await.map_err(rename_error(from))? {
                    claims.owners.insert(target.clone(), Claim::Owned(index));
                    return Ok(target);
                }
                log::warn!("{} already exists", target.display());
            }
            Some(Claim::Owned(other)) => {
                let displaced = qualified_name(from, title, ext, other);
                log::debug!(
                    "tracks #{} and #{} are both titled \"{}\"",
                    other,
                    index,
                    title
                );
                move_to(&target, &displaced).await?;
                claims.moved.insert(target.clone(), displaced);
            }
            Some(Claim::Shared) => {}
        }

        claims.owners.insert(target, Claim::Shared);
        move_to(from, &qualified).await?;
        Ok(qualified)
    }

    /// Where a file reported at `path` ended up after later renames.
    pub async fn current(&self, path: &Path) -> PathBuf {
        let claims = self.claims.lock().await;
        claims
            .moved
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.to_path_buf())
    }
}

fn qualified_name(from: &Path, title: &str, ext: &str, index: usize) -> PathBuf {
    from.with_file_name(format!("{} ({}).{}", title, index, ext))
}

fn is_index_name(title: &str) -> bool {
    title.bytes().all(|b| b.is_ascii_digit())
}

async fn move_to(from: &Path, to: &Path) -> Result<(), TrackError> {
    if rename_no_clobber(from, to).await.map_err(rename_error(from))? {
        Ok(())
    } else {
        Err(TrackError::Io(format!(
            "Failed to rename {}: {} already exists",
            from.display(),
            to.display()
        )))
    }
}

fn rename_error(from: &Path) -> impl FnOnce(std::io::Error) -> TrackError + '_ {
    move |e| TrackError::Io(format!("Failed to rename {}: {}", from.display(), e))
}

/// Returns `Ok(false)` when `to` is already taken.
async fn rename_no_clobber(from: &Path, to: &Path) -> std::io::Result<bool> {
    match tokio::fs::hard_link(from, to).await {
        Ok(()) => {
            tokio::fs::remove_file(from).await?;
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => {
            // no hard links on this filesystem
            log::trace!("hard link failed ({}), falling back to rename", e);
            if tokio::fs::try_exists(to).await? {
                return Ok(false);
            }
            tokio::fs::rename(from, to).await?;
            Ok(true)
        }
    }
}
