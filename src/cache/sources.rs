//! Time-bounded store of fetched source repositories

use crate::error::{MakesError, MakesResult};
use crate::ui;
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// How long a cached clone may be reused, in seconds
pub const SOURCE_TTL_SECS: i64 = 86_400;

/// Outcome of looking up a cache key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Empty key: the source is never cached
    Disabled,
    /// A fresh entry exists at this path
    Hit(PathBuf),
    /// An entry existed but was too old and has been deleted
    Expired,
    /// No entry exists
    Miss,
}

impl CacheLookup {
    /// The location git should fetch from
    pub fn fetch_source(&self, remote: &str) -> String {
        match self {
            Self::Hit(path) => path.display().to_string(),
            _ => remote.to_string(),
        }
    }

    /// What the user is told about where `source` comes from
    pub fn announcement(&self, source: &str) -> Option<String> {
        match self {
            Self::Hit(path) => Some(format!(
                "Using cached version of: {}, from: {}",
                source,
                path.display()
            )),
            Self::Miss | Self::Expired => Some(format!("Downloading: {}", source)),
            Self::Disabled => None,
        }
    }
}

/// On-disk clone cache rooted at `<home>/.cache/makes/sources`
#[derive(Debug, Clone)]
pub struct CloneCache {
    root: PathBuf,
    ttl: Duration,
}

impl CloneCache {
    /// Create a cache with the standard 24 hour TTL
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_ttl(root, Duration::seconds(SOURCE_TTL_SECS))
    }

    /// Create a cache with a custom TTL
    pub fn with_ttl(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl,
        }
    }

    /// Directory an entry lives in
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Look up `key`, evicting the entry when it has outlived the TTL
    pub fn lookup(&self, key: &str) -> CacheLookup {
        if key.is_empty() {
            return CacheLookup::Disabled;
        }

        let entry = self.entry_path(key);
        if !entry.exists() {
            return CacheLookup::Miss;
        }

        match entry_age(&entry) {
            Some(age) if !is_expired(age, self.ttl) => CacheLookup::Hit(entry),
            age => {
                debug!("Cache entry {} expired (age: {:?})", entry.display(), age);
                self.evict(key);
                CacheLookup::Expired
            }
        }
    }

    /// Look up `key` and tell the user where `source` will come from
    pub fn resolve(&self, source: &str, key: &str) -> CacheLookup {
        let lookup = self.lookup(key);
        if let Some(message) = lookup.announcement(source) {
            match &lookup {
                CacheLookup::Hit(_) => ui::notice(&message),
                _ => ui::announce(&message),
            }
        }
        lookup
    }

    /// Seed the entry for `key` from a fresh checkout if none exists yet
    ///
    /// Existing entries are never overwritten; staleness is handled by
    /// [`CloneCache::lookup`]. A failed copy leaves no entry behind.
    pub fn refresh(&self, checkout: &Path, key: &str) {
        if key.is_empty() {
            return;
        }

        let entry = self.entry_path(key);
        if entry.exists() {
            return;
        }

        debug!("Seeding cache entry {}", entry.display());
        if let Err(e) = copy_tree(checkout, &entry) {
            warn!("Failed to cache {}: {}", key, e);
            self.evict(key);
        }
    }

    /// Delete the entry for `key`, ignoring failures
    pub fn evict(&self, key: &str) {
        if key.is_empty() {
            return;
        }
        let entry = self.entry_path(key);
        if entry.exists() {
            if let Err(e) = fs::remove_dir_all(&entry) {
                warn!("Failed to remove cache entry {}: {}", entry.display(), e);
            }
        }
    }
}

/// Whether an entry of the given age has outlived `ttl`
pub fn is_expired(age: Duration, ttl: Duration) -> bool {
    age > ttl
}

/// Age of a directory from its filesystem timestamps
fn entry_age(path: &Path) -> Option<Duration> {
    let meta = fs::metadata(path).ok()?;
    let stamp = meta.created().or_else(|_| meta.modified()).ok()?;
    let created: DateTime<Utc> = stamp.into();
    Some(Utc::now() - created)
}

/// Recursively copy `from` into `to`, preserving symlinks
pub fn copy_tree(from: &Path, to: &Path) -> MakesResult<()> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|e| {
            let context = format!("walking {}", from.display());
            match e.into_io_error() {
                Some(io) => MakesError::io(context, io),
                None => MakesError::PathNotFound(from.to_path_buf()),
            }
        })?;

        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| MakesError::PathNotFound(entry.path().to_path_buf()))?;
        let target = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| MakesError::io(format!("creating {}", target.display()), e))?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())
                .map_err(|e| MakesError::io(format!("reading link {}", entry.path().display()), e))?;
            symlink(&link, &target)
                .map_err(|e| MakesError::io(format!("linking {}", target.display()), e))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| MakesError::io(format!("copying to {}", target.display()), e))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(not(unix))]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    fs::copy(original, link).map(|_| ())
}
