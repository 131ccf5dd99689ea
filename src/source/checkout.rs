//! Reproducible checkouts
//!
//! The build never sees the user's working tree directly. Instead the
//! requested revision is fetched (depth 1) into a fresh scratch repository,
//! local staged and modified files are overlaid on top, and `.git` is
//! removed. Untracked files therefore never reach the build.

use crate::cache::{CacheLookup, CloneCache};
use crate::cleanup::Cleanup;
use crate::error::{MakesError, MakesResult};
use crate::process::{self, CommandOutput};
use crate::source::reference::SourceReference;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Branch name for the throwaway scratch repository
const SCRATCH_BRANCH: &str = "____";

/// Builds checkouts for one invocation
pub struct CheckoutBuilder<'a> {
    cache: &'a CloneCache,
    git: PathBuf,
}

impl<'a> CheckoutBuilder<'a> {
    /// Create a builder that uses `git` from PATH
    pub fn new(cache: &'a CloneCache) -> Self {
        Self {
            cache,
            git: PathBuf::from("git"),
        }
    }

    /// Produce a checkout of `reference`; `raw` is the user's `[SOURCE]`
    ///
    /// The returned directory is owned by `cleanup` and removed when it drops.
    pub async fn build(
        &self,
        raw: &str,
        reference: &SourceReference,
        cleanup: &mut Cleanup,
    ) -> MakesResult<PathBuf> {
        let scratch = tempfile::Builder::new()
            .prefix("makes-")
            .tempdir()
            .map_err(|e| MakesError::io("creating checkout directory", e))?;
        let head = scratch.path().to_path_buf();
        cleanup.adopt(scratch);
        debug!("Checking out {} into {}", raw, head.display());

        self.clone_revision(raw, reference, &head).await?;

        if let SourceReference::Local(workdir) = reference {
            let paths = self.changed_paths(raw, workdir).await?;
            overlay_changes(workdir, &head, &paths)?;
        }

        let metadata = head.join(".git");
        fs::remove_dir_all(&metadata)
            .map_err(|e| MakesError::io(format!("removing {}", metadata.display()), e))?;

        Ok(head)
    }

    /// Init, fetch and check out the requested revision, then seed the cache
    async fn clone_revision(
        &self,
        raw: &str,
        reference: &SourceReference,
        head: &Path,
    ) -> MakesResult<()> {
        let head_arg = head.display().to_string();
        let initial_branch = format!("--initial-branch={}", SCRATCH_BRANCH);
        self.git(
            raw,
            "git init",
            &["init", &initial_branch, "--shared=false", &head_arg],
        )
        .await?;

        let key = reference.cache_key();
        let remote = reference.remote();
        let rev = reference.rev();

        let lookup = self.cache.resolve(raw, &key);
        let fetched = self.fetch(raw, head, &lookup.fetch_source(&remote), rev).await;
        match (fetched, &lookup) {
            (Ok(()), _) => {}
            (Err(e), CacheLookup::Hit(entry)) => {
                // Broken entry: drop it and go to the network instead
                warn!("Cached clone {} unusable: {}", entry.display(), e);
                self.cache.evict(&key);
                self.fetch(raw, head, &remote, rev).await?;
            }
            (Err(e), _) => return Err(e),
        }

        self.git(raw, "git checkout", &["-C", &head_arg, "checkout", rev])
            .await?;
        info!("Checked out {} at {}", raw, rev);

        self.cache.refresh(head, &key);
        Ok(())
    }

    async fn fetch(&self, raw: &str, head: &Path, from: &str, rev: &str) -> MakesResult<()> {
        let head_arg = head.display().to_string();
        let refspec = format!("{}:{}", rev, rev);
        self.git(
            raw,
            "git fetch",
            &["-C", &head_arg, "fetch", "--depth=1", from, &refspec],
        )
        .await
        .map(|_| ())
    }

    /// Staged and modified paths in the user's working copy, sorted
    async fn changed_paths(&self, raw: &str, workdir: &Path) -> MakesResult<BTreeSet<String>> {
        let dir = workdir.display().to_string();
        let staged = self
            .git(
                raw,
                "list files",
                &["-C", &dir, "diff", "--cached", "--name-only", "-z"],
            )
            .await?;
        let modified = self
            .git(raw, "list files", &["-C", &dir, "ls-files", "--modified", "-z"])
            .await?;

        let mut paths = parse_path_list(&staged.stdout);
        paths.extend(parse_path_list(&modified.stdout));
        debug!("Propagating {} uncommitted path(s)", paths.len());
        Ok(paths)
    }

    async fn git(&self, raw: &str, stage: &str, args: &[&str]) -> MakesResult<CommandOutput> {
        let output = process::run_captured(&self.git, args, None).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(MakesError::clone_failed(
                stage,
                raw,
                output.stdout,
                output.stderr,
            ))
        }
    }
}

/// Split NUL-separated git path output
fn parse_path_list(stdout: &[u8]) -> BTreeSet<String> {
    stdout
        .split(|b| *b == 0)
        .filter(|p| !p.is_empty())
        .map(|p| String::from_utf8_lossy(p).into_owned())
        .collect()
}

/// Mirror each changed path from `workdir` into `head`
///
/// Paths that still exist are copied over; paths that were deleted are
/// removed from the checkout.
pub fn overlay_changes(workdir: &Path, head: &Path, paths: &BTreeSet<String>) -> MakesResult<()> {
    for path in paths {
        let src = workdir.join(path);
        let dest = head.join(path);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MakesError::io(format!("creating {}", parent.display()), e))?;
        }

        if src.is_dir() {
            // Submodules show up as modified directories
            debug!("Skipping directory {}", path);
        } else if src.exists() {
            fs::copy(&src, &dest)
                .map_err(|e| MakesError::io(format!("copying {}", path), e))?;
        } else {
            match fs::remove_file(&dest) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(MakesError::io(format!("removing {}", path), e)),
            }
        }
    }
    Ok(())
}
