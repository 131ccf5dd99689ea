//! Source reference parsing
//!
//! A `[SOURCE]` is either the current working directory or a hosted
//! repository pinned to a revision (`github:owner/repo@rev`,
//! `gitlab:owner/repo@rev`).

use crate::error::{MakesError, MakesResult};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Characters left untouched when encoding a URL component; spaces are
/// turned into `+` afterwards, form-encoding style
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b' ');

static GITHUB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^github:(?P<owner>.*)/(?P<repo>.*)@(?P<rev>.*)$").expect("static pattern")
});

static GITLAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gitlab:(?P<owner>.*)/(?P<repo>.*)@(?P<rev>.*)$").expect("static pattern")
});

/// Hosting provider of a remote reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    GitHub,
    GitLab,
}

impl Provider {
    fn all() -> &'static [Self] {
        &[Self::GitHub, Self::GitLab]
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::GitHub => &*GITHUB,
            Self::GitLab => &*GITLAB,
        }
    }

    /// Remote URL for an already-encoded owner and repository
    fn url(&self, owner: &str, repo: &str) -> String {
        match self {
            Self::GitHub => format!("https://github.com/{}/{}", owner, repo),
            Self::GitLab => format!("https://gitlab.com/{}/{}.git", owner, repo),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => write!(f, "github"),
            Self::GitLab => write!(f, "gitlab"),
        }
    }
}

/// A parsed `[SOURCE]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    /// The git working copy in the current directory
    Local(PathBuf),
    /// A hosted repository; components are already percent-encoded
    Hosted {
        provider: Provider,
        owner: String,
        repo: String,
        rev: String,
    },
}

impl SourceReference {
    /// Classify a raw source string relative to `cwd`
    pub fn parse(raw: &str, cwd: &Path) -> MakesResult<Self> {
        if is_local(raw, cwd) {
            return Ok(Self::Local(normalize(cwd, Path::new(raw))));
        }

        for provider in Provider::all() {
            if let Some(caps) = provider.pattern().captures(raw) {
                return Ok(Self::Hosted {
                    provider: *provider,
                    owner: encode(&caps["owner"]),
                    repo: encode(&caps["repo"]),
                    rev: encode(&caps["rev"]),
                });
            }
        }

        Err(MakesError::UnrecognizedReference(raw.to_string()))
    }

    /// Where git should fetch from
    pub fn remote(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::Hosted {
                provider,
                owner,
                repo,
                ..
            } => provider.url(owner, repo),
        }
    }

    /// Revision to fetch and check out
    pub fn rev(&self) -> &str {
        match self {
            Self::Local(_) => "HEAD",
            Self::Hosted { rev, .. } => rev,
        }
    }

    /// Clone cache key; empty for local sources, which are never cached
    pub fn cache_key(&self) -> String {
        match self {
            Self::Local(_) => String::new(),
            Self::Hosted {
                provider,
                owner,
                repo,
                rev,
            } => format!("{}-{}-{}-{}", provider, owner, repo, rev),
        }
    }
}

/// Whether `raw` names the current working directory
pub fn is_local(raw: &str, cwd: &Path) -> bool {
    normalize(cwd, Path::new(raw)) == normalize(cwd, cwd)
}

fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT)
        .to_string()
        .replace(' ', "+")
}

/// Lexically absolutize `path` against `cwd` without touching the filesystem
fn normalize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
