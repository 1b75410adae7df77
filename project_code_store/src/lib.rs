//! Repository acquisition built on `git2` (libgit2).
//!
//! - An existing local directory is analyzed in place.
//! - Anything else is treated as a Git URL and cloned (inside
//!   `spawn_blocking`) to `<work_dir>/<repo_name>-<timestamp>`.
//! - SSH auth: `SSH_KEY_PATH` (private key) or ssh-agent fallback.
//! - HTTPS auth: `GIT_HTTP_TOKEN` (+ `GIT_HTTP_USER`, default `oauth2`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use git2::{Cred, CredentialType, FetchOptions, RemoteCallbacks, build::RepoBuilder};
use tokio::task;
use tracing::{debug, error, info, instrument, warn};

pub mod errors;
pub use errors::{GitCloneError, Result};

/// Working tree the pipeline operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredRepo {
    pub path: PathBuf,
    /// `true` when the tree is a temporary clone owned by this run.
    pub cloned: bool,
}

impl AcquiredRepo {
    /// Remove a cloned tree. Local directories are never touched.
    pub fn cleanup(&self) -> Result<()> {
        if !self.cloned {
            debug!(path = %self.path.display(), "local repository, nothing to clean up");
            return Ok(());
        }
        remove_tree(&self.path)
    }
}

/// Resolve `repo` to a working tree.
///
/// A path to an existing directory is used as is; otherwise `repo` is cloned
/// under `work_dir`.
#[instrument(skip_all, fields(repo = %repo))]
pub async fn acquire(repo: &str, work_dir: &Path) -> Result<AcquiredRepo> {
    let local = Path::new(repo);
    if local.is_dir() {
        info!(path = %local.display(), "using local repository");
        return Ok(AcquiredRepo {
            path: local.to_path_buf(),
            cloned: false,
        });
    }

    let name = extract_repo_name(repo).ok_or_else(|| GitCloneError::RepoName(repo.to_string()))?;
    fs::create_dir_all(work_dir)?;
    let target = work_dir.join(format!("{name}-{}", Utc::now().format("%Y%m%d%H%M%S")));

    let url = repo.to_string();
    let dest = target.clone();
    task::spawn_blocking(move || {
        let _span = tracing::info_span!("clone_task", repo = %url).entered();
        clone_one_blocking(&url, &dest)
    })
    .await??;

    Ok(AcquiredRepo {
        path: target,
        cloned: true,
    })
}

/// Blocking clone (runs inside `spawn_blocking`).
///
/// - Removes a stale `target` left over from an earlier run.
/// - Configures libgit2 credential callbacks for SSH/HTTPS.
/// - Clones with `RepoBuilder`.
fn clone_one_blocking(url: &str, target: &Path) -> Result<()> {
    if target.exists() {
        warn!(path = %target.display(), "removing existing target");
        remove_tree(target)?;
    }

    let mut fetch_opts = FetchOptions::new();
    fetch_opts.remote_callbacks(credential_callbacks());

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_opts);

    info!(path = %target.display(), "begin clone");
    match builder.clone(url, target) {
        Ok(_) => {
            info!(path = %target.display(), "clone completed");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "clone failed");
            Err(e.into())
        }
    }
}

fn credential_callbacks() -> RemoteCallbacks<'static> {
    let key_path_env = std::env::var("SSH_KEY_PATH").ok();

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url_str, username_from_url, allowed| {
        let user = username_from_url.unwrap_or("git");

        if url_str.starts_with("http") {
            if let Ok(token) = std::env::var("GIT_HTTP_TOKEN") {
                let http_user = std::env::var("GIT_HTTP_USER").unwrap_or_else(|_| "oauth2".into());
                return Cred::userpass_plaintext(&http_user, &token);
            }
        }

        if allowed.contains(CredentialType::SSH_KEY) {
            if let Some(key) = key_path_env.as_deref().map(Path::new).filter(|p| p.exists()) {
                let pass = std::env::var("SSH_KEY_PASSPHRASE").ok();
                return Cred::ssh_key(user, None, key, pass.as_deref());
            }
            if let Ok(cred) = Cred::ssh_key_from_agent(user) {
                return Ok(cred);
            }
        }

        if allowed.contains(CredentialType::DEFAULT) {
            if let Ok(cred) = Cred::default() {
                return Ok(cred);
            }
        }

        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(user);
        }

        Err(git2::Error::from_str("no usable credentials"))
    });
    callbacks
}

/// Extract repository name from common Git URL forms:
/// - https://host/org/repo.git
/// - ssh://git@host/org/repo.git
/// - git@host:org/repo.git
pub fn extract_repo_name(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = if let Some(i) = trimmed.rfind('/') {
        &trimmed[i + 1..]
    } else if let Some(i) = trimmed.rfind(':') {
        &trimmed[i + 1..]
    } else {
        trimmed
    };
    let name = last.trim_end_matches(".git");
    (!name.is_empty()).then(|| name.to_string())
}

/// `remove_dir_all` that first clears read-only flags (git pack files are
/// read-only on some platforms).
fn remove_tree(path: &Path) -> Result<()> {
    let cleanup_err = |source| GitCloneError::Cleanup {
        path: path.to_path_buf(),
        source,
    };
    let mut stack = vec![path.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).map_err(cleanup_err)? {
            let entry = entry.map_err(cleanup_err)?;
            let meta = entry.metadata().map_err(cleanup_err)?;
            let mut perms = meta.permissions();
            if perms.readonly() {
                #[allow(clippy::permissions_set_readonly_false)]
                perms.set_readonly(false);
                fs::set_permissions(entry.path(), perms).map_err(cleanup_err)?;
            }
            if meta.is_dir() {
                stack.push(entry.path());
            }
        }
    }
    fs::remove_dir_all(path).map_err(cleanup_err)?;
    info!(path = %path.display(), "removed cloned repository");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_names_from_url_forms() {
        assert_eq!(extract_repo_name("https://github.com/org/calc.git").as_deref(), Some("calc"));
        assert_eq!(extract_repo_name("ssh://git@host/org/calc.git/").as_deref(), Some("calc"));
        assert_eq!(extract_repo_name("git@github.com:calc.git").as_deref(), Some("calc"));
        assert_eq!(extract_repo_name("https://host/org/plain").as_deref(), Some("plain"));
        assert_eq!(extract_repo_name("/"), None);
    }

    #[tokio::test]
    async fn local_directory_is_used_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let repo = acquire(dir.path().to_str().unwrap(), work.path()).await.unwrap();
        assert_eq!(repo.path, dir.path());
        assert!(!repo.cloned);

        repo.cleanup().unwrap();
        assert!(dir.path().exists());
    }

    #[test]
    fn cleanup_removes_read_only_files() {
        let work = tempfile::tempdir().unwrap();
        let clone = work.path().join("calc-20240101000000");
        fs::create_dir_all(clone.join(".git/objects")).unwrap();
        let pack = clone.join(".git/objects/pack");
        fs::write(&pack, "x").unwrap();
        let mut perms = fs::metadata(&pack).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&pack, perms).unwrap();

        let repo = AcquiredRepo {
            path: clone.clone(),
            cloned: true,
        };
        repo.cleanup().unwrap();
        assert!(!clone.exists());
    }
}
