//! Git repository wrapper.

use std::path::Path;

use cadence_commit::RawCommit;
use chrono::{TimeZone, Utc};
use git2::{Direction, Repository as Git2Repo};
use serde_json::Value;
use tracing::debug;

use crate::{GitClient, GitError, GitResult};

/// Default remote name.
const DEFAULT_REMOTE: &str = "origin";

/// A Git repository wrapper implementing [`GitClient`] over `git2`.
pub struct Repository {
    inner: Git2Repo,
    remote: String,
}

impl Repository {
    /// Opens a repository at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a valid Git repository.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner = Git2Repo::open(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self {
            inner,
            remote: DEFAULT_REMOTE.to_string(),
        })
    }

    /// Discovers the repository from the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is found.
    pub fn discover() -> GitResult<Self> {
        let inner = Git2Repo::discover(".")?;
        Ok(Self {
            inner,
            remote: DEFAULT_REMOTE.to_string(),
        })
    }

    /// Uses the given remote instead of `origin`.
    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Returns the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.workdir().unwrap_or_else(|| self.inner.path())
    }

    /// Returns the checked-out branch name, or `None` when HEAD is
    /// detached.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be read.
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        if self.inner.head_detached()? {
            return Ok(None);
        }
        let head = self.inner.head()?;
        Ok(head.shorthand().map(String::from))
    }

    fn resolve_commit(&self, reference: &str) -> GitResult<git2::Oid> {
        let object = self
            .inner
            .revparse_single(reference)
            .map_err(|_| GitError::RefNotFound(reference.to_string()))?;
        let commit = object
            .peel_to_commit()
            .map_err(|_| GitError::RefNotFound(reference.to_string()))?;
        Ok(commit.id())
    }

    fn remote_head(&self, branch: &str) -> GitResult<Option<git2::Oid>> {
        let mut remote = self.inner.find_remote(&self.remote)?;
        remote.connect(Direction::Fetch)?;
        let wanted = format!("refs/heads/{branch}");
        let head = remote
            .list()?
            .iter()
            .find(|head| head.name() == wanted)
            .map(git2::RemoteHead::oid);
        remote.disconnect()?;
        Ok(head)
    }
}

impl GitClient for Repository {
    fn remote_branches(&self) -> GitResult<Vec<String>> {
        let mut remote = self.inner.find_remote(&self.remote)?;
        remote.connect(Direction::Fetch)?;
        let branches = remote
            .list()?
            .iter()
            .filter_map(|head| head.name().strip_prefix("refs/heads/"))
            .map(String::from)
            .collect();
        remote.disconnect()?;
        Ok(branches)
    }

    fn tags_reachable(&self, branch: Option<&str>) -> GitResult<Vec<String>> {
        let tip = match branch {
            Some(name) => self.resolve_commit(name)?,
            None => self.resolve_commit("HEAD")?,
        };

        let mut reachable = Vec::new();
        for name in self.inner.tag_names(None)?.iter().flatten() {
            let Ok(object) = self.inner.revparse_single(name) else {
                continue;
            };
            let Ok(commit) = object.peel_to_commit() else {
                continue;
            };
            let id = commit.id();
            if id == tip || self.inner.graph_descendant_of(tip, id)? {
                reachable.push(name.to_string());
            }
        }

        Ok(reachable)
    }

    fn rev_parse(&self, reference: &str) -> GitResult<String> {
        Ok(self.resolve_commit(reference)?.to_string())
    }

    fn head_hash(&self) -> GitResult<String> {
        self.rev_parse("HEAD")
    }

    fn is_head_detached(&self) -> GitResult<bool> {
        Ok(self.inner.head_detached()?)
    }

    fn read_note(&self, notes_ref: &str, target: &str) -> GitResult<Value> {
        let oid = self.resolve_commit(target)?;

        let note = match self.inner.find_note(Some(notes_ref), oid) {
            Ok(note) => note,
            Err(error) if error.code() == git2::ErrorCode::NotFound => {
                return Ok(Value::Object(serde_json::Map::new()));
            }
            Err(error) => return Err(error.into()),
        };

        let message = note.message().unwrap_or("").trim();
        if message.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(message).map_err(|source| GitError::InvalidNote {
            target: target.to_string(),
            source,
        })
    }

    fn write_note(&self, notes_ref: &str, target: &str, note: &Value) -> GitResult<()> {
        let oid = self.resolve_commit(target)?;
        let sig = self.inner.signature()?;

        self.inner
            .note(&sig, &sig, Some(notes_ref), oid, &note.to_string(), true)?;

        debug!(notes_ref, target, "wrote note");
        Ok(())
    }

    fn create_tag(&self, name: &str, target: &str) -> GitResult<()> {
        let object = self
            .inner
            .revparse_single(target)
            .map_err(|_| GitError::RefNotFound(target.to_string()))?;

        self.inner.tag_lightweight(name, &object, false)?;
        Ok(())
    }

    fn push_tag(&self, name: &str) -> GitResult<()> {
        let mut remote = self.inner.find_remote(&self.remote)?;
        let refspec = format!("refs/tags/{name}:refs/tags/{name}");
        remote.push(&[refspec.as_str()], None)?;
        Ok(())
    }

    fn push_notes(&self, notes_ref: &str) -> GitResult<()> {
        let mut remote = self.inner.find_remote(&self.remote)?;
        let refspec = format!("{notes_ref}:{notes_ref}");
        remote.push(&[refspec.as_str()], None)?;
        Ok(())
    }

    fn verify_push_permission(&self) -> GitResult<()> {
        // libgit2 has no dry-run push; a push-mode connect exercises the
        // same authentication and capability negotiation.
        let mut remote = self.inner.find_remote(&self.remote)?;
        remote
            .connect(Direction::Push)
            .map_err(|_| GitError::PushDenied {
                remote: self.remote.clone(),
            })?;
        remote.disconnect()?;
        Ok(())
    }

    fn is_branch_up_to_date(&self, branch: &str) -> GitResult<bool> {
        let Some(remote_head) = self.remote_head(branch)? else {
            return Ok(true);
        };
        Ok(self.resolve_commit(branch)? == remote_head)
    }

    fn commits_between(&self, from: Option<&str>, to: &str) -> GitResult<Vec<RawCommit>> {
        let mut revwalk = self.inner.revwalk()?;
        revwalk.push(self.resolve_commit(to)?)?;
        if let Some(reference) = from {
            revwalk.hide(self.resolve_commit(reference)?)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.inner.find_commit(oid)?;

            let message = commit.message().unwrap_or("").to_string();
            let author = commit.author();
            let time = commit.time();

            commits.push(RawCommit::new(
                oid.to_string(),
                message,
                author.name().unwrap_or("Unknown"),
                author.email().unwrap_or(""),
                Utc.timestamp_opt(time.seconds(), 0)
                    .single()
                    .unwrap_or_else(Utc::now),
            ));
        }

        Ok(commits)
    }
}
