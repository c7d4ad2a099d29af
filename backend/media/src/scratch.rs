//! Per-job scratch storage.
//!
//! Every job gets its own directory `<root>/job-<uuid>`; nothing a job writes
//! lives outside it, so concurrent jobs never touch the same path and no
//! locking is needed. The directory is removed by [`JobScratch::release`] or,
//! if the job is cancelled or panics first, by the drop guard.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};
use voxscribe_core::JobId;

const JOB_DIR_PREFIX: &str = "job-";

/// Root of all per-job scratch directories.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location a job's directory would get. Depends only on the job id.
    pub fn job_dir(&self, job: JobId) -> PathBuf {
        self.root.join(format!("{JOB_DIR_PREFIX}{job}"))
    }

    /// Create the scratch directory for `job`.
    ///
    /// Fails with `AlreadyExists` rather than sharing a directory if the
    /// location is somehow taken.
    pub async fn acquire(&self, job: JobId) -> io::Result<JobScratch> {
        fs::create_dir_all(&self.root).await?;
        let dir = self.job_dir(job);
        fs::create_dir(&dir).await?;
        debug!(job_id = %job, dir = %dir.display(), "Acquired scratch directory");
        Ok(JobScratch {
            job,
            dir,
            released: false,
        })
    }

    /// Remove job directories left behind by a previous process that was
    /// killed before it could clean up. Returns how many were removed.
    pub async fn purge_leftovers(&self) -> io::Result<usize> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(JOB_DIR_PREFIX) {
                continue;
            }
            match fs::remove_dir_all(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to purge stale scratch directory"),
            }
        }
        if removed > 0 {
            info!(removed, root = %self.root.display(), "Purged stale scratch directories");
        }
        Ok(removed)
    }
}

/// Scratch directory owned by exactly one job.
#[derive(Debug)]
pub struct JobScratch {
    job: JobId,
    dir: PathBuf,
    released: bool,
}

impl JobScratch {
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path for an artifact inside this job's directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Remove the directory and everything in it.
    ///
    /// Consumes the handle, so it runs at most once per job. Failures are
    /// logged and otherwise ignored.
    pub async fn release(mut self) {
        self.released = true;
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => debug!(job_id = %self.job, "Released scratch directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                job_id = %self.job,
                dir = %self.dir.display(),
                error = %e,
                "Failed to remove scratch directory"
            ),
        }
    }
}

impl Drop for JobScratch {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(job_id = %self.job, "Removed scratch directory of abandoned job"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(job_id = %self.job, error = %e, "Failed to remove scratch directory of abandoned job"),
        }
    }
}
