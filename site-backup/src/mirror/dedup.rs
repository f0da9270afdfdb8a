//! Turning enumerated remote paths into the transfer jobs that still need doing.
//!
//! A local file that already exists counts as downloaded. Its size and content
//! are never checked, so a truncated file from an aborted run stays truncated.

use super::scheduler::TransferJob;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Local destination of `remote_path` below `to_dir`.
pub fn local_destination(to_dir: &Path, remote_path: &str) -> PathBuf {
    to_dir.join(remote_path.trim_start_matches('/'))
}

/// De-duplicate remote paths and pair each with its local destination.
pub fn plan_jobs<I>(remote_paths: I, to_dir: &Path) -> Vec<TransferJob>
where
    I: IntoIterator<Item = String>,
{
    remote_paths
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|remote_path| {
            let local_path = local_destination(to_dir, &remote_path);
            TransferJob::new(remote_path, local_path)
        })
        .collect()
}

/// Drop every job whose local file already exists.
pub fn filter_existing(jobs: Vec<TransferJob>) -> Vec<TransferJob> {
    jobs.into_iter().filter(|job| !job.local_path().exists()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_jobs_removes_duplicates() {
        let to_dir = Path::new("/backup/ftp");
        let jobs = plan_jobs(paths(&["/a/x.txt", "/a/b/y.txt", "/a/x.txt"]), to_dir);

        assert_eq!(jobs.len(), 2);
        assert!(jobs.contains(&TransferJob::new(
            "/a/x.txt".to_string(),
            PathBuf::from("/backup/ftp/a/x.txt")
        )));
        assert!(jobs.contains(&TransferJob::new(
            "/a/b/y.txt".to_string(),
            PathBuf::from("/backup/ftp/a/b/y.txt")
        )));
    }

    #[test]
    fn test_local_destination_keeps_full_remote_path() {
        assert_eq!(
            local_destination(Path::new("ftp"), "/var/lib/dpkg/status"),
            PathBuf::from("ftp/var/lib/dpkg/status")
        );
    }

    #[test]
    fn test_filter_existing_drops_present_files() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let l1 = temp_dir.path().join("l1");
        let l2 = temp_dir.path().join("l2");
        fs::write(&l1, b"already here")?;

        let jobs = vec![
            TransferJob::new("/r1".to_string(), l1),
            TransferJob::new("/r2".to_string(), l2.clone()),
        ];

        let remaining = filter_existing(jobs);
        assert_eq!(remaining, vec![TransferJob::new("/r2".to_string(), l2)]);
        Ok(())
    }

    #[test]
    fn test_filter_existing_trusts_truncated_files() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let partial = temp_dir.path().join("big.zip");
        fs::write(&partial, b"")?;

        let remaining = filter_existing(vec![TransferJob::new("/big.zip".to_string(), partial)]);
        assert!(remaining.is_empty());
        Ok(())
    }

    #[test]
    fn test_filter_is_idempotent_once_downloaded() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let jobs = plan_jobs(paths(&["/a/x.txt", "/b.txt"]), temp_dir.path());

        let first = filter_existing(jobs.clone());
        assert_eq!(first.len(), 2);

        for job in &first {
            fs::create_dir_all(job.local_path().parent().unwrap())?;
            fs::write(job.local_path(), b"data")?;
        }

        assert!(filter_existing(jobs.clone()).is_empty());
        assert!(filter_existing(filter_existing(jobs)).is_empty());
        Ok(())
    }
}
