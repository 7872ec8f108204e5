//! Blame via the `git` executable, one child process per file.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::porcelain::parse_line_porcelain;
use super::{Blamer, FileBlameResult};
use crate::error::{BlameError, GalaError};
use crate::options::{AnalysisOptions, AuthorFilter, AuthorFormat};
use crate::Result;

/// Runs `git blame -M -C -w --line-porcelain` inside the repository root.
#[derive(Debug, Clone)]
pub struct GitBlamer {
    root: PathBuf,
    program: String,
    since: Option<String>,
    until: Option<String>,
    format: AuthorFormat,
    filter: AuthorFilter,
}

impl GitBlamer {
    /// Create a blamer for the repository at `root` (already validated).
    pub fn new(root: impl Into<PathBuf>, options: &AnalysisOptions) -> Self {
        Self {
            root: root.into(),
            program: "git".to_string(),
            since: options.since.clone(),
            until: options.until.clone(),
            format: options.author_format,
            filter: options.author_filter.clone(),
        }
    }

    /// Use a different executable in place of `git`.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments for blaming one root-relative path.
    pub fn blame_args(&self, path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["blame", "-M", "-C", "-w", "--line-porcelain"]
            .iter()
            .map(OsString::from)
            .collect();

        if let Some(since) = &self.since {
            args.push(format!("--since={since}").into());
        }
        if let Some(until) = &self.until {
            args.push(format!("--until={until}").into());
        }

        args.push("--".into());
        args.push(path.as_os_str().to_os_string());
        args
    }
}

/// Spawn errors that mean the program itself is unusable, as opposed to a
/// transient problem with one invocation.
fn is_launch_failure(error: &std::io::Error) -> bool {
    matches!(error.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied)
}

#[async_trait]
impl Blamer for GitBlamer {
    async fn blame(&self, path: &Path, cancel: &CancellationToken) -> Result<FileBlameResult> {
        let mut command = Command::new(&self.program);
        command
            .args(self.blame_args(path))
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) if is_launch_failure(&e) => {
                return Err(GalaError::BlameLaunch {
                    program: self.program.clone(),
                    source: e,
                })
            }
            Err(e) => {
                return Ok(FileBlameResult::failure(path, BlameError::Io(e.to_string())));
            }
        };

        // Dropping the wait future drops the child, and kill_on_drop kills it.
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(FileBlameResult::failure(path, BlameError::Cancelled));
            }
            output = child.wait_with_output() => output,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => return Ok(FileBlameResult::failure(path, BlameError::Io(e.to_string()))),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Ok(FileBlameResult::failure(
                path,
                BlameError::Failed {
                    exit_code: output.status.code(),
                    stderr,
                },
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let authors = parse_line_porcelain(&stdout, self.format, &self.filter);

        Ok(FileBlameResult::success(path, authors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command as StdCommand;
    use tempfile::{tempdir, TempDir};

    fn git_available() -> bool {
        StdCommand::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    fn commit_as(dir: &Path, name: &str, message: &str) {
        let user = format!("user.name={name}");
        let email = format!("user.email={}@example.com", name.to_lowercase());
        git(dir, &["add", "-A"]);
        git(
            dir,
            &["-c", &user, "-c", &email, "commit", "-q", "-m", message],
        );
    }

    /// Repository with `a.txt` (3 lines by Alice) and `b.txt` (2 by Alice,
    /// 1 appended by Bob).
    fn sample_repo() -> TempDir {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        git(dir, &["init", "-q"]);
        fs::write(dir.join("a.txt"), "one\ntwo\nthree\n").unwrap();
        fs::write(dir.join("b.txt"), "alpha\nbeta\n").unwrap();
        commit_as(dir, "Alice", "initial");
        fs::write(dir.join("b.txt"), "alpha\nbeta\ngamma\n").unwrap();
        commit_as(dir, "Bob", "append");
        temp
    }

    #[test]
    fn test_blame_args_include_date_bounds() {
        let options = AnalysisOptions::new().since("2024-01-01").until("2024-12-31");
        let blamer = GitBlamer::new("/repo", &options);

        let args = blamer.blame_args(Path::new("src/main.rs"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(
            args,
            vec![
                "blame",
                "-M",
                "-C",
                "-w",
                "--line-porcelain",
                "--since=2024-01-01",
                "--until=2024-12-31",
                "--",
                "src/main.rs",
            ]
        );
    }

    #[test]
    fn test_blame_args_without_bounds() {
        let blamer = GitBlamer::new("/repo", &AnalysisOptions::new());

        let args = blamer.blame_args(Path::new("x.go"));

        assert_eq!(args.len(), 7);
        assert_eq!(args[6], OsString::from("x.go"));
    }

    #[tokio::test]
    async fn test_blame_tracked_file() {
        if !git_available() {
            return;
        }
        let repo = sample_repo();
        let blamer = GitBlamer::new(repo.path(), &AnalysisOptions::new());

        let result = blamer
            .blame(Path::new("b.txt"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.error.is_none());
        assert_eq!(result.authors, vec!["Alice", "Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_blame_name_email_and_filter() {
        if !git_available() {
            return;
        }
        let repo = sample_repo();
        let options = AnalysisOptions::new()
            .author_format(AuthorFormat::NameEmail)
            .author_filter(AuthorFilter::new().exclude("alice <alice@example.com>"));
        let blamer = GitBlamer::new(repo.path(), &options);

        let result = blamer
            .blame(Path::new("b.txt"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.authors, vec!["Bob <bob@example.com>"]);
    }

    #[tokio::test]
    async fn test_untracked_file_is_a_per_file_failure() {
        if !git_available() {
            return;
        }
        let repo = sample_repo();
        fs::write(repo.path().join("scratch.txt"), "draft\n").unwrap();
        let blamer = GitBlamer::new(repo.path(), &AnalysisOptions::new());

        let result = blamer
            .blame(Path::new("scratch.txt"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.authors.is_empty());
        assert!(matches!(result.error, Some(BlameError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_invocation() {
        if !git_available() {
            return;
        }
        let repo = sample_repo();
        let blamer = GitBlamer::new(repo.path(), &AnalysisOptions::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = blamer.blame(Path::new("a.txt"), &cancel).await.unwrap();

        assert_eq!(result.error, Some(BlameError::Cancelled));
        assert!(result.authors.is_empty());
    }

    #[cfg(target_os = "linux")]
    fn process_running(pid: &str) -> bool {
        match fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit_once(") ")
                .map(|(_, rest)| !rest.starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_cancellation_kills_running_blame() {
        use std::time::{Duration, Instant};

        // `sh blame <args>` runs the script named `blame` in the working
        // directory, which records its pid and then blocks.
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("blame"), "echo $$ > child.pid\nexec sleep 30\n").unwrap();
        let blamer = GitBlamer::new(temp.path(), &AnalysisOptions::new()).program("sh");

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = blamer.blame(Path::new("a.txt"), &cancel).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(result.error, Some(BlameError::Cancelled));
        assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");

        let pid = fs::read_to_string(temp.path().join("child.pid")).unwrap();
        let pid = pid.trim().to_string();
        let mut alive = true;
        for _ in 0..40 {
            alive = process_running(&pid);
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!alive, "blame process {pid} survived cancellation");
    }

    #[tokio::test]
    async fn test_missing_program_is_a_launch_failure() {
        let temp = tempdir().unwrap();
        let blamer = GitBlamer::new(temp.path(), &AnalysisOptions::new())
            .program("gala-test-no-such-binary");

        let result = blamer
            .blame(Path::new("a.txt"), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(GalaError::BlameLaunch { .. })));
    }
}
