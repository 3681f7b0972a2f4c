use super::changes::{merge_counts, parse_name_status, parse_numstat, ChangeEntry};
use super::diff::{parse_diff_lines, DiffLine, DiffOptions};
use super::log::{parse_log, Commit, LOG_FORMAT};
use super::range::CommitRange;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Read-only queries against the repository.
///
/// Every call blocks until the underlying tool finishes.
pub trait DataSource {
    /// All commits reachable from HEAD, newest first
    fn fetch_log(&self) -> Result<Vec<Commit>>;

    /// Files changed within `range`
    fn fetch_change_summary(&self, range: &CommitRange) -> Result<Vec<ChangeEntry>>;

    /// Patch lines for one file within `range`
    fn fetch_diff(
        &self,
        range: &CommitRange,
        path: &str,
        old_path: Option<&str>,
        options: DiffOptions,
    ) -> Result<Vec<DiffLine>>;

    /// Whether `path` is excluded by the repository's ignore rules
    fn is_excluded(&self, path: &Path) -> bool;
}

// ── Repo Info ──

/// Get the repository root directory
pub fn get_repo_root() -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .context("Failed to run git")?;

    if !output.status.success() {
        anyhow::bail!("Not in a git repository");
    }

    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim(),
    ))
}

/// Get the absolute path of the repository metadata directory (usually `.git`)
pub fn get_git_dir(repo_root: &Path) -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--absolute-git-dir"])
        .current_dir(repo_root)
        .output()
        .context("Failed to run git")?;

    if !output.status.success() {
        anyhow::bail!("Failed to locate git directory");
    }

    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim(),
    ))
}

// ── GitCli ──

/// [`DataSource`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
    rename_threshold: u8,
    tab_width: usize,
}

impl GitCli {
    pub fn new(repo_root: PathBuf, rename_threshold: u8, tab_width: usize) -> Self {
        GitCli {
            repo_root,
            rename_threshold: rename_threshold.min(100),
            tab_width,
        }
    }

    fn find_renames(&self) -> String {
        format!("--find-renames={}%", self.rename_threshold)
    }

    /// Run git with `args` in the repo root and return stdout
    fn run(&self, args: &[String]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        tracing::debug!(
            cmd = %args.join(" "),
            cwd = %self.repo_root.display(),
            exit = ?output.status.code(),
            stdout_len = stdout.len(),
            "git"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git {} failed: {}", args[0], stderr.trim());
        }

        Ok(stdout)
    }

    /// Assemble `git <command> <flags> <revisions> [-- <paths>]` for a range
    fn range_command(
        &self,
        range: &CommitRange,
        flags: &[&str],
        paths: &[&str],
    ) -> Vec<String> {
        let (mut args, revisions) = range.git_args();
        args.extend(flags.iter().map(|f| f.to_string()));
        args.push(self.find_renames());
        args.extend(revisions);
        if !paths.is_empty() {
            args.push("--".into());
            args.extend(paths.iter().map(|p| p.to_string()));
        }
        args
    }
}

impl DataSource for GitCli {
    fn fetch_log(&self) -> Result<Vec<Commit>> {
        // a fresh repository has no HEAD yet
        let head = ["rev-parse", "--verify", "-q", "HEAD"].map(String::from);
        if self.run(&head).is_err() {
            return Ok(Vec::new());
        }

        let args = vec![
            "log".to_string(),
            "--decorate".to_string(),
            LOG_FORMAT.to_string(),
        ];
        let stdout = self.run(&args).context("Failed to read commit log")?;
        Ok(parse_log(&stdout))
    }

    fn fetch_change_summary(&self, range: &CommitRange) -> Result<Vec<ChangeEntry>> {
        let names = self.run(&self.range_command(range, &["--name-status", "-z"], &[]))?;
        let counts = self.run(&self.range_command(range, &["--numstat", "-z"], &[]))?;
        Ok(merge_counts(parse_name_status(&names), &parse_numstat(&counts)))
    }

    fn fetch_diff(
        &self,
        range: &CommitRange,
        path: &str,
        old_path: Option<&str>,
        options: DiffOptions,
    ) -> Result<Vec<DiffLine>> {
        let mut flags = vec!["-p", "-M", "--patience", "--no-color", "--no-ext-diff"];
        if options.ignore_whitespace {
            flags.push("-w");
        }
        let mut paths = vec![path];
        if let Some(old) = old_path {
            paths.push(old);
        }
        let stdout = self.run(&self.range_command(range, &flags, &paths))?;
        Ok(parse_diff_lines(&stdout, self.tab_width))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let status = Command::new("git")
            .args(["check-ignore", "-q", "--"])
            .arg(path)
            .current_dir(&self.repo_root)
            .status();

        match status.map(|s| s.code()) {
            Ok(Some(0)) => true,
            Ok(Some(1)) => false,
            Ok(code) => {
                tracing::warn!(path = %path.display(), ?code, "git check-ignore failed");
                false
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "git check-ignore could not run");
                false
            }
        }
    }
}
