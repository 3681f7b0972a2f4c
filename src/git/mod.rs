mod changes;
mod cli;
mod diff;
mod log;
mod range;

pub use changes::{ChangeEntry, ChangeKind};
pub use cli::{get_git_dir, get_repo_root, DataSource, GitCli};
pub use diff::{DiffLine, DiffOptions, LineType};
pub use log::{format_age, short_author, unix_now, Commit, Decoration};
pub use range::CommitRange;
