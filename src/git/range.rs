use super::log::abbrev;

/// Label shown for the open end of a range (the live working tree)
pub const WORKING_TREE_LABEL: &str = "<index>";

/// Pair of repository points defining a comparison.
///
/// `end == None` compares `start` against the working tree; `start == end`
/// means the changes introduced by that single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    pub start: String,
    pub end: Option<String>,
}

impl CommitRange {
    pub fn working_tree(start: impl Into<String>) -> Self {
        CommitRange {
            start: start.into(),
            end: None,
        }
    }

    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        CommitRange {
            start: start.into(),
            end: Some(end.into()),
        }
    }

    /// True when the range compares against the live working tree
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// True when the range shows one commit's own changes
    pub fn is_single(&self) -> bool {
        self.end.as_deref() == Some(self.start.as_str())
    }

    /// `start8..end8`, with the working tree sentinel for an open end
    pub fn label(&self) -> String {
        let end = self.end.as_deref().map(abbrev).unwrap_or(WORKING_TREE_LABEL);
        format!("{}..{}", abbrev(&self.start), end)
    }

    /// Git subcommand and revision arguments selecting this range.
    ///
    /// Flags go between the two halves: `git <command> <flags> <revisions> -- <paths>`.
    pub fn git_args(&self) -> (Vec<String>, Vec<String>) {
        match &self.end {
            None => (vec!["diff".into()], vec![self.start.clone()]),
            Some(_) if self.is_single() => (
                vec![
                    "diff-tree".into(),
                    "-r".into(),
                    "--root".into(),
                    "-m".into(),
                    "--first-parent".into(),
                    "--no-commit-id".into(),
                ],
                vec![self.start.clone()],
            ),
            Some(end) => (vec!["diff".into()], vec![self.start.clone(), end.clone()]),
        }
    }
}
