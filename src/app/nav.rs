/// The three drill-down views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Commits,
    ChangeSummary,
    Diff,
}

impl ViewKind {
    pub fn label(&self) -> &'static str {
        match self {
            ViewKind::Commits => "COMMITS",
            ViewKind::ChangeSummary => "FILES",
            ViewKind::Diff => "DIFF",
        }
    }
}

/// Drill-down history of active views. The bottom is always `Commits`.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationStack {
    views: Vec<ViewKind>,
}

impl Default for NavigationStack {
    fn default() -> Self {
        NavigationStack {
            views: vec![ViewKind::Commits],
        }
    }
}

impl NavigationStack {
    pub fn current(&self) -> ViewKind {
        self.views.last().copied().unwrap_or(ViewKind::Commits)
    }

    pub fn depth(&self) -> usize {
        self.views.len()
    }

    pub fn contains(&self, view: ViewKind) -> bool {
        self.views.contains(&view)
    }

    pub fn push(&mut self, view: ViewKind) {
        self.views.push(view);
    }

    /// Pop the top view. Returns `false` (and leaves the stack alone) at the
    /// root, where going back means leaving the program.
    pub fn pop(&mut self) -> bool {
        if self.views.len() <= 1 {
            return false;
        }
        self.views.pop();
        true
    }
}
