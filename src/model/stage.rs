/// Stages of a single install run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Start,
    /// Cloning the repository into the workspace.
    Cloning,
    /// Searching the clone for tool manifests.
    Scanning,
    /// Waiting for the user to pick a tool.
    Selecting,
    /// Uninstall, pack and install.
    Installing,
    /// Removing the clone.
    Cleanup,
    Done,
    /// Terminal state after any fatal error.
    Aborted,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Start => "START",
            Stage::Cloning => "CLONING",
            Stage::Scanning => "SCANNING",
            Stage::Selecting => "SELECTING",
            Stage::Installing => "INSTALLING",
            Stage::Cleanup => "CLEANUP",
            Stage::Done => "DONE",
            Stage::Aborted => "ABORTED",
        }
    }
}
