use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    Provisioning,
    Materializing,
    Launching,
    Running,
    UploadingLog,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunState::Provisioning => write!(f, "provisioning"),
            RunState::Materializing => write!(f, "materializing"),
            RunState::Launching => write!(f, "launching"),
            RunState::Running => write!(f, "running"),
            RunState::UploadingLog => write!(f, "uploading-log"),
            RunState::Done => write!(f, "done"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}
