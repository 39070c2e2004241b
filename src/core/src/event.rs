//! Build events pushed by the build service.

use crate::grpc::pb;

/// Status that marks the end of a build phase.
pub const FINISHED_STATUS: &str = "finished";

/// One decoded item of the build event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// Raw output to print verbatim
    Stream { text: String, finished: bool },
    /// Standalone status line with no stage attached
    Status { text: String },
    /// Progress update for one stage
    Progress {
        id: String,
        status: String,
        progress: String,
    },
    /// Server-reported build failure
    Failed { message: String, code: i64 },
    /// Nothing to show
    Ignored,
}

impl BuildEvent {
    /// Short kind name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildEvent::Stream { .. } => "stream",
            BuildEvent::Status { .. } => "status",
            BuildEvent::Progress { .. } => "progress",
            BuildEvent::Failed { .. } => "failed",
            BuildEvent::Ignored => "ignored",
        }
    }
}

impl From<pb::BuildImageMessage> for BuildEvent {
    fn from(msg: pb::BuildImageMessage) -> Self {
        if !msg.error.is_empty() {
            let (message, code) = match msg.error_detail {
                Some(detail) if !detail.message.is_empty() => (detail.message, detail.code),
                Some(detail) => (msg.error, detail.code),
                None => (msg.error, 0),
            };
            return BuildEvent::Failed { message, code };
        }

        if !msg.stream.is_empty() {
            return BuildEvent::Stream {
                finished: msg.status == FINISHED_STATUS,
                text: msg.stream,
            };
        }

        if !msg.status.is_empty() {
            if msg.id.is_empty() {
                return BuildEvent::Status { text: msg.status };
            }
            return BuildEvent::Progress {
                id: msg.id,
                status: msg.status,
                progress: msg.progress,
            };
        }

        BuildEvent::Ignored
    }
}
