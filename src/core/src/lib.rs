//! Eru Image Core - build request assembly and progress rendering
//!
//! Assembles image build requests, submits them to the build service and
//! renders the streamed build events as a live multi-line display.

pub mod archive;
pub mod config;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod event;
pub mod grpc;
pub mod ledger;
pub mod loader;
pub mod render;
pub mod request;
pub mod spec;

// Re-export commonly used types
pub use config::ClientConfig;
pub use dispatch::{BuildService, DispatchState, EventSource, MessageStream, StreamDispatcher};
pub use error::{BuildError, Result};
pub use event::BuildEvent;
pub use grpc::GrpcBuildService;
pub use ledger::{Placement, ProgressLedger};
pub use render::{AnsiTerminal, ProgressRenderer, RecordingTerminal, Terminal, TerminalOp};
pub use request::{BuildMode, BuildParams, BuildPayload, BuildRequest, RequestBuilder};
pub use spec::{BuildSpec, StageSpec};

/// Eru Image version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
