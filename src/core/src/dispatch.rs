//! Stream dispatcher: submits a build and routes its events to the renderer.

use async_trait::async_trait;
use tokio_stream::{Stream, StreamExt};

use crate::error::{BuildError, Result};
use crate::event::BuildEvent;
use crate::grpc::pb;
use crate::render::{ProgressRenderer, Terminal};
use crate::request::BuildRequest;

/// Ordered source of build events.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event. `Ok(None)` is the end-of-stream signal.
    async fn next_event(&mut self) -> Result<Option<BuildEvent>>;
}

/// Event source over a stream of wire messages, such as a gRPC response.
pub struct MessageStream<S> {
    inner: S,
}

impl<S> MessageStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> EventSource for MessageStream<S>
where
    S: Stream<Item = std::result::Result<pb::BuildImageMessage, tonic::Status>> + Unpin + Send,
{
    async fn next_event(&mut self) -> Result<Option<BuildEvent>> {
        match self.inner.next().await {
            Some(Ok(message)) => Ok(Some(BuildEvent::from(message))),
            Some(Err(status)) => Err(status.into()),
            None => Ok(None),
        }
    }
}

/// Accepts a build request and returns its event stream.
#[async_trait]
pub trait BuildService: Send {
    type Source: EventSource;

    async fn submit(&mut self, request: BuildRequest) -> Result<Self::Source>;
}

/// Dispatcher lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Streaming,
    Finished,
    Failed,
}

/// Drives one build from submission to end of stream.
pub struct StreamDispatcher<T: Terminal> {
    renderer: ProgressRenderer<T>,
    state: DispatchState,
}

impl<T: Terminal> StreamDispatcher<T> {
    pub fn new(terminal: T) -> Self {
        Self {
            renderer: ProgressRenderer::new(terminal),
            state: DispatchState::Idle,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn renderer(&self) -> &ProgressRenderer<T> {
        &self.renderer
    }

    pub fn into_renderer(self) -> ProgressRenderer<T> {
        self.renderer
    }

    /// Submit `request` and consume its events until the stream ends.
    ///
    /// The first transport failure, server-reported failure or output error
    /// ends the run. Nothing is retried.
    pub async fn run<S: BuildService>(
        &mut self,
        service: &mut S,
        request: BuildRequest,
    ) -> Result<()> {
        if self.state != DispatchState::Idle {
            return Err(BuildError::InvalidState(format!(
                "build already submitted ({:?})",
                self.state
            )));
        }

        tracing::info!(name = %request.name(), tags = ?request.tags(), "Submitting build");
        let outcome = match service.submit(request).await {
            Ok(mut source) => {
                self.state = DispatchState::Streaming;
                self.consume(&mut source).await
            }
            Err(e) => Err(e),
        };

        self.state = match outcome {
            Ok(()) => DispatchState::Finished,
            Err(_) => DispatchState::Failed,
        };
        outcome
    }

    async fn consume<E: EventSource>(&mut self, source: &mut E) -> Result<()> {
        loop {
            let event = match source.next_event().await? {
                Some(event) => event,
                None => {
                    tracing::info!("Build stream finished");
                    return Ok(());
                }
            };

            tracing::debug!(kind = event.kind(), "Received build event");
            match event {
                BuildEvent::Failed { message, code } => {
                    return Err(BuildError::BuildFailed { message, code });
                }
                BuildEvent::Ignored => continue,
                BuildEvent::Stream { .. }
                | BuildEvent::Status { .. }
                | BuildEvent::Progress { .. } => self.renderer.render(&event)?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingTerminal;
    use crate::request::{BuildParams, RequestBuilder};
    use std::collections::VecDeque;
    use tempfile::TempDir;

    struct Scripted(VecDeque<Result<Option<BuildEvent>>>);

    #[async_trait]
    impl EventSource for Scripted {
        async fn next_event(&mut self) -> Result<Option<BuildEvent>> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    struct FakeService {
        script: Option<Vec<Result<Option<BuildEvent>>>>,
        submissions: usize,
    }

    impl FakeService {
        fn new(script: Vec<Result<Option<BuildEvent>>>) -> Self {
            Self {
                script: Some(script),
                submissions: 0,
            }
        }
    }

    #[async_trait]
    impl BuildService for FakeService {
        type Source = Scripted;

        async fn submit(&mut self, _request: BuildRequest) -> Result<Scripted> {
            self.submissions += 1;
            let script = self
                .script
                .take()
                .ok_or_else(|| BuildError::Transport("no stream".to_string()))?;
            Ok(Scripted(script.into_iter().collect()))
        }
    }

    async fn request() -> BuildRequest {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine").unwrap();
        RequestBuilder::default()
            .build(BuildParams {
                source: Some(dir.path().to_str().unwrap().to_string()),
                name: "app".to_string(),
                raw: true,
                ..Default::default()
            })
            .await
            .unwrap()
    }

    fn progress(id: &str, status: &str) -> Result<Option<BuildEvent>> {
        Ok(Some(BuildEvent::Progress {
            id: id.to_string(),
            status: status.to_string(),
            progress: String::new(),
        }))
    }

    fn message(id: &str, status: &str) -> pb::BuildImageMessage {
        pb::BuildImageMessage {
            id: id.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_message_stream_maps_wire_messages() {
        let mut source = MessageStream::new(tokio_stream::iter(vec![Ok(message("a", "Done"))]));

        match source.next_event().await.unwrap() {
            Some(BuildEvent::Progress { id, status, .. }) => {
                assert_eq!(id, "a");
                assert_eq!(status, "Done");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(source.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_message_stream_status_is_transport_error() {
        let mut source = MessageStream::new(tokio_stream::iter(vec![
            Ok(message("a", "Waiting")),
            Err(tonic::Status::unavailable("connection reset")),
        ]));

        assert!(source.next_event().await.unwrap().is_some());
        match source.next_event().await {
            Err(BuildError::Transport(msg)) => assert!(msg.contains("connection reset")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_mid_stream_fails_dispatch() {
        struct StreamService;

        #[async_trait]
        impl BuildService for StreamService {
            type Source = MessageStream<
                tokio_stream::Iter<
                    std::vec::IntoIter<std::result::Result<pb::BuildImageMessage, tonic::Status>>,
                >,
            >;

            async fn submit(&mut self, _request: BuildRequest) -> Result<Self::Source> {
                Ok(MessageStream::new(tokio_stream::iter(vec![
                    Ok(message("a", "Waiting")),
                    Err(tonic::Status::internal("stream broke")),
                ])))
            }
        }

        let mut dispatcher = StreamDispatcher::new(RecordingTerminal::new(true));
        let err = dispatcher
            .run(&mut StreamService, request().await)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Transport(_)));
        assert_eq!(dispatcher.state(), DispatchState::Failed);
    }

    #[tokio::test]
    async fn test_end_of_stream_finishes() {
        let mut service = FakeService::new(vec![progress("a", "Done"), Ok(None)]);
        let mut dispatcher = StreamDispatcher::new(RecordingTerminal::new(true));

        dispatcher.run(&mut service, request().await).await.unwrap();
        assert_eq!(dispatcher.state(), DispatchState::Finished);
        assert_eq!(service.submissions, 1);
    }

    #[tokio::test]
    async fn test_events_after_end_of_stream_are_not_read() {
        let mut service = FakeService::new(vec![
            Ok(None),
            Ok(Some(BuildEvent::Status {
                text: "late".to_string(),
            })),
        ]);
        let mut dispatcher = StreamDispatcher::new(RecordingTerminal::new(true));

        dispatcher.run(&mut service, request().await).await.unwrap();
        assert!(dispatcher.renderer().terminal().ops().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_fails() {
        let mut service = FakeService::new(vec![
            progress("a", "Waiting"),
            Err(BuildError::Transport("connection reset".to_string())),
            progress("a", "Done"),
        ]);
        let mut dispatcher = StreamDispatcher::new(RecordingTerminal::new(true));

        let result = dispatcher.run(&mut service, request().await).await;
        assert!(matches!(result, Err(BuildError::Transport(_))));
        assert_eq!(dispatcher.state(), DispatchState::Failed);
        assert_eq!(dispatcher.renderer().terminal().screen(), ["a: Waiting "]);
    }

    #[tokio::test]
    async fn test_build_failure_carries_code() {
        let mut service = FakeService::new(vec![Ok(Some(BuildEvent::Failed {
            message: "step failed".to_string(),
            code: 42,
        }))]);
        let mut dispatcher = StreamDispatcher::new(RecordingTerminal::new(true));

        let err = dispatcher
            .run(&mut service, request().await)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 42);
        assert!(matches!(err, BuildError::BuildFailed { code: 42, .. }));
    }

    #[tokio::test]
    async fn test_ignored_events_continue() {
        let mut service = FakeService::new(vec![
            Ok(Some(BuildEvent::Ignored)),
            progress("a", "Done"),
        ]);
        let mut dispatcher = StreamDispatcher::new(RecordingTerminal::new(true));

        dispatcher.run(&mut service, request().await).await.unwrap();
        assert_eq!(dispatcher.renderer().terminal().screen(), ["a: Done "]);
    }

    #[tokio::test]
    async fn test_submit_failure() {
        let mut service = FakeService {
            script: None,
            submissions: 0,
        };
        let mut dispatcher = StreamDispatcher::new(RecordingTerminal::new(true));

        let result = dispatcher.run(&mut service, request().await).await;
        assert!(matches!(result, Err(BuildError::Transport(_))));
        assert_eq!(dispatcher.state(), DispatchState::Failed);
    }

    #[tokio::test]
    async fn test_runs_only_once() {
        let mut service = FakeService::new(vec![Ok(None)]);
        let mut dispatcher = StreamDispatcher::new(RecordingTerminal::new(true));
        dispatcher.run(&mut service, request().await).await.unwrap();

        let result = dispatcher.run(&mut service, request().await).await;
        assert!(matches!(result, Err(BuildError::InvalidState(_))));
        assert_eq!(service.submissions, 1);
    }
}
