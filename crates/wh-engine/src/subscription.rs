use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

use wh_sim::RunTick;

/// One caller's view of a run's tick stream.
///
/// Starts at the next tick emitted after subscribing and ends once the run
/// reaches a terminal stage and its final tick has been read.  Dropping the
/// subscription detaches it; the run never waits on a slow reader.
pub struct RunSubscription {
    rx: mpsc::UnboundedReceiver<RunTick>,
}

impl RunSubscription {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<RunTick>) -> Self {
        Self { rx }
    }

    /// A subscription that is already finished.
    pub(crate) fn closed() -> Self {
        let (_, rx) = mpsc::unbounded_channel();
        Self { rx }
    }

    /// The next tick, or `None` once the run is over.
    pub async fn next_tick(&mut self) -> Option<RunTick> {
        self.rx.recv().await
    }
}

impl Stream for RunSubscription {
    type Item = RunTick;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<RunTick>> {
        self.rx.poll_recv(cx)
    }
}
