// ABOUTME: Merged stdout/stderr line stream for streaming engine commands.
// ABOUTME: Reader tasks pump both pipes into one channel in arrival order.

use std::pin::Pin;
use std::process::ExitStatus;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Finite, non-restartable stream of output lines from a running engine
/// command.
///
/// Lines from stdout and stderr are delivered merged, in arrival order,
/// until the process closes both pipes; [`OutputLines::wait`] then reaps
/// the exit status. Dropping the stream kills the subprocess instead of
/// leaking it.
pub struct OutputLines {
    rx: UnboundedReceiver<String>,
    child: Child,
}

impl OutputLines {
    pub(crate) fn new(mut child: Child) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, tx);
        }

        Self { rx, child }
    }

    /// Next output line, or `None` once both pipes have closed.
    ///
    /// Delivered lines are never empty.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Stop delivery and wait for the process to exit.
    pub(crate) async fn wait(mut self) -> std::io::Result<ExitStatus> {
        self.rx.close();
        self.child.wait().await
    }
}

impl Stream for OutputLines {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.rx.poll_recv(cx)
    }
}

fn spawn_reader<R>(pipe: R, tx: UnboundedSender<String>)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.is_empty() {
                continue;
            }
            // Receiver may be dropped - keep draining to EOF so the
            // child never blocks on a full pipe.
            let _ = tx.send(line);
        }
    });
}
