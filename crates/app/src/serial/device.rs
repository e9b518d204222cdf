use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{DeviceHandle, DeviceState, FrameSink, SerialQueue};
use crate::ports::{FrameSource, SerialLink, SerialPortOpener};

/// Owns one serial device for the lifetime of the process.
///
/// State machine: `Closed -> Opening -> Open -> Closed`, reopening after
/// `reopen_delay` on any error until `cancel` fires.
pub struct DeviceRuntime<O, S> {
    opener: Arc<O>,
    sink: Arc<S>,
    queue: Arc<SerialQueue>,
    device: DeviceHandle,
    notify: Arc<Notify>,
    reopen_delay: Duration,
    cancel: CancellationToken,
}

impl<O: SerialPortOpener, S: FrameSink> DeviceRuntime<O, S> {
    /// Register the device on `queue`. Nothing is opened until
    /// [`DeviceRuntime::spawn`].
    pub fn new(
        opener: O,
        sink: Arc<S>,
        queue: Arc<SerialQueue>,
        default: bool,
        reopen_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let device = DeviceHandle::new(opener.name());
        let notify = queue.register(device.clone(), default);
        Self {
            opener: Arc::new(opener),
            sink,
            queue,
            device,
            notify,
            reopen_delay,
            cancel,
        }
    }

    #[must_use]
    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            self.queue.set_state(&self.device, DeviceState::Opening);
            let opener = Arc::clone(&self.opener);
            match tokio::task::spawn_blocking(move || opener.open()).await {
                Ok(Ok((link, source))) => {
                    tracing::info!(device = %self.device, "serial device open");
                    self.queue.set_state(&self.device, DeviceState::Open);
                    self.serve(link, source).await;
                }
                Ok(Err(err)) => {
                    tracing::warn!(device = %self.device, error = %err, "unable to open serial device");
                }
                Err(err) => {
                    tracing::error!(device = %self.device, error = %err, "serial open task failed");
                }
            }
            self.queue.set_state(&self.device, DeviceState::Closed);

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.reopen_delay) => {
                    tracing::debug!(device = %self.device, "reopening serial device");
                }
            }
        }
        tracing::info!(device = %self.device, "serial device stopped");
    }

    /// Run reader and writer on an open device until an error or cancellation.
    async fn serve(&self, link: O::Link, source: O::Source) {
        let stop = Arc::new(AtomicBool::new(false));
        let (frames_tx, mut frames) = mpsc::channel(32);
        let reader = {
            let stop = Arc::clone(&stop);
            tokio::task::spawn_blocking(move || read_frames(source, &frames_tx, &stop))
        };
        let link = Arc::new(Mutex::new(link));

        loop {
            if !self.drain(&link).await {
                break;
            }
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                frame = frames.recv() => match frame {
                    Some(Ok(text)) => self.sink.ingest(&text),
                    Some(Err(err)) => {
                        tracing::warn!(device = %self.device, error = %err, "serial read failed");
                        break;
                    }
                    None => break,
                },
                () = self.notify.notified() => {}
            }
        }

        stop.store(true, Ordering::Relaxed);
        drop(frames);
        // the reader exits after its current read returns
        drop(reader);
    }

    /// Write every pending message. Returns `false` when the link failed.
    async fn drain(&self, link: &Arc<Mutex<O::Link>>) -> bool {
        while let Some(message) = self.queue.pop(&self.device) {
            let text = message.text.clone();
            let link = Arc::clone(link);
            let written = tokio::task::spawn_blocking(move || link.lock().write_line(&text))
                .await
                .unwrap_or_else(|err| Err(io::Error::other(err)));
            match written {
                Ok(()) => {
                    tracing::debug!(device = %self.device, id = ?message.id, text = %message.text, "serial message written");
                    message.complete(Ok(()));
                }
                Err(err) => {
                    tracing::warn!(device = %self.device, id = ?message.id, error = %err, "serial write failed");
                    message.complete(Err(err.into()));
                    return false;
                }
            }
        }
        true
    }
}

fn read_frames<F: FrameSource>(
    mut source: F,
    frames: &mpsc::Sender<io::Result<String>>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Relaxed) {
        match source.read_frame() {
            Ok(Some(frame)) => {
                if frames.blocking_send(Ok(frame)).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => {
                let _ = frames.blocking_send(Err(err));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use crate::serial::{DrainOrder, SerialError};

    #[derive(Default)]
    struct Wire {
        written: Mutex<Vec<String>>,
        frames: Mutex<VecDeque<String>>,
        fail_writes: AtomicBool,
        fail_opens: AtomicBool,
        opens: AtomicUsize,
    }

    struct FakeLink(Arc<Wire>);
    struct FakeSource(Arc<Wire>);

    impl SerialLink for FakeLink {
        fn write_line(&mut self, line: &str) -> io::Result<()> {
            if self.0.fail_writes.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
            }
            self.0.written.lock().push(line.to_string());
            Ok(())
        }
    }

    impl FrameSource for FakeSource {
        fn read_frame(&mut self) -> io::Result<Option<String>> {
            if let Some(frame) = self.0.frames.lock().pop_front() {
                return Ok(Some(frame));
            }
            std::thread::sleep(Duration::from_millis(5));
            Ok(None)
        }
    }

    struct FakeOpener(Arc<Wire>);

    impl SerialPortOpener for FakeOpener {
        type Link = FakeLink;
        type Source = FakeSource;

        fn name(&self) -> &str {
            "/dev/ttyFAKE"
        }

        fn open(&self) -> io::Result<(FakeLink, FakeSource)> {
            self.0.opens.fetch_add(1, Ordering::SeqCst);
            if self.0.fail_opens.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such device"));
            }
            Ok((FakeLink(Arc::clone(&self.0)), FakeSource(Arc::clone(&self.0))))
        }
    }

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<String>>);

    impl FrameSink for CollectingSink {
        fn ingest(&self, frame: &str) {
            self.0.lock().push(frame.to_string());
        }
    }

    fn runtime(
        wire: &Arc<Wire>,
    ) -> (
        Arc<SerialQueue>,
        Arc<CollectingSink>,
        CancellationToken,
        JoinHandle<()>,
    ) {
        let queue = Arc::new(SerialQueue::new(
            DrainOrder::Fifo,
            Duration::from_millis(500),
        ));
        let sink = Arc::new(CollectingSink::default());
        let cancel = CancellationToken::new();
        let handle = DeviceRuntime::new(
            FakeOpener(Arc::clone(wire)),
            Arc::clone(&sink),
            Arc::clone(&queue),
            true,
            Duration::from_millis(10),
            cancel.clone(),
        )
        .spawn();
        (queue, sink, cancel, handle)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn should_write_awaited_message() {
        let wire = Arc::new(Wire::default());
        let (queue, _, cancel, handle) = runtime(&wire);

        queue.await_text("powerOnBoard").await.unwrap();

        assert_eq!(wire.written.lock().clone(), vec!["powerOnBoard"]);
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn should_forward_frames_to_sink() {
        let wire = Arc::new(Wire::default());
        wire.frames.lock().push_back(r#"{"acc_power":true}"#.to_string());
        let (_, sink, cancel, handle) = runtime(&wire);

        for _ in 0..200 {
            if !sink.0.lock().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(sink.0.lock().clone(), vec![r#"{"acc_power":true}"#]);
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn should_fail_awaited_message_without_hanging_when_write_fails() {
        let wire = Arc::new(Wire::default());
        wire.fail_writes.store(true, Ordering::SeqCst);
        let (queue, _, cancel, handle) = runtime(&wire);

        let result = queue.await_text("powerOnBoard").await;

        assert!(matches!(result, Err(SerialError::Write(_))));
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn should_keep_reopening_until_cancelled() {
        let wire = Arc::new(Wire::default());
        wire.fail_opens.store(true, Ordering::SeqCst);
        let (queue, _, cancel, handle) = runtime(&wire);

        for _ in 0..200 {
            if wire.opens.load(Ordering::SeqCst) >= 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(wire.opens.load(Ordering::SeqCst) >= 3);

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(
            queue.state(&DeviceHandle::new("/dev/ttyFAKE")),
            Some(DeviceState::Closed)
        );
    }
}
