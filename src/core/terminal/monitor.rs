use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::assembler::LineAssembler;
use crate::core::log::SharedLog;
use crate::infrastructure::serial::transport::is_device_lost;

const READ_BUFFER_SIZE: usize = 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Chunked byte reader driven by the monitor loop.
///
/// Reads may time out; a timeout is reported as `ErrorKind::TimedOut` and
/// treated as "no data yet".
pub trait ByteSource: Send {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Background task that pumps console bytes into the display log.
///
/// The task reassembles lines from whatever chunking the device produces
/// and stops on request or when the device goes away. It never closes the
/// underlying port; the owner does that after the task ends.
pub struct MonitorSession {
    running: Arc<RwLock<bool>>,
    handle: JoinHandle<()>,
}

impl MonitorSession {
    pub fn spawn<S>(source: Arc<Mutex<S>>, log: SharedLog) -> Self
    where
        S: ByteSource + 'static,
    {
        let running = Arc::new(RwLock::new(true));
        let flag = Arc::clone(&running);

        let handle = tokio::spawn(async move {
            let mut assembler = LineAssembler::new();
            let mut buffer = vec![0u8; READ_BUFFER_SIZE];
            let mut device_lost = false;

            loop {
                if !*flag.read().await {
                    break;
                }

                tokio::time::sleep(POLL_INTERVAL).await;

                let mut source = source.lock().await;
                match source.read_chunk(&mut buffer) {
                    Ok(0) => {
                        // No data available, continue
                        continue;
                    }
                    Ok(n) => {
                        debug!("Received {} console bytes", n);
                        for line in assembler.push(&buffer[..n]) {
                            log.status(line);
                        }
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                        // Timeout is expected, continue
                        continue;
                    }
                    Err(ref e) if is_device_lost(e) => {
                        device_lost = true;
                        break;
                    }
                    Err(e) => {
                        error!("Console read failed: {}", e);
                        log.error(format!("Console read failed: {}", e));
                        break;
                    }
                }
            }

            if let Some(line) = assembler.flush() {
                log.status(line);
            }
            if device_lost {
                log.notice("Device disconnected");
            }

            *flag.write().await = false;
        });

        Self { running, handle }
    }

    /// Whether the pump task is still running
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the task to stop and wait briefly for it to drain
    pub async fn stop(mut self) {
        *self.running.write().await = false;

        if tokio::time::timeout(STOP_GRACE, &mut self.handle)
            .await
            .is_err()
        {
            self.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedSource {
        chunks: VecDeque<Vec<u8>>,
        then: io::ErrorKind,
    }

    impl ScriptedSource {
        fn new(chunks: &[&[u8]], then: io::ErrorKind) -> Arc<Mutex<Self>> {
            Arc::new(Mutex::new(Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                then,
            }))
        }
    }

    impl ByteSource for ScriptedSource {
        fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(io::Error::new(self.then, "scripted")),
            }
        }
    }

    async fn wait_until_finished(session: &MonitorSession) {
        for _ in 0..200 {
            if !session.is_active() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("monitor session did not finish");
    }

    #[tokio::test]
    async fn test_lines_reach_log_across_chunks() {
        let source = ScriptedSource::new(
            &[b"\x1b[2Khello\n", b"wor", b"ld\x07\n"],
            io::ErrorKind::BrokenPipe,
        );
        let log = SharedLog::new(100);
        let session = MonitorSession::spawn(source, log.clone());

        wait_until_finished(&session).await;

        let texts: Vec<String> = log.snapshot().iter().map(|e| e.text.clone()).collect();
        assert_eq!(texts, vec!["hello", "world", "Device disconnected"]);
    }

    #[tokio::test]
    async fn test_device_lost_flushes_partial_line() {
        let source = ScriptedSource::new(&[b"partial"], io::ErrorKind::BrokenPipe);
        let log = SharedLog::new(100);
        let session = MonitorSession::spawn(source, log.clone());

        wait_until_finished(&session).await;

        let texts: Vec<String> = log.snapshot().iter().map(|e| e.text.clone()).collect();
        assert_eq!(texts, vec!["partial", "Device disconnected"]);
    }

    #[tokio::test]
    async fn test_stop_ends_task_without_error_entries() {
        let source = ScriptedSource::new(&[], io::ErrorKind::TimedOut);
        let log = SharedLog::new(100);
        let session = MonitorSession::spawn(source, log.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(session.is_active());

        session.stop().await;
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_generic_read_error_is_reported() {
        let source = ScriptedSource::new(&[b"ok\n"], io::ErrorKind::InvalidData);
        let log = SharedLog::new(100);
        let session = MonitorSession::spawn(source, log.clone());

        wait_until_finished(&session).await;

        let entries = log.snapshot();
        assert_eq!(entries[0].text, "ok");
        assert!(entries[1].text.contains("Console read failed"));
    }
}
