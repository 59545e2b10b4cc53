use crate::session::commands::Keyword;
use crate::session::controller::{Reply, Session};
use log::info;
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs one command on a worker thread while the lines arriving meanwhile
/// are queued in delivery order. A `q` among them cancels a running
/// integration and stays in the queue.
///
/// `Err` carries the panic payload of the worker, the session is left as the
/// command found it up to that point.
pub fn dispatch(
    session: &mut Session,
    line: &str,
    rx: &Receiver<String>,
    queue: &mut VecDeque<String>,
) -> thread::Result<Vec<Reply>> {
    let cancel = session.cancel_token();
    cancel.store(false, Ordering::SeqCst);
    thread::scope(|s| {
        let worker = s.spawn(|| session.handle(line));
        while !worker.is_finished() {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(next) => {
                    if Keyword::lookup(&next) == Some(Keyword::Quit) {
                        info!("cancellation requested");
                        cancel.store(true, Ordering::SeqCst);
                    }
                    queue.push_back(next);
                }
                Err(RecvTimeoutError::Timeout) => {}
                // nothing can arrive any more
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        worker.join()
    })
}
