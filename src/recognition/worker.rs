use crate::recognition::client::RecognitionService;
use crate::recognition::entry::RecognitionEntry;
use crate::recognition::error::RecognitionError;
use crate::sketch::session::{ApplyOutcome, RecognitionRequest, RecognitionTicket, SketchSession};
use anyhow::{Context, Result};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionReply {
    pub ticket: RecognitionTicket,
    pub result: Result<Vec<RecognitionEntry>, RecognitionError>,
}

/// Runs blocking recognition round trips off the input thread.
///
/// Jobs are processed one at a time in submission order; replies are drained
/// with [`RecognitionWorker::pump`] and applied in completion order.
pub struct RecognitionWorker {
    job_tx: Option<Sender<RecognitionRequest>>,
    reply_rx: Receiver<RecognitionReply>,
    handle: Option<JoinHandle<()>>,
}

impl RecognitionWorker {
    pub fn spawn(service: Arc<dyn RecognitionService + Send + Sync>) -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<RecognitionRequest>();
        let (reply_tx, reply_rx) = mpsc::channel::<RecognitionReply>();
        let handle = std::thread::Builder::new()
            .name("recognition-worker".into())
            .spawn(move || run_worker(service, job_rx, reply_tx))
            .context("spawn recognition worker thread")?;
        Ok(Self {
            job_tx: Some(job_tx),
            reply_rx,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, request: RecognitionRequest) -> Result<(), RecognitionError> {
        let tx = self
            .job_tx
            .as_ref()
            .ok_or_else(|| RecognitionError::Service("recognition worker stopped".into()))?;
        tx.send(request)
            .map_err(|_| RecognitionError::Service("recognition worker stopped".into()))
    }

    pub fn try_recv(&self) -> Option<RecognitionReply> {
        match self.reply_rx.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<RecognitionReply> {
        match self.reply_rx.recv_timeout(timeout) {
            Ok(reply) => Some(reply),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Applies every finished reply to `session` without blocking.
    pub fn pump(&self, session: &mut SketchSession) -> Vec<ApplyOutcome> {
        let mut outcomes = Vec::new();
        while let Some(reply) = self.try_recv() {
            outcomes.push(session.complete_recognition(reply.ticket, reply.result));
        }
        outcomes
    }
}

impl Drop for RecognitionWorker {
    fn drop(&mut self) {
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("recognition worker panicked");
            }
        }
    }
}

fn run_worker(
    service: Arc<dyn RecognitionService + Send + Sync>,
    jobs: Receiver<RecognitionRequest>,
    replies: Sender<RecognitionReply>,
) {
    while let Ok(request) = jobs.recv() {
        let result = service.solve(&request.image, &request.bindings);
        if replies
            .send(RecognitionReply {
                ticket: request.ticket,
                result,
            })
            .is_err()
        {
            break;
        }
    }
    debug!("recognition worker exiting");
}
