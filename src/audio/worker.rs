//! Background analysis thread.
//!
//! The caller moves its sample buffer into an [`AnalysisRequest`] and gets
//! exactly one reply per request. Only one request may be in flight.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use super::pipeline::{self, AnalysisResult, PipelineParams};
use crate::error::{AnalysisError, Result};

/// Inbound message: a mono buffer and its sample rate.
pub struct AnalysisRequest {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Outbound message: the finished analysis or the reason it failed.
pub type AnalysisReply = Result<AnalysisResult>;

/// Handle to one analysis thread.
///
/// Dropping the handle abandons the thread: it finishes whatever it is
/// working on, its reply is discarded and it exits.
pub struct AnalysisWorker {
    requests: Option<Sender<AnalysisRequest>>,
    replies: Receiver<AnalysisReply>,
    handle: Option<thread::JoinHandle<()>>,
    in_flight: bool,
}

impl AnalysisWorker {
    pub fn spawn(params: PipelineParams) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<AnalysisRequest>();
        let (reply_tx, reply_rx) = mpsc::channel::<AnalysisReply>();

        let handle = thread::Builder::new()
            .name("bandscope-analysis".to_string())
            .spawn(move || worker_loop(params, request_rx, reply_tx))?;

        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            handle: Some(handle),
            in_flight: false,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Hands a buffer to the thread. Fails with [`AnalysisError::Busy`] if the
    /// previous reply has not been collected yet.
    pub fn submit(&mut self, request: AnalysisRequest) -> Result<()> {
        if self.in_flight {
            return Err(AnalysisError::Busy);
        }
        let sender = self.requests.as_ref().ok_or(AnalysisError::Disconnected)?;
        sender
            .send(request)
            .map_err(|_| AnalysisError::Disconnected)?;
        self.in_flight = true;
        Ok(())
    }

    /// Blocks until the in-flight analysis finishes.
    pub fn recv(&mut self) -> AnalysisReply {
        if !self.in_flight {
            return Err(AnalysisError::invalid("no analysis has been submitted"));
        }
        let reply = self.replies.recv();
        self.in_flight = false;
        reply.map_err(|_| AnalysisError::Disconnected)?
    }

    /// Polls for the reply, waiting at most `timeout`. `None` means still running.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<AnalysisReply> {
        if !self.in_flight {
            return None;
        }
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => {
                self.in_flight = false;
                Some(reply)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.in_flight = false;
                Some(Err(AnalysisError::Disconnected))
            }
        }
    }

    /// Non-blocking variant of [`recv_timeout`](Self::recv_timeout).
    pub fn try_recv(&mut self) -> Option<AnalysisReply> {
        if !self.in_flight {
            return None;
        }
        match self.replies.try_recv() {
            Ok(reply) => {
                self.in_flight = false;
                Some(reply)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = false;
                Some(Err(AnalysisError::Disconnected))
            }
        }
    }

    /// Closes the request channel and waits for the thread to exit.
    pub fn shutdown(mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("analysis thread panicked");
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        // closing the channel lets the thread exit once idle; it is not joined
        self.requests.take();
    }
}

/// Submits one request and blocks for its reply on a fresh worker.
pub fn analyze_in_background(
    samples: Vec<f32>,
    sample_rate: u32,
    params: PipelineParams,
) -> Result<AnalysisResult> {
    let mut worker =
        AnalysisWorker::spawn(params).map_err(|e| AnalysisError::Spawn(e.to_string()))?;
    worker.submit(AnalysisRequest {
        samples,
        sample_rate,
    })?;
    let reply = worker.recv();
    worker.shutdown();
    reply
}

fn worker_loop(
    params: PipelineParams,
    requests: Receiver<AnalysisRequest>,
    replies: Sender<AnalysisReply>,
) {
    log::debug!("analysis thread started ({:?})", params);
    for request in requests {
        let reply = pipeline::analyze(&request.samples, request.sample_rate, &params);
        if let Err(ref e) = reply {
            log::warn!("analysis failed: {}", e);
        }
        drop(request);
        if replies.send(reply).is_err() {
            log::debug!("analysis handle dropped; discarding reply");
            break;
        }
    }
    log::debug!("analysis thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> PipelineParams {
        PipelineParams {
            frame_size: 256,
            num_bands: 8,
            ..PipelineParams::default()
        }
    }

    #[test]
    fn answers_one_request() {
        let mut worker = AnalysisWorker::spawn(small_params()).unwrap();
        worker
            .submit(AnalysisRequest {
                samples: vec![0.0; 2048],
                sample_rate: 8000,
            })
            .unwrap();
        assert!(worker.is_busy());
        let result = worker.recv().unwrap();
        assert!(!worker.is_busy());
        assert_eq!(result.num_bands(), 8);
        worker.shutdown();
    }

    #[test]
    fn rejects_second_submit_while_busy() {
        let mut worker = AnalysisWorker::spawn(small_params()).unwrap();
        worker
            .submit(AnalysisRequest {
                samples: vec![0.0; 2048],
                sample_rate: 8000,
            })
            .unwrap();
        let second = worker.submit(AnalysisRequest {
            samples: vec![0.0; 16],
            sample_rate: 8000,
        });
        assert_eq!(second, Err(AnalysisError::Busy));
        assert!(worker.recv().is_ok());

        // idle again, so the worker accepts the next buffer
        worker
            .submit(AnalysisRequest {
                samples: vec![0.0; 16],
                sample_rate: 8000,
            })
            .unwrap();
        assert!(worker.recv().is_ok());
    }

    #[test]
    fn parameter_errors_cross_the_channel() {
        let reply = analyze_in_background(vec![0.0; 1024], 0, small_params());
        assert!(matches!(reply, Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn polling_eventually_yields_the_reply() {
        let mut worker = AnalysisWorker::spawn(small_params()).unwrap();
        assert!(worker.try_recv().is_none());
        worker
            .submit(AnalysisRequest {
                samples: vec![0.5; 4096],
                sample_rate: 8000,
            })
            .unwrap();
        let reply = loop {
            if let Some(reply) = worker.recv_timeout(Duration::from_millis(10)) {
                break reply;
            }
        };
        assert!(reply.is_ok());
    }

    #[test]
    fn lost_thread_reports_disconnected_not_busy() {
        let (request_tx, request_rx) = mpsc::channel::<AnalysisRequest>();
        let (reply_tx, reply_rx) = mpsc::channel::<AnalysisReply>();
        // stands in for a thread that dies without answering
        let handle = thread::spawn(move || {
            let _request = request_rx.recv();
            drop(reply_tx);
        });
        let mut worker = AnalysisWorker {
            requests: Some(request_tx),
            replies: reply_rx,
            handle: Some(handle),
            in_flight: false,
        };
        worker
            .submit(AnalysisRequest {
                samples: vec![0.0; 16],
                sample_rate: 8000,
            })
            .unwrap();

        assert_eq!(worker.recv().unwrap_err(), AnalysisError::Disconnected);
        assert!(!worker.is_busy());
        let again = worker.submit(AnalysisRequest {
            samples: vec![0.0; 16],
            sample_rate: 8000,
        });
        assert_eq!(again, Err(AnalysisError::Disconnected));
    }

    #[test]
    fn recv_without_submit_is_an_error() {
        let mut worker = AnalysisWorker::spawn(small_params()).unwrap();
        assert!(worker.recv().is_err());
    }

    #[test]
    fn dropping_a_busy_worker_does_not_block() {
        let mut worker = AnalysisWorker::spawn(small_params()).unwrap();
        worker
            .submit(AnalysisRequest {
                samples: vec![0.0; 1 << 16],
                sample_rate: 8000,
            })
            .unwrap();
        drop(worker);
    }
}
