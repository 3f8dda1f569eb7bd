//! recorder.rs
//! Non-blocking sample log with background CSV export.
//!
//! `record()` pushes onto a bounded lock-free queue and returns immediately
//! (drops and counts when full). An exporter thread drains the queue into a
//! CSV file, batching flushes; `finish()` drains what is left and reports the
//! number of rows written.

use std::{
    fs::File,
    io::BufWriter,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_queue::ArrayQueue;
use csv::Writer;
use log::{debug, error};

use crate::{
    error::{EngineError, Result},
    sample::Sample,
};

const QUEUE_CAPACITY: usize = 4096;
const EXPORTER_POLL_MS: u64 = 5;
const FLUSH_BATCHES: usize = 8;

pub struct SampleRecorder {
    queue: Arc<ArrayQueue<Sample>>,
    dropped: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    exporter: Option<JoinHandle<Result<u64>>>,
}

impl SampleRecorder {
    /// Creates (truncates) `path` and starts the exporter.
    pub fn start(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| EngineError::Recorder(format!("{}: {}", path.display(), e)))?;
        let mut wtr = Writer::from_writer(BufWriter::new(file));

        let queue = Arc::new(ArrayQueue::new(QUEUE_CAPACITY));
        let running = Arc::new(AtomicBool::new(true));

        let exporter = {
            let queue = queue.clone();
            let running = running.clone();
            thread::Builder::new()
                .name("simtemp-recorder".into())
                .spawn(move || -> Result<u64> {
                    let mut rows = 0u64;
                    let mut batches = 0usize;
                    loop {
                        // Read before draining so pushes preceding the stop are seen.
                        let stopping = !running.load(Ordering::Acquire);
                        let mut any = false;
                        while let Some(sample) = queue.pop() {
                            any = true;
                            wtr.serialize(sample).map_err(recorder_error)?;
                            rows += 1;
                        }
                        if stopping {
                            break;
                        }
                        if any {
                            batches += 1;
                            if batches >= FLUSH_BATCHES {
                                wtr.flush().map_err(|e| EngineError::Recorder(e.to_string()))?;
                                batches = 0;
                            }
                        } else {
                            thread::sleep(Duration::from_millis(EXPORTER_POLL_MS));
                        }
                    }
                    wtr.flush().map_err(|e| EngineError::Recorder(e.to_string()))?;
                    debug!("[Recorder] exporter exiting. rows={}", rows);
                    Ok(rows)
                })?
        };

        Ok(Self {
            queue,
            dropped: Arc::new(AtomicU64::new(0)),
            running,
            exporter: Some(exporter),
        })
    }

    /// Queues a sample; false if the queue was full and it was dropped.
    pub fn record(&self, sample: Sample) -> bool {
        if self.queue.push(sample).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stops the exporter after a final drain; returns rows written.
    pub fn finish(mut self) -> Result<u64> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<u64> {
        self.running.store(false, Ordering::Release);
        match self.exporter.take() {
            Some(h) => h
                .join()
                .map_err(|_| EngineError::Recorder("exporter panicked".into()))?,
            None => Ok(0),
        }
    }
}

impl Drop for SampleRecorder {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("[Recorder] {}", e);
        }
    }
}

fn recorder_error(e: csv::Error) -> EngineError {
    EngineError::Recorder(e.to_string())
}
