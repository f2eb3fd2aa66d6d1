use std::thread;
use std::sync::mpsc;
use std::sync::Arc;
use std::sync::atomic::{ AtomicBool, Ordering };

use log::{ debug, error };

use crate::error::RenderError;
use crate::chunk::FrameChunk;
use crate::context::Snapshot;
use crate::worker::render_chunk_until;

/// A message from the dispatcher to one worker.
pub enum Assignment {
    Render(FrameChunk),
    Terminate,
}

/// A message to the dispatcher.
///
/// Workers report finished chunks and failures; a `StopHandle` sends `Stop`
/// through the same channel, so the dispatcher sees every event in one
/// queue, one at a time.
pub enum WorkerEvent {
    ChunkRendered {
        worker: usize,
        chunk: FrameChunk,
        buffer: Vec<u8>,
    },
    Failed {
        worker: usize,
        error: RenderError,
    },
    Stop,
}

struct Worker {
    id: usize,
    sender: Option<mpsc::SyncSender<Assignment>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, snapshot: String, events: mpsc::Sender<WorkerEvent>,
        stop: Arc<AtomicBool>) -> Result<Worker, RenderError> {
        // A worker only ever holds one assignment at a time.
        let (sender, receiver) = mpsc::sync_channel(1);

        let thread = thread::Builder::new()
            .name(format!("render-worker-{}", id))
            .spawn(move || {
                // Rebuild a private copy of the scene and options.
                let context = match Snapshot::decode(&snapshot) {
                    Ok(context) => context,
                    Err(error) => {
                        let _ = events.send(WorkerEvent::Failed {
                            worker: id,
                            error,
                        });
                        return;
                    }
                };
                drop(snapshot);
                debug!("worker {} ready", id);

                while let Ok(Assignment::Render(chunk)) = receiver.recv() {
                    let event = match render_chunk_until(&context, chunk, &stop) {
                        Ok(Some(buffer)) => WorkerEvent::ChunkRendered {
                            worker: id,
                            chunk,
                            buffer,
                        },
                        // Stopped part-way through the chunk.
                        Ok(None) => break,
                        Err(error) => WorkerEvent::Failed { worker: id, error },
                    };

                    let failed = matches!(event, WorkerEvent::Failed { .. });
                    if events.send(event).is_err() || failed {
                        break;
                    }
                }

                debug!("worker {} exiting", id);
            })?;

        Ok(Worker { id, sender: Some(sender), thread: Some(thread) })
    }
}

/// A fixed set of render worker threads.
///
/// Each worker decodes the scene snapshot once, when it starts, then renders
/// whatever chunks it is assigned until it is retired. Workers share nothing
/// with each other; results go back over the event channel.
pub struct WorkerPool {
    workers: Vec<Worker>,
    stop: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn spawn(size: usize, snapshot: &str,
        events: &mpsc::Sender<WorkerEvent>, stop: Arc<AtomicBool>)
        -> Result<WorkerPool, RenderError> {
        if size == 0 {
            return Err(RenderError::InvalidConfiguration(
                "a worker pool needs at least one thread".into()));
        }

        let mut pool = WorkerPool {
            workers: Vec::with_capacity(size),
            stop,
        };

        // If a spawn fails part-way, dropping `pool` shuts down the workers
        // already started.
        for id in 0..size {
            pool.workers.push(Worker::new(
                id,
                snapshot.to_owned(),
                events.clone(),
                Arc::clone(&pool.stop),
            )?);
        }

        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Hands a chunk to an idle worker.
    pub fn assign(&self, worker: usize, chunk: FrameChunk)
        -> Result<(), RenderError> {
        let sender = self.workers.get(worker)
            .and_then(|w| w.sender.as_ref())
            .ok_or(RenderError::WorkerDisconnected(worker))?;

        sender.send(Assignment::Render(chunk))
            .map_err(|_| RenderError::WorkerDisconnected(worker))
    }

    /// Tells a worker there is no more work for it.
    pub fn retire(&mut self, worker: usize) {
        if let Some(w) = self.workers.get_mut(worker) {
            if let Some(sender) = w.sender.take() {
                let _ = sender.try_send(Assignment::Terminate);
            }
        }
    }

    /// Stops every worker, abandoning any chunks in progress.
    pub fn terminate_all(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        for worker in 0..self.workers.len() {
            self.retire(worker);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in 0..self.workers.len() {
            self.retire(worker);
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!("worker {} panicked", worker.id);
                }
            }
        }
    }
}

#[cfg(test)]
fn tiny_snapshot() -> String {
    use crate::context::RaytraceContext;
    use crate::scene::Scene;

    let ctx = RaytraceContext::new(8, 8, 1.0, Scene::showcase(),
        Default::default());
    Snapshot::encode(&ctx).unwrap()
}

#[test]
fn pool_renders_assigned_chunks() {
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let pool = WorkerPool::spawn(2, &tiny_snapshot(), &tx, stop).unwrap();

    pool.assign(0, FrameChunk::new(0, 0, 4, 4)).unwrap();
    pool.assign(1, FrameChunk::new(4, 4, 4, 4)).unwrap();

    let mut seen = Vec::new();
    for _ in 0..2 {
        match rx.recv().unwrap() {
            WorkerEvent::ChunkRendered { worker, chunk, buffer } => {
                assert_eq!(buffer.len(), 48);
                seen.push((worker, chunk.x_start));
            },
            _ => panic!("unexpected event"),
        }
    }

    seen.sort();
    assert_eq!(seen, vec![(0, 0), (1, 4)]);
}

#[test]
fn undecodable_snapshot_is_reported() {
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let _pool = WorkerPool::spawn(1, "not a snapshot", &tx, stop).unwrap();

    match rx.recv().unwrap() {
        WorkerEvent::Failed { worker, error } => {
            assert_eq!(worker, 0);
            assert!(matches!(error, RenderError::SnapshotDecode(_)));
        },
        _ => panic!("expected a failure"),
    }
}

#[test]
fn retired_worker_accepts_no_more_work() {
    let (tx, _rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let mut pool = WorkerPool::spawn(1, &tiny_snapshot(), &tx, stop).unwrap();

    pool.retire(0);
    assert!(matches!(pool.assign(0, FrameChunk::new(0, 0, 1, 1)),
        Err(RenderError::WorkerDisconnected(0))));
}

#[test]
fn empty_pool_is_rejected() {
    let (tx, _rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));

    assert!(WorkerPool::spawn(0, &tiny_snapshot(), &tx, stop).is_err());
}
