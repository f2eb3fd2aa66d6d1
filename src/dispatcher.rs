use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::Arc;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::time::{ Duration, Instant };

use log::{ debug, error, info, trace, warn };

use crate::error::RenderError;
use crate::chunk::{ FrameChunk, partition, resolve_chunk_size, border_width };
use crate::allocation::AllocationPolicy;
use crate::canvas::Framebuffer;
use crate::context::{ RaytraceContext, Snapshot };
use crate::parallel::{ WorkerPool, WorkerEvent };

/// Where a dispatcher is in its single render.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchState {
    /// Created, nothing started.
    Idle,
    /// The frame has been cut into chunks.
    Partitioned,
    /// Workers are running and chunks are still pending.
    Rendering,
    /// Every chunk has been handed out; waiting for the last results.
    Draining,
    Completed,
    /// Stopped on request; the image is only partly rendered.
    Aborted,
    /// A worker reported an error.
    Failed,
}

/// How a render ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed {
        /// Pixels rendered per millisecond.
        score: u64,
        elapsed: Duration,
    },
    Aborted,
}

impl RenderOutcome {
    /// The benchmark score, if the render ran to completion.
    pub fn score(&self) -> Option<u64> {
        match self {
            RenderOutcome::Completed { score, .. } => Some(*score),
            RenderOutcome::Aborted => None,
        }
    }
}

/// Computes the throughput score: pixels per millisecond, rounded.
///
/// Elapsed time is counted in whole milliseconds, with a floor of one.
pub fn score(pixel_count: u64, elapsed: Duration) -> u64 {
    let millis = elapsed.as_millis().max(1) as f64;
    (pixel_count as f64 / millis).round() as u64
}

/// The fixed layout of one render: chunk size, placeholder border and the
/// full set of chunks in raster order.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPlan {
    pub chunk_size: u32,
    pub border_width: u32,
    pub chunks: Vec<FrameChunk>,
}

impl RenderPlan {
    pub fn new(context: &RaytraceContext) -> RenderPlan {
        let chunk_size = resolve_chunk_size(
            context.options.chunk_size, context.height);

        RenderPlan {
            chunk_size,
            border_width: border_width(chunk_size),
            chunks: partition(context.width, context.height, chunk_size),
        }
    }
}

/// Requests that a running render stop.
///
/// Handles can be cloned and sent to other threads. Stopping a render that
/// has already finished does nothing.
#[derive(Clone)]
pub struct StopHandle {
    events: mpsc::Sender<WorkerEvent>,
    stop: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.events.send(WorkerEvent::Stop);
    }
}

/// Renders a frame by farming chunks out to a pool of worker threads.
///
/// All bookkeeping (the pending chunks, the count of retired workers and
/// the framebuffer) belongs to the thread calling `render`, which handles
/// worker results one at a time as they arrive.
pub struct Dispatcher {
    context: RaytraceContext,
    policy: Box<dyn AllocationPolicy>,
    state: DispatchState,

    events_tx: mpsc::Sender<WorkerEvent>,
    events_rx: mpsc::Receiver<WorkerEvent>,
    stop: Arc<AtomicBool>,
}

impl Dispatcher {
    /// Creates a dispatcher for one render.
    ///
    /// The context is checked here, so a bad request fails before any
    /// thread is started.
    pub fn new(context: RaytraceContext) -> Result<Dispatcher, RenderError> {
        context.validate()?;

        let policy = context.options.chunk_allocation_mode.policy();
        let (events_tx, events_rx) = mpsc::channel();

        Ok(Dispatcher {
            context,
            policy,
            state: DispatchState::Idle,
            events_tx,
            events_rx,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replaces the allocation policy chosen by the options.
    pub fn with_policy(mut self, policy: Box<dyn AllocationPolicy>)
        -> Dispatcher {
        self.policy = policy;
        self
    }

    pub fn context(&self) -> &RaytraceContext {
        &self.context
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            events: self.events_tx.clone(),
            stop: Arc::clone(&self.stop),
        }
    }

    fn set_state(&mut self, state: DispatchState) {
        debug!("dispatcher {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Renders the whole frame into `framebuffer`.
    ///
    /// Returns once every worker has retired, or as soon as the render is
    /// stopped or a worker fails. A dispatcher renders only once.
    pub fn render<F: Framebuffer>(&mut self, framebuffer: &mut F)
        -> Result<RenderOutcome, RenderError> {
        if self.state != DispatchState::Idle {
            return Err(RenderError::InvalidConfiguration(
                format!("dispatcher is {:?}, not idle", self.state)));
        }

        if framebuffer.width() != self.context.width
            || framebuffer.height() != self.context.height {
            return Err(RenderError::InvalidConfiguration(format!(
                "framebuffer is {}x{}, frame is {}x{}",
                framebuffer.width(), framebuffer.height(),
                self.context.width, self.context.height)));
        }

        let plan = RenderPlan::new(&self.context);
        if plan.chunks.is_empty() {
            return Err(RenderError::InvalidConfiguration(
                "frame partitions into no chunks".into()));
        }

        let mut pending: VecDeque<FrameChunk> = plan.chunks.iter()
            .copied()
            .collect();
        self.set_state(DispatchState::Partitioned);

        let num_threads = self.context.options.num_threads;
        info!("rendering {}x{} in {} chunks of {}px on {} threads ({})",
            self.context.width, self.context.height, plan.chunks.len(),
            plan.chunk_size, num_threads,
            self.context.options.chunk_allocation_mode);

        let snapshot = Snapshot::encode(&self.context)?;
        let start = Instant::now();

        let mut pool = WorkerPool::spawn(num_threads, &snapshot,
            &self.events_tx, Arc::clone(&self.stop))?;
        self.set_state(DispatchState::Rendering);

        let mut completed = 0;

        for worker in 0..pool.size() {
            if !self.feed(&mut pool, worker, &mut pending, framebuffer, &plan)? {
                pool.retire(worker);
                completed += 1;
            }
        }

        while completed < num_threads {
            if pending.is_empty() && self.state == DispatchState::Rendering {
                self.set_state(DispatchState::Draining);
            }

            let event = match self.events_rx.recv() {
                Ok(event) => event,
                // Unreachable while `self` holds a sender, but fail rather
                // than spin if it ever happens.
                Err(_) => return self.fail(&mut pool,
                    RenderError::WorkerDisconnected(usize::MAX)),
            };

            match event {
                WorkerEvent::ChunkRendered { worker, chunk, buffer } => {
                    if buffer.len() != chunk.buffer_len() {
                        return self.fail(&mut pool, RenderError::BufferSize {
                            expected: chunk.buffer_len(),
                            found: buffer.len(),
                        });
                    }

                    trace!("worker {} finished chunk {:?}", worker, chunk);
                    write_chunk(framebuffer, chunk, &buffer);
                    framebuffer.flush();

                    if !self.feed(&mut pool, worker, &mut pending, framebuffer,
                        &plan)? {
                        debug!("worker {} retired", worker);
                        pool.retire(worker);
                        completed += 1;
                    }
                },

                WorkerEvent::Failed { worker, error } => {
                    error!("worker {} failed: {}", worker, error);
                    return self.fail(&mut pool, error);
                },

                WorkerEvent::Stop => {
                    warn!("render stopped with {} chunks pending",
                        pending.len());
                    pool.terminate_all();
                    self.set_state(DispatchState::Aborted);
                    return Ok(RenderOutcome::Aborted);
                },
            }
        }

        let elapsed = start.elapsed();
        let score = score(self.context.pixel_count(), elapsed);
        self.set_state(DispatchState::Completed);
        info!("render completed in {}ms, score {}", elapsed.as_millis(), score);

        Ok(RenderOutcome::Completed { score, elapsed })
    }

    /// Gives an idle worker its next chunk, painting the chunk's placeholder
    /// first. Returns false if no chunks are left.
    fn feed<F: Framebuffer>(&mut self, pool: &mut WorkerPool, worker: usize,
        pending: &mut VecDeque<FrameChunk>, framebuffer: &mut F,
        plan: &RenderPlan) -> Result<bool, RenderError> {
        let chunk = match self.policy.take_next(pending) {
            Some(chunk) => chunk,
            None => return Ok(false),
        };

        paint_placeholder(framebuffer, chunk, plan.border_width,
            self.placeholder_colours());
        framebuffer.flush();

        trace!("assigning chunk {:?} to worker {}", chunk, worker);
        if let Err(error) = pool.assign(worker, chunk) {
            // A worker that cannot take work has usually already said why.
            let reason = self.reported_failure(worker).unwrap_or(error);
            return self.fail(pool, reason).map(|_| false);
        }

        Ok(true)
    }

    fn placeholder_colours(&self) -> ([u8; 3], [u8; 3]) {
        let options = &self.context.options;
        (
            options.chunk_border_colour.to_rgb8().unwrap_or_default(),
            options.chunk_unrendered_colour.to_rgb8().unwrap_or_default(),
        )
    }

    /// Looks through queued events for a failure report from `worker`.
    fn reported_failure(&self, worker: usize) -> Option<RenderError> {
        while let Ok(event) = self.events_rx.try_recv() {
            if let WorkerEvent::Failed { worker: w, error } = event {
                if w == worker {
                    return Some(error);
                }
            }
        }

        None
    }

    fn fail(&mut self, pool: &mut WorkerPool, error: RenderError)
        -> Result<RenderOutcome, RenderError> {
        pool.terminate_all();
        self.set_state(DispatchState::Failed);
        Err(error)
    }
}

/// Copies a rendered chunk's packed RGB buffer into the framebuffer.
pub fn write_chunk<F: Framebuffer>(framebuffer: &mut F, chunk: FrameChunk,
    buffer: &[u8]) {
    for ((x, y), rgb) in chunk.pixels().zip(buffer.chunks_exact(3)) {
        framebuffer.write_pixel(x, y, [rgb[0], rgb[1], rgb[2]]);
    }
}

/// Fills a chunk's rectangle with a bordered placeholder, so a pending chunk
/// is visible before its pixels arrive.
pub fn paint_placeholder<F: Framebuffer>(framebuffer: &mut F,
    chunk: FrameChunk, border: u32, (border_rgb, inner_rgb): ([u8; 3], [u8; 3])) {
    for (x, y) in chunk.pixels() {
        let dx = (x - chunk.x_start).min(chunk.x_end() - 1 - x);
        let dy = (y - chunk.y_start).min(chunk.y_end() - 1 - y);

        if dx < border || dy < border {
            framebuffer.write_pixel(x, y, border_rgb);
        } else {
            framebuffer.write_pixel(x, y, inner_rgb);
        }
    }
}

#[test]
fn score_is_pixels_per_millisecond() {
    assert_eq!(score(1920 * 1080, Duration::from_millis(1000)), 2074);
    assert_eq!(score(128 * 128, Duration::from_millis(3)), 5461);
    assert_eq!(score(100, Duration::from_millis(200)), 1);
    assert_eq!(score(100, Duration::from_millis(201)), 0);
}

#[test]
fn score_never_divides_by_zero() {
    assert_eq!(score(500, Duration::from_micros(10)), 500);
}

#[test]
fn outcome_score() {
    let done = RenderOutcome::Completed {
        score: 42,
        elapsed: Duration::from_millis(5),
    };

    assert_eq!(done.score(), Some(42));
    assert_eq!(RenderOutcome::Aborted.score(), None);
}

#[test]
fn placeholder_has_border_and_interior() {
    use crate::canvas::Canvas;

    let mut canvas = Canvas::new(8, 8);
    let chunk = FrameChunk::new(1, 1, 6, 6);
    paint_placeholder(&mut canvas, chunk, 2, ([9, 9, 9], [1, 1, 1]));

    assert_eq!(canvas.read_pixel(0, 0), Some([0, 0, 0]));
    assert_eq!(canvas.read_pixel(1, 1), Some([9, 9, 9]));
    assert_eq!(canvas.read_pixel(2, 4), Some([9, 9, 9]));
    assert_eq!(canvas.read_pixel(3, 3), Some([1, 1, 1]));
    assert_eq!(canvas.read_pixel(4, 4), Some([1, 1, 1]));
    assert_eq!(canvas.read_pixel(5, 4), Some([9, 9, 9]));
    assert_eq!(canvas.read_pixel(6, 6), Some([9, 9, 9]));
    assert_eq!(canvas.read_pixel(7, 7), Some([0, 0, 0]));
}

#[test]
fn chunk_buffer_lands_at_offset() {
    use crate::canvas::Canvas;

    let mut canvas = Canvas::new(4, 4);
    let chunk = FrameChunk::new(2, 1, 2, 2);
    let buffer: Vec<u8> = (0..12).collect();
    write_chunk(&mut canvas, chunk, &buffer);

    assert_eq!(canvas.read_pixel(2, 1), Some([0, 1, 2]));
    assert_eq!(canvas.read_pixel(3, 1), Some([3, 4, 5]));
    assert_eq!(canvas.read_pixel(2, 2), Some([6, 7, 8]));
    assert_eq!(canvas.read_pixel(3, 2), Some([9, 10, 11]));
    assert_eq!(canvas.read_pixel(1, 1), Some([0, 0, 0]));
}

#[test]
fn plan_uses_auto_chunk_size() {
    use crate::scene::Scene;

    let ctx = RaytraceContext::new(100, 60, 1.0, Scene::empty(),
        Default::default());
    let plan = RenderPlan::new(&ctx);

    assert_eq!(plan.chunk_size, 32);
    assert_eq!(plan.border_width, 2);
    assert_eq!(plan.chunks.len(), 8);
}
