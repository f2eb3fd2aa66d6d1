use chunk_tracer::allocation::{ ChunkAllocationMode, Random };
use chunk_tracer::canvas::{ Canvas, Framebuffer };
use chunk_tracer::color::Color;
use chunk_tracer::context::{ RaytraceContext, RaytracerOptions };
use chunk_tracer::dispatcher::{ Dispatcher, DispatchState, RenderOutcome,
    RenderPlan };
use chunk_tracer::error::RenderError;
use chunk_tracer::scene::Scene;
use chunk_tracer::worker::render_chunk;
use chunk_tracer::chunk::FrameChunk;

use std::thread;
use std::time::{ Duration, Instant };

fn context(threads: usize, mode: ChunkAllocationMode) -> RaytraceContext {
    let options = RaytracerOptions {
        num_threads: threads,
        chunk_size: 16,
        chunk_allocation_mode: mode,
        ..Default::default()
    };

    RaytraceContext::new(64, 48, std::f64::consts::PI / 3.0,
        Scene::showcase(), options)
}

fn render(ctx: RaytraceContext) -> (Canvas, RenderOutcome) {
    let mut canvas = Canvas::new(ctx.width, ctx.height);
    let mut dispatcher = Dispatcher::new(ctx).unwrap();
    let outcome = dispatcher.render(&mut canvas).unwrap();

    assert_eq!(dispatcher.state(), DispatchState::Completed);
    (canvas, outcome)
}

#[test_log::test]
fn single_thread_matches_whole_frame_render() {
    let ctx = context(1, ChunkAllocationMode::Sequential);
    let whole = render_chunk(&ctx,
        FrameChunk::new(0, 0, ctx.width, ctx.height)).unwrap();

    let (canvas, outcome) = render(ctx);
    assert_eq!(canvas.as_bytes(), &whole[..]);
    assert!(outcome.score().is_some());
}

#[test_log::test]
fn repeated_renders_are_identical() {
    let (first, _) = render(context(1, ChunkAllocationMode::Sequential));
    let (second, _) = render(context(1, ChunkAllocationMode::Sequential));

    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test_log::test]
fn image_does_not_depend_on_policy_or_threads() {
    let (reference, _) = render(context(1, ChunkAllocationMode::Sequential));

    for &mode in ChunkAllocationMode::ALL.iter() {
        for &threads in [1, 3, 4].iter() {
            let (canvas, _) = render(context(threads, mode));
            assert_eq!(canvas.as_bytes(), reference.as_bytes(),
                "{} on {} threads", mode, threads);
        }
    }
}

#[test_log::test]
fn every_chunk_is_flushed_twice() {
    let ctx = context(2, ChunkAllocationMode::EdgeToCenter);
    let chunks = RenderPlan::new(&ctx).chunks.len();
    assert_eq!(chunks, 12);

    let (canvas, _) = render(ctx);
    assert_eq!(canvas.flush_count(), chunks * 2);
}

#[test_log::test]
fn more_threads_than_chunks() {
    let mut ctx = context(8, ChunkAllocationMode::CenterToEdge);
    ctx.width = 16;
    ctx.height = 16;

    let (canvas, outcome) = render(ctx);
    assert!(outcome.score().is_some());
    assert_eq!(canvas.flush_count(), 2);
}

#[test_log::test]
fn injected_policy_is_used() {
    let (reference, _) = render(context(1, ChunkAllocationMode::Sequential));

    let ctx = context(2, ChunkAllocationMode::Sequential);
    let mut canvas = Canvas::new(ctx.width, ctx.height);
    let mut dispatcher = Dispatcher::new(ctx).unwrap()
        .with_policy(Box::new(Random::seeded(7)));

    let outcome = dispatcher.render(&mut canvas).unwrap();
    assert!(outcome.score().is_some());
    assert_eq!(canvas.as_bytes(), reference.as_bytes());
}

#[test_log::test]
fn stop_before_render_aborts() {
    let ctx = context(2, ChunkAllocationMode::Sequential);
    let mut canvas = Canvas::new(ctx.width, ctx.height);
    let mut dispatcher = Dispatcher::new(ctx).unwrap();

    dispatcher.stop_handle().stop();
    let outcome = dispatcher.render(&mut canvas).unwrap();

    assert_eq!(outcome, RenderOutcome::Aborted);
    assert_eq!(outcome.score(), None);
    assert_eq!(dispatcher.state(), DispatchState::Aborted);
}

#[test_log::test]
fn stop_during_render_aborts_promptly() {
    let options = RaytracerOptions {
        num_threads: 4,
        ..Default::default()
    };
    let ctx = RaytraceContext::new(1920, 1080, std::f64::consts::PI / 3.0,
        Scene::benchmark(), options);
    let chunks = RenderPlan::new(&ctx).chunks.len();

    let mut canvas = Canvas::new(ctx.width, ctx.height);
    let mut dispatcher = Dispatcher::new(ctx).unwrap();

    let handle = dispatcher.stop_handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        handle.stop();
    });

    let start = Instant::now();
    let outcome = dispatcher.render(&mut canvas).unwrap();
    let elapsed = start.elapsed();
    stopper.join().unwrap();

    assert_eq!(outcome, RenderOutcome::Aborted);
    assert_eq!(outcome.score(), None);
    assert_eq!(dispatcher.state(), DispatchState::Aborted);

    // Workers give up mid-chunk, so most of the frame is never written.
    assert!(canvas.flush_count() < chunks * 2);
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}

#[test_log::test]
fn stop_after_completion_is_harmless() {
    let ctx = context(1, ChunkAllocationMode::Sequential);
    let mut canvas = Canvas::new(ctx.width, ctx.height);
    let mut dispatcher = Dispatcher::new(ctx).unwrap();
    let handle = dispatcher.stop_handle();

    assert!(dispatcher.render(&mut canvas).unwrap().score().is_some());
    handle.stop();
    assert_eq!(dispatcher.state(), DispatchState::Completed);
}

#[test_log::test]
fn dispatcher_renders_only_once() {
    let ctx = context(1, ChunkAllocationMode::Sequential);
    let mut canvas = Canvas::new(ctx.width, ctx.height);
    let mut dispatcher = Dispatcher::new(ctx).unwrap();

    dispatcher.render(&mut canvas).unwrap();
    assert!(matches!(dispatcher.render(&mut canvas),
        Err(RenderError::InvalidConfiguration(_))));
}

#[test_log::test]
fn zero_threads_rejected_up_front() {
    let ctx = context(0, ChunkAllocationMode::Sequential);
    assert!(matches!(Dispatcher::new(ctx),
        Err(RenderError::InvalidConfiguration(_))));
}

#[test_log::test]
fn mismatched_framebuffer_rejected() {
    let ctx = context(1, ChunkAllocationMode::Sequential);
    let mut canvas = Canvas::new(10, 10);
    let mut dispatcher = Dispatcher::new(ctx).unwrap();

    assert!(dispatcher.render(&mut canvas).is_err());
    assert_eq!(dispatcher.state(), DispatchState::Idle);
}

#[test_log::test]
fn non_finite_pixel_fails_render() {
    // Lit surfaces overflow to infinity.
    let mut ctx = context(2, ChunkAllocationMode::Random);
    for light in ctx.scene.lights.iter_mut() {
        light.intensity = f64::MAX;
    }

    let mut canvas = Canvas::new(ctx.width, ctx.height);
    let mut dispatcher = Dispatcher::new(ctx).unwrap();

    assert!(matches!(dispatcher.render(&mut canvas),
        Err(RenderError::NonFinitePixel { .. })));
    assert_eq!(dispatcher.state(), DispatchState::Failed);
}

#[test_log::test]
fn placeholders_use_configured_colours() {
    // A framebuffer that remembers the first colour written to each pixel.
    struct FirstWrite {
        inner: Canvas,
        written: Vec<bool>,
    }

    impl Framebuffer for FirstWrite {
        fn width(&self) -> u32 { self.inner.width }
        fn height(&self) -> u32 { self.inner.height }

        fn write_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
            let i = (y * self.inner.width + x) as usize;
            if !self.written[i] {
                self.written[i] = true;
                self.inner.write_pixel(x, y, rgb);
            }
        }

        fn flush(&mut self) {}
    }

    let mut ctx = context(1, ChunkAllocationMode::Sequential);
    ctx.options.chunk_border_colour = Color::rgb(1.0, 2.0, 3.0);
    ctx.options.chunk_unrendered_colour = Color::rgb(4.0, 5.0, 6.0);

    let mut fb = FirstWrite {
        inner: Canvas::new(ctx.width, ctx.height),
        written: vec![false; (ctx.width * ctx.height) as usize],
    };
    Dispatcher::new(ctx).unwrap().render(&mut fb).unwrap();

    // 16px chunks get a 1px border.
    assert_eq!(fb.inner.read_pixel(0, 0), Some([1, 2, 3]));
    assert_eq!(fb.inner.read_pixel(15, 15), Some([1, 2, 3]));
    assert_eq!(fb.inner.read_pixel(16, 0), Some([1, 2, 3]));
    assert_eq!(fb.inner.read_pixel(1, 1), Some([4, 5, 6]));
    assert_eq!(fb.inner.read_pixel(20, 20), Some([4, 5, 6]));
}
