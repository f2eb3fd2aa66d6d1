use std::sync::atomic::{ AtomicBool, Ordering };

use crate::error::RenderError;
use crate::chunk::FrameChunk;
use crate::camera::Camera;
use crate::context::RaytraceContext;
use crate::tracer::Tracer;

/// Renders one chunk of the frame.
///
/// Returns the chunk's pixels packed as RGB bytes, row-major within the
/// chunk, each channel clamped to `[0, 255]`. The result depends only on the
/// context and the chunk.
pub fn render_chunk(context: &RaytraceContext, chunk: FrameChunk)
    -> Result<Vec<u8>, RenderError> {
    let never = AtomicBool::new(false);
    render_chunk_until(context, chunk, &never)
        .map(|buffer| buffer.unwrap_or_default())
}

/// Renders one chunk, giving up between rows once `stop` is raised.
///
/// Returns `Ok(None)` if the render was stopped before the chunk finished.
pub fn render_chunk_until(context: &RaytraceContext, chunk: FrameChunk,
    stop: &AtomicBool) -> Result<Option<Vec<u8>>, RenderError> {
    let camera = Camera::new(context.width, context.height, context.fov);
    let tracer = Tracer::new(&context.scene, &context.options);
    let mut buffer = Vec::with_capacity(chunk.buffer_len());

    for y in chunk.y_start..chunk.y_end() {
        if stop.load(Ordering::Relaxed) {
            return Ok(None);
        }

        for x in chunk.x_start..chunk.x_end() {
            let ray = camera.ray_for_pixel(x, y);
            let color = tracer.trace(&ray, 0);
            let rgb = color.to_rgb8()
                .ok_or(RenderError::NonFinitePixel { x, y })?;

            buffer.extend_from_slice(&rgb);
        }
    }

    Ok(Some(buffer))
}

#[cfg(test)]
fn small_context() -> RaytraceContext {
    use crate::scene::Scene;

    RaytraceContext::new(32, 24, std::f64::consts::PI / 3.0,
        Scene::showcase(), Default::default())
}

#[test]
fn buffer_is_three_bytes_per_pixel() {
    let ctx = small_context();
    let chunk = FrameChunk::new(8, 4, 10, 7);

    let buffer = render_chunk(&ctx, chunk).unwrap();
    assert_eq!(buffer.len(), chunk.buffer_len());
}

#[test]
fn chunk_pixels_match_full_frame_render() {
    let ctx = small_context();
    let full = FrameChunk::new(0, 0, ctx.width, ctx.height);
    let part = FrameChunk::new(5, 3, 6, 4);

    let whole = render_chunk(&ctx, full).unwrap();
    let piece = render_chunk(&ctx, part).unwrap();

    for (i, (x, y)) in part.pixels().enumerate() {
        let j = (y * ctx.width + x) as usize * 3;
        assert_eq!(&piece[i * 3..i * 3 + 3], &whole[j..j + 3],
            "pixel ({}, {})", x, y);
    }
}

#[test]
fn empty_scene_renders_background() {
    use crate::scene::Scene;
    use crate::color::Color;

    let mut scene = Scene::empty();
    scene.background_colour = Color::rgb(10.0, 20.0, 300.0);
    let ctx = RaytraceContext::new(4, 4, 1.0, scene, Default::default());

    let buffer = render_chunk(&ctx, FrameChunk::new(0, 0, 2, 2)).unwrap();
    assert_eq!(buffer, vec![10, 20, 255, 10, 20, 255, 10, 20, 255, 10, 20, 255]);
}

#[test]
fn non_finite_color_is_an_error() {
    use crate::scene::Scene;
    use crate::color::Color;

    let mut scene = Scene::empty();
    scene.background_colour = Color::rgb(f64::NAN, 0.0, 0.0);
    let ctx = RaytraceContext::new(4, 4, 1.0, scene, Default::default());

    let result = render_chunk(&ctx, FrameChunk::new(2, 1, 2, 2));
    assert!(matches!(result,
        Err(RenderError::NonFinitePixel { x: 2, y: 1 })));
}

#[test]
fn raised_stop_flag_abandons_chunk() {
    let ctx = small_context();
    let stop = AtomicBool::new(true);

    let result = render_chunk_until(&ctx, FrameChunk::new(0, 0, 4, 4), &stop);
    assert_eq!(result.unwrap(), None);
}
