//! End-to-end tests for the rendering pipeline.
//!
//! These run the full stack against the software backend (headless) or
//! the trace backend, from image loading through queue flush.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use sidescroll::video::backend::software::SoftwareBackend;
use sidescroll::video::backend::trace::{TraceBackend, TraceOp};
use sidescroll::video::backend::shared;
use sidescroll::video::request::{LAYER_BACKGROUND0, LAYER_HUD, LAYER_OBJECTS};
use sidescroll::video::{Blend, Color, LightSlot, Surface, Target};
use sidescroll::{VideoOptions, VideoSystem};

use sidescroll::math::{Sizef, Vector};

fn small_options(size: u32) -> VideoOptions {
    VideoOptions {
        use_opengl: false,
        screen_width: size,
        screen_height: size,
        window_width: size,
        window_height: size,
        ..VideoOptions::default()
    }
}

/// Write a 16x16 solid PNG into `dir` and return its path.
fn write_png(dir: &tempfile::TempDir, name: &str, rgba: [u8; 4]) -> PathBuf {
    let path = dir.path().join(name);
    let image = image::RgbaImage::from_pixel(16, 16, image::Rgba(rgba));
    image.save(&path).expect("failed to write test image");
    path
}

/// Software system whose presented frames are captured into a buffer.
fn capturing_system(size: u32) -> (VideoSystem, Arc<Mutex<Vec<u8>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    let mut backend = SoftwareBackend::new(&small_options(size));
    backend.set_present_hook(Box::new(move |pixels, _w, _h| {
        *sink.lock().unwrap() = pixels.to_vec();
    }));
    let system = VideoSystem::with_backend(shared(backend)).unwrap();
    (system, captured)
}

fn pixel_at(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let offset = ((y * width + x) * 4) as usize;
    [
        frame[offset],
        frame[offset + 1],
        frame[offset + 2],
        frame[offset + 3],
    ]
}

#[test]
fn loaded_image_draws_to_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(&dir, "red.png", [255, 0, 0, 255]);

    let (mut system, captured) = capturing_system(64);
    let surface = Surface::from_file(system.textures(), &path).unwrap();
    assert_eq!(surface.get_width(), 16.0);

    system
        .context()
        .draw_surface(&surface, Vector::new(8.0, 8.0), LAYER_OBJECTS);
    system.context().do_drawing();

    let frame = captured.lock().unwrap();
    assert_eq!(pixel_at(&frame, 64, 10, 10), [255, 0, 0, 255]);
    assert_eq!(pixel_at(&frame, 64, 0, 0), [0, 0, 0, 0]);
}

#[test]
fn layers_flatten_in_order_regardless_of_submission() {
    let (mut system, captured) = capturing_system(32);
    let context = system.context();

    // Submitted front-to-back; must still flatten back-to-front.
    context.draw_filled_rect(
        Vector::ZERO,
        Sizef::new(32.0, 32.0),
        Color::rgb(1.0, 0.0, 0.0),
        LAYER_HUD,
    );
    context.draw_filled_rect(
        Vector::ZERO,
        Sizef::new(32.0, 32.0),
        Color::rgb(0.0, 0.0, 1.0),
        LAYER_BACKGROUND0,
    );
    context.do_drawing();

    let frame = captured.lock().unwrap();
    assert_eq!(pixel_at(&frame, 32, 16, 16), [255, 0, 0, 255]);
}

#[test]
fn light_accumulation_is_order_independent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(&dir, "light.png", [255, 255, 255, 255]);

    let run = |first_at: Vector, second_at: Vector| -> Color {
        let (mut system, _captured) = capturing_system(64);
        let surface = Surface::from_file(system.textures(), &path).unwrap();
        let context = system.context();
        context.set_ambient_color(Color::rgb(0.2, 0.2, 0.2));

        context.push_target();
        context.set_target(Target::Lightmap);
        let glow = Color::new(0.3, 0.3, 0.3, 1.0);
        context.draw_surface_ext(&surface, first_at, LAYER_OBJECTS, 0.0, glow, Blend::additive());
        context.draw_surface_ext(&surface, second_at, LAYER_OBJECTS, 0.0, glow, Blend::additive());
        context.pop_target();

        let slot = LightSlot::new();
        context.get_light(Vector::new(8.0, 8.0), &slot);
        context.do_drawing();
        slot.get()
    };

    let a = Vector::new(0.0, 0.0);
    let b = Vector::new(4.0, 4.0);
    let forward = run(a, b);
    let reversed = run(b, a);

    assert_eq!(forward, reversed);
    // Ambient 0.2 plus two additive 0.3 glows.
    assert!((forward.red - 0.8).abs() < 0.02, "got {}", forward.red);
}

#[test]
fn white_ambient_answers_light_queries_immediately() {
    let (mut system, _captured) = capturing_system(64);
    let slot = LightSlot::new();
    system.context().get_light(Vector::new(5.0, 5.0), &slot);
    system.context().do_drawing();
    assert_eq!(slot.get(), Color::WHITE);
}

#[test]
fn cached_surfaces_share_and_release_textures() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(&dir, "tile.png", [0, 255, 0, 255]);

    let (system, _captured) = capturing_system(64);
    {
        let first = Surface::from_file(system.textures(), &path).unwrap();
        let second = Surface::from_file(system.textures(), &path).unwrap();
        assert!(first.shares_texture(&second));
        assert_eq!(system.textures().cached_count(), 1);
    }
    // Both users gone: the cache entry dies with them.
    assert_eq!(system.textures().cached_count(), 0);
}

#[test]
fn mode_change_preserves_texture_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(&dir, "sprite.png", [10, 200, 30, 255]);

    let (mut system, captured) = capturing_system(64);
    let surface = Surface::from_file(system.textures(), &path).unwrap();

    system.apply_mode_change(&small_options(64)).unwrap();

    // The surface draws with its original pixels after reload.
    system
        .context()
        .draw_surface(&surface, Vector::ZERO, LAYER_OBJECTS);
    system.context().do_drawing();

    let frame = captured.lock().unwrap();
    assert_eq!(pixel_at(&frame, 64, 4, 4), [10, 200, 30, 255]);
}

#[test]
fn flush_frees_surfaces_dropped_by_the_caller() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(&dir, "once.png", [255, 0, 0, 255]);

    let (mut system, captured) = capturing_system(64);
    let surface = Surface::from_file(system.textures(), &path).unwrap();
    system
        .context()
        .draw_surface(&surface, Vector::new(8.0, 8.0), LAYER_OBJECTS);
    // The queue holds the last reference; the flush must still complete
    // and release the texture afterwards.
    drop(surface);
    system.context().do_drawing();

    let frame = captured.lock().unwrap();
    assert_eq!(pixel_at(&frame, 64, 10, 10), [255, 0, 0, 255]);
    assert_eq!(system.textures().cached_count(), 0);
}

#[test]
fn sixteen_bit_images_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep.png");
    let image: image::ImageBuffer<image::Rgba<u16>, Vec<u16>> =
        image::ImageBuffer::from_pixel(8, 8, image::Rgba([65535, 0, 0, 65535]));
    image.save(&path).unwrap();

    let (system, _captured) = capturing_system(64);
    let result = Surface::from_file(system.textures(), &path);
    assert!(matches!(
        result,
        Err(sidescroll::VideoError::UnsupportedDepth { depth: 64, .. })
    ));
}

#[test]
fn text_draws_through_the_queue() {
    let dir = tempfile::tempdir().unwrap();
    // Solid white glyph sheet: 16 glyphs of 8x12 per row.
    let path = dir.path().join("font.png");
    image::RgbaImage::from_pixel(128, 96, image::Rgba([255, 255, 255, 255]))
        .save(&path)
        .unwrap();

    let (mut system, captured) = capturing_system(64);
    let font = sidescroll::video::Font::new(system.textures(), &path, 8, 12, b' ').unwrap();
    assert_eq!(font.get_text_width("hi"), 16.0);

    system.context().draw_text(
        &font,
        "hi",
        Vector::new(0.0, 0.0),
        sidescroll::video::FontAlignment::Left,
        LAYER_HUD,
    );
    system.context().do_drawing();

    let frame = captured.lock().unwrap();
    assert_eq!(pixel_at(&frame, 64, 4, 4), [255, 255, 255, 255]);
    // Below the glyph row nothing was drawn.
    assert_eq!(pixel_at(&frame, 64, 4, 20), [0, 0, 0, 0]);
}

#[test]
fn flush_order_on_trace_backend() {
    let trace = TraceBackend::new(800, 600);
    let log = trace.log();
    let mut system = VideoSystem::with_backend(shared(trace)).unwrap();
    let context = system.context();

    context.set_ambient_color(Color::rgb(0.4, 0.4, 0.4));
    context.draw_filled_rect(
        Vector::ZERO,
        Sizef::new(10.0, 10.0),
        Color::rgb(1.0, 1.0, 1.0),
        LAYER_HUD,
    );
    context.do_drawing();

    let ops = log.lock();
    let position = |pred: fn(&TraceOp) -> bool| ops.iter().position(pred).unwrap();
    let begin = position(|op| matches!(op, TraceOp::BeginLightmap { .. }));
    let finish = position(|op| matches!(op, TraceOp::FinishLightmap { .. }));
    let composite = position(|op| matches!(op, TraceOp::CompositeLightmap { .. }));
    let hud = position(|op| matches!(op, TraceOp::FillRect { .. }));
    let present = position(|op| matches!(op, TraceOp::Present));

    assert!(begin < finish);
    assert!(finish < composite);
    assert!(composite < hud);
    assert!(hud < present);
}
