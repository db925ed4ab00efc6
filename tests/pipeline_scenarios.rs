//! End-to-end scenarios: image bytes through processing and layout into the interactive
//! scene, plus the image store lifecycle.

use std::io::Cursor;

use cgmath::{InnerSpace, Point3, Vector2, Vector3};
use image::{ImageFormat, Rgba, RgbaImage};

use voxelish::{
    application_state::{
        error::LoadError,
        examples::{fetch_example, ExampleCatalog, EXAMPLE_NAMES},
        image_store::{ImageFile, ImageStore},
    },
    engine_state::{
        physics::{BodyMode, PHYSICS_TIMESTEP},
        scene::{drag::DragOutcome, picking::Ray, VoxelScene},
        voxels::layout::{build_layout, BLOCK_SIZE},
    },
    image_pipeline::{loader, process, PixelBuffer, ProcessOptions},
};

fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn scene_from_png(bytes: &[u8]) -> VoxelScene {
    let source = loader::decode(bytes).unwrap();
    let processed = process(&source, &ProcessOptions::default()).unwrap();
    VoxelScene::new(&build_layout(&processed, BLOCK_SIZE))
}

fn settle(scene: &mut VoxelScene) {
    while !scene.is_entrance_complete() {
        scene.tick(PHYSICS_TIMESTEP);
    }
}

fn ray_down_at(x: f32, z: f32) -> Ray {
    Ray::new(Point3::new(x, 10.0, z), Vector3::new(0.0, -1.0, 0.0))
}

#[test]
fn red_square_becomes_centered_grid() {
    let source = loader::decode(&png_bytes(16, 16, [255, 0, 0, 255])).unwrap();
    let processed = process(&source, &ProcessOptions::default()).unwrap();
    let layout = build_layout(&processed, BLOCK_SIZE);

    assert_eq!(layout.len(), 256);
    let first_color = layout.blocks[0].color;
    assert!(layout.iter().all(|block| block.color == first_color));

    let xs: Vec<f32> = layout.iter().map(|block| block.position[0]).collect();
    let zs: Vec<f32> = layout.iter().map(|block| block.position[2]).collect();
    let min = |values: &[f32]| values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = |values: &[f32]| values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    assert_eq!(min(&xs), -8.0 * BLOCK_SIZE);
    assert_eq!(max(&xs), 7.0 * BLOCK_SIZE);
    assert_eq!(min(&zs), -8.0 * BLOCK_SIZE);
    assert_eq!(max(&zs), 7.0 * BLOCK_SIZE);

    // Row-major: the second block is one column over on the same row.
    assert_eq!((layout.blocks[1].column, layout.blocks[1].row), (1, 0));
}

#[test]
fn transparent_image_gives_empty_scene_that_still_runs() {
    let mut scene = scene_from_png(&png_bytes(8, 8, [10, 20, 30, 0]));
    assert!(scene.is_empty());

    for _ in 0..10 {
        scene.tick(PHYSICS_TIMESTEP);
    }
    let mut instances = Vec::new();
    scene.write_instances(&mut instances);
    assert!(instances.is_empty());
}

#[test]
fn white_background_is_dropped_from_layout() {
    let mut image = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
    image.put_pixel(1, 2, Rgba([0, 0, 255, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();

    let source = loader::decode(bytes.get_ref()).unwrap();
    let processed = process(&source, &ProcessOptions::default()).unwrap();
    let layout = build_layout(&processed, BLOCK_SIZE);

    // The 4x4 source is scaled up 4 times, so the one blue pixel becomes a 4x4 patch.
    assert_eq!(layout.len(), 16);
    assert_eq!((layout.blocks[0].column, layout.blocks[0].row), (4, 8));
    assert!(layout
        .iter()
        .all(|block| (4..8).contains(&block.column) && (8..12).contains(&block.row)));
}

#[test]
fn tiny_sprite_fills_the_whole_grid() {
    let layout = build_layout(
        &process(
            &loader::decode(&png_bytes(4, 4, [255, 0, 0, 255])).unwrap(),
            &ProcessOptions::default(),
        )
        .unwrap(),
        BLOCK_SIZE,
    );
    assert_eq!(layout.len(), 256);
}

#[test]
fn zero_pixel_drag_leaves_body_dynamic() {
    let mut scene = scene_from_png(&png_bytes(4, 4, [0, 128, 0, 255]));
    settle(&mut scene);

    let press = Vector2::new(300.0, 200.0);
    scene.pointer_down(press);
    let outcome = scene.pointer_move(press, &ray_down_at(0.0, 0.0));

    assert_eq!(outcome, DragOutcome::Ignored);
    assert_eq!(scene.active_drag(), None);
    assert!(scene
        .records()
        .iter()
        .all(|record| scene.physics().mode(record.body) == Some(BodyMode::Dynamic)));
}

#[test]
fn released_block_renders_where_its_body_is() {
    let mut scene = scene_from_png(&png_bytes(4, 4, [0, 0, 128, 255]));
    settle(&mut scene);

    // Block at column 8, row 8 sits at the origin.
    scene.pointer_down(Vector2::new(100.0, 100.0));
    let outcome = scene.pointer_move(Vector2::new(110.0, 100.0), &ray_down_at(0.0, 0.0));
    let DragOutcome::Started { instance, .. } = outcome else {
        panic!("expected the drag to start, got {outcome:?}");
    };

    scene.pointer_move(Vector2::new(200.0, 100.0), &ray_down_at(6.0, 6.0));
    scene.tick(PHYSICS_TIMESTEP);

    assert_eq!(scene.pointer_up(), DragOutcome::Released { instance });
    let body = scene.records()[instance].body;
    assert_eq!(scene.physics().mode(body), Some(BodyMode::Dynamic));

    scene.tick(PHYSICS_TIMESTEP);
    let render = scene.records()[instance].render;
    let physics = scene.physics().transform(body).unwrap();
    assert!((render.position - physics.position).magnitude() < 1e-4);
}

#[test]
fn store_cycles_examples_and_keeps_state_on_bad_files() {
    let mut store = ImageStore::new(
        ProcessOptions::default(),
        ExampleCatalog::new(vec!["a.png".into(), "b.png".into()]),
    );
    let mut fetched = Vec::new();
    let mut fetch_one = |store: &mut ImageStore| {
        store
            .load_next_example(|request| {
                fetched.push(request.name.clone());
                Ok(png_bytes(6, 6, [200, 0, 200, 255]))
            })
            .unwrap();
    };

    fetch_one(&mut store);
    fetch_one(&mut store);
    fetch_one(&mut store);
    assert_eq!(fetched, ["a.png", "b.png"]);
    assert_eq!(store.current().unwrap().name, "a.png");

    let revision = store.revision();
    let bad = store.load_from_file(Some(ImageFile::new("junk.png", vec![1, 2, 3])));
    assert!(matches!(bad, Err(LoadError::Pipeline(_))));
    assert_eq!(store.current().unwrap().name, "a.png");
    assert_eq!(store.revision(), revision);

    store.clear();
    assert!(store.current().is_none());
    assert!(store.caption().is_none());
}

#[test]
fn processed_output_is_a_fixed_point() {
    let source = PixelBuffer::filled(16, 16, [255, 85, 0, 255]).unwrap();
    let options = ProcessOptions::default();

    let once = process(&source, &options).unwrap();
    let twice = process(&once, &options).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn bundled_examples_all_produce_blocks() {
    let mut store = ImageStore::default();

    for name in EXAMPLE_NAMES {
        store.load_next_example(fetch_example).unwrap();
        let image = store.current().unwrap();
        assert_eq!(image.name, name);

        let layout = build_layout(&image.processed, BLOCK_SIZE);
        assert!(!layout.is_empty(), "{name} has no opaque pixels");
        assert!(layout.len() < 256, "{name} kept its background");
    }
}
