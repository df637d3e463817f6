//! Screenshot naming never clobbers files already on disk.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use softras::scene::{InputEvent, NullSink, ScriptedInput};
use softras::{Mat4, Model, PixelBuffer, Scene, ScreenshotWriter};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("softras_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn three_screenshots_get_three_fresh_names() {
    let dir = scratch_dir("shots");
    let existing = dir.join("screenshot_1.png");
    fs::write(&existing, b"keep me").unwrap();

    let mut writer = ScreenshotWriter::new(&dir);
    let image = PixelBuffer::new(4, 4, [0.5; 3]).to_rgb8();
    let paths: Vec<PathBuf> = (0..3).map(|_| writer.save(&image).unwrap()).collect();

    let unique: HashSet<&PathBuf> = paths.iter().collect();
    assert_eq!(unique.len(), 3);
    assert!(!paths.contains(&existing));
    assert_eq!(fs::read(&existing).unwrap(), b"keep me");
    for path in &paths {
        assert!(path.exists());
    }

    // A second writer on the same directory keeps going past everything written so far.
    let mut again = ScreenshotWriter::new(&dir);
    let next = again.save(&image).unwrap();
    assert!(!paths.contains(&next) && next != existing);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn screenshot_event_writes_current_frame() {
    let dir = scratch_dir("scene_shots");
    let projection = Mat4::perspective(45f32.to_radians(), 1.0, 0.1, 100.0);
    let mut scene = Scene::new(32, 32, projection, 1).unwrap().with_screenshot_dir(&dir);
    scene.add_model(Model::cube());

    let mut input = ScriptedInput::new(vec![(1, InputEvent::Screenshot), (2, InputEvent::Screenshot)]);
    scene.run(&mut input, &mut NullSink::default(), Some(3)).unwrap();

    assert!(dir.join("screenshot_0.png").exists());
    assert!(dir.join("screenshot_1.png").exists());
    assert!(!dir.join("screenshot_2.png").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn failed_encode_leaves_no_file() {
    let dir = scratch_dir("bad_shot");
    let mut writer = ScreenshotWriter::new(&dir);

    // PNG cannot encode a zero-sized image.
    assert!(writer.save(&image::RgbImage::new(0, 0)).is_err());
    assert!(!dir.join("screenshot_0.png").exists());
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

    fs::remove_dir_all(&dir).unwrap();
}
