use tempfile::tempdir;

use crate::env::{Catch, CatchConfig, Env, Frame, RenderMode};
use crate::error::DqnError;
use crate::recording::{FrameSink, PngSequenceWriter};

#[test]
fn test_png_sequence() {
    let dir = tempdir().unwrap();
    let mut writer = PngSequenceWriter::create(dir.path().join("videos")).unwrap();
    let mut env = Catch::new(CatchConfig { seed: Some(1), ..CatchConfig::default() }).unwrap();
    env.reset().unwrap();

    for _ in 0..3 {
        env.step(1).unwrap();
        writer.append(&env.render(RenderMode::RgbArray).unwrap()).unwrap();
    }
    writer.close().unwrap();

    assert_eq!(writer.frames_written(), 3);
    let first = dir.path().join("videos/frame_00000.png");
    assert!(first.exists());
    assert!(dir.path().join("videos/frame_00002.png").exists());

    let image = image::open(&first).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (96, 96));
}

#[test]
fn test_rejects_non_rgb_frames() {
    let dir = tempdir().unwrap();
    let mut writer = PngSequenceWriter::create(dir.path()).unwrap();
    let frame = Frame::zeros((4, 4, 1));
    assert!(matches!(writer.append(&frame), Err(DqnError::DimensionMismatch { .. })));
}

#[test]
fn test_append_after_close_fails() {
    let dir = tempdir().unwrap();
    let mut writer = PngSequenceWriter::create(dir.path()).unwrap();
    writer.close().unwrap();
    assert!(writer.append(&Frame::zeros((2, 2, 3))).is_err());
}
