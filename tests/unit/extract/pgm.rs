use super::*;
use crate::codec::memory::InMemoryDecoder;
use std::io::Write as _;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_extract").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn gradient(width: u32, height: u32) -> GrayFrame {
    let data = (0..width * height).map(|i| (i % 256) as u8).collect();
    GrayFrame::from_raw(width, height, data).unwrap()
}

#[test]
fn pgm_has_header_then_raw_samples() {
    let dir = scratch_dir("raw");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("one.pgm");
    let frame = gradient(6, 4);

    write_pgm(&path, &frame).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"P5"));
    assert!(bytes.ends_with(&frame.data));

    let img = image::open(&path).unwrap().to_luma8();
    assert_eq!(img.dimensions(), (6, 4));
    assert_eq!(img.into_raw(), frame.data);
}

#[test]
fn three_frames_make_three_numbered_files() {
    let dir = scratch_dir("three");
    let mut dec = InMemoryDecoder::new([gradient(8, 8), gradient(8, 8), gradient(8, 8)]);
    let mut ex = FrameExtractor::new(&dir, "frame");

    let report = extract_all(&mut dec, &mut ex, ExtractPolicy::Continue, None).unwrap();

    assert!(report.failed.is_empty());
    assert_eq!(
        report.written,
        vec![
            dir.join("frame-1.pgm"),
            dir.join("frame-2.pgm"),
            dir.join("frame-3.pgm")
        ]
    );
    for path in &report.written {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
    }
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 3);
}

#[test]
fn failed_frame_is_reported_and_extraction_continues() {
    let dir = scratch_dir("continue");
    let mut ex = FrameExtractor::new(&dir, "frame");
    // A directory in the way of frame 2 makes that write fail.
    std::fs::create_dir_all(ex.frame_path(2)).unwrap();

    let mut dec = InMemoryDecoder::new([gradient(4, 8), gradient(4, 8), gradient(4, 8)]);
    let report = extract_all(&mut dec, &mut ex, ExtractPolicy::Continue, None).unwrap();

    assert_eq!(report.written, vec![dir.join("frame-1.pgm"), dir.join("frame-3.pgm")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 2);
    assert!(matches!(report.failed[0].1, BitreelError::Destination(_)));
}

#[test]
fn abort_policy_stops_at_first_failure() {
    let dir = scratch_dir("abort");
    let mut ex = FrameExtractor::new(&dir, "frame");
    std::fs::create_dir_all(ex.frame_path(1)).unwrap();

    let mut dec = InMemoryDecoder::new([gradient(4, 8), gradient(4, 8)]);
    let err = extract_all(&mut dec, &mut ex, ExtractPolicy::Abort, None).unwrap_err();

    assert!(matches!(err, BitreelError::Destination(_)));
    assert!(!dir.join("frame-2.pgm").exists());
}

#[test]
fn decoder_error_is_fatal() {
    let dir = scratch_dir("decoder_error");
    let mut dec = InMemoryDecoder::new([gradient(4, 8)]);
    dec.push_error(BitreelError::codec("bad packet"));
    dec.push_frame(gradient(4, 8));
    let mut ex = FrameExtractor::new(&dir, "frame");

    let err = extract_all(&mut dec, &mut ex, ExtractPolicy::Continue, None).unwrap_err();
    assert!(matches!(err, BitreelError::Codec(_)));
    assert!(dir.join("frame-1.pgm").exists());
}

#[test]
fn max_frames_limits_extraction() {
    let dir = scratch_dir("limit");
    let mut dec = InMemoryDecoder::new([gradient(4, 8), gradient(4, 8), gradient(4, 8)]);
    let mut ex = FrameExtractor::new(&dir, "f");

    let report = extract_all(&mut dec, &mut ex, ExtractPolicy::Continue, Some(2)).unwrap();
    assert_eq!(report.written.len(), 2);
    assert_eq!(
        dec.next_decoded_frame().unwrap(),
        Decoded::Frame(gradient(4, 8))
    );
}

#[test]
fn mis_sized_frame_is_reported_and_extraction_continues() {
    let dir = scratch_dir("mis_sized");
    let mut dec = InMemoryDecoder::new([
        gradient(4, 8),
        GrayFrame {
            width: 4,
            height: 8,
            data: vec![0; 3],
        },
        gradient(4, 8),
    ]);
    let mut ex = FrameExtractor::new(&dir, "frame");

    let report = extract_all(&mut dec, &mut ex, ExtractPolicy::Continue, None).unwrap();

    assert_eq!(report.written, vec![dir.join("frame-1.pgm"), dir.join("frame-3.pgm")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 2);
    assert!(matches!(report.failed[0].1, BitreelError::Codec(_)));
    assert!(!dir.join("frame-2.pgm").exists());
}

#[test]
fn failed_write_leaves_no_partial_file() {
    let dir = scratch_dir("partial");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("frame-1.pgm");

    let err = write_file_with(&path, |w| {
        w.write_all(b"P5\n4 8\n255\n").map_err(|e| e.to_string())?;
        Err("disk full".to_string())
    })
    .unwrap_err();

    assert!(matches!(err, BitreelError::Destination(_)));
    assert!(!path.exists());
}
