use super::*;

#[test]
fn default_opts_use_x264_at_one_megabit() {
    let opts = FfmpegEncodeOpts::default();
    assert_eq!(opts.codec, "libx264");
    assert_eq!(opts.bit_rate, 1_000_000);
    assert_eq!(opts.fps, Fps { num: 24, den: 1 });
    assert_eq!(opts.gop_size, 10);
    assert_eq!(opts.max_b_frames, 1);
    assert!(opts.validate().is_ok());
}

#[test]
fn opts_validation_catches_bad_values() {
    let mut opts = FfmpegEncodeOpts::default();
    opts.fps = Fps { num: 24, den: 0 };
    assert!(opts.validate().is_err());

    let mut opts = FfmpegEncodeOpts::default();
    opts.bit_rate = 0;
    assert!(opts.validate().is_err());

    let mut opts = FfmpegEncodeOpts::default();
    opts.codec.clear();
    assert!(opts.validate().is_err());
}

#[test]
fn probe_picks_first_video_stream() {
    let json = br#"{
        "streams": [
            { "index": 0, "codec_type": "audio", "codec_name": "aac" },
            { "index": 1, "codec_type": "video", "codec_name": "h264",
              "width": 1280, "height": 32, "pix_fmt": "yuv420p" },
            { "index": 2, "codec_type": "video", "codec_name": "mjpeg",
              "width": 64, "height": 64, "pix_fmt": "yuvj420p" }
        ]
    }"#;
    let info = parse_probe_output(Path::new("in.mp4"), json).unwrap();
    assert_eq!(info.stream_index, 1);
    assert_eq!((info.width, info.height), (1280, 32));
    assert_eq!(info.pix_fmt.as_deref(), Some("yuv420p"));
    assert_eq!(info.codec_name.as_deref(), Some("h264"));
}

#[test]
fn probe_without_video_is_an_input_error() {
    let json = br#"{ "streams": [ { "index": 0, "codec_type": "audio" } ] }"#;
    assert!(matches!(
        parse_probe_output(Path::new("a.m4a"), json),
        Err(BitreelError::Input(_))
    ));
    assert!(matches!(
        parse_probe_output(Path::new("x"), b"not json"),
        Err(BitreelError::Codec(_))
    ));
}

#[test]
fn odd_width_is_rejected_before_spawning() {
    let g = FrameGeometry::new(5, 8).unwrap();
    assert!(matches!(
        FfmpegEncoder::spawn(g, &FfmpegEncodeOpts::default()),
        Err(BitreelError::Config(_))
    ));
}

#[test]
fn ffmpeg_encodes_gray_frames_when_available() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let g = FrameGeometry::new(64, 32).unwrap();
    let opts = FfmpegEncodeOpts {
        preset: Some("ultrafast".to_string()),
        ..FfmpegEncodeOpts::default()
    };
    let mut enc = FfmpegEncoder::spawn(g, &opts).unwrap();

    let mut total = 0usize;
    for i in 0..5u64 {
        let frame = crate::raster::frame::build_frame(&[i as u8; 64], g).unwrap();
        for p in enc.submit_frame(FrameIndex(i), &frame).unwrap() {
            total += p.data.len();
        }
    }
    for p in enc.flush().unwrap() {
        total += p.data.len();
    }
    assert!(total > 0);
    assert!(enc.flush().is_err());
}
