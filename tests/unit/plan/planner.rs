use super::*;
use crate::codec::memory::InMemoryEncoder;
use crate::raster::frame::frame_bytes;

fn small_opts(width: u32) -> EncodeOptions {
    EncodeOptions {
        min_source_size: 0,
        progress_every: 1,
        ..EncodeOptions::new(FrameGeometry::new(width, 8).unwrap())
    }
}

fn run(
    data: &[u8],
    opts: &EncodeOptions,
    encoder: &mut InMemoryEncoder,
) -> BitreelResult<(EncodeReport, Vec<u8>, Vec<Progress>)> {
    let mut out = Vec::new();
    let mut seen = Vec::new();
    let report = encode_stream(
        data,
        data.len() as u64,
        "f",
        opts,
        encoder,
        &mut out,
        &mut |p| seen.push(p),
    )?;
    Ok((report, out, seen))
}

#[test]
fn plan_counts_chunks_with_ceiling() {
    let g = FrameGeometry::new(1280, 32).unwrap();
    let plan = StreamPlan::new(12800, g);
    assert_eq!(plan.chunk_count, 10);
    assert_eq!(plan.data_frames(), 11);
    assert_eq!(plan.total_iterations, 12);

    let plan = StreamPlan::new(12801, g);
    assert_eq!(plan.chunk_count, 11);

    let plan = StreamPlan::new(0, g);
    assert_eq!(plan.chunk_count, 0);
    assert_eq!(plan.data_frames(), 1);
}

#[test]
fn frames_are_header_then_chunks_with_padded_tail() {
    let opts = small_opts(4);
    let data: Vec<u8> = (1..=10).collect();
    let mut enc = InMemoryEncoder::new();
    let (report, _, _) = run(&data, &opts, &mut enc).unwrap();

    assert_eq!(report.chunk_count, 3);
    assert_eq!(report.frames_submitted, 4);

    let g = opts.geometry;
    let decoded: Vec<Vec<u8>> = enc
        .frames()
        .iter()
        .map(|(_, f)| frame_bytes(f, g).unwrap())
        .collect();
    assert_eq!(decoded[0], b"f\n10".to_vec());
    assert_eq!(decoded[1], vec![1, 2, 3, 4]);
    assert_eq!(decoded[2], vec![5, 6, 7, 8]);
    assert_eq!(decoded[3], vec![9, 10, 0, 0]);

    let indices: Vec<u64> = enc.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn output_is_packets_then_trailer() {
    let opts = small_opts(4);
    let mut enc = InMemoryEncoder::with_latency(2);
    let (report, out, _) = run(&[7; 8], &opts, &mut enc).unwrap();

    let frame_len = opts.geometry.pixel_len();
    assert_eq!(report.packets_written, 3);
    assert_eq!(report.bytes_written as usize, 3 * frame_len + 4);
    assert_eq!(out.len(), 3 * frame_len + 4);
    assert_eq!(&out[out.len() - 4..], &SEQUENCE_END_CODE);
    assert!(enc.is_flushed());
}

#[test]
fn progress_runs_at_cadence_and_at_end() {
    let mut opts = small_opts(1);
    opts.progress_every = 2;
    let mut enc = InMemoryEncoder::new();
    // 5 chunks -> 7 iterations
    let (_, _, seen) = run(&[1, 2, 3, 4, 5], &opts, &mut enc).unwrap();

    let completed: Vec<u64> = seen.iter().map(|p| p.completed).collect();
    assert_eq!(completed, vec![2, 4, 6, 7]);
    assert!(seen.iter().all(|p| p.total == 7));
    assert_eq!(seen.last().unwrap().percent(), 100.0);
}

#[test]
fn zero_progress_cadence_is_a_config_error() {
    let mut opts = small_opts(4);
    opts.progress_every = 0;
    let mut enc = InMemoryEncoder::new();
    assert!(matches!(
        run(&[1; 8], &opts, &mut enc),
        Err(BitreelError::Config(_))
    ));
    assert!(enc.frames().is_empty());
}

#[test]
fn empty_source_yields_only_header_when_allowed() {
    let opts = small_opts(4);
    let mut enc = InMemoryEncoder::new();
    let (report, out, _) = run(&[], &opts, &mut enc).unwrap();

    assert_eq!(report.chunk_count, 0);
    assert_eq!(enc.frames().len(), 1);
    assert_eq!(
        frame_bytes(&enc.frames()[0].1, opts.geometry).unwrap(),
        b"f\n0\0".to_vec()
    );
    assert_eq!(&out[out.len() - 4..], &SEQUENCE_END_CODE);
}

#[test]
fn empty_source_is_rejected_by_default_threshold() {
    let opts = EncodeOptions::new(FrameGeometry::new(1280, 32).unwrap());
    let mut enc = InMemoryEncoder::new();
    assert!(matches!(
        run(&[], &opts, &mut enc),
        Err(BitreelError::Input(_))
    ));
    assert!(enc.frames().is_empty());
}

#[test]
fn short_source_is_an_input_error() {
    let opts = small_opts(4);
    let mut enc = InMemoryEncoder::new();
    let mut out = Vec::new();
    let err = encode_stream(
        &[1u8, 2, 3][..],
        10,
        "f",
        &opts,
        &mut enc,
        &mut out,
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, BitreelError::Input(_)));
}

#[test]
fn longer_source_only_contributes_announced_bytes() {
    let opts = small_opts(4);
    let mut enc = InMemoryEncoder::new();
    let mut out = Vec::new();
    encode_stream(
        &[9u8; 100][..],
        6,
        "f",
        &opts,
        &mut enc,
        &mut out,
        &mut |_| {},
    )
    .unwrap();

    assert_eq!(enc.frames().len(), 3);
    assert_eq!(
        frame_bytes(&enc.frames()[2].1, opts.geometry).unwrap(),
        vec![9, 9, 0, 0]
    );
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("disk full"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failure_is_a_fatal_destination_error() {
    let opts = small_opts(4);
    let mut enc = InMemoryEncoder::new();
    let err = encode_stream(
        &[1u8; 8][..],
        8,
        "f",
        &opts,
        &mut enc,
        &mut FailingWriter,
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, BitreelError::Destination(_)));
    assert_eq!(enc.frames().len(), 1);
}

#[test]
fn strict_header_policy_rejects_long_names() {
    let mut opts = small_opts(4);
    opts.header_policy = HeaderPolicy::Strict;
    let mut enc = InMemoryEncoder::new();
    let mut out = Vec::new();
    let err = encode_stream(
        &[1u8; 8][..],
        8,
        "long-name.bin",
        &opts,
        &mut enc,
        &mut out,
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, BitreelError::Config(_)));
    assert!(out.is_empty());
}
