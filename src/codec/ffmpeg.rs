use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

use crate::codec::{Decoded, FrameDecoder, FrameEncoder, Packet};
use crate::foundation::core::{FrameGeometry, FrameIndex, Fps, GrayFrame};
use crate::foundation::error::{BitreelError, BitreelResult};
use crate::foundation::io::read_full;

/// Codec settings passed to `ffmpeg` when compressing frames.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FfmpegEncodeOpts {
    /// `ffmpeg` encoder name.
    pub codec: String,
    /// Raw output format written to stdout (must match `codec`).
    pub format: String,
    pub preset: Option<String>,
    /// Target bit rate in bits per second.
    pub bit_rate: u64,
    pub fps: Fps,
    /// Distance between intra frames.
    pub gop_size: u32,
    pub max_b_frames: u32,
}

impl Default for FfmpegEncodeOpts {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            format: "h264".to_string(),
            preset: Some("slow".to_string()),
            bit_rate: 1_000_000,
            fps: Fps { num: 24, den: 1 },
            gop_size: 10,
            max_b_frames: 1,
        }
    }
}

impl FfmpegEncodeOpts {
    pub fn validate(&self) -> BitreelResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        if self.codec.is_empty() || self.format.is_empty() {
            return Err(BitreelError::config("ffmpeg codec and format must be set"));
        }
        if self.bit_rate == 0 {
            return Err(BitreelError::config("ffmpeg bit_rate must be non-zero"));
        }
        Ok(())
    }
}

/// Encoder that streams raw `gray` frames into a system `ffmpeg` process and reads the
/// compressed elementary stream back from its stdout.
///
/// Pixel format conversion (`gray` to `yuv420p`) happens inside `ffmpeg`.
pub struct FfmpegEncoder {
    geometry: FrameGeometry,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    packets: Option<Receiver<std::io::Result<Vec<u8>>>>,
    stdout_drain: Option<JoinHandle<()>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegEncoder {
    /// Spawn `ffmpeg` configured for frames of `geometry`.
    pub fn spawn(geometry: FrameGeometry, opts: &FfmpegEncodeOpts) -> BitreelResult<Self> {
        opts.validate()?;
        if !geometry.width().is_multiple_of(2) {
            // yuv420p subsamples chroma horizontally; height is already a multiple of 8.
            return Err(BitreelError::config(
                "frame width must be even for yuv420p output",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(BitreelError::codec(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "gray",
            "-s",
            &format!("{}x{}", geometry.width(), geometry.height()),
            "-r",
            &format!("{}/{}", opts.fps.num, opts.fps.den),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            &opts.codec,
        ]);
        if let Some(preset) = opts.preset.as_deref() {
            cmd.args(["-preset", preset]);
        }
        cmd.args([
            "-b:v",
            &opts.bit_rate.to_string(),
            "-g",
            &opts.gop_size.to_string(),
            "-bf",
            &opts.max_b_frames.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-f",
            &opts.format,
            "pipe:1",
        ]);
        tracing::debug!(?cmd, "spawning ffmpeg encoder");

        let mut child = cmd.spawn().map_err(|e| {
            BitreelError::codec(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BitreelError::codec("failed to open ffmpeg stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BitreelError::codec("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BitreelError::codec("failed to open ffmpeg stderr (unexpected)"))?;

        let (tx, rx) = mpsc::channel();
        let stdout_drain = std::thread::spawn(move || drain_packets(stdout, tx));

        Ok(Self {
            geometry,
            child: Some(child),
            stdin: Some(stdin),
            packets: Some(rx),
            stdout_drain: Some(stdout_drain),
            stderr_drain: Some(spawn_stderr_drain(stderr)),
            last_idx: None,
        })
    }

    /// Collect whatever the stdout reader has produced so far without blocking.
    fn ready_packets(&mut self) -> BitreelResult<Vec<Packet>> {
        let Some(rx) = self.packets.as_ref() else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(Ok(data)) => out.push(Packet::new(data)),
                Ok(Err(e)) => {
                    return Err(BitreelError::codec(format!(
                        "failed to read ffmpeg output: {e}"
                    )));
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(out)
    }
}

impl FrameEncoder for FfmpegEncoder {
    fn submit_frame(&mut self, idx: FrameIndex, frame: &GrayFrame) -> BitreelResult<Vec<Packet>> {
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(BitreelError::codec(
                "ffmpeg encoder received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != self.geometry.width() || frame.height != self.geometry.height() {
            return Err(BitreelError::codec(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width,
                frame.height,
                self.geometry.width(),
                self.geometry.height()
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(BitreelError::codec("ffmpeg encoder is already flushed"));
        };
        stdin.write_all(&frame.data).map_err(|e| {
            BitreelError::codec(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        self.ready_packets()
    }

    fn flush(&mut self) -> BitreelResult<Vec<Packet>> {
        drop(self.stdin.take());

        let mut out = Vec::new();
        if let Some(rx) = self.packets.take() {
            for chunk in rx {
                let data = chunk.map_err(|e| {
                    BitreelError::codec(format!("failed to read ffmpeg output: {e}"))
                })?;
                out.push(Packet::new(data));
            }
        }
        if let Some(handle) = self.stdout_drain.take() {
            handle
                .join()
                .map_err(|_| BitreelError::codec("ffmpeg stdout drain thread panicked"))?;
        }

        let mut child = self
            .child
            .take()
            .ok_or_else(|| BitreelError::codec("ffmpeg encoder is already flushed"))?;
        let status = child.wait().map_err(|e| {
            BitreelError::codec(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = join_stderr(self.stderr_drain.take())?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(BitreelError::codec(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(out)
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        reap(self.child.take());
    }
}

/// Stream and pixel format information from `ffprobe`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoStreamInfo {
    pub source_path: PathBuf,
    pub stream_index: u32,
    pub width: u32,
    pub height: u32,
    pub pix_fmt: Option<String>,
    pub codec_name: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    pix_fmt: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

/// Probe `source_path` and return its first video stream.
pub fn probe_video(source_path: &Path) -> BitreelResult<VideoStreamInfo> {
    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(source_path)
        .output()
        .map_err(|e| BitreelError::codec(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(BitreelError::input(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_output(source_path, &out.stdout)
}

/// Pick the first video stream out of `ffprobe -show_streams` JSON.
fn parse_probe_output(source_path: &Path, json: &[u8]) -> BitreelResult<VideoStreamInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| BitreelError::codec(format!("ffprobe json parse failed: {e}")))?;

    for stream in parsed.streams {
        if stream.codec_type.as_deref() != Some("video") {
            tracing::debug!(
                index = stream.index,
                codec_type = stream.codec_type.as_deref().unwrap_or("?"),
                "skipping non-video stream"
            );
            continue;
        }
        let width = stream
            .width
            .filter(|w| *w > 0)
            .ok_or_else(|| BitreelError::codec("missing video width from ffprobe"))?;
        let height = stream
            .height
            .filter(|h| *h > 0)
            .ok_or_else(|| BitreelError::codec("missing video height from ffprobe"))?;
        return Ok(VideoStreamInfo {
            source_path: source_path.to_path_buf(),
            stream_index: stream.index,
            width,
            height,
            pix_fmt: stream.pix_fmt,
            codec_name: stream.codec_name,
        });
    }

    Err(BitreelError::input(format!(
        "'{}' does not contain a video stream",
        source_path.display()
    )))
}

/// Decoder that asks `ffmpeg` for raw `gray` frames of the first video stream.
pub struct FfmpegDecoder {
    info: VideoStreamInfo,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    frame_len: usize,
}

impl FfmpegDecoder {
    /// Probe and start decoding `source_path`. `max_frames` caps how many frames are decoded.
    pub fn open(source_path: &Path, max_frames: Option<u64>) -> BitreelResult<Self> {
        if !is_ffmpeg_on_path() {
            return Err(BitreelError::codec(
                "ffmpeg is required for decoding, but was not found on PATH",
            ));
        }
        let info = probe_video(source_path)?;
        tracing::info!(
            width = info.width,
            height = info.height,
            codec = info.codec_name.as_deref().unwrap_or("?"),
            "found video stream {}",
            info.stream_index
        );
        if info.pix_fmt.as_deref() != Some("yuv420p") {
            tracing::warn!(
                pix_fmt = info.pix_fmt.as_deref().unwrap_or("?"),
                "source is not yuv420p; extracted frames may not be true luminance"
            );
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args(["-v", "error", "-i"])
            .arg(source_path)
            .args(["-map", &format!("0:{}", info.stream_index)]);
        if let Some(n) = max_frames {
            cmd.args(["-frames:v", &n.to_string()]);
        }
        cmd.args(["-f", "rawvideo", "-pix_fmt", "gray", "pipe:1"]);
        tracing::debug!(?cmd, "spawning ffmpeg decoder");

        let mut child = cmd.spawn().map_err(|e| {
            BitreelError::codec(format!("failed to run ffmpeg for video decode: {e}"))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BitreelError::codec("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BitreelError::codec("failed to open ffmpeg stderr (unexpected)"))?;

        Ok(Self {
            frame_len: info.width as usize * info.height as usize,
            info,
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(spawn_stderr_drain(stderr)),
        })
    }

    fn finish(&mut self) -> BitreelResult<()> {
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| {
            BitreelError::codec(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = join_stderr(self.stderr_drain.take())?;
        if !status.success() {
            return Err(BitreelError::codec(format!(
                "ffmpeg video decode failed for '{}': {}",
                self.info.source_path.display(),
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn next_decoded_frame(&mut self) -> BitreelResult<Decoded> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(Decoded::EndOfStream);
        };

        let mut buf = vec![0u8; self.frame_len];
        let n = read_full(stdout, &mut buf)
            .map_err(|e| BitreelError::codec(format!("failed to read decoded frame: {e}")))?;

        if n == 0 {
            self.finish()?;
            return Ok(Decoded::EndOfStream);
        }
        if n < self.frame_len {
            self.finish()?;
            return Err(BitreelError::codec(format!(
                "decoded stream ended mid-frame: got {n} of {} bytes",
                self.frame_len
            )));
        }
        Ok(Decoded::Frame(GrayFrame::from_raw(
            self.info.width,
            self.info.height,
            buf,
        )?))
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        drop(self.stdout.take());
        reap(self.child.take());
    }
}

fn drain_packets(mut stdout: ChildStdout, tx: mpsc::Sender<std::io::Result<Vec<u8>>>) {
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        match stdout.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

fn spawn_stderr_drain(
    mut stderr: std::process::ChildStderr,
) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut stderr_bytes = Vec::new();
        stderr.read_to_end(&mut stderr_bytes)?;
        Ok(stderr_bytes)
    })
}

fn join_stderr(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> BitreelResult<Vec<u8>> {
    match handle {
        Some(handle) => Ok(handle
            .join()
            .map_err(|_| BitreelError::codec("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| BitreelError::codec(format!("ffmpeg stderr read failed: {e}")))?),
        None => Ok(Vec::new()),
    }
}

/// Kill and wait for a child that was never finished normally.
fn reap(child: Option<Child>) {
    if let Some(mut child) = child {
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/codec/ffmpeg.rs"]
mod tests;
