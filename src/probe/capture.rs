//! Frame capture collaborator.

use super::error::CaptureError;
use super::frames::Frame;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Samples decoded raster frames from a media URL.
#[async_trait]
pub trait FrameCapture: Send + Sync + 'static {
    /// Decode frames from `url` for roughly `window`, in presentation order.
    async fn sample_frames(&self, url: &str, window: Duration) -> Result<Vec<Frame>, CaptureError>;
}

/// Capture backed by an `ffmpeg` subprocess decoding to small greyscale frames.
#[derive(Debug, Clone)]
pub struct FfmpegCapture {
    ffmpeg_path: String,
    width: u32,
    height: u32,
}

impl FfmpegCapture {
    /// Create a capture using `ffmpeg_path`, falling back to `FFMPEG_PATH` or `ffmpeg`.
    pub fn new(ffmpeg_path: Option<String>, width: u32, height: u32) -> Self {
        let ffmpeg_path = ffmpeg_path
            .or_else(|| std::env::var("FFMPEG_PATH").ok())
            .unwrap_or_else(|| "ffmpeg".to_string());
        Self {
            ffmpeg_path,
            width: width.max(1),
            height: height.max(1),
        }
    }

    fn build_args(&self, url: &str, window: Duration) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostdin".to_string(),
            // Read at native rate so fps reflects the live stream, not burst download
            "-re".to_string(),
            "-i".to_string(),
            url.to_string(),
            "-t".to_string(),
            format!("{:.3}", window.as_secs_f64()),
            "-an".to_string(),
            "-vf".to_string(),
            format!("scale={}:{}", self.width, self.height),
            "-pix_fmt".to_string(),
            "gray".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "pipe:1".to_string(),
        ]
    }

    /// Split raw decoder output into whole frames, dropping a trailing partial one.
    fn split_frames(&self, raw: &[u8]) -> Vec<Frame> {
        let frame_len = self.width as usize * self.height as usize;
        raw.chunks_exact(frame_len)
            .filter_map(|chunk| Frame::new(self.width, self.height, chunk.to_vec()).ok())
            .collect()
    }
}

#[async_trait]
impl FrameCapture for FfmpegCapture {
    async fn sample_frames(&self, url: &str, window: Duration) -> Result<Vec<Frame>, CaptureError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(self.build_args(url, window))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CaptureError::Spawn(format!("{}: {}", self.ffmpeg_path, e)))?;

        let frames = self.split_frames(&output.stdout);
        if frames.is_empty() && !output.status.success() {
            return Err(CaptureError::Decoder {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::trace!(url, frames = frames.len(), "Captured frames");
        Ok(frames)
    }
}
