use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::mux::Metadata;
use crate::foundation::error::{FractalError, FractalResult};

/// Constant rate factor handed to the HEVC/H.264 encoder.
pub const VIDEO_CRF: u32 = 28;

/// Preferred video encoders, best first.
pub const VIDEO_CODECS: [&str; 2] = ["libx265", "libx264"];

/// Options for the `ffmpeg` process that encodes the piped AVI stream.
#[derive(Clone, Debug)]
pub struct FfmpegOpts {
    /// Final output path; its extension picks the container.
    pub output: PathBuf,
    /// Frames per second; sets the keyframe interval.
    pub framerate: u32,
    /// Video encoder name, one of [`VIDEO_CODECS`].
    pub video_codec: &'static str,
    /// Tags copied into the output.
    pub metadata: Metadata,
}

impl FfmpegOpts {
    /// Keyframe interval: a quarter second of frames, at least 1.
    pub fn gop(&self) -> u32 {
        (self.framerate / 4).max(1)
    }

    /// Full ffmpeg argument list.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        for a in [
            "-y",
            "-loglevel",
            "error",
            "-f",
            "avi",
            "-i",
            "pipe:0",
            "-c:v",
            self.video_codec,
            "-crf",
            &VIDEO_CRF.to_string(),
            "-g",
            &self.gop().to_string(),
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-metadata",
            &format!("title={}", self.metadata.title),
            "-metadata",
            &format!("copyright={}", self.metadata.copyright),
            "-movflags",
            "+faststart",
        ] {
            args.push(a.into());
        }
        args.push(self.output.clone().into_os_string());
        args
    }
}

/// Whether an `ffmpeg` binary can be run from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Whether the local ffmpeg build lists `name` among its encoders.
pub fn ffmpeg_has_encoder(name: &str) -> bool {
    let Ok(out) = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stderr(Stdio::null())
        .output()
    else {
        return false;
    };
    out.status.success()
        && String::from_utf8_lossy(&out.stdout)
            .lines()
            .any(|l| l.split_whitespace().nth(1) == Some(name))
}

/// First entry of [`VIDEO_CODECS`] the local ffmpeg supports.
pub fn pick_video_codec() -> Option<&'static str> {
    VIDEO_CODECS.into_iter().find(|c| ffmpeg_has_encoder(c))
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> FractalResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// A running `ffmpeg` that reads an AVI stream from its stdin and writes the final container.
///
/// Dropping the pipe without [`FfmpegPipe::finish`] kills the process.
#[derive(Debug)]
pub struct FfmpegPipe {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FfmpegPipe {
    /// Start ffmpeg with `opts`.
    #[tracing::instrument(skip(opts), fields(output = %opts.output.display(), codec = opts.video_codec))]
    pub fn spawn(opts: &FfmpegOpts) -> FractalResult<Self> {
        // The system binary is used rather than linking libav so no native dev headers are needed.
        let mut child = Command::new("ffmpeg")
            .args(opts.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                FractalError::encoder_init(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FractalError::encoder_init("failed to open ffmpeg stdin (unexpected)"))?;
        tracing::info!("ffmpeg started");
        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
        })
    }

    /// Close ffmpeg's input, wait for it to exit and surface its stderr on failure.
    pub fn finish(mut self) -> FractalResult<()> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Err(FractalError::encode_write("ffmpeg already finished"));
        };
        let output = child.wait_with_output().map_err(|e| {
            FractalError::encode_write(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FractalError::encode_write(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        tracing::info!("ffmpeg finished");
        Ok(())
    }
}

impl Write for FfmpegPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "ffmpeg input already closed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for FfmpegPipe {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
