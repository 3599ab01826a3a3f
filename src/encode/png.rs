use std::path::Path;

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::error::FractalResult;
use crate::render::frame::FrameBuffer;

/// Write `frame` as an 8-bit RGB PNG, creating parent directories as needed.
#[tracing::instrument(skip(frame, path), fields(path = %path.display(), width = frame.width(), height = frame.height()))]
pub fn write_png(frame: &FrameBuffer, path: &Path) -> FractalResult<()> {
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        frame.data(),
        frame.width(),
        frame.height(),
        image::ExtendedColorType::Rgb8,
        image::ImageFormat::Png,
    )?;
    tracing::info!("png written");
    Ok(())
}
