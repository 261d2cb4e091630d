use bytes::Bytes;
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::config::Config;
use crate::error::{Result, SvcError};

/// A decoded 4:2:0 picture with separate Y, U and V planes.
///
/// Chroma planes are `width >> 1` by `height >> 1`. Rows may be padded: each
/// plane has its own stride, and only the visible part of a row is written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// Visible width in pixels
    pub width: usize,
    /// Visible height in pixels
    pub height: usize,
    /// Bytes per luma row
    pub y_stride: usize,
    /// Bytes per chroma row
    pub uv_stride: usize,
    /// Luma plane
    pub y: Bytes,
    /// Cb plane
    pub u: Bytes,
    /// Cr plane
    pub v: Bytes,
}

impl VideoFrame {
    /// Creates a frame with tightly packed planes.
    pub fn new(
        width: usize,
        height: usize,
        y: impl Into<Bytes>,
        u: impl Into<Bytes>,
        v: impl Into<Bytes>,
    ) -> Result<Self> {
        let frame = Self {
            width,
            height,
            y_stride: width,
            uv_stride: width >> 1,
            y: y.into(),
            u: u.into(),
            v: v.into(),
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Sets padded row strides, as produced by decoders with border pixels.
    pub fn with_strides(mut self, y_stride: usize, uv_stride: usize) -> Result<Self> {
        self.y_stride = y_stride;
        self.uv_stride = uv_stride;
        self.validate()?;
        Ok(self)
    }

    /// Visible chroma width
    pub fn chroma_width(&self) -> usize {
        self.width >> 1
    }

    /// Visible chroma height
    pub fn chroma_height(&self) -> usize {
        self.height >> 1
    }

    /// Bytes written by [`write_yuv420`](Self::write_yuv420)
    pub fn frame_size(&self) -> usize {
        self.width * self.height + 2 * self.chroma_width() * self.chroma_height()
    }

    /// Writes the visible Y, then U, then V rows as raw planar YUV.
    pub fn write_yuv420<W: Write>(&self, out: &mut W) -> Result<usize> {
        write_plane(out, &self.y, self.y_stride, self.width, self.height)?;
        write_plane(
            out,
            &self.u,
            self.uv_stride,
            self.chroma_width(),
            self.chroma_height(),
        )?;
        write_plane(
            out,
            &self.v,
            self.uv_stride,
            self.chroma_width(),
            self.chroma_height(),
        )?;
        Ok(self.frame_size())
    }

    fn validate(&self) -> Result<()> {
        if self.y_stride < self.width || self.uv_stride < self.chroma_width() {
            return Err(SvcError::InvalidData(format!(
                "strides {}/{} narrower than {}x{} frame",
                self.y_stride, self.uv_stride, self.width, self.height
            )));
        }
        check_plane("y", &self.y, self.y_stride, self.width, self.height)?;
        check_plane(
            "u",
            &self.u,
            self.uv_stride,
            self.chroma_width(),
            self.chroma_height(),
        )?;
        check_plane(
            "v",
            &self.v,
            self.uv_stride,
            self.chroma_width(),
            self.chroma_height(),
        )
    }
}

/// Bytes a plane must hold: every row but the last at full stride.
fn plane_len(stride: usize, width: usize, rows: usize) -> usize {
    match rows {
        0 => 0,
        n => (n - 1) * stride + width,
    }
}

fn check_plane(name: &str, plane: &[u8], stride: usize, width: usize, rows: usize) -> Result<()> {
    let needed = plane_len(stride, width, rows);
    if plane.len() < needed {
        return Err(SvcError::InvalidData(format!(
            "{} plane has {} bytes, {}x{} with stride {} needs {}",
            name,
            plane.len(),
            width,
            rows,
            stride,
            needed
        )));
    }
    Ok(())
}

fn write_plane<W: Write>(
    out: &mut W,
    plane: &[u8],
    stride: usize,
    width: usize,
    rows: usize,
) -> Result<()> {
    for row in 0..rows {
        let start = row * stride;
        let line = plane.get(start..start + width).ok_or_else(|| {
            SvcError::InvalidData(format!("plane row {} out of bounds", row))
        })?;
        out.write_all(line)?;
    }
    Ok(())
}

/// Raw YUV output that warns once when the file grows past a size threshold.
#[derive(Debug)]
pub struct YuvWriter<W: Write> {
    inner: W,
    written: u64,
    frames: u64,
    size_warning: u64,
    warned: bool,
}

impl<W: Write> YuvWriter<W> {
    /// Wraps `inner`, warning once past `size_warning` bytes.
    pub fn new(inner: W, size_warning: u64) -> Self {
        Self {
            inner,
            written: 0,
            frames: 0,
            size_warning,
            warned: false,
        }
    }

    /// Wraps `inner` with the configured size warning threshold.
    pub fn from_config(inner: W, config: &Config) -> Self {
        Self::new(inner, config.yuv_size_warning)
    }

    /// Appends one frame.
    pub fn write_frame(&mut self, frame: &VideoFrame) -> Result<()> {
        let n = frame.write_yuv420(&mut self.inner)?;
        self.written += n as u64;
        self.frames += 1;

        if !self.warned && self.written > self.size_warning {
            self.warned = true;
            log::warn!(
                "YUV output exceeds {} bytes ({} frames of {}x{}); the part written so far stays readable",
                self.size_warning,
                self.frames,
                frame.width,
                frame.height
            );
        }
        Ok(())
    }

    /// Total bytes written
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Total frames written
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// True once the size warning has been emitted.
    pub fn size_warning_emitted(&self) -> bool {
        self.warned
    }

    /// Flushes the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl YuvWriter<BufWriter<File>> {
    /// Creates (or truncates) the configured `yuv_output` file.
    pub fn create(config: &Config) -> Result<Self> {
        let file = File::create(&config.yuv_output)?;
        Ok(Self::from_config(BufWriter::new(file), config))
    }
}
