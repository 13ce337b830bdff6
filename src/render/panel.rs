use super::{Frame, HEIGHT, WIDTH};
use crate::api::Error;
use embedded_graphics::pixelcolor::Gray2;
use embedded_graphics::prelude::*;
use std::convert::Infallible;
use std::fs;
use std::path::PathBuf;

/// Commits a frame to the physical display. One full refresh per call.
pub trait Panel {
    fn show(&mut self, frame: &Frame) -> Result<(), Error>;
}

/// 2-bit grayscale framebuffer the size of the panel, one byte per pixel.
#[derive(Clone)]
pub struct FrameBuffer {
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![Gray2::WHITE.luma(); (WIDTH * HEIGHT) as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Gray2> {
        if x < WIDTH && y < HEIGHT {
            Some(Gray2::new(self.pixels[(y * WIDTH + x) as usize]))
        } else {
            None
        }
    }

    /// Binary PGM (`P5`) with maxval 3, so the raw luma values need no scaling.
    pub fn to_pgm(&self) -> Vec<u8> {
        let mut pgm = format!("P5\n{} {}\n3\n", WIDTH, HEIGHT).into_bytes();
        pgm.extend_from_slice(&self.pixels);
        pgm
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Gray2;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            /* off-panel pixels are clipped */
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                if x < WIDTH && y < HEIGHT {
                    self.pixels[(y * WIDTH + x) as usize] = color.luma();
                }
            }
        }
        Ok(())
    }
}

/// Host stand-in for the e-paper driver: rasterises each frame and replaces
/// the image at `path`.
pub struct PgmPanel {
    path: PathBuf,
}

impl PgmPanel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Panel for PgmPanel {
    fn show(&mut self, frame: &Frame) -> Result<(), Error> {
        let mut buffer = FrameBuffer::new();
        match frame.draw(&mut buffer) {
            Ok(()) => {}
            Err(never) => match never {},
        }

        fs::write(&self.path, buffer.to_pgm()).map_err(|e| {
            Error::Display(format!("Unable to write {}: {}", self.path.display(), e))
        })?;

        log::info!("Frame written to {}", self.path.display());
        Ok(())
    }
}
