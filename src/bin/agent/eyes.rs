use std::io::Cursor;

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};
use tracing::debug;
use xcap::Monitor;

/// A PNG of the primary display, ready to embed in a chat request.
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_base64: String,
}

impl Screenshot {
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.png_base64)
    }
}

fn primary_monitor() -> Result<Monitor> {
    let monitors = Monitor::all().map_err(|e| anyhow!("Failed to enumerate monitors: {e}"))?;
    for monitor in monitors {
        let is_primary = monitor
            .is_primary()
            .map_err(|e| anyhow!("Failed to check primary status: {e}"))?;
        if is_primary {
            return Ok(monitor);
        }
    }
    Err(anyhow!("No primary monitor found"))
}

pub fn capture() -> Result<Screenshot> {
    let monitor = primary_monitor()?;
    let image = monitor
        .capture_image()
        .map_err(|e| anyhow!("Failed to capture screen: {e}"))?;
    let (width, height) = (image.width(), image.height());

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode screenshot as PNG")?;
    debug!("captured {width}x{height} screenshot ({} bytes)", png.len());

    Ok(Screenshot {
        width,
        height,
        png_base64: STANDARD.encode(&png),
    })
}

/// Pixel size of the primary display, for dry runs.
pub fn primary_size() -> Result<(u32, u32)> {
    let monitor = primary_monitor()?;
    let width = monitor
        .width()
        .map_err(|e| anyhow!("Failed to get monitor width: {e}"))?;
    let height = monitor
        .height()
        .map_err(|e| anyhow!("Failed to get monitor height: {e}"))?;
    Ok((width, height))
}
