//! Render worker - runs in separate thread(s)

use std::sync::Arc;

use flume::{Receiver, Sender};
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;

use super::engine::{DocumentHandle, Rasterizer};
use super::error::RenderError;
use super::request::{RenderRequest, RenderResponse};
use super::types::{Raster, RenderedPage};

/// Main worker function - runs in a dedicated thread.
///
/// Each worker builds its own rasterizer from the shared handle and pulls
/// requests off the shared queue until `Shutdown` or until the viewer hangs
/// up its end of the response channel.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker<E>(
    handle: Arc<dyn DocumentHandle>,
    requests: Receiver<RenderRequest>,
    responses: Sender<E>,
    jpeg_quality: u8,
) where
    E: From<RenderResponse>,
{
    let mut rasterizer = match handle.rasterizer() {
        Ok(r) => Ok(r),
        Err(e) => {
            log::error!("Render worker could not open document: {e}");
            Err(e)
        }
    };

    for request in requests {
        match request {
            RenderRequest::Page {
                id,
                doc,
                page,
                scale,
            } => {
                let result = match rasterizer.as_mut() {
                    Ok(r) => render_page(r.as_mut(), page, scale, jpeg_quality),
                    Err(e) => Err(RenderError::page(page, format!("document unavailable: {e}"))),
                };

                let response = match result {
                    Ok(data) => RenderResponse::Page {
                        id,
                        doc,
                        data: Arc::new(data),
                    },
                    Err(error) => RenderResponse::Error { id, doc, error },
                };

                if responses.send(response.into()).is_err() {
                    break;
                }
            }

            RenderRequest::Shutdown => break,
        }
    }
}

/// Rasterize and encode a single page
pub fn render_page(
    rasterizer: &mut dyn Rasterizer,
    page: usize,
    scale: f32,
    jpeg_quality: u8,
) -> Result<RenderedPage, RenderError> {
    let raster = rasterizer.rasterize(page, scale)?;
    let jpeg = encode_jpeg(&raster, jpeg_quality).map_err(|detail| RenderError::Encode {
        page,
        detail,
    })?;

    Ok(RenderedPage {
        page,
        width: raster.width,
        height: raster.height,
        scale_milli: (scale * 1000.0).round() as u32,
        jpeg,
    })
}

/// Encode an RGB raster as JPEG
pub fn encode_jpeg(raster: &Raster, quality: u8) -> Result<Vec<u8>, String> {
    let expected = raster.width as usize * raster.height as usize * 3;
    if raster.width == 0 || raster.height == 0 {
        return Err("empty raster".to_string());
    }
    if raster.pixels.len() != expected {
        return Err(format!(
            "raster buffer size mismatch: {} bytes for {}x{}",
            raster.pixels.len(),
            raster.width,
            raster.height
        ));
    }

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder
        .encode(
            &raster.pixels,
            raster.width,
            raster.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| e.to_string())?;
    Ok(out)
}
