use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult};

use crate::atlas::volume::Volume;
use crate::error::AtlasError;

/// Decodes a multi-page TIFF into a `u8` volume, scaling wider samples to the full range.
pub fn decode_stack(name: &str, bytes: &[u8]) -> Result<Volume, AtlasError> {
    let fail = |reason: String| AtlasError::Decode {
        name: name.to_string(),
        reason,
    };

    let mut decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| fail(e.to_string()))?;
    let (width, height) = decoder.dimensions().map_err(|e| fail(e.to_string()))?;

    let mut pages = Vec::new();
    loop {
        let (w, h) = decoder.dimensions().map_err(|e| fail(e.to_string()))?;
        if (w, h) != (width, height) {
            return Err(fail(format!(
                "page {} is {}x{}, expected {}x{}",
                pages.len(),
                w,
                h,
                width,
                height
            )));
        }
        let page = decoder.read_image().map_err(|e| fail(e.to_string()))?;
        pages.push(to_u8(page));

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(|e| fail(e.to_string()))?;
    }

    Volume::from_pages(width as usize, height as usize, pages)
        .ok_or_else(|| fail("unsupported sample layout".to_string()))
}

fn to_u8(result: DecodingResult) -> Vec<u8> {
    match result {
        DecodingResult::U8(values) => values,
        DecodingResult::U16(values) => rescale(values.into_iter().map(f64::from)),
        DecodingResult::U32(values) => rescale(values.into_iter().map(f64::from)),
        DecodingResult::U64(values) => rescale(values.into_iter().map(|v| v as f64)),
        DecodingResult::F32(values) => rescale(values.into_iter().map(f64::from)),
        DecodingResult::F64(values) => rescale(values.into_iter()),
        DecodingResult::I8(values) => rescale(values.into_iter().map(f64::from)),
        DecodingResult::I16(values) => rescale(values.into_iter().map(f64::from)),
        DecodingResult::I32(values) => rescale(values.into_iter().map(f64::from)),
        DecodingResult::I64(values) => rescale(values.into_iter().map(|v| v as f64)),
    }
}

fn rescale(values: impl Iterator<Item = f64>) -> Vec<u8> {
    let values: Vec<f64> = values.map(|v| if v.is_finite() { v } else { 0.0 }).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![if max > 0.0 { 255 } else { 0 }; values.len()];
    }
    values
        .iter()
        .map(|v| (((v - min) / range) * 255.0).round() as u8)
        .collect()
}
