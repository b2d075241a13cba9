//! JPEG format support.
//!
//! Reads gray, RGB and CMYK baseline/progressive JPEGs; the ICC profile is
//! reassembled from the `ICC_PROFILE` APP2 chunks. Writes gray, RGB and CMYK
//! with the embedded profile. Alpha is dropped on write.

use crate::{DecodeLimits, IoError, IoResult};
use cyan_core::{Colorspace, ImageData, PixelData, SampleFormat};
use std::io::Cursor;

/// Encoder quality (1-100).
pub const DEFAULT_QUALITY: u8 = 92;

/// Decodes JPEG bytes.
pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> IoResult<ImageData> {
    let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(bytes));
    decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;
    let (width, height) = (info.width as u32, info.height as u32);

    let (colorspace, format) = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => (Colorspace::Gray, SampleFormat::U8),
        jpeg_decoder::PixelFormat::L16 => (Colorspace::Gray, SampleFormat::U16),
        jpeg_decoder::PixelFormat::RGB24 => (Colorspace::Rgb, SampleFormat::U8),
        jpeg_decoder::PixelFormat::CMYK32 => (Colorspace::Cmyk, SampleFormat::U8),
        #[allow(unreachable_patterns)]
        other => return Err(IoError::UnsupportedLayout(format!("JPEG {other:?}"))),
    };
    limits.check(width, height, colorspace.color_channels(), format.bytes_per_sample())?;

    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let data = match format {
        SampleFormat::U16 => PixelData::U16(
            pixels
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect(),
        ),
        _ => PixelData::U8(pixels),
    };

    let mut image = ImageData::from_data(width, height, colorspace, false, data)?;
    image.icc_profile = read_icc_chunks(bytes).map(Into::into);
    Ok(image)
}

/// Encodes an image at [`DEFAULT_QUALITY`], embedding its profile.
pub fn encode(image: &ImageData) -> IoResult<Vec<u8>> {
    use jpeg_encoder::{ColorType, Encoder};

    let (width, height) = match (u16::try_from(image.width), u16::try_from(image.height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(IoError::EncodeError(format!(
                "{}x{} exceeds the JPEG size limit",
                image.width, image.height
            )));
        }
    };
    let color_type = match image.colorspace {
        Colorspace::Gray => ColorType::Luma,
        Colorspace::Rgb => ColorType::Rgb,
        Colorspace::Cmyk => ColorType::Cmyk,
    };

    let color = image.color_channels() as usize;
    let stride = image.channels() as usize;
    let samples: Vec<u8> = match &image.data {
        PixelData::U8(v) if !image.alpha => v.clone(),
        PixelData::U8(v) => v.chunks_exact(stride).flat_map(|px| px[..color].to_vec()).collect(),
        _ => image
            .to_f32()
            .chunks_exact(stride)
            .flat_map(|px| px[..color].to_vec())
            .map(|s| (s.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect(),
    };

    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, DEFAULT_QUALITY);
    if let Some(icc) = &image.icc_profile {
        encoder
            .add_icc_profile(icc)
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
    }
    encoder
        .encode(&samples, width, height, color_type)
        .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;
    Ok(out)
}

/// Reassembles an ICC profile from APP2 `ICC_PROFILE` segments.
fn read_icc_chunks(data: &[u8]) -> Option<Vec<u8>> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut chunks: Vec<(u8, Vec<u8>)> = Vec::new();
    let mut pos = 2usize;

    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        while pos < data.len() && data[pos] == 0xFF {
            pos += 1;
        }
        if pos >= data.len() {
            break;
        }

        let marker = data[pos];
        pos += 1;

        // EOI / SOS: no more metadata segments
        if marker == 0xD9 || marker == 0xDA {
            break;
        }
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            continue;
        }

        if pos + 2 > data.len() {
            break;
        }
        let seg_len = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        pos += 2;
        if seg_len < 2 || pos + seg_len - 2 > data.len() {
            break;
        }
        let segment = &data[pos..pos + seg_len - 2];
        if marker == 0xE2 && segment.starts_with(b"ICC_PROFILE\0") && segment.len() > 14 {
            chunks.push((segment[12], segment[14..].to_vec()));
        }
        pos += seg_len - 2;
    }

    if chunks.is_empty() {
        return None;
    }
    chunks.sort_by_key(|(num, _)| *num);
    Some(chunks.into_iter().flat_map(|(_, d)| d).collect())
}
