//! PNG format support.
//!
//! Reads 8/16-bit gray and RGB, with or without alpha. Palette and sub-byte
//! images are expanded to 8-bit by the decoder. The iCCP chunk, when
//! present, becomes the embedded profile.

use crate::{DecodeLimits, IoError, IoResult};
use cyan_core::{Colorspace, ImageData, PixelData, SampleFormat};
use std::io::Cursor;

/// Decodes PNG bytes.
pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> IoResult<ImageData> {
    let mut decoder = ::png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(::png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: ::png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let (width, height) = (reader.info().width, reader.info().height);
    let icc = reader.info().icc_profile.as_ref().map(|p| p.to_vec());
    let (color_type, bit_depth) = reader.output_color_type();

    let (colorspace, alpha) = match color_type {
        ::png::ColorType::Grayscale => (Colorspace::Gray, false),
        ::png::ColorType::GrayscaleAlpha => (Colorspace::Gray, true),
        ::png::ColorType::Rgb => (Colorspace::Rgb, false),
        ::png::ColorType::Rgba => (Colorspace::Rgb, true),
        other => return Err(IoError::UnsupportedLayout(format!("PNG {other:?}"))),
    };
    let format = match bit_depth {
        ::png::BitDepth::Eight => SampleFormat::U8,
        ::png::BitDepth::Sixteen => SampleFormat::U16,
        other => return Err(IoError::UnsupportedLayout(format!("PNG {other:?}-bit"))),
    };
    limits.check(
        width,
        height,
        colorspace.color_channels() + alpha as u32,
        format.bytes_per_sample(),
    )?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: ::png::DecodingError| IoError::DecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let data = match format {
        SampleFormat::U16 => PixelData::U16(be_bytes_to_u16(&buf)),
        _ => PixelData::U8(buf),
    };
    let mut image = ImageData::from_data(width, height, colorspace, alpha, data)?;
    image.icc_profile = icc.map(Into::into);
    Ok(image)
}

/// Encodes gray or RGB images; 16-bit and float samples are written 16-bit.
///
/// PNG has no CMYK layout. The iCCP chunk is not written.
pub fn encode(image: &ImageData) -> IoResult<Vec<u8>> {
    let color_type = match (image.colorspace, image.alpha) {
        (Colorspace::Gray, false) => ::png::ColorType::Grayscale,
        (Colorspace::Gray, true) => ::png::ColorType::GrayscaleAlpha,
        (Colorspace::Rgb, false) => ::png::ColorType::Rgb,
        (Colorspace::Rgb, true) => ::png::ColorType::Rgba,
        (Colorspace::Cmyk, _) => {
            return Err(IoError::UnsupportedLayout("PNG cannot store CMYK".into()));
        }
    };

    let (depth, bytes) = match &image.data {
        PixelData::U8(v) => (::png::BitDepth::Eight, v.clone()),
        PixelData::U16(v) => (::png::BitDepth::Sixteen, u16_to_be_bytes(v)),
        PixelData::F32(v) => {
            let quantized: Vec<u16> = v
                .iter()
                .map(|&s| (s.clamp(0.0, 1.0) * 65535.0).round() as u16)
                .collect();
            (::png::BitDepth::Sixteen, u16_to_be_bytes(&quantized))
        }
    };

    let mut out = Vec::new();
    {
        let mut encoder = ::png::Encoder::new(&mut out, image.width, image.height);
        encoder.set_color(color_type);
        encoder.set_depth(depth);
        encoder.set_compression(::png::Compression::default());
        let mut writer = encoder
            .write_header()
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
        writer
            .write_image_data(&bytes)
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
        writer.finish().map_err(|e| IoError::EncodeError(e.to_string()))?;
    }
    Ok(out)
}

fn be_bytes_to_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect()
}

fn u16_to_be_bytes(data: &[u16]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_be_bytes()).collect()
}
