//! TIFF format support.
//!
//! Gray, RGB and CMYK at 8 and 16 bits, gray and RGB(A) as 32-bit float.
//! The ICC profile lives in tag 34675.

use crate::{DecodeLimits, IoError, IoResult};
use cyan_core::{Colorspace, ImageData, PixelData};
use std::io::Cursor;
use tiff::tags::Tag;

const ICC_TAG: u16 = 34675;

fn decode_err(e: tiff::TiffError) -> IoError {
    IoError::DecodeError(e.to_string())
}

fn encode_err(e: tiff::TiffError) -> IoError {
    IoError::EncodeError(e.to_string())
}

/// Decodes TIFF bytes (first directory only).
pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> IoResult<ImageData> {
    use tiff::ColorType;
    use tiff::decoder::{Decoder, DecodingResult};

    let mut decoder = Decoder::new(Cursor::new(bytes)).map_err(decode_err)?;
    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let color_type = decoder.colortype().map_err(decode_err)?;

    let (colorspace, alpha, bits) = match color_type {
        ColorType::Gray(b) => (Colorspace::Gray, false, b),
        ColorType::GrayA(b) => (Colorspace::Gray, true, b),
        ColorType::RGB(b) => (Colorspace::Rgb, false, b),
        ColorType::RGBA(b) => (Colorspace::Rgb, true, b),
        ColorType::CMYK(b) => (Colorspace::Cmyk, false, b),
        other => return Err(IoError::UnsupportedLayout(format!("TIFF {other:?}"))),
    };
    let channels = colorspace.color_channels() + alpha as u32;
    limits.check(width, height, channels, (bits as usize).div_ceil(8))?;

    let icc = decoder
        .get_tag_u8_vec(Tag::from_u16_exhaustive(ICC_TAG))
        .ok()
        .filter(|v| !v.is_empty());

    let data = match (bits, decoder.read_image().map_err(decode_err)?) {
        (8, DecodingResult::U8(buf)) => PixelData::U8(buf),
        (16, DecodingResult::U16(buf)) => PixelData::U16(buf),
        (32, DecodingResult::F32(buf)) if colorspace != Colorspace::Cmyk => PixelData::F32(buf),
        (bits, _) => {
            return Err(IoError::UnsupportedLayout(format!(
                "TIFF {color_type:?} with {bits}-bit samples"
            )));
        }
    };

    let mut image = ImageData::from_data(width, height, colorspace, alpha, data)?;
    image.icc_profile = icc.map(Into::into);
    Ok(image)
}

/// Encodes an image as uncompressed strips, embedding its profile.
pub fn encode(image: &ImageData) -> IoResult<Vec<u8>> {
    use tiff::encoder::colortype;

    let mut cursor = Cursor::new(Vec::new());
    let icc = image.icc_profile.as_deref();
    let (w, h) = (image.width, image.height);
    {
        let mut encoder = tiff::encoder::TiffEncoder::new(&mut cursor).map_err(encode_err)?;
        let enc = &mut encoder;
        match (&image.data, image.colorspace, image.alpha) {
            (PixelData::U8(d), Colorspace::Gray, false) => write::<_, colortype::Gray8>(enc, w, h, d, icc),
            (PixelData::U8(d), Colorspace::Rgb, false) => write::<_, colortype::RGB8>(enc, w, h, d, icc),
            (PixelData::U8(d), Colorspace::Rgb, true) => write::<_, colortype::RGBA8>(enc, w, h, d, icc),
            (PixelData::U8(d), Colorspace::Cmyk, false) => write::<_, colortype::CMYK8>(enc, w, h, d, icc),
            (PixelData::U16(d), Colorspace::Gray, false) => write::<_, colortype::Gray16>(enc, w, h, d, icc),
            (PixelData::U16(d), Colorspace::Rgb, false) => write::<_, colortype::RGB16>(enc, w, h, d, icc),
            (PixelData::U16(d), Colorspace::Rgb, true) => write::<_, colortype::RGBA16>(enc, w, h, d, icc),
            (PixelData::U16(d), Colorspace::Cmyk, false) => write::<_, colortype::CMYK16>(enc, w, h, d, icc),
            (PixelData::F32(d), Colorspace::Gray, false) => write::<_, colortype::Gray32Float>(enc, w, h, d, icc),
            (PixelData::F32(d), Colorspace::Rgb, false) => write::<_, colortype::RGB32Float>(enc, w, h, d, icc),
            (PixelData::F32(d), Colorspace::Rgb, true) => write::<_, colortype::RGBA32Float>(enc, w, h, d, icc),
            (data, cs, alpha) => Err(IoError::UnsupportedLayout(format!(
                "TIFF {cs}{} {:?}",
                if alpha { "+alpha" } else { "" },
                data.format()
            ))),
        }?;
    }
    Ok(cursor.into_inner())
}

fn write<W, C>(
    encoder: &mut tiff::encoder::TiffEncoder<W>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    icc: Option<&[u8]>,
) -> IoResult<()>
where
    W: std::io::Write + std::io::Seek,
    C: tiff::encoder::colortype::ColorType,
    [C::Inner]: tiff::encoder::TiffValue,
{
    let mut image = encoder.new_image::<C>(width, height).map_err(encode_err)?;
    if let Some(icc) = icc {
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(ICC_TAG), icc)
            .map_err(encode_err)?;
    }
    image.write_data(data).map_err(encode_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyan_core::SampleFormat;

    /// Profile-sized payload; any real ICC is at least its 128-byte header,
    /// so it never fits inline in the tag entry.
    fn fake_icc() -> Vec<u8> {
        (0..300u32).map(|i| (i * 7 % 251) as u8).collect()
    }

    #[test]
    fn test_cmyk16_roundtrip_with_icc() {
        let data = PixelData::U16((0..2 * 2 * 4).map(|i| i as u16 * 4000).collect());
        let image = ImageData::from_data(2, 2, Colorspace::Cmyk, false, data)
            .unwrap()
            .with_icc_profile(fake_icc());
        let back = decode(&encode(&image).unwrap(), &DecodeLimits::unlimited()).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn test_rgba_float() {
        let image = ImageData::filled(3, 2, Colorspace::Rgb, true, SampleFormat::F32, &[0.1, 0.2, 0.3, 0.4]).unwrap();
        let back = decode(&encode(&image).unwrap(), &DecodeLimits::unlimited()).unwrap();
        assert_eq!(back.data, image.data);
        assert!(back.icc_profile.is_none());
    }

    #[test]
    fn test_gray_alpha_unsupported_on_write() {
        let image = ImageData::new(1, 1, Colorspace::Gray, true, SampleFormat::U8).unwrap();
        assert!(matches!(encode(&image), Err(IoError::UnsupportedLayout(_))));
    }
}
