//! Minimal PNG encoder for viewer screenshots.
//!
//! Writes 8-bit RGB PNGs with the IDAT stream deflate-compressed via
//! miniz_oxide. Only the viewer uses this; dump files themselves are never
//! compressed.

/// Encode an RGBA pixel buffer as an RGB PNG (alpha is dropped).
///
/// `rgba` contains `width * height * 4` bytes in row-major RGBA order.
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity((width as usize * 3 + 1) * height as usize);
    for y in 0..height as usize {
        raw.push(0); // filter: None
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * 4;
            raw.push(rgba[offset]);
            raw.push(rgba[offset + 1]);
            raw.push(rgba[offset + 2]);
        }
    }
    finish_png(width, height, &raw)
}

/// Encode a 0RGB `u32` framebuffer (minifb pixel layout) as an RGB PNG.
pub fn encode_png_argb(width: u32, height: u32, pixels: &[u32]) -> Vec<u8> {
    let mut raw = Vec::with_capacity((width as usize * 3 + 1) * height as usize);
    for y in 0..height as usize {
        raw.push(0); // filter: None
        for x in 0..width as usize {
            let px = pixels[y * width as usize + x];
            raw.push((px >> 16) as u8);
            raw.push((px >> 8) as u8);
            raw.push(px as u8);
        }
    }
    finish_png(width, height, &raw)
}

fn finish_png(width: u32, height: u32, raw: &[u8]) -> Vec<u8> {
    let mut png = Vec::with_capacity(raw.len() / 2 + 1024);

    // PNG signature
    png.extend_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);

    // IHDR
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(2); // color type: RGB
    ihdr.push(0); // compression
    ihdr.push(0); // filter
    ihdr.push(0); // interlace
    write_chunk(&mut png, b"IHDR", &ihdr);

    // IDAT: zlib-wrapped deflate of the filtered rows
    let idat = miniz_oxide::deflate::compress_to_vec_zlib(raw, 6);
    write_chunk(&mut png, b"IDAT", &idat);

    write_chunk(&mut png, b"IEND", &[]);
    png
}

fn write_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    // CRC over type + data
    let crc = crc32(&chunk_type[..], data);
    out.extend_from_slice(&crc.to_be_bytes());
}

// CRC-32 (PNG/zlib)
fn crc32(chunk_type: &[u8], data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFFFFFF;
    for &b in chunk_type.iter().chain(data.iter()) {
        crc ^= b as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
        }
    }
    crc ^ 0xFFFFFFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_structure() {
        let pixels: [u32; 4] = [0xFF0000, 0x00FF00, 0x0000FF, 0xFFFFFF];
        let png = encode_png_argb(2, 2, &pixels);

        assert_eq!(&png[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
        // IHDR chunk: length 13, then dimensions big-endian
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(&png[16..20], &2u32.to_be_bytes());
        assert_eq!(&png[20..24], &2u32.to_be_bytes());
        // IDAT and IEND present
        assert!(png.windows(4).any(|w| w == b"IDAT"));
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn test_rgba_and_argb_agree() {
        let argb: [u32; 2] = [0x123456, 0xABCDEF];
        let rgba: [u8; 8] = [0x12, 0x34, 0x56, 0xFF, 0xAB, 0xCD, 0xEF, 0xFF];
        assert_eq!(encode_png_argb(2, 1, &argb), encode_png(2, 1, &rgba));
    }
}
