//! MIME sniffing from magic bytes and the matching download extensions.

pub const PNG: &str = "image/png";
pub const JPEG: &str = "image/jpeg";
pub const GIF: &str = "image/gif";
pub const WEBP: &str = "image/webp";
pub const BMP: &str = "image/bmp";
pub const SVG: &str = "image/svg+xml";
pub const OCTET_STREAM: &str = "application/octet-stream";

const SVG_SNIFF_LEN: usize = 200;

pub fn detect_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => PNG,
        [0xFF, 0xD8, 0xFF, ..] => JPEG,
        [b'G', b'I', b'F', b'8', ..] => GIF,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => WEBP,
        [b'B', b'M', ..] => BMP,
        _ if looks_like_svg(bytes) => SVG,
        _ => OCTET_STREAM,
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SVG_SNIFF_LEN)];
    String::from_utf8_lossy(head).to_ascii_lowercase().contains("<svg")
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        PNG => "png",
        JPEG => "jpg",
        WEBP => "webp",
        GIF => "gif",
        BMP => "bmp",
        SVG => "svg",
        _ => "bin",
    }
}

pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}
