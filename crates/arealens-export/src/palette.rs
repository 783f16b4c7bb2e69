//! Display colors for shapes, assigned by sequence number.

use image::Rgb;

/// Stroke colors cycled through in shape order.
pub const PALETTE: [Rgb<u8>; 6] = [
    Rgb([0xff, 0x6b, 0x6b]),
    Rgb([0x4e, 0xcd, 0xc4]),
    Rgb([0x45, 0xb7, 0xd1]),
    Rgb([0xf9, 0xca, 0x24]),
    Rgb([0xa2, 0x9b, 0xfe]),
    Rgb([0x6a, 0xb0, 0x4c]),
];

/// Color for the shape at zero-based `index`.
#[must_use]
pub const fn palette_color(index: usize) -> Rgb<u8> {
    PALETTE[index % PALETTE.len()]
}

/// `#rrggbb` form of a color.
#[must_use]
pub fn hex(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        assert_eq!(palette_color(0), PALETTE[0]);
        assert_eq!(palette_color(PALETTE.len()), PALETTE[0]);
        assert_eq!(palette_color(PALETTE.len() + 2), PALETTE[2]);
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex(PALETTE[0]), "#ff6b6b");
        assert_eq!(hex(Rgb([0, 10, 255])), "#000aff");
    }
}
