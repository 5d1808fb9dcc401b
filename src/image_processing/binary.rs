use super::convert::MonochromeBitmap;

/// Framebuffer memory layouts understood by SSD1306-class controllers
///
/// The discriminants are the values stored in the ANM header's address mode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// 8-row pages laid out left to right, one byte per column per page
    Horizontal,
    /// 8-row pages laid out top to bottom, one column after the other
    Vertical,
    /// Plain row-major bitmap, most significant bit first
    Linear,
}

impl AddressMode {
    /// Value written to the ANM header
    pub fn header_id(self) -> u8 {
        match self {
            AddressMode::Horizontal => 0,
            AddressMode::Vertical => 1,
            AddressMode::Linear => 2,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AddressMode::Horizontal => "Horizontal",
            AddressMode::Vertical => "Vertical",
            AddressMode::Linear => "Linear",
        }
    }

    /// Byte offset and bit mask of pixel (x, y) in a width x height framebuffer
    #[inline]
    fn locate(self, x: u32, y: u32, width: u32, height: u32) -> (usize, u8) {
        match self {
            AddressMode::Horizontal => ((x + (y / 8) * width) as usize, 1 << (y % 8)),
            AddressMode::Vertical => ((x * (height / 8) + y / 8) as usize, 1 << (y % 8)),
            AddressMode::Linear => ((y * (width / 8) + x / 8) as usize, 0x80 >> (x % 8)),
        }
    }
}

/// Reusable packed frame buffer, `(width * height) / 8` bytes
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; packed_size(width, height)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Number of bytes one packed frame occupies
pub fn packed_size(width: u32, height: u32) -> usize {
    (width as usize * height as usize) / 8
}

/// Pack a monochrome bitmap into `framebuffer` using the given addressing mode
///
/// Every bit of the framebuffer is written: lit pixels set their bit, unlit
/// pixels clear it. Whatever the buffer held from a previous frame is irrelevant.
///
/// Width and height must be multiples of 8 and match the framebuffer geometry.
pub fn pack(mode: AddressMode, bitmap: &MonochromeBitmap, framebuffer: &mut Framebuffer) {
    let (width, height) = bitmap.dimensions();
    debug_assert_eq!((width, height), (framebuffer.width, framebuffer.height));
    debug_assert!(width % 8 == 0 && height % 8 == 0);

    let data = &mut framebuffer.data;
    for y in 0..height {
        for x in 0..width {
            let (index, mask) = mode.locate(x, y, width, height);
            if bitmap.is_lit(x, y) {
                data[index] |= mask;
            } else {
                data[index] &= !mask;
            }
        }
    }
}

/// Convenience wrapper around [`pack`] that allocates a fresh buffer
pub fn pack_to_vec(mode: AddressMode, bitmap: &MonochromeBitmap) -> Vec<u8> {
    let (width, height) = bitmap.dimensions();
    let mut framebuffer = Framebuffer::new(width, height);
    pack(mode, bitmap, &mut framebuffer);
    framebuffer.data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> MonochromeBitmap {
        MonochromeBitmap::from_fn(width, height, |x, y| (x * 7 + y * 3) % 5 < 2)
    }

    #[test]
    fn test_framebuffer_size() {
        let fb = Framebuffer::new(128, 64);
        assert_eq!(fb.len(), 1024);
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(packed_size(64, 32), 256);
    }

    #[test]
    fn test_horizontal_round_trip() {
        for &(w, h) in &[(8, 8), (64, 32), (128, 64), (24, 16)] {
            let bmp = checkerboard(w, h);
            let data = pack_to_vec(AddressMode::Horizontal, &bmp);
            assert_eq!(data.len(), packed_size(w, h));

            for y in 0..h {
                for x in 0..w {
                    let byte = data[(x + (y / 8) * w) as usize];
                    let bit = (byte >> (y % 8)) & 1 == 1;
                    assert_eq!(bit, bmp.is_lit(x, y), "pixel ({}, {}) in {}x{}", x, y, w, h);
                }
            }
        }
    }

    #[test]
    fn test_horizontal_page_layout() {
        // Top pixel of the first column is bit 0 of byte 0
        let bmp = MonochromeBitmap::from_fn(16, 16, |x, y| x == 0 && y == 0);
        let data = pack_to_vec(AddressMode::Horizontal, &bmp);
        assert_eq!(data[0], 0x01);
        assert!(data[1..].iter().all(|&b| b == 0));

        // Row 9 lands on the second page, bit 1
        let bmp = MonochromeBitmap::from_fn(16, 16, |x, y| x == 3 && y == 9);
        let data = pack_to_vec(AddressMode::Horizontal, &bmp);
        assert_eq!(data[3 + 16], 0x02);
    }

    #[test]
    fn test_linear_is_msb_first() {
        let bmp = MonochromeBitmap::from_fn(16, 8, |x, y| x == 0 && y == 0);
        let data = pack_to_vec(AddressMode::Linear, &bmp);
        assert_eq!(data[0], 0x80);
        assert!(data[1..].iter().all(|&b| b == 0));

        let bmp = MonochromeBitmap::from_fn(16, 8, |x, y| x == 15 && y == 1);
        let data = pack_to_vec(AddressMode::Linear, &bmp);
        assert_eq!(data[1 * 2 + 1], 0x01);
    }

    #[test]
    fn test_vertical_ssd1306_layout() {
        // On a 64-row panel pixel (x, y) lives in byte x*8 + y/8
        let bmp = MonochromeBitmap::from_fn(128, 64, |x, y| x == 5 && y == 42);
        let data = pack_to_vec(AddressMode::Vertical, &bmp);
        assert_eq!(data[5 * 8 + 42 / 8], 1 << (42 % 8));
        assert_eq!(data.iter().filter(|&&b| b != 0).count(), 1);
    }

    #[test]
    fn test_vertical_independent_of_width() {
        let (x, y) = (3, 21);
        let mut positions = Vec::new();
        for &w in &[8, 16, 64, 128] {
            let bmp = MonochromeBitmap::from_fn(w, 64, |px, py| px == x && py == y);
            let data = pack_to_vec(AddressMode::Vertical, &bmp);
            let index = data.iter().position(|&b| b != 0).unwrap();
            positions.push(index);
        }
        assert!(positions.iter().all(|&p| p == (x * 8 + y / 8) as usize));
    }

    #[test]
    fn test_stale_buffer_is_fully_overwritten() {
        let first = MonochromeBitmap::from_fn(32, 16, |_, _| true);
        let second = checkerboard(32, 16);

        for mode in [AddressMode::Horizontal, AddressMode::Vertical, AddressMode::Linear] {
            let mut fb = Framebuffer::new(32, 16);
            pack(mode, &first, &mut fb);
            assert!(fb.as_bytes().iter().all(|&b| b == 0xFF));

            pack(mode, &second, &mut fb);
            assert_eq!(fb.as_bytes(), pack_to_vec(mode, &second).as_slice(), "{:?}", mode);
        }
    }

    #[test]
    fn test_header_ids() {
        assert_eq!(AddressMode::Horizontal.header_id(), 0);
        assert_eq!(AddressMode::Vertical.header_id(), 1);
        assert_eq!(AddressMode::Linear.header_id(), 2);
    }
}
