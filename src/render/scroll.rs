use image::{Rgba, RgbaImage};

/// Fixed-size chat history image that only ever grows at the bottom.
#[derive(Clone, Debug)]
pub struct ScrollBuffer {
    image: RgbaImage,
    base: Rgba<u8>,
}

impl ScrollBuffer {
    /// `width` × `height` buffer filled with `base`.
    pub fn new(width: u32, height: u32, base: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, base),
            base,
        }
    }

    /// Current pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Mutable pixels, for painting animated items in place.
    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Buffer height.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Refill with the base color.
    pub fn reset(&mut self) {
        for px in self.image.pixels_mut() {
            *px = self.base;
        }
    }

    /// Shift contents up by `block.height()` rows and paste `block` at the bottom.
    ///
    /// A block taller than the buffer keeps only its bottom rows.
    pub fn push(&mut self, block: &RgbaImage) {
        let (w, h) = self.image.dimensions();
        let dh = block.height().min(h);
        let stride = w as usize * 4;
        let shift = dh as usize * stride;

        let buf: &mut [u8] = &mut self.image;
        buf.copy_within(shift.., 0);

        let src_top = block.height() - dh;
        let copy_w = block.width().min(w);
        let dst_top = h - dh;
        for y in 0..dh {
            let src_row = (src_top + y) as usize * block.width() as usize * 4;
            let dst_row = (dst_top + y) as usize * stride;
            let row_bytes = copy_w as usize * 4;
            buf[dst_row..dst_row + row_bytes]
                .copy_from_slice(&block.as_raw()[src_row..src_row + row_bytes]);
            for px in buf[dst_row + row_bytes..dst_row + stride].chunks_exact_mut(4) {
                px.copy_from_slice(&self.base.0);
            }
        }
    }
}
