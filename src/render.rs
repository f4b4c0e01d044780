use crate::{CaseModel, Placement};

/// Stroke width of the case silhouette, in pixels
pub const OUTLINE_WIDTH: f32 = 2.;
/// Silhouette stroke color (RGBA)
pub const OUTLINE_COLOR: [u8; 4] = [0x33, 0x33, 0x33, 0xff];

/// Owned RGBA8 pixel buffer
#[derive(Clone, Debug)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Fully transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap an existing RGBA buffer; `None` if the length doesn't match
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize * 4).then(|| Self {
            width,
            height,
            pixels,
        })
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        let i = 4 * (y * self.width + x) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = 4 * (y * self.width + x) as usize;
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    /// Source-over blend of one pixel
    fn blend(&mut self, x: u32, y: u32, src: [u8; 4]) {
        let a = src[3] as u32;
        match a {
            0 => {}
            255 => self.put(x, y, src),
            _ => {
                let i = 4 * (y * self.width + x) as usize;
                for c in 0..3 {
                    let d = self.pixels[i + c] as u32;
                    self.pixels[i + c] = ((src[c] as u32 * a + d * (255 - a)) / 255) as u8;
                }
                let da = self.pixels[i + 3] as u32;
                self.pixels[i + 3] = (a + da * (255 - a) / 255) as u8;
            }
        }
    }
}

/// Flatten the design to a print-ready raster at the model's printable bounds.
///
/// Matches the on-screen draw order: silhouette first, then the user image
/// transformed by `placement` on top.
pub fn flatten(model: &CaseModel, placement: &Placement, image: Option<&Bitmap>) -> Bitmap {
    let [width, height] = model.bounds;
    let mut out = Bitmap::new(width, height);

    stroke_outline(&mut out);

    if let Some(image) = image {
        draw_image(&mut out, image, placement);
    }

    out
}

fn stroke_outline(out: &mut Bitmap) {
    let w = OUTLINE_WIDTH as u32;
    for y in 0..out.height {
        for x in 0..out.width {
            if x < w || y < w || x >= out.width - w || y >= out.height - w {
                out.put(x, y, OUTLINE_COLOR);
            }
        }
    }
}

/// Draw `image` centered on `placement.position`, scaled then rotated.
///
/// Inverse-maps each destination pixel center into source space and takes the
/// nearest sample, so the result matches the preview quad without resampling
/// artifacts at scale 1.
fn draw_image(out: &mut Bitmap, image: &Bitmap, placement: &Placement) {
    if placement.scale <= 0. {
        return;
    }

    let (sin, cos) = placement.rotation.to_radians().sin_cos();
    let [cx, cy] = placement.position;
    let half_w = image.width as f32 / 2.;
    let half_h = image.height as f32 / 2.;

    for y in 0..out.height {
        for x in 0..out.width {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;

            // Undo the rotation, then the scale
            let sx = (dx * cos + dy * sin) / placement.scale + half_w;
            let sy = (-dx * sin + dy * cos) / placement.scale + half_h;

            if sx < 0. || sy < 0. {
                continue;
            }
            let (sx, sy) = (sx as u32, sy as u32);
            if sx >= image.width || sy >= image.height {
                continue;
            }

            out.blend(x, y, image.get(sx, sy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const CLEAR: [u8; 4] = [0; 4];

    fn test_model() -> CaseModel {
        CaseModel {
            id: "test",
            label: "Test",
            bounds: [20, 20],
        }
    }

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Bitmap {
        let mut bitmap = Bitmap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                bitmap.put(x, y, rgba);
            }
        }
        bitmap
    }

    fn placed_at(x: f32, y: f32, scale: f32, rotation: f32) -> Placement {
        Placement {
            position: [x, y],
            scale,
            rotation,
        }
    }

    #[test]
    fn flatten_matches_model_bounds() {
        for model in crate::CASE_MODELS {
            let out = flatten(model, &Placement::default(), None);
            assert_eq!([out.width, out.height], model.bounds);
            assert_eq!(out.pixels.len(), (out.width * out.height * 4) as usize);
        }
    }

    #[test]
    fn silhouette_only_render() {
        let out = flatten(&test_model(), &Placement::default(), None);
        assert_eq!(out.get(0, 0), OUTLINE_COLOR);
        assert_eq!(out.get(19, 19), OUTLINE_COLOR);
        assert_eq!(out.get(1, 10), OUTLINE_COLOR);
        // Interior stays transparent
        assert_eq!(out.get(2, 2), CLEAR);
        assert_eq!(out.get(10, 10), CLEAR);
    }

    #[test]
    fn image_lands_centered_on_position() {
        let image = solid(2, 2, RED);
        let out = flatten(&test_model(), &placed_at(10., 10., 1., 0.), Some(&image));

        assert_eq!(out.get(9, 9), RED);
        assert_eq!(out.get(10, 10), RED);
        // One past the quad on either side
        assert_eq!(out.get(8, 10), CLEAR);
        assert_eq!(out.get(11, 10), CLEAR);
    }

    #[test]
    fn image_draws_over_silhouette() {
        let image = solid(4, 4, RED);
        let out = flatten(&test_model(), &placed_at(0., 0., 1., 0.), Some(&image));
        assert_eq!(out.get(0, 0), RED);
    }

    #[test]
    fn scale_doubles_footprint() {
        let image = solid(1, 1, RED);
        let out = flatten(&test_model(), &placed_at(10., 10., 2., 0.), Some(&image));

        assert_eq!(out.get(9, 9), RED);
        assert_eq!(out.get(10, 10), RED);
        assert_eq!(out.get(8, 8), CLEAR);
        assert_eq!(out.get(11, 11), CLEAR);
    }

    #[test]
    fn quarter_turn_swings_columns_into_rows() {
        // Red left, blue right; after 90 degrees clockwise red sits above blue
        let mut image = Bitmap::new(2, 1);
        image.put(0, 0, RED);
        image.put(1, 0, BLUE);

        let out = flatten(&test_model(), &placed_at(10., 10., 1., 90.), Some(&image));

        assert_eq!(out.get(10, 9), RED);
        assert_eq!(out.get(10, 10), BLUE);
        assert_eq!(out.get(9, 10), CLEAR);
        assert_eq!(out.get(11, 10), CLEAR);
    }

    #[test]
    fn nonpositive_scale_draws_nothing() {
        let image = solid(2, 2, RED);
        let out = flatten(&test_model(), &placed_at(10., 10., 0., 0.), Some(&image));
        assert_eq!(out.get(10, 10), CLEAR);
    }

    #[test]
    fn translucent_pixels_blend_source_over() {
        let mut out = solid(1, 1, [0, 0, 0, 255]);
        out.blend(0, 0, [255, 255, 255, 128]);

        let [r, g, b, a] = out.get(0, 0);
        assert_eq!(a, 255);
        for c in [r, g, b] {
            assert!((127..=129).contains(&c), "got {}", c);
        }
    }

    #[test]
    fn from_rgba_rejects_short_buffer() {
        assert!(Bitmap::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(Bitmap::from_rgba(2, 2, vec![0; 16]).is_some());
    }
}
