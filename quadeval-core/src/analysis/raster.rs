use image::{GrayImage, Luma};
use imageproc::{
    drawing::{draw_line_segment_mut, draw_polygon_mut},
    point::Point,
};

use crate::analysis::quad::Quad;

pub const FOREGROUND: Luma<u8> = Luma([255]);

/// Pixel counts of an intersection and a union of two masks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Overlap {
    pub intersection: u64,
    pub union: u64,
}

impl Overlap {
    /// Intersection over union, `None` when the union is empty.
    pub fn ratio(&self) -> Option<f64> {
        (self.union > 0).then(|| self.intersection as f64 / self.union as f64)
    }
}

/// Fills `quad` into a `width x height` binary mask.
///
/// Corner coordinates are truncated toward zero before filling, and parts of
/// the quad outside the canvas are clipped.
pub fn rasterize_quad(quad: &Quad, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return mask;
    }

    let mut pts: Vec<Point<i32>> = Vec::with_capacity(4);
    for p in quad.points() {
        let point = Point::new(p.x as i32, p.y as i32);
        if pts.last() != Some(&point) {
            pts.push(point);
        }
    }
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }

    match pts.as_slice() {
        [] => {}
        [single] => {
            if single.x >= 0 && single.y >= 0 && (single.x as u32) < width && (single.y as u32) < height
            {
                mask.put_pixel(single.x as u32, single.y as u32, FOREGROUND);
            }
        }
        [start, end] => draw_line_segment_mut(
            &mut mask,
            (start.x as f32, start.y as f32),
            (end.x as f32, end.y as f32),
            FOREGROUND,
        ),
        polygon => draw_polygon_mut(&mut mask, polygon, FOREGROUND),
    }

    mask
}

fn is_set(pixel: &Luma<u8>) -> bool {
    pixel.0[0] > 0
}

/// Overlap of the filled pixels of two equally sized masks.
pub fn foreground_overlap(a: &GrayImage, b: &GrayImage) -> Overlap {
    count_overlap(a, b, |pa, pb| (is_set(pa), is_set(pb)))
}

/// Overlap of the unfilled pixels of two equally sized masks.
pub fn background_overlap(a: &GrayImage, b: &GrayImage) -> Overlap {
    count_overlap(a, b, |pa, pb| (!is_set(pa), !is_set(pb)))
}

fn count_overlap<F>(a: &GrayImage, b: &GrayImage, classify: F) -> Overlap
where
    F: Fn(&Luma<u8>, &Luma<u8>) -> (bool, bool),
{
    debug_assert_eq!(a.dimensions(), b.dimensions());

    a.pixels()
        .zip(b.pixels())
        .fold(Overlap::default(), |mut acc, (pa, pb)| {
            let (in_a, in_b) = classify(pa, pb);
            if in_a && in_b {
                acc.intersection += 1;
            }
            if in_a || in_b {
                acc.union += 1;
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(coords: [[f64; 2]; 4]) -> Quad {
        Quad::from_coords(&coords).unwrap()
    }

    fn filled(mask: &GrayImage) -> u64 {
        mask.pixels().filter(|p| is_set(p)).count() as u64
    }

    #[test]
    fn test_rasterize_inside_pixels() {
        let mask = rasterize_quad(&quad([[2.0, 2.0], [8.0, 2.0], [8.0, 8.0], [2.0, 8.0]]), 20, 20);
        assert!(is_set(mask.get_pixel(5, 5)));
        assert!(!is_set(mask.get_pixel(15, 15)));
        assert!(!is_set(mask.get_pixel(0, 0)));
    }

    #[test]
    fn test_rasterize_clips_to_canvas() {
        let mask = rasterize_quad(
            &quad([[-50.0, -50.0], [50.0, -50.0], [50.0, 50.0], [-50.0, 50.0]]),
            10,
            10,
        );
        assert_eq!(filled(&mask), 100);
    }

    #[test]
    fn test_rasterize_collapsed_quads() {
        let point = rasterize_quad(&quad([[3.2, 4.9], [3.7, 4.1], [3.0, 4.0], [3.9, 4.5]]), 10, 10);
        assert_eq!(filled(&point), 1);
        assert!(is_set(point.get_pixel(3, 4)));

        let line = rasterize_quad(&quad([[1.0, 1.0], [1.0, 1.0], [6.0, 1.0], [6.0, 1.0]]), 10, 10);
        assert!(is_set(line.get_pixel(3, 1)));
        assert!(!is_set(line.get_pixel(3, 2)));

        let empty_canvas = rasterize_quad(&quad([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]), 0, 5);
        assert_eq!(filled(&empty_canvas), 0);
    }

    #[test]
    fn test_overlap_counts() {
        let a = rasterize_quad(&quad([[0.0, 0.0], [4.0, 0.0], [4.0, 9.0], [0.0, 9.0]]), 10, 10);
        let b = rasterize_quad(&quad([[0.0, 0.0], [4.0, 0.0], [4.0, 9.0], [0.0, 9.0]]), 10, 10);

        let fg = foreground_overlap(&a, &b);
        assert_eq!(fg.intersection, fg.union);
        assert_eq!(fg.ratio(), Some(1.0));

        let bg = background_overlap(&a, &b);
        assert_eq!(bg.intersection + fg.union, 100);
        assert_eq!(bg.ratio(), Some(1.0));
    }

    #[test]
    fn test_overlap_ratio_of_empty_union() {
        assert_eq!(Overlap::default().ratio(), None);
    }
}
