//! Defect masks and annotated overlays from polygon label files.
//!
//! The mask is a single-channel image of the source's size with every
//! labelled polygon filled at 255 on a zero background. The overlay is the
//! source image with each polygon outlined one pixel wide in red.

mod label;

pub use label::{from_label_slice, from_label_str, read_label_file, LabelFile, Shape};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_polygon_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::error::LabelReconError;

/// Mask value inside labelled regions.
pub const MASK_FOREGROUND: Luma<u8> = Luma([255]);
/// Outline colour on the overlay.
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Suffix appended to the image stem for the overlay file.
pub const OVERLAY_SUFFIX: &str = "_vis";

/// A rendered mask and overlay pair.
#[derive(Clone, Debug)]
pub struct MaskAndOverlay {
    pub mask: GrayImage,
    pub overlay: RgbImage,
}

/// Files written by [`write_mask_outputs`].
#[derive(Clone, Debug)]
pub struct MaskOutputs {
    pub mask: PathBuf,
    pub overlay: Option<PathBuf>,
}

/// Renders the mask and overlay for `image_path` from `label_path`.
pub fn render_mask_and_overlay(
    image_path: &Path,
    label_path: &Path,
) -> Result<MaskAndOverlay, LabelReconError> {
    let overlay = image::open(image_path)
        .map_err(|source| LabelReconError::ImageRead {
            path: image_path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    let labels = read_label_file(label_path)?;

    Ok(draw_shapes(overlay, &labels))
}

/// Like [`render_mask_and_overlay`], but any failure yields `None`.
pub fn mask_and_overlay(image_path: &Path, label_path: &Path) -> Option<MaskAndOverlay> {
    match render_mask_and_overlay(image_path, label_path) {
        Ok(rendered) => Some(rendered),
        Err(err) => {
            log::debug!("no mask for {}: {}", image_path.display(), err);
            None
        }
    }
}

/// Draws every shape of `labels` into a fresh mask and onto `overlay`.
pub fn draw_shapes(mut overlay: RgbImage, labels: &LabelFile) -> MaskAndOverlay {
    let mut mask = GrayImage::new(overlay.width(), overlay.height());
    let limit = coordinate_limit(overlay.width(), overlay.height());

    for shape in &labels.shapes {
        let contour = normalize_contour(clamp_contour(shape.polygon(), limit));
        fill_contour(&mut mask, &contour);
        outline_contour(&mut overlay, &contour);
    }

    MaskAndOverlay { mask, overlay }
}

/// Writes the mask as `<out_dir>/<image file name>` and, when asked, the
/// overlay as `<out_dir>/<stem>_vis.<ext>`.
pub fn write_mask_outputs(
    rendered: &MaskAndOverlay,
    image_path: &Path,
    out_dir: &Path,
    with_overlay: bool,
) -> Result<MaskOutputs, LabelReconError> {
    fs::create_dir_all(out_dir)?;

    let file_name = image_path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("image path {} has no file name", image_path.display()),
        )
    })?;
    let mask_path = out_dir.join(file_name);
    save_image(&rendered.mask, &mask_path)?;

    let overlay_path = if with_overlay {
        let path = out_dir.join(overlay_file_name(image_path));
        save_image(&rendered.overlay, &path)?;
        Some(path)
    } else {
        None
    };

    Ok(MaskOutputs {
        mask: mask_path,
        overlay: overlay_path,
    })
}

fn save_image<P>(
    img: &image::ImageBuffer<P, Vec<P::Subpixel>>,
    path: &Path,
) -> Result<(), LabelReconError>
where
    P: image::PixelWithColorType,
    [P::Subpixel]: image::EncodableLayout,
{
    img.save(path).map_err(|source| LabelReconError::ImageWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn overlay_file_name(image_path: &Path) -> String {
    let stem = image_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    match image_path.extension() {
        Some(ext) => format!("{}{}.{}", stem, OVERLAY_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, OVERLAY_SUFFIX),
    }
}

/// Largest vertex magnitude handed to the drawing routines, which do
/// unchecked `i32` arithmetic on coordinates.
fn coordinate_limit(width: u32, height: u32) -> i32 {
    let span = i64::from(width.max(height)) * 2 + 1;
    span.min(i64::from(i32::MAX / 4)) as i32
}

/// Pulls vertices far outside the image into `[-limit, limit]`.
fn clamp_contour(points: Vec<Point<i32>>, limit: i32) -> Vec<Point<i32>> {
    points
        .into_iter()
        .map(|p| Point::new(p.x.clamp(-limit, limit), p.y.clamp(-limit, limit)))
        .collect()
}

/// Drops repeated consecutive vertices and a closing vertex equal to the
/// first one; the drawing routines close contours themselves.
fn normalize_contour(mut points: Vec<Point<i32>>) -> Vec<Point<i32>> {
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn fill_contour(mask: &mut GrayImage, contour: &[Point<i32>]) {
    match contour {
        [] => {}
        [only] => put_if_inside(mask, *only, MASK_FOREGROUND),
        [a, b] => draw_line_segment_mut(mask, as_f32(*a), as_f32(*b), MASK_FOREGROUND),
        _ => draw_polygon_mut(mask, contour, MASK_FOREGROUND),
    }
}

fn outline_contour(overlay: &mut RgbImage, contour: &[Point<i32>]) {
    match contour {
        [] => {}
        [only] => put_if_inside(overlay, *only, OUTLINE_COLOR),
        _ => {
            let points: Vec<Point<f32>> = contour
                .iter()
                .map(|p| Point::new(p.x as f32, p.y as f32))
                .collect();
            draw_hollow_polygon_mut(overlay, &points, OUTLINE_COLOR);
        }
    }
}

fn as_f32(p: Point<i32>) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

fn put_if_inside<P: image::Pixel>(
    img: &mut image::ImageBuffer<P, Vec<P::Subpixel>>,
    p: Point<i32>,
    color: P,
) {
    if p.x >= 0 && p.y >= 0 && (p.x as u32) < img.width() && (p.y as u32) < img.height() {
        img.put_pixel(p.x as u32, p.y as u32, color);
    }
}
