#![cfg(feature = "image-io")]

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use screenmatch::io::{
    from_internal, load_image, to_internal, view_from_gray_image, view_from_rgb_image, Layout,
};
use screenmatch::overlay::{draw_border, fill_area, save_overlay};
use screenmatch::{CorrelationMethod, Finder, Rect, ScreenMatchError};

fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x * y) % 251) as u8])
    })
}

#[test]
fn layouts_preserve_dimensions() {
    let img = DynamicImage::ImageRgb8(gradient_rgb(17, 9));

    let rgb = to_internal(&img, Layout::Rgb).unwrap();
    assert_eq!((rgb.width(), rgb.height(), rgb.channels()), (17, 9, 3));
    assert_eq!(&rgb.data()[..3], &[0, 0, 0]);

    let gray = to_internal(&img, Layout::Gray).unwrap();
    assert_eq!((gray.width(), gray.height(), gray.channels()), (17, 9, 1));
    assert_eq!(gray.data().len(), 17 * 9);
}

#[test]
fn internal_buffers_convert_back() {
    let img = DynamicImage::ImageRgb8(gradient_rgb(5, 4));
    let owned = to_internal(&img, Layout::Rgb).unwrap();
    let back = from_internal(&owned).unwrap();
    assert_eq!(back.to_rgb8(), img.to_rgb8());

    let gray = to_internal(&img, Layout::Gray).unwrap();
    assert!(matches!(from_internal(&gray).unwrap(), DynamicImage::ImageLuma8(_)));
}

#[test]
fn borrowed_views_share_the_buffer() {
    let gray = GrayImage::from_fn(6, 3, |x, y| image::Luma([(x + 10 * y) as u8]));
    let view = view_from_gray_image(&gray).unwrap();
    assert_eq!(view.row(2).unwrap(), &[20u8, 21, 22, 23, 24, 25]);

    let rgb = gradient_rgb(4, 4);
    let view = view_from_rgb_image(&rgb).unwrap();
    assert_eq!(view.channels(), 3);
    assert_eq!(view.pixel(1, 2).unwrap(), &[7u8, 26, 2]);
}

#[test]
fn color_screenshot_matches_through_the_bridge() {
    let screen = DynamicImage::ImageRgb8(gradient_rgb(80, 60));
    let source = to_internal(&screen, Layout::Rgb).unwrap();
    let crop = DynamicImage::ImageRgb8(screen.to_rgb8()).crop_imm(30, 20, 12, 10);
    let template = to_internal(&crop, Layout::Rgb).unwrap();

    let found = Finder::new()
        .match_one(
            source.view(),
            template.view(),
            CorrelationMethod::SqDiffNormed,
            0.99,
        )
        .unwrap();
    assert_eq!(found.rect(), Rect::new(30, 20, 12, 10));
}

#[test]
fn border_overlay_is_clipped_to_the_image() {
    let base = RgbImage::from_pixel(20, 20, Rgb([0, 0, 255]));
    let out = draw_border(&base, Rect::new(-5, 2, 10, 10), 2);
    assert_eq!(out.dimensions(), (20, 20));
    assert_eq!(out.get_pixel(0, 2), &Rgb([255, 0, 0]));
    assert_eq!(out.get_pixel(5, 5), &Rgb([255, 0, 0]));
    assert_eq!(out.get_pixel(2, 7), &Rgb([0, 0, 255]));
    assert_eq!(out.get_pixel(15, 15), &Rgb([0, 0, 255]));
}

#[test]
fn fill_overlay_blends_inside_the_rect_only() {
    let base = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
    let out = fill_area(&base, Rect::new(2, 2, 3, 3), 255);
    assert_eq!(out.get_pixel(3, 3), &Rgb([255, 0, 0]));
    assert_eq!(out.get_pixel(5, 5), &Rgb([0, 0, 0]));

    let half = fill_area(&base, Rect::new(0, 0, 1, 1), 128);
    let red = half.get_pixel(0, 0)[0];
    assert!((127..=128).contains(&red), "{red}");
    assert_eq!(half.get_pixel(1, 0), &Rgb([0, 0, 0]));

    let untouched = fill_area(&base, Rect::new(20, 20, 3, 3), 255);
    assert_eq!(untouched, base);
}

#[test]
fn saved_overlay_loads_back() {
    let name = format!("screenmatch-overlay-{}.png", std::process::id());
    let path = std::env::temp_dir().join(name);
    let img = draw_border(&gradient_rgb(16, 12), Rect::new(4, 4, 6, 4), 2);
    save_overlay(&img, &path).unwrap();

    let loaded = load_image(&path, Layout::Rgb).unwrap();
    assert_eq!((loaded.width(), loaded.height()), (16, 12));
    assert_eq!(loaded.data(), img.as_raw().as_slice());
    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_image("/definitely/not/here.png", Layout::Gray).unwrap_err();
    assert!(matches!(err, ScreenMatchError::ImageIo { .. }));
}
