use screenmatch::lowlevel::CorrelationPlan;
use screenmatch::{
    CorrelationMethod, CorrelationSurface, ImageView, MatchResult, NotFound, OwnedImage, Rect,
    ScreenMatchError,
};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        ScreenMatchError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );
    assert!(err.is_invalid_input());
}

#[test]
fn image_view_rejects_invalid_stride_and_small_buffer() {
    let data = [0u8; 8];
    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        ScreenMatchError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );

    let err = ImageView::from_interleaved(&data, 2, 2, 3).err().unwrap();
    assert_eq!(err, ScreenMatchError::BufferTooSmall { needed: 12, got: 8 });
}

#[test]
fn region_view_maps_rect_to_roi() {
    let data: Vec<u8> = (0u8..16).collect();
    let view = ImageView::from_slice(&data, 4, 4).unwrap();

    let sub = view.region(Some(Rect::new(1, 2, 2, 2))).unwrap();
    assert_eq!((sub.width(), sub.height(), sub.stride()), (2, 2, 4));
    assert_eq!(sub.row(0).unwrap(), &[9u8, 10]);
    assert_eq!(sub.row(1).unwrap(), &[13u8, 14]);

    let whole = view.region(None).unwrap();
    assert_eq!(whole.width(), 4);

    let err = view.region(Some(Rect::new(3, 3, 2, 2))).err().unwrap();
    assert_eq!(
        err,
        ScreenMatchError::RoiOutOfBounds {
            x: 3,
            y: 3,
            width: 2,
            height: 2,
            img_width: 4,
            img_height: 4,
        }
    );
    assert!(view.region(Some(Rect::new(-1, 0, 2, 2))).is_err());
}

#[test]
fn whole_region_works_for_non_copy_elements() {
    let data: Vec<String> = (0..6).map(|i| i.to_string()).collect();
    let view = ImageView::from_slice(&data, 3, 2).unwrap();

    let whole = view.region(None).unwrap();
    assert_eq!((whole.width(), whole.height(), whole.stride()), (3, 2, 3));
    assert_eq!(whole.row(1).unwrap()[2], "5");
}

#[test]
fn interleaved_pixels_are_addressed_per_channel() {
    let data: Vec<u8> = (0u8..12).collect();
    let view = ImageView::from_interleaved(&data, 2, 2, 3).unwrap();
    assert_eq!(view.channels(), 3);
    assert_eq!(view.pixel(1, 0).unwrap(), &[3u8, 4, 5]);
    assert_eq!(view.pixel(0, 1).unwrap(), &[6u8, 7, 8]);
    assert!(view.pixel(2, 0).is_none());
}

#[test]
fn correlation_plan_collects_per_channel_sums() {
    let data = [1u8, 10, 2, 20, 3, 30, 4, 40];
    let view = ImageView::from_interleaved(&data, 2, 2, 2).unwrap();
    let plan = CorrelationPlan::from_view(view).unwrap();

    assert_eq!(plan.pixel_count(), 4);
    assert_eq!(plan.element_count(), 8);
    assert_eq!(&plan.sums()[..2], &[10.0, 100.0]);
    let expected_sq: f64 = data.iter().map(|&v| f64::from(v).powi(2)).sum();
    assert_eq!(plan.sum_sq(), expected_sq);
}

#[test]
fn surface_extremum_keeps_first_location_on_ties() {
    let surface = CorrelationSurface::new(3, 2, vec![0.5, 0.9, 0.1, 0.9, 0.1, 0.4]).unwrap();
    let ext = surface.extremum().unwrap();
    assert_eq!(ext.max_loc, (1, 0));
    assert_eq!(ext.min_loc, (2, 0));
    assert!(!ext.is_degenerate());

    let flat = CorrelationSurface::filled(4, 4, 1.0).unwrap();
    assert!(flat.extremum().unwrap().is_degenerate());

    assert!(CorrelationSurface::new(2, 2, vec![0.0; 3]).is_err());
}

#[test]
fn owned_image_round_trips_through_view() {
    let img = OwnedImage::new(vec![1, 2, 3, 4, 5, 6], 3, 2).unwrap();
    let copy = OwnedImage::from_view(img.view()).unwrap();
    assert_eq!(copy.data(), img.data());
    assert_eq!((copy.width(), copy.height(), copy.channels()), (3, 2, 1));
}

#[test]
fn not_found_message_mentions_count_and_region() {
    let single = ScreenMatchError::NotFound(NotFound {
        best_rect: None,
        best_confidence: 0.42,
        threshold: 0.9,
        tried: 1,
        region: None,
    });
    let text = single.to_string();
    assert!(text.starts_with("failed to find the template image in the source image"));
    assert!(text.contains("0.42"));

    let many = ScreenMatchError::NotFound(NotFound {
        best_rect: Some(Rect::new(1, 2, 3, 4)),
        best_confidence: 0.5,
        threshold: 0.9,
        tried: 3,
        region: Some(Rect::new(10, 20, 30, 40)),
    });
    let text = many.to_string();
    assert!(text.contains("one of 3 template images"));
    assert!(text.contains("(10, 20, 30, 40)"));
    assert_eq!(many.not_found().map(|nf| nf.tried), Some(3));
    assert!(!many.is_invalid_input());
}

#[test]
fn correlation_methods_report_polarity_and_names() {
    let minimizing: Vec<_> = CorrelationMethod::ALL
        .iter()
        .filter(|m| m.seeks_minimum())
        .collect();
    assert_eq!(
        minimizing,
        [&CorrelationMethod::SqDiff, &CorrelationMethod::SqDiffNormed]
    );
    assert_eq!(CorrelationMethod::default(), CorrelationMethod::SqDiffNormed);
    assert_eq!(CorrelationMethod::CCorrNormed.to_string(), "ccorr_normed");
}

#[test]
fn match_result_exposes_rect_and_confidence() {
    let found = MatchResult::new(Rect::new(5, 6, 7, 8), 0.75);
    assert_eq!(found.rect(), Rect::new(5, 6, 7, 8));
    assert_eq!(found.confidence(), 0.75);
}
