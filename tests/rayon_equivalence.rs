#![cfg(feature = "rayon")]

use screenmatch::lowlevel::{correlate_par, correlate_scalar, CorrelationPlan};
use screenmatch::{
    CorrelationMethod, Finder, FinderConfig, ImageView, NativeBackend, NativeConfig, OwnedImage,
    Rect, SelectionPolicy,
};

fn make_pattern(width: usize, height: usize, channels: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let value = ((x * 11) ^ (y * 3) ^ (x * y) ^ (c * 71)) & 0xFF;
                data.push(value as u8);
            }
        }
    }
    data
}

#[test]
fn parallel_surfaces_equal_sequential_for_every_method() {
    for channels in [1, 3] {
        let (w, h) = (90, 70);
        let img = make_pattern(w, h, channels);
        let view = ImageView::from_interleaved(&img, w, h, channels).unwrap();
        let tpl = view.roi(31, 17, 14, 11).unwrap();
        let plan = CorrelationPlan::from_view(tpl).unwrap();

        for method in CorrelationMethod::ALL {
            let seq = correlate_scalar(view, &plan, method.kernel()).unwrap();
            let par = correlate_par(view, &plan, method.kernel()).unwrap();
            assert_eq!(seq, par, "{method} with {channels} channels");
        }
    }
}

#[test]
fn parallel_backend_gives_identical_matches() {
    let (w, h) = (120, 80);
    let img = make_pattern(w, h, 1);
    let source = ImageView::from_slice(&img, w, h).unwrap();
    let a = OwnedImage::from_view(source.roi(70, 40, 16, 12).unwrap()).unwrap();
    let b = OwnedImage::from_view(source.roi(10, 5, 20, 10).unwrap()).unwrap();
    let templates = [a.view(), b.view()];

    let config = FinderConfig::default().with_selection(SelectionPolicy::GlobalBest);
    let sequential = Finder::new().with_config(config);
    let parallel = Finder::with_backend(NativeBackend::new(NativeConfig {
        parallel: true,
        ..NativeConfig::default()
    }))
    .with_config(config);

    let region = Some(Rect::new(0, 0, 100, 60));
    for method in CorrelationMethod::ALL {
        let seq = sequential.match_best(source, &templates, method, 0.0, region);
        let par = parallel.match_best(source, &templates, method, 0.0, region);
        assert_eq!(seq, par, "{method}");
    }
}
