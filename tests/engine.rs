use imdedup::cluster::{DedupEngine, SourceImage};
use imdedup::config::{DedupOptions, SiftOptions};
use opencv::core::{CV_8UC1, Mat, Scalar, Size, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc};
use rstest::rstest;

/// 生成带固定随机纹理的测试图片，种子不同则内容完全不同
fn noise_image(seed: u64) -> Mat {
    let mut img = Mat::new_rows_cols_with_default(256, 256, CV_8UC1, Scalar::all(0.)).unwrap();
    let mut state = seed.wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(1);
    for y in 0..256 {
        for x in 0..256 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            *img.at_2d_mut::<u8>(y, x).unwrap() = (state >> 56) as u8;
        }
    }
    img
}

fn flat_image() -> Mat {
    Mat::new_rows_cols_with_default(256, 256, CV_8UC1, Scalar::all(128.)).unwrap()
}

fn blurred(img: &Mat) -> Mat {
    let mut out = Mat::default();
    imgproc::gaussian_blur_def(img, &mut out, Size::new(63, 63), 20.).unwrap();
    out
}

fn encode(img: &Mat, ext: &str) -> Vec<u8> {
    let mut buf = Vector::<u8>::new();
    imgcodecs::imencode_def(ext, img, &mut buf).unwrap();
    buf.to_vec()
}

fn image(name: &str, data: Vec<u8>) -> SourceImage {
    SourceImage { name: name.to_string(), data }
}

fn engine() -> DedupEngine {
    DedupEngine::new(SiftOptions::default(), DedupOptions::default()).unwrap()
}

#[test]
fn exact_duplicates_collapse() {
    let a = encode(&noise_image(1), ".png");

    let report = engine()
        .run(vec![image("a.png", a.clone()), image("a_copy.png", a)])
        .unwrap();

    assert_eq!(report.canonical, ["a.png"]);
    assert!(report.duplicates["a.png"].is_empty());
    assert_eq!(report.excluded, 1);
}

#[test]
fn reencoded_image_is_a_duplicate() {
    // 像素相同、字节不同：指纹不同，但描述符完全一致
    let img = noise_image(2);

    let report = engine()
        .run(vec![image("x.png", encode(&img, ".png")), image("x.bmp", encode(&img, ".bmp"))])
        .unwrap();

    assert_eq!(report.canonical, ["x.png"]);
    assert_eq!(report.duplicates["x.png"], ["x.bmp"]);
    assert_eq!(report.excluded, 0);
}

#[test]
fn distinct_images_get_their_own_clusters() {
    let report = engine()
        .run(vec![
            image("a.png", encode(&noise_image(3), ".png")),
            image("b.png", encode(&noise_image(4), ".png")),
        ])
        .unwrap();

    assert_eq!(report.canonical, ["a.png", "b.png"]);
    assert_eq!(report.excluded, 0);
}

#[rstest]
#[case::flat(flat_image())]
#[case::blurred(blurred(&noise_image(5)))]
fn low_information_images_are_excluded(#[case] img: Mat) {
    let report = engine().run(vec![image("bad.png", encode(&img, ".png"))]).unwrap();

    assert!(report.canonical.is_empty());
    assert_eq!(report.excluded, 1);
}

#[test]
fn invalid_bytes_do_not_abort_the_run() {
    let report = engine()
        .run(vec![
            image("broken.png", b"certainly not an image".to_vec()),
            image("ok.png", encode(&noise_image(6), ".png")),
        ])
        .unwrap();

    assert_eq!(report.canonical, ["ok.png"]);
    assert_eq!(report.excluded, 1);
}

#[test]
fn end_to_end_mixed_batch() {
    // [A, A 的字节副本, B, B 的模糊副本] -> 唯一 [A, B]，排除 2
    let a = encode(&noise_image(7), ".png");
    let b_img = noise_image(8);

    let report = engine()
        .run(vec![
            image("a.png", a.clone()),
            image("a_copy.png", a),
            image("b.png", encode(&b_img, ".png")),
            image("c.png", encode(&blurred(&b_img), ".png")),
        ])
        .unwrap();

    assert_eq!(report.canonical, ["a.png", "b.png"]);
    assert!(report.duplicates["a.png"].is_empty());
    assert!(report.duplicates["b.png"].is_empty());
    assert_eq!(report.excluded, 2);
}

#[test]
fn empty_input_yields_empty_report() {
    let report = engine().run(vec![]).unwrap();
    assert!(report.canonical.is_empty());
    assert!(report.duplicates.is_empty());
    assert_eq!(report.excluded, 0);
}

#[test]
fn quality_threshold_zero_keeps_everything_decodable() {
    let dedup = DedupOptions { sharpness_threshold: 0., ..Default::default() };
    let engine = DedupEngine::new(SiftOptions::default(), dedup).unwrap();

    let report = engine.run(vec![image("flat.png", encode(&flat_image(), ".png"))]).unwrap();

    // 平坦图片没有任何特征点，按"无证据"策略独立成簇
    assert_eq!(report.canonical, ["flat.png"]);
    assert_eq!(report.excluded, 0);
}
