use anyhow::{Result, bail};
use indicatif::ProgressStyle;
use opencv::core::{Mat, Size};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc};

/// 解码图片为灰度 Mat，解码失败时报错
///
/// OpenCV 对无法识别的字节返回空 Mat 而不是错误，这里统一转换为错误，
/// 由调用方决定跳过还是上抛。
pub fn imdecode(bytes: &[u8], max_size: (i32, i32)) -> Result<Mat> {
    let mat = Mat::from_slice(bytes)?;
    let img = imgcodecs::imdecode(&mat, imgcodecs::IMREAD_GRAYSCALE)?;
    if img.empty() {
        bail!("图片解码失败");
    }
    adjust_image_size(img, max_size)
}

/// 如果宽高均超过最大尺寸，则等比缩小图片
pub fn adjust_image_size(img: Mat, max_size: (i32, i32)) -> Result<Mat> {
    if img.cols() <= max_size.0 || img.rows() <= max_size.1 {
        return Ok(img);
    }
    let scale =
        (max_size.0 as f64 / img.cols() as f64).min(max_size.1 as f64 / img.rows() as f64);
    let mut output = Mat::default();
    imgproc::resize(&img, &mut output, Size::default(), scale, scale, imgproc::INTER_AREA)?;
    Ok(output)
}

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{msg} {wide_bar} {pos}/{len} [{elapsed_precise}<{eta_precise}]",
    )
    .expect("failed to build progress style")
}
