use anyhow::Result;
use opencv::core::{self, Mat, Vector};
use opencv::imgproc;
use opencv::prelude::*;

/// 清晰度闸门
///
/// 清晰度定义为灰度图拉普拉斯响应的方差：模糊或近乎空白的图片
/// 高频分量少，方差趋近于 0。低于阈值的图片被整体排除，
/// 既不会成为代表图也不会被记为重复。
#[derive(Debug, Clone, Copy)]
pub struct QualityGate {
    threshold: f64,
}

impl QualityGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// 计算图片的清晰度得分
    pub fn sharpness(&self, image: &Mat) -> Result<f64> {
        let mut laplacian = Mat::default();
        imgproc::laplacian_def(image, &mut laplacian, core::CV_64F)?;

        let mut mean = Vector::<f64>::new();
        let mut stddev = Vector::<f64>::new();
        core::mean_std_dev_def(&laplacian, &mut mean, &mut stddev)?;

        let sd = stddev.get(0)?;
        Ok(sd * sd)
    }

    /// 清晰度达标返回 true，严格低于阈值返回 false
    pub fn is_acceptable(&self, image: &Mat) -> Result<bool> {
        Ok(self.sharpness(image)? >= self.threshold)
    }
}
