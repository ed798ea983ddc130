use std::cell::RefCell;
use std::sync::OnceLock;

use anyhow::Result;
use opencv::core::{KeyPoint, Mat, Ptr, Vector, no_array};
use opencv::features2d::SIFT;
use opencv::prelude::*;

use crate::config::SiftOptions;
use crate::utils;

// 注意：SIFT_OPTIONS 必须在 SIFT 之前初始化
pub static SIFT_OPTIONS: OnceLock<SiftOptions> = OnceLock::new();

thread_local! {
    pub static SIFT_DETECTOR: RefCell<SiftDetector> =
        RefCell::new(SiftDetector::create(SIFT_OPTIONS.get().unwrap().clone()).unwrap());
}

/// SIFT 特征点检测器
///
/// 检测尺度与旋转不变的特征点，每个特征点输出一个 128 维浮点描述符。
/// OpenCV 的 SIFT 对象不能跨线程共享，因此每个工作线程通过
/// `SIFT_DETECTOR` 持有自己的实例。
pub struct SiftDetector {
    sift: Ptr<SIFT>,
    opts: SiftOptions,
}

impl SiftDetector {
    pub fn create(opts: SiftOptions) -> Result<Self> {
        let sift = SIFT::create(
            opts.sift_nfeatures as i32,
            opts.sift_octave_layers as i32,
            opts.sift_contrast_threshold,
            opts.sift_edge_threshold,
            opts.sift_sigma,
            false,
        )?;
        Ok(Self { sift, opts })
    }

    /// 解码图片字节并计算特征点与描述符
    pub fn detect_bytes(&mut self, bytes: &[u8]) -> Result<(Vec<KeyPoint>, Mat)> {
        let image = utils::imdecode(bytes, self.opts.max_size)?;
        self.detect_image(&image)
    }

    /// 计算已解码图片的特征点与描述符
    ///
    /// 没有检测到特征点时返回空的描述符矩阵，不视为错误。
    pub fn detect_image(&mut self, image: &Mat) -> Result<(Vec<KeyPoint>, Mat)> {
        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        self.sift.detect_and_compute(
            image,
            &no_array(),
            &mut keypoints,
            &mut descriptors,
            false,
        )?;
        Ok((keypoints.to_vec(), descriptors))
    }
}
