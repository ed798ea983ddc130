use anyhow::Result;
use opencv::core::{self, DMatch, Mat, Vector, no_array};
use opencv::features2d::BFMatcher;
use opencv::prelude::*;

use crate::config::DedupOptions;

/// 基于描述符的相似度判定器
///
/// 对两组描述符做 L2 暴力匹配并开启交叉验证（A→B 与 B→A 的最近邻
/// 必须互相一致），取距离最小的 K 个匹配求平均距离，严格低于阈值
/// 视为同一张图片的近似副本。这是启发式判定，允许少量误判。
#[derive(Debug, Clone, Copy)]
pub struct SimilarityMatcher {
    threshold: f32,
    best_matches: usize,
}

impl SimilarityMatcher {
    pub fn new(opts: &DedupOptions) -> Self {
        Self { threshold: opts.similarity_threshold, best_matches: opts.best_matches }
    }

    /// 计算最佳匹配的平均距离，没有任何匹配时返回 None
    pub fn match_distance(&self, des1: &Mat, des2: &Mat) -> Result<Option<f32>> {
        // 描述符为空时交叉验证无从谈起，直接视为无匹配
        if des1.empty() || des2.empty() {
            return Ok(None);
        }

        let matcher = BFMatcher::new(core::NORM_L2, true)?;
        let mut matches = Vector::<DMatch>::new();
        matcher.train_match(des1, des2, &mut matches, &no_array())?;

        let mut matches = matches.to_vec();
        if matches.is_empty() {
            return Ok(None);
        }
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(self.best_matches);

        let mean = matches.iter().map(|m| m.distance).sum::<f32>() / matches.len() as f32;
        Ok(Some(mean))
    }

    /// 两组描述符是否来自视觉上相同的图片
    pub fn is_similar(&self, des1: &Mat, des2: &Mat) -> Result<bool> {
        Ok(self.match_distance(des1, des2)?.is_some_and(|d| d < self.threshold))
    }
}
