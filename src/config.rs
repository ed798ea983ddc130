use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::*;

#[derive(Parser, Debug, Clone)]
pub struct SiftOptions {
    /// SIFT 特征点最大保留数量，0 表示不限制
    #[arg(short = 'n', value_name = "N", long, default_value_t = 0)]
    pub sift_nfeatures: u32,
    /// SIFT 高斯金字塔每组的层数
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub sift_octave_layers: u32,
    /// SIFT 对比度阈值，用于过滤低对比度区域的特征点
    #[arg(long, value_name = "T", default_value_t = 0.04)]
    pub sift_contrast_threshold: f64,
    /// SIFT 边缘响应阈值，用于过滤边缘上的特征点
    #[arg(long, value_name = "T", default_value_t = 10.)]
    pub sift_edge_threshold: f64,
    /// SIFT 第 0 层的高斯模糊系数
    #[arg(long, value_name = "SIGMA", default_value_t = 1.6)]
    pub sift_sigma: f64,
    /// 图片最大尺寸，如果宽高**均**超过这个尺寸，则等比缩放
    #[arg(short = 'S', long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, verbatim_doc_comment, default_value = "1920x1080")]
    pub max_size: (i32, i32),
}

impl Default for SiftOptions {
    fn default() -> Self {
        Self {
            sift_nfeatures: 0,
            sift_octave_layers: 3,
            sift_contrast_threshold: 0.04,
            sift_edge_threshold: 10.,
            sift_sigma: 1.6,
            max_size: (1920, 1080),
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct DedupOptions {
    /// 清晰度阈值，拉普拉斯方差低于该值的图片会被排除
    #[arg(long, value_name = "T", default_value_t = 100.)]
    pub sharpness_threshold: f64,
    /// 相似判定阈值，最佳匹配的平均距离低于该值时视为重复
    #[arg(long, value_name = "T", default_value_t = 100.)]
    pub similarity_threshold: f32,
    /// 参与平均距离计算的最佳匹配数量
    #[arg(short = 'k', long, value_name = "K", default_value_t = 10)]
    pub best_matches: usize,
}

impl DedupOptions {
    /// 在处理开始之前校验阈值，不合法的配置直接报错退出
    pub fn validate(&self) -> Result<()> {
        if !self.sharpness_threshold.is_finite() || self.sharpness_threshold < 0. {
            bail!("无效的清晰度阈值: {}", self.sharpness_threshold);
        }
        if !self.similarity_threshold.is_finite() || self.similarity_threshold <= 0. {
            bail!("无效的相似判定阈值: {}", self.similarity_threshold);
        }
        if self.best_matches == 0 {
            bail!("最佳匹配数量必须大于 0");
        }
        Ok(())
    }
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self { sharpness_threshold: 100., similarity_threshold: 100., best_matches: 10 }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imdedup", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 对目录中的图片去重
    Run(RunCommand),
    /// 比较两张图片的清晰度与相似度
    Compare(CompareCommand),
    /// 启动 HTTP 去重服务
    Server(ServerCommand),
}

fn parse_size(s: &str) -> Result<(i32, i32)> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        bail!("无效的尺寸: {}", s);
    }
    Ok((parts[0].parse()?, parts[1].parse()?))
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Table,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default() {
        assert!(DedupOptions::default().validate().is_ok());
    }

    #[test]
    fn test_validate_negative_sharpness() {
        let opts = DedupOptions { sharpness_threshold: -1., ..Default::default() };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_validate_zero_best_matches() {
        let opts = DedupOptions { best_matches: 0, ..Default::default() };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_validate_nan_threshold() {
        let opts = DedupOptions { similarity_threshold: f32::NAN, ..Default::default() };
        assert!(opts.validate().is_err());
    }
}
