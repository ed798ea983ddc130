use std::collections::HashMap;

use anyhow::Result;
use log::{debug, info, warn};
use opencv::core::{KeyPoint, Mat};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{DedupOptions, SiftOptions};
use crate::fingerprint::{Fingerprint, FingerprintIndex, fingerprint};
use crate::matcher::SimilarityMatcher;
use crate::quality::QualityGate;
use crate::sift::{SIFT_DETECTOR, SIFT_OPTIONS};
use crate::utils;

/// 一张待处理的输入图片
pub struct SourceImage {
    pub name: String,
    pub data: Vec<u8>,
}

/// 通过指纹与清晰度检查后的图片记录，描述符计算完成后不再修改
pub struct ImageRecord {
    pub name: String,
    pub hash: Fingerprint,
    pub sharpness: f64,
    /// 特征点的几何信息，相似判定不使用，仅保留备查
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: Mat,
}

/// 一个视觉聚类：代表图 + 被判定为它的副本的成员
///
/// 成员只增不减，聚类之间不会合并，代表图一旦确定不再更换。
pub struct Cluster {
    pub representative: ImageRecord,
    pub members: Vec<ImageRecord>,
}

/// 一次去重运行的结果
#[derive(Debug, Clone, Serialize)]
pub struct DedupReport {
    /// 代表图名称，按发现顺序排列
    pub canonical: Vec<String>,
    /// 代表图名称 -> 其副本名称（按处理顺序）
    pub duplicates: HashMap<String, Vec<String>>,
    /// 被排除的图片数量（字节级重复、解码失败、清晰度不足）
    pub excluded: usize,
}

/// 增量聚类器，持有单次运行的全部可变状态
///
/// 新图片按发现顺序与已有代表图逐一比较，命中第一个相似的聚类
/// 即归入其成员；全部未命中则晋升为新的代表图。
pub struct ClusterBuilder {
    matcher: SimilarityMatcher,
    fingerprints: FingerprintIndex,
    clusters: Vec<Cluster>,
    excluded: usize,
}

impl ClusterBuilder {
    pub fn new(opts: &DedupOptions) -> Result<Self> {
        opts.validate()?;
        Ok(Self {
            matcher: SimilarityMatcher::new(opts),
            fingerprints: FingerprintIndex::new(),
            clusters: Vec::new(),
            excluded: 0,
        })
    }

    /// 记录指纹，如果是字节级重复则计入排除并返回 false
    pub fn record_fingerprint(&mut self, hash: Fingerprint) -> bool {
        if self.fingerprints.record(hash) {
            true
        } else {
            self.excluded += 1;
            false
        }
    }

    /// 将记录归入第一个匹配的聚类，否则晋升为新的代表图
    pub fn assign(&mut self, record: ImageRecord) -> Result<()> {
        let mut target = None;
        for (i, cluster) in self.clusters.iter().enumerate() {
            if self.matcher.is_similar(&record.descriptors, &cluster.representative.descriptors)? {
                target = Some(i);
                break;
            }
        }

        match target {
            Some(i) => {
                debug!("{} 归入 {}", record.name, self.clusters[i].representative.name);
                self.clusters[i].members.push(record);
            }
            None => {
                debug!("{} 晋升为新的代表图", record.name);
                self.clusters.push(Cluster { representative: record, members: vec![] });
            }
        }
        Ok(())
    }

    pub fn exclude(&mut self) {
        self.excluded += 1;
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn into_report(self) -> DedupReport {
        let canonical =
            self.clusters.iter().map(|c| c.representative.name.clone()).collect::<Vec<_>>();
        let duplicates = self
            .clusters
            .iter()
            .map(|c| {
                let members = c.members.iter().map(|m| m.name.clone()).collect();
                (c.representative.name.clone(), members)
            })
            .collect();
        DedupReport { canonical, duplicates, excluded: self.excluded }
    }
}

/// 去重引擎：按顺序驱动指纹、清晰度、特征提取与聚类四个阶段
///
/// 引擎本身不做任何网络或磁盘操作，输入输出都是内存中的字节与名称，
/// 落盘等副作用由调用方通过 ObjectSink 完成。
pub struct DedupEngine {
    sift: SiftOptions,
    dedup: DedupOptions,
}

impl DedupEngine {
    pub fn new(sift: SiftOptions, dedup: DedupOptions) -> Result<Self> {
        dedup.validate()?;
        Ok(Self { sift, dedup })
    }

    /// 对一批图片去重，返回代表图、副本归属和排除计数
    ///
    /// 指纹检查按输入顺序串行执行，命中即短路，不做任何解码工作；
    /// 解码、清晰度和特征提取在 rayon 线程池上并行，结果按输入顺序
    /// 还原后再串行做聚类归属，保证输出只取决于输入顺序。
    pub fn run(&self, images: Vec<SourceImage>) -> Result<DedupReport> {
        SIFT_OPTIONS.get_or_init(|| self.sift.clone());

        let mut builder = ClusterBuilder::new(&self.dedup)?;
        let gate = QualityGate::new(self.dedup.sharpness_threshold);

        let total = images.len();
        let mut fresh = Vec::with_capacity(total);
        for image in images {
            let hash = fingerprint(&image.data);
            if builder.record_fingerprint(hash) {
                fresh.push((image, hash));
            } else {
                debug!("跳过字节级重复图片: {}", image.name);
            }
        }

        let records = fresh
            .into_par_iter()
            .map(|(image, hash)| self.prepare(&gate, image, hash))
            .collect::<Vec<_>>();

        for record in records {
            match record {
                Some(record) => builder.assign(record)?,
                None => builder.exclude(),
            }
        }

        let report = builder.into_report();
        info!(
            "去重完成: 共 {} 张，唯一 {} 张，排除 {} 张",
            total,
            report.canonical.len(),
            report.excluded
        );
        Ok(report)
    }

    /// 解码并计算单张图片的清晰度与描述符
    ///
    /// 解码失败与清晰度不足同等对待：返回 None，由调用方计入排除。
    fn prepare(
        &self,
        gate: &QualityGate,
        image: SourceImage,
        hash: Fingerprint,
    ) -> Option<ImageRecord> {
        let decoded = match utils::imdecode(&image.data, self.sift.max_size) {
            Ok(mat) => mat,
            Err(e) => {
                warn!("解码失败，跳过 {}: {}", image.name, e);
                return None;
            }
        };

        let sharpness = match gate.sharpness(&decoded) {
            Ok(score) => score,
            Err(e) => {
                warn!("清晰度计算失败，跳过 {}: {}", image.name, e);
                return None;
            }
        };
        if sharpness < self.dedup.sharpness_threshold {
            debug!("清晰度不足，跳过 {}: {:.2}", image.name, sharpness);
            return None;
        }

        match SIFT_DETECTOR.with(|sift| sift.borrow_mut().detect_image(&decoded)) {
            Ok((keypoints, descriptors)) => Some(ImageRecord {
                name: image.name,
                hash,
                sharpness,
                keypoints,
                descriptors,
            }),
            Err(e) => {
                warn!("特征提取失败，跳过 {}: {}", image.name, e);
                None
            }
        }
    }
}
