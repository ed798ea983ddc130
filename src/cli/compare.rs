use anyhow::Result;
use clap::Parser;
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::config::{DedupOptions, Opts, SiftOptions};
use crate::matcher::SimilarityMatcher;
use crate::quality::QualityGate;
use crate::sift::SiftDetector;
use crate::utils;

#[derive(Parser, Debug, Clone)]
pub struct CompareCommand {
    #[command(flatten)]
    pub sift: SiftOptions,
    #[command(flatten)]
    pub dedup: DedupOptions,
    /// 图片1
    pub image1: String,
    /// 图片2
    pub image2: String,
}

impl SubCommandExtend for CompareCommand {
    async fn run(&self, _opts: &Opts) -> Result<()> {
        self.dedup.validate()?;

        block_in_place(|| {
            let img1 = utils::imdecode(&std::fs::read(&self.image1)?, self.sift.max_size)?;
            let img2 = utils::imdecode(&std::fs::read(&self.image2)?, self.sift.max_size)?;

            let gate = QualityGate::new(self.dedup.sharpness_threshold);
            println!("sharpness\t{:.2}\t{}", gate.sharpness(&img1)?, self.image1);
            println!("sharpness\t{:.2}\t{}", gate.sharpness(&img2)?, self.image2);

            let mut sift = SiftDetector::create(self.sift.clone())?;
            let (kps1, des1) = sift.detect_image(&img1)?;
            let (kps2, des2) = sift.detect_image(&img2)?;
            println!("keypoints\t{}\t{}", kps1.len(), self.image1);
            println!("keypoints\t{}\t{}", kps2.len(), self.image2);

            let matcher = SimilarityMatcher::new(&self.dedup);
            match matcher.match_distance(&des1, &des2)? {
                Some(distance) => println!("distance\t{:.2}", distance),
                None => println!("distance\t-"),
            }
            println!("similar\t{}", matcher.is_similar(&des1, &des2)?);
            Ok(())
        })
    }
}
