use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar};
use log::info;
use rayon::prelude::*;
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::cluster::{DedupEngine, DedupReport, SourceImage};
use crate::config::{DedupOptions, Opts, OutputFormat, SiftOptions};
use crate::storage::{DirStore, ObjectSink, ObjectSource};
use crate::utils::pb_style;

#[derive(Parser, Debug, Clone)]
pub struct RunCommand {
    #[command(flatten)]
    pub sift: SiftOptions,
    #[command(flatten)]
    pub dedup: DedupOptions,
    /// 图片所在目录
    pub path: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png,webp")]
    pub suffix: String,
    /// 将代表图与副本分别复制到该目录的 unique/ 和 duplicates/ 子目录
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for RunCommand {
    async fn run(&self, _opts: &Opts) -> Result<()> {
        // 阈值不合法时在扫描之前直接退出
        self.dedup.validate()?;

        let store = DirStore::new(&self.path, &self.suffix)?;
        let objects = store.list()?;
        info!("扫描完成，共 {} 张图片", objects.len());

        let pb = ProgressBar::new(objects.len() as u64).with_style(pb_style());
        pb.set_message("读取图片");
        let images = block_in_place(|| {
            objects
                .par_iter()
                .progress_with(pb)
                .map(|object| {
                    let data = store.fetch(object)?;
                    Ok(SourceImage { name: object.name.clone(), data })
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let engine = DedupEngine::new(self.sift.clone(), self.dedup.clone())?;
        let report = block_in_place(|| engine.run(images))?;

        if let Some(output) = &self.output {
            block_in_place(|| self.copy_results(&store, output, &report))?;
        }

        print_report(&report, self)
    }
}

impl RunCommand {
    /// 把分类结果落盘：代表图进 unique/，副本按所属代表图进 duplicates/
    ///
    /// 分类本身是纯函数，这里是唯一的副作用出口。
    fn copy_results(&self, source: &DirStore, output: &PathBuf, report: &DedupReport) -> Result<()> {
        let sink = DirStore::new(output, &self.suffix)?;
        let unique = sink.create_container("unique")?;
        let duplicates = sink.create_container("duplicates")?;

        let by_name = source
            .list()?
            .into_iter()
            .map(|o| (o.name.clone(), o))
            .collect::<std::collections::HashMap<_, _>>();

        for name in &report.canonical {
            if let Some(object) = by_name.get(name) {
                sink.store(&unique, name, &source.fetch(object)?)?;
            }
        }
        for (canonical, members) in &report.duplicates {
            for name in members {
                if let Some(object) = by_name.get(name) {
                    let target = format!("{}/{}", canonical.replace('/', "_"), name);
                    sink.store(&duplicates, &target, &source.fetch(object)?)?;
                }
            }
        }
        Ok(())
    }
}

fn print_report(report: &DedupReport, opts: &RunCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?)
        }
        OutputFormat::Table => {
            for name in &report.canonical {
                println!("unique\t{}", name);
                for member in &report.duplicates[name] {
                    println!("dup\t{} -> {}", member, name);
                }
            }
            println!("excluded\t{}", report.excluded);
        }
    }
    Ok(())
}
