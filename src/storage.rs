use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

/// 对象存储中一个对象的引用
#[derive(Debug, Clone)]
pub struct ObjectRef {
    /// 相对容器根的名称
    pub name: String,
    pub path: PathBuf,
}

/// 图片来源，由调用方决定实现（本地目录、内存列表或远端存储）
///
/// 引擎只消费 list/fetch 的结果，来源侧的失败直接上抛给调用方，
/// 重试策略属于实现自身的契约。
pub trait ObjectSource {
    fn list(&self) -> Result<Vec<ObjectRef>>;
    fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>>;
}

/// 去重结果的写入端
pub trait ObjectSink {
    fn create_container(&self, name: &str) -> Result<PathBuf>;
    fn store(&self, container: &Path, name: &str, data: &[u8]) -> Result<ObjectRef>;
}

/// 本地目录实现：递归扫描后缀匹配的文件，按文件名排序保证顺序稳定
pub struct DirStore {
    root: PathBuf,
    suffix: Regex,
}

impl DirStore {
    /// `suffix` 为逗号分隔的后缀列表，例如 "jpg,png,webp"
    pub fn new(root: impl Into<PathBuf>, suffix: &str) -> Result<Self> {
        let suffix = Regex::new(&format!("(?i)^({})$", suffix.replace(',', "|")))
            .context("无效的后缀列表")?;
        Ok(Self { root: root.into(), suffix })
    }
}

impl ObjectSource for DirStore {
    fn list(&self) -> Result<Vec<ObjectRef>> {
        let mut objects = vec![];
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension() else {
                continue;
            };
            if !self.suffix.is_match(&ext.to_string_lossy()) {
                continue;
            }
            let name = path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            objects.push(ObjectRef { name, path: path.to_path_buf() });
        }
        Ok(objects)
    }

    fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        fs::read(&object.path).with_context(|| format!("读取 {} 失败", object.path.display()))
    }
}

impl ObjectSink for DirStore {
    fn create_container(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        fs::create_dir_all(&path)
            .with_context(|| format!("创建目录 {} 失败", path.display()))?;
        Ok(path)
    }

    fn store(&self, container: &Path, name: &str, data: &[u8]) -> Result<ObjectRef> {
        let path = container.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data).with_context(|| format!("写入 {} 失败", path.display()))?;
        Ok(ObjectRef { name: name.to_string(), path })
    }
}
