use std::collections::HashSet;

/// 图片原始字节的 256 位内容指纹
pub type Fingerprint = [u8; 32];

/// 计算图片原始字节的内容指纹
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    *blake3::hash(bytes).as_bytes()
}

/// 单次运行内的指纹集合，只增不删
///
/// 用于字节级完全重复的快速排除：指纹命中的图片直接跳过，
/// 不再进入清晰度和特征点阶段。
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    seen: HashSet<Fingerprint>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, hash: &Fingerprint) -> bool {
        self.seen.contains(hash)
    }

    /// 记录指纹，如果此前未出现过则返回 true
    pub fn record(&mut self, hash: Fingerprint) -> bool {
        self.seen.insert(hash)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
