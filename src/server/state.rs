use std::sync::Arc;

use crate::cli::server::ServerCommand;
use crate::config::{DedupOptions, SiftOptions};

/// 应用状态
pub struct AppState {
    /// SIFT 配置选项
    pub sift: SiftOptions,
    /// 去重配置选项
    pub dedup: DedupOptions,
    /// 鉴权 token
    pub token: String,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(opts: ServerCommand) -> Arc<Self> {
        Arc::new(AppState { sift: opts.sift, dedup: opts.dedup, token: opts.token })
    }
}
