use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use utoipa::ToSchema;

/// 去重请求参数
#[derive(TryFromMultipart)]
pub struct DedupRequest {
    pub file: Vec<FieldData<Bytes>>,
    pub sharpness_threshold: Option<f64>,
    pub similarity_threshold: Option<f32>,
}

/// 去重表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct DedupForm {
    /// 上传的图片文件，可以是多张图片
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 清晰度阈值，不填则使用服务器配置
    pub sharpness_threshold: Option<f64>,
    /// 相似判定阈值，不填则使用服务器配置
    pub similarity_threshold: Option<f32>,
}

/// 去重响应
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct DedupResponse {
    /// 处理耗时，单位为毫秒
    pub time: u32,
    /// 代表图文件名，按发现顺序排列
    pub canonical: Vec<String>,
    /// 代表图文件名 -> 其副本文件名
    pub duplicates: std::collections::HashMap<String, Vec<String>>,
    /// 被排除的图片数量
    pub excluded: usize,
}
