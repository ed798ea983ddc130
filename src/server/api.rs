use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_auth::AuthBearer;
use axum_typed_multipart::TypedMultipart;
use log::info;
use prometheus::TextEncoder;
use serde_json::json;
use tokio::task::block_in_place;

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::cluster::{DedupEngine, SourceImage};
use crate::config::DedupOptions;
use crate::metrics;

/// 对上传的一批图片去重
#[utoipa::path(
    post,
    path = "/dedup",
    request_body(content = DedupForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = DedupResponse),
    )
)]
pub async fn dedup_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    data: TypedMultipart<DedupRequest>,
) -> Result<Response> {
    if token != state.token {
        return Ok((StatusCode::UNAUTHORIZED, "无效的 token").into_response());
    }

    // 请求内的阈值覆盖服务器默认配置
    let dedup = DedupOptions {
        sharpness_threshold: data.sharpness_threshold.unwrap_or(state.dedup.sharpness_threshold),
        similarity_threshold: data
            .similarity_threshold
            .unwrap_or(state.dedup.similarity_threshold),
        ..state.dedup.clone()
    };

    let images = data
        .file
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let name = file
                .metadata
                .file_name
                .clone()
                .unwrap_or_else(|| format!("upload-{}", i));
            SourceImage { name, data: file.contents.to_vec() }
        })
        .collect::<Vec<_>>();

    info!("正在处理 {} 张上传图片", images.len());
    let start = Instant::now();

    let engine = DedupEngine::new(state.sift.clone(), dedup)?;
    let report = block_in_place(|| engine.run(images))?;

    let elapsed = start.elapsed();
    metrics::observe_run(&report, elapsed.as_secs_f32());

    Ok(Json(json!({
        "time": elapsed.as_millis() as u32,
        "canonical": report.canonical,
        "duplicates": report.duplicates,
        "excluded": report.excluded,
    }))
    .into_response())
}

/// 获取 prometheus 指标
#[utoipa::path(get, path = "/metrics")]
pub async fn metrics_handler() -> Result<String> {
    let encoder = TextEncoder::new();
    Ok(encoder.encode_to_string(&prometheus::gather())?)
}
