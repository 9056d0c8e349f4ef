use std::sync::Arc;
use std::time::Duration;

use crate::domain::error::AppError;
use crate::domain::types::ImageData;
use crate::domain::video::{VideoOperation, VideoPhase};
use crate::infra::genai::{ContentService, GenaiError};

/// 既定のポーリング間隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// ポーリング上限。間隔 10 秒で約 15 分に相当する
pub const DEFAULT_MAX_POLLS: u32 = 90;

/// 長時間動画オペレーションのポーラー。
///
/// 投入 → 固定間隔ポーリング → 終端参照の取得、の三段。
/// ポーリングは上限回数で必ず打ち切る（永久ループしない）
pub struct VideoGenerator {
    service: Arc<dyn ContentService>,
    poll_interval: Duration,
    max_polls: u32,
}

impl VideoGenerator {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self {
            service,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// ポーリングスケジュールの差し替え（テスト・低速環境向け）
    pub fn with_schedule(mut self, poll_interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_polls = max_polls;
        self
    }

    /// 動画ジョブを投入し、ハンドルを保持するオペレーションを返す
    pub async fn submit(
        &self,
        prompt: &str,
        image: &ImageData,
    ) -> Result<VideoOperation, AppError> {
        if prompt.trim().is_empty() {
            return Err(AppError::planning("video prompt must not be empty"));
        }
        let handle = self.service.submit_video(prompt, image).await?;
        log::info!("動画オペレーション投入: {handle}");
        Ok(VideoOperation::new(handle))
    }

    /// done になるまでハンドルを照会し続ける。
    /// ポーリングエラーと上限超過はオペレーションを failed にして返す
    pub async fn poll_until_done(&self, op: &mut VideoOperation) -> Result<(), AppError> {
        op.phase = VideoPhase::Polling;

        loop {
            let status = match self.service.poll_video(&op.handle).await {
                Ok(status) => status,
                Err(e) => {
                    let err = AppError::from(e);
                    op.fail(err.clone());
                    return Err(err);
                }
            };
            op.polls += 1;

            if status.done {
                if let Some(message) = status.error {
                    let err = AppError::synthesis(format!("video generation failed: {message}"));
                    op.fail(err.clone());
                    return Err(err);
                }
                let Some(uri) = status.result_uri else {
                    let err = AppError::no_content(
                        "operation finished without a result reference",
                    );
                    op.fail(err.clone());
                    return Err(err);
                };
                log::info!("動画オペレーション完了（{} 回照会）", op.polls);
                op.succeed(uri);
                return Ok(());
            }

            if op.polls >= self.max_polls {
                let err = AppError::poll_timeout(format!(
                    "operation still running after {} polls",
                    op.polls
                ));
                op.fail(err.clone());
                return Err(err);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 終端参照から動画バイト列を取得する。
    /// ここでの認証失敗は合成失敗ではなく資格情報エラーとして区別する
    pub async fn fetch(&self, op: &VideoOperation) -> Result<Vec<u8>, AppError> {
        let uri = op
            .result_uri
            .as_deref()
            .ok_or_else(|| AppError::invalid_state("operation holds no result reference"))?;

        self.service.fetch_video(uri).await.map_err(|e| match e {
            GenaiError::InvalidCredential => AppError::credential(e.to_string()),
            other => AppError::retrieval(other.to_string()),
        })
    }

    /// 投入からバイト列取得までの一括実行
    pub async fn generate(
        &self,
        prompt: &str,
        image: &ImageData,
    ) -> Result<Vec<u8>, AppError> {
        let mut op = self.submit(prompt, image).await?;
        self.poll_until_done(&mut op).await?;
        self.fetch(&op).await
    }
}
