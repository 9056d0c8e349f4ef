use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::fanout::BatchEvent;
use super::job_store::JobStore;
use crate::domain::error::AppError;
use crate::domain::job::{JobId, JobStatus};
use crate::domain::types::ImageData;
use crate::infra::genai::{prompts, ContentService};

/// 単一ジョブの再実行（regenerate / upscale）。
///
/// 既存ジョブをその場で書き換える。新しいジョブは作らず、id・
/// タイトルは維持される。兄弟ジョブには一切触れない —
/// §のキー付きマージをバッチサイズ1に適用したもの
pub struct RerunExecutor {
    service: Arc<dyn ContentService>,
}

impl RerunExecutor {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }

    /// 既存の成功結果を高精細化する。
    ///
    /// 前提条件: ジョブが succeeded で結果を持っていること。
    /// 実行中は `upscaling` フラグだけを立て、ライフサイクル状態は
    /// 動かさない（完成画像を表示したままにできる）。失敗時は元の
    /// 結果を保持し、通知用にエラーを返す
    pub async fn upscale(
        &self,
        store: &JobStore,
        id: JobId,
        events: &UnboundedSender<BatchEvent>,
    ) -> Result<(), AppError> {
        let job = store
            .get(id)
            .await
            .ok_or_else(|| AppError::invalid_state(format!("job {id} not found")))?;

        if job.status != JobStatus::Succeeded {
            return Err(AppError::invalid_state(
                "only a succeeded job can be upscaled",
            ));
        }
        let Some(result) = job.result else {
            return Err(AppError::invalid_state("job has no result to upscale"));
        };

        store.set_upscaling(id, true).await;
        log::info!("ジョブ {id} をアップスケール開始");

        // 新しいアイデアではない: 元のプロンプトを文脈として再利用し、
        // 既存の結果画像そのものを入力にする
        let prompt = prompts::upscale_prompt(&job.prompt);
        let outcome = self
            .service
            .synthesize_image(&prompt, &result.as_image(), None)
            .await;

        let finished = match outcome {
            Ok(asset) => {
                store.complete(id, asset).await;
                Ok(())
            }
            Err(e) => {
                // 失敗してもジョブは succeeded のまま、元の結果を残す
                log::warn!("ジョブ {id} のアップスケールに失敗: {e}");
                Err(AppError::from(e))
            }
        };

        store.set_upscaling(id, false).await;
        let status = store
            .get(id)
            .await
            .map(|j| j.status)
            .unwrap_or(JobStatus::Failed);
        let _ = events.send(BatchEvent::JobFinished { id, status });
        finished
    }

    /// 終端状態のジョブを同じ id のまま再生成する。
    /// `prompt_override` があればプロンプトを差し替えてから実行する
    pub async fn regenerate(
        &self,
        store: &JobStore,
        id: JobId,
        prompt_override: Option<String>,
        base_image: &ImageData,
        secondary_image: Option<&ImageData>,
        events: &UnboundedSender<BatchEvent>,
    ) -> Result<(), AppError> {
        let job = store
            .get(id)
            .await
            .ok_or_else(|| AppError::invalid_state(format!("job {id} not found")))?;

        if !job.is_terminal() {
            return Err(AppError::invalid_state(
                "job is still running; wait for it to settle before regenerating",
            ));
        }

        if let Some(prompt) = prompt_override {
            store.set_prompt(id, prompt).await;
        }

        store.mark_running(id).await;
        let _ = events.send(BatchEvent::JobStarted { id });
        log::info!("ジョブ {id} を再生成");

        let prompt = store
            .get(id)
            .await
            .map(|j| j.prompt)
            .unwrap_or(job.prompt);

        match self
            .service
            .synthesize_image(&prompt, base_image, secondary_image)
            .await
        {
            Ok(asset) => store.complete(id, asset).await,
            Err(e) => {
                log::warn!("ジョブ {id} の再生成に失敗: {e}");
                store.fail(id, AppError::from(e)).await;
            }
        }

        let status = store
            .get(id)
            .await
            .map(|j| j.status)
            .unwrap_or(JobStatus::Failed);
        let _ = events.send(BatchEvent::JobFinished { id, status });
        Ok(())
    }
}
