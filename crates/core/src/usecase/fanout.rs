use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::job_store::JobStore;
use crate::domain::error::AppError;
use crate::domain::job::{JobId, JobStatus};
use crate::domain::types::ImageData;
use crate::infra::genai::ContentService;

/// バッチ進行イベント（UI層への通知チャネルに流す）
#[derive(Debug, Clone)]
pub enum BatchEvent {
    JobStarted { id: JobId },
    JobFinished { id: JobId, status: JobStatus },
    /// 全ジョブが終端に達した後、バッチごとに一度だけ発火する
    BatchCompleted { succeeded: usize, failed: usize },
}

/// ファンアウト実行器。
///
/// 計画済みジョブ全件の合成呼び出しをスロットリングなしで同時に
/// 発行し、完了が届いた順に id キーでマージする。1件の失敗は他の
/// ジョブを止めない。完了シグナルは全件 settle 後にのみ発火する
/// （fail-fast ではない）
pub struct FanoutExecutor {
    service: Arc<dyn ContentService>,
}

impl FanoutExecutor {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }

    /// ストア内の pending ジョブを全件ディスパッチし、全件が終端に
    /// 達するまで待つ。戻り値は (成功数, 失敗数)
    pub async fn run(
        &self,
        store: &JobStore,
        base_image: &ImageData,
        secondary_image: Option<&ImageData>,
        events: &UnboundedSender<BatchEvent>,
    ) -> (usize, usize) {
        let jobs = store.snapshot().await;
        let total = jobs.len();
        log::info!(
            "バッチ {} をファンアウト開始（{} 件）",
            store.batch_id(),
            total
        );

        let mut handles = Vec::with_capacity(total);
        for job in jobs {
            if job.status != JobStatus::Pending {
                continue;
            }

            let service = Arc::clone(&self.service);
            let store = store.clone();
            let base = base_image.clone();
            let secondary = secondary_image.cloned();
            let events = events.clone();
            let id = job.id;
            let prompt = job.prompt.clone();

            handles.push(tokio::spawn(async move {
                store.mark_running(id).await;
                let _ = events.send(BatchEvent::JobStarted { id });

                match service
                    .synthesize_image(&prompt, &base, secondary.as_ref())
                    .await
                {
                    Ok(asset) => store.complete(id, asset).await,
                    Err(e) => {
                        log::warn!("ジョブ {id} の合成に失敗: {e}");
                        store.fail(id, AppError::from(e)).await;
                    }
                }

                let status = store
                    .get(id)
                    .await
                    .map(|j| j.status)
                    .unwrap_or(JobStatus::Failed);
                let _ = events.send(BatchEvent::JobFinished { id, status });
            }));
        }

        // settle-all: 成否にかかわらず全タスクの終了を待つ
        for handle in handles {
            let _ = handle.await;
        }

        let (succeeded, failed) = store.outcome_counts().await;
        log::info!(
            "バッチ {} 完了: 成功 {succeeded} / 失敗 {failed}",
            store.batch_id()
        );
        let _ = events.send(BatchEvent::BatchCompleted { succeeded, failed });
        (succeeded, failed)
    }
}
