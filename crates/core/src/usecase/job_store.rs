use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::error::AppError;
use crate::domain::job::{Job, JobId, JobStatus};
use crate::domain::types::{GeneratedAsset, PlannedIdea};

/// バッチごとのジョブ状態ストア。
///
/// 内部は JobId をキーにしたマップ + 挿入順インデックス。
/// 完了はディスパッチ順に届かないため、すべての更新は id で
/// 該当エントリだけを差し替えるキー付きマージに限定する。
/// 位置ベースの書き込み API は存在しない。
///
/// バッチ構成は計画時に一度だけ確定し、以後ジョブの追加・削除はない。
/// ストア自体はバッチを作った呼び出し側が所有する
#[derive(Clone, Debug)]
pub struct JobStore {
    batch_id: Arc<String>,
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    order: Vec<JobId>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            batch_id: Arc::new(uuid::Uuid::new_v4().to_string()),
            inner: Arc::new(Mutex::new(Inner {
                jobs: HashMap::new(),
                order: Vec::new(),
            })),
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// 計画結果からジョブを登録する。空のストアに対して一度だけ呼べる
    pub async fn seed(&self, ideas: Vec<PlannedIdea>) -> Result<Vec<JobId>, AppError> {
        let mut inner = self.inner.lock().await;
        if !inner.jobs.is_empty() {
            return Err(AppError::invalid_state(
                "batch is already seeded; membership is immutable after planning",
            ));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(ideas.len());
        for (id, idea) in ideas.into_iter().enumerate() {
            inner
                .jobs
                .insert(id, Job::new(id, idea.title, idea.prompt, now.clone()));
            inner.order.push(id);
            ids.push(id);
        }
        log::info!("バッチ {} に {} 件のジョブを登録", self.batch_id, ids.len());
        Ok(ids)
    }

    pub async fn mark_running(&self, id: JobId) {
        let mut inner = self.inner.lock().await;
        if let Some(job) = inner.jobs.get_mut(&id) {
            job.mark_running();
        }
    }

    pub async fn complete(&self, id: JobId, asset: GeneratedAsset) {
        let mut inner = self.inner.lock().await;
        if let Some(job) = inner.jobs.get_mut(&id) {
            job.complete(asset);
        }
    }

    pub async fn fail(&self, id: JobId, error: AppError) {
        let mut inner = self.inner.lock().await;
        if let Some(job) = inner.jobs.get_mut(&id) {
            job.fail(error);
        }
    }

    /// アップスケール中フラグ（ライフサイクル状態とは独立）
    pub async fn set_upscaling(&self, id: JobId, upscaling: bool) {
        let mut inner = self.inner.lock().await;
        if let Some(job) = inner.jobs.get_mut(&id) {
            job.upscaling = upscaling;
        }
    }

    /// 再実行時のプロンプト差し替え。id・タイトルは変わらない
    pub async fn set_prompt(&self, id: JobId, prompt: String) {
        let mut inner = self.inner.lock().await;
        if let Some(job) = inner.jobs.get_mut(&id) {
            job.prompt = prompt;
        }
    }

    pub async fn get(&self, id: JobId) -> Option<Job> {
        let inner = self.inner.lock().await;
        inner.jobs.get(&id).cloned()
    }

    /// 表示用の順序付きビュー（挿入順）
    pub async fn snapshot(&self) -> Vec<Job> {
        let inner = self.inner.lock().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.jobs.get(id).cloned())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.jobs.is_empty()
    }

    pub async fn all_terminal(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.jobs.values().all(|j| j.is_terminal())
    }

    /// (成功数, 失敗数)
    pub async fn outcome_counts(&self) -> (usize, usize) {
        let inner = self.inner.lock().await;
        let succeeded = inner
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Succeeded)
            .count();
        let failed = inner
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Failed)
            .count();
        (succeeded, failed)
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
