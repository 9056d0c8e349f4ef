use serde::Serialize;

use super::error::AppError;
use super::types::GeneratedAsset;

/// バッチ内で安定なジョブ識別子（計画時に振られる序数）
pub type JobId = usize;

/// ジョブ状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// 終端状態（これ以上自動遷移しない）かどうか
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// 生成ジョブ1件。
///
/// 不変条件: `result` と `error` は同時に Some にならない。
/// `result` は Succeeded のときのみ、`error` は Failed のときのみ Some。
/// 遷移は下のメソッド経由でのみ行い、不変条件を機械的に守る。
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub prompt: String,
    pub status: JobStatus,
    pub result: Option<GeneratedAsset>,
    pub error: Option<AppError>,
    /// ライフサイクル状態と直交する「アップスケール実行中」フラグ。
    /// 完成画像を表示したまま再アップスケール中、が同時に成り立つ
    pub upscaling: bool,
    pub created_at: String,
}

impl Job {
    pub fn new(id: JobId, title: String, prompt: String, now: String) -> Self {
        Self {
            id,
            title,
            prompt,
            status: JobStatus::Pending,
            result: None,
            error: None,
            upscaling: false,
            created_at: now,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = JobStatus::Running;
        self.result = None;
        self.error = None;
    }

    pub fn complete(&mut self, asset: GeneratedAsset) {
        self.status = JobStatus::Succeeded;
        self.result = Some(asset);
        self.error = None;
    }

    pub fn fail(&mut self, error: AppError) {
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.result = None;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
