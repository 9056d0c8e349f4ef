use serde::Serialize;

use super::error::AppError;

/// 動画オペレーションの局面: Submitted -> Polling -> {Succeeded, Failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoPhase {
    Submitted,
    Polling,
    Succeeded,
    Failed,
}

/// ロングポーラーの状態。
/// Succeeded でも `result_uri` は参照にすぎず、取得ステップを経て
/// 初めて最終コンテンツになる
#[derive(Debug, Clone)]
pub struct VideoOperation {
    /// サービスが返す不透明なオペレーションハンドル
    pub handle: String,
    pub phase: VideoPhase,
    pub done: bool,
    /// 発行済みポーリング回数
    pub polls: u32,
    pub result_uri: Option<String>,
    pub failure: Option<AppError>,
}

impl VideoOperation {
    pub fn new(handle: String) -> Self {
        Self {
            handle,
            phase: VideoPhase::Submitted,
            done: false,
            polls: 0,
            result_uri: None,
            failure: None,
        }
    }

    pub fn succeed(&mut self, uri: String) {
        self.done = true;
        self.result_uri = Some(uri);
        self.failure = None;
        self.phase = VideoPhase::Succeeded;
    }

    pub fn fail(&mut self, error: AppError) {
        self.done = true;
        self.failure = Some(error);
        self.phase = VideoPhase::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases() {
        let mut op = VideoOperation::new("operations/abc".into());
        assert_eq!(op.phase, VideoPhase::Submitted);
        op.phase = VideoPhase::Polling;
        op.succeed("https://example/video.mp4".into());
        assert!(op.done);
        assert_eq!(op.phase, VideoPhase::Succeeded);
        assert!(op.failure.is_none());
    }

    #[test]
    fn test_fail_sets_terminal() {
        let mut op = VideoOperation::new("operations/abc".into());
        op.fail(AppError::credential("API key rejected"));
        assert!(op.done);
        assert_eq!(op.phase, VideoPhase::Failed);
        assert!(op.result_uri.is_none());
    }
}
