pub mod gemini;
mod noop;
pub mod prompts;

pub use noop::NoopContentService;

use async_trait::async_trait;

use crate::domain::brand::BrandIdentity;
use crate::domain::error::AppError;
use crate::domain::types::{GeneratedAsset, ImageData, PlannedIdea};

/// 生成サービスエラー
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenaiError {
    #[error("Blocked by safety filter: {0}")]
    SafetyBlocked(String),
    #[error("Empty response from content service")]
    NoContent,
    #[error("Invalid or expired API credential")]
    InvalidCredential,
    #[error("Malformed structured response: {0}")]
    Malformed(String),
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("Request timeout")]
    Timeout,
}

impl From<GenaiError> for AppError {
    fn from(e: GenaiError) -> Self {
        match &e {
            GenaiError::SafetyBlocked(_) => AppError::safety_blocked(e.to_string()),
            GenaiError::NoContent => AppError::no_content(e.to_string()),
            GenaiError::InvalidCredential => AppError::credential(e.to_string()),
            GenaiError::Malformed(_)
            | GenaiError::Transport(_)
            | GenaiError::Timeout => AppError::synthesis(e.to_string()),
        }
    }
}

/// テキスト生成の用途（用途ごとにシステムプロンプトが変わる）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribeTask {
    /// 商品画像から説明文を起こす
    ProductDescription,
    /// 完成ショットから SNS キャプションを作る
    SocialCaption,
    /// 静止画から image-to-video プロンプトを導出する
    VideoPrompt,
    /// 音声合成用の広告スクリプトを起こす（variants 本）
    AdScript { variants: usize },
}

/// テキスト生成リクエスト
#[derive(Debug, Clone)]
pub struct DescribeRequest<'a> {
    pub task: DescribeTask,
    pub image: Option<&'a ImageData>,
    /// ユーザー文脈（商品説明・テーマ・USP 等を結合したもの）
    pub context: &'a str,
    pub brand: Option<&'a BrandIdentity>,
}

/// アイディエーションリクエスト。`count` 件ちょうどの
/// `{title, prompt}` 配列を厳密に要求する
#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    pub base_image: &'a ImageData,
    pub secondary_image: Option<&'a ImageData>,
    pub description: &'a str,
    pub theme: Option<&'a str>,
    pub brand: Option<&'a BrandIdentity>,
    pub count: usize,
}

/// 動画オペレーションのポーリング結果
#[derive(Debug, Clone)]
pub struct VideoPollStatus {
    pub done: bool,
    pub result_uri: Option<String>,
    /// done かつ失敗のときのサービス側メッセージ
    pub error: Option<String>,
}

/// 外部生成コンテンツサービスへの窄い境界。
/// 機能ごとに1オペレーション。実装はコンストラクタ引数として
/// 各オーケストレーターに注入される（アンビエントな取得はしない）
#[async_trait]
pub trait ContentService: Send + Sync {
    /// 画像・文脈からの単発テキスト生成
    async fn describe(&self, req: DescribeRequest<'_>) -> Result<String, GenaiError>;

    /// アイディエーション。count 件に満たない・壊れた応答は Malformed
    async fn plan_ideas(&self, req: PlanRequest<'_>) -> Result<Vec<PlannedIdea>, GenaiError>;

    /// 画像合成（プロンプト + 参照画像 1〜2 枚）
    async fn synthesize_image(
        &self,
        prompt: &str,
        base: &ImageData,
        secondary: Option<&ImageData>,
    ) -> Result<GeneratedAsset, GenaiError>;

    /// 音声合成。生 PCM とそのメディアタイプをそのまま返す
    async fn synthesize_speech(
        &self,
        text: &str,
        voice: &str,
        style_prefix: &str,
    ) -> Result<GeneratedAsset, GenaiError>;

    /// 動画ジョブ投入。不透明なオペレーションハンドルを返す
    async fn submit_video(&self, prompt: &str, image: &ImageData) -> Result<String, GenaiError>;

    /// ハンドルで動画ジョブの状態を照会する
    async fn poll_video(&self, handle: &str) -> Result<VideoPollStatus, GenaiError>;

    /// 終端参照から最終バイト列を取得する（ポーリングとは別のネットワーク操作）
    async fn fetch_video(&self, uri: &str) -> Result<Vec<u8>, GenaiError>;

    fn name(&self) -> &str;
}
