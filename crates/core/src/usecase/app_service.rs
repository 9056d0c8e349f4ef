use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;

use super::fanout::{BatchEvent, FanoutExecutor};
use super::job_store::JobStore;
use super::planner::{PlanInputs, Planner};
use super::rerun::RerunExecutor;
use super::sequential::{SequentialExecutor, SpeechEvent};
use super::video::VideoGenerator;
use crate::domain::brand::BrandIdentity;
use crate::domain::error::AppError;
use crate::domain::job::JobId;
use crate::domain::types::{AudioClip, ImageData, Platform};
use crate::infra::genai::{ContentService, DescribeRequest, DescribeTask};
use crate::infra::metrics::{Metrics, MetricsSummary};

/// スタジオ全体のファサード。
///
/// 各オーケストレーターを束ね、メトリクスの記録とエラーの
/// 集計をここで一括して行う。UI 層はこの構造体とイベント
/// チャネルだけを見る
pub struct StudioService {
    service: Arc<dyn ContentService>,
    planner: Planner,
    fanout: FanoutExecutor,
    sequential: SequentialExecutor,
    rerun: RerunExecutor,
    video: VideoGenerator,
    metrics: Metrics,
}

impl StudioService {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self {
            planner: Planner::new(Arc::clone(&service)),
            fanout: FanoutExecutor::new(Arc::clone(&service)),
            sequential: SequentialExecutor::new(Arc::clone(&service)),
            rerun: RerunExecutor::new(Arc::clone(&service)),
            video: VideoGenerator::new(Arc::clone(&service)),
            metrics: Metrics::new(),
            service,
        }
    }

    /// テスト・低速環境向けにポーリングスケジュールを差し替える
    pub fn with_video_schedule(
        mut self,
        poll_interval: std::time::Duration,
        max_polls: u32,
    ) -> Self {
        self.video = VideoGenerator::new(Arc::clone(&self.service))
            .with_schedule(poll_interval, max_polls);
        self
    }

    fn record_error(&self, err: &AppError) {
        self.metrics.inc_error(err.code.as_str());
    }

    async fn describe_with(
        &self,
        task: DescribeTask,
        image: Option<&ImageData>,
        context: &str,
        brand: Option<&BrandIdentity>,
    ) -> Result<String, AppError> {
        self.service
            .describe(DescribeRequest {
                task,
                image,
                context,
                brand,
            })
            .await
            .map_err(|e| {
                let err = AppError::from(e);
                self.record_error(&err);
                err
            })
    }

    /// 商品画像から説明文を起こす
    pub async fn describe_product(&self, image: &ImageData) -> Result<String, AppError> {
        self.describe_with(DescribeTask::ProductDescription, Some(image), "", None)
            .await
    }

    /// 完成ショットの SNS キャプションを提案する
    pub async fn suggest_caption(
        &self,
        image: &ImageData,
        context: &str,
        brand: Option<&BrandIdentity>,
    ) -> Result<String, AppError> {
        self.describe_with(DescribeTask::SocialCaption, Some(image), context, brand)
            .await
    }

    /// 静止画から image-to-video プロンプトを導出する
    pub async fn draft_video_prompt(
        &self,
        image: &ImageData,
        context: &str,
    ) -> Result<String, AppError> {
        self.describe_with(DescribeTask::VideoPrompt, Some(image), context, None)
            .await
    }

    /// 音声合成向けの広告スクリプトを起こす
    pub async fn draft_ad_script(
        &self,
        context: &str,
        variants: usize,
        brand: Option<&BrandIdentity>,
    ) -> Result<String, AppError> {
        self.describe_with(DescribeTask::AdScript { variants }, None, context, brand)
            .await
    }

    /// 撮影バッチの本線: 計画 → 登録 → ファンアウト実行。
    /// 計画が失敗したらストアは返らず、ジョブは1件も作られない
    pub async fn generate_shots(
        &self,
        inputs: &PlanInputs,
        events: &UnboundedSender<BatchEvent>,
    ) -> Result<JobStore, AppError> {
        let started = Instant::now();
        let ideas = self.planner.plan(inputs).await.map_err(|e| {
            self.record_error(&e);
            e
        })?;
        self.metrics
            .record_latency("plan", started.elapsed().as_millis() as u64);
        self.metrics.inc_batches_planned();

        let store = JobStore::new();
        store.seed(ideas).await?;

        let started = Instant::now();
        let (succeeded, failed) = self
            .fanout
            .run(
                &store,
                &inputs.base_image,
                inputs.secondary_image.as_ref(),
                events,
            )
            .await;
        self.metrics
            .record_latency("synthesize", started.elapsed().as_millis() as u64);
        self.metrics.add_job_outcomes(succeeded as u64, failed as u64);
        Ok(store)
    }

    /// マルチプラットフォームキャンペーン: プラットフォームごとに
    /// 1件ずつ計画し、レート制約を避けて画像を直列に生成する。
    /// ジョブタイトルはプラットフォーム表示名で固定される
    pub async fn generate_campaign(
        &self,
        base_image: &ImageData,
        description: &str,
        platforms: &[Platform],
        brand: Option<&BrandIdentity>,
        events: &UnboundedSender<BatchEvent>,
    ) -> Result<JobStore, AppError> {
        if platforms.is_empty() {
            return Err(AppError::planning("at least one platform is required"));
        }

        let mut inputs = PlanInputs::new(base_image.clone(), description);
        inputs.theme = Some(crate::infra::genai::prompts::campaign_context(platforms));
        inputs.brand = brand.cloned();
        inputs.count = platforms.len();

        let started = Instant::now();
        let mut ideas = self.planner.plan(&inputs).await.map_err(|e| {
            self.record_error(&e);
            e
        })?;
        self.metrics
            .record_latency("plan", started.elapsed().as_millis() as u64);
        self.metrics.inc_batches_planned();

        // 出力はプラットフォーム列挙順と同順なので、タイトルを
        // 表示名で上書きする
        for (idea, platform) in ideas.iter_mut().zip(platforms) {
            idea.title = platform.display_name().to_string();
        }

        let store = JobStore::new();
        let ids = store.seed(ideas).await?;

        let started = Instant::now();
        for id in ids {
            let Some(job) = store.get(id).await else { continue };
            store.mark_running(id).await;
            let _ = events.send(BatchEvent::JobStarted { id });

            match self
                .service
                .synthesize_image(&job.prompt, base_image, None)
                .await
            {
                Ok(asset) => store.complete(id, asset).await,
                Err(e) => {
                    let err = AppError::from(e);
                    log::warn!("キャンペーンジョブ {id} の合成に失敗: {err}");
                    self.record_error(&err);
                    store.fail(id, err).await;
                }
            }
            let status = store
                .get(id)
                .await
                .map(|j| j.status)
                .unwrap_or(crate::domain::job::JobStatus::Failed);
            let _ = events.send(BatchEvent::JobFinished { id, status });
        }
        self.metrics
            .record_latency("synthesize", started.elapsed().as_millis() as u64);

        let (succeeded, failed) = store.outcome_counts().await;
        self.metrics.add_job_outcomes(succeeded as u64, failed as u64);
        let _ = events.send(BatchEvent::BatchCompleted { succeeded, failed });
        Ok(store)
    }

    /// スクリプト群を入力順どおりに音声化する
    pub async fn generate_voiceovers(
        &self,
        scripts: &[String],
        voice: &str,
        style_prefix: &str,
        events: &UnboundedSender<SpeechEvent>,
    ) -> Vec<AudioClip> {
        let started = Instant::now();
        let clips = self
            .sequential
            .run(scripts, voice, style_prefix, events)
            .await;
        self.metrics
            .record_latency("speech", started.elapsed().as_millis() as u64);
        for _ in &clips {
            self.metrics.inc_clips_generated();
        }
        clips
    }

    /// 成功済みジョブのアップスケール
    pub async fn upscale_job(
        &self,
        store: &JobStore,
        id: JobId,
        events: &UnboundedSender<BatchEvent>,
    ) -> Result<(), AppError> {
        let started = Instant::now();
        let result = self.rerun.upscale(store, id, events).await;
        self.metrics
            .record_latency("synthesize", started.elapsed().as_millis() as u64);
        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    /// 終端ジョブの再生成（任意でプロンプト差し替え）
    pub async fn regenerate_job(
        &self,
        store: &JobStore,
        id: JobId,
        prompt_override: Option<String>,
        base_image: &ImageData,
        secondary_image: Option<&ImageData>,
        events: &UnboundedSender<BatchEvent>,
    ) -> Result<(), AppError> {
        self.rerun
            .regenerate(store, id, prompt_override, base_image, secondary_image, events)
            .await
    }

    /// 動画生成の一括実行（投入 → ポーリング → 取得）
    pub async fn generate_video(
        &self,
        prompt: &str,
        image: &ImageData,
    ) -> Result<Vec<u8>, AppError> {
        let started = Instant::now();
        let result = self.video.generate(prompt, image).await;
        self.metrics
            .record_latency("video", started.elapsed().as_millis() as u64);
        match &result {
            Ok(_) => self.metrics.inc_videos_generated(),
            Err(e) => self.record_error(e),
        }
        result
    }

    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::genai::NoopContentService;

    fn studio() -> StudioService {
        StudioService::new(Arc::new(NoopContentService))
    }

    fn image() -> ImageData {
        ImageData::new(vec![0u8; 4], "image/png")
    }

    #[tokio::test]
    async fn test_generate_shots_end_to_end() {
        let studio = studio();
        let inputs = PlanInputs::new(image(), "a ceramic mug");

        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let store = studio.generate_shots(&inputs, &tx).await.unwrap();

        assert_eq!(store.len().await, 6);
        assert!(store.all_terminal().await);
        assert_eq!(store.outcome_counts().await, (6, 0));

        let summary = studio.metrics();
        assert_eq!(summary.batches_planned, 1);
        assert_eq!(summary.jobs_succeeded, 6);
        assert!(summary.avg_latency_ms.plan.is_some());
    }

    #[tokio::test]
    async fn test_campaign_titles_follow_platform_order() {
        let studio = studio();
        let platforms = [
            Platform::InstagramPost,
            Platform::InstagramStory,
            Platform::FacebookAd,
        ];

        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let store = studio
            .generate_campaign(&image(), "a ceramic mug", &platforms, None, &tx)
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].title, "Instagram Post");
        assert_eq!(snapshot[1].title, "Instagram Story");
        assert_eq!(snapshot[2].title, "Facebook Ad");
        assert!(store.all_terminal().await);
    }

    #[tokio::test]
    async fn test_campaign_rejects_empty_platform_list() {
        let studio = studio();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let err = studio
            .generate_campaign(&image(), "a mug", &[], None, &tx)
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::domain::error::ErrorCode::Planning);
    }

    #[tokio::test]
    async fn test_voiceovers_count_metric() {
        let studio = studio();
        let scripts = vec!["first take".to_string(), "second take".to_string()];

        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let clips = studio.generate_voiceovers(&scripts, "Aoede", "", &tx).await;

        assert_eq!(clips.len(), 2);
        assert_eq!(studio.metrics().clips_generated, 2);
    }

    #[tokio::test]
    async fn test_video_end_to_end() {
        let studio = studio();
        let bytes = studio
            .generate_video("slow zoom in", &image())
            .await
            .unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(studio.metrics().videos_generated, 1);
    }

    #[tokio::test]
    async fn test_describe_helpers() {
        let studio = studio();
        let desc = studio.describe_product(&image()).await.unwrap();
        assert!(desc.contains("description"));

        let script = studio.draft_ad_script("ceramic mug, handmade", 2, None).await.unwrap();
        assert!(script.contains("ad script"));
    }
}
