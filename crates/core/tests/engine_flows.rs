//! エンジン全体の結合テスト。
//! ネットワークには出ず、台本化した ContentService で各フローを通す

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use kirei_core::domain::error::ErrorCode;
use kirei_core::domain::job::JobStatus;
use kirei_core::domain::types::{GeneratedAsset, ImageData, Platform, PlannedIdea};
use kirei_core::infra::genai::{
    ContentService, DescribeRequest, GenaiError, NoopContentService, PlanRequest, VideoPollStatus,
};
use kirei_core::usecase::app_service::StudioService;
use kirei_core::usecase::planner::PlanInputs;

/// 台本化サービス: プランは常に count 件、画像はプロンプトに
/// "fail" を含むときだけ落ちる。動画は 3 回目の照会で完了する
struct ScriptedStudio {
    image_calls: AtomicUsize,
    video_polls: AtomicUsize,
    speech_texts: Mutex<Vec<String>>,
}

impl ScriptedStudio {
    fn new() -> Self {
        Self {
            image_calls: AtomicUsize::new(0),
            video_polls: AtomicUsize::new(0),
            speech_texts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContentService for ScriptedStudio {
    async fn describe(&self, req: DescribeRequest<'_>) -> Result<String, GenaiError> {
        Ok(format!("described: {}", req.context))
    }

    async fn plan_ideas(&self, req: PlanRequest<'_>) -> Result<Vec<PlannedIdea>, GenaiError> {
        Ok((1..=req.count)
            .map(|i| PlannedIdea {
                title: format!("Shot {i}"),
                prompt: if i == 3 {
                    "fail shot 3".to_string()
                } else {
                    format!("shot {i}")
                },
            })
            .collect())
    }

    async fn synthesize_image(
        &self,
        prompt: &str,
        _base: &ImageData,
        _secondary: Option<&ImageData>,
    ) -> Result<GeneratedAsset, GenaiError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("fail") {
            Err(GenaiError::SafetyBlocked("PROHIBITED_CONTENT".into()))
        } else {
            Ok(GeneratedAsset::new(prompt.as_bytes().to_vec(), "image/png"))
        }
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        _voice: &str,
        _style_prefix: &str,
    ) -> Result<GeneratedAsset, GenaiError> {
        self.speech_texts.lock().unwrap().push(text.to_string());
        Ok(GeneratedAsset::new(
            vec![0, 0, 1, 0],
            "audio/L16;codec=pcm;rate=24000",
        ))
    }

    async fn submit_video(&self, _prompt: &str, _image: &ImageData) -> Result<String, GenaiError> {
        Ok("operations/integration".to_string())
    }

    async fn poll_video(&self, _handle: &str) -> Result<VideoPollStatus, GenaiError> {
        let n = self.video_polls.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= 3 {
            Ok(VideoPollStatus {
                done: true,
                result_uri: Some("https://example/video.mp4".to_string()),
                error: None,
            })
        } else {
            Ok(VideoPollStatus {
                done: false,
                result_uri: None,
                error: None,
            })
        }
    }

    async fn fetch_video(&self, _uri: &str) -> Result<Vec<u8>, GenaiError> {
        Ok(b"final mp4".to_vec())
    }

    fn name(&self) -> &str {
        "scripted-studio"
    }
}

fn image() -> ImageData {
    ImageData::new(vec![0u8; 8], "image/png")
}

#[tokio::test]
async fn test_shot_batch_with_partial_failure() {
    let service = Arc::new(ScriptedStudio::new());
    let studio = StudioService::new(Arc::clone(&service) as Arc<dyn ContentService>);
    let inputs = PlanInputs::new(image(), "handmade ceramic mug");

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let store = studio.generate_shots(&inputs, &tx).await.unwrap();

    assert_eq!(store.len().await, 6);
    assert!(store.all_terminal().await);
    assert_eq!(store.outcome_counts().await, (5, 1));
    assert_eq!(service.image_calls.load(Ordering::SeqCst), 6);

    // 失敗したのは id=2 のジョブだけで、他は自分の結果を持つ
    for job in store.snapshot().await {
        if job.id == 2 {
            assert_eq!(job.status, JobStatus::Failed);
            assert_eq!(job.error.as_ref().unwrap().code, ErrorCode::SafetyBlocked);
        } else {
            assert_eq!(job.status, JobStatus::Succeeded);
            assert_eq!(
                job.result.as_ref().unwrap().data,
                job.prompt.as_bytes().to_vec()
            );
        }
    }

    let summary = studio.metrics();
    assert_eq!(summary.jobs_succeeded, 5);
    assert_eq!(summary.jobs_failed, 1);
}

#[tokio::test]
async fn test_upscale_preserves_identity_and_survives_failure() {
    let studio = StudioService::new(Arc::new(NoopContentService));
    let inputs = PlanInputs::new(image(), "a leather wallet");

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let store = studio.generate_shots(&inputs, &tx).await.unwrap();

    let before = store.get(0).await.unwrap();
    studio.upscale_job(&store, 0, &tx).await.unwrap();
    let after = store.get(0).await.unwrap();

    // id・タイトル・プロンプトは不変、結果だけ差し替わり、フラグは戻る
    assert_eq!(after.id, before.id);
    assert_eq!(after.title, before.title);
    assert_eq!(after.prompt, before.prompt);
    assert_eq!(after.status, JobStatus::Succeeded);
    assert!(!after.upscaling);
    assert_ne!(after.result, before.result);
}

#[tokio::test]
async fn test_regenerate_with_prompt_override() {
    let studio = StudioService::new(Arc::new(ScriptedStudio::new()));
    let inputs = PlanInputs::new(image(), "handmade ceramic mug");

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let store = studio.generate_shots(&inputs, &tx).await.unwrap();
    assert_eq!(store.get(2).await.unwrap().status, JobStatus::Failed);

    studio
        .regenerate_job(&store, 2, Some("shot 3 retake".into()), &image(), None, &tx)
        .await
        .unwrap();

    let job = store.get(2).await.unwrap();
    assert_eq!(job.id, 2);
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.prompt, "shot 3 retake");
    assert_eq!(job.result.unwrap().data, b"shot 3 retake".to_vec());
}

#[tokio::test]
async fn test_campaign_is_sequential_and_ordered() {
    let studio = StudioService::new(Arc::new(NoopContentService));
    let platforms = [Platform::InstagramStory, Platform::FacebookAd];

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let store = studio
        .generate_campaign(&image(), "a ceramic mug", &platforms, None, &tx)
        .await
        .unwrap();
    drop(tx);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot[0].title, "Instagram Story");
    assert_eq!(snapshot[1].title, "Facebook Ad");

    // 完了イベントは最後に一度だけ
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    let completed: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, kirei_core::usecase::fanout::BatchEvent::BatchCompleted { .. }))
        .collect();
    assert_eq!(completed.len(), 1);
    assert!(matches!(
        events.last().unwrap(),
        kirei_core::usecase::fanout::BatchEvent::BatchCompleted { succeeded: 2, failed: 0 }
    ));
}

#[tokio::test]
async fn test_voiceover_clips_are_wav_in_input_order() {
    let service = Arc::new(ScriptedStudio::new());
    let studio = StudioService::new(Arc::clone(&service) as Arc<dyn ContentService>);
    let scripts = vec!["take one".to_string(), "take two".to_string()];

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let clips = studio.generate_voiceovers(&scripts, "Aoede", "", &tx).await;

    assert_eq!(clips.len(), 2);
    assert_eq!(clips[0].name, "audio_1.wav");
    assert_eq!(&clips[0].wav[0..4], b"RIFF");
    assert_eq!(*service.speech_texts.lock().unwrap(), scripts);
}

#[tokio::test(start_paused = true)]
async fn test_video_flow_polls_then_fetches() {
    let service = Arc::new(ScriptedStudio::new());
    let studio = StudioService::new(Arc::clone(&service) as Arc<dyn ContentService>)
        .with_video_schedule(Duration::from_secs(10), 90);

    let bytes = studio
        .generate_video("slow dolly shot forward", &image())
        .await
        .unwrap();

    assert_eq!(bytes, b"final mp4");
    assert_eq!(service.video_polls.load(Ordering::SeqCst), 3);
    assert_eq!(studio.metrics().videos_generated, 1);
}
