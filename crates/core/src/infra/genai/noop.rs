use async_trait::async_trait;

use super::{
    ContentService, DescribeRequest, DescribeTask, GenaiError, PlanRequest, VideoPollStatus,
};
use crate::domain::types::{GeneratedAsset, ImageData, PlannedIdea};

/// NoopContentService: ネットワークに出ない決定的なモック実装。
/// 資格情報なしでの開発・動作確認に使う
pub struct NoopContentService;

#[async_trait]
impl ContentService for NoopContentService {
    async fn describe(&self, req: DescribeRequest<'_>) -> Result<String, GenaiError> {
        let label = match req.task {
            DescribeTask::ProductDescription => "description",
            DescribeTask::SocialCaption => "caption",
            DescribeTask::VideoPrompt => "video prompt",
            DescribeTask::AdScript { .. } => "ad script",
        };
        Ok(format!("[noop {label}] {}", req.context))
    }

    async fn plan_ideas(&self, req: PlanRequest<'_>) -> Result<Vec<PlannedIdea>, GenaiError> {
        Ok((1..=req.count)
            .map(|i| PlannedIdea {
                title: format!("Idea {i}"),
                prompt: format!("noop prompt {i} for: {}", req.description),
            })
            .collect())
    }

    async fn synthesize_image(
        &self,
        prompt: &str,
        _base: &ImageData,
        _secondary: Option<&ImageData>,
    ) -> Result<GeneratedAsset, GenaiError> {
        Ok(GeneratedAsset::new(prompt.as_bytes().to_vec(), "image/png"))
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        _voice: &str,
        style_prefix: &str,
    ) -> Result<GeneratedAsset, GenaiError> {
        // 16bit PCM のふりをした無音サンプル
        let samples = vec![0u8; (style_prefix.len() + text.len()).max(2) * 2];
        Ok(GeneratedAsset::new(
            samples,
            "audio/L16;codec=pcm;rate=24000",
        ))
    }

    async fn submit_video(&self, _prompt: &str, _image: &ImageData) -> Result<String, GenaiError> {
        Ok("operations/noop".to_string())
    }

    async fn poll_video(&self, _handle: &str) -> Result<VideoPollStatus, GenaiError> {
        Ok(VideoPollStatus {
            done: true,
            result_uri: Some("noop://video".to_string()),
            error: None,
        })
    }

    async fn fetch_video(&self, _uri: &str) -> Result<Vec<u8>, GenaiError> {
        Ok(vec![0u8; 4])
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ImageData;

    fn image() -> ImageData {
        ImageData::new(vec![0u8; 8], "image/png")
    }

    #[tokio::test]
    async fn test_noop_plan_count() {
        let svc = NoopContentService;
        let img = image();
        let ideas = svc
            .plan_ideas(PlanRequest {
                base_image: &img,
                secondary_image: None,
                description: "mug",
                theme: None,
                brand: None,
                count: 6,
            })
            .await
            .unwrap();
        assert_eq!(ideas.len(), 6);
        assert_eq!(ideas[0].title, "Idea 1");
    }

    #[tokio::test]
    async fn test_noop_video_flow() {
        let svc = NoopContentService;
        let handle = svc.submit_video("zoom in", &image()).await.unwrap();
        let status = svc.poll_video(&handle).await.unwrap();
        assert!(status.done);
        let bytes = svc.fetch_video(status.result_uri.as_deref().unwrap()).await.unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_noop_name() {
        assert_eq!(NoopContentService.name(), "noop");
    }
}
