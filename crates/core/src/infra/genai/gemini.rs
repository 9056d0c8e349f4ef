use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::prompts;
use super::{
    ContentService, DescribeRequest, DescribeTask, GenaiError, PlanRequest, VideoPollStatus,
};
use crate::domain::types::{GeneratedAsset, ImageData, PlannedIdea};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const TEXT_MODEL: &str = "gemini-2.5-flash";
const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
const VIDEO_MODEL: &str = "veo-3.0-generate-001";

/// Gemini REST API を使用した生成コンテンツクライアント。
/// 資格情報は不透明な文字列として外部から渡される
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn image(image: &ImageData) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: BASE64.encode(&image.bytes),
            }),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<ResponseInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseInlineData {
    mime_type: Option<String>,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Serialize)]
struct VideoSubmitRequest {
    instances: Vec<VideoInstance>,
}

#[derive(Serialize)]
struct VideoInstance {
    prompt: String,
    image: VideoImage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Deserialize)]
struct OperationRef {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    response: Option<OperationResponse>,
    error: Option<OperationError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

#[derive(Deserialize)]
struct OperationError {
    message: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// テスト用サーバー等に向ける場合のコンストラクタ
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        // 画像・音声合成は遅いので長めのタイムアウト
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(180))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
        }
    }

    fn map_request_error(e: reqwest::Error) -> GenaiError {
        if e.is_timeout() {
            GenaiError::Timeout
        } else {
            GenaiError::Transport(format!("HTTP request failed: {e}"))
        }
    }

    /// ステータスコードをエラー種別に落とす。401/403 は資格情報エラー
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GenaiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
            || body.contains("API key not valid")
            || body.contains("API_KEY_INVALID")
        {
            return Err(GenaiError::InvalidCredential);
        }
        Err(GenaiError::Transport(format!(
            "Content service error: {status} - {body}"
        )))
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenaiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(Self::map_request_error)?;
        let response = Self::check_status(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenaiError::Malformed(format!("Response parse error: {e}")))?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(GenaiError::SafetyBlocked(reason));
        }
        Ok(parsed)
    }

    /// 先頭候補のテキストパートを結合して返す
    fn extract_text(response: GenerateContentResponse) -> Result<String, GenaiError> {
        let candidate = response.candidates.into_iter().next().ok_or(GenaiError::NoContent)?;
        Self::check_finish_reason(candidate.finish_reason.as_deref())?;

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenaiError::NoContent);
        }
        Ok(text.trim().to_string())
    }

    /// 先頭候補の最初のインラインデータをデコードして返す
    fn extract_inline(
        response: GenerateContentResponse,
        default_mime: &str,
    ) -> Result<GeneratedAsset, GenaiError> {
        let candidate = response.candidates.into_iter().next().ok_or(GenaiError::NoContent)?;
        Self::check_finish_reason(candidate.finish_reason.as_deref())?;

        let inline = candidate
            .content
            .into_iter()
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .ok_or(GenaiError::NoContent)?;

        let data = BASE64
            .decode(inline.data.as_bytes())
            .map_err(|e| GenaiError::Malformed(format!("Invalid base64 payload: {e}")))?;
        Ok(GeneratedAsset::new(
            data,
            inline.mime_type.unwrap_or_else(|| default_mime.to_string()),
        ))
    }

    fn check_finish_reason(reason: Option<&str>) -> Result<(), GenaiError> {
        match reason {
            Some(r @ ("SAFETY" | "IMAGE_SAFETY" | "PROHIBITED_CONTENT")) => {
                Err(GenaiError::SafetyBlocked(r.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// ```json フェンスで包まれた応答からペイロードを取り出す
fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl ContentService for GeminiClient {
    async fn describe(&self, req: DescribeRequest<'_>) -> Result<String, GenaiError> {
        let system = match req.task {
            DescribeTask::ProductDescription => prompts::SYSTEM_DESCRIBE.to_string(),
            DescribeTask::SocialCaption => prompts::SYSTEM_CAPTION.to_string(),
            DescribeTask::VideoPrompt => prompts::SYSTEM_VIDEO_PROMPT.to_string(),
            DescribeTask::AdScript { variants } => prompts::ad_script_system(variants),
        };

        let mut context = req.context.to_string();
        if let Some(brand_ctx) = req.brand.and_then(|b| b.prompt_context()) {
            context.push('\n');
            context.push_str(&brand_ctx);
        }

        let mut parts = vec![Part::text(context)];
        if let Some(image) = req.image {
            parts.push(Part::image(image));
        }

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            system_instruction: Some(Content {
                parts: vec![Part::text(system)],
            }),
            generation_config: None,
        };

        let response = self.generate(TEXT_MODEL, &request).await?;
        Self::extract_text(response)
    }

    async fn plan_ideas(&self, req: PlanRequest<'_>) -> Result<Vec<PlannedIdea>, GenaiError> {
        let query = prompts::build_plan_query(req.description, req.theme, req.brand);
        let mut parts = vec![Part::text(query), Part::image(req.base_image)];
        if let Some(secondary) = req.secondary_image {
            parts.push(Part::image(secondary));
        }

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            system_instruction: Some(Content {
                parts: vec![Part::text(prompts::plan_system(req.count))],
            }),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_modalities: None,
                speech_config: None,
            }),
        };

        let response = self.generate(TEXT_MODEL, &request).await?;
        let text = Self::extract_text(response)?;
        let mut ideas: Vec<PlannedIdea> = serde_json::from_str(strip_json_fence(&text))
            .map_err(|e| GenaiError::Malformed(format!("Plan response is not valid JSON: {e}")))?;

        if ideas.len() < req.count {
            return Err(GenaiError::Malformed(format!(
                "Plan returned {} ideas, expected {}",
                ideas.len(),
                req.count
            )));
        }
        if ideas.len() > req.count {
            log::warn!(
                "プランが{}件返された（要求は{}件）。余剰を捨てる",
                ideas.len(),
                req.count
            );
            ideas.truncate(req.count);
        }
        Ok(ideas)
    }

    async fn synthesize_image(
        &self,
        prompt: &str,
        base: &ImageData,
        secondary: Option<&ImageData>,
    ) -> Result<GeneratedAsset, GenaiError> {
        let final_prompt = format!("{prompt}{}", prompts::IMAGE_STYLE_SUFFIX);
        let mut parts = vec![Part::text(final_prompt), Part::image(base)];
        if let Some(secondary) = secondary {
            parts.push(Part::image(secondary));
        }

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: None,
                response_modalities: Some(vec!["IMAGE".to_string()]),
                speech_config: None,
            }),
        };

        let response = self.generate(IMAGE_MODEL, &request).await?;
        Self::extract_inline(response, "image/png")
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        voice: &str,
        style_prefix: &str,
    ) -> Result<GeneratedAsset, GenaiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(format!("{style_prefix}{text}"))],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: None,
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
            }),
        };

        let response = self.generate(TTS_MODEL, &request).await?;
        // TTS は生 PCM を返す。WAV 化は呼び出し側の責務
        Self::extract_inline(response, "audio/L16;codec=pcm;rate=24000")
    }

    async fn submit_video(&self, prompt: &str, image: &ImageData) -> Result<String, GenaiError> {
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.base_url, VIDEO_MODEL
        );
        let request = VideoSubmitRequest {
            instances: vec![VideoInstance {
                prompt: prompt.to_string(),
                image: VideoImage {
                    bytes_base64_encoded: BASE64.encode(&image.bytes),
                    mime_type: image.mime_type.clone(),
                },
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_request_error)?;
        let response = Self::check_status(response).await?;

        let op: OperationRef = response
            .json()
            .await
            .map_err(|e| GenaiError::Malformed(format!("Operation parse error: {e}")))?;
        Ok(op.name)
    }

    async fn poll_video(&self, handle: &str) -> Result<VideoPollStatus, GenaiError> {
        let url = format!("{}/{}", self.base_url, handle);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(Self::map_request_error)?;
        let response = Self::check_status(response).await?;

        let status: OperationStatus = response
            .json()
            .await
            .map_err(|e| GenaiError::Malformed(format!("Operation parse error: {e}")))?;

        let result_uri = status
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|s| s.video)
            .and_then(|v| v.uri);

        Ok(VideoPollStatus {
            done: status.done,
            result_uri,
            error: status.error.map(|e| {
                e.message
                    .unwrap_or_else(|| "video generation failed".to_string())
            }),
        })
    }

    async fn fetch_video(&self, uri: &str) -> Result<Vec<u8>, GenaiError> {
        let response = self
            .client
            .get(uri)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(Self::map_request_error)?;
        let response = Self::check_status(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenaiError::Transport(format!("Failed to read video bytes: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
