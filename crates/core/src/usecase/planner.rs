use std::sync::Arc;

use crate::domain::brand::BrandIdentity;
use crate::domain::error::AppError;
use crate::domain::types::{ImageData, PlannedIdea};
use crate::infra::genai::{ContentService, PlanRequest};

/// 1バッチの既定ジョブ数
pub const DEFAULT_SHOT_COUNT: usize = 6;

/// プランナーへの入力。ベース画像と説明文は必須、
/// 2枚目の画像とテーマ・ブランドは任意
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub base_image: ImageData,
    pub secondary_image: Option<ImageData>,
    pub description: String,
    pub theme: Option<String>,
    pub brand: Option<BrandIdentity>,
    pub count: usize,
}

impl PlanInputs {
    pub fn new(base_image: ImageData, description: impl Into<String>) -> Self {
        Self {
            base_image,
            secondary_image: None,
            description: description.into(),
            theme: None,
            brand: None,
            count: DEFAULT_SHOT_COUNT,
        }
    }
}

/// ユーザーリクエストをジョブ仕様の順序付きリストに変換する。
/// ここが唯一の全体失敗点: 失敗したらジョブは1件も作られない
pub struct Planner {
    service: Arc<dyn ContentService>,
}

impl Planner {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }

    pub async fn plan(&self, inputs: &PlanInputs) -> Result<Vec<PlannedIdea>, AppError> {
        if inputs.description.trim().is_empty() {
            return Err(AppError::planning("product description must not be empty"));
        }
        if inputs.count == 0 {
            return Err(AppError::planning("batch size must be at least 1"));
        }

        let ideas = self
            .service
            .plan_ideas(PlanRequest {
                base_image: &inputs.base_image,
                secondary_image: inputs.secondary_image.as_ref(),
                description: &inputs.description,
                theme: inputs.theme.as_deref(),
                brand: inputs.brand.as_ref(),
                count: inputs.count,
            })
            .await
            // プランニング中のクライアントエラーはすべて致命扱い
            .map_err(|e| AppError::planning(e.to_string()))?;

        if ideas.len() != inputs.count {
            return Err(AppError::planning(format!(
                "planner returned {} ideas, expected {}",
                ideas.len(),
                inputs.count
            )));
        }

        log::info!("プラン確定: {} 件", ideas.len());
        Ok(ideas)
    }
}
