use serde::{Deserialize, Serialize};

/// 入力画像（アップローダーが正規化済みのバイト列を渡してくる）
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageData {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// 生成済みアセット（画像・音声・動画のバイト列 + メディアタイプ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAsset {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedAsset {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// 生成結果を次の合成呼び出しの入力画像として再利用する（アップスケール用）
    pub fn as_image(&self) -> ImageData {
        ImageData::new(self.data.clone(), self.mime_type.clone())
    }
}

/// プランナーの出力1件分（タイトル + 画像生成プロンプト）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedIdea {
    pub title: String,
    pub prompt: String,
}

/// キャンペーン対象プラットフォーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    InstagramPost,
    InstagramStory,
    FacebookAd,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstagramPost => "instagram_post",
            Self::InstagramStory => "instagram_story",
            Self::FacebookAd => "facebook_ad",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::InstagramPost => "Instagram Post",
            Self::InstagramStory => "Instagram Story",
            Self::FacebookAd => "Facebook Ad",
        }
    }

    /// 生成プロンプトに埋め込むアスペクト比
    pub fn aspect_ratio(&self) -> &'static str {
        match self {
            Self::InstagramPost => "1:1",
            Self::InstagramStory => "9:16",
            Self::FacebookAd => "1.91:1",
        }
    }
}

/// 逐次音声生成の成果物（WAV コンテナ済み）
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub name: String,
    pub wav: Vec<u8>,
}
