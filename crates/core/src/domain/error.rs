use serde::Serialize;

/// エンジン共通エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    /// プランニング失敗（バッチ全体が中止される唯一の致命エラー）
    #[serde(rename = "E_PLANNING")]
    Planning,
    #[serde(rename = "E_SYNTHESIS")]
    Synthesis,
    #[serde(rename = "E_SAFETY_BLOCKED")]
    SafetyBlocked,
    #[serde(rename = "E_NO_CONTENT")]
    NoContent,
    /// 資格情報が無効・期限切れ。呼び出し側は再選択を促す
    #[serde(rename = "E_CREDENTIAL")]
    Credential,
    #[serde(rename = "E_POLL_TIMEOUT")]
    PollTimeout,
    #[serde(rename = "E_RETRIEVAL")]
    Retrieval,
    #[serde(rename = "E_INVALID_STATE")]
    InvalidState,
    #[serde(rename = "E_INTERNAL")]
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "E_PLANNING",
            Self::Synthesis => "E_SYNTHESIS",
            Self::SafetyBlocked => "E_SAFETY_BLOCKED",
            Self::NoContent => "E_NO_CONTENT",
            Self::Credential => "E_CREDENTIAL",
            Self::PollTimeout => "E_POLL_TIMEOUT",
            Self::Retrieval => "E_RETRIEVAL",
            Self::InvalidState => "E_INVALID_STATE",
            Self::Internal => "E_INTERNAL",
        }
    }
}

/// アプリケーションエラー（ジョブに保存され、UIにもそのまま渡せる）
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub recoverable: bool,
}

impl AppError {
    pub fn planning(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Planning,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Synthesis,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn safety_blocked(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::SafetyBlocked,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn no_content(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NoContent,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn credential(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Credential,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn poll_timeout(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::PollTimeout,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Retrieval,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidState,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: msg.into(),
            recoverable: false,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}
