//! kirei-core: 生成オーケストレーションエンジン。
//!
//! 1回のユーザーリクエストを独立した生成ジョブのバッチに変換し、
//! 外部の生成コンテンツサービス（Gemini 系 REST API）に対して
//! 並行ディスパッチ・逐次ディスパッチ・単一ジョブ再実行・
//! 動画ロングポーリングを行う。UI・永続化・エクスポートは
//! このクレートの外側のコラボレーター。

pub mod domain;
pub mod infra;
pub mod usecase;
