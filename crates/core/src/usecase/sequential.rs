use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::types::AudioClip;
use crate::infra::genai::ContentService;
use crate::infra::wav;

/// 逐次実行の進行イベント
#[derive(Debug, Clone)]
pub enum SpeechEvent {
    /// 各ステップのディスパッチ直前に発火する進行ラベル
    Progress {
        index: usize,
        total: usize,
        label: String,
    },
    ClipReady { index: usize, name: String },
    /// 個別の失敗は通知して次のアイテムへ進む
    ClipFailed { index: usize, message: String },
}

/// 逐次実行器。
///
/// レート制約の強い音声合成をアイテム単位で厳密に直列処理し、
/// 結果が得られ次第リストに追記していく。ファンアウトと違い
/// スループットを捨てて、予測可能な進行表示と素朴なアイテム別
/// エラー報告を取る
pub struct SequentialExecutor {
    service: Arc<dyn ContentService>,
}

impl SequentialExecutor {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }

    /// スクリプトを入力順どおりに音声化する。アイテム i+1 は
    /// アイテム i の完了前には決してディスパッチされない
    pub async fn run(
        &self,
        scripts: &[String],
        voice: &str,
        style_prefix: &str,
        events: &UnboundedSender<SpeechEvent>,
    ) -> Vec<AudioClip> {
        let total = scripts.len();
        let mut clips = Vec::new();

        for (index, script) in scripts.iter().enumerate() {
            let _ = events.send(SpeechEvent::Progress {
                index,
                total,
                label: format!("processing {}/{}", index + 1, total),
            });

            match self
                .service
                .synthesize_speech(script, voice, style_prefix)
                .await
            {
                Ok(asset) => {
                    let sample_rate = wav::sample_rate_from_mime(&asset.mime_type);
                    match wav::pcm_to_wav(&asset.data, sample_rate) {
                        Ok(bytes) => {
                            let name = format!("audio_{}.wav", index + 1);
                            clips.push(AudioClip {
                                name: name.clone(),
                                wav: bytes,
                            });
                            let _ = events.send(SpeechEvent::ClipReady { index, name });
                        }
                        Err(e) => {
                            log::warn!("スクリプト {} の WAV 化に失敗: {e}", index + 1);
                            let _ = events.send(SpeechEvent::ClipFailed {
                                index,
                                message: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => {
                    // 失敗しても残りの処理は続行する
                    log::warn!("スクリプト {} の音声合成に失敗: {e}", index + 1);
                    let _ = events.send(SpeechEvent::ClipFailed {
                        index,
                        message: e.to_string(),
                    });
                }
            }
        }

        clips
    }
}
