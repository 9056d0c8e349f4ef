//! 生 PCM を WAV コンテナに包む。
//! TTS サービスは `audio/L16;codec=pcm;rate=24000` 形式の
//! s16le モノラル PCM を返すため、再生・保存前にヘッダが必要になる

use std::io::Cursor;

use crate::domain::error::AppError;

const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// メディアタイプの `rate=` パラメータを読む。無ければ 24kHz
pub fn sample_rate_from_mime(mime_type: &str) -> u32 {
    mime_type
        .split(';')
        .filter_map(|p| p.trim().strip_prefix("rate="))
        .find_map(|v| v.parse::<u32>().ok())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// s16le モノラル PCM を WAV バイト列にする
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, AppError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| AppError::internal(format!("WAV writer error: {e}")))?;
        for chunk in pcm.chunks_exact(2) {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            writer
                .write_sample(sample)
                .map_err(|e| AppError::internal(format!("WAV write error: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| AppError::internal(format!("WAV finalize error: {e}")))?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_parsing() {
        assert_eq!(sample_rate_from_mime("audio/L16;codec=pcm;rate=24000"), 24_000);
        assert_eq!(sample_rate_from_mime("audio/L16; rate=16000"), 16_000);
        assert_eq!(sample_rate_from_mime("audio/pcm"), 24_000);
    }

    #[test]
    fn test_pcm_to_wav_roundtrip() {
        let samples: Vec<i16> = vec![0, 1000, -1000, 32767];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let wav = pcm_to_wav(&pcm, 24_000).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.spec().channels, 1);
        let back: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(back, samples);
    }

    #[test]
    fn test_odd_trailing_byte_is_dropped() {
        let pcm = vec![0u8, 0u8, 7u8];
        let wav = pcm_to_wav(&pcm, 24_000).unwrap();
        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.len(), 1);
    }
}
