use serde::{Deserialize, Serialize};

/// ブランドアイデンティティ（UI側で永続化され、プロンプトに合流する）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandIdentity {
    pub voice: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub primary_font: Option<String>,
    pub secondary_font: Option<String>,
}

impl BrandIdentity {
    /// プランニングクエリに付加するコンテキスト文。設定が空なら None
    pub fn prompt_context(&self) -> Option<String> {
        let mut lines = Vec::new();
        if let Some(voice) = self.voice.as_deref().filter(|v| !v.trim().is_empty()) {
            lines.push(format!("Brand voice: {voice}"));
        }
        match (self.primary_color.as_deref(), self.secondary_color.as_deref()) {
            (Some(p), Some(s)) => lines.push(format!("Brand colors: {p} (primary), {s} (secondary)")),
            (Some(p), None) => lines.push(format!("Brand color: {p}")),
            (None, Some(s)) => lines.push(format!("Brand color: {s}")),
            (None, None) => {}
        }
        match (self.primary_font.as_deref(), self.secondary_font.as_deref()) {
            (Some(p), Some(s)) => lines.push(format!("Brand fonts: {p} (primary), {s} (secondary)")),
            (Some(p), None) => lines.push(format!("Brand font: {p}")),
            (None, Some(s)) => lines.push(format!("Brand font: {s}")),
            (None, None) => {}
        }
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_brand_has_no_context() {
        assert!(BrandIdentity::default().prompt_context().is_none());
    }

    #[test]
    fn test_context_lines() {
        let brand = BrandIdentity {
            voice: Some("warm and playful".into()),
            primary_color: Some("#0e7490".into()),
            secondary_color: None,
            primary_font: Some("Inter".into()),
            secondary_font: None,
        };
        let ctx = brand.prompt_context().unwrap();
        assert!(ctx.contains("Brand voice: warm and playful"));
        assert!(ctx.contains("Brand color: #0e7490"));
        assert!(ctx.contains("Brand font: Inter"));
    }

    #[test]
    fn test_blank_voice_is_ignored() {
        let brand = BrandIdentity {
            voice: Some("   ".into()),
            ..Default::default()
        };
        assert!(brand.prompt_context().is_none());
    }
}
