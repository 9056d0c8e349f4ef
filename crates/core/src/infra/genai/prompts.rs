//! システムプロンプトとプロンプトビルダー

use crate::domain::brand::BrandIdentity;
use crate::domain::types::Platform;

/// 商品説明: コピーライター
pub const SYSTEM_DESCRIBE: &str = "\
You are a professional copywriter. Analyze the product in the image and write \
a concise, compelling, SEO-friendly product description. Highlight key \
features and customer benefits. Keep it under 500 characters.";

/// SNS キャプション
pub const SYSTEM_CAPTION: &str = "\
You are a creative social media manager. Based on the product photo and the \
provided context, write an engaging caption. It should be appealing, concise, \
and end with 3-5 relevant hashtags.";

/// image-to-video プロンプト導出
pub const SYSTEM_VIDEO_PROMPT: &str = "\
You are an AI video generation expert. Analyze the provided image and context \
and produce one concise image-to-video prompt in English following the \
formula: subject + action + background + camera movement. Infer the most \
logical motion from the static image and add a cinematic camera movement \
(e.g. slow zoom in, dolly shot forward).";

/// 合成画像に常に付ける仕上げスタイル
pub const IMAGE_STYLE_SUFFIX: &str =
    ", elegant, cinematic, professional product photography, dramatic lighting, 8k, photorealistic";

/// 音声プリセット（サービスのプリビルトボイス名 + UI 表示ラベル）
pub const VOICES: &[(&str, &str)] = &[
    ("Aoede", "Aoede (female, friendly)"),
    ("Kore", "Kore (male, firm)"),
    ("Charon", "Charon (male, informative)"),
    ("Puck", "Puck (male, upbeat)"),
    ("Leda", "Leda (female, youthful)"),
    ("Zephyr", "Zephyr (female, bright)"),
];

/// 読み上げスタイル（テキストの前置きプレフィックス）
pub const SPEECH_STYLES: &[(&str, &str)] = &[
    ("Normal", ""),
    ("Storyteller", "Read this as a story narrator: "),
    ("Newsreader", "Read this in a formal news-anchor tone: "),
    ("Excited", "Say this in a cheerful, excited tone: "),
    ("Somber", "Say this in a slow, somber tone: "),
];

/// アイディエーション用システムプロンプト。count 件ちょうどの
/// JSON 配列のみを要求する
pub fn plan_system(count: usize) -> String {
    format!(
        "You are a professional product photographer's AI assistant. Analyze \
the product, its description, and the optional model photo and theme. If a \
theme is provided you MUST strictly adhere to it. If a model photo is \
provided, incorporate the model naturally presenting the product. Generate \
exactly {count} distinct, creative, professional shots. For each shot provide \
a short descriptive title and a detailed English prompt for an AI image \
generator emphasizing dramatic lighting, sophisticated composition and a \
high-end commercial aesthetic. Respond ONLY with a valid JSON array of \
{count} objects with keys \"title\" and \"prompt\"."
    )
}

/// 広告スクリプト用システムプロンプト
pub fn ad_script_system(variants: usize) -> String {
    format!(
        "You are a voice-over ad copywriter. Based on the product description \
and unique selling points, write {variants} short spoken ad script \
variation(s), each 3-5 natural sentences, ready to be read aloud. Separate \
variations with a blank line. Respond with the scripts only."
    )
}

/// プランナーに渡すユーザークエリを組み立てる
pub fn build_plan_query(
    description: &str,
    theme: Option<&str>,
    brand: Option<&BrandIdentity>,
) -> String {
    let mut query = format!("Analyze this product. Product description: \"{description}\"");
    if let Some(theme) = theme.filter(|t| !t.trim().is_empty()) {
        query.push_str(&format!("\nPhoto theme: \"{theme}\""));
    }
    if let Some(ctx) = brand.and_then(|b| b.prompt_context()) {
        query.push('\n');
        query.push_str(&ctx);
    }
    query
}

/// キャンペーン計画用の追加コンテキスト。プラットフォームごとに
/// 1件、列挙順どおりの出力を要求する
pub fn campaign_context(platforms: &[Platform]) -> String {
    let list = platforms
        .iter()
        .map(|p| format!("{} (aspect ratio {})", p.display_name(), p.aspect_ratio()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "\nThis is a multi-platform campaign. Produce one entry per platform, \
in this exact order: {list}. Tailor each prompt to its platform's format and \
aspect ratio."
    )
}

/// アップスケール指示。新しいアイデアではないので元のプロンプトを
/// コンテキストとして再利用する
pub fn upscale_prompt(original_prompt: &str) -> String {
    format!(
        "Upscale this image to high definition. Increase fidelity, sharpness \
and fine detail while preserving the exact composition, subject, colors and \
lighting. Do not add, remove or move any element. Original generation \
context: \"{original_prompt}\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_system_embeds_count() {
        let s = plan_system(6);
        assert!(s.contains("exactly 6 distinct"));
        assert!(s.contains("JSON array"));
    }

    #[test]
    fn test_build_plan_query_optional_parts() {
        let q = build_plan_query("a ceramic mug", None, None);
        assert!(q.contains("a ceramic mug"));
        assert!(!q.contains("Photo theme"));

        let q = build_plan_query("a ceramic mug", Some("minimalist"), None);
        assert!(q.contains("Photo theme: \"minimalist\""));
    }

    #[test]
    fn test_campaign_context_order() {
        let ctx = campaign_context(&[Platform::InstagramStory, Platform::FacebookAd]);
        let story = ctx.find("Instagram Story").unwrap();
        let fb = ctx.find("Facebook Ad").unwrap();
        assert!(story < fb);
        assert!(ctx.contains("9:16"));
    }

    #[test]
    fn test_upscale_prompt_reuses_original() {
        let p = upscale_prompt("a watch on marble");
        assert!(p.contains("a watch on marble"));
        assert!(p.contains("preserving the exact composition"));
    }
}
