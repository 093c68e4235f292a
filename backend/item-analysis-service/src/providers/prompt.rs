//! Prompt construction for the vision provider
use bytes::Bytes;

use crate::models::{AnalysisOptions, MediaType};

/// Which model serves which mode
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub standard: String,
    pub precision: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            standard: "gemini-2.5-flash".to_string(),
            precision: "gemini-2.5-pro".to_string(),
        }
    }
}

impl ModelSelection {
    pub fn for_options(&self, options: &AnalysisOptions) -> &str {
        if options.precision_mode {
            &self.precision
        } else {
            &self.standard
        }
    }
}

/// Everything one provider call needs
#[derive(Debug, Clone)]
pub struct PromptPayload {
    pub model: String,
    pub prompt: String,
    pub image: Bytes,
    pub media_type: MediaType,
}

impl PromptPayload {
    pub fn build(
        models: &ModelSelection,
        options: &AnalysisOptions,
        image: Bytes,
        media_type: MediaType,
    ) -> Self {
        Self {
            model: models.for_options(options).to_string(),
            prompt: build_prompt(options),
            image,
            media_type,
        }
    }
}

const BASE_PROMPT: &str = r#"あなたは日本の中古品査定の専門家です。写真に写っている家庭用品を1点特定し、以下のJSONのみを返してください。説明文やコードブロックは不要です。

{
  "nameJaSpecific": "ブランド・型番を含む具体的な日本語名 (100文字以内、不明なら空文字)",
  "nameEnSpecific": "Specific English name with brand/model (max 100 chars, empty if unknown)",
  "nameJaGeneric": "一般的な日本語名 (100文字以内)",
  "nameEnGeneric": "Generic English name (max 100 chars)",
  "description": "状態や特徴の説明 (1〜1000文字)",
  "category": "furniture | appliance | electronics | clothing | books | kitchenware | toys | sports | decor | tools | other",
  "condition": "new | like-new | good | fair | poor",
  "quantity": 1,
  "onlinePrice": { "low": 0, "high": 0, "confidence": 0.5 },
  "thriftPrice": { "low": 0, "high": 0, "confidence": 0.5 },
  "recommendedAction": "keep | online-sale | thrift | trash",
  "actionRationale": "推奨理由 (1〜500文字)",
  "marketplaces": ["出品に向いたサービス名"],
  "searchQueries": ["相場調査に使える検索語"],
  "keywords": ["関連キーワード"],
  "specialNotes": "注意事項 (500文字以内、なければ null)",
  "disposalCost": null
}

価格は日本円で、high は必ず low 以上にしてください。confidence は 0〜1 の数値です。"#;

const PRECISION_PROMPT: &str = r#"

精密モード: ロゴ・刻印・ラベルを細かく確認し、ブランドと型番を可能な限り特定してください。確信が持てない項目は推測せず空文字にし、confidence を低めに設定してください。"#;

/// Instruction text for the given options
pub fn build_prompt(options: &AnalysisOptions) -> String {
    let mut prompt = String::from(BASE_PROMPT);

    if options.precision_mode {
        prompt.push_str(PRECISION_PROMPT);
    }

    match &options.region_code {
        Some(code) => prompt.push_str(&format!(
            "\n\n地域コード {} の自治体の粗大ごみ・家電リサイクル料金を踏まえ、処分費用の目安を disposalCost (円) に設定してください。",
            code
        )),
        None => prompt.push_str("\n\ndisposalCost は null にしてください。"),
    }

    prompt
}
