//! Subtitle task parameters and the upstream request builder.
//!
//! [`SubtitleTaskParams`] is what an MCP client sends; [`SubtitleTaskRequest`]
//! is the JSON body Krillinai expects at `POST /api/capability/subtitleTask`.
//! [`SubtitleTaskRequest::build`] owns every presence and coercion rule:
//!
//! - `bilingual`, `tts` and `modal_filter` are sent as `1` (on) / `2` (off)
//! - `origin_lang` is sent as given; without it, it defaults to `language`
//!   only when a `target_lang` asks for translation
//! - `tts_voice_code` and `tts_voice_clone_src_file_url` are only sent with TTS on
//! - vertical titles are sent whenever present
//! - `replace_words` is sent as `replace` when non-empty

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use serde::{Deserialize, Serialize};

/// Recognition / translation source language accepted by Krillinai.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceLanguage {
    /// Simplified Chinese
    #[default]
    ZhCn,
    /// English
    En,
    /// Japanese
    Ja,
    /// Turkish
    Tr,
    /// German
    De,
    /// Korean
    Ko,
    /// Russian
    Ru,
}

impl SourceLanguage {
    /// Every supported source language.
    pub const ALL: [SourceLanguage; 7] = [
        SourceLanguage::ZhCn,
        SourceLanguage::En,
        SourceLanguage::Ja,
        SourceLanguage::Tr,
        SourceLanguage::De,
        SourceLanguage::Ko,
        SourceLanguage::Ru,
    ];

    /// Wire code, e.g. `zh_cn`.
    pub fn code(self) -> &'static str {
        match self {
            SourceLanguage::ZhCn => "zh_cn",
            SourceLanguage::En => "en",
            SourceLanguage::Ja => "ja",
            SourceLanguage::Tr => "tr",
            SourceLanguage::De => "de",
            SourceLanguage::Ko => "ko",
            SourceLanguage::Ru => "ru",
        }
    }
}

/// Translation target languages Krillinai knows about.
///
/// `target_lang` is forwarded as a free-form string; this list only feeds the
/// tool description.
pub const TRANSLATION_LANGUAGES: &[&str] = &[
    "zh_cn", "zh_tw", "en", "ja", "pinyin", "mid", "ms", "th", "vi", "fil", "ko", "ar", "fr",
    "de", "it", "ru", "pt", "es", "hi", "bn", "he", "fa", "af", "sv", "fi", "da", "no", "nl",
    "el", "uk", "hu", "pl", "tr", "sr", "hr", "cs", "sw", "yo", "ha", "am", "om", "is", "lb",
    "ca", "ro", "ro2", "sk", "bs", "mk", "sl", "bg", "lv", "lt", "et", "mt", "sq",
];

/// Which embedded-subtitle videos Krillinai should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EmbedVideoType {
    /// Landscape video only
    Horizontal,
    /// Portrait video only
    Vertical,
    /// Both orientations
    All,
    /// No embedded video
    #[default]
    None,
}

/// Krillinai's on/off flag: `1` enables, `2` disables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum Toggle {
    Enabled,
    Disabled,
}

impl From<bool> for Toggle {
    fn from(enabled: bool) -> Self {
        if enabled {
            Toggle::Enabled
        } else {
            Toggle::Disabled
        }
    }
}

impl From<Toggle> for u8 {
    fn from(toggle: Toggle) -> Self {
        match toggle {
            Toggle::Enabled => 1,
            Toggle::Disabled => 2,
        }
    }
}

/// Schema for fields restricted to the integers 1 and 2.
fn one_or_two(_generator: &mut SchemaGenerator) -> Schema {
    SchemaObject {
        instance_type: Some(InstanceType::Integer.into()),
        enum_values: Some(vec![1.into(), 2.into()]),
        ..Default::default()
    }
    .into()
}

/// Where the translated line goes in bilingual subtitles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SubtitlePosition {
    /// Translation above the original (`1`)
    #[default]
    Top,
    /// Translation below the original (`2`)
    Below,
}

impl TryFrom<u8> for SubtitlePosition {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SubtitlePosition::Top),
            2 => Ok(SubtitlePosition::Below),
            other => Err(format!("translation_subtitle_pos must be 1 or 2, got {}", other)),
        }
    }
}

impl From<SubtitlePosition> for u8 {
    fn from(position: SubtitlePosition) -> Self {
        match position {
            SubtitlePosition::Top => 1,
            SubtitlePosition::Below => 2,
        }
    }
}

/// TTS voice selector (`1` or `2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TtsVoiceCode(u8);

impl TtsVoiceCode {
    /// Numeric code sent upstream.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for TtsVoiceCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 | 2 => Ok(TtsVoiceCode(value)),
            other => Err(format!("tts_voice_code must be 1 or 2, got {}", other)),
        }
    }
}

impl From<TtsVoiceCode> for u8 {
    fn from(code: TtsVoiceCode) -> Self {
        code.0
    }
}

/// Parameters of the `start_krillinai_subtitle_task` tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SubtitleTaskParams {
    /// Media path on the Krillinai server (the `file_path` returned by
    /// upload_file_to_krillinai, e.g. "local:./uploads/video.mp4") or a
    /// reachable external media link.
    pub media_url_on_krillinai: String,

    /// Source / recognition language of the media. Default: "zh_cn".
    #[serde(default)]
    pub language: SourceLanguage,

    /// Translation source language. Defaults to `language` when
    /// `target_lang` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_lang: Option<SourceLanguage>,

    /// Translation target language, e.g. "en", "zh_tw", "fr", "pinyin".
    /// Supplying it requests translation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_lang: Option<String>,

    /// Produce bilingual subtitles. Default: false.
    #[serde(default)]
    pub bilingual: bool,

    /// Position of the translated line in bilingual subtitles:
    /// 1 = on top, 2 = below. Default: 1.
    #[serde(default)]
    #[schemars(schema_with = "one_or_two")]
    pub translation_subtitle_pos: SubtitlePosition,

    /// Generate dubbed speech (TTS) from the subtitles. Default: false.
    #[serde(default)]
    pub tts: bool,

    /// TTS voice code (1 or 2). Only used when `tts` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "one_or_two")]
    pub tts_voice_code: Option<TtsVoiceCode>,

    /// Krillinai path of an uploaded audio file to clone the TTS voice from.
    /// Only used when `tts` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_voice_clone_src_file_url: Option<String>,

    /// Filter filler words (modal particles). Default: false.
    #[serde(default)]
    pub modal_filter: bool,

    /// Render videos with embedded subtitles: "horizontal", "vertical",
    /// "all" or "none". Default: "none".
    #[serde(default)]
    pub embed_subtitle_video_type: EmbedVideoType,

    /// Main title for the vertical video ("vertical" or "all").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_major_title: Option<String>,

    /// Subtitle for the vertical video ("vertical" or "all").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_minor_title: Option<String>,

    /// Word replacements as "original|replacement" strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_words: Option<Vec<String>>,
}

impl SubtitleTaskParams {
    /// Parameters for `media_url` with every optional field at its default.
    pub fn new(media_url: impl Into<String>) -> Self {
        Self {
            media_url_on_krillinai: media_url.into(),
            language: SourceLanguage::default(),
            origin_lang: None,
            target_lang: None,
            bilingual: false,
            translation_subtitle_pos: SubtitlePosition::default(),
            tts: false,
            tts_voice_code: None,
            tts_voice_clone_src_file_url: None,
            modal_filter: false,
            embed_subtitle_video_type: EmbedVideoType::default(),
            vertical_major_title: None,
            vertical_minor_title: None,
            replace_words: None,
        }
    }
}

/// JSON body of `POST /api/capability/subtitleTask`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleTaskRequest {
    pub url: String,
    pub language: SourceLanguage,
    pub bilingual: Toggle,
    pub translation_subtitle_pos: SubtitlePosition,
    pub tts: Toggle,
    pub modal_filter: Toggle,
    pub embed_subtitle_video_type: EmbedVideoType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_lang: Option<SourceLanguage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_voice_code: Option<TtsVoiceCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_voice_clone_src_file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_major_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_minor_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace: Option<Vec<String>>,
}

/// `Some` only for a non-empty string.
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

impl SubtitleTaskRequest {
    /// Build the upstream body from tool parameters.
    pub fn build(params: &SubtitleTaskParams) -> Self {
        let target_lang = non_empty(&params.target_lang);

        let origin_lang = match (params.origin_lang, &target_lang) {
            (Some(origin), _) => Some(origin),
            (None, Some(_)) => Some(params.language),
            (None, None) => None,
        };

        let tts = Toggle::from(params.tts);
        let (tts_voice_code, tts_voice_clone_src_file_url) = match tts {
            Toggle::Enabled => (
                params.tts_voice_code,
                non_empty(&params.tts_voice_clone_src_file_url),
            ),
            Toggle::Disabled => (None, None),
        };

        let replace = params
            .replace_words
            .as_ref()
            .filter(|words| !words.is_empty())
            .cloned();

        Self {
            url: params.media_url_on_krillinai.clone(),
            language: params.language,
            bilingual: params.bilingual.into(),
            translation_subtitle_pos: params.translation_subtitle_pos,
            tts,
            modal_filter: params.modal_filter.into(),
            embed_subtitle_video_type: params.embed_subtitle_video_type,
            origin_lang,
            target_lang,
            tts_voice_code,
            tts_voice_clone_src_file_url,
            vertical_major_title: params.vertical_major_title.clone(),
            vertical_minor_title: params.vertical_minor_title.clone(),
            replace,
        }
    }
}
