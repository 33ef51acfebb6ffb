//! Supported site languages.
//!
//! The site is published in four locales. The locale is chosen before a
//! voice call starts and stays fixed for the call; the chat protocol instead
//! detects the language of each user message so fallbacks can be localized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the fixed site locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Korean (site default)
    #[default]
    Ko,
    /// English
    En,
    /// Japanese
    Ja,
    /// Chinese (simplified)
    Zh,
}

impl Language {
    /// All supported languages in display order.
    pub const ALL: [Language; 4] = [Language::Ko, Language::En, Language::Ja, Language::Zh];

    /// ISO 639-1 code.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ko => "ko",
            Self::En => "en",
            Self::Ja => "ja",
            Self::Zh => "zh",
        }
    }

    /// Parse a locale code. Region suffixes (`ko-KR`, `zh_CN`) are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        let primary = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match primary.as_str() {
            "ko" => Some(Self::Ko),
            "en" => Some(Self::En),
            "ja" => Some(Self::Ja),
            "zh" => Some(Self::Zh),
            _ => None,
        }
    }

    /// English name of the language, used inside model instructions.
    pub fn english_name(&self) -> &'static str {
        match self {
            Self::Ko => "Korean",
            Self::En => "English",
            Self::Ja => "Japanese",
            Self::Zh => "Chinese",
        }
    }

    /// Guess the language of a piece of user text from its script.
    ///
    /// Hangul wins over everything else, kana marks Japanese even when mixed
    /// with kanji, and Han characters without kana are taken as Chinese.
    /// Anything else (including empty input) is treated as English.
    pub fn detect(text: &str) -> Self {
        let mut hangul = 0usize;
        let mut kana = 0usize;
        let mut han = 0usize;

        for c in text.chars() {
            match c as u32 {
                0xAC00..=0xD7A3 | 0x1100..=0x11FF | 0x3130..=0x318F => hangul += 1,
                0x3040..=0x30FF | 0x31F0..=0x31FF => kana += 1,
                0x4E00..=0x9FFF | 0x3400..=0x4DBF => han += 1,
                _ => {}
            }
        }

        if hangul > 0 {
            Self::Ko
        } else if kana > 0 {
            Self::Ja
        } else if han > 0 {
            Self::Zh
        } else {
            Self::En
        }
    }

    /// Sample opening line the voice assistant is asked to speak.
    pub fn greeting(&self) -> &'static str {
        match self {
            Self::Ko => "안녕하세요! 축제 AI 상담사예요. 무엇이 궁금하신가요?",
            Self::En => "Hello! I'm the festival's AI concierge. What would you like to know?",
            Self::Ja => "こんにちは！フェスティバルのAIコンシェルジュです。何でもお聞きください。",
            Self::Zh => "您好！我是节日AI咨询助手，请问有什么可以帮您？",
        }
    }

    /// Apology shown when no usable answer could be produced.
    pub fn apology(&self) -> &'static str {
        match self {
            Self::Ko => "죄송해요, 지금은 답변을 가져오지 못했어요. 잠시 후 다시 시도해 주세요.",
            Self::En => "Sorry, I couldn't get an answer right now. Please try again in a moment.",
            Self::Ja => {
                "申し訳ありません。現在回答を取得できませんでした。しばらくしてからもう一度お試しください。"
            }
            Self::Zh => "抱歉，目前无法获取回答，请稍后再试。",
        }
    }

    /// Heading above the suggested follow-up questions.
    pub fn follow_up_label(&self) -> &'static str {
        match self {
            Self::Ko => "AI 추천 질문",
            Self::En => "AI suggested questions",
            Self::Ja => "AIおすすめの質問",
            Self::Zh => "AI推荐问题",
        }
    }

    /// Message shown when the chat backend could not be reached.
    pub fn connection_error(&self) -> &'static str {
        match self {
            Self::Ko => "서버와 연결하는 데 문제가 발생했어요. 잠시 후 다시 시도해 주세요.",
            Self::En => "There was a problem connecting to the server. Please try again shortly.",
            Self::Ja => "サーバーとの接続に問題が発生しました。しばらくしてから再度お試しください。",
            Self::Zh => "连接服务器时出现问题，请稍后再试。",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a locale code is not one of the supported four.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language code: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnsupportedLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!(Language::parse("ko"), Some(Language::Ko));
        assert_eq!(Language::parse("EN"), Some(Language::En));
        assert_eq!(Language::parse("ja-JP"), Some(Language::Ja));
        assert_eq!(Language::parse("zh_CN"), Some(Language::Zh));
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(Language::parse(""), None);
    }

    #[test]
    fn test_from_str_error() {
        let err = "de".parse::<Language>().unwrap_err();
        assert!(err.to_string().contains("de"));
    }

    #[test]
    fn test_detect_scripts() {
        assert_eq!(Language::detect("주차장이 있나요?"), Language::Ko);
        assert_eq!(Language::detect("駐車場はありますか？"), Language::Ja);
        assert_eq!(Language::detect("有停车场吗？"), Language::Zh);
        assert_eq!(Language::detect("Is there parking?"), Language::En);
        assert_eq!(Language::detect(""), Language::En);
    }

    #[test]
    fn test_detect_prefers_hangul_over_han() {
        assert_eq!(Language::detect("始興 갯골 축제"), Language::Ko);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Language::Zh).unwrap();
        assert_eq!(json, "\"zh\"");
        let lang: Language = serde_json::from_str("\"ja\"").unwrap();
        assert_eq!(lang, Language::Ja);
    }

    #[test]
    fn test_localized_strings_present() {
        for lang in Language::ALL {
            assert!(!lang.greeting().is_empty());
            assert!(!lang.apology().is_empty());
            assert!(!lang.follow_up_label().is_empty());
            assert!(!lang.connection_error().is_empty());
        }
        assert_eq!(Language::En.follow_up_label(), "AI suggested questions");
    }
}
