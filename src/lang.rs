//! Language markers, codes and UI choices.
//!
//! The TTS model understands three languages.  Each one has three spellings
//! that must stay in agreement:
//!
//! | Language | ISO code | Marker | Archive code |
//! |----------|----------|--------|--------------|
//! | Chinese  | `zh`     | `[ZH]` | `0`          |
//! | Japanese | `ja`     | `[JA]` | `1`          |
//! | English  | `en`     | `[EN]` | `2`          |
//!
//! All lookups are total over [`Language`] and fail with [`LangError`] for
//! anything else.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// LangError
// ---------------------------------------------------------------------------

/// A language key that is not part of the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LangError {
    #[error("unsupported language code: {0:?}")]
    UnknownCode(String),

    #[error("unsupported language marker: {0:?}")]
    UnknownMarker(String),

    #[error("unsupported numeric language code: {0}")]
    UnknownNumeric(i64),
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// One of the languages the TTS model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Zh,
    Ja,
    En,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Zh, Language::Ja, Language::En];

    /// ISO-639-1 code (`"zh"`, `"ja"`, `"en"`).
    pub fn code(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::Ja => "ja",
            Language::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, LangError> {
        match code {
            "zh" => Ok(Language::Zh),
            "ja" => Ok(Language::Ja),
            "en" => Ok(Language::En),
            other => Err(LangError::UnknownCode(other.to_string())),
        }
    }

    /// Bracketed marker inserted around text spans (`"[ZH]"` …).
    pub fn marker(self) -> &'static str {
        match self {
            Language::Zh => "[ZH]",
            Language::Ja => "[JA]",
            Language::En => "[EN]",
        }
    }

    pub fn from_marker(marker: &str) -> Result<Self, LangError> {
        match marker {
            "[ZH]" => Ok(Language::Zh),
            "[JA]" => Ok(Language::Ja),
            "[EN]" => Ok(Language::En),
            other => Err(LangError::UnknownMarker(other.to_string())),
        }
    }

    /// Integer stored in the `lang_code` array of a voice prompt archive.
    pub fn numeric(self) -> i64 {
        match self {
            Language::Zh => 0,
            Language::Ja => 1,
            Language::En => 2,
        }
    }

    pub fn from_numeric(code: i64) -> Result<Self, LangError> {
        match code {
            0 => Ok(Language::Zh),
            1 => Ok(Language::Ja),
            2 => Ok(Language::En),
            other => Err(LangError::UnknownNumeric(other)),
        }
    }

    /// Surround `text` with this language's marker: `[EN]text[EN]`.
    pub fn wrap(self, text: &str) -> String {
        let m = self.marker();
        format!("{m}{text}{m}")
    }

    /// English display name used by the desktop UI.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Zh => "Chinese",
            Language::Ja => "Japanese",
            Language::En => "English",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = LangError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s)
    }
}

// ---------------------------------------------------------------------------
// LanguageChoice
// ---------------------------------------------------------------------------

/// Target-language dropdown.  `Mix` leaves the text unmarked so the user can
/// write their own markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageChoice {
    #[default]
    English,
    Chinese,
    Japanese,
    Mix,
}

impl LanguageChoice {
    pub const ALL: [LanguageChoice; 4] = [
        LanguageChoice::English,
        LanguageChoice::Chinese,
        LanguageChoice::Japanese,
        LanguageChoice::Mix,
    ];

    pub fn language(self) -> Option<Language> {
        match self {
            LanguageChoice::English => Some(Language::En),
            LanguageChoice::Chinese => Some(Language::Zh),
            LanguageChoice::Japanese => Some(Language::Ja),
            LanguageChoice::Mix => None,
        }
    }

    /// Marker for this choice; empty for `Mix`.
    pub fn marker(self) -> &'static str {
        self.language().map(Language::marker).unwrap_or("")
    }

    /// Wrap `text` in this choice's marker (no-op for `Mix`).
    pub fn wrap(self, text: &str) -> String {
        match self.language() {
            Some(lang) => lang.wrap(text),
            None => text.to_string(),
        }
    }

    /// Language hint passed to the TTS model for text produced with this
    /// choice.
    ///
    /// `Mix` resolves to the first marker found in `text`, else `fallback`.
    pub fn resolve(self, text: &str, fallback: Language) -> Language {
        self.language()
            .or_else(|| first_marked_language(text))
            .unwrap_or(fallback)
    }

    pub fn display_name(self) -> &'static str {
        match self.language() {
            Some(lang) => lang.display_name(),
            None => "Mix",
        }
    }
}

// ---------------------------------------------------------------------------
// Accent
// ---------------------------------------------------------------------------

/// Accent override: replaces the target-language hint without touching the
/// markers in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accent {
    #[default]
    NoAccent,
    Of(Language),
}

impl Accent {
    pub const ALL: [Accent; 4] = [
        Accent::NoAccent,
        Accent::Of(Language::En),
        Accent::Of(Language::Zh),
        Accent::Of(Language::Ja),
    ];

    /// The target-language hint after applying this override.
    pub fn apply(self, target: Language) -> Language {
        match self {
            Accent::NoAccent => target,
            Accent::Of(lang) => lang,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Accent::NoAccent => "No accent",
            Accent::Of(lang) => lang.display_name(),
        }
    }
}

// ---------------------------------------------------------------------------
// Marker parsing
// ---------------------------------------------------------------------------

/// A run of text together with the language of the marker pair enclosing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedSpan<'a> {
    pub language: Option<Language>,
    pub text: &'a str,
}

/// Split `text` on language markers, dropping the markers themselves.
///
/// Markers work in pairs: `[EN]hi[EN]` opens and closes an English span.  A
/// different marker while a span is open starts a new span.  Text outside any
/// pair gets `language: None`.  Empty spans are skipped.
pub fn split_marked(text: &str) -> Vec<MarkedSpan<'_>> {
    let mut spans = Vec::new();
    let mut current: Option<Language> = None;
    let mut start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('[') {
        let pos = cursor + offset;
        let marked = Language::ALL
            .into_iter()
            .find(|l| text[pos..].starts_with(l.marker()));

        match marked {
            Some(lang) => {
                if pos > start {
                    spans.push(MarkedSpan {
                        language: current,
                        text: &text[start..pos],
                    });
                }
                current = if current == Some(lang) { None } else { Some(lang) };
                cursor = pos + lang.marker().len();
                start = cursor;
            }
            None => cursor = pos + 1,
        }
    }

    if start < text.len() {
        spans.push(MarkedSpan {
            language: current,
            text: &text[start..],
        });
    }
    spans
}

/// Language of the first marker appearing in `text`.
pub fn first_marked_language(text: &str) -> Option<Language> {
    text.match_indices('[').find_map(|(pos, _)| {
        Language::ALL
            .into_iter()
            .find(|l| text[pos..].starts_with(l.marker()))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_marker_and_numeric_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()).unwrap(), lang);
            assert_eq!(Language::from_marker(lang.marker()).unwrap(), lang);
            assert_eq!(Language::from_numeric(lang.numeric()).unwrap(), lang);
            let marker = Language::from_code(lang.code()).unwrap().marker();
            assert_eq!(Language::from_marker(marker).unwrap().code(), lang.code());
        }
    }

    #[test]
    fn unknown_keys_fail_with_lookup_error() {
        assert_eq!(
            Language::from_code("ko"),
            Err(LangError::UnknownCode("ko".into()))
        );
        assert!(matches!(
            Language::from_marker("[KO]"),
            Err(LangError::UnknownMarker(_))
        ));
        assert_eq!(Language::from_numeric(7), Err(LangError::UnknownNumeric(7)));
    }

    #[test]
    fn numeric_codes_match_archive_layout() {
        assert_eq!(Language::Zh.numeric(), 0);
        assert_eq!(Language::Ja.numeric(), 1);
        assert_eq!(Language::En.numeric(), 2);
    }

    #[test]
    fn wrap_surrounds_text() {
        assert_eq!(Language::En.wrap("hello."), "[EN]hello.[EN]");
        assert_eq!(LanguageChoice::Japanese.wrap("こんにちは"), "[JA]こんにちは[JA]");
        assert_eq!(LanguageChoice::Mix.wrap("as is"), "as is");
    }

    #[test]
    fn dropdown_entries_have_distinct_names() {
        let choices: std::collections::HashSet<_> =
            LanguageChoice::ALL.iter().map(|c| c.display_name()).collect();
        assert_eq!(choices.len(), LanguageChoice::ALL.len());
        let accents: std::collections::HashSet<_> =
            Accent::ALL.iter().map(|a| a.display_name()).collect();
        assert_eq!(accents.len(), Accent::ALL.len());
        assert_eq!(LanguageChoice::Mix.display_name(), "Mix");
        assert_eq!(Accent::Of(Language::Ja).display_name(), "Japanese");
    }

    #[test]
    fn accent_overrides_target_only_when_set() {
        assert_eq!(Accent::NoAccent.apply(Language::En), Language::En);
        assert_eq!(Accent::Of(Language::Zh).apply(Language::En), Language::Zh);
    }

    #[test]
    fn mix_resolves_from_first_marker_then_fallback() {
        let text = "[JA]こんにちは[JA][EN]hi[EN]";
        assert_eq!(LanguageChoice::Mix.resolve(text, Language::En), Language::Ja);
        assert_eq!(LanguageChoice::Mix.resolve("plain", Language::Zh), Language::Zh);
        assert_eq!(LanguageChoice::English.resolve(text, Language::Zh), Language::En);
    }

    #[test]
    fn split_marked_pairs() {
        let spans = split_marked("[EN]Hello.[EN][ZH]你好[ZH]");
        assert_eq!(
            spans,
            vec![
                MarkedSpan { language: Some(Language::En), text: "Hello." },
                MarkedSpan { language: Some(Language::Zh), text: "你好" },
            ]
        );
    }

    #[test]
    fn split_marked_keeps_unmarked_text_and_plain_brackets() {
        let spans = split_marked("_[EN]a [b][EN] tail");
        assert_eq!(
            spans,
            vec![
                MarkedSpan { language: None, text: "_" },
                MarkedSpan { language: Some(Language::En), text: "a [b]" },
                MarkedSpan { language: None, text: " tail" },
            ]
        );
    }

    #[test]
    fn split_marked_empty_and_marker_only() {
        assert!(split_marked("").is_empty());
        assert!(split_marked("[EN][EN]").is_empty());
    }
}
