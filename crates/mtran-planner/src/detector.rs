use std::sync::OnceLock;

use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};

use mtran_catalog::LangCode;

/// One contiguous span of text attributed to a single language.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub lang: LangCode,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

fn detector() -> &'static LanguageDetector {
    static DETECTOR: OnceLock<LanguageDetector> = OnceLock::new();
    DETECTOR.get_or_init(|| {
        LanguageDetectorBuilder::from_all_languages()
            .with_preloaded_language_models()
            .build()
    })
}

fn lingua_to_bcp47(language: Language) -> LangCode {
    match language {
        Language::Chinese => "zh-Hans".to_string(),
        other => other.iso_code_639_1().to_string().to_lowercase(),
    }
}

/// Best single-label detection for the whole text. Chinese maps to
/// `zh-Hans`; everything else is lowercase ISO 639-1.
pub fn detect(text: &str) -> Option<LangCode> {
    if text.is_empty() {
        return None;
    }
    detector().detect_language_of(text).map(lingua_to_bcp47)
}

fn detect_with_confidence(text: &str) -> Option<(LangCode, f64)> {
    if text.is_empty() {
        return None;
    }
    let values = detector().compute_language_confidence_values(text);
    let (language, confidence) = values.into_iter().next()?;
    Some((lingua_to_bcp47(language), confidence))
}

/// Partitions `text` into contiguous language-attributed spans. A span whose
/// confidence is below `threshold`, or whose language the catalog doesn't
/// support, falls back to the whole-text language (or `en` if that is also
/// unsupported).
pub fn detect_multi(
    text: &str,
    threshold: f64,
    is_supported: impl Fn(&str) -> bool,
) -> Vec<Segment> {
    if text.is_empty() {
        return Vec::new();
    }

    let whole_text_lang = detect(text).filter(|lang| is_supported(lang));
    let fallback_lang = whole_text_lang
        .clone()
        .unwrap_or_else(|| "en".to_string());

    let results = detector().detect_multiple_languages_of(text);
    if results.is_empty() {
        return Vec::new();
    }

    results
        .into_iter()
        .map(|result| {
            let start = result.start_index();
            let end = result.end_index();
            let span_text = &text[start..end];
            let lang = lingua_to_bcp47(result.language());

            let confidence = detect_with_confidence(span_text)
                .filter(|(detected, _)| *detected == lang)
                .map(|(_, confidence)| confidence)
                .unwrap_or(1.0);

            let accepted = confidence >= threshold && is_supported(&lang);
            let resolved_lang = if accepted { lang } else { fallback_lang.clone() };

            Segment {
                text: span_text.to_string(),
                lang: resolved_lang,
                start,
                end,
                confidence,
            }
        })
        .collect()
}

/// Merges runs of adjacent segments that share the same detected language,
/// so the planner minimizes engine hops.
pub fn coalesce_adjacent(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match merged.last_mut() {
            Some(last) if last.lang == segment.lang && last.end == segment.start => {
                last.text.push_str(&segment.text);
                last.end = segment.end;
                last.confidence = last.confidence.min(segment.confidence);
            }
            _ => merged.push(segment),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesce_merges_consecutive_same_language_segments() {
        let segments = vec![
            Segment {
                text: "Hello ".to_string(),
                lang: "en".to_string(),
                start: 0,
                end: 6,
                confidence: 0.9,
            },
            Segment {
                text: "world".to_string(),
                lang: "en".to_string(),
                start: 6,
                end: 11,
                confidence: 0.8,
            },
            Segment {
                text: "你好".to_string(),
                lang: "zh-Hans".to_string(),
                start: 11,
                end: 17,
                confidence: 0.95,
            },
        ];
        let merged = coalesce_adjacent(segments);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "Hello world");
        assert_eq!(merged[0].lang, "en");
        assert_eq!(merged[1].lang, "zh-Hans");
    }

    #[test]
    fn coalesce_keeps_same_language_non_adjacent_segments_separate() {
        let segments = vec![
            Segment {
                text: "Hello".to_string(),
                lang: "en".to_string(),
                start: 0,
                end: 5,
                confidence: 0.9,
            },
            Segment {
                text: "Hello".to_string(),
                lang: "en".to_string(),
                start: 10,
                end: 15,
                confidence: 0.9,
            },
        ];
        let merged = coalesce_adjacent(segments);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn detect_of_empty_text_is_none() {
        assert_eq!(detect(""), None);
    }
}
