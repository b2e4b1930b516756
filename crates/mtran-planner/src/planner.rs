use std::sync::Arc;

use mtran_catalog::ModelCatalog;
use mtran_engine::EngineCache;
use tokio::sync::RwLock;

use crate::detector::{self, Segment};
use crate::errors::{is_fatal, PlannerError};

/// Source text over this length skips single-language detection and always
/// runs through multi-language segmentation (§4.6 step 2).
const SINGLE_LANGUAGE_MAX_LEN: usize = 128;

/// Default acceptance threshold for a segment's detected-language confidence.
const DEFAULT_SEGMENT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Composes the engine cache and the language detector into the end-to-end
/// `translate` operation: pivot routing, segmentation, and fatal-error retry.
pub struct TranslationPlanner {
    cache: Arc<EngineCache>,
    catalog: Arc<RwLock<ModelCatalog>>,
    segment_confidence_threshold: f64,
}

impl TranslationPlanner {
    pub fn new(cache: Arc<EngineCache>, catalog: Arc<RwLock<ModelCatalog>>) -> Self {
        Self {
            cache,
            catalog,
            segment_confidence_threshold: DEFAULT_SEGMENT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_segment_confidence_threshold(mut self, threshold: f64) -> Self {
        self.segment_confidence_threshold = threshold;
        self
    }

    /// A pair needs no pivot iff either endpoint is `en` or the catalog has
    /// the pair directly; otherwise it routes through `en` in two hops.
    async fn needs_pivot(&self, from: &str, to: &str) -> bool {
        if from == "en" || to == "en" {
            return false;
        }
        !self.catalog.read().await.has_pair(from, to)
    }

    /// Translates `text` from `from` to `to`. `from == "auto"` triggers
    /// whole-text or per-segment language detection.
    pub async fn translate(
        &self,
        from: &str,
        to: &str,
        text: &str,
        html: bool,
    ) -> Result<String, PlannerError> {
        if from == to {
            return Ok(text.to_string());
        }

        if from != "auto" && text.len() <= SINGLE_LANGUAGE_MAX_LEN {
            return self.translate_single_language(from, to, text, html).await;
        }

        let supported = self.catalog.read().await.supported_languages().clone();
        let segments =
            detector::detect_multi(text, self.segment_confidence_threshold, |lang| {
                supported.contains(lang)
            });
        let segments = detector::coalesce_adjacent(segments);

        if segments.len() <= 1 {
            let whole_from = match segments.into_iter().next() {
                Some(segment) => segment.lang,
                None if from == "auto" => {
                    detector::detect(text).filter(|lang| supported.contains(lang)).unwrap_or_else(|| from.to_string())
                }
                None => from.to_string(),
            };
            return self
                .translate_single_language(&whole_from, to, text, html)
                .await;
        }

        self.translate_segments(text, segments, to, html).await
    }

    /// Re-stitches `text` from its detected segments in original byte order,
    /// translating each segment independently (or copying it verbatim if
    /// it's already in `to`) and preserving any gaps between segments.
    async fn translate_segments(
        &self,
        text: &str,
        segments: Vec<Segment>,
        to: &str,
        html: bool,
    ) -> Result<String, PlannerError> {
        let mut result = String::new();
        let mut cursor = 0usize;

        for segment in segments {
            if segment.start > cursor {
                result.push_str(&text[cursor..segment.start]);
            }

            if segment.lang == to {
                result.push_str(&segment.text);
            } else {
                let translated = self
                    .translate_single_language(&segment.lang, to, &segment.text, html)
                    .await?;
                result.push_str(&translated);
            }

            cursor = segment.end;
        }

        if cursor < text.len() {
            result.push_str(&text[cursor..]);
        }

        Ok(result)
    }

    /// Direct hop or `from -> en -> to` pivot; a fatal error at a hop evicts
    /// that hop's engine and retries it once.
    async fn translate_single_language(
        &self,
        from: &str,
        to: &str,
        text: &str,
        html: bool,
    ) -> Result<String, PlannerError> {
        if from == to {
            return Ok(text.to_string());
        }

        if !self.needs_pivot(from, to).await {
            return self.compute_with_retry(from, to, text, html).await;
        }

        let intermediate = self.compute_with_retry(from, "en", text, html).await?;
        self.compute_with_retry("en", to, &intermediate, html).await
    }

    /// One hop: fetch the `(from, to)` engine and call `compute`. A fatal
    /// error triggers fault recovery on that engine and a single retry.
    async fn compute_with_retry(
        &self,
        from: &str,
        to: &str,
        text: &str,
        html: bool,
    ) -> Result<String, PlannerError> {
        let handle = self.cache.get_or_create(from, to).await?;
        match handle.client.compute(text.to_string(), html).await {
            Ok(translated) => Ok(translated),
            Err(err) => {
                let err = PlannerError::from(err);
                if !is_fatal(&err) {
                    return Err(err);
                }
                tracing::warn!(from, to, %err, "fatal error on compute, recovering engine");
                let handle = self.cache.recover(&handle.key).await?;
                let translated = handle.client.compute(text.to_string(), html).await?;
                Ok(translated)
            }
        }
    }
}
