use std::fmt;
use tracing::debug;

use super::Oracle;
use super::constants::{contains_all_constants, extract_constants, split_on_constants, Piece};
use crate::error::Result;

/// Ways of presenting constants to the oracle, cheapest and most fluent first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// Send the text untouched
    Normal,
    /// Replace constants with `¤i¤`
    SimpleMarkers,
    /// Replace constants with `[[MARKER_i]]`
    VerboseMarkers,
}

impl Strategy {
    const CHAIN: [Strategy; 3] = [Self::Normal, Self::SimpleMarkers, Self::VerboseMarkers];

    fn marker(self, index: usize) -> Option<String> {
        match self {
            Self::Normal => None,
            Self::SimpleMarkers => Some(format!("¤{}¤", index)),
            Self::VerboseMarkers => Some(format!("[[MARKER_{}]]", index)),
        }
    }

    /// One oracle round trip; `None` when a constant did not survive
    async fn attempt(
        self,
        text: &str,
        constants: &[String],
        oracle: &dyn Oracle,
    ) -> Result<Option<String>> {
        let markers: Vec<(&str, String)> = constants
            .iter()
            .enumerate()
            .filter_map(|(i, c)| self.marker(i).map(|m| (c.as_str(), m)))
            .collect();

        let mut marked = text.to_string();
        for (constant, marker) in &markers {
            marked = marked.replace(constant, marker);
        }

        let mut translated = oracle.translate(&marked).await?;
        for (constant, marker) in &markers {
            translated = translated.replace(marker.as_str(), constant);
        }

        Ok(contains_all_constants(&translated, constants).then_some(translated))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::SimpleMarkers => write!(f, "simple-marker"),
            Self::VerboseMarkers => write!(f, "verbose-marker"),
        }
    }
}

/// Translate `text` so that every `/CONSTANT/` in it is still present in the
/// result.
///
/// Tries the untouched text, then simple markers, then verbose markers, and
/// finally translates the text between constants piece by piece. Recoverable
/// oracle errors move on to the next strategy; fatal ones are returned as is.
pub async fn translate_preserving(text: &str, oracle: &dyn Oracle) -> Result<String> {
    let constants = extract_constants(text);

    if constants.is_empty() {
        return oracle.translate(text).await;
    }

    for strategy in Strategy::CHAIN {
        match strategy.attempt(text, &constants, oracle).await {
            Ok(Some(translated)) => {
                debug!("Translated with {} strategy", strategy);
                return Ok(translated);
            }
            Ok(None) => debug!("{} strategy lost constants, trying next", strategy),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => debug!("{} strategy failed: {}", strategy, e),
        }
    }

    debug!("Falling back to split translation for {} constants", constants.len());
    translate_split(text, oracle).await
}

/// Last resort: constants never reach the oracle, so they cannot be lost
async fn translate_split(text: &str, oracle: &dyn Oracle) -> Result<String> {
    let mut out = String::with_capacity(text.len());

    for piece in split_on_constants(text) {
        match piece {
            Piece::Constant(constant) => out.push_str(constant),
            Piece::Text(segment) if segment.trim().is_empty() => out.push_str(segment),
            Piece::Text(segment) => out.push_str(&oracle.translate(segment).await?),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::MockOracle;
    use crate::error::TransDictError;
    use async_trait::async_trait;
    use regex::Regex;
    use std::sync::Mutex;

    /// Oracle applying a fixed rewrite and recording every request
    struct ScriptedOracle<F: Fn(&str) -> Result<String> + Send + Sync> {
        rewrite: F,
        calls: Mutex<Vec<String>>,
    }

    impl<F: Fn(&str) -> Result<String> + Send + Sync> ScriptedOracle<F> {
        fn new(rewrite: F) -> Self {
            Self { rewrite, calls: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<F: Fn(&str) -> Result<String> + Send + Sync> Oracle for ScriptedOracle<F> {
        async fn translate(&self, text: &str) -> Result<String> {
            self.calls.lock().unwrap().push(text.to_string());
            (self.rewrite)(text)
        }
    }

    fn strip_tokens(text: &str) -> String {
        let tokens = Regex::new(r"/[A-Z0-9_]+/|¤\d+¤|\[\[MARKER_\d+\]\]").unwrap();
        tokens.replace_all(text, "").to_uppercase()
    }

    #[tokio::test]
    async fn test_no_constants_single_unchecked_call() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_translate()
            .times(1)
            .returning(|_| Ok("Bonjour".to_string()));

        assert_eq!(translate_preserving("Hello", &oracle).await.unwrap(), "Bonjour");
    }

    #[tokio::test]
    async fn test_normal_attempt_accepted() {
        let oracle = ScriptedOracle::new(|t: &str| Ok(t.to_uppercase()));

        let out = translate_preserving("Hello /A/ World", &oracle).await.unwrap();

        assert_eq!(out, "HELLO /A/ WORLD");
        assert_eq!(oracle.calls(), vec!["Hello /A/ World"]);
    }

    #[tokio::test]
    async fn test_simple_markers_when_constants_dropped() {
        let oracle = ScriptedOracle::new(|t: &str| {
            Ok(Regex::new(r"/[A-Z0-9_]+/").unwrap().replace_all(t, "").to_string())
        });

        let out = translate_preserving("Give /ITEM_1/ to /NAME/", &oracle).await.unwrap();

        assert_eq!(out, "Give /ITEM_1/ to /NAME/");
        assert_eq!(oracle.calls()[1], "Give ¤0¤ to ¤1¤");
    }

    #[tokio::test]
    async fn test_verbose_markers_when_symbols_mangled() {
        let oracle = ScriptedOracle::new(|t: &str| {
            let out = Regex::new(r"/[A-Z0-9_]+/").unwrap().replace_all(t, "");
            Ok(out.replace('¤', ""))
        });

        let out = translate_preserving("Take /X/ now", &oracle).await.unwrap();

        assert_eq!(out, "Take /X/ now");
        assert_eq!(oracle.calls().len(), 3);
        assert_eq!(oracle.calls()[2], "Take [[MARKER_0]] now");
    }

    #[tokio::test]
    async fn test_split_fallback_preserves_stripped_tokens() {
        let oracle = ScriptedOracle::new(|t: &str| Ok(strip_tokens(t)));

        let out = translate_preserving("Hello /A/ World /B_2/", &oracle).await.unwrap();

        assert_eq!(out, "HELLO /A/ WORLD /B_2/");
        let calls = oracle.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(&calls[3..], &["Hello ".to_string(), " World ".to_string()]);
    }

    #[tokio::test]
    async fn test_reordering_oracle_keeps_constants() {
        let oracle = ScriptedOracle::new(|t: &str| {
            let mut words: Vec<&str> = t.split(' ').collect();
            words.reverse();
            Ok(words.join(" "))
        });

        let out = translate_preserving("/A/ meets /B/", &oracle).await.unwrap();

        assert!(out.contains("/A/") && out.contains("/B/"));
    }

    #[tokio::test]
    async fn test_recoverable_error_moves_to_next_strategy() {
        let oracle = ScriptedOracle::new(|t: &str| {
            if t.contains("/A/") {
                Err(TransDictError::Oracle("timeout".to_string()))
            } else {
                Ok(t.to_string())
            }
        });

        let out = translate_preserving("Hello /A/", &oracle).await.unwrap();

        assert_eq!(out, "Hello /A/");
        assert_eq!(oracle.calls()[1], "Hello ¤0¤");
    }

    #[tokio::test]
    async fn test_fatal_error_stops_chain() {
        let oracle = ScriptedOracle::new(|_: &str| {
            Err(TransDictError::ThresholdExceeded {
                provider: "stub".to_string(),
                failures: 10,
                last_error: "down".to_string(),
            })
        });

        let err = translate_preserving("Hello /A/", &oracle).await.unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(oracle.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_split_error_propagates() {
        let oracle = ScriptedOracle::new(|_: &str| Err(TransDictError::Oracle("down".to_string())));

        let err = translate_preserving("Hello /A/", &oracle).await.unwrap_err();

        assert!(matches!(err, TransDictError::Oracle(_)));
        assert_eq!(oracle.calls().len(), 4);
    }
}
