//! crates/med_imaging_core/src/report.rs
//!
//! Post-processing of the model's markdown output. The remote model
//! occasionally echoes the trailing references section twice; this pass
//! collapses the repetition deterministically.

use crate::prompt::RESEARCH_SECTION_MARKER;

/// Removes a duplicated trailing section from `text`.
///
/// Splits at the first occurrence of `marker`; when the marker appears again
/// later, everything between the first marker and the last one is dropped,
/// keeping only the tail after the last occurrence. Text without a repeated
/// marker is returned unchanged, which makes the pass idempotent: the output
/// contains exactly one marker, so a second application is a no-op.
pub fn dedupe_trailing_section(text: &str, marker: &str) -> String {
    let Some(first) = text.find(marker) else {
        return text.to_string();
    };
    let before = &text[..first];
    let after = &text[first + marker.len()..];

    let Some(last_in_after) = after.rfind(marker) else {
        return text.to_string();
    };
    let tail = &after[last_in_after + marker.len()..];

    format!("{}\n{}{}", before.trim(), marker, tail.trim())
}

/// Convenience wrapper using the report template's references header.
pub fn clean_report(text: &str) -> String {
    dedupe_trailing_section(text, RESEARCH_SECTION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "### 5. Research Context";

    #[test]
    fn keeps_text_before_first_marker_and_after_last() {
        let input = "A### 5. Research ContextB### 5. Research ContextC";
        assert_eq!(
            dedupe_trailing_section(input, MARKER),
            "A\n### 5. Research ContextC"
        );
    }

    #[test]
    fn collapses_three_echoes_to_the_last_tail() {
        let input = "head### 5. Research Contextone### 5. Research Contexttwo### 5. Research Contextfinal refs";
        assert_eq!(
            dedupe_trailing_section(input, MARKER),
            "head\n### 5. Research Contextfinal refs"
        );
    }

    #[test]
    fn text_without_marker_is_unchanged() {
        let input = "## Findings\nNothing remarkable.";
        assert_eq!(dedupe_trailing_section(input, MARKER), input);
    }

    #[test]
    fn single_marker_is_unchanged() {
        let input = "## Findings\nFine.\n### 5. Research Context\n- ref 1\n- ref 2";
        assert_eq!(dedupe_trailing_section(input, MARKER), input);
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "A### 5. Research ContextB### 5. Research ContextC",
            "no marker here at all",
            "  padded   ### 5. Research Context  refs  ### 5. Research Context refs again ",
            "### 5. Research Context### 5. Research Context",
        ];
        for input in inputs {
            let once = dedupe_trailing_section(input, MARKER);
            let twice = dedupe_trailing_section(&once, MARKER);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }
}
