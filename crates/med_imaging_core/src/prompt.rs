//! crates/med_imaging_core/src/prompt.rs
//!
//! The fixed diagnostic-report prompt sent with every image. The section
//! headers here are load-bearing: the report post-processor keys off the
//! "### 5. Research Context" header to deduplicate echoed references.

/// Marker header for the references section; see [`crate::report`].
pub const RESEARCH_SECTION_MARKER: &str = "### 5. Research Context";

pub const DIAGNOSTIC_PROMPT: &str = r#"You are a highly skilled medical imaging expert with extensive knowledge in radiology and diagnostic imaging. Analyze the attached medical image and structure your response as follows:

### 1. Image Type & Region
- Specify the imaging modality (X-ray / MRI / CT / Ultrasound / etc.)
- Identify the patient's anatomical region and positioning
- Comment on image quality and technical adequacy

### 2. Key Findings
- List primary observations systematically
- Note any abnormalities in the patient's imaging with precise descriptions
- Include measurements and densities where relevant
- Describe location, size, shape, and characteristics
- Rate severity: Normal / Mild / Moderate / Severe

### 3. Diagnostic Assessment
- Provide primary diagnosis with confidence level
- List differential diagnoses in order of likelihood
- Support each diagnosis with observed evidence from the patient's imaging
- Explain the rationale behind each conclusion: name the specific image features and regions that drove it, so the reasoning can be audited step by step
- Note any critical or urgent findings

### 4. Patient-Friendly Explanation
- Explain the findings in simple, clear language that the patient can understand
- Avoid medical jargon or provide clear definitions
- Include visual analogies if helpful
- Address common patient concerns related to these findings

### 5. Research Context
- Use the web search tool to find recent medical literature about similar cases
- Provide 2-3 key references supporting your analysis
- Include links to standard treatment protocols where available

Format your response using clear markdown headers and bullet points. Be concise yet thorough."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_covers_every_report_section() {
        for header in [
            "### 1. Image Type & Region",
            "### 2. Key Findings",
            "### 3. Diagnostic Assessment",
            "### 4. Patient-Friendly Explanation",
            RESEARCH_SECTION_MARKER,
        ] {
            assert!(DIAGNOSTIC_PROMPT.contains(header), "missing {header}");
        }
    }

    #[test]
    fn template_asks_for_an_auditable_rationale() {
        assert!(DIAGNOSTIC_PROMPT.contains("rationale"));
        assert!(DIAGNOSTIC_PROMPT.contains("image features and regions that drove it"));
    }

    #[test]
    fn references_header_matches_the_dedupe_marker() {
        // The post-processor splits on this exact string; the template must
        // emit it verbatim.
        assert_eq!(RESEARCH_SECTION_MARKER, "### 5. Research Context");
        assert_eq!(DIAGNOSTIC_PROMPT.matches(RESEARCH_SECTION_MARKER).count(), 1);
    }
}
