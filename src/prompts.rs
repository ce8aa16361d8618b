//! Prompt template for résumé extraction.
//!
//! Callers can override the template via
//! [`crate::config::ExtractionConfig::prompt_template`]; the constant here is
//! used only when no override is provided. Rendering happens in
//! [`crate::pipeline::prompt`].

/// Placeholder for the extracted résumé text.
pub const RESUME_TEXT_SLOT: &str = "{resume_text}";

/// Placeholder for the schema-derived format instructions.
pub const FORMAT_INSTRUCTIONS_SLOT: &str = "{format_instructions}";

/// Placeholder for the output language.
pub const TARGET_LANGUAGE_SLOT: &str = "{target_language}";

/// Default extraction prompt.
pub const RESUME_EXTRACTION_TEMPLATE: &str = r#"<objective>
Analyse a résumé given as plain text and extract the candidate's information into structured JSON.
</objective>

<input>
The following is the candidate's résumé as plain text:

{resume_text}
</input>

<instructions>
Follow these steps to extract and structure the information:

1. ANALYSE THE STRUCTURE
   - Identify the main sections (personal information, education, experience, skills, certificates).
   - Note any unusual formatting or ordering.

2. EXTRACT THE INFORMATION
   - Work through each section systematically and collect the relevant details.
   - Pay attention to dates, job titles, organizations and descriptions.

3. HANDLE VARIATIONS
   - Résumés differ in style, layout and section order; adapt to each of them.

4. SHAPE THE OUTPUT
   - Every output value is a string.
   - Use an empty string or an empty list for information that is missing.
   - Normalise dates where possible.
   - Insert newline characters (\n) where content needs line breaks to stay readable.
   - Translate all content into {target_language}, except content that should not be translated (proper names, technical terms, technology keywords).

5. REVIEW
   - Check the extracted data for consistency and completeness.
   - Make sure every required field is filled when the résumé contains the information.
</instructions>

{format_instructions}"#;
