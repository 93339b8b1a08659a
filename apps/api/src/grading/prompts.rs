// All LLM prompt constants for the Grading module.

/// System prompt for free-text grading — JSON-only reply.
pub const GRADE_TEXT_SYSTEM: &str =
    "Return ONLY valid JSON as specified. No prose.";

/// Free-text grading prompt. Replace `{text_type}`, `{extra_notes}`,
/// `{content}`.
pub const GRADE_TEXT_PROMPT_TEMPLATE: &str = r#"You are an expert writing teacher and grader. Analyze the following {text_type}.
Consider: clarity, structure, grammar, creativity, vocabulary, engagement, and overall impact.
Teacher's extra notes: {extra_notes}

Return ONLY JSON in the format:
{
  "score": 0-10,
  "strengths": ["..."],
  "weaknesses": ["..."],
  "suggestions": ["..."],
  "detailed_feedback": "..."
}

Student {text_type}:
{content}"#;

/// System prompt for the short-answer judge — single-word verdict.
pub const JUDGE_SYSTEM: &str =
    "Respond only with 'true' or 'false' (lowercase). No punctuation.";

/// Short-answer judge prompt. Replace `{question}`, `{correct_answer}`,
/// `{submitted}`.
pub const JUDGE_PROMPT_TEMPLATE: &str = r#"You are grading a short answer question.
Question: {question}
Correct Answer: {correct_answer}
Student's Answer: {submitted}
Respond only with 'true' if the student's answer is correct, or 'false' if it is incorrect."#;
