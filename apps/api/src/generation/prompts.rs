// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::models::note::{DetailLevel, NoteType};
use crate::models::quiz::QuestionKind;

/// System prompt for note generation — free-text reply expected.
pub const NOTE_SYSTEM: &str = "You are an expert educational assistant that creates clear, \
    comprehensive, and well-structured study notes. Your notes should be academically sound, \
    easy to understand, and properly formatted for student use.";

/// System prompt for flashcard generation — JSON array reply expected.
pub const FLASHCARD_SYSTEM: &str = "You are an expert educator creating effective study \
    flashcards. Always return valid JSON.";

/// Flashcard prompt template. Replace `{num_cards}`, `{difficulty}`, `{content}`.
pub const FLASHCARD_PROMPT_TEMPLATE: &str = r#"Create {num_cards} high-quality flashcards from the following content.
Difficulty level: {difficulty}

Content:
{content}

Return ONLY a valid JSON array with this exact structure:
[
    {
        "front": "Question or term",
        "back": "Answer or definition",
        "category": "Subject area",
        "difficulty": "{difficulty}"
    }
]

Make sure each flashcard:
- Tests important concepts
- Has clear, concise questions
- Provides complete answers
- Covers different aspects of the material"#;

/// Schema preamble shared by every quiz prompt.
pub const QUIZ_SCHEMA_HEADER: &str = r#"You are a quiz generator. Output ONLY a single JSON object. NO markdown, NO code fences, NO comments. The JSON schema is:
{ "title": "string", "questions": [ { "question": "string", "options": ["A) ...","B) ...","C) ...","D) ..."], "correct_answer": "A|B|C|D or exact text or True/False", "explanation": "string" } ] }"#;

fn detail_instruction(level: DetailLevel) -> &'static str {
    match level {
        DetailLevel::Basic => {
            "Create concise, easy-to-understand notes suitable for beginners. \
             Use simple language and focus on the most important concepts."
        }
        DetailLevel::Intermediate => {
            "Create comprehensive notes with moderate detail. Include examples \
             and explanations that help reinforce understanding."
        }
        DetailLevel::Advanced => {
            "Create detailed, thorough notes with in-depth explanations, \
             examples, and connections to related concepts."
        }
    }
}

/// Builds the note-generation prompt for the requested note type and detail
/// level.
pub fn build_note_prompt(note_type: NoteType, detail_level: DetailLevel, input: &str) -> String {
    let detail = detail_instruction(detail_level);

    match note_type {
        NoteType::Summary => format!(
            "{detail}\n\nPlease create a well-structured summary of the following topic or content:\n{input}\n\n\
             Format your response with:\n\
             - Clear headings and subheadings\n\
             - Key points in bullet format where appropriate\n\
             - Important terms or concepts highlighted\n\
             - Logical flow from general to specific concepts"
        ),
        NoteType::DetailedExplanation => format!(
            "{detail}\n\nPlease create a detailed explanation of the following topic:\n{input}\n\n\
             Format your response with:\n\
             - Introduction to the topic\n\
             - Step-by-step explanations where applicable\n\
             - Examples to illustrate key concepts\n\
             - Important definitions and terminology\n\
             - Conclusion summarizing main points"
        ),
        NoteType::KeyPoints => format!(
            "{detail}\n\nPlease extract and organize the key points from the following content:\n{input}\n\n\
             Format your response with:\n\
             - Main concepts organized hierarchically\n\
             - Essential facts and figures\n\
             - Important relationships between concepts\n\
             - Critical information that would be useful for studying"
        ),
        NoteType::StudyGuide => format!(
            "{detail}\n\nPlease create a comprehensive study guide for the following topic:\n{input}\n\n\
             Format your response with:\n\
             - Learning objectives\n\
             - Key concepts and definitions\n\
             - Important facts and figures\n\
             - Practice questions or review points\n\
             - Summary of main takeaways"
        ),
        NoteType::Definitions => format!(
            "{detail}\n\nPlease identify and define key terms and concepts related to:\n{input}\n\n\
             Format your response with:\n\
             - Clear definitions for each term\n\
             - Context for when and how terms are used\n\
             - Examples where helpful\n\
             - Organization from basic to advanced terms"
        ),
        NoteType::StudyQuestions => format!(
            "Based on the following content, create study questions along with brief answers:\n{input}\n\n\
             Format your response with:\n\
             - Questions that test understanding of key concepts\n\
             - Brief, clear answers to each question\n\
             - A mix of factual recall and conceptual understanding questions\n\
             - Questions organized from basic to more complex"
        ),
        NoteType::OrganizedContent => format!(
            "{detail}\n\nPlease organize the following content into well-structured study notes:\n{input}\n\n\
             Format your response with:\n\
             - Logical organization with clear headings\n\
             - Information grouped by related concepts\n\
             - Hierarchical structure from general to specific\n\
             - Easy-to-scan formatting for study purposes"
        ),
        NoteType::AnswerQuestions => format!(
            "{detail}\n\nPlease provide comprehensive answers to the following questions and format them as study notes:\n{input}\n\n\
             Format your response with:\n\
             - Clear answers to each question\n\
             - Supporting explanations and examples\n\
             - Related concepts and connections\n\
             - Additional context where helpful"
        ),
    }
}

/// Builds the quiz-generation prompt for one concrete question kind.
pub fn build_quiz_prompt(
    kind: QuestionKind,
    num_questions: usize,
    difficulty: &str,
    content: &str,
) -> String {
    let task = match kind {
        QuestionKind::MultipleChoice => format!(
            "Create {num_questions} {difficulty} multiple choice questions from this content. \
             Each must have options A-D, exactly one correct answer (letter or exact text), and an explanation."
        ),
        QuestionKind::TrueFalse => format!(
            "Create {num_questions} {difficulty} true/false questions from this content. \
             Use \"True\" or \"False\" for correct_answer and include an explanation."
        ),
        QuestionKind::ShortAnswer => format!(
            "Create {num_questions} {difficulty} short answer questions from this content. \
             Include a clear correct_answer and an explanation."
        ),
        QuestionKind::FillInBlank => format!(
            "Create {num_questions} {difficulty} fill-in-the-blank questions from this content. \
             Mark the blank with '_____' in the question, and give the exact missing text as correct_answer with an explanation."
        ),
    };

    format!("{QUIZ_SCHEMA_HEADER}\n{task}\nContent:\n{content}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_prompt_includes_input_and_detail() {
        let prompt = build_note_prompt(NoteType::Summary, DetailLevel::Basic, "Photosynthesis");
        assert!(prompt.contains("Photosynthesis"));
        assert!(prompt.contains("suitable for beginners"));
    }

    #[test]
    fn test_study_questions_prompt_skips_detail_instruction() {
        let prompt =
            build_note_prompt(NoteType::StudyQuestions, DetailLevel::Advanced, "The cell");
        assert!(!prompt.contains("in-depth explanations"));
        assert!(prompt.contains("create study questions"));
    }

    #[test]
    fn test_quiz_prompt_carries_schema_and_count() {
        let prompt = build_quiz_prompt(QuestionKind::MultipleChoice, 5, "Medium", "Mitosis");
        assert!(prompt.contains("single JSON object"));
        assert!(prompt.contains("Create 5 Medium multiple choice questions"));
        assert!(prompt.contains("Mitosis"));
    }

    #[test]
    fn test_flashcard_template_has_placeholders() {
        assert!(FLASHCARD_PROMPT_TEMPLATE.contains("{num_cards}"));
        assert!(FLASHCARD_PROMPT_TEMPLATE.contains("{difficulty}"));
        assert!(FLASHCARD_PROMPT_TEMPLATE.contains("{content}"));
    }
}
