// Cross-cutting prompt fragments shared by generation and grading.

/// Appended to every system prompt that expects a JSON reply.
pub const JSON_ONLY_INSTRUCTION: &str = "Return ONLY valid JSON as specified. \
    No prose. Do NOT use markdown code fences. \
    Do NOT include explanations or apologies outside the JSON.";
