// All prompt templates for the generation pipeline.
// Placeholders use `{key}`; JSON braces in the schema examples are literal.

use tracing::warn;

/// A prompt template and the placeholders it must have filled.
pub struct PromptTemplate {
    pub name: &'static str,
    pub body: &'static str,
    pub keys: &'static [&'static str],
}

impl PromptTemplate {
    /// Replaces `{key}` for each pair in one left-to-right pass, so inserted
    /// values are never rescanned. A required key with no value stays as a
    /// literal placeholder and is logged, so the prompt can still be inspected.
    pub fn fill(&self, pairs: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.body.len());
        let mut rest = self.body;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let substitution = after.find('}').and_then(|close| {
                let key = &after[..close];
                pairs
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, value)| (close, *value))
            });
            match substitution {
                Some((close, value)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                // Schema braces and unknown placeholders pass through
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        for key in self.keys {
            if !pairs.iter().any(|(k, _)| k == key) {
                warn!("Prompt '{}' is missing value for '{{{}}}'", self.name, key);
            }
        }
        out
    }
}

pub const PASSAGE_PROMPT: PromptTemplate = PromptTemplate {
    name: "passage",
    body: PASSAGE_PROMPT_BODY,
    keys: &[
        "level",
        "passage_count",
        "passage_length",
        "sentence_count",
        "sentence_length",
        "word_list",
        "grammar_point",
        "reading_type",
        "topic",
        "language_instruction",
    ],
};

pub const QUESTION_PROMPT: PromptTemplate = PromptTemplate {
    name: "question",
    body: QUESTION_PROMPT_BODY,
    keys: &[
        "passages",
        "sentences",
        "question_count",
        "question_type",
        "learning_objective",
    ],
};

pub const ANSWER_PROMPT: PromptTemplate = PromptTemplate {
    name: "answer",
    body: ANSWER_PROMPT_BODY,
    keys: &["passages", "sentences", "questions", "language_instruction"],
};

const PASSAGE_PROMPT_BODY: &str = r#"Write English reading passages and example sentences for learners at this level: {level}.

CONDITIONS:
1. Passages: {passage_count}, about {passage_length} words each
2. Example sentences: {sentence_count}, about {sentence_length} words each
3. Vocabulary: use at least 3 words from this list: {word_list}
4. Grammar: include `{grammar_point}` in at least one passage sentence and one example sentence
5. Reading type: the passages must support `{reading_type}` questions
6. Topic: {topic}

{language_instruction}

Return exactly this JSON shape:
```json
{
  "passages": [
    {"title": "<title>", "content": "<English passage>", "korean_translation": "<Korean translation>"}
  ],
  "sentences": [
    {"english": "<English sentence>", "korean": "<Korean translation>"}
  ]
}
```"#;

const QUESTION_PROMPT_BODY: &str = r#"Write English assessment questions that use ALL of the material below together.
Adapt the original text where it serves the question: blank out words, reorder sentences,
substitute vocabulary, or transform a grammar structure. Record any adapted text in
`modified_passage` and say how it was changed in `modification_type`.

PASSAGES:
{passages}

SENTENCES:
{sentences}

CONDITIONS:
1. Number of questions: {question_count}
2. Question type: {question_type}
3. Learning objective: {learning_objective}
4. Every question has four labeled choices with plausible distractors and one defensible answer

Return exactly this JSON shape:
```json
{
  "questions": [
    {
      "id": 1,
      "question": "<question text>",
      "modified_passage": "<adapted passage or sentence, or the original if unchanged>",
      "choices": ["(A) <choice>", "(B) <choice>", "(C) <choice>", "(D) <choice>"],
      "source": "<passage or sentence the question is based on>",
      "modification_type": "<blank, reorder, substitution, unchanged, ...>",
      "learning_objective": "{learning_objective}"
    }
  ]
}
```"#;

const ANSWER_PROMPT_BODY: &str = r#"Give the correct answer and an explanation for each question below.
When a question adapts the original text, explain the change and why it was made.

PASSAGES:
{passages}

SENTENCES:
{sentences}

QUESTIONS:
{questions}

{language_instruction}

Return exactly this JSON shape:
```json
{
  "answers": [
    {
      "question_id": 1,
      "correct_choice": "<(A), (B), (C) or (D)>",
      "explanation": {
        "main": "<why the answer is correct, citing the text>",
        "distractors": "<why the other choices are wrong>",
        "learning_point": "<related grammar, vocabulary or reading point>"
      }
    }
  ]
}
```"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_replaces_every_occurrence() {
        let filled = QUESTION_PROMPT.fill(&[
            ("passages", "P"),
            ("sentences", "S"),
            ("question_count", "5"),
            ("question_type", "multiple choice"),
            ("learning_objective", "infer the main idea"),
        ]);
        assert!(!filled.contains("{learning_objective}"));
        assert_eq!(filled.matches("infer the main idea").count(), 2);
        // Literal schema braces survive
        assert!(filled.contains("\"questions\": ["));
    }

    #[test]
    fn test_missing_key_leaves_placeholder() {
        let filled = ANSWER_PROMPT.fill(&[("passages", "P"), ("sentences", "S")]);
        assert!(filled.contains("{questions}"));
    }

    #[test]
    fn test_templates_ask_for_fenced_json() {
        for template in [&PASSAGE_PROMPT, &QUESTION_PROMPT, &ANSWER_PROMPT] {
            assert!(template.body.contains("```json"), "{} lacks a json fence", template.name);
            for key in template.keys {
                assert!(
                    template.body.contains(&format!("{{{key}}}")),
                    "{} never uses {{{}}}",
                    template.name,
                    key
                );
            }
        }
    }

    #[test]
    fn test_inserted_values_are_not_refilled() {
        let filled = QUESTION_PROMPT.fill(&[
            ("passages", "The sign said {sentences} in red."),
            ("sentences", "S"),
            ("question_count", "5"),
            ("question_type", "multiple choice"),
            ("learning_objective", "details"),
        ]);
        assert!(filled.contains("The sign said {sentences} in red."));
    }
}
