//! Prompt assembly for answer generation

use crate::types::ScoredChunk;

/// Fixed system instruction for the generative model.
pub const SYSTEM_PROMPT: &str = "당신은 병원 고객 상담 전문가입니다. \
아래에 제공된 상담 사례를 참고하여 고객의 질문에 한국어로 구체적이고 \
실용적인 답변을 제공하세요. 사례에 없는 내용은 지어내지 마세요.";

/// Prompt builder for retrieval-augmented generation
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate retrieved chunk texts in retrieval order.
    pub fn build_context(retrieved: &[ScoredChunk]) -> String {
        let mut context = String::new();
        for (position, scored) in retrieved.iter().enumerate() {
            context.push_str(&format!("[사례 {}]\n{}\n\n", position + 1, scored.chunk.content));
        }
        context
    }

    /// Build the full user prompt: retrieved context, then the question.
    pub fn build_user_prompt(question: &str, retrieved: &[ScoredChunk]) -> String {
        if retrieved.is_empty() {
            return format!("질문: {}\n\n답변:", question);
        }
        format!(
            "참고 사례:\n{}질문: {}\n\n답변:",
            Self::build_context(retrieved),
            question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ScoredChunk};
    use std::collections::HashMap;

    fn scored(content: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: uuid::Uuid::new_v4(),
                unit_id: 0,
                content: content.to_string(),
                chunk_index: 0,
                metadata: HashMap::new(),
            },
            score,
        }
    }

    #[test]
    fn context_preserves_retrieval_order() {
        let retrieved = vec![scored("첫 번째 사례", 0.9), scored("두 번째 사례", 0.5)];
        let context = PromptBuilder::build_context(&retrieved);
        let first = context.find("첫 번째 사례").expect("first present");
        let second = context.find("두 번째 사례").expect("second present");
        assert!(first < second);
    }

    #[test]
    fn user_prompt_ends_with_the_question() {
        let retrieved = vec![scored("사례", 0.9)];
        let prompt = PromptBuilder::build_user_prompt("면회 시간은 언제인가요?", &retrieved);
        assert!(prompt.contains("면회 시간은 언제인가요?"));
        assert!(prompt.find("사례").expect("context") < prompt.find("면회").expect("question"));
    }

    #[test]
    fn empty_context_prompt_is_question_only() {
        let prompt = PromptBuilder::build_user_prompt("주차는 어디에 하나요?", &[]);
        assert!(!prompt.contains("참고 사례"));
        assert!(prompt.contains("주차는 어디에 하나요?"));
    }
}
