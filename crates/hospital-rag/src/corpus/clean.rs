//! Text normalization for raw corpus cells

use once_cell::sync::Lazy;
use regex::Regex;

// Conservative allow-list: word characters, Korean syllables, whitespace,
// and sentence punctuation. Everything else is dropped so medical terms
// survive while markup and stray symbols do not.
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s가-힣.,!?]").expect("valid pattern"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));

/// Normalize one raw text cell.
///
/// Trims, strips characters outside the allow-list, and collapses whitespace
/// runs to single spaces. Deterministic and idempotent; any input that
/// normalizes to nothing comes back as the empty string, never an error.
pub fn clean(text: &str) -> String {
    let stripped = DISALLOWED.replace_all(text.trim(), "");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(clean("예약 취소는 <b>어떻게</b> 하나요?"), "예약 취소는 b어떻게b 하나요?");
        assert_eq!(clean("진료비 #$% 문의!"), "진료비 문의!");
    }

    #[test]
    fn keeps_sentence_punctuation() {
        assert_eq!(clean("안녕하세요. 예약, 취소 문의!"), "안녕하세요. 예약, 취소 문의!");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(clean("예약   취소는\t어떻게\n하나요?"), "예약 취소는 어떻게 하나요?");
    }

    #[test]
    fn empty_and_symbol_only_inputs_map_to_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   "), "");
        assert_eq!(clean("@#$%^&*"), "");
    }

    #[test]
    fn clean_is_idempotent() {
        let samples = [
            "예약 취소는 어떻게 하나요?",
            "  진료시간이    궁금합니다!! ",
            "special <chars> & symbols...",
            "",
            "한글과 english 123 혼용, 테스트.",
        ];
        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
