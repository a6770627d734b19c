//! Deterministic keyword fallback for failed generation
//!
//! When the generative call fails (network, auth, quota, timeout), the
//! synthesizer answers from this fixed table instead of surfacing the
//! failure. Entries are checked in order; the first keyword contained in
//! the question wins.

/// Outcome of a fallback lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackAnswer {
    /// A domain keyword matched; carries the canned answer.
    Hit(String),
    /// No keyword matched; carries the fixed contact-us answer.
    Miss(String),
}

const KEYWORD_ANSWERS: &[(&str, &str)] = &[
    (
        "응급실",
        "응급실은 연중무휴 24시간 운영됩니다. 응급 상황 시 1층 응급의료센터로 바로 내원해 주세요.",
    ),
    (
        "예약",
        "진료 예약은 전화 또는 홈페이지에서 가능하며, 예약 변경과 취소는 진료 24시간 전까지 가능합니다.",
    ),
    (
        "취소",
        "예약 취소는 진료 24시간 전까지 전화 또는 홈페이지에서 가능합니다.",
    ),
    (
        "진료시간",
        "평일 진료시간은 오전 9시부터 오후 5시 30분까지이며, 토요일은 오전 9시부터 오후 1시까지입니다.",
    ),
    (
        "주차",
        "병원 지하 주차장을 이용하실 수 있으며, 외래 진료 시 최대 4시간 무료 주차가 지원됩니다.",
    ),
    (
        "면회",
        "면회 시간은 평일 오후 6시부터 8시까지이며, 병동별로 다를 수 있으니 간호사실에 문의해 주세요.",
    ),
    (
        "비용",
        "진료 비용은 진료 항목에 따라 다르며, 자세한 내용은 원무과 수납 창구에서 안내받으실 수 있습니다.",
    ),
    (
        "진단서",
        "진단서와 같은 제증명 서류는 신분증을 지참하여 원무과 제증명 창구에서 발급받으실 수 있습니다.",
    ),
];

/// Fixed answer when no keyword matches.
pub const MISS_ANSWER: &str =
    "죄송합니다. 문의하신 내용에 대한 답변을 찾지 못했습니다. 병원 고객센터로 문의해 주시기 바랍니다.";

/// Keyword-table fallback used when generation fails
pub struct KeywordFallback;

impl KeywordFallback {
    /// Look up a canned answer for `question`.
    pub fn answer(question: &str) -> FallbackAnswer {
        for (keyword, answer) in KEYWORD_ANSWERS {
            if question.contains(keyword) {
                return FallbackAnswer::Hit((*answer).to_string());
            }
        }
        FallbackAnswer::Miss(MISS_ANSWER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_room_keyword_hits() {
        let answer = KeywordFallback::answer("응급실 위치가 어디인가요?");
        match answer {
            FallbackAnswer::Hit(text) => assert!(text.contains("응급실")),
            FallbackAnswer::Miss(_) => panic!("expected a keyword hit"),
        }
    }

    #[test]
    fn first_matching_keyword_wins() {
        // Contains both 예약 and 취소; the table is ordered and 예약 comes first.
        let answer = KeywordFallback::answer("예약 취소는 어떻게 하나요?");
        assert!(matches!(answer, FallbackAnswer::Hit(text) if text.contains("예약")));
    }

    #[test]
    fn unmatched_question_misses_with_fixed_answer() {
        let answer = KeywordFallback::answer("오늘 점심 메뉴가 무엇인가요?");
        assert_eq!(answer, FallbackAnswer::Miss(MISS_ANSWER.to_string()));
    }
}
