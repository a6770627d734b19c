//! Unit construction, diagnostics, and corpus persistence

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::QaUnit;

use super::clean::clean;
use super::loader::RawTable;

/// Fixed category tag for this domain.
pub const CATEGORY: &str = "hospital";

/// Provenance tag stored in every unit's metadata.
pub const SOURCE_TAG: &str = "hospital_qa";

/// Build cleaned, uniquely identified units from a raw table.
///
/// Rows are visited in source order and a unit is emitted only when both
/// sides survive cleaning. Ids are the source row ordinals and are not
/// renumbered after drops.
pub fn build_units(table: &RawTable) -> Vec<QaUnit> {
    let mut units = Vec::new();

    for (ordinal, row) in table.rows.iter().enumerate() {
        let question = clean(row.question.as_deref().unwrap_or(""));
        let answer = clean(row.answer.as_deref().unwrap_or(""));
        if question.is_empty() || answer.is_empty() {
            continue;
        }

        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), SOURCE_TAG.to_string());
        metadata.insert("index".to_string(), ordinal.to_string());

        units.push(QaUnit {
            id: ordinal as u32,
            question,
            answer,
            category: CATEGORY.to_string(),
            metadata,
        });
    }

    tracing::debug!(
        "built {} units from {} raw rows",
        units.len(),
        table.rows.len()
    );
    units
}

/// Corpus diagnostics; a pure read over the raw table.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub total_rows: usize,
    pub missing_questions: usize,
    pub missing_answers: usize,
    /// Mean character length of present question cells
    pub mean_question_length: f64,
    /// Mean character length of present answer cells
    pub mean_answer_length: f64,
    pub distinct_questions: usize,
    pub duplicate_questions: usize,
}

/// Summarize a raw table for diagnostics. Never mutates the table.
pub fn quality_report(table: &RawTable) -> QualityReport {
    let mut missing_questions = 0;
    let mut missing_answers = 0;
    let mut question_length_total = 0usize;
    let mut question_count = 0usize;
    let mut answer_length_total = 0usize;
    let mut answer_count = 0usize;
    let mut seen = HashSet::new();
    let mut duplicate_questions = 0;

    for row in &table.rows {
        match &row.question {
            Some(question) => {
                question_length_total += question.chars().count();
                question_count += 1;
                if !seen.insert(question.clone()) {
                    duplicate_questions += 1;
                }
            }
            None => missing_questions += 1,
        }
        match &row.answer {
            Some(answer) => {
                answer_length_total += answer.chars().count();
                answer_count += 1;
            }
            None => missing_answers += 1,
        }
    }

    QualityReport {
        total_rows: table.rows.len(),
        missing_questions,
        missing_answers,
        mean_question_length: mean(question_length_total, question_count),
        mean_answer_length: mean(answer_length_total, answer_count),
        distinct_questions: seen.len(),
        duplicate_questions,
    }
}

fn mean(total: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Persist processed units. Written once by preparation, read back by the
/// indexer at startup.
pub fn save_units(units: &[QaUnit], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = bincode::serde::encode_to_vec(units, bincode::config::standard())
        .map_err(|e| Error::DataLoad(format!("corpus encode failed: {}", e)))?;
    std::fs::write(path, bytes)?;
    tracing::info!("wrote {} units to {}", units.len(), path.display());
    Ok(())
}

/// Load a previously persisted corpus.
pub fn load_units(path: &Path) -> Result<Vec<QaUnit>> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::DataLoad(format!("{}: {}", path.display(), e)))?;
    let (units, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
        .map_err(|e| Error::DataLoad(format!("{}: corpus decode failed: {}", path.display(), e)))?;
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::loader::RawRecord;

    fn row(question: Option<&str>, answer: Option<&str>) -> RawRecord {
        RawRecord {
            question: question.map(str::to_string),
            answer: answer.map(str::to_string),
        }
    }

    #[test]
    fn drops_rows_with_an_empty_side_and_keeps_sparse_ids() {
        let table = RawTable {
            rows: vec![
                row(Some("예약은 어떻게 하나요?"), Some("전화로 가능합니다.")),
                row(None, Some("답변만 있는 행")),
                row(Some("질문만 있는 행"), None),
                row(Some("@#$"), Some("특수문자만 있는 질문")),
                row(Some("면회 시간이 궁금해요"), Some("오후 6시부터 8시까지입니다.")),
            ],
        };

        let units = build_units(&table);
        assert_eq!(units.len(), 2);
        // Ids are the source ordinals, with gaps where rows were dropped.
        assert_eq!(units[0].id, 0);
        assert_eq!(units[1].id, 4);
        assert_eq!(units[0].category, CATEGORY);
        assert_eq!(units[1].metadata.get("index").map(String::as_str), Some("4"));
    }

    #[test]
    fn unit_text_is_cleaned() {
        let table = RawTable {
            rows: vec![row(Some("  예약   취소는 <어떻게> 하나요? "), Some("가능합니다!"))],
        };
        let units = build_units(&table);
        assert_eq!(units[0].question, "예약 취소는 어떻게 하나요?");
    }

    #[test]
    fn combined_text_carries_both_sides() {
        let table = RawTable {
            rows: vec![row(Some("질문입니다"), Some("답변입니다"))],
        };
        let units = build_units(&table);
        assert_eq!(units[0].combined_text(), "질문: 질문입니다\n답변: 답변입니다");
    }

    #[test]
    fn quality_report_counts() {
        let table = RawTable {
            rows: vec![
                row(Some("같은 질문"), Some("답변 하나")),
                row(Some("같은 질문"), None),
                row(None, Some("다른 답변")),
            ],
        };
        let report = quality_report(&table);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.missing_questions, 1);
        assert_eq!(report.missing_answers, 1);
        assert_eq!(report.distinct_questions, 1);
        assert_eq!(report.duplicate_questions, 1);
        assert!(report.mean_question_length > 0.0);
    }

    #[test]
    fn units_round_trip_through_persistence() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("processed/units.bin");
        let table = RawTable {
            rows: vec![row(Some("예약 문의"), Some("전화 주세요"))],
        };
        let units = build_units(&table);

        save_units(&units, &path).expect("save");
        let loaded = load_units(&path).expect("load");
        assert_eq!(loaded, units);
    }

    #[test]
    fn loading_a_missing_corpus_is_a_data_load_error() {
        let err = load_units(Path::new("no/such/units.bin")).expect_err("missing corpus");
        assert!(matches!(err, Error::DataLoad(_)));
    }
}
