//! Pure grading: no I/O, shared by submission time and reinforcement selection.

use std::collections::BTreeMap;

use crate::{
    models::{
        activity::{AnswerOption, Question},
        reporting::CorrectionRecord,
    },
    utils::text::normalize_key,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeOutcome {
    pub score: u32,
    pub total: u32,
    pub percent: u32,
    pub threshold: u32,
    pub needs_reinforcement: bool,
}

/// Whether a submitted option matches the answer key, ignoring case,
/// surrounding whitespace and diacritics. A missing answer never matches.
pub fn answer_matches(submitted: Option<&str>, correct: AnswerOption) -> bool {
    match submitted {
        Some(value) => {
            let submitted = normalize_key(value);
            !submitted.is_empty() && submitted == normalize_key(correct.as_str())
        }
        None => false,
    }
}

/// Looks up the answer for question `index`; answers are keyed by the index
/// rendered as a string.
pub fn answer_at(answers: &BTreeMap<String, String>, index: usize) -> Option<&str> {
    answers.get(&index.to_string()).map(String::as_str)
}

/// `round(score * 100 / total)` with halves rounded up; 0 when `total == 0`.
pub fn percent(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score);
    let total = u64::from(total);
    ((score * 200 + total) / (total * 2)) as u32
}

pub fn grade(
    questions: &[Question],
    answers: &BTreeMap<String, String>,
    threshold: u32,
) -> GradeOutcome {
    let total = questions.len() as u32;
    let score = questions
        .iter()
        .enumerate()
        .filter(|(idx, q)| answer_matches(answer_at(answers, *idx), q.correct_option))
        .count() as u32;
    let percent = percent(score, total);

    GradeOutcome {
        score,
        total,
        percent,
        threshold,
        needs_reinforcement: percent < threshold,
    }
}

/// Per-question correctness, recomputed from the raw answers.
pub fn correction_records(
    questions: &[Question],
    answers: &BTreeMap<String, String>,
) -> Vec<CorrectionRecord> {
    questions
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let student_answer = answer_at(answers, index);
            CorrectionRecord {
                index,
                topic: q.topic.trim().to_string(),
                statement: q.statement.clone(),
                student_answer: student_answer.map(str::to_string),
                correct_answer: q.correct_option,
                is_correct: answer_matches(student_answer, q.correct_option),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::OptionSet;

    fn question(topic: &str, correct: AnswerOption) -> Question {
        Question {
            statement: format!("Question about {}", topic),
            topic: topic.to_string(),
            options: OptionSet {
                a: "a".into(),
                b: "b".into(),
                c: "c".into(),
                d: "d".into(),
                e: "e".into(),
            },
            correct_option: correct,
        }
    }

    fn answers(pairs: &[(usize, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(i, v)| (i.to_string(), v.to_string()))
            .collect()
    }

    fn four_questions() -> Vec<Question> {
        vec![
            question("Matemática", AnswerOption::A),
            question("Matemática", AnswerOption::B),
            question("História", AnswerOption::C),
            question("História", AnswerOption::D),
        ]
    }

    #[test]
    fn test_three_of_four_passes_default_threshold() {
        let outcome = grade(
            &four_questions(),
            &answers(&[(0, "A"), (1, "B"), (2, "C"), (3, "E")]),
            70,
        );
        assert_eq!(outcome.score, 3);
        assert_eq!(outcome.total, 4);
        assert_eq!(outcome.percent, 75);
        assert!(!outcome.needs_reinforcement);
    }

    #[test]
    fn test_two_of_four_needs_reinforcement() {
        let outcome = grade(
            &four_questions(),
            &answers(&[(0, "A"), (1, "B"), (2, "A"), (3, "A")]),
            70,
        );
        assert_eq!(outcome.percent, 50);
        assert!(outcome.needs_reinforcement);
    }

    #[test]
    fn test_case_insensitive_and_missing_answers() {
        let outcome = grade(&four_questions(), &answers(&[(0, "a"), (1, " b ")]), 70);
        assert_eq!(outcome.score, 2);
        assert_eq!(outcome.percent, 50);
    }

    #[test]
    fn test_empty_questionnaire_scores_zero() {
        let outcome = grade(&[], &answers(&[(0, "A")]), 70);
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.percent, 0);
        assert!(outcome.needs_reinforcement);
    }

    #[test]
    fn test_threshold_boundary() {
        let outcome = grade(
            &four_questions(),
            &answers(&[(0, "A"), (1, "B"), (2, "C")]),
            75,
        );
        assert_eq!(outcome.percent, 75);
        assert!(!outcome.needs_reinforcement);

        let outcome = grade(&four_questions(), &answers(&[(0, "A")]), 0);
        assert!(!outcome.needs_reinforcement);
    }

    #[test]
    fn test_percent_rounding_and_bounds() {
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(0, 7), 0);
        assert_eq!(percent(7, 7), 100);
        for total in 1..=40u32 {
            for score in 0..=total {
                let p = percent(score, total);
                assert!(p <= 100);
                let exact = f64::from(score) * 100.0 / f64::from(total);
                assert_eq!(p, exact.round() as u32, "score={} total={}", score, total);
            }
        }
    }

    #[test]
    fn test_answer_matches_ignores_garbage() {
        assert!(answer_matches(Some("á"), AnswerOption::A));
        assert!(!answer_matches(Some(""), AnswerOption::A));
        assert!(!answer_matches(Some("Z"), AnswerOption::A));
        assert!(!answer_matches(None, AnswerOption::A));
    }

    #[test]
    fn test_correction_records() {
        let records = correction_records(&four_questions(), &answers(&[(0, "a"), (2, "B")]));
        assert_eq!(records.len(), 4);
        assert!(records[0].is_correct);
        assert_eq!(records[0].student_answer.as_deref(), Some("a"));
        assert!(!records[1].is_correct);
        assert_eq!(records[1].student_answer, None);
        assert!(!records[2].is_correct);
        assert_eq!(records[2].correct_answer, AnswerOption::C);
        assert_eq!(records[3].topic, "História");
    }
}
