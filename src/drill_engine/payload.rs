use serde_json::{json, Value};

use crate::drill_engine::{
    models::{FailureDetails, Question, QuizMode, SessionProgress},
    normalizer::beautify_formula,
    report::OutboundReport,
};

/// Text shown in the question box. Formulas get subscript digits.
fn prompt_display(question: &Question) -> String {
    match question.mode {
        QuizMode::NameFromFormula => beautify_formula(&question.prompt_text),
        QuizMode::FormulaFromName => question.prompt_text.clone(),
    }
}

/// Key of the answer input; changes with every draw so the field starts empty.
pub fn input_key(question: &Question) -> String {
    format!("r_{}", question.serial)
}

fn progress_block(progress: &SessionProgress) -> Value {
    json!({
        "answered": progress.answered,
        "limit":    progress.limit.get(),
        "fraction": progress.fraction,
        "caption":  progress.caption,
    })
}

/// Map a question to the view object the UI renders.
///
/// The expected answer is deliberately left out; it only travels in
/// [`failure_view`] after a wrong answer.
pub fn question_view(question: &Question, progress: &SessionProgress, skips_remaining: u32) -> Value {
    json!({
        "question_id":     question.question_id,
        "serial":          question.serial,
        "input_key":       input_key(question),
        "topic":           question.record.topic,
        "mode":            question.mode,
        "naming_system":   question.naming_system,
        "instruction":     question.instruction(),
        "prompt":          question.prompt_text,
        "prompt_display":  prompt_display(question),
        "skips_remaining": skips_remaining,
        "can_skip":        skips_remaining > 0,
        "progress":        progress_block(progress),
    })
}

pub fn failure_view(failure: &FailureDetails) -> Value {
    json!({
        "title":    "Incorrecto",
        "prompt":   failure.prompt_text,
        "answer":   failure.user_answer,
        "solution": failure.expected_answer,
    })
}

/// Final screen: score, counts and the per-topic table.
pub fn report_view(report: &OutboundReport) -> Value {
    let rows: Vec<Value> = report
        .report
        .per_topic_breakdown
        .iter()
        .map(|b| {
            json!({
                "topic":     b.topic,
                "correct":   b.correct,
                "incorrect": b.incorrect(),
            })
        })
        .collect();
    json!({
        "student":   report.student,
        "test_kind": report.test_kind.to_string(),
        "score":     report.score(),
        "correct":   report.report.correct_count,
        "total":     report.report.total_count,
        "topics":    rows,
        "send":      report.requires_delivery(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill_engine::models::{CompoundRecord, NamingSystem, QuestionLimit, SessionState, TestKind};
    use crate::drill_engine::report::build_report;

    fn question(mode: QuizMode) -> Question {
        let record = CompoundRecord::new("H2SO4", "Oxoácidos")
            .with_name(NamingSystem::Traditional, "ácido sulfúrico");
        let (prompt_text, expected_answer) = match mode {
            QuizMode::NameFromFormula => ("H2SO4".to_string(), "ácido sulfúrico".to_string()),
            QuizMode::FormulaFromName => ("ácido sulfúrico".to_string(), "H2SO4".to_string()),
        };
        Question {
            question_id: "NF-00000001".into(),
            serial: 7,
            record,
            mode,
            naming_system: NamingSystem::Traditional,
            prompt_text,
            expected_answer,
        }
    }

    fn progress() -> SessionProgress {
        SessionProgress {
            answered: 6,
            limit: QuestionLimit::finite(10).unwrap(),
            fraction: 0.6,
            caption: "Práctica | 7/10".into(),
        }
    }

    #[test]
    fn question_view_hides_expected_answer() {
        let v = question_view(&question(QuizMode::FormulaFromName), &progress(), 2);
        let text = v.to_string();
        assert!(!text.contains("H2SO4"), "expected answer leaked: {text}");
        assert_eq!(v["instruction"], "Escribe la fórmula (Tradicional)");
        assert_eq!(v["input_key"], "r_7");
        assert_eq!(v["can_skip"], true);
        assert_eq!(v["progress"]["limit"], 10);
    }

    #[test]
    fn formula_prompt_is_beautified() {
        let v = question_view(&question(QuizMode::NameFromFormula), &progress(), 0);
        assert_eq!(v["prompt"], "H2SO4");
        assert_eq!(v["prompt_display"], "H₂SO₄");
        assert_eq!(v["instruction"], "Nombra (Tradicional)");
        assert_eq!(v["can_skip"], false);
    }

    #[test]
    fn report_view_lists_topics() {
        let mut st = SessionState::default();
        st.record_answer("Oxoácidos", true);
        st.record_answer("Oxoácidos", false);
        let out = OutboundReport {
            student: "Práctica libre".into(),
            test_kind: TestKind::Practice,
            report: build_report(&st),
        };
        let v = report_view(&out);
        assert_eq!(v["score"], 50);
        assert_eq!(v["topics"][0]["incorrect"], 1);
        assert_eq!(v["send"], false);
    }
}
