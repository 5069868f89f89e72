//! Answer checking.
//!
//! Formulas are case-sensitive ("Co" is cobalt, "CO" carbon monoxide) and only
//! tolerate subscript glyphs. Names ignore case, accents and surrounding
//! whitespace. The judge returns a verdict and never touches session state.

use crate::drill_engine::{
    models::{QuizMode, Verdict},
    normalizer::{fold_for_name_comparison, strip_subscripts},
};

pub fn judge(mode: QuizMode, raw_answer: &str, expected: &str) -> Verdict {
    let answer = raw_answer.trim();
    let expected = expected.trim();

    let is_correct = !answer.is_empty()
        && match mode {
            QuizMode::FormulaFromName => {
                answer == expected || strip_subscripts(answer) == strip_subscripts(expected)
            }
            QuizMode::NameFromFormula => {
                fold_for_name_comparison(answer) == fold_for_name_comparison(expected)
            }
        };

    Verdict {
        is_correct,
        normalized_user_display: answer.to_string(),
    }
}
