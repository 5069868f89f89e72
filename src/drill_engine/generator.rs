use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::{debug, warn};

use crate::drill_engine::{
    error::DrillError,
    models::{CompoundRecord, NamingSystem, Question, QuizMode},
};

/// Upper bound on redraws when a drawn record has no usable name.
pub const DEFAULT_MAX_DRAW_ATTEMPTS: u32 = 100;

/// Generate a question ID from mode + RNG.
fn make_question_id(mode: QuizMode, rng: &mut impl RngCore) -> String {
    let prefix = match mode {
        QuizMode::NameFromFormula => "NF",
        QuizMode::FormulaFromName => "FN",
    };
    format!("{}-{:08X}", prefix, rng.next_u32())
}

/// Everything the generator needs besides the RNG.
#[derive(Debug, Clone, Copy)]
pub struct QuestionRequest<'a> {
    /// Records already restricted to the enabled topics.
    pub pool: &'a [CompoundRecord],
    pub modes: &'a [QuizMode],
    pub systems: &'a [NamingSystem],
    /// Draw number stamped on the question.
    pub serial: u32,
    pub max_attempts: u32,
}

impl<'a> QuestionRequest<'a> {
    pub fn new(
        pool: &'a [CompoundRecord],
        modes: &'a [QuizMode],
        systems: &'a [NamingSystem],
    ) -> Self {
        QuestionRequest {
            pool,
            modes,
            systems,
            serial: 1,
            max_attempts: DEFAULT_MAX_DRAW_ATTEMPTS,
        }
    }

    pub fn serial(mut self, serial: u32) -> Self {
        self.serial = serial;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Rows with a usable name for `systems`, grouped by topic in first-appearance
/// order. Rows without one never take part in a draw.
fn eligible_by_topic<'p>(
    pool: &'p [CompoundRecord],
    systems: &[NamingSystem],
) -> Vec<(&'p str, Vec<&'p CompoundRecord>)> {
    let mut groups: Vec<(&str, Vec<&CompoundRecord>)> = Vec::new();
    for r in pool {
        if r.eligible_systems(systems).is_empty() {
            continue;
        }
        match groups.iter_mut().find(|(t, _)| *t == r.topic) {
            Some((_, rows)) => rows.push(r),
            None => groups.push((r.topic.as_str(), vec![r])),
        }
    }
    groups
}

/// Draw one question.
///
/// A topic is picked uniformly among the topics that still have eligible
/// rows, then a row uniformly within it, so large topics are not
/// over-represented. Fails with `NoQuestionsAvailable` on an empty pool and
/// with `NoEligibleQuestion` when no row has a usable name for the enabled
/// systems. `max_attempts` only bounds the loop.
pub fn generate_question<R: Rng>(
    rng: &mut R,
    request: QuestionRequest<'_>,
) -> Result<Question, DrillError> {
    if request.pool.is_empty() {
        return Err(DrillError::NoQuestionsAvailable { topics: Vec::new() });
    }
    if request.modes.is_empty() {
        return Err(DrillError::NothingEnabled("modes"));
    }
    if request.systems.is_empty() {
        return Err(DrillError::NothingEnabled("naming systems"));
    }

    let rows = request.pool.len();
    let groups = eligible_by_topic(request.pool, request.systems);
    if groups.is_empty() {
        warn!(rows, "no row has a usable name for the enabled systems");
        return Err(DrillError::NoEligibleQuestion { rows });
    }
    let excluded = rows - groups.iter().map(|(_, g)| g.len()).sum::<usize>();
    if excluded > 0 {
        debug!(excluded, "rows without a usable name left out of the draw");
    }

    for attempt in 1..=request.max_attempts.max(1) {
        let Some((_, candidates)) = groups.choose(rng) else {
            break;
        };
        let Some(&record) = candidates.choose(rng) else {
            continue;
        };
        let eligible = record.eligible_systems(request.systems);
        let Some(&system) = eligible.choose(rng) else {
            debug!(attempt, formula = %record.formula, "record has no usable name, redrawing");
            continue;
        };
        let Some(&mode) = request.modes.choose(rng) else {
            break;
        };
        return Ok(build_question(rng, record, mode, system, request.serial));
    }

    warn!(attempts = request.max_attempts, "no eligible question after bounded redraws");
    Err(DrillError::NoEligibleQuestion { rows })
}

fn build_question<R: Rng>(
    rng: &mut R,
    record: &CompoundRecord,
    mode: QuizMode,
    system: NamingSystem,
    serial: u32,
) -> Question {
    let name = record.name(system).unwrap_or_default().trim().to_string();
    let formula = record.formula.trim().to_string();
    let (prompt_text, expected_answer) = match mode {
        QuizMode::FormulaFromName => (name, formula),
        QuizMode::NameFromFormula => (formula, name),
    };
    let question = Question {
        question_id: make_question_id(mode, rng),
        serial,
        record: record.clone(),
        mode,
        naming_system: system,
        prompt_text,
        expected_answer,
    };
    debug!(
        id = %question.question_id,
        topic = %question.record.topic,
        mode = %mode,
        system = %system,
        "question drawn"
    );
    question
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn oxide(formula: &str, stock: &str) -> CompoundRecord {
        CompoundRecord::new(formula, "Óxidos").with_name(NamingSystem::Stock, stock)
    }

    #[test]
    fn prompt_and_expected_follow_mode() {
        let pool = vec![oxide("Na2O", "óxido de sodio")];
        let mut rng = StdRng::seed_from_u64(3);

        let q = generate_question(
            &mut rng,
            QuestionRequest::new(&pool, &[QuizMode::FormulaFromName], &[NamingSystem::Stock]),
        )
        .unwrap();
        assert_eq!(q.prompt_text, "óxido de sodio");
        assert_eq!(q.expected_answer, "Na2O");
        assert!(q.question_id.starts_with("FN-"));

        let q = generate_question(
            &mut rng,
            QuestionRequest::new(&pool, &[QuizMode::NameFromFormula], &[NamingSystem::Stock]),
        )
        .unwrap();
        assert_eq!(q.prompt_text, "Na2O");
        assert_eq!(q.expected_answer, "óxido de sodio");
        assert!(q.question_id.starts_with("NF-"));
    }

    #[test]
    fn empty_pool_is_reported() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_question(
            &mut rng,
            QuestionRequest::new(&[], &QuizMode::ALL, &NamingSystem::ALL),
        )
        .unwrap_err();
        assert!(matches!(err, DrillError::NoQuestionsAvailable { .. }));
    }

    #[test]
    fn pool_without_usable_names_is_reported_at_once() {
        let pool = vec![
            CompoundRecord::new("Na2O", "Óxidos").with_name(NamingSystem::Traditional, "óxido sódico"),
            CompoundRecord::new("X", "Óxidos").with_name(NamingSystem::Stock, "x"),
        ];
        let mut rng = StdRng::seed_from_u64(9);
        let err = generate_question(
            &mut rng,
            QuestionRequest::new(&pool, &QuizMode::ALL, &[NamingSystem::Stock]).max_attempts(25),
        )
        .unwrap_err();
        assert!(matches!(err, DrillError::NoEligibleQuestion { rows: 2 }));
    }

    #[test]
    fn single_usable_row_among_many_is_always_found() {
        let mut pool: Vec<CompoundRecord> = (0..59)
            .map(|i| {
                CompoundRecord::new(format!("HX{i}O3"), "Oxoácidos")
                    .with_name(NamingSystem::Traditional, format!("ácido {i}"))
            })
            .collect();
        pool.push(
            CompoundRecord::new("H2SO4", "Oxoácidos")
                .with_name(NamingSystem::Stock, "ácido tetraoxosulfúrico(VI)"),
        );
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let q = generate_question(
                &mut rng,
                QuestionRequest::new(&pool, &QuizMode::ALL, &[NamingSystem::Stock]),
            )
            .unwrap_or_else(|e| panic!("seed={seed}: {e}"));
            assert_eq!(q.record.formula, "H2SO4");
            assert_eq!(q.naming_system, NamingSystem::Stock);
        }
    }

    #[test]
    fn topic_without_usable_rows_does_not_take_a_share() {
        let pool = vec![
            oxide("Na2O", "óxido de sodio"),
            CompoundRecord::new("NH3", "Hidruros").with_name(NamingSystem::Traditional, "amoniaco"),
        ];
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let q = generate_question(
                &mut rng,
                QuestionRequest::new(&pool, &QuizMode::ALL, &[NamingSystem::Stock]).max_attempts(1),
            )
            .unwrap();
            assert_eq!(q.topic(), "Óxidos");
        }
    }

    #[test]
    fn only_systems_with_data_are_chosen() {
        let pool = vec![
            CompoundRecord::new("FeO", "Óxidos")
                .with_name(NamingSystem::Traditional, "óxido ferroso")
                .with_name(NamingSystem::Systematic, "monóxido de hierro"),
        ];
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let q = generate_question(
                &mut rng,
                QuestionRequest::new(&pool, &QuizMode::ALL, &NamingSystem::ALL),
            )
            .unwrap();
            assert_ne!(q.naming_system, NamingSystem::Stock);
        }
    }

    #[test]
    fn topics_are_balanced_regardless_of_row_counts() {
        let mut pool: Vec<CompoundRecord> = (0..50)
            .map(|i| oxide(&format!("Ox{i}"), &format!("óxido {i}")))
            .collect();
        pool.push(CompoundRecord::new("NaOH", "Hidróxidos").with_name(NamingSystem::Stock, "hidróxido de sodio"));

        let mut rng = StdRng::seed_from_u64(2024);
        let draws = 2000;
        let mut hydroxides = 0;
        for _ in 0..draws {
            let q = generate_question(
                &mut rng,
                QuestionRequest::new(&pool, &QuizMode::ALL, &[NamingSystem::Stock]),
            )
            .unwrap();
            if q.topic() == "Hidróxidos" {
                hydroxides += 1;
            }
        }
        // Roughly half despite being 1 row out of 51.
        assert!((800..1200).contains(&hydroxides), "hydroxides drawn {hydroxides}/{draws}");
    }

    #[test]
    fn same_seed_draws_same_question() {
        let pool = vec![
            oxide("Na2O", "óxido de sodio"),
            oxide("CaO", "óxido de calcio"),
            oxide("Fe2O3", "óxido de hierro(III)"),
        ];
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            generate_question(&mut rng, QuestionRequest::new(&pool, &QuizMode::ALL, &NamingSystem::ALL))
                .unwrap()
        };
        let (a, b) = (draw(77), draw(77));
        assert_eq!(a.question_id, b.question_id);
        assert_eq!(a.prompt_text, b.prompt_text);
        assert_eq!(a.mode, b.mode);
    }
}
