//! formulacion: terminal front end for the nomenclature drill.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use formulation_drill::drill_engine::normalizer::beautify_formula;
use formulation_drill::{
    dispatch_report, ConfigDraft, Dataset, DeliveryStatus, DrillError, DrillSettings, FileOutbox,
    NamingSystem, Question, QuestionBank, QuestionLimit, QuizMode, SessionTracker, SubmitOutcome,
    TestKind, CANONICAL_TOPICS,
};

const SKIP_COMMAND: &str = ":saltar";
const QUIT_COMMAND: &str = ":salir";

#[derive(Parser)]
#[command(name = "formulacion", version, about = "Inorganic nomenclature drill")]
struct Cli {
    /// Compound table (CSV)
    #[arg(long, default_value = "data/formulacion.csv")]
    dataset: PathBuf,

    /// Settings file (TOML); defaults apply when omitted
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Test kind: practice, exam, exam-mixed
    #[arg(long, default_value = "practice")]
    kind: String,

    /// Topics, comma-separated (e.g. "Óxidos,Hidruros"); all when omitted
    #[arg(long)]
    topics: Option<String>,

    /// Modes, comma-separated: name, formula
    #[arg(long, default_value = "name,formula")]
    modes: String,

    /// Naming systems, comma-separated: traditional, stock, systematic
    #[arg(long, default_value = "traditional,stock,systematic")]
    systems: String,

    /// Practice length: a number or "inf"
    #[arg(long)]
    limit: Option<String>,

    /// Student email, required for exams
    #[arg(long)]
    email: Option<String>,

    /// RNG seed for a reproducible session
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("formulation_drill=info".parse().unwrap()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => DrillSettings::load(path)?,
        None => DrillSettings::default(),
    };
    let dataset = Dataset::from_csv_path(&cli.dataset)
        .with_context(|| format!("failed to load dataset {}", cli.dataset.display()))?;
    let bank = Arc::new(QuestionBank::new(dataset));

    let mut draft = ConfigDraft::new(&settings);
    draft.set_test_kind(parse_kind(&cli.kind)?);
    match &cli.topics {
        Some(list) => {
            for topic in split_list(list) {
                draft.toggle_topic(&settings, topic);
            }
        }
        None if draft.test_kind() == TestKind::Exam && settings.single_topic_exam => {
            bail!("an exam covers a single topic; pass it with --topics");
        }
        None => {
            for topic in CANONICAL_TOPICS {
                draft.toggle_topic(&settings, topic);
            }
        }
    }
    draft.set_modes(&parse_list(&cli.modes, parse_mode)?);
    draft.set_naming_systems(&parse_list(&cli.systems, parse_system)?);
    if let Some(limit) = &cli.limit {
        draft.set_practice_limit(parse_limit(limit)?);
    }
    if let Some(email) = &cli.email {
        draft.set_email(email.as_str());
    }
    let config = draft.build(&settings).context("invalid session configuration")?;

    let outbox = FileOutbox::new(settings.outbox_dir.clone());
    let mut session = SessionTracker::new(bank, settings, cli.seed);
    session.start(config).context("could not start the session")?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !session.is_finished() {
        let Some(question) = session.current_question() else {
            session.retry_draw()?;
            continue;
        };
        print_question(question, &session);

        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        let line = line?;
        match line.trim() {
            QUIT_COMMAND => {
                session.reset();
                println!("Sesión descartada.");
                return Ok(());
            }
            SKIP_COMMAND => match session.skip() {
                Ok(_) => println!("Saltada. Te quedan {} saltos.", session.skips_remaining()),
                Err(e @ DrillError::SkipBudgetExhausted { .. }) => println!("{e}"),
                Err(e) => eprintln!("{e}"),
            },
            answer => match session.submit_answer(answer) {
                Ok(SubmitOutcome::Correct { .. }) => println!("✔ Correcto\n"),
                Ok(SubmitOutcome::Incorrect { failure, .. }) => {
                    println!("✘ Incorrecto");
                    println!("  Pregunta:  {}", failure.prompt_text);
                    println!("  Tu texto:  {}", failure.user_answer);
                    println!("  Solución:  {}", failure.expected_answer);
                    print!("Pulsa Enter para continuar... ");
                    io::stdout().flush()?;
                    if lines.next().transpose()?.is_none() {
                        return Ok(());
                    }
                    session.acknowledge()?;
                    println!();
                }
                Ok(SubmitOutcome::Ignored) => {}
                // The answer is scored; the next draw is retried at the top of the loop.
                Err(e) => eprintln!("{e}"),
            },
        }
    }

    let Some(outbound) = session.outbound_report() else {
        bail!("finished session has no configuration");
    };
    println!("── Resultado ──");
    println!("NOTA: {} / 100", outbound.score());
    println!(
        "Aciertos: {}/{}",
        outbound.report.correct_count, outbound.report.total_count
    );
    print!("{}", outbound.breakdown_text());

    match dispatch_report(&outbox, &outbound) {
        DeliveryStatus::Delivered => println!("Informe enviado."),
        DeliveryStatus::NotRequired => {}
        DeliveryStatus::Failed(reason) => println!("No se pudo enviar el informe: {reason}"),
    }
    Ok(())
}

fn print_question(question: &Question, session: &SessionTracker) {
    let prompt = match question.mode {
        QuizMode::NameFromFormula => beautify_formula(&question.prompt_text),
        QuizMode::FormulaFromName => question.prompt_text.clone(),
    };
    println!("[{}] {}", session.progress().caption, question.topic());
    println!("{}: {}", question.instruction(), prompt);
    print!("> ");
    // A failed flush only delays the prompt.
    let _ = io::stdout().flush();
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_list<T>(list: &str, parse: fn(&str) -> Result<T>) -> Result<Vec<T>> {
    split_list(list).map(parse).collect()
}

fn parse_kind(s: &str) -> Result<TestKind> {
    match s.trim().to_lowercase().as_str() {
        "practice" | "practica" | "práctica" => Ok(TestKind::Practice),
        "exam" | "examen" => Ok(TestKind::Exam),
        "exam-mixed" | "mixed" | "mezcla" => Ok(TestKind::ExamMixed),
        other => bail!("unknown test kind '{other}' (practice, exam, exam-mixed)"),
    }
}

fn parse_mode(s: &str) -> Result<QuizMode> {
    match s.to_lowercase().as_str() {
        "name" | "nombrar" => Ok(QuizMode::NameFromFormula),
        "formula" | "formular" => Ok(QuizMode::FormulaFromName),
        other => bail!("unknown mode '{other}' (name, formula)"),
    }
}

fn parse_system(s: &str) -> Result<NamingSystem> {
    match s.to_lowercase().as_str() {
        "traditional" | "tradicional" => Ok(NamingSystem::Traditional),
        "stock" => Ok(NamingSystem::Stock),
        "systematic" | "sistematica" | "sistemática" => Ok(NamingSystem::Systematic),
        other => bail!("unknown naming system '{other}' (traditional, stock, systematic)"),
    }
}

fn parse_limit(s: &str) -> Result<QuestionLimit> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("inf") || s == "∞" {
        return Ok(QuestionLimit::Unbounded);
    }
    let n: u32 = s
        .parse()
        .with_context(|| format!("invalid limit '{s}' (a number or \"inf\")"))?;
    QuestionLimit::finite(n).context("limit must be greater than zero")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_limits() {
        assert_eq!(parse_limit("inf").unwrap(), QuestionLimit::Unbounded);
        assert_eq!(parse_limit(" 15 ").unwrap(), QuestionLimit::finite(15).unwrap());
        assert!(parse_limit("0").is_err());
        assert!(parse_limit("diez").is_err());
    }

    #[test]
    fn parses_lists_in_either_language() {
        let systems = parse_list("stock, Sistemática", parse_system).unwrap();
        assert_eq!(systems, [NamingSystem::Stock, NamingSystem::Systematic]);
        let modes = parse_list("formular,", parse_mode).unwrap();
        assert_eq!(modes, [QuizMode::FormulaFromName]);
        assert!(parse_list("stock,iupac", parse_system).is_err());
    }

    #[test]
    fn parses_kinds() {
        assert_eq!(parse_kind("Examen").unwrap(), TestKind::Exam);
        assert_eq!(parse_kind("exam-mixed").unwrap(), TestKind::ExamMixed);
        assert!(parse_kind("quiz").is_err());
    }
}
