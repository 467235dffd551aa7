use roommate_match::config::Settings;
use roommate_match::core::{Matcher, PredictorState, Scorer};
use roommate_match::models::{ErrorResponse, RankRequest, RankResponse};
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use validator::Validate;

/// Errors that abort a batch ranking run
#[derive(Debug, Error)]
enum RankError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl RankError {
    fn kind(&self) -> &'static str {
        match self {
            RankError::Io(_) => "io_error",
            RankError::InvalidJson(_) => "invalid_json",
            RankError::Validation(_) => "validation_failed",
        }
    }
}

fn init_logging(settings: &Settings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    // stdout carries the JSON response
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn run(settings: &Settings) -> Result<RankResponse, RankError> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let request: RankRequest = serde_json::from_str(&input)?;
    request.validate()?;

    let state = PredictorState::load(&settings.model);
    let scorer = Scorer::new(state, settings.scoring.weights());
    let matcher = Matcher::new(Arc::new(scorer), settings.scoring.min_score);

    let limit = request
        .limit
        .map(|limit| limit as usize)
        .unwrap_or(settings.scoring.default_limit);

    info!(
        "Ranking {} candidates (limit: {}, mode: {:?})",
        request.candidates.len(),
        limit,
        matcher.scorer().mode()
    );

    let result = matcher.rank(&request.subject, request.candidates, limit);

    info!(
        "Returning {} matches ({} skipped without preferences)",
        result.matches.len(),
        result.skipped
    );

    Ok(RankResponse {
        matches: result.matches,
        total_candidates: result.total_candidates,
        skipped: result.skipped,
        mode: matcher.scorer().mode(),
        generated_at: chrono::Utc::now(),
    })
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings);

    let outcome = run(&settings);
    let mut stdout = io::stdout().lock();

    let written = match &outcome {
        Ok(response) => serde_json::to_writer(&mut stdout, response),
        Err(e) => {
            error!("Ranking failed: {}", e);
            serde_json::to_writer(
                &mut stdout,
                &ErrorResponse {
                    error: e.kind().to_string(),
                    message: e.to_string(),
                },
            )
        }
    };

    if let Err(e) = written.map_err(io::Error::from).and_then(|_| writeln!(stdout)) {
        error!("Failed to write response: {}", e);
        return ExitCode::FAILURE;
    }

    if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
