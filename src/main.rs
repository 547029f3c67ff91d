use clap::Parser;
use medscribe::config::cli::DocumentArgs;
use medscribe::config::Command;
use medscribe::core::rate_limit::spawn_sweeper;
use medscribe::utils::error::ErrorSeverity;
use medscribe::utils::logger;
use medscribe::{
    adapters::TracingAuditSink, build_provider, Caller, Cli, CustomTemplate, DocumentGenerator,
    DocumentService, GenerationRequest, MedscribeConfig, PatientInfo, RateLimitStore,
    RateLimiter, ScribeError,
};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match MedscribeConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    tracing::info!("Starting medscribe CLI");

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low | ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(command: Command, config: &MedscribeConfig) -> Result<(), ScribeError> {
    match command {
        Command::Status => {
            let provider = config
                .provider
                .select()
                .map(|p| format!("{:?}", p).to_lowercase())
                .unwrap_or_else(|_| "none".to_string());
            println!("ai: {} (provider: {})", config.provider_status(), provider);
            Ok(())
        }
        Command::Generate {
            document,
            transcript,
            icd10,
        } => {
            let transcript = read_input(&transcript)?;
            let request = build_request(&document, transcript, false)?.with_code_suggestions(icd10);
            execute(&document, request, config).await
        }
        Command::Regenerate { document, content } => {
            let content = read_input(&content)?;
            let request = build_request(&document, content, true)?;
            execute(&document, request, config).await
        }
    }
}

async fn execute(
    document: &DocumentArgs,
    request: GenerationRequest,
    config: &MedscribeConfig,
) -> Result<(), ScribeError> {
    let provider = build_provider(&config.provider)?;
    let mut generator = DocumentGenerator::new(provider);
    if let Some(timeout) = config.generation_timeout() {
        generator = generator.with_timeout(timeout);
    }

    let store = Arc::new(RateLimitStore::new());
    let sweeper = spawn_sweeper(store.clone(), Duration::from_secs(60));
    let service = DocumentService::new(
        generator,
        RateLimiter::document_generation(store.clone()),
        Arc::new(TracingAuditSink),
    );

    let caller = Caller::new(document.user.clone(), document.role.into());
    let result = service.process(&caller, &request, None).await;

    sweeper.abort();
    store.clear();

    let text = result?;
    match &document.output {
        Some(path) => {
            std::fs::write(path, &text)?;
            tracing::info!("📁 Document saved to: {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn build_request(
    document: &DocumentArgs,
    body: String,
    regenerate: bool,
) -> Result<GenerationRequest, ScribeError> {
    let patient = PatientInfo {
        name: document.patient_name.clone(),
        age: document.age,
        gender: document.gender.clone(),
        medical_record_number: document.mrn.clone(),
    };

    let mut request = if regenerate {
        GenerationRequest::regenerate(document.kind.into(), body, patient)
    } else {
        GenerationRequest::generate(document.kind.into(), body, patient)
    };

    if let Some(key) = &document.specialty {
        request = request.with_specialty(key.clone());
    }

    if let Some(path) = &document.template {
        let template = CustomTemplate {
            body: read_file(path)?,
            consultation_date: document
                .consultation_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            doctor_name: document.doctor.clone(),
        };
        request = request.with_custom_template(template);
    }

    Ok(request)
}

fn read_input(source: &str) -> Result<String, ScribeError> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    read_file(Path::new(source))
}

fn read_file(path: &Path) -> Result<String, ScribeError> {
    std::fs::read_to_string(path).map_err(|e| {
        ScribeError::validation(format!("Cannot read '{}': {}", path.display(), e))
    })
}
