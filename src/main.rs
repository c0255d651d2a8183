//! hairline-scan — command-line front end.
//!
//! Reads up to three photos from disk, runs one analysis through the
//! orchestrator, and prints the result plus the final status.
//!
//!   hairline-scan --front front.jpg --left left.jpg --age-range 25-34
//!   hairline-scan --front front.jpg --json

use clap::Parser;
use hairline_scan_lib::llm::build_transport;
use hairline_scan_lib::{
    AnalysisResult, AnalysisStatus, AnalyzerConfig, CapturedPhotos, EncodedImage, Orchestrator,
    PhotoSlot, QuestionnaireData,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hairline-scan")]
#[command(about = "Analyze hairline photos with a remote AI service")]
struct Args {
    /// Front-facing photo
    #[arg(long)]
    front: Option<PathBuf>,

    /// Left-side photo
    #[arg(long)]
    left: Option<PathBuf>,

    /// Right-side photo
    #[arg(long)]
    right: Option<PathBuf>,

    #[arg(long)]
    age_range: Option<String>,

    /// How long changes have been noticed
    #[arg(long)]
    duration: Option<String>,

    #[arg(long)]
    family_history: Option<String>,

    /// How often a hair routine is followed
    #[arg(long)]
    routine_frequency: Option<String>,

    #[arg(long)]
    care_level: Option<String>,

    /// Print result and status as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let loaded = hairline_scan_lib::config::load_env_files(&cwd);
    env_logger::init();
    if let Some(path) = loaded {
        log::info!("[STARTUP] Environment from {}", path.display());
    }

    let args = Args::parse();

    let config = match AnalyzerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let transport = match build_transport(&config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Transport error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let photos = match read_photos(&args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let questionnaire = QuestionnaireData {
        age_range: args.age_range.clone(),
        duration: args.duration.clone(),
        family_history: args.family_history.clone(),
        routine_frequency: args.routine_frequency.clone(),
        care_level: args.care_level.clone(),
    };

    let orchestrator = Orchestrator::new(config, transport);
    let result = orchestrator.analyze(photos, questionnaire).await;
    let status = orchestrator.status();

    if args.json {
        print_json(result.as_ref(), &status);
    } else {
        print_human(result.as_ref(), &status);
    }

    if result.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_photos(args: &Args) -> Result<CapturedPhotos, String> {
    let mut photos = CapturedPhotos::default();
    for (slot, path) in [
        (PhotoSlot::Front, &args.front),
        (PhotoSlot::Left, &args.left),
        (PhotoSlot::Right, &args.right),
    ] {
        if let Some(path) = path {
            photos.set(slot, Some(read_photo(path)?));
        }
    }
    Ok(photos)
}

fn read_photo(path: &Path) -> Result<EncodedImage, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(EncodedImage::from_bytes(&bytes))
}

fn print_json(result: Option<&AnalysisResult>, status: &AnalysisStatus) {
    let out = serde_json::json!({
        "result": result,
        "status": status,
    });
    match serde_json::to_string_pretty(&out) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn print_human(result: Option<&AnalysisResult>, status: &AnalysisStatus) {
    if let Some(message) = &status.error {
        let tag = status.error_type.map(|k| k.as_str()).unwrap_or("error");
        eprintln!("[{}] {}", tag, message);
        if status.error_type.is_some_and(|k| k.manual_retry_offered()) && !status.used_fallback {
            eprintln!("Run the command again to retry.");
        }
    }
    let Some(r) = result else {
        return;
    };
    if status.used_fallback {
        println!("** Demo result: the analysis service could not be used **");
    }
    if status.used_single_photo {
        println!("(Only one photo was sent to keep the upload small.)");
    }
    println!("Score:      {:.1} / 10", r.score);
    println!("Confidence: {:.0}%", r.confidence * 100.0);
    println!();
    println!("{}", r.summary);
    print_list("Observations", &r.observations);
    print_list("Likely patterns", &r.likely_patterns);
    for group in &r.options {
        print_list(&group.title, &group.bullets);
    }
    print_list("See a dermatologist if", &r.see_dermatologist_if);
    println!();
    println!("{}", r.disclaimer);
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}:", title);
    for item in items {
        println!("  - {}", item);
    }
}
