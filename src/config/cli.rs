use crate::domain::model::{DocumentKind, UserRole};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "medscribe")]
#[command(about = "Generate discharge summaries and case sheets from consultation transcripts")]
pub struct Cli {
    /// Path to TOML configuration file (API keys fall back to GROQ_API_KEY / GEMINI_API_KEY)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate a new document from a consultation transcript
    Generate {
        #[command(flatten)]
        document: DocumentArgs,

        /// Transcript file, or `-` for stdin
        #[arg(long)]
        transcript: String,

        /// Append suggested ICD-10 codes
        #[arg(long)]
        icd10: bool,
    },
    /// Revise an existing document
    Regenerate {
        #[command(flatten)]
        document: DocumentArgs,

        /// Existing document file, or `-` for stdin
        #[arg(long)]
        content: String,
    },
    /// Show which provider is configured
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    DischargeSummary,
    CaseSheet,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::DischargeSummary => DocumentKind::DischargeSummary,
            KindArg::CaseSheet => DocumentKind::CaseSheet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Admin,
    Doctor,
    Nurse,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => UserRole::Admin,
            RoleArg::Doctor => UserRole::Doctor,
            RoleArg::Nurse => UserRole::Nurse,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DocumentArgs {
    #[arg(long, value_enum)]
    pub kind: KindArg,

    #[arg(long)]
    pub patient_name: String,

    #[arg(long)]
    pub age: Option<u32>,

    #[arg(long)]
    pub gender: Option<String>,

    #[arg(long)]
    pub mrn: Option<String>,

    /// Built-in specialty: cardiology, surgery, pediatrics, orthopedics, neurology, general
    #[arg(long)]
    pub specialty: Option<String>,

    /// Custom template file with {{placeholders}}
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Consultation date used by the template (YYYY-MM-DD, default today)
    #[arg(long)]
    pub consultation_date: Option<NaiveDate>,

    #[arg(long)]
    pub doctor: Option<String>,

    #[arg(long, default_value = "cli")]
    pub user: String,

    #[arg(long, value_enum, default_value = "doctor")]
    pub role: RoleArg,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
