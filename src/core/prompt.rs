use crate::domain::model::{DocumentKind, GenerationMode, GenerationRequest, PatientInfo, PromptPair};

/// prompt 文字有變動就遞增，方便追查文件由哪一版 prompt 產生
pub const PROMPT_VERSION: &str = "1.0";

pub const NO_PLACEHOLDERS_INSTRUCTION: &str =
    "Be professional, accurate, and complete. No placeholders.";

pub const CODE_SUGGESTIONS_INSTRUCTION: &str =
    " At the end, add a section \"ICD-10 Codes (suggested):\" with relevant codes where applicable.";

const DISCHARGE_SUMMARY_SECTIONS: &[&str] = &[
    "Patient Demographics",
    "Chief Complaint",
    "History of Present Illness",
    "Past Medical History (if mentioned)",
    "Physical Examination",
    "Assessment/Diagnosis",
    "Treatment Provided",
    "Medications (if any)",
    "Discharge Instructions",
    "Follow-up Plan",
];

const CASE_SHEET_SECTIONS: &[&str] = &[
    "Patient Demographics",
    "Chief Complaint",
    "History of Present Illness",
    "Past Medical History",
    "Family/Social History (if mentioned)",
    "Review of Systems",
    "Physical Examination (detailed)",
    "Vital Signs",
    "Lab/Diagnostic findings (if mentioned)",
    "Assessment/Diagnosis",
    "Plan/Treatment",
    "Medications",
    "Follow-up",
];

/// 單輪 prompt 結尾的提示文字，引導模型直接輸出文件本文
pub fn answer_cue(kind: DocumentKind, mode: GenerationMode) -> &'static str {
    match (kind, mode) {
        (DocumentKind::DischargeSummary, GenerationMode::Generate) => "Discharge Summary:",
        (DocumentKind::CaseSheet, GenerationMode::Generate) => "Case Sheet:",
        (DocumentKind::DischargeSummary, GenerationMode::Regenerate) => "Revised Summary:",
        (DocumentKind::CaseSheet, GenerationMode::Regenerate) => "Revised Case Sheet:",
    }
}

pub fn required_sections(kind: DocumentKind) -> &'static [&'static str] {
    match kind {
        DocumentKind::DischargeSummary => DISCHARGE_SUMMARY_SECTIONS,
        DocumentKind::CaseSheet => CASE_SHEET_SECTIONS,
    }
}

pub fn patient_info_block(patient: &PatientInfo) -> String {
    let age = patient
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let gender = patient.gender.as_deref().unwrap_or("N/A");

    let mut block = format!("Patient: {}, Age: {}, Gender: {}", patient.name, age, gender);
    if let Some(mrn) = patient
        .medical_record_number
        .as_deref()
        .filter(|m| !m.is_empty())
    {
        block.push_str(&format!(", MRN: {}", mrn));
    }
    block
}

/// 組出 system / user prompt；`specialty_instruction` 須已解析完成
pub fn build_prompt(request: &GenerationRequest, specialty_instruction: &str) -> PromptPair {
    let kind = request.document_kind;
    let title = kind.title();
    let sections = required_sections(kind).join(", ");
    let patient = patient_info_block(&request.patient_info);
    let codes = if request.include_code_suggestions {
        CODE_SUGGESTIONS_INSTRUCTION
    } else {
        ""
    };

    let pair = match request.mode {
        GenerationMode::Generate => PromptPair::new(
            format!(
                "You are a medical documentation specialist. Output only the {} text, \
                 well-structured and ready for medical records.",
                title
            ),
            format!(
                "Generate a professional {title}.\n\n\
                 {patient}\n\n\
                 {specialty_instruction}\n\n\
                 Consultation transcript:\n{transcript}\n\n\
                 Include: {sections}. {NO_PLACEHOLDERS_INSTRUCTION}{codes}",
                transcript = request.transcript_or_content,
            ),
        ),
        GenerationMode::Regenerate => PromptPair::new(
            format!(
                "You are a medical documentation specialist. Output only the revised {} text.",
                title
            ),
            format!(
                "Revise and improve this {title}. Keep it professional and complete. \
                 Do not add placeholders.\n\n\
                 {patient}\n\n\
                 {specialty_instruction}\n\n\
                 Current {title}:\n{content}\n\n\
                 Output the revised {title} only, with the same structure ({sections}). \
                 Fix any errors, improve clarity, and ensure medical accuracy. \
                 {NO_PLACEHOLDERS_INSTRUCTION}{codes}",
                content = request.transcript_or_content,
            ),
        ),
    };
    pair.with_answer_cue(answer_cue(kind, request.mode))
}
