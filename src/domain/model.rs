use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub medical_record_number: Option<String>,
}

impl PatientInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            gender: None,
            medical_record_number: None,
        }
    }

    /// 以出生日期計算足歲，生日未到則減一
    pub fn age_from_birth_date(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
        let mut age = today.year() - date_of_birth.year();
        if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Doctor,
    Nurse,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Nurse => "nurse",
        }
    }

    /// 產生、重新產生與定稿文件
    pub fn can_access_sensitive_action(&self) -> bool {
        matches!(self, Self::Doctor | Self::Admin)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "doctor" => Ok(Self::Doctor),
            "nurse" => Ok(Self::Nurse),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    DischargeSummary,
    CaseSheet,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DischargeSummary => "discharge_summary",
            Self::CaseSheet => "case_sheet",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::DischargeSummary => "discharge summary",
            Self::CaseSheet => "case sheet",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Generate,
    Regenerate,
}

/// 使用者自訂範本，以及病患資料以外佔位符需要的值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTemplate {
    pub body: String,
    pub consultation_date: NaiveDate,
    pub doctor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub transcript_or_content: String,
    pub patient_info: PatientInfo,
    pub specialty_key: Option<String>,
    pub custom_template: Option<CustomTemplate>,
    pub include_code_suggestions: bool,
    pub document_kind: DocumentKind,
    pub mode: GenerationMode,
}

impl GenerationRequest {
    pub fn generate(kind: DocumentKind, transcript: impl Into<String>, patient_info: PatientInfo) -> Self {
        Self {
            transcript_or_content: transcript.into(),
            patient_info,
            specialty_key: None,
            custom_template: None,
            include_code_suggestions: false,
            document_kind: kind,
            mode: GenerationMode::Generate,
        }
    }

    pub fn regenerate(
        kind: DocumentKind,
        existing_content: impl Into<String>,
        patient_info: PatientInfo,
    ) -> Self {
        Self {
            mode: GenerationMode::Regenerate,
            ..Self::generate(kind, existing_content, patient_info)
        }
    }

    pub fn with_specialty(mut self, key: impl Into<String>) -> Self {
        self.specialty_key = Some(key.into());
        self
    }

    pub fn with_custom_template(mut self, template: CustomTemplate) -> Self {
        self.custom_template = Some(template);
        self
    }

    pub fn with_code_suggestions(mut self, include: bool) -> Self {
        self.include_code_suggestions = include;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    pub patient_name: String,
    pub patient_age: Option<u32>,
    pub patient_gender: Option<String>,
    pub medical_record_number: Option<String>,
    pub consultation_date: NaiveDate,
    pub doctor_name: Option<String>,
}

impl TemplateContext {
    pub fn for_patient(patient: &PatientInfo, template: &CustomTemplate) -> Self {
        Self {
            patient_name: patient.name.clone(),
            patient_age: patient.age,
            patient_gender: patient.gender.clone(),
            medical_record_number: patient.medical_record_number.clone(),
            consultation_date: template.consultation_date,
            doctor_name: template.doctor_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system_prompt: String,
    pub user_prompt: String,
    /// 單輪 prompt 的結尾提示 (例如 `Case Sheet:`)，僅供沒有 system 角色的 provider 使用
    pub answer_cue: &'static str,
}

impl PromptPair {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            answer_cue: "",
        }
    }

    pub fn with_answer_cue(mut self, cue: &'static str) -> Self {
        self.answer_cue = cue;
        self
    }
}

/// 對單一模型的一次呼叫
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub answer_cue: &'a str,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// 單一模型嘗試的結果，已由 backend 分類
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(String),
    /// 模型不存在或超過額度：換下一個模型
    Retryable { reason: String, quota_exceeded: bool },
    Fatal { reason: String },
}

/// 失敗的模型紀錄，全部失敗時寫進日誌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub model: String,
    pub reason: String,
    pub quota_exceeded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_from_birth_date_before_and_after_birthday() {
        let dob = NaiveDate::from_ymd_opt(1980, 6, 15).unwrap();

        let before = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        assert_eq!(PatientInfo::age_from_birth_date(dob, before), Some(43));
        assert_eq!(PatientInfo::age_from_birth_date(dob, on), Some(44));
    }

    #[test]
    fn test_age_from_future_birth_date_is_none() {
        let dob = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(PatientInfo::age_from_birth_date(dob, today), None);
    }

    #[test]
    fn test_regenerate_request_keeps_content_verbatim() {
        let request = GenerationRequest::regenerate(
            DocumentKind::CaseSheet,
            "  existing text\n",
            PatientInfo::new("Jane Doe"),
        );
        assert_eq!(request.mode, GenerationMode::Regenerate);
        assert_eq!(request.transcript_or_content, "  existing text\n");
        assert!(!request.include_code_suggestions);
    }

    #[test]
    fn test_only_doctors_and_admins_reach_sensitive_actions() {
        assert!(UserRole::Doctor.can_access_sensitive_action());
        assert!(UserRole::Admin.can_access_sensitive_action());
        assert!(!UserRole::Nurse.can_access_sensitive_action());
        assert_eq!(" Doctor ".parse::<UserRole>(), Ok(UserRole::Doctor));
        assert!("surgeon".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_document_kind_serializes_snake_case() {
        let json = serde_json::to_string(&DocumentKind::DischargeSummary).unwrap();
        assert_eq!(json, "\"discharge_summary\"");
    }
}
