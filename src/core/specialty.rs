use crate::core::template;
use crate::domain::model::{GenerationRequest, TemplateContext};

pub const DEFAULT_GUIDANCE: &str = "Use standard medical documentation format.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specialty {
    Cardiology,
    Surgery,
    Pediatrics,
    Orthopedics,
    Neurology,
    General,
}

impl Specialty {
    pub const ALL: [Specialty; 6] = [
        Specialty::Cardiology,
        Specialty::Surgery,
        Specialty::Pediatrics,
        Specialty::Orthopedics,
        Specialty::Neurology,
        Specialty::General,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Cardiology => "cardiology",
            Self::Surgery => "surgery",
            Self::Pediatrics => "pediatrics",
            Self::Orthopedics => "orthopedics",
            Self::Neurology => "neurology",
            Self::General => "general",
        }
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Cardiology => "This is a cardiology case. Focus on cardiovascular examination, cardiac history, and cardiac-specific findings.",
            Self::Surgery => "This is a surgical case. Focus on surgical history, pre-operative assessment, and surgical findings.",
            Self::Pediatrics => "This is a pediatric case. Use age-appropriate terminology and focus on pediatric-specific considerations.",
            Self::Orthopedics => "This is an orthopedic case. Focus on musculoskeletal examination, range of motion, and orthopedic findings.",
            Self::Neurology => "This is a neurology case. Focus on neurological examination, mental status, and neurological findings.",
            Self::General => "This is a general medicine case. Use standard medical documentation format.",
        }
    }
}

/// 內建專科指引，未知或未指定的 key 使用通用說明
pub fn builtin_instruction(key: Option<&str>) -> String {
    match key.and_then(Specialty::from_key) {
        Some(specialty) => format!("Specialty Template: {}", specialty.guidance()),
        None => DEFAULT_GUIDANCE.to_string(),
    }
}

/// 有自訂範本就先做變數替換後原文使用，否則查內建專科表
pub fn resolve_instruction(request: &GenerationRequest) -> String {
    match &request.custom_template {
        Some(custom) if !custom.body.trim().is_empty() => {
            let context = TemplateContext::for_patient(&request.patient_info, custom);
            template::substitute(&custom.body, &context)
        }
        _ => builtin_instruction(request.specialty_key.as_deref()),
    }
}
