use crate::domain::model::TemplateContext;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `{{consultationDate}}` 的日期格式，例如 `Mar 5, 2024`
pub const CONSULTATION_DATE_FORMAT: &str = "%b %-d, %Y";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"));

const NOT_AVAILABLE: &str = "N/A";

/// 解析已知的佔位符名稱，未知名稱回傳 `None`
fn resolve(name: &str, context: &TemplateContext) -> Option<String> {
    let value = match name {
        "patientName" => context.patient_name.clone(),
        "patientAge" => context
            .patient_age
            .map(|age| age.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        "patientGender" => context
            .patient_gender
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        "medicalRecordNumber" => context
            .medical_record_number
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        "consultationDate" => context
            .consultation_date
            .format(CONSULTATION_DATE_FORMAT)
            .to_string(),
        "doctorName" => context.doctor_name.clone().unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

/// 替換自訂範本中的 `{{name}}` 佔位符，未知名稱原樣保留
pub fn substitute(body: &str, context: &TemplateContext) -> String {
    PLACEHOLDER
        .replace_all(body, |caps: &Captures| {
            resolve(&caps[1], context).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn context() -> TemplateContext {
        TemplateContext {
            patient_name: "Jane Doe".to_string(),
            patient_age: Some(42),
            patient_gender: Some("female".to_string()),
            medical_record_number: Some("MRN-001".to_string()),
            consultation_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            doctor_name: Some("Dr. House".to_string()),
        }
    }

    #[test]
    fn test_all_recognized_placeholders_are_replaced() {
        let body = "{{patientName}} ({{patientAge}}, {{patientGender}}) MRN {{medicalRecordNumber}} \
                    seen on {{consultationDate}} by {{doctorName}}";

        let output = substitute(body, &context());

        assert_eq!(
            output,
            "Jane Doe (42, female) MRN MRN-001 seen on Mar 5, 2024 by Dr. House"
        );
        assert!(!output.contains("{{"));
    }

    #[test]
    fn test_missing_values_render_as_na_or_empty() {
        let ctx = TemplateContext {
            patient_age: None,
            patient_gender: None,
            medical_record_number: None,
            doctor_name: None,
            ..context()
        };

        assert_eq!(substitute("{{patientAge}}", &ctx), "N/A");
        assert_eq!(substitute("{{patientGender}}", &ctx), "N/A");
        assert_eq!(substitute("{{medicalRecordNumber}}", &ctx), "N/A");
        assert_eq!(substitute("[{{doctorName}}]", &ctx), "[]");
    }

    #[test]
    fn test_unknown_placeholders_pass_through() {
        let body = "Ward: {{wardNumber}} / Patient: {{patientName}} / {{ spaced }}";
        let output = substitute(body, &context());
        assert_eq!(output, "Ward: {{wardNumber}} / Patient: Jane Doe / {{ spaced }}");
    }

    #[test]
    fn test_repeated_application_is_stable() {
        let once = substitute("Dear {{patientName}}, {{unknown}}", &context());
        let twice = substitute(&once, &context());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_body_without_tokens_is_unchanged() {
        let body = "Focus on wound healing and drain output.";
        assert_eq!(substitute(body, &context()), body);
    }
}
