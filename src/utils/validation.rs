use crate::utils::error::{Result, ScribeError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl Into<String>, reason: impl Into<String>) -> ScribeError {
    ScribeError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.into(),
        reason: reason.into(),
    }
}

/// provider base URL 必須是完整的 http(s) URL
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.trim().is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", url.scheme()),
        ));
    }
    Ok(())
}

/// 請求欄位用：空白字串視為缺漏
pub fn validate_non_empty_input(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ScribeError::validation(format!("{} is required", field_name)));
    }
    Ok(())
}

pub fn validate_non_empty_list(field_name: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(invalid(field_name, "[]", "List cannot be empty"));
    }

    if let Some(blank) = values.iter().find(|v| v.trim().is_empty()) {
        return Err(invalid(
            field_name,
            blank.as_str(),
            "Entries cannot be empty or whitespace-only",
        ));
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value.to_string(),
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}
