use crate::core::prompt::{self, PROMPT_VERSION};
use crate::core::specialty;
use crate::domain::model::{
    CustomTemplate, DocumentKind, GenerationMode, GenerationRequest, PatientInfo,
};
use crate::domain::ports::TextCompletionProvider;
use crate::utils::error::{Result, ScribeError};
use crate::utils::validation::{validate_non_empty_input, Validate};
use std::sync::Arc;
use std::time::Duration;

/// 依 (文件種類, 模式) 決定輸出 token 上限，呼叫端不可調整
pub fn max_output_tokens(kind: DocumentKind, mode: GenerationMode) -> u32 {
    match (kind, mode) {
        (DocumentKind::DischargeSummary, GenerationMode::Generate) => 2000,
        (DocumentKind::CaseSheet, GenerationMode::Generate) => 2500,
        (DocumentKind::DischargeSummary, GenerationMode::Regenerate) => 2500,
        (DocumentKind::CaseSheet, GenerationMode::Regenerate) => 3000,
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub include_code_suggestions: bool,
    pub custom_template: Option<CustomTemplate>,
}

impl Validate for GenerationRequest {
    fn validate(&self) -> Result<()> {
        validate_non_empty_input("patient name", &self.patient_info.name)?;
        match self.mode {
            GenerationMode::Generate => {
                validate_non_empty_input("consultation transcript", &self.transcript_or_content)
            }
            GenerationMode::Regenerate => {
                validate_non_empty_input("existing document content", &self.transcript_or_content)
            }
        }
    }
}

/// 透過唯一啟用的 provider 把請求轉成文件內容，這裡不另外重試
pub struct DocumentGenerator {
    provider: Arc<dyn TextCompletionProvider>,
    timeout: Option<Duration>,
}

impl DocumentGenerator {
    pub fn new(provider: Arc<dyn TextCompletionProvider>) -> Self {
        Self {
            provider,
            timeout: None,
        }
    }

    /// 限制整條模型鏈的總時間，逾時視為致命錯誤
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<String> {
        request.validate()?;

        let instruction = specialty::resolve_instruction(request);
        let prompts = prompt::build_prompt(request, &instruction);
        let max_tokens = max_output_tokens(request.document_kind, request.mode);

        tracing::debug!(
            kind = %request.document_kind,
            mode = ?request.mode,
            input_chars = request.transcript_or_content.len(),
            max_tokens,
            "Built generation prompt"
        );

        let call = self.provider.complete(&prompts, max_tokens);

        let text = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                ScribeError::ProviderFatal {
                    provider: self.provider.provider_name().to_string(),
                    model: None,
                    reason: format!("timed out after {}s", limit.as_secs()),
                }
            })??,
            None => call.await?,
        };

        tracing::info!(
            provider = self.provider.provider_name(),
            kind = %request.document_kind,
            mode = ?request.mode,
            prompt_version = PROMPT_VERSION,
            "Document text generated"
        );
        Ok(text)
    }

    pub async fn generate(
        &self,
        kind: DocumentKind,
        transcript: &str,
        patient_info: &PatientInfo,
        specialty_key: Option<&str>,
        options: GenerateOptions,
    ) -> Result<String> {
        let mut request = GenerationRequest::generate(kind, transcript, patient_info.clone())
            .with_code_suggestions(options.include_code_suggestions);
        request.specialty_key = specialty_key.map(str::to_string);
        request.custom_template = options.custom_template;
        self.run(&request).await
    }

    pub async fn regenerate(
        &self,
        kind: DocumentKind,
        patient_info: &PatientInfo,
        existing_content: &str,
        specialty_key: Option<&str>,
    ) -> Result<String> {
        let mut request =
            GenerationRequest::regenerate(kind, existing_content, patient_info.clone());
        request.specialty_key = specialty_key.map(str::to_string);
        self.run(&request).await
    }

    pub async fn generate_discharge_summary(
        &self,
        transcript: &str,
        patient_info: &PatientInfo,
        specialty_key: Option<&str>,
        options: GenerateOptions,
    ) -> Result<String> {
        self.generate(DocumentKind::DischargeSummary, transcript, patient_info, specialty_key, options)
            .await
    }

    pub async fn generate_case_sheet(
        &self,
        transcript: &str,
        patient_info: &PatientInfo,
        specialty_key: Option<&str>,
        options: GenerateOptions,
    ) -> Result<String> {
        self.generate(DocumentKind::CaseSheet, transcript, patient_info, specialty_key, options)
            .await
    }

    pub async fn regenerate_discharge_summary(
        &self,
        patient_info: &PatientInfo,
        existing_content: &str,
        specialty_key: Option<&str>,
    ) -> Result<String> {
        self.regenerate(DocumentKind::DischargeSummary, patient_info, existing_content, specialty_key)
            .await
    }

    pub async fn regenerate_case_sheet(
        &self,
        patient_info: &PatientInfo,
        existing_content: &str,
        specialty_key: Option<&str>,
    ) -> Result<String> {
        self.regenerate(DocumentKind::CaseSheet, patient_info, existing_content, specialty_key)
            .await
    }
}
