//! Textract-backed `DocumentAnalyzer` using `AnalyzeExpense`.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_textract::Client;
use aws_sdk_textract::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_textract::operation::analyze_expense::AnalyzeExpenseError;
use aws_sdk_textract::types::{Document, ExpenseDocument, ExpenseField, S3Object};
use tracing::debug;

use crate::domain::BlobLocator;
use crate::domain::ports::{
    AnalyzedDocument, DocumentAnalyzer, DocumentAnalyzerError, ExpenseAnalysis, ExtractedField,
    ExtractedLineItem,
};

/// Runs expense analysis directly against the stored object.
#[derive(Clone)]
pub struct TextractDocumentAnalyzer {
    client: Client,
}

impl fmt::Debug for TextractDocumentAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextractDocumentAnalyzer")
            .finish_non_exhaustive()
    }
}

impl TextractDocumentAnalyzer {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(Client::new(sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn field(source: &ExpenseField) -> ExtractedField {
    let kind = source
        .r#type()
        .and_then(|kind| kind.text())
        .unwrap_or_default();
    let text = source
        .value_detection()
        .and_then(|detection| detection.text())
        .unwrap_or_default();
    ExtractedField::new(kind, text)
}

fn document(source: &ExpenseDocument) -> AnalyzedDocument {
    AnalyzedDocument {
        summary_fields: source.summary_fields().iter().map(field).collect(),
        line_item_groups: source
            .line_item_groups()
            .iter()
            .map(|group| {
                group
                    .line_items()
                    .iter()
                    .map(|item| ExtractedLineItem {
                        fields: item.line_item_expense_fields().iter().map(field).collect(),
                    })
                    .collect()
            })
            .collect(),
    }
}

fn map_analyze_error<R: fmt::Debug>(
    err: &SdkError<AnalyzeExpenseError, R>,
) -> DocumentAnalyzerError {
    debug!(error = %DisplayErrorContext(err), "AnalyzeExpense failed");
    match err.as_service_error() {
        Some(inner)
            if inner.is_unsupported_document_exception()
                || inner.is_bad_document_exception()
                || inner.is_document_too_large_exception()
                || inner.is_invalid_s3_object_exception() =>
        {
            DocumentAnalyzerError::rejected(
                inner
                    .message()
                    .or_else(|| inner.code())
                    .unwrap_or("document rejected"),
            )
        }
        Some(inner) => DocumentAnalyzerError::service(
            inner
                .message()
                .or_else(|| inner.code())
                .unwrap_or("service error"),
        ),
        None => DocumentAnalyzerError::service(DisplayErrorContext(err).to_string()),
    }
}

#[async_trait]
impl DocumentAnalyzer for TextractDocumentAnalyzer {
    async fn analyze_expense(
        &self,
        locator: &BlobLocator,
    ) -> Result<ExpenseAnalysis, DocumentAnalyzerError> {
        let object = S3Object::builder()
            .bucket(locator.bucket())
            .name(locator.key())
            .build();
        let output = self
            .client
            .analyze_expense()
            .document(Document::builder().s3_object(object).build())
            .send()
            .await
            .map_err(|err| map_analyze_error(&err))?;
        Ok(ExpenseAnalysis {
            documents: output.expense_documents().iter().map(document).collect(),
        })
    }
}
