//! Recognition collaborators: receipt images and dictated lists.
//!
//! The core only sees the two traits below. [`gemini::GeminiClient`] is the
//! production implementation; tests plug in fakes.

pub mod decode;
pub mod gemini;

use crate::{
    core::receipt::{DictatedItem, RecognizedReceipt},
    errors::{Error, Result},
};
use std::future::Future;

/// Turns a photographed receipt into candidate lines.
pub trait ReceiptRecognizer {
    /// Recognizes the receipt in `image` (raw bytes of type `mime_type`).
    fn recognize_receipt(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> impl Future<Output = Result<RecognizedReceipt>> + Send;
}

/// Turns free dictated text into shopping-list items.
pub trait ListTranscriber {
    /// Extracts `(name, quantity)` items from `text`.
    fn transcribe_list(&self, text: &str) -> impl Future<Output = Result<Vec<DictatedItem>>> + Send;
}

/// Runs a recognizer if one is configured.
///
/// # Errors
/// [`Error::NotConfigured`] when `recognizer` is `None`, otherwise whatever
/// the recognizer reports.
pub async fn scan_receipt<R>(
    recognizer: Option<&R>,
    image: &[u8],
    mime_type: &str,
) -> Result<RecognizedReceipt>
where
    R: ReceiptRecognizer + Sync,
{
    let recognizer = recognizer.ok_or_else(not_configured)?;
    recognizer.recognize_receipt(image, mime_type).await
}

/// Runs a transcriber if one is configured.
///
/// # Errors
/// [`Error::NotConfigured`] when `transcriber` is `None`, otherwise whatever
/// the transcriber reports.
pub async fn transcribe_list<T>(transcriber: Option<&T>, text: &str) -> Result<Vec<DictatedItem>>
where
    T: ListTranscriber + Sync,
{
    let transcriber = transcriber.ok_or_else(not_configured)?;
    transcriber.transcribe_list(text).await
}

fn not_configured() -> Error {
    Error::NotConfigured {
        service: "Recognition".to_string(),
    }
}
