//! Gemini wire protocol
//!
//! Request/response payloads for `generateContent`, `streamGenerateContent`
//! and the Imagen `predict` endpoint, plus the conversion of streamed chunks
//! into [`Fragment`](crate::transport::Fragment)s.

pub mod streaming;
pub mod types;

pub use streaming::{chunk_to_fragment, parse_chunk};
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    PredictInstance, PredictParameters, PredictRequest, PredictResponse, Prediction,
    PromptFeedback, SafetyRating,
};
