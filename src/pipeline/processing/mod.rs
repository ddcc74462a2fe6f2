// Pipeline processing: text normalization, extraction and validation

pub mod event_type;
pub mod extraction;
pub mod lenient_json;
pub mod text_normalizer;
pub mod validator;

pub use extraction::ExtractionEngine;
pub use validator::Validator;
