// Parsers for model output

pub mod json_extract;

pub use json_extract::{
    extract_json, is_parse_error, parse_error_sentinel, ExtractionError, ExtractionPolicy,
};
