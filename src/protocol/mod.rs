//! Invocation Wire Format
//!
//! CSV in, JSON out.

mod request;
mod response;

pub use request::{
    is_csv, parse_queries, parse_topn, resolve_topn, CSV_CONTENT_TYPE, CUSTOM_ATTRIBUTES_HEADER,
};
pub use response::{format_similarity, PredictionResponse, RankedWord};
