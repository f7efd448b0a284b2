//! Transaction extraction from recognized text.

pub mod categorize;
pub mod keywords;
pub mod pipeline;
pub mod rules;

pub use categorize::{Categorizer, CategoryRule, KeywordCategorizer, UNCATEGORIZED};
pub use keywords::{KeywordTables, TypeLabel};
pub use pipeline::{
    ExtractionReport, PlanOutcome, ReceiptPipeline, RecognitionPass, RecognitionPlan,
    TransactionAssembler,
};
