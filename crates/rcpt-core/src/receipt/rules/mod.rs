//! Rule-based field resolvers for receipts, bills and statements.
//!
//! Every resolver is a pure function of the recognized text and the
//! read-only [`KeywordTables`](super::KeywordTables).

pub mod amounts;
pub mod dates;
pub mod description;
pub mod kind;
pub mod patterns;

pub use amounts::{clean_amount, resolve_amount, AmountResolver, AmountStrategy, ResolvedAmount};
pub use dates::{find_date, resolve_date, DateResolver};
pub use description::{resolve_description, DescriptionResolver, DEFAULT_DESCRIPTION};
pub use kind::{classify, KindClassifier};

/// A single-field resolver over recognized text.
pub trait FieldResolver {
    /// The type of value this resolver produces.
    type Output;

    /// Resolve the field from text.
    fn resolve(&self, text: &str) -> Self::Output;
}
