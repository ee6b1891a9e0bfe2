//! 837 healthcare claim semantic layer.
//!
//! Builds on the generic [`document`] tokenizer: reconstructs the HL
//! hierarchical loop tree from the flat segment sequence, decodes the
//! multi-qualifier composite business codes carried by `HI` segments, and
//! maps the result into a typed claim tree ([`Claim837`]) covering the
//! Professional, Institutional, and Dental implementation guides.
//!
//! The claim tree borrows every field from the document's underlying
//! buffer; it is handed to external serializers read-only (the whole tree
//! implements `serde::Serialize` with snake_case keys).
//!
//! # Usage
//! ```ignore
//! let doc = document::parse_document(&bytes)?;
//! let claim = claim::parse_837(&doc)?;
//! for sub in &claim.subscriber_loops {
//!     for c in &sub.claims {
//!         println!("{} {}", c.claim_id, c.total_charges);
//!     }
//! }
//! ```

pub mod codes;
mod hierarchy;
mod mapper;
mod types;

pub use hierarchy::{LoopNode, LoopRole, LoopTree};
pub use mapper::parse_837;
pub use types::{
    Address, Claim, Claim837, Contact, Demographics, Entity, MapWarning, Patient, ServiceLine,
    SubscriberLoop, TransactionType,
};

use document::Segment;

/// Errors raised while reconstructing loops or mapping an 837.
///
/// All variants are structural: a broken loop tree or an unclassifiable
/// transaction makes every downstream interpretation unreliable, so these
/// abort the mapping. Recoverable per-loop problems surface as
/// [`MapWarning`]s on the result instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Two hierarchical markers share the same id.
    #[error("duplicate hierarchical loop id {0}")]
    DuplicateLoopId(String),

    /// A marker references a parent id that has not appeared earlier in
    /// file order.
    #[error("loop {id} references unseen parent {parent}")]
    UnknownParent { id: String, parent: String },

    /// The document contains no transaction set header.
    #[error("no ST transaction set header in document")]
    MissingTransaction,

    /// The transaction's implementation convention reference does not
    /// name a known 837 variant.
    #[error("unsupported implementation reference {0:?}")]
    UnsupportedImplementation(String),
}

/// Element text by business number, with empty string standing in for a
/// missing or non-UTF-8 element. Positional semantics make a missing
/// optional field indistinguishable from an empty one, which is exactly
/// what the claim tree wants.
pub(crate) fn text<'buf>(segment: &Segment<'buf>, element_number: usize) -> &'buf str {
    segment
        .element(element_number)
        .and_then(|e| e.as_str())
        .unwrap_or("")
}
