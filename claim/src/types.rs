//! The typed claim tree.
//!
//! Every field is a borrowed view into the document's byte buffer; the
//! tree never duplicates source bytes. Serialization derives keep the
//! external JSON form aligned with the struct layout: snake_case keys,
//! empty lists (not absent keys) for claims with no decoded codes, and
//! `null` for absent dates.

use serde::Serialize;

use crate::codes::{
    ConditionCode, DiagnosisCode, OccurrenceCode, OccurrenceSpanCode, OtherCode, ProcedureCode,
    ValueCode,
};

/// 837 claim sub-type, determined by the transaction's implementation
/// convention reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Professional,
    Institutional,
    Dental,
}

impl TransactionType {
    /// Classify an implementation convention reference (ST03, falling
    /// back to GS08). Pure: the same reference always yields the same
    /// answer, and unknown references yield `None`, never a guess.
    pub fn from_implementation(reference: &str) -> Option<Self> {
        match reference {
            "005010X222A1" | "005010X222A2" => Some(Self::Professional),
            "005010X223A2" | "005010X223A3" => Some(Self::Institutional),
            "005010X224A2" | "005010X224A3" => Some(Self::Dental),
            _ => None,
        }
    }

    /// The serialized (lowercase) name of the sub-type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Institutional => "institutional",
            Self::Dental => "dental",
        }
    }
}

/// Street address assembled from N3/N4 segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Address<'buf> {
    pub line1: &'buf str,
    pub line2: &'buf str,
    pub city: &'buf str,
    pub state: &'buf str,
    pub zip: &'buf str,
}

/// Administrative contact from a PER segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Contact<'buf> {
    pub name: &'buf str,
    pub phone: &'buf str,
    pub email: &'buf str,
    pub fax: &'buf str,
}

/// A named party: an NM1 segment plus its trailing address, contact, and
/// reference segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entity<'buf> {
    /// NM101 entity identifier qualifier ("41" submitter, "40" receiver,
    /// "85" billing provider, "IL" subscriber, "PR" payer, "QC" patient)
    pub qualifier: &'buf str,
    /// NM102 == "1": person; otherwise organization
    pub is_person: bool,
    /// NM103: last name or organization name
    pub last_or_org_name: &'buf str,
    /// NM104
    pub first_name: &'buf str,
    /// NM105
    pub middle_name: &'buf str,
    /// NM108 identification code qualifier (XX = NPI, MI = member id, ...)
    pub id_qualifier: &'buf str,
    /// NM109 identification code
    pub id_code: &'buf str,
    pub address: Option<Address<'buf>>,
    pub contact: Option<Contact<'buf>>,
    /// REF*EI employer identification number
    pub tax_id: &'buf str,
}

/// DMG demographic fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Demographics<'buf> {
    pub birth_date: &'buf str,
    pub gender: &'buf str,
}

/// A dependent patient loop (HL level 23).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Patient<'buf> {
    /// PAT01 relationship to subscriber
    pub relationship: &'buf str,
    pub entity: Entity<'buf>,
    pub demographics: Demographics<'buf>,
}

/// One service line (LX loop).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceLine<'buf> {
    /// LX01 assigned line number
    pub line_number: &'buf str,
    /// SV201 revenue code; empty for professional and dental lines
    pub revenue_code: &'buf str,
    /// Leading component of the procedure composite (HC, AD, ...)
    pub procedure_type: &'buf str,
    pub procedure_code: &'buf str,
    pub modifiers: Vec<&'buf str>,
    pub charge_amount: &'buf str,
    pub units: &'buf str,
    /// DTP*472 with a D8 single-date qualifier
    pub service_date: Option<&'buf str>,
    /// DTP*472 with an RD8 range qualifier; holds the raw from-to value.
    /// At most one of the two date fields is populated.
    pub service_date_end: Option<&'buf str>,
}

/// One claim (CLM loop), with its decoded code buckets in encounter
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Claim<'buf> {
    /// CLM01 patient control number
    pub claim_id: &'buf str,
    /// CLM02 total claim charge amount
    pub total_charges: &'buf str,
    /// First component of the CLM05 facility composite
    pub place_of_service: &'buf str,
    pub diagnosis_codes: Vec<DiagnosisCode<'buf>>,
    pub value_codes: Vec<ValueCode<'buf>>,
    pub occurrence_codes: Vec<OccurrenceCode<'buf>>,
    pub occurrence_span_codes: Vec<OccurrenceSpanCode<'buf>>,
    pub condition_codes: Vec<ConditionCode<'buf>>,
    pub procedure_codes: Vec<ProcedureCode<'buf>>,
    pub other_codes: Vec<OtherCode<'buf>>,
    pub service_lines: Vec<ServiceLine<'buf>>,
}

/// One subscriber loop (HL level 22) with its patients and claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriberLoop<'buf> {
    /// SBR01 payer responsibility sequence (P/S/T)
    pub payer_responsibility: &'buf str,
    /// SBR02 individual relationship code
    pub relationship: &'buf str,
    /// SBR09 claim filing indicator
    pub filing_code: &'buf str,
    pub subscriber: Entity<'buf>,
    pub payer: Option<Entity<'buf>>,
    pub demographics: Demographics<'buf>,
    /// Zero or one dependent patient; when empty the subscriber is the
    /// patient and claims hang directly off this loop.
    pub patients: Vec<Patient<'buf>>,
    pub claims: Vec<Claim<'buf>>,
}

/// The semantic root of a mapped 837 transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim837<'buf> {
    pub transaction_type: TransactionType,
    /// ISA06, trimmed of pad spaces
    pub sender_id: &'buf str,
    /// ISA08, trimmed of pad spaces
    pub receiver_id: &'buf str,
    /// ST02 transaction set control number
    pub control_number: &'buf str,
    pub submitter: Option<Entity<'buf>>,
    pub receiver: Option<Entity<'buf>>,
    pub billing_provider: Option<Entity<'buf>>,
    pub subscriber_loops: Vec<SubscriberLoop<'buf>>,
    /// Recoverable per-loop diagnostics accumulated during mapping.
    pub warnings: Vec<MapWarning>,
}

/// A recoverable diagnostic attached to the mapped result.
///
/// Unlike [`crate::MapError`], warnings never abort the mapping: the
/// affected loop yields partial (or no) output and mapping continues
/// with its siblings.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapWarning {
    /// A loop carried claim-level segments but no CLM.
    #[error("claim loop {hl_id} has service data but no CLM segment")]
    IncompleteClaim { hl_id: String },
}
