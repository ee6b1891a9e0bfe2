//! Composite business code decoding.
//!
//! `HI` segments carry repeated composite elements of the form
//! `qualifier:value:...` (e.g. `BH:A2:D8:20221130`). The leading
//! component is a qualifier tag; the remaining components are positional
//! according to the qualifier's category, resolved through a fixed lookup
//! table. Unknown qualifiers are surfaced as a generic pair rather than
//! dropped, so no information is silently lost.
//!
//! The decoder is pure and allocation-free: every decoded field is a view
//! into the original element bytes.

use document::Element;
use serde::Serialize;

/// Diagnosis code (qualifiers ABK/BK principal, ABF/BF other, ABJ/BJ
/// admitting, APR/PR patient reason, ABN/BN external cause).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosisCode<'buf> {
    pub qualifier: &'buf str,
    pub code: &'buf str,
    /// Present-on-admission indicator; empty when the composite does not
    /// carry one.
    pub poa: &'buf str,
}

/// Value code (qualifier BE): code plus monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueCode<'buf> {
    pub qualifier: &'buf str,
    pub code: &'buf str,
    pub amount: &'buf str,
}

/// Occurrence code (qualifier BH): code, date qualifier, date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccurrenceCode<'buf> {
    pub qualifier: &'buf str,
    pub code: &'buf str,
    pub date_qualifier: &'buf str,
    pub date: &'buf str,
}

/// Occurrence span code (qualifier BI): code, date qualifier, and a date
/// range split on its embedded dash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccurrenceSpanCode<'buf> {
    pub qualifier: &'buf str,
    pub code: &'buf str,
    pub date_qualifier: &'buf str,
    pub date_from: &'buf str,
    pub date_to: &'buf str,
}

/// Condition code (qualifier BG): code only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionCode<'buf> {
    pub qualifier: &'buf str,
    pub code: &'buf str,
}

/// Procedure code (qualifiers BBR/BR principal, BBQ/BQ other): code,
/// date qualifier, date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcedureCode<'buf> {
    pub qualifier: &'buf str,
    pub code: &'buf str,
    pub date_qualifier: &'buf str,
    pub date: &'buf str,
}

/// Fallback for qualifiers outside the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OtherCode<'buf> {
    pub qualifier: &'buf str,
    pub code: &'buf str,
}

/// One decoded composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiCode<'buf> {
    Diagnosis(DiagnosisCode<'buf>),
    Value(ValueCode<'buf>),
    Occurrence(OccurrenceCode<'buf>),
    OccurrenceSpan(OccurrenceSpanCode<'buf>),
    Condition(ConditionCode<'buf>),
    Procedure(ProcedureCode<'buf>),
    Other(OtherCode<'buf>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Diagnosis,
    Value,
    Occurrence,
    OccurrenceSpan,
    Condition,
    Procedure,
}

/// Qualifier tag to composite shape. Fixed by the implementation guides.
const QUALIFIER_SHAPES: &[(&str, Shape)] = &[
    ("ABK", Shape::Diagnosis),
    ("ABF", Shape::Diagnosis),
    ("ABJ", Shape::Diagnosis),
    ("ABN", Shape::Diagnosis),
    ("APR", Shape::Diagnosis),
    ("BK", Shape::Diagnosis),
    ("BF", Shape::Diagnosis),
    ("BJ", Shape::Diagnosis),
    ("BN", Shape::Diagnosis),
    ("PR", Shape::Diagnosis),
    ("BE", Shape::Value),
    ("BH", Shape::Occurrence),
    ("BI", Shape::OccurrenceSpan),
    ("BG", Shape::Condition),
    ("BBR", Shape::Procedure),
    ("BBQ", Shape::Procedure),
    ("BR", Shape::Procedure),
    ("BQ", Shape::Procedure),
];

/// Highest composite position the decoder reads: the present-on-admission
/// indicator sits at C022 position 9.
const MAX_COMPONENTS: usize = 9;

/// Decode one composite element of an `HI` segment.
///
/// Decoding the same element twice yields identical output.
pub fn decode<'buf>(element: Element<'buf>, component_separator: u8) -> HiCode<'buf> {
    let mut parts: [&'buf str; MAX_COMPONENTS] = [""; MAX_COMPONENTS];
    for (slot, component) in parts
        .iter_mut()
        .zip(element.components(component_separator))
    {
        *slot = core::str::from_utf8(component).unwrap_or("");
    }

    let qualifier = parts[0];
    let shape = QUALIFIER_SHAPES
        .iter()
        .find(|(tag, _)| *tag == qualifier)
        .map(|(_, shape)| *shape);

    match shape {
        Some(Shape::Diagnosis) => HiCode::Diagnosis(DiagnosisCode {
            qualifier,
            code: parts[1],
            poa: parts[8],
        }),
        Some(Shape::Value) => HiCode::Value(ValueCode {
            qualifier,
            code: parts[1],
            // C022 puts the monetary amount at position 5, after the
            // unused date qualifier/date slots.
            amount: parts[4],
        }),
        Some(Shape::Occurrence) => HiCode::Occurrence(OccurrenceCode {
            qualifier,
            code: parts[1],
            date_qualifier: parts[2],
            date: parts[3],
        }),
        Some(Shape::OccurrenceSpan) => {
            let (date_from, date_to) = parts[3].split_once('-').unwrap_or((parts[3], ""));
            HiCode::OccurrenceSpan(OccurrenceSpanCode {
                qualifier,
                code: parts[1],
                date_qualifier: parts[2],
                date_from,
                date_to,
            })
        }
        Some(Shape::Condition) => HiCode::Condition(ConditionCode {
            qualifier,
            code: parts[1],
        }),
        Some(Shape::Procedure) => HiCode::Procedure(ProcedureCode {
            qualifier,
            code: parts[1],
            date_qualifier: parts[2],
            date: parts[3],
        }),
        None => HiCode::Other(OtherCode {
            qualifier,
            code: parts[1],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(raw: &str) -> HiCode<'_> {
        decode(Element::new(raw.as_bytes()), b':')
    }

    #[test]
    fn diagnosis_without_poa() {
        assert_eq!(
            decoded("ABK:I269"),
            HiCode::Diagnosis(DiagnosisCode {
                qualifier: "ABK",
                code: "I269",
                poa: "",
            })
        );
    }

    #[test]
    fn diagnosis_with_poa_at_position_nine() {
        assert_eq!(
            decoded("ABF:E119:::::::Y"),
            HiCode::Diagnosis(DiagnosisCode {
                qualifier: "ABF",
                code: "E119",
                poa: "Y",
            })
        );
    }

    #[test]
    fn value_amount_is_position_five() {
        assert_eq!(
            decoded("BE:80:::12.04"),
            HiCode::Value(ValueCode {
                qualifier: "BE",
                code: "80",
                amount: "12.04",
            })
        );
    }

    #[test]
    fn occurrence_carries_date() {
        assert_eq!(
            decoded("BH:A2:D8:20221130"),
            HiCode::Occurrence(OccurrenceCode {
                qualifier: "BH",
                code: "A2",
                date_qualifier: "D8",
                date: "20221130",
            })
        );
    }

    #[test]
    fn occurrence_span_splits_range_on_dash() {
        assert_eq!(
            decoded("BI:70:RD8:20221101-20221110"),
            HiCode::OccurrenceSpan(OccurrenceSpanCode {
                qualifier: "BI",
                code: "70",
                date_qualifier: "RD8",
                date_from: "20221101",
                date_to: "20221110",
            })
        );
    }

    #[test]
    fn occurrence_span_without_dash_keeps_whole_date() {
        let HiCode::OccurrenceSpan(span) = decoded("BI:70:D8:20221101") else {
            panic!("expected span");
        };
        assert_eq!(span.date_from, "20221101");
        assert_eq!(span.date_to, "");
    }

    #[test]
    fn condition_is_code_only() {
        assert_eq!(
            decoded("BG:17"),
            HiCode::Condition(ConditionCode {
                qualifier: "BG",
                code: "17",
            })
        );
    }

    #[test]
    fn unknown_qualifier_is_surfaced_not_dropped() {
        assert_eq!(
            decoded("ZZ:SOMETHING"),
            HiCode::Other(OtherCode {
                qualifier: "ZZ",
                code: "SOMETHING",
            })
        );
    }

    #[test]
    fn decoding_is_idempotent() {
        let element = Element::new(b"BH:A2:D8:20221130");
        assert_eq!(decode(element, b':'), decode(element, b':'));
    }
}
