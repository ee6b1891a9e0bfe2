//! The 837 semantic mapper.
//!
//! Walks the loop tree built from one ST..SE transaction scope and
//! populates the claim tree: billing/submitter/receiver entities from the
//! header material, one [`SubscriberLoop`] per level-22 node, claims
//! partitioned at `CLM` markers inside subscriber and patient content,
//! and service lines partitioned at `LX` markers inside each claim.
//!
//! Missing business segments never abort the mapping; the affected field
//! stays empty and, where a whole claim loop is unusable, an
//! [`MapWarning::IncompleteClaim`] diagnostic is accumulated instead.

use document::{Document, Segment};

use crate::codes::{self, HiCode};
use crate::hierarchy::{LoopRole, LoopTree};
use crate::types::{
    Address, Claim, Claim837, Contact, Demographics, Entity, MapWarning, Patient, ServiceLine,
    SubscriberLoop, TransactionType,
};
use crate::{text, MapError};

/// Map the first ST..SE transaction of a parsed document into a
/// [`Claim837`] tree.
///
/// Fails with [`MapError::MissingTransaction`] when the document has no
/// `ST` header, [`MapError::UnsupportedImplementation`] when the
/// implementation convention reference names no known 837 variant, and
/// propagates loop tree errors. Callers hitting the unsupported case can
/// still fall back to structural access through the [`Document`].
pub fn parse_837<'buf>(document: &Document<'buf>) -> Result<Claim837<'buf>, MapError> {
    let segments = document.segments();
    let st_index = segments
        .iter()
        .position(|s| s.id == b"ST")
        .ok_or(MapError::MissingTransaction)?;
    let st = &segments[st_index];

    let mut reference = text(st, 3);
    if reference.is_empty() {
        reference = document
            .first_segment("GS")
            .map(|gs| text(gs, 8))
            .unwrap_or("");
    }
    let transaction_type = TransactionType::from_implementation(reference)
        .ok_or_else(|| MapError::UnsupportedImplementation(reference.to_string()))?;

    let scope_end = segments[st_index..]
        .iter()
        .position(|s| s.id == b"SE")
        .map(|offset| st_index + offset)
        .unwrap_or(segments.len());
    let tree = LoopTree::build(&segments[st_index + 1..scope_end], "HL")?;

    // Header entities live in the preamble (1000A/1000B submitter and
    // receiver loops) and the billing-provider root loops; first match
    // per qualifier wins, per the single-occurrence expectation.
    let mut header = tree.preamble.clone();
    for &root in tree.roots() {
        let node = tree.node(root);
        if node.role() == LoopRole::BillingProvider {
            header.extend(node.segments.iter().copied());
        }
    }

    let mut warnings = Vec::new();
    let mut subscriber_loops = Vec::new();
    for (index, node) in tree.nodes().iter().enumerate() {
        if node.role() == LoopRole::Subscriber {
            subscriber_loops.push(map_subscriber(&tree, index, transaction_type, &mut warnings));
        }
    }

    // Document construction guarantees the ISA header is segment 0.
    let isa = &segments[0];

    Ok(Claim837 {
        transaction_type,
        sender_id: text(isa, 6).trim(),
        receiver_id: text(isa, 8).trim(),
        control_number: text(st, 2),
        submitter: find_entity(&header, "41"),
        receiver: find_entity(&header, "40"),
        billing_provider: find_entity(&header, "85"),
        subscriber_loops,
        warnings,
    })
}

fn map_subscriber<'buf>(
    tree: &LoopTree<'buf>,
    index: usize,
    transaction_type: TransactionType,
    warnings: &mut Vec<MapWarning>,
) -> SubscriberLoop<'buf> {
    let node = tree.node(index);
    let content = node.segments.as_slice();
    let demographic = pre_claim(content);

    let (payer_responsibility, relationship, filing_code) = demographic
        .iter()
        .find(|s| s.id == b"SBR")
        .map(|sbr| (text(sbr, 1), text(sbr, 2), text(sbr, 9)))
        .unwrap_or_default();

    let mut claims = map_claims(content, node.hl_id, transaction_type, warnings);

    let mut patients = Vec::new();
    for child in tree.children(index) {
        if child.role() != LoopRole::Patient {
            continue;
        }
        let child_content = child.segments.as_slice();
        let child_demographic = pre_claim(child_content);

        patients.push(Patient {
            relationship: child_demographic
                .iter()
                .find(|s| s.id == b"PAT")
                .map(|pat| text(pat, 1))
                .unwrap_or(""),
            entity: find_entity(child_demographic, "QC").unwrap_or_default(),
            demographics: read_demographics(child_demographic),
        });
        claims.extend(map_claims(
            child_content,
            child.hl_id,
            transaction_type,
            warnings,
        ));
    }

    SubscriberLoop {
        payer_responsibility,
        relationship,
        filing_code,
        subscriber: find_entity(demographic, "IL").unwrap_or_default(),
        payer: find_entity(demographic, "PR"),
        demographics: read_demographics(demographic),
        patients,
        claims,
    }
}

/// The demographic region of a loop: everything before its first claim.
fn pre_claim<'seg, 'buf>(segments: &'seg [Segment<'buf>]) -> &'seg [Segment<'buf>] {
    let end = segments
        .iter()
        .position(|s| s.id == b"CLM")
        .unwrap_or(segments.len());
    &segments[..end]
}

/// Partition loop content into claims at CLM markers.
///
/// Content that carries claim-level segments but no CLM at all yields no
/// claims and one IncompleteClaim diagnostic for the loop.
fn map_claims<'buf>(
    segments: &[Segment<'buf>],
    hl_id: &str,
    transaction_type: TransactionType,
    warnings: &mut Vec<MapWarning>,
) -> Vec<Claim<'buf>> {
    let Some(first) = segments.iter().position(|s| s.id == b"CLM") else {
        let claim_material = segments
            .iter()
            .any(|s| matches!(s.id, b"LX" | b"SV1" | b"SV2" | b"SV3" | b"HI"));
        if claim_material {
            warnings.push(MapWarning::IncompleteClaim {
                hl_id: hl_id.to_string(),
            });
        }
        return Vec::new();
    };

    let mut claims = Vec::new();
    let mut start = first;
    for end in first + 1..=segments.len() {
        if end == segments.len() || segments[end].id == b"CLM" {
            claims.push(map_claim(&segments[start..end], transaction_type));
            start = end;
        }
    }
    claims
}

fn map_claim<'buf>(region: &[Segment<'buf>], transaction_type: TransactionType) -> Claim<'buf> {
    let clm = &region[0];
    let mut claim = Claim {
        claim_id: text(clm, 1),
        total_charges: text(clm, 2),
        place_of_service: first_component(clm, 5),
        ..Default::default()
    };

    let line_start = region
        .iter()
        .position(|s| s.id == b"LX")
        .unwrap_or(region.len());

    for segment in &region[..line_start] {
        if segment.id == b"HI" {
            bucket_hi(segment, &mut claim);
        }
    }

    let lines = &region[line_start..];
    let mut start = 0;
    for end in 1..=lines.len() {
        if end == lines.len() || lines[end].id == b"LX" {
            claim
                .service_lines
                .push(map_service_line(&lines[start..end], transaction_type));
            start = end;
        }
    }

    claim
}

/// Decode an HI segment's composites into the claim's code buckets,
/// preserving encounter order within each bucket.
fn bucket_hi<'buf>(segment: &Segment<'buf>, claim: &mut Claim<'buf>) {
    let separator = segment.delimiters.component;
    // The segment's leading business group tag labels occurrence-span
    // entries; spans are a per-segment category, not a per-item echo.
    let group = first_component(segment, 1);

    for element in segment.elements() {
        if element.is_empty() {
            continue;
        }
        match codes::decode(element, separator) {
            HiCode::Diagnosis(code) => claim.diagnosis_codes.push(code),
            HiCode::Value(code) => claim.value_codes.push(code),
            HiCode::Occurrence(code) => claim.occurrence_codes.push(code),
            HiCode::OccurrenceSpan(mut code) => {
                code.qualifier = group;
                claim.occurrence_span_codes.push(code);
            }
            HiCode::Condition(code) => claim.condition_codes.push(code),
            HiCode::Procedure(code) => claim.procedure_codes.push(code),
            HiCode::Other(code) => claim.other_codes.push(code),
        }
    }
}

fn map_service_line<'buf>(
    region: &[Segment<'buf>],
    transaction_type: TransactionType,
) -> ServiceLine<'buf> {
    let mut line = ServiceLine {
        line_number: text(&region[0], 1),
        ..Default::default()
    };

    // Segment choice and element positions differ per sub-type.
    let (sv_id, composite_at, charge_at, units_at) = match transaction_type {
        TransactionType::Professional => (&b"SV1"[..], 1, 2, 4),
        TransactionType::Institutional => (&b"SV2"[..], 2, 3, 5),
        TransactionType::Dental => (&b"SV3"[..], 1, 2, 6),
    };

    if let Some(sv) = region.iter().find(|s| s.id == sv_id) {
        if transaction_type == TransactionType::Institutional {
            line.revenue_code = text(sv, 1);
        }
        line.charge_amount = text(sv, charge_at);
        line.units = text(sv, units_at);

        if let Some(components) = sv.components(composite_at) {
            for (position, component) in components.enumerate() {
                let value = core::str::from_utf8(component).unwrap_or("");
                match position {
                    0 => line.procedure_type = value,
                    1 => line.procedure_code = value,
                    // Up to four modifiers follow the code.
                    2..=5 if !value.is_empty() => line.modifiers.push(value),
                    _ => {}
                }
            }
        }
    }

    if let Some(dtp) = region
        .iter()
        .find(|s| s.id == b"DTP" && text(s, 1) == "472")
    {
        let date = text(dtp, 3);
        match text(dtp, 2) {
            // A range keeps its raw from-to value; a single date goes in
            // service_date. Exactly one of the two is ever populated.
            "RD8" => line.service_date_end = Some(date),
            _ => line.service_date = Some(date),
        }
    }

    line
}

fn first_component<'buf>(segment: &Segment<'buf>, element_number: usize) -> &'buf str {
    segment
        .components(element_number)
        .and_then(|mut components| components.next())
        .map(|component| core::str::from_utf8(component).unwrap_or(""))
        .unwrap_or("")
}

/// First NM1 with the given entity qualifier, aggregated with its
/// trailing address/contact/reference segments.
fn find_entity<'buf>(segments: &[Segment<'buf>], qualifier: &str) -> Option<Entity<'buf>> {
    let start = segments
        .iter()
        .position(|s| s.id == b"NM1" && text(s, 1) == qualifier)?;
    Some(read_entity(&segments[start..]))
}

fn read_entity<'buf>(segments: &[Segment<'buf>]) -> Entity<'buf> {
    let nm1 = &segments[0];
    let mut entity = Entity {
        qualifier: text(nm1, 1),
        is_person: text(nm1, 2) == "1",
        last_or_org_name: text(nm1, 3),
        first_name: text(nm1, 4),
        middle_name: text(nm1, 5),
        id_qualifier: text(nm1, 8),
        id_code: text(nm1, 9),
        ..Default::default()
    };

    let mut address = Address::default();
    let mut has_address = false;
    for segment in &segments[1..] {
        match segment.id {
            b"NM1" | b"HL" | b"SBR" | b"CLM" | b"LX" => break,
            b"N3" => {
                address.line1 = text(segment, 1);
                address.line2 = text(segment, 2);
                has_address = true;
            }
            b"N4" => {
                address.city = text(segment, 1);
                address.state = text(segment, 2);
                address.zip = text(segment, 3);
                has_address = true;
            }
            b"PER" => entity.contact = Some(read_contact(segment)),
            b"REF" if text(segment, 1) == "EI" => entity.tax_id = text(segment, 2),
            _ => {}
        }
    }
    if has_address {
        entity.address = Some(address);
    }
    entity
}

/// PER carries up to three qualified communication pairs after the name.
fn read_contact<'buf>(segment: &Segment<'buf>) -> Contact<'buf> {
    let mut contact = Contact {
        name: text(segment, 2),
        ..Default::default()
    };
    for position in (3..=7).step_by(2) {
        let value = text(segment, position + 1);
        match text(segment, position) {
            "TE" => contact.phone = value,
            "EM" => contact.email = value,
            "FX" => contact.fax = value,
            _ => {}
        }
    }
    contact
}

fn read_demographics<'buf>(segments: &[Segment<'buf>]) -> Demographics<'buf> {
    segments
        .iter()
        .find(|s| s.id == b"DMG")
        .map(|dmg| Demographics {
            birth_date: text(dmg, 2),
            gender: text(dmg, 3),
        })
        .unwrap_or_default()
}
