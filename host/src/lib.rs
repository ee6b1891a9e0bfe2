//! X12 claims host library.
//!
//! External wrapper around the `document`/`claim` core: rendering helpers
//! for the JSON and summary output of the `claims-parse` binary. The core
//! itself never touches the filesystem; the binary reads the file and
//! keeps the buffer alive for the lifetime of the parsed views.

use std::fmt::Write;

use claim::Claim837;
use document::Document;

/// Render the claim tree as JSON.
pub fn render_json(claim: &Claim837, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(claim)
    } else {
        serde_json::to_string(claim)
    }
}

/// Human-readable summary of a mapped transaction.
pub fn summary(doc: &Document, claim: &Claim837) -> String {
    let claims: usize = claim.subscriber_loops.iter().map(|s| s.claims.len()).sum();
    let service_lines: usize = claim
        .subscriber_loops
        .iter()
        .flat_map(|s| &s.claims)
        .map(|c| c.service_lines.len())
        .sum();

    let mut out = String::new();
    let _ = writeln!(out, "=== 837 Claim Summary ===");
    let _ = writeln!(out);
    let _ = writeln!(out, "  Transaction type:  {}", claim.transaction_type.as_str());
    let _ = writeln!(out, "  Sender:            {}", claim.sender_id);
    let _ = writeln!(out, "  Receiver:          {}", claim.receiver_id);
    let _ = writeln!(out, "  Control number:    {}", claim.control_number);
    let _ = writeln!(out, "  Segments:          {}", doc.len());
    let _ = writeln!(out, "  Subscriber loops:  {}", claim.subscriber_loops.len());
    let _ = writeln!(out, "  Claims:            {claims}");
    let _ = writeln!(out, "  Service lines:     {service_lines}");
    let _ = writeln!(out, "  Warnings:          {}", claim.warnings.len());
    for warning in &claim.warnings {
        let _ = writeln!(out, "    - {warning}");
    }
    out
}

/// Structural fallback for documents the 837 mapper cannot classify.
pub fn structural_summary(doc: &Document) -> String {
    let delimiters = doc.delimiters();
    let transactions = doc.all_segments("ST").count();

    let mut out = String::new();
    let _ = writeln!(out, "=== X12 Document (structural) ===");
    let _ = writeln!(out);
    let _ = writeln!(out, "  Segments:      {}", doc.len());
    let _ = writeln!(out, "  Transactions:  {transactions}");
    let _ = writeln!(
        out,
        "  Delimiters:    element '{}' component '{}' segment '{}'",
        delimiters.element as char, delimiters.component as char, delimiters.segment as char
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::parse_837;
    use document::parse_document;

    const SAMPLE: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *221130*1200*^*00501*000000001*0*P*:~\
                          GS*HC*SENDER*RECEIVER*20221130*1200*1*X*005010X223A2~\
                          ST*837*0001*005010X223A2~\
                          HL*1**20*1~\
                          NM1*85*2*GENERAL HOSPITAL~\
                          HL*2*1*22*0~\
                          SBR*P*18*******MB~\
                          NM1*IL*1*DOE*JANE~\
                          CLM*C1*100.00***11:A:1~\
                          LX*1~\
                          SV2*0120*HC:99231*100.00*UN*1~\
                          DTP*472*D8*20221201~\
                          SE*11*0001~\
                          GE*1*1~\
                          IEA*1*000000001~";

    #[test]
    fn json_round_trips_through_serde() {
        let doc = parse_document(SAMPLE.as_bytes()).unwrap();
        let mapped = parse_837(&doc).unwrap();

        let rendered = render_json(&mapped, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["transaction_type"], "institutional");
        assert_eq!(
            value["subscriber_loops"][0]["claims"][0]["claim_id"],
            "C1"
        );
    }

    #[test]
    fn summary_counts_the_tree() {
        let doc = parse_document(SAMPLE.as_bytes()).unwrap();
        let mapped = parse_837(&doc).unwrap();

        let text = summary(&doc, &mapped);
        assert!(text.contains("Transaction type:  institutional"));
        assert!(text.contains("Subscriber loops:  1"));
        assert!(text.contains("Claims:            1"));
        assert!(text.contains("Service lines:     1"));
    }

    #[test]
    fn structural_summary_reports_delimiters() {
        let doc = parse_document(SAMPLE.as_bytes()).unwrap();
        let text = structural_summary(&doc);
        assert!(text.contains("Transactions:  1"));
        assert!(text.contains("element '*'"));
    }
}
