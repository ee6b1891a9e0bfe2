//! External JSON shape: snake_case keys, empty arrays for empty code
//! buckets, null for absent dates.

use claim::parse_837;
use document::parse_document;
use serde_json::{json, Value};

use pretty_assertions::assert_eq;

const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *221130*1200*^*00501*000000001*0*P*:~";

fn minimal_837i() -> String {
    format!(
        "{ISA}\
         GS*HC*SENDER*RECEIVER*20221130*1200*1*X*005010X223A2~\
         ST*837*0001*005010X223A2~\
         BHT*0019*00*123456*20221130*1200*CH~\
         HL*1**20*1~\
         NM1*85*2*GENERAL HOSPITAL*****XX*1234567890~\
         HL*2*1*22*0~\
         SBR*P*18*******MB~\
         NM1*IL*1*DOE*JANE~\
         CLM*PATIENT123*15000.00***11:A:1~\
         LX*1~\
         SV2*0120*HC:99231*15000.00*UN*10~\
         SE*11*0001~\
         GE*1*1~\
         IEA*1*000000001~"
    )
}

#[test]
fn claim_tree_serializes_with_snake_case_keys() {
    let input = minimal_837i();
    let doc = parse_document(input.as_bytes()).unwrap();
    let mapped = parse_837(&doc).unwrap();

    let value = serde_json::to_value(&mapped).unwrap();

    assert_eq!(value["transaction_type"], json!("institutional"));
    assert_eq!(value["sender_id"], json!("SENDER"));
    assert_eq!(value["receiver_id"], json!("RECEIVER"));
    assert_eq!(value["control_number"], json!("0001"));
    assert_eq!(value["billing_provider"]["last_or_org_name"], json!("GENERAL HOSPITAL"));
    assert_eq!(value["submitter"], Value::Null);
    assert_eq!(value["warnings"], json!([]));

    let sub = &value["subscriber_loops"][0];
    assert_eq!(sub["payer_responsibility"], json!("P"));
    assert_eq!(sub["filing_code"], json!("MB"));
    assert_eq!(sub["patients"], json!([]));
    assert_eq!(sub["payer"], Value::Null);
}

#[test]
fn empty_buckets_are_arrays_and_absent_dates_are_null() {
    let input = minimal_837i();
    let doc = parse_document(input.as_bytes()).unwrap();
    let mapped = parse_837(&doc).unwrap();

    let value = serde_json::to_value(&mapped).unwrap();
    let claim = &value["subscriber_loops"][0]["claims"][0];

    assert_eq!(claim["claim_id"], json!("PATIENT123"));
    assert_eq!(claim["place_of_service"], json!("11"));
    assert_eq!(claim["diagnosis_codes"], json!([]));
    assert_eq!(claim["value_codes"], json!([]));
    assert_eq!(claim["occurrence_codes"], json!([]));
    assert_eq!(claim["occurrence_span_codes"], json!([]));
    assert_eq!(claim["condition_codes"], json!([]));
    assert_eq!(claim["procedure_codes"], json!([]));

    let line = &claim["service_lines"][0];
    assert_eq!(line["revenue_code"], json!("0120"));
    assert_eq!(line["service_date"], Value::Null);
    assert_eq!(line["service_date_end"], Value::Null);
}

#[test]
fn decoded_codes_serialize_in_order() {
    let input = format!(
        "{ISA}\
         GS*HC*SENDER*RECEIVER*20221130*1200*1*X*005010X223A2~\
         ST*837*0001*005010X223A2~\
         HL*1**20*1~\
         NM1*85*2*HOSPITAL~\
         HL*2*1*22*0~\
         SBR*P*18*******MB~\
         NM1*IL*1*DOE*JANE~\
         CLM*C1*10.00***11:A:1~\
         HI*ABK:I269*ABF:E119~\
         SE*9*0001~"
    );
    let doc = parse_document(input.as_bytes()).unwrap();
    let mapped = parse_837(&doc).unwrap();

    let value = serde_json::to_value(&mapped).unwrap();
    assert_eq!(
        value["subscriber_loops"][0]["claims"][0]["diagnosis_codes"],
        json!([
            { "qualifier": "ABK", "code": "I269", "poa": "" },
            { "qualifier": "ABF", "code": "E119", "poa": "" },
        ])
    );
}
