use document::Document;

/// Rebuild the X12 text from a parsed document by re-joining every
/// segment's elements with the resolved delimiters.
///
/// For all valid inputs: input == reconstructed output (modulo padding
/// between segments).
pub fn reconstruct(doc: &Document) -> String {
    let delimiters = doc.delimiters();
    doc.segments().iter().fold(String::new(), |mut acc, seg| {
        acc.push_str(std::str::from_utf8(seg.id).unwrap());
        for element in seg.elements() {
            acc.push(delimiters.element as char);
            acc.push_str(element.as_str().unwrap());
        }
        acc.push(delimiters.segment as char);
        acc
    })
}
