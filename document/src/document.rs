use std::collections::HashMap;

use crate::{tokenize, Delimiters, ParseError, Segment};

/// A parsed X12 interchange: the ordered segment sequence plus an
/// identifier index.
///
/// Segment order is preserved exactly as encountered; no segment is
/// dropped or reordered. The document is a read-only facade over the
/// tokenizer's output; it does no parsing of its own beyond index
/// maintenance.
#[derive(Debug)]
pub struct Document<'buf> {
    delimiters: Delimiters,
    segments: Vec<Segment<'buf>>,
    index: HashMap<&'buf [u8], Vec<usize>>,
}

impl<'buf> Document<'buf> {
    /// Parse an interchange, accepting a trailing unterminated segment.
    pub fn parse(buffer: &'buf [u8]) -> Result<Self, ParseError> {
        Self::parse_mode(buffer, false)
    }

    /// Parse an interchange, rejecting a trailing unterminated segment.
    pub fn parse_strict(buffer: &'buf [u8]) -> Result<Self, ParseError> {
        Self::parse_mode(buffer, true)
    }

    fn parse_mode(buffer: &'buf [u8], strict: bool) -> Result<Self, ParseError> {
        let delimiters = Delimiters::from_isa(buffer)?;
        let segments = tokenize(buffer, delimiters, strict)?;

        let mut index: HashMap<&[u8], Vec<usize>> = HashMap::new();
        for (position, segment) in segments.iter().enumerate() {
            index.entry(segment.id).or_default().push(position);
        }

        Ok(Self {
            delimiters,
            segments,
            index,
        })
    }

    /// The delimiter set resolved from the interchange header.
    #[inline]
    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    /// All segments in file order.
    #[inline]
    pub fn segments(&self) -> &[Segment<'buf>] {
        &self.segments
    }

    /// Number of segments in the document.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment with the given identifier, in file order.
    pub fn first_segment(&self, id: &str) -> Option<&Segment<'buf>> {
        self.index
            .get(id.as_bytes())
            .and_then(|positions| positions.first())
            .map(|&position| &self.segments[position])
    }

    /// All segments with the given identifier, in file order.
    pub fn all_segments<'doc>(
        &'doc self,
        id: &str,
    ) -> impl Iterator<Item = &'doc Segment<'buf>> + 'doc {
        self.index
            .get(id.as_bytes())
            .map(|positions| positions.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&position| &self.segments[position])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *231213*1430*^*00501*000000001*0*P*:~";

    #[test]
    fn isa_is_the_first_segment() {
        let doc = Document::parse(ISA.as_bytes()).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.segments()[0].id, b"ISA");
        // ISA16 is exposed as a regular element
        assert_eq!(doc.segments()[0].element(16).unwrap().as_bytes(), b":");
    }

    #[test]
    fn first_segment_returns_file_order_match() {
        let input = format!("{ISA}REF*D9*FIRST~REF*EI*SECOND~");
        let doc = Document::parse(input.as_bytes()).unwrap();

        let first = doc.first_segment("REF").unwrap();
        assert_eq!(first.element(2).unwrap().as_str(), Some("FIRST"));
        assert!(doc.first_segment("CLM").is_none());
    }

    #[test]
    fn all_segments_preserves_order() {
        let input = format!("{ISA}HI*ABK:I269~REF*D9*X~HI*ABF:E119~");
        let doc = Document::parse(input.as_bytes()).unwrap();

        let codes: Vec<_> = doc
            .all_segments("HI")
            .map(|s| s.element(1).unwrap().as_str().unwrap())
            .collect();
        assert_eq!(codes, ["ABK:I269", "ABF:E119"]);
        assert_eq!(doc.all_segments("SV2").count(), 0);
    }
}
