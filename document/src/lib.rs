//! Zero-copy X12 EDI tokenizer and document model.
//!
//! An X12 interchange declares its own delimiter set in the fixed-layout
//! ISA header segment. This crate resolves that delimiter set, splits the
//! byte stream into segments and elements without copying, and wraps the
//! result in a [`Document`] with identifier-indexed lookup.
//!
//! All parsed views borrow from the caller's buffer: the buffer must
//! outlive the [`Document`] and everything derived from it, which the
//! borrow checker enforces.
//!
//! # Usage
//! ```
//! let bytes = b"ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       \
//!               *231213*1430*^*00501*000000001*0*P*:~ST*837*0001*005010X223A2~SE*2*0001~";
//!
//! let doc = document::parse_document(bytes).unwrap();
//! let st = doc.first_segment("ST").unwrap();
//! assert_eq!(st.element(1).unwrap().as_str(), Some("837"));
//! ```

mod document;

pub use document::Document;

/// Errors raised while resolving delimiters or tokenizing segments.
///
/// Every variant is fatal to the current parse: a broken delimiter set or
/// segment stream makes all further interpretation unreliable.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The interchange header is missing, truncated, or declares a
    /// colliding delimiter set.
    #[error("malformed interchange header: {reason}")]
    MalformedHeader {
        /// Human-readable description of what was wrong
        reason: &'static str,
    },

    /// A segment yielded zero elements (no identifier before the first
    /// element separator or segment terminator).
    #[error("segment {position} has no identifier")]
    EmptySegment {
        /// Zero-based position of the offending segment in file order
        position: usize,
    },

    /// The buffer ended in the middle of a segment and strict mode was
    /// requested.
    #[error("buffer ends inside an unterminated segment")]
    UnterminatedSegment,
}

/// X12 delimiters resolved from the ISA segment.
///
/// All four values are pairwise distinct; resolution happens once per
/// document and the set is immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Element separator (byte following the ISA tag, typically '*')
    pub element: u8,

    /// Component (sub-element) separator (ISA16, typically ':')
    pub component: u8,

    /// Repetition separator (ISA11 for version 00402 and later, typically '^')
    pub repetition: u8,

    /// Segment terminator (byte following ISA16, typically '~')
    pub segment: u8,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            element: b'*',
            component: b':',
            repetition: b'^',
            segment: b'~',
        }
    }
}

/// Number of data elements in the ISA header segment.
const ISA_ELEMENT_COUNT: usize = 16;

/// First interchange control version that carries a repetition separator
/// in ISA11. Earlier versions use ISA11 for the standards identifier and
/// get the conventional '^' instead.
const REPETITION_SINCE_VERSION: &[u8] = b"00402";

impl Delimiters {
    /// Resolve the delimiter set from the interchange header.
    ///
    /// The buffer must begin with the 3-byte `ISA` tag. The element
    /// separator is the byte immediately following the tag; the header is
    /// then scanned on that separator for its 16 elements. ISA16 is the
    /// component separator, ISA11 the repetition separator (version
    /// permitting), and the byte after ISA16 the segment terminator.
    pub fn from_isa(buffer: &[u8]) -> Result<Self, ParseError> {
        let malformed = |reason| ParseError::MalformedHeader { reason };

        if buffer.len() < 4 {
            return Err(malformed("shorter than the ISA tag"));
        }
        if &buffer[..3] != b"ISA" {
            return Err(malformed("first three bytes must be 'ISA'"));
        }

        let element = buffer[3];

        // Scan element boundaries. ISA01..ISA15 each end at an element
        // separator; ISA16 is the single component separator byte.
        let mut bounds = [(0usize, 0usize); ISA_ELEMENT_COUNT - 1];
        let mut pos = 4;
        for slot in bounds.iter_mut() {
            let len = buffer[pos..]
                .iter()
                .position(|&b| b == element)
                .ok_or(malformed("header ends before its 16 elements"))?;
            *slot = (pos, pos + len);
            pos += len + 1;
        }
        if pos >= buffer.len() {
            return Err(malformed("header ends before its 16 elements"));
        }
        // ISA16 is the component separator itself.
        let component = buffer[pos];

        let segment = *buffer
            .get(pos + 1)
            .ok_or(malformed("header ends before its terminator"))?;

        // ISA12 is the interchange control version; it decides whether
        // ISA11 holds a repetition separator at all.
        let version = &buffer[bounds[11].0..bounds[11].1];
        let repetition = if version >= REPETITION_SINCE_VERSION {
            let isa11 = &buffer[bounds[10].0..bounds[10].1];
            match isa11 {
                [byte] => *byte,
                _ => return Err(malformed("repetition separator must be a single byte")),
            }
        } else {
            Delimiters::default().repetition
        };

        let resolved = Self {
            element,
            component,
            repetition,
            segment,
        };
        if resolved.collides() {
            return Err(malformed("delimiters must be pairwise distinct"));
        }
        Ok(resolved)
    }

    fn collides(&self) -> bool {
        let all = [self.element, self.component, self.repetition, self.segment];
        all.iter()
            .enumerate()
            .any(|(i, a)| all[i + 1..].contains(a))
    }
}

/// A parsed element: a borrowed view of one field's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'buf> {
    data: &'buf [u8],
}

impl<'buf> Element<'buf> {
    #[inline]
    pub fn new(data: &'buf [u8]) -> Self {
        Self { data }
    }

    #[inline]
    pub fn as_bytes(&self) -> &'buf [u8] {
        self.data
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get element as string (if valid UTF-8)
    #[inline]
    pub fn as_str(&self) -> Option<&'buf str> {
        core::str::from_utf8(self.data).ok()
    }

    /// Split the element into composite components on the given separator.
    ///
    /// Components are computed lazily from the stored view; nothing is
    /// materialized for elements that are never treated as composites.
    pub fn components(&self, separator: u8) -> ComponentIter<'buf> {
        ComponentIter {
            data: self.data,
            separator,
            pos: 0,
        }
    }
}

/// Iterator over the composite components of one element.
pub struct ComponentIter<'buf> {
    data: &'buf [u8],
    separator: u8,
    pos: usize,
}

impl<'buf> Iterator for ComponentIter<'buf> {
    type Item = &'buf [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos > self.data.len() {
            return None;
        }

        let start = self.pos;
        let remaining = &self.data[start..];

        if let Some(idx) = remaining.iter().position(|&b| b == self.separator) {
            self.pos = start + idx + 1;
            Some(&remaining[..idx])
        } else if start < self.data.len() {
            self.pos = self.data.len() + 1;
            Some(remaining)
        } else if start == self.data.len() && start > 0 {
            // Handle trailing separator
            self.pos = self.data.len() + 1;
            Some(&[])
        } else {
            None
        }
    }
}

/// A parsed X12 segment with zero-copy element references.
///
/// Segments are immutable once tokenized. Elements are not materialized;
/// they are sliced out of the stored data on access.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'buf> {
    /// Segment identifier (e.g. "ISA", "HL", "CLM")
    pub id: &'buf [u8],
    /// Raw segment data containing the elements
    data: &'buf [u8],
    /// Delimiter configuration
    pub delimiters: Delimiters,
}

impl<'buf> Segment<'buf> {
    fn new(id: &'buf [u8], data: &'buf [u8], delimiters: Delimiters) -> Self {
        Self {
            id,
            data,
            delimiters,
        }
    }

    /// Get segment ID as string (if valid UTF-8)
    #[inline]
    pub fn id_str(&self) -> Option<&'buf str> {
        core::str::from_utf8(self.id).ok()
    }

    /// Iterate over all data elements.
    pub fn elements(&self) -> ElementIter<'buf> {
        ElementIter {
            data: self.data,
            separator: self.delimiters.element,
            pos: 0,
        }
    }

    /// Get element by X12 element number.
    ///
    /// Uses domain-specific numbering:
    /// - `element(0)` returns the segment ID (e.g. CLM-00)
    /// - `element(1)` returns the first data element (e.g. CLM-01)
    ///
    /// This matches X12 standard conventions and prevents off-by-one errors.
    #[inline]
    pub fn element(&self, element_number: usize) -> Option<Element<'buf>> {
        match element_number {
            0 => Some(Element::new(self.id)),
            _ => self.elements().nth(element_number - 1),
        }
    }

    /// Get total element count including the segment ID as element 0.
    pub fn element_count(&self) -> usize {
        self.elements().count() + 1
    }

    /// Split element `element_number` into composite components using the
    /// document's component separator.
    pub fn components(&self, element_number: usize) -> Option<ComponentIter<'buf>> {
        self.element(element_number)
            .map(|e| e.components(self.delimiters.component))
    }
}

/// Iterator over segment elements.
pub struct ElementIter<'buf> {
    data: &'buf [u8],
    separator: u8,
    pos: usize,
}

impl<'buf> Iterator for ElementIter<'buf> {
    type Item = Element<'buf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos > self.data.len() {
            return None;
        }

        let start = self.pos;
        let remaining = &self.data[start..];

        if let Some(idx) = remaining.iter().position(|&b| b == self.separator) {
            self.pos = start + idx + 1;
            Some(Element::new(&remaining[..idx]))
        } else if start < self.data.len() {
            self.pos = self.data.len() + 1;
            Some(Element::new(remaining))
        } else if start == self.data.len() && start > 0 {
            // Handle trailing separator
            self.pos = self.data.len() + 1;
            Some(Element::new(&[]))
        } else {
            None
        }
    }
}

/// Parse an X12 interchange into a [`Document`], tolerating a trailing
/// unterminated segment.
pub fn parse_document(buffer: &[u8]) -> Result<Document<'_>, ParseError> {
    Document::parse(buffer)
}

/// Parse an X12 interchange into a [`Document`], failing with
/// [`ParseError::UnterminatedSegment`] if the buffer ends mid-segment.
pub fn parse_document_strict(buffer: &[u8]) -> Result<Document<'_>, ParseError> {
    Document::parse_strict(buffer)
}

/// Skip CR/LF and whitespace padding between segments.
///
/// Segment terminators are often followed by newlines for readability;
/// those bytes belong to no segment.
#[inline]
fn skip_padding(buffer: &[u8]) -> &[u8] {
    let skipped = buffer
        .iter()
        .take_while(|&&b| matches!(b, b'\r' | b'\n' | b' ' | b'\t'))
        .count();
    &buffer[skipped..]
}

/// Split the full buffer into segments using the resolved delimiters.
///
/// The ISA header is tokenized like any other segment and becomes the
/// first entry of the returned sequence.
pub(crate) fn tokenize(
    mut buffer: &[u8],
    delimiters: Delimiters,
    strict: bool,
) -> Result<Vec<Segment<'_>>, ParseError> {
    let mut segments = Vec::new();

    loop {
        buffer = skip_padding(buffer);
        if buffer.is_empty() {
            break;
        }

        let (segment_data, rest) = match buffer.iter().position(|&b| b == delimiters.segment) {
            Some(end) => (&buffer[..end], &buffer[end + 1..]),
            None if strict => return Err(ParseError::UnterminatedSegment),
            // Lenient mode accepts a final segment without its terminator.
            None => (buffer, &buffer[buffer.len()..]),
        };
        buffer = rest;

        let id_end = segment_data
            .iter()
            .position(|&b| b == delimiters.element)
            .unwrap_or(segment_data.len());
        if id_end == 0 {
            return Err(ParseError::EmptySegment {
                position: segments.len(),
            });
        }

        let id = &segment_data[..id_end];
        let data = if id_end < segment_data.len() {
            &segment_data[id_end + 1..]
        } else {
            &[]
        };

        segments.push(Segment::new(id, data, delimiters));
    }

    Ok(segments)
}
