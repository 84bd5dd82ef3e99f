use std::collections::BTreeMap;

/// One entry in the cross-reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// An object with a known byte offset and generation.
    Normal { offset: u32, generation: u16 },
    /// An object packed inside an object stream, addressed by the container's
    /// object number and the object's slot index within it.
    Compressed { container: u32, index: u16 },
    /// A free-list entry (`f` in table form, or type 0 in stream form).
    Free { next: u32 },
    /// An `n`-flagged table entry whose offset is 0 or 1 — not valid, treated as free.
    UnusableFree,
}

/// Where the xref section for a document was found: a classic table or a stream
/// object (PDF 1.5+). Kept so the incremental writer can decide what to emit
/// next, and so diagnostics can explain what was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefType {
    CrossReferenceTable,
    CrossReferenceStream,
}

/// The merged object-number -> entry mapping, built by following `/Prev` (and
/// `/XRefStm`) chains from the most recent revision backward.
#[derive(Debug, Clone)]
pub struct Xref {
    pub entries: BTreeMap<u32, XrefEntry>,
    pub size: u32,
    pub xref_type: XrefType,
}

impl Xref {
    pub fn new(size: u32, xref_type: XrefType) -> Self {
        Xref { entries: BTreeMap::new(), size, xref_type }
    }

    pub fn insert(&mut self, object_number: u32, entry: XrefEntry) {
        self.entries.insert(object_number, entry);
    }

    pub fn get(&self, object_number: u32) -> Option<&XrefEntry> {
        self.entries.get(&object_number)
    }

    pub fn max_id(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    /// Folds `other` (an older revision, read later) into `self` (the newer
    /// revision, read first): entries already present in `self` are never
    /// replaced, matching spec.md's "earlier-read entries take precedence" rule.
    pub fn merge(&mut self, other: Xref) {
        for (number, entry) in other.entries {
            self.entries.entry(number).or_insert(entry);
        }
    }
}
