use bitflags::bitflags;

bitflags! {
    /// The `/P` access-permission bitfield (ISO 32000-1 Table 22, 7.6.3.2).
    /// Bit numbering in the spec is 1-indexed and bits 1, 2, 7 and 8 are
    /// reserved (must be 0, 1, 0 and 1 respectively); only the named flags
    /// below are meaningful to a conforming reader.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u32 {
        /// Bit 3: print the document (at degraded quality if `PRINT_HIGH_QUALITY` is absent).
        const PRINT = 1 << 2;
        /// Bit 4: modify the document other than as governed by bits 6, 9 and 11.
        const MODIFY = 1 << 3;
        /// Bit 5: copy text and graphics from the document.
        const COPY = 1 << 4;
        /// Bit 6: add or modify annotations, fill form fields.
        const ANNOTATE = 1 << 5;
        /// Bit 9: fill existing form fields, including signature fields.
        const FILL_FORMS = 1 << 8;
        /// Bit 10: extract text/graphics for accessibility use.
        const EXTRACT_FOR_ACCESSIBILITY = 1 << 9;
        /// Bit 11: assemble the document (insert, rotate, delete pages, create bookmarks/thumbnails).
        const ASSEMBLE = 1 << 10;
        /// Bit 12: print at full (high) quality.
        const PRINT_HIGH_QUALITY = 1 << 11;
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}
