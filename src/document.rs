use std::collections::BTreeMap;

use crate::encryption::{self, EncryptionState, Permissions};
use crate::error::Error;
use crate::object::{Dictionary, Object, ObjectId};
use crate::xref::{Xref, XrefType};
use crate::Result;

/// The resolved object graph for one PDF file, built once at load time by
/// [`Reader::read`](crate::reader::Reader::read): every indirect object
/// reachable from an xref entry is already parsed (and, if the file is
/// encrypted, decrypted) into `objects` before a caller ever sees a `Document`.
#[derive(Debug, Clone)]
pub struct Document {
    /// `%PDF-M.m` version string, without the leading `%PDF-`.
    pub version: String,
    /// Bytes of the binary-marker comment on the line after the header, if present.
    pub binary_mark: Vec<u8>,
    /// Byte offset of the xref section named by the final `startxref`.
    pub xref_start: usize,
    /// Highest object number referenced anywhere in the merged xref table.
    pub max_id: u32,
    pub trailer: Dictionary,
    pub reference_table: Xref,
    pub(crate) objects: BTreeMap<ObjectId, Object>,
    pub encryption_state: Option<EncryptionState>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            version: String::new(),
            binary_mark: Vec::new(),
            xref_start: 0,
            max_id: 0,
            trailer: Dictionary::new(),
            reference_table: Xref::new(0, XrefType::CrossReferenceTable),
            objects: BTreeMap::new(),
            encryption_state: None,
        }
    }

    /// Look up an already-resolved object. Per the conforming-reader rule, a
    /// reference to an undefined object number yields `Object::Null` rather
    /// than an error.
    pub fn get_object(&self, id: ObjectId) -> Result<Object> {
        Ok(self.objects.get(&id).cloned().unwrap_or(Object::Null))
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects.get_mut(&id).ok_or(Error::MissingXrefEntry)
    }

    pub fn get_dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        self.objects.get(&id).ok_or(Error::MissingXrefEntry)?.as_dict()
    }

    /// Resolve `value` one indirection deep: a `Reference` is looked up and
    /// paired with the id it resolved to; any other value is paired with the
    /// object-id placeholder `(0, 0)` since it was never indirect.
    pub fn dereference(&self, value: &Object) -> Result<(ObjectId, Object)> {
        match value {
            Object::Reference(id) => {
                let resolved = self.get_object(*id)?;
                if matches!(resolved, Object::Reference(_)) {
                    return Err(Error::DoubleIndirection);
                }
                Ok((*id, resolved))
            }
            other => Ok(((0, 0), other.clone())),
        }
    }

    /// All object numbers this document has a resolved object for.
    pub fn object_numbers(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects.iter().map(|(id, obj)| (*id, obj))
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption_state.is_some() || self.trailer.get_opt(b"Encrypt").is_some()
    }

    /// Checks whether `password` authenticates against this document's
    /// `/Encrypt` dictionary, without installing the resulting key.
    pub fn authenticate_password(&self, password: &str) -> Result<()> {
        encryption::EncryptionState::decode(self, password)
            .map(|_| ())
            .map_err(Error::Decryption)
    }

    /// Authenticates `password` and reports the access permissions it grants.
    /// The owner password always grants [`Permissions::all`]; the user
    /// password grants whatever `/P` stores.
    pub fn check_access_rights(&self, password: &str) -> Result<Permissions> {
        encryption::check_access_rights(self, password).map_err(Error::Decryption)
    }

    /// Smallest xref-table byte offset greater than or equal to `offset`,
    /// used to bound a stream whose declared `/Length` is wrong. Entries are
    /// sorted lazily on first use; callers needing this repeatedly should
    /// cache the result themselves, since `Document` does not memoize it.
    pub fn xref_next_object_offset(&self, offset: usize) -> Option<usize> {
        let mut offsets: Vec<usize> = self
            .reference_table
            .entries
            .values()
            .filter_map(|entry| match entry {
                crate::xref::XrefEntry::Normal { offset, .. } => Some(*offset as usize),
                _ => None,
            })
            .collect();
        offsets.sort_unstable();
        offsets.into_iter().find(|&o| o >= offset)
    }

    /// Which object's indirect-object body contains byte `offset`, built from
    /// the gaps between consecutive xref offsets. Used for diagnosing a
    /// stream whose declared `/Length` runs past where the next object
    /// actually starts: the offset the correction lands on tells you which
    /// object absorbed it.
    pub fn object_owning_offset(&self, offset: usize) -> Option<ObjectId> {
        let mut offsets: Vec<(usize, u32)> = self
            .reference_table
            .entries
            .iter()
            .filter_map(|(&number, entry)| match entry {
                crate::xref::XrefEntry::Normal { offset, .. } => Some((*offset as usize, number)),
                _ => None,
            })
            .collect();
        offsets.sort_unstable_by_key(|&(offset, _)| offset);

        let mut map = rangemap::RangeMap::new();
        for window in offsets.windows(2) {
            let (start, number) = window[0];
            let (end, _) = window[1];
            map.insert(start..end, number);
        }
        if let Some(&(start, number)) = offsets.last() {
            map.insert(start..usize::MAX, number);
        }

        map.get(&offset).map(|&number| (number, 0))
    }

    /// A diagnostic census of the object graph: for every object carrying a
    /// `/Type` or `/Subtype` name (a stream's own dictionary, not its
    /// container), the number of objects with that name. Objects with
    /// neither key are not counted — most arrays, numbers and plain strings
    /// have no type name and would only dilute the summary.
    pub fn inspect(&self) -> BTreeMap<Vec<u8>, usize> {
        let mut counts: BTreeMap<Vec<u8>, usize> = BTreeMap::new();
        for object in self.objects.values() {
            let dict = match object {
                Object::Dictionary(d) => Some(d),
                Object::Stream(s) => Some(&s.dict),
                _ => None,
            };
            let Some(dict) = dict else { continue };
            let name = dict
                .get_opt(b"Type")
                .or_else(|| dict.get_opt(b"Subtype"))
                .and_then(|o| o.as_name().ok());
            if let Some(name) = name {
                *counts.entry(name.to_vec()).or_insert(0) += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspect_counts_by_type_and_subtype() {
        let mut document = Document::new();

        let mut page1 = Dictionary::new();
        page1.set("Type", Object::Name(b"Page".to_vec()));
        document.objects.insert((1, 0), Object::Dictionary(page1));

        let mut page2 = Dictionary::new();
        page2.set("Type", Object::Name(b"Page".to_vec()));
        document.objects.insert((2, 0), Object::Dictionary(page2));

        let mut image = Dictionary::new();
        image.set("Type", Object::Name(b"XObject".to_vec()));
        image.set("Subtype", Object::Name(b"Image".to_vec()));
        document.objects.insert((3, 0), Object::Stream(crate::object::Stream::new(image, Vec::new())));

        document.objects.insert((4, 0), Object::Integer(7));

        let counts = document.inspect();
        assert_eq!(counts.get(b"Page".as_slice()), Some(&2));
        assert_eq!(counts.get(b"XObject".as_slice()), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn object_owning_offset_finds_the_object_whose_span_contains_it() {
        let mut document = Document::new();
        document.reference_table.insert(1, crate::xref::XrefEntry::Normal { offset: 10, generation: 0 });
        document.reference_table.insert(2, crate::xref::XrefEntry::Normal { offset: 50, generation: 0 });
        document.reference_table.insert(3, crate::xref::XrefEntry::Normal { offset: 90, generation: 0 });

        assert_eq!(document.object_owning_offset(10), Some((1, 0)));
        assert_eq!(document.object_owning_offset(49), Some((1, 0)));
        assert_eq!(document.object_owning_offset(50), Some((2, 0)));
        assert_eq!(document.object_owning_offset(120), Some((3, 0)));
        assert_eq!(document.object_owning_offset(5), None);
    }

    #[test]
    fn get_object_returns_null_for_missing_reference() {
        let document = Document::new();
        assert_eq!(document.get_object((99, 0)).unwrap(), Object::Null);
    }
}
