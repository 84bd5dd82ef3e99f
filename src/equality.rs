//! Structural comparison and reference-flattening over the resolved object
//! graph, both bounded by a recursion depth cap so a cyclic or adversarially
//! deep document can't blow the stack.

use log::warn;

use crate::object::{Dictionary, Object, Stream};
use crate::Document;

/// Depth cap used when a caller doesn't have an opinion of their own.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Structural equality of `a` and `b`. Two `Reference`s are always considered
/// equal to each other without being dereferenced — a reference carries no
/// payload worth comparing on its own, only the object it names does, and
/// comparing by number would reject two documents that happen to number
/// their objects differently while being otherwise identical. Dictionaries
/// compare unordered but must have the same number of keys. Exceeding
/// `max_depth` logs a warning and reports unequal rather than recursing
/// further.
pub fn equal(a: &Object, b: &Object, max_depth: usize) -> bool {
    equal_at(a, b, max_depth, 0)
}

fn equal_at(a: &Object, b: &Object, max_depth: usize, depth: usize) -> bool {
    if depth > max_depth {
        warn!("equal: recursion depth {depth} exceeds cap {max_depth}, reporting unequal");
        return false;
    }

    match (a, b) {
        (Object::Reference(_), Object::Reference(_)) => true,
        (Object::Null, Object::Null) => true,
        (Object::Boolean(x), Object::Boolean(y)) => x == y,
        (Object::Integer(x), Object::Integer(y)) => x == y,
        (Object::Real(x), Object::Real(y)) => x == y,
        (Object::Name(x), Object::Name(y)) => x == y,
        (Object::String(x, _), Object::String(y, _)) => x == y,
        (Object::Array(x), Object::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(xi, yi)| equal_at(xi, yi, max_depth, depth + 1))
        }
        (Object::Dictionary(x), Object::Dictionary(y)) => dict_equal(x, y, max_depth, depth + 1),
        (Object::Stream(x), Object::Stream(y)) => x.content == y.content && dict_equal(&x.dict, &y.dict, max_depth, depth + 1),
        _ => false,
    }
}

fn dict_equal(a: &Dictionary, b: &Dictionary, max_depth: usize, depth: usize) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(key, value)| match b.get_opt(key) {
        Some(other) => equal_at(value, other, max_depth, depth),
        None => false,
    })
}

/// Returns `v` with every reachable `Reference` replaced by its resolved
/// payload, recursively, up to `max_depth`. Dictionary keys are re-inserted
/// in sorted order so two structurally identical values always serialize
/// identically regardless of how their source dictionaries were ordered.
/// A reference that can't be resolved within the depth budget is left as a
/// reference rather than silently dropped, so `flatten` never discards data
/// — it just stops chasing it.
pub fn flatten(document: &Document, v: &Object, max_depth: usize) -> Object {
    flatten_at(document, v, max_depth, 0)
}

fn flatten_at(document: &Document, v: &Object, max_depth: usize, depth: usize) -> Object {
    if depth > max_depth {
        warn!("flatten: recursion depth {depth} exceeds cap {max_depth}, leaving remainder unflattened");
        return v.clone();
    }

    match v {
        Object::Reference(id) => {
            let resolved = document.get_object(*id).unwrap_or(Object::Null);
            flatten_at(document, &resolved, max_depth, depth + 1)
        }
        Object::Array(items) => {
            Object::Array(items.iter().map(|item| flatten_at(document, item, max_depth, depth + 1)).collect())
        }
        Object::Dictionary(dict) => Object::Dictionary(flatten_dict(document, dict, max_depth, depth + 1)),
        Object::Stream(stream) => Object::Stream(Stream {
            dict: flatten_dict(document, &stream.dict, max_depth, depth + 1),
            content: stream.content.clone(),
            start_position: None,
            decrypted: stream.decrypted,
        }),
        other => other.clone(),
    }
}

fn flatten_dict(document: &Document, dict: &Dictionary, max_depth: usize, depth: usize) -> Dictionary {
    let mut keys: Vec<&[u8]> = dict.iter().map(|(key, _)| key).collect();
    keys.sort_unstable();

    let mut out = Dictionary::new();
    for key in keys {
        let value = dict.get(key).expect("key came from this dictionary's own iterator");
        out.set(key.to_vec(), flatten_at(document, value, max_depth, depth));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::StringFormat;

    #[test]
    fn references_are_equal_regardless_of_target() {
        assert!(equal(&Object::Reference((1, 0)), &Object::Reference((2, 0)), DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn dictionaries_compare_unordered() {
        let mut a = Dictionary::new();
        a.set("A", Object::Integer(1));
        a.set("B", Object::Integer(2));

        let mut b = Dictionary::new();
        b.set("B", Object::Integer(2));
        b.set("A", Object::Integer(1));

        assert!(equal(&Object::Dictionary(a), &Object::Dictionary(b), DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn dictionaries_of_different_size_are_unequal() {
        let mut a = Dictionary::new();
        a.set("A", Object::Integer(1));
        let b = Dictionary::new();
        assert!(!equal(&Object::Dictionary(a), &Object::Dictionary(b), DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn equal_is_reflexive_up_to_the_depth_cap() {
        let value = Object::Array(vec![Object::Integer(1), Object::String(b"hi".to_vec(), StringFormat::Literal)]);
        assert!(equal(&value, &value, DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn exceeding_depth_reports_unequal() {
        let deeply_nested = {
            let mut v = Object::Integer(0);
            for _ in 0..20 {
                v = Object::Array(vec![v]);
            }
            v
        };
        assert!(!equal(&deeply_nested, &deeply_nested.clone(), 5));
    }

    #[test]
    fn flatten_replaces_reachable_references() {
        let mut document = Document::new();
        document.objects.insert((1, 0), Object::Integer(42));

        let mut dict = Dictionary::new();
        dict.set("Value", Object::Reference((1, 0)));
        let flattened = flatten(&document, &Object::Dictionary(dict), DEFAULT_MAX_DEPTH);

        match flattened {
            Object::Dictionary(d) => assert_eq!(d.get(b"Value").unwrap(), &Object::Integer(42)),
            other => panic!("expected dictionary, got {other:?}"),
        }
    }

    #[test]
    fn flatten_sorts_dictionary_keys() {
        let document = Document::new();
        let mut dict = Dictionary::new();
        dict.set("Zebra", Object::Integer(1));
        dict.set("Apple", Object::Integer(2));

        let flattened = flatten(&document, &Object::Dictionary(dict), DEFAULT_MAX_DEPTH);
        match flattened {
            Object::Dictionary(d) => {
                let keys: Vec<&[u8]> = d.iter().map(|(k, _)| k).collect();
                assert_eq!(keys, vec![b"Apple".as_slice(), b"Zebra".as_slice()]);
            }
            other => panic!("expected dictionary, got {other:?}"),
        }
    }

    #[test]
    fn flatten_is_idempotent() {
        let mut document = Document::new();
        document.objects.insert((1, 0), Object::Integer(7));
        let mut dict = Dictionary::new();
        dict.set("Value", Object::Reference((1, 0)));
        let once = flatten(&document, &Object::Dictionary(dict), DEFAULT_MAX_DEPTH);
        let twice = flatten(&document, &once, DEFAULT_MAX_DEPTH);
        assert!(equal(&once, &twice, DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn flatten_contains_no_reference_nodes() {
        let mut document = Document::new();
        document.objects.insert((1, 0), Object::Array(vec![Object::Reference((2, 0))]));
        document.objects.insert((2, 0), Object::Integer(9));

        let flattened = flatten(&document, &Object::Reference((1, 0)), DEFAULT_MAX_DEPTH);
        fn has_reference(v: &Object) -> bool {
            match v {
                Object::Reference(_) => true,
                Object::Array(items) => items.iter().any(has_reference),
                Object::Dictionary(d) => d.iter().any(|(_, v)| has_reference(v)),
                Object::Stream(s) => s.dict.iter().any(|(_, v)| has_reference(v)),
                _ => false,
            }
        }
        assert!(!has_reference(&flattened));
    }
}
