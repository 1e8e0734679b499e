//! Integration tests for JSON Pointer and URI fragment access.

use apispec::{Pointer, PointerError, UriFragment};
use serde_json::{json, Value};

fn rfc_document() -> Value {
    json!({
        "foo": ["bar", "baz"],
        "": 0,
        "a/b": 1,
        "c%d": 2,
        "e^f": 3,
        "g|h": 4,
        "i\\j": 5,
        "k\"l": 6,
        " ": 7,
        "m~n": 8
    })
}

mod rfc_6901 {
    use super::*;

    #[test]
    fn string_representation() {
        let doc = rfc_document();
        let cases = [
            ("", doc.clone()),
            ("/foo", json!(["bar", "baz"])),
            ("/foo/0", json!("bar")),
            ("/", json!(0)),
            ("/a~1b", json!(1)),
            ("/c%d", json!(2)),
            ("/e^f", json!(3)),
            ("/g|h", json!(4)),
            ("/i\\j", json!(5)),
            ("/k\"l", json!(6)),
            ("/ ", json!(7)),
            ("/m~0n", json!(8)),
        ];
        for (pointer, want) in cases {
            let got = Pointer::parse(pointer).unwrap().access(&doc).unwrap().clone();
            assert_eq!(got, want, "pointer {pointer:?}");
        }
    }

    #[test]
    fn uri_fragment_representation() {
        let doc = rfc_document();
        let cases = [
            ("#", doc.clone()),
            ("#/foo", json!(["bar", "baz"])),
            ("#/foo/0", json!("bar")),
            ("#/", json!(0)),
            ("#/a~1b", json!(1)),
            ("#/c%25d", json!(2)),
            ("#/e%5Ef", json!(3)),
            ("#/g%7Ch", json!(4)),
            ("#/i%5Cj", json!(5)),
            ("#/k%22l", json!(6)),
            ("#/%20", json!(7)),
            ("#/m~0n", json!(8)),
        ];
        for (fragment, want) in cases {
            let got = UriFragment::parse(fragment)
                .unwrap()
                .access(&doc)
                .unwrap()
                .clone();
            assert_eq!(got, want, "fragment {fragment:?}");
        }
    }

    #[test]
    fn fragments_encode_back() {
        let pointer = Pointer::root().join("c%d").join("a/b");
        assert_eq!(pointer.to_string(), "/c%d/a~1b");
        assert_eq!(UriFragment::from(pointer).to_string(), "#/c%25d/a~1b");
    }
}

mod errors {
    use super::*;

    #[test]
    fn invalid_syntax() {
        for pointer in ["foo", "/~2", "/a~"] {
            assert!(
                matches!(Pointer::parse(pointer), Err(PointerError::InvalidSyntax { .. })),
                "{pointer:?}"
            );
        }
    }

    #[test]
    fn fragment_requires_hash() {
        assert!(UriFragment::parse("/foo").is_err());
    }

    #[test]
    fn index_out_of_range() {
        let doc = rfc_document();
        let err = Pointer::parse("/foo/2").unwrap().access(&doc).unwrap_err();
        assert_eq!(err.reason, "index out of range");
        assert_eq!(err.used.len(), 1);
        assert_eq!(err.remaining.len(), 1);
        assert_eq!(err.value, json!(["bar", "baz"]));
        assert_eq!(err.failing_pointer(), "/foo/2");
    }

    #[test]
    fn missing_key() {
        let doc = rfc_document();
        let err = Pointer::parse("/nope/deeper").unwrap().access(&doc).unwrap_err();
        assert_eq!(err.reason, "key out of range");
        assert!(err.used.is_empty());
        assert_eq!(err.remaining.len(), 2);
    }

    #[test]
    fn through_a_scalar() {
        let doc = rfc_document();
        let err = Pointer::parse("/foo/0/x").unwrap().access(&doc).unwrap_err();
        assert_eq!(err.reason, "expect object got string");
        assert_eq!(err.value, json!("bar"));
    }

    #[test]
    fn key_into_array() {
        let doc = rfc_document();
        let err = Pointer::parse("/foo/first").unwrap().access(&doc).unwrap_err();
        assert_eq!(err.reason, "expect object got array");
    }

    #[test]
    fn leading_zero_is_not_an_index() {
        let doc = rfc_document();
        assert!(Pointer::parse("/foo/01").unwrap().access(&doc).is_err());
    }
}
