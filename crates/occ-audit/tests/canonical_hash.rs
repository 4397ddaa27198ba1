use occ_audit::{env_hash, hash_bytes, hash_canonical_value, prefixed, to_canonical_json_bytes, EnvFingerprint};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

#[test]
fn canonical_bytes_sort_keys_without_whitespace() {
    let value = json!({"b": 1, "a": {"d": [1, 2], "c": null}});
    let bytes = to_canonical_json_bytes(&value).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"a":{"c":null,"d":[1,2]},"b":1}"#);
}

#[test]
fn canonical_bytes_sort_nested_objects_and_escape_keys() {
    let value = json!({"z\"q": [{"y": 1.5, "x": "\n"}], "": true});
    let bytes = to_canonical_json_bytes(&value).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        r#"{"":true,"z\"q":[{"x":"\n","y":1.5}]}"#
    );
}

#[test]
fn known_digest_of_empty_input() {
    assert_eq!(
        hash_bytes(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert!(prefixed("abc").starts_with("sha256:"));
}

#[test]
fn env_hash_tracks_versions() {
    let base = EnvFingerprint::minimal();
    let same = EnvFingerprint::minimal();
    assert_eq!(env_hash(&base).unwrap(), env_hash(&same).unwrap());
    let bumped = EnvFingerprint::minimal().with_version("numerics", "2.0");
    assert_ne!(env_hash(&base).unwrap(), env_hash(&bumped).unwrap());
}

proptest! {
    #[test]
    fn insertion_order_does_not_change_hash(entries in proptest::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8)) {
        let forward: Map<String, Value> = entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        let reverse: Map<String, Value> = entries.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();
        let a = hash_canonical_value(&json!({"outer": forward})).unwrap();
        let b = hash_canonical_value(&json!({"outer": reverse})).unwrap();
        prop_assert_eq!(a, b);
    }
}
