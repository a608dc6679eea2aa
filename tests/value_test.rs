use compact_str::CompactString;
use pardal::value::{
    error::RuntimeErrorKind,
    formatter::{DebugFormatter, ValueFormatter},
    DictionaryObject, KeyLedger, Value, MAX_ARRAY_GAP,
};
use proptest::prelude::*;

fn keys(dictionary: &DictionaryObject) -> Vec<String> {
    dictionary.keys().iter().map(|key| key.to_string()).collect()
}

#[test]
fn test_display() {
    assert_eq!(Value::Null.to_string(), "nulo");
    assert_eq!(Value::Boolean(true).to_string(), "verdadeiro");
    assert_eq!(Value::Number(2.5).to_string(), "2.5");
    assert_eq!(Value::Number(-0.0).to_string(), "0");
    assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    assert_eq!(
        Value::array(vec![Value::Number(1.0), Value::string("a"), Value::Null]).to_string(),
        "[1, a, nulo]"
    );
}

#[test]
fn test_verbose_display() {
    let formatter = DebugFormatter;
    assert_eq!(formatter.format(&Value::Null), "Null");
    assert_eq!(formatter.format(&Value::Number(1.5)), "Number(1.5)");
    assert_eq!(formatter.format(&Value::string("oi")), "String(\"oi\")");
    assert_eq!(
        formatter.format(&Value::array(vec![Value::Boolean(false)])),
        "Array([falso])"
    );
}

#[test]
fn test_type_mismatch_errors() {
    assert_eq!(
        Value::Boolean(true).subtract(&Value::Number(1.0)).unwrap_err(),
        RuntimeErrorKind::UnsupportedOperator {
            operator: "-",
            lhs: "Boolean",
            rhs: "Number",
        }
    );
    assert!(Value::Null.add(&Value::Null).is_err());
    assert!(Value::string("a").less_than(&Value::Number(1.0)).is_err());
    assert_eq!(
        Value::Number(1.0).as_boolean(),
        Err(RuntimeErrorKind::NonBoolean("Number"))
    );
}

#[test]
fn test_equality_is_by_identity_for_collections() {
    let array = Value::array(vec![]);
    assert!(array.is_equal(&array.clone()));
    assert!(!array.is_equal(&Value::array(vec![])));
    assert!(Value::string("a").is_equal(&Value::string("a")));
    assert!(Value::Null.is_not_equal(&Value::Boolean(false)));
}

#[test]
fn test_array_set_pads_and_splices() {
    let array = Value::array(vec![Value::Number(1.0)]);
    array
        .set(&Value::Number(3.0), Value::string("x"))
        .expect("Index is valid");
    assert_eq!(array.to_string(), "[1, nulo, nulo, x]");
    array
        .set(&Value::Number(0.0), Value::Null)
        .expect("Index is valid");
    assert_eq!(array.to_string(), "[nulo, nulo, x]");
    // Numeric strings index arrays as well.
    assert_eq!(
        array.get(&Value::string("2")).map(|value| value.to_string()),
        Ok("x".to_string())
    );
    assert!(array.set(&Value::Number(-1.0), Value::Null).is_err());
}

#[test]
fn test_array_padding_is_bounded() {
    let array = Value::array(vec![Value::Number(1.0)]);
    let far = Value::Number((MAX_ARRAY_GAP + 2) as f64);
    assert_eq!(
        array.set(&far, Value::Boolean(true)),
        Err(RuntimeErrorKind::IndexOutOfRange {
            index: MAX_ARRAY_GAP + 2,
            length: 1,
        })
    );
    // Indices beyond the range of `usize` saturate and are rejected the same way.
    assert!(matches!(
        array.set(&Value::Number(1.0e20), Value::Boolean(true)),
        Err(RuntimeErrorKind::IndexOutOfRange { length: 1, .. })
    ));
    assert_eq!(array.to_string(), "[1]");

    // Deleting or reading far past the end is not an error.
    array
        .set(&far, Value::Null)
        .expect("Deleting a missing element is a no-op");
    assert!(array.get(&far).is_ok_and(|value| value.is_null()));
}

#[test]
fn test_dictionary_keeps_insertion_order() {
    let dictionary = DictionaryObject::new();
    for key in ["c", "a", "b"] {
        dictionary.set_entry(key.into(), Value::Boolean(true));
    }
    dictionary.set_entry("a".into(), Value::Number(1.0));
    assert_eq!(keys(&dictionary), ["c", "a", "b"]);

    dictionary.set_entry("a".into(), Value::Null);
    dictionary.set_entry("a".into(), Value::Number(2.0));
    assert_eq!(keys(&dictionary), ["c", "b", "a"]);
    assert_eq!(dictionary.len(), 3);
    assert_eq!(dictionary.to_string(), "{[\"c\"] = verdadeiro, [\"b\"] = verdadeiro, [\"a\"] = 2}");
}

#[test]
fn test_iteration_sees_live_changes() {
    let dictionary = Value::dictionary([
        (CompactString::from("a"), Value::Number(1.0)),
        (CompactString::from("b"), Value::Number(2.0)),
    ]);
    let mut iterator = dictionary.start_iteration().expect("Dictionaries iterate");
    let first = iterator.next_entry();
    assert_eq!(first.index.map(|key| key.to_string()), Some("a".to_string()));

    // Appended while iterating, so it is still visited.
    dictionary
        .set(&Value::string("c"), Value::Number(3.0))
        .expect("Dictionaries accept any key");
    let rest: Vec<String> = iterator.map(|(key, _)| key.to_string()).collect();
    assert_eq!(rest, ["b", "c"]);
}

#[test]
fn test_deleting_pending_key_ends_iteration() {
    let dictionary = Value::dictionary([
        (CompactString::from("a"), Value::Number(1.0)),
        (CompactString::from("b"), Value::Number(2.0)),
        (CompactString::from("c"), Value::Number(3.0)),
    ]);
    let mut iterator = dictionary.start_iteration().expect("Dictionaries iterate");
    assert!(!iterator.next_entry().done);
    dictionary
        .set(&Value::string("b"), Value::Null)
        .expect("Dictionaries accept any key");
    assert!(iterator.next_entry().done);
}

#[test]
fn test_ledger_recycles_slots() {
    let mut ledger = KeyLedger::new();
    let a = ledger.insert("a".into());
    let b = ledger.insert("b".into());
    ledger.insert("c".into());
    assert_eq!(ledger.remove(b).as_deref(), Some("b"));
    assert_eq!(ledger.remove(b), None);
    assert_eq!(ledger.next_of(a).map(|key| key.as_str()), Some("c"));

    let d = ledger.insert("d".into());
    assert_eq!(d, b);
    let order: Vec<&str> = ledger.iter().map(|key| key.as_str()).collect();
    assert_eq!(order, ["a", "c", "d"]);
    assert_eq!(ledger.len(), 3);
}

proptest! {
    #[test]
    fn addition_matches_floats(a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6) {
        let sum = Value::Number(a).add(&Value::Number(b)).expect("Numbers add");
        prop_assert_eq!(sum.as_number(), Some(a + b));
    }

    #[test]
    fn concatenation_renders_numbers(text in "[a-z]{0,8}", n in any::<i32>()) {
        let left = Value::string(text.as_str()).add(&Value::Number(n.into())).expect("Strings concatenate");
        prop_assert_eq!(left.to_string(), format!("{text}{n}"));
        let right = Value::Number(n.into()).add(&Value::string(text.as_str())).expect("Strings concatenate");
        prop_assert_eq!(right.to_string(), format!("{n}{text}"));
    }

    #[test]
    fn ledger_matches_a_vec(operations in prop::collection::vec((any::<bool>(), 0u8..6), 0..64)) {
        let mut ledger = KeyLedger::new();
        let mut slots: Vec<(String, usize)> = Vec::new();
        for (insert, key) in operations {
            let key = key.to_string();
            let present = slots.iter().position(|(existing, _)| *existing == key);
            match (insert, present) {
                (true, None) => {
                    let slot = ledger.insert(key.as_str().into());
                    slots.push((key, slot));
                }
                (false, Some(position)) => {
                    let (_, slot) = slots.remove(position);
                    prop_assert_eq!(ledger.remove(slot).map(|k| k.to_string()), Some(key));
                }
                _ => {}
            }
        }
        let expected: Vec<&str> = slots.iter().map(|(key, _)| key.as_str()).collect();
        let actual: Vec<&str> = ledger.iter().map(|key| key.as_str()).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(ledger.len(), slots.len());
    }
}
