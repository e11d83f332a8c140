mod common;

use common::REPO_DESCRIPTOR;
use nodebind_proto::prost_reflect::{MessageDescriptor, Value};
use nodebind_proto::{
    decode_dynamic, deserialize, field_values, new_dynamic, serialize, to_static, DescriptorSet,
    Person, ProtoError, PERSON_FULL_NAME,
};
use nodebind_schema::{bind_inferred, SchemaError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use prost::Message;

fn person_descriptor() -> MessageDescriptor {
    DescriptorSet::load(REPO_DESCRIPTOR)
        .unwrap()
        .find_message_by_full_name(PERSON_FULL_NAME)
        .unwrap()
}

// ── Static round trips ───────────────────────────────────────────

#[test]
fn alex_round_trips() {
    let alex = Person::new("Alex", 20);
    let bytes = serialize(&alex).unwrap();
    let back: Person = deserialize(&bytes).unwrap();
    assert_eq!(back, alex);
}

#[test]
fn unknown_fields_are_skipped() {
    // field 9, varint 1
    let mut bytes = serialize(&Person::new("Alex", 20)).unwrap();
    bytes.extend_from_slice(&[0x48, 0x01]);
    let back: Person = deserialize(&bytes).unwrap();
    assert_eq!(back, Person::new("Alex", 20));
}

#[test]
fn truncated_message_fails() {
    let bytes = serialize(&Person::new("Alex", 20)).unwrap();
    let err = deserialize::<Person>(&bytes[..3]).unwrap_err();
    assert!(matches!(err, ProtoError::Decode(_)));
}

// ── Dynamic decoding ─────────────────────────────────────────────

#[test]
fn dynamic_decode_reads_alex() {
    let bytes = serialize(&Person::new("Alex", 20)).unwrap();
    let message = decode_dynamic(person_descriptor(), &bytes).unwrap();

    assert_eq!(
        field_values(&message),
        vec![(1, Value::String("Alex".into())), (2, Value::I32(20))]
    );
    assert_eq!(message.encode_to_vec(), bytes);
}

#[test]
fn dynamic_converts_to_static() {
    let bytes = serialize(&Person::new("Alex", 20)).unwrap();
    let message = decode_dynamic(person_descriptor(), &bytes).unwrap();
    let person: Person = to_static(&message).unwrap();
    assert_eq!(person, Person::new("Alex", 20));
}

#[test]
fn empty_dynamic_has_no_set_fields() {
    let message = new_dynamic(person_descriptor());
    assert!(field_values(&message).is_empty());
    assert!(message.encode_to_vec().is_empty());
}

#[test]
fn dynamic_decode_rejects_truncated_varint() {
    // tag for field 2 (age) with no value
    let bytes = [0x10];
    assert!(matches!(
        decode_dynamic(person_descriptor(), &bytes),
        Err(ProtoError::Decode(_))
    ));
}

#[test]
fn dynamic_message_cannot_be_bound_without_schema() {
    let bytes = serialize(&Person::new("Alex", 20)).unwrap();
    let message = decode_dynamic(person_descriptor(), &bytes).unwrap();

    let err = bind_inferred(&message).unwrap_err();
    assert!(matches!(err, SchemaError::Uninferable { .. }), "{err}");
}

proptest! {
    #[test]
    fn static_round_trip(name in ".{0,32}", age in any::<i32>()) {
        let person = Person::new(name, age);
        let back: Person = deserialize(&serialize(&person).unwrap()).unwrap();
        prop_assert_eq!(back, person);
    }

    #[test]
    fn dynamic_and_static_decode_agree(name in "[a-zA-Z ]{0,24}", age in any::<i32>()) {
        let bytes = serialize(&Person::new(name.clone(), age)).unwrap();
        let message = decode_dynamic(person_descriptor(), &bytes).unwrap();

        let decoded_name = message.get_field_by_number(1).unwrap();
        let decoded_age = message.get_field_by_number(2).unwrap();
        prop_assert_eq!(decoded_name.as_str(), Some(name.as_str()));
        prop_assert_eq!(decoded_age.as_i32(), Some(age));
        prop_assert_eq!(message.encode_to_vec(), bytes);
    }
}
