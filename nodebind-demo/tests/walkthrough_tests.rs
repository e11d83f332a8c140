use std::path::PathBuf;

use nodebind_demo::{
    encode_plain, encode_translated, report_schemaless_bind, round_trip_person, run, Config,
    PlainPerson,
};
use nodebind_proto::{decode_dynamic, serialize, DescriptorSet, Person, ProtoError};
use nodebind_schema::dagjson::{EncodeOptions, MapSortMode};
use nodebind_schema::SchemaError;
use pretty_assertions::assert_eq;

fn repo_config() -> Config {
    Config {
        descriptor_set: PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../model/descriptor.pb"
        )),
        ..Config::default()
    }
}

fn run_to_string(config: &Config) -> anyhow::Result<String> {
    let mut out = Vec::new();
    run(config, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn alex_dynamic() -> nodebind_proto::prost_reflect::DynamicMessage {
    let set = DescriptorSet::load(&repo_config().descriptor_set).unwrap();
    let descriptor = set.find_message_by_full_name("model.Person").unwrap();
    decode_dynamic(descriptor, &serialize(&Person::new("Alex", 20)).unwrap()).unwrap()
}

// ── Full run ─────────────────────────────────────────────────────

#[test]
fn walkthrough_output() {
    let output = run_to_string(&repo_config()).unwrap();
    let lines: Vec<_> = output.lines().collect();

    assert_eq!(lines[0], r#"{"Name":"Michael","Friends":["Sarah","Alex"]}"#);
    assert_eq!(lines[1], r#"Original person: Person { name: "Alex", age: 20 }"#);
    assert_eq!(lines[2], r#"Deserialized person: Person { name: "Alex", age: 20 }"#);
    assert!(output.contains("File path: person.proto\nPackage name: model\nMessages: [Person]"));
    assert!(output.contains(
        "Person message descriptor: model.Person { name = 1: string, age = 2: int32 }"
    ));
    assert!(output.contains("Deserialized dynamic person: "));
    assert!(output.contains("Schema-less binding failed: "));
    assert_eq!(lines.last(), Some(&r#"{"age":20,"name":"Alex"}"#));
}

#[test]
fn insertion_order_keeps_descriptor_order() {
    let config = Config {
        sort_keys: false,
        ..repo_config()
    };
    let output = run_to_string(&config).unwrap();
    assert_eq!(output.lines().last(), Some(r#"{"name":"Alex","age":20}"#));
}

#[test]
fn missing_descriptor_set_fails() {
    let config = Config {
        descriptor_set: PathBuf::from("does/not/exist.pb"),
        ..Config::default()
    };
    let err = run_to_string(&config).unwrap_err();
    assert!(format!("{err:#}").contains("does/not/exist.pb"));
    assert!(matches!(
        err.downcast_ref::<ProtoError>(),
        Some(ProtoError::Io { .. })
    ));
}

#[test]
fn unknown_file_fails() {
    let config = Config {
        proto_file: "animal.proto".into(),
        ..repo_config()
    };
    let err = run_to_string(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProtoError>(),
        Some(ProtoError::FileNotFound(_))
    ));
}

#[test]
fn unknown_message_fails() {
    let config = Config {
        message: "Animal".into(),
        ..repo_config()
    };
    let err = run_to_string(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProtoError>(),
        Some(ProtoError::MessageNotFound { .. })
    ));
}

// ── Individual steps ─────────────────────────────────────────────

#[test]
fn plain_person_with_age() {
    let person = PlainPerson {
        age: Some(41),
        ..PlainPerson::michael()
    };
    let mut out = Vec::new();
    encode_plain(&person, EncodeOptions::default(), &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\"Age\":41,\"Name\":\"Michael\",\"Friends\":[\"Sarah\",\"Alex\"]}\n"
    );
}

#[test]
fn plain_person_in_insertion_order() {
    let person = PlainPerson {
        age: Some(41),
        ..PlainPerson::michael()
    };
    let options = EncodeOptions {
        map_sort: MapSortMode::Insertion,
    };
    let mut out = Vec::new();
    encode_plain(&person, options, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\"Name\":\"Michael\",\"Age\":41,\"Friends\":[\"Sarah\",\"Alex\"]}\n"
    );
}

#[test]
fn round_trip_returns_wire_bytes() {
    let mut out = Vec::new();
    let bytes = round_trip_person(&Person::new("Alex", 20), &mut out).unwrap();
    assert_eq!(bytes, b"\x0a\x04Alex\x10\x14");
}

#[test]
fn schemaless_bind_reports_uninferable() {
    let mut out = Vec::new();
    let err = report_schemaless_bind(&alex_dynamic(), &mut out).unwrap();
    assert!(matches!(err, SchemaError::Uninferable { .. }));
    assert!(String::from_utf8(out).unwrap().starts_with("Schema-less binding failed: "));
}

#[test]
fn translated_bind_encodes_alex() {
    let mut out = Vec::new();
    encode_translated(&alex_dynamic(), EncodeOptions::default(), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "{\"age\":20,\"name\":\"Alex\"}\n");
}
