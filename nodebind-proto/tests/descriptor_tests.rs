mod common;

use common::{field, file, message, person_set, REPO_DESCRIPTOR};
use nodebind_proto::{
    describe_file, describe_message, field_type_name, find_message, parse_descriptor_set,
    DescriptorSet, ProtoError, PERSON_FULL_NAME,
};
use pretty_assertions::assert_eq;
use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::FileDescriptorSet;

// ── Loading ──────────────────────────────────────────────────────

#[test]
fn repo_descriptor_set_resolves() {
    let set = DescriptorSet::load(REPO_DESCRIPTOR).unwrap();
    assert_eq!(set.files().len(), 1);

    let file = set.find_file("person.proto").unwrap();
    assert_eq!(file.package_name(), "model");

    let person = find_message(&file, "Person").unwrap();
    assert_eq!(person.full_name(), PERSON_FULL_NAME);
}

#[test]
fn repo_descriptor_matches_the_built_set() {
    let bytes = std::fs::read(REPO_DESCRIPTOR).unwrap();
    assert_eq!(parse_descriptor_set(&bytes).unwrap(), person_set());
}

#[test]
fn load_from_written_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("set.pb");
    std::fs::write(&path, person_set().encode_to_vec()).unwrap();

    let set = DescriptorSet::load(&path).unwrap();
    assert!(set.find_message_by_full_name("model.Person").is_ok());
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.pb");

    let err = DescriptorSet::load(&path).unwrap_err();
    match &err {
        ProtoError::Io { path: reported, .. } => assert_eq!(reported, &path),
        other => panic!("expected Io, got {other:?}"),
    }
    assert!(err.to_string().contains("absent.pb"));
}

#[test]
fn truncated_bytes_fail_to_decode() {
    let mut bytes = person_set().encode_to_vec();
    bytes.truncate(bytes.len() / 2);
    assert!(matches!(
        DescriptorSet::from_bytes(&bytes),
        Err(ProtoError::Decode(_))
    ));
}

#[test]
fn unresolved_type_reference_fails() {
    let set = FileDescriptorSet {
        file: vec![file(
            "broken.proto",
            "broken",
            vec![message(
                "Holder",
                vec![field("inner", 1, Type::Message, Label::Optional, Some(".broken.Missing"))],
            )],
        )],
    };
    assert!(matches!(
        DescriptorSet::from_file_descriptor_set(set),
        Err(ProtoError::Resolution(_))
    ));
}

#[test]
fn missing_import_fails() {
    let mut importer = file("importer.proto", "importer", vec![]);
    importer.dependency.push("missing.proto".into());
    let set = FileDescriptorSet {
        file: vec![importer],
    };
    assert!(matches!(
        DescriptorSet::from_file_descriptor_set(set),
        Err(ProtoError::Resolution(_))
    ));
}

// ── Lookups ──────────────────────────────────────────────────────

#[test]
fn unknown_file_is_not_found() {
    let set = DescriptorSet::from_file_descriptor_set(person_set()).unwrap();
    let err = set.find_file("other.proto").unwrap_err();
    assert!(matches!(err, ProtoError::FileNotFound(ref name) if name == "other.proto"));
}

#[test]
fn unknown_message_is_not_found() {
    let set = DescriptorSet::from_file_descriptor_set(person_set()).unwrap();
    let file = set.find_file("person.proto").unwrap();

    let err = find_message(&file, "Animal").unwrap_err();
    assert_eq!(
        err.to_string(),
        "message `Animal` not found in file `person.proto`"
    );
    assert!(set.find_message_by_full_name("model.Animal").is_err());
}

// ── Rendering ────────────────────────────────────────────────────

#[test]
fn describe_person_file() {
    let set = DescriptorSet::load(REPO_DESCRIPTOR).unwrap();
    let file = set.find_file("person.proto").unwrap();
    assert_eq!(
        describe_file(&file),
        "File path: person.proto\nPackage name: model\nMessages: [Person]"
    );
    let person = find_message(&file, "Person").unwrap();
    assert_eq!(
        describe_message(&person),
        "model.Person { name = 1: string, age = 2: int32 }"
    );
}

#[test]
fn field_type_names_for_compound_fields() {
    let set = DescriptorSet::from_file_descriptor_set(common::team_set()).unwrap();
    let team = set.find_message_by_full_name("demo.Team").unwrap();

    let names: Vec<_> = team.fields().map(|f| field_type_name(&f)).collect();
    assert_eq!(
        names,
        vec![
            "string",
            "repeated demo.Member",
            "map<string, int64>",
            "demo.Level",
            "demo.Member",
        ]
    );
}
