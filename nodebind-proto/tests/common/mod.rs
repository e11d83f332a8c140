#![allow(dead_code)]

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions,
};

pub const REPO_DESCRIPTOR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../model/descriptor.pb");

pub fn field(name: &str, number: i32, ty: Type, label: Label, type_name: Option<&str>) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.into()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        type_name: type_name.map(Into::into),
        json_name: Some(name.into()),
        ..Default::default()
    }
}

pub fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.into()),
        field: fields,
        ..Default::default()
    }
}

pub fn file(name: &str, package: &str, messages: Vec<DescriptorProto>) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.into()),
        package: Some(package.into()),
        message_type: messages,
        syntax: Some("proto3".into()),
        ..Default::default()
    }
}

/// Same layout as `model/person.proto`.
pub fn person_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![file(
            "person.proto",
            "model",
            vec![message(
                "Person",
                vec![
                    field("name", 1, Type::String, Label::Optional, None),
                    field("age", 2, Type::Int32, Label::Optional, None),
                ],
            )],
        )],
    }
}

/// `demo.Team` exercises nested messages, repeated fields, maps and enums:
///
/// ```proto
/// enum Level { LEVEL_UNSPECIFIED = 0; LEVEL_HIGH = 1; }
/// message Member { int64 id = 1; }
/// message Team {
///   string name = 1;
///   repeated Member members = 2;
///   map<string, int64> scores = 3;
///   Level level = 4;
///   Member lead = 5;
/// }
/// ```
pub fn team_set() -> FileDescriptorSet {
    let scores_entry = DescriptorProto {
        name: Some("ScoresEntry".into()),
        field: vec![
            field("key", 1, Type::String, Label::Optional, None),
            field("value", 2, Type::Int64, Label::Optional, None),
        ],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut team = message(
        "Team",
        vec![
            field("name", 1, Type::String, Label::Optional, None),
            field("members", 2, Type::Message, Label::Repeated, Some(".demo.Member")),
            field("scores", 3, Type::Message, Label::Repeated, Some(".demo.Team.ScoresEntry")),
            field("level", 4, Type::Enum, Label::Optional, Some(".demo.Level")),
            field("lead", 5, Type::Message, Label::Optional, Some(".demo.Member")),
        ],
    );
    team.nested_type.push(scores_entry);

    let level = EnumDescriptorProto {
        name: Some("Level".into()),
        value: vec![
            EnumValueDescriptorProto {
                name: Some("LEVEL_UNSPECIFIED".into()),
                number: Some(0),
                ..Default::default()
            },
            EnumValueDescriptorProto {
                name: Some("LEVEL_HIGH".into()),
                number: Some(1),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let mut team_file = file(
        "team.proto",
        "demo",
        vec![
            message("Member", vec![field("id", 1, Type::Int64, Label::Optional, None)]),
            team,
        ],
    );
    team_file.enum_type.push(level);

    FileDescriptorSet {
        file: vec![team_file],
    }
}

/// Two packages that both define `Foo`:
///
/// ```proto
/// // b.proto
/// package b;
/// message Foo { string z = 1; }
///
/// // a.proto
/// package a;
/// import "b.proto";
/// message Foo { b.Foo x = 1; int32 y = 2; }
/// ```
pub fn same_name_set() -> FileDescriptorSet {
    let b = file(
        "b.proto",
        "b",
        vec![message("Foo", vec![field("z", 1, Type::String, Label::Optional, None)])],
    );
    let mut a = file(
        "a.proto",
        "a",
        vec![message(
            "Foo",
            vec![
                field("x", 1, Type::Message, Label::Optional, Some(".b.Foo")),
                field("y", 2, Type::Int32, Label::Optional, None),
            ],
        )],
    );
    a.dependency.push("b.proto".into());
    FileDescriptorSet { file: vec![b, a] }
}

/// A message holding `google.protobuf.Any`, whose short name is also a
/// prelude kind:
///
/// ```proto
/// package h;
/// import "google/protobuf/any.proto";
/// message Holder { google.protobuf.Any payload = 1; }
/// ```
pub fn any_holder_set() -> FileDescriptorSet {
    let any = file(
        "google/protobuf/any.proto",
        "google.protobuf",
        vec![message(
            "Any",
            vec![
                field("type_url", 1, Type::String, Label::Optional, None),
                field("value", 2, Type::Bytes, Label::Optional, None),
            ],
        )],
    );
    let mut holder = file(
        "holder.proto",
        "h",
        vec![message(
            "Holder",
            vec![field(
                "payload",
                1,
                Type::Message,
                Label::Optional,
                Some(".google.protobuf.Any"),
            )],
        )],
    );
    holder.dependency.push("google/protobuf/any.proto".into());
    FileDescriptorSet {
        file: vec![any, holder],
    }
}
