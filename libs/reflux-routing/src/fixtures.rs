//! Descriptor fixtures for routing tests, built programmatically so the
//! tests carry no generated code.

use prost_reflect::{DescriptorPool, DynamicMessage, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};

pub(crate) fn pool() -> DescriptorPool {
    let file = FileDescriptorProto {
        name: Some("fixtures.proto".to_string()),
        package: Some("fixture".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            message("Simple", vec![scalar("name", 1, Type::String)]),
            message("Root", vec![nested("foo", 1, ".fixture.Foo")]),
            message("Foo", vec![nested("bar", 1, ".fixture.Bar")]),
            message("Bar", vec![scalar("baz", 1, Type::String)]),
            message("Batch", vec![repeated_nested("foo", 1, ".fixture.Entry")]),
            message("Entry", vec![repeated_scalar("bar", 1, Type::String)]),
            message(
                "Metrics",
                vec![
                    scalar("count", 1, Type::Uint64),
                    scalar("ratio", 2, Type::Double),
                    scalar("live", 3, Type::Bool),
                ],
            ),
        ],
        ..Default::default()
    };

    DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] })
        .expect("fixture descriptors are valid")
}

pub(crate) fn simple(pool: &DescriptorPool, name: &str) -> DynamicMessage {
    let desc = pool.get_message_by_name("fixture.Simple").unwrap();
    let mut msg = DynamicMessage::new(desc);
    msg.set_field_by_name("name", Value::String(name.to_string()));
    msg
}

pub(crate) fn nested_root(pool: &DescriptorPool, baz: &str) -> DynamicMessage {
    let mut bar = DynamicMessage::new(pool.get_message_by_name("fixture.Bar").unwrap());
    bar.set_field_by_name("baz", Value::String(baz.to_string()));

    let mut foo = DynamicMessage::new(pool.get_message_by_name("fixture.Foo").unwrap());
    foo.set_field_by_name("bar", Value::Message(bar));

    let mut root = DynamicMessage::new(pool.get_message_by_name("fixture.Root").unwrap());
    root.set_field_by_name("foo", Value::Message(foo));
    root
}

pub(crate) fn batch_with_one_entry(pool: &DescriptorPool) -> DynamicMessage {
    let entry = DynamicMessage::new(pool.get_message_by_name("fixture.Entry").unwrap());

    let mut batch = DynamicMessage::new(pool.get_message_by_name("fixture.Batch").unwrap());
    batch.set_field_by_name("foo", Value::List(vec![Value::Message(entry)]));
    batch
}

pub(crate) fn metrics(
    pool: &DescriptorPool,
    count: u64,
    ratio: f64,
    live: bool,
) -> DynamicMessage {
    let desc = pool.get_message_by_name("fixture.Metrics").unwrap();
    let mut msg = DynamicMessage::new(desc);
    msg.set_field_by_name("count", Value::U64(count));
    msg.set_field_by_name("ratio", Value::F64(ratio));
    msg.set_field_by_name("live", Value::Bool(live));
    msg
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

fn field(name: &str, number: i32, label: Label, r#type: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(r#type as i32),
        ..Default::default()
    }
}

fn scalar(name: &str, number: i32, r#type: Type) -> FieldDescriptorProto {
    field(name, number, Label::Optional, r#type)
}

fn repeated_scalar(name: &str, number: i32, r#type: Type) -> FieldDescriptorProto {
    field(name, number, Label::Repeated, r#type)
}

fn nested(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, Label::Optional, Type::Message)
    }
}

fn repeated_nested(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, Label::Repeated, Type::Message)
    }
}
