//! Black-box coverage of the pack/unpack engine against the scenarios a declarative binary
//! struct codec is expected to handle: primitive layout, alignment padding, inline nesting,
//! length-coupled arrays, default-filled optional records, conditional fields, and the
//! batch/list operations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use abi_codec::enum_def::EnumDef;
use abi_codec::field::{ArrayElementKind, FieldDef, FieldKind, ValidationContext};
use abi_codec::host::NativeHost;
use abi_codec::pack::PackOptions;
use abi_codec::primitive::PrimitiveKind;
use abi_codec::schema::SchemaBuilder;
use abi_codec::unpack::UnpackOptions;
use abi_codec::value::{Object, Value};
use abi_codec::CodecError;

fn obj(pairs: Vec<(&str, Value)>) -> Value {
    let mut o = Object::new();
    for (k, v) in pairs {
        o.insert(k.to_owned(), v);
    }
    Value::Object(o)
}

#[test]
fn s1_primitive_round_trip() {
    let schema = SchemaBuilder::new("S1")
        .field(FieldDef::new("id", FieldKind::Primitive(PrimitiveKind::U32)))
        .field(FieldDef::new("age", FieldKind::Primitive(PrimitiveKind::U8)))
        .field(FieldDef::new("score", FieldKind::Primitive(PrimitiveKind::F32)))
        .field(FieldDef::new("count", FieldKind::Primitive(PrimitiveKind::U64)))
        .field(FieldDef::new("active", FieldKind::Primitive(PrimitiveKind::BoolU32)))
        .build()
        .unwrap();

    assert_eq!(schema.align(), 8);

    let input = obj(vec![
        ("id", Value::UInt(12345)),
        ("age", Value::UInt(25)),
        ("score", Value::Float(98.5)),
        ("count", Value::UInt(9_007_199_254_740_991)),
        ("active", Value::Bool(true)),
    ]);

    let packed = schema.pack(&input, PackOptions::default()).unwrap();
    assert_eq!(packed.bytes.len(), schema.size());

    let decoded = schema.unpack(&packed.bytes, UnpackOptions::default()).unwrap();
    let out = decoded.as_object().unwrap();
    assert_eq!(out.get("id").unwrap().as_u64(), Some(12345));
    assert_eq!(out.get("age").unwrap().as_u64(), Some(25));
    match out.get("score").unwrap() {
        Value::Float(f) => assert!((f - 98.5).abs() < 1e-4),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(out.get("count").unwrap().as_u64(), Some(9_007_199_254_740_991));
    assert_eq!(out.get("active").unwrap().as_bool(), Some(true));
}

#[test]
fn s2_alignment_driven_padding() {
    let schema = SchemaBuilder::new("S2")
        .field(FieldDef::new("a", FieldKind::Primitive(PrimitiveKind::U8)))
        .field(FieldDef::new("b", FieldKind::Primitive(PrimitiveKind::U32)))
        .field(FieldDef::new("c", FieldKind::Primitive(PrimitiveKind::U8)))
        .build()
        .unwrap();

    assert_eq!(schema.size(), 12);
    assert_eq!(schema.align(), 4);
    assert_eq!(schema.field("a").unwrap().offset(), 0);
    assert_eq!(schema.field("b").unwrap().offset(), 4);
    assert_eq!(schema.field("c").unwrap().offset(), 8);
}

fn vec3_schema() -> Arc<abi_codec::schema::Schema> {
    Arc::new(
        SchemaBuilder::new("Vec3")
            .field(FieldDef::new("x", FieldKind::Primitive(PrimitiveKind::F32)))
            .field(FieldDef::new("y", FieldKind::Primitive(PrimitiveKind::F32)))
            .field(FieldDef::new("z", FieldKind::Primitive(PrimitiveKind::F32)))
            .build()
            .unwrap(),
    )
}

fn vec2_schema() -> Arc<abi_codec::schema::Schema> {
    Arc::new(
        SchemaBuilder::new("Vec2")
            .field(FieldDef::new("x", FieldKind::Primitive(PrimitiveKind::F32)))
            .field(FieldDef::new("y", FieldKind::Primitive(PrimitiveKind::F32)))
            .build()
            .unwrap(),
    )
}

#[test]
fn s3_inline_nested_round_trip() {
    let vec3 = vec3_schema();
    let vec2 = vec2_schema();
    assert_eq!(vec3.size(), 12);
    assert_eq!(vec2.size(), 8);

    let transform = SchemaBuilder::new("Transform")
        .field(FieldDef::new("position", FieldKind::NestedInline(vec3)))
        .field(FieldDef::new("scale", FieldKind::NestedInline(vec2)))
        .field(FieldDef::new("rotation", FieldKind::Primitive(PrimitiveKind::F32)))
        .build()
        .unwrap();

    assert_eq!(transform.size(), 24);
    assert_eq!(transform.align(), 4);

    let input = obj(vec![
        (
            "position",
            obj(vec![
                ("x", Value::Float(10.0)),
                ("y", Value::Float(20.0)),
                ("z", Value::Float(30.0)),
            ]),
        ),
        ("scale", obj(vec![("x", Value::Float(2.0)), ("y", Value::Float(2.0))])),
        ("rotation", Value::Float(45.0)),
    ]);

    let packed = transform.pack(&input, PackOptions::default()).unwrap();
    let decoded = transform.unpack(&packed.bytes, UnpackOptions::default()).unwrap();
    let out = decoded.as_object().unwrap();
    let position = out.get("position").unwrap().as_object().unwrap();
    assert_eq!(position.get("z").unwrap().as_f64(), Some(30.0));
    let scale = out.get("scale").unwrap().as_object().unwrap();
    assert_eq!(scale.get("x").unwrap().as_f64(), Some(2.0));
    assert_eq!(out.get("rotation").unwrap().as_f64(), Some(45.0));
}

#[test]
fn s4_length_coupled_enum_array() {
    let color = Arc::new(
        EnumDef::new(
            "Color",
            PrimitiveKind::U32,
            vec![("RED", 0), ("GREEN", 1), ("BLUE", 2)],
        )
        .unwrap(),
    );

    let schema = SchemaBuilder::new("Palette")
        .field(
            FieldDef::new("colorCount", FieldKind::Primitive(PrimitiveKind::U32))
                .length_of("colors"),
        )
        .field(FieldDef::new(
            "colors",
            FieldKind::Array {
                element: ArrayElementKind::Enum(color),
            },
        ))
        .build()
        .unwrap();

    let input = obj(vec![(
        "colors",
        Value::Array(vec![
            Value::Str("RED".to_owned()),
            Value::Str("GREEN".to_owned()),
            Value::Str("BLUE".to_owned()),
        ]),
    )]);

    let packed = schema.pack(&input, PackOptions::default()).unwrap();
    assert_eq!(&packed.bytes[0..4], &3u32.to_le_bytes());
    assert_eq!(packed.sub_buffers.len(), 1);
    assert_eq!(
        &packed.sub_buffers[0][..],
        &[0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0][..]
    );

    let decoded = schema.unpack(&packed.bytes, UnpackOptions::default()).unwrap();
    let colors = decoded.as_object().unwrap().get("colors").unwrap().as_array().unwrap();
    assert_eq!(colors.len(), 3);
    assert_eq!(colors[1].as_str(), Some("GREEN"));
}

#[test]
fn s5_optional_empty_sub_record_applies_defaults() {
    let sampler = Arc::new(
        SchemaBuilder::new("Sampler")
            .field(FieldDef::new("type", FieldKind::Primitive(PrimitiveKind::U32)).default(Value::UInt(2)))
            .build()
            .unwrap(),
    );

    let entry = SchemaBuilder::new("Entry")
        .field(FieldDef::new("binding", FieldKind::Primitive(PrimitiveKind::U32)))
        .field(FieldDef::new("sampler", FieldKind::NestedInline(sampler)).optional())
        .build()
        .unwrap();

    let input = obj(vec![("binding", Value::UInt(1)), ("sampler", obj(vec![]))]);
    let packed = entry.pack(&input, PackOptions::default()).unwrap();
    assert_eq!(&packed.bytes[..], &[1, 0, 0, 0, 2, 0, 0, 0]);
}

#[test]
fn s6_conditional_field_excluded() {
    let schema = SchemaBuilder::new("S6")
        .field(FieldDef::new("v", FieldKind::Primitive(PrimitiveKind::U32)))
        .field(FieldDef::new("flag", FieldKind::Primitive(PrimitiveKind::U32)))
        .field(
            FieldDef::new("experimental", FieldKind::Primitive(PrimitiveKind::U32))
                .default(Value::UInt(0xffff))
                .condition(false),
        )
        .field(FieldDef::new("timeout", FieldKind::Primitive(PrimitiveKind::U32)))
        .build()
        .unwrap();

    assert_eq!(schema.describe().len(), 3);
    assert_eq!(schema.size(), 12);
}

#[test]
fn s7_pack_list_equals_pack_into_composition() {
    let schema = SchemaBuilder::new("S7")
        .field(FieldDef::new("a", FieldKind::Primitive(PrimitiveKind::U32)))
        .field(FieldDef::new("b", FieldKind::Primitive(PrimitiveKind::U16)))
        .build()
        .unwrap();

    let items = vec![
        obj(vec![("a", Value::UInt(1)), ("b", Value::UInt(10))]),
        obj(vec![("a", Value::UInt(2)), ("b", Value::UInt(20))]),
        obj(vec![("a", Value::UInt(3)), ("b", Value::UInt(30))]),
    ];

    let listed = schema.pack_list(&items, PackOptions::default()).unwrap();

    let mut composed = vec![0u8; schema.size() * items.len()];
    for (i, item) in items.iter().enumerate() {
        schema
            .pack_into(item, &mut composed, i * schema.size(), PackOptions::default())
            .unwrap();
    }

    assert_eq!(listed.bytes, composed);
}

#[test]
fn missing_required_field_is_rejected() {
    let schema = SchemaBuilder::new("Required")
        .field(FieldDef::new("id", FieldKind::Primitive(PrimitiveKind::U32)))
        .build()
        .unwrap();

    let err = schema.pack(&obj(vec![]), PackOptions::default()).unwrap_err();
    assert!(matches!(err, CodecError::MissingRequiredField { field } if field == "id"));
}

#[test]
fn buffer_too_small_is_rejected() {
    let schema = SchemaBuilder::new("Small")
        .field(FieldDef::new("id", FieldKind::Primitive(PrimitiveKind::U64)))
        .build()
        .unwrap();

    let err = schema.unpack(&[0u8; 4], UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, CodecError::BufferTooSmall { needed: 8, actual: 4 }));
}

#[test]
fn null_address_with_nonzero_length_is_rejected_on_unpack() {
    let schema = SchemaBuilder::new("Lengths")
        .field(
            FieldDef::new("count", FieldKind::Primitive(PrimitiveKind::U32))
                .length_of("items"),
        )
        .field(FieldDef::new(
            "items",
            FieldKind::Array {
                element: ArrayElementKind::Primitive(PrimitiveKind::U32),
            },
        ))
        .build()
        .unwrap();

    let mut buf = vec![0u8; schema.size()];
    buf[0..4].copy_from_slice(&3u32.to_le_bytes());

    let err = schema.unpack(&buf, UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, CodecError::NullPointerNonzeroLength { length: 3, .. }));
}

#[test]
fn tag_after_payload_preserves_absent_vs_zero() {
    let schema = SchemaBuilder::new("Tagged")
        .tag_after_payload(true)
        .field(FieldDef::new("v", FieldKind::Primitive(PrimitiveKind::U32)).optional())
        .build()
        .unwrap();

    let present_zero = schema.pack(&obj(vec![("v", Value::UInt(0))]), PackOptions::default()).unwrap();
    let absent = schema.pack(&obj(vec![]), PackOptions::default()).unwrap();

    let decoded_zero = schema.unpack(&present_zero.bytes, UnpackOptions::default()).unwrap();
    let decoded_absent = schema.unpack(&absent.bytes, UnpackOptions::default()).unwrap();

    assert_eq!(
        decoded_zero.as_object().unwrap().get("v").unwrap().as_u64(),
        Some(0)
    );
    assert!(decoded_absent.as_object().unwrap().get("v").unwrap().is_null());
}

#[test]
fn validator_rejects_before_pack_writes_anything() {
    let schema = SchemaBuilder::new("Validated")
        .field(
            FieldDef::new("age", FieldKind::Primitive(PrimitiveKind::U8)).validate(
                |v, field, _ctx: ValidationContext<'_>| {
                    if v.as_u64().unwrap_or(0) > 150 {
                        Err(CodecError::Rejected {
                            field: field.to_owned(),
                            message: "age out of range".to_owned(),
                        })
                    } else {
                        Ok(())
                    }
                },
            ),
        )
        .build()
        .unwrap();

    let err = schema
        .pack(&obj(vec![("age", Value::UInt(200))]), PackOptions::default())
        .unwrap_err();
    assert!(matches!(err, CodecError::Validation { field, .. } if field == "age"));
}

#[test]
fn cstring_and_opaque_pointer_round_trip_addresses() {
    let schema = SchemaBuilder::new("Strings")
        .field(FieldDef::new("name", FieldKind::CString))
        .field(FieldDef::new("handle", FieldKind::OpaquePointer))
        .build()
        .unwrap();

    let input = obj(vec![
        ("name", Value::Str("widget".to_owned())),
        ("handle", Value::Address(0xdead_beef)),
    ]);

    let packed = schema.pack(&input, PackOptions::default()).unwrap();
    assert_eq!(packed.sub_buffers.len(), 1);
    assert_eq!(packed.sub_buffers[0].last(), Some(&0u8));

    let host = NativeHost;
    let decoded = schema
        .unpack(&packed.bytes, UnpackOptions { host: Some(&host) })
        .unwrap();
    let out = decoded.as_object().unwrap();
    assert!(matches!(out.get("name").unwrap(), Value::Address(a) if *a != 0));
    assert_eq!(out.get("handle").unwrap(), &Value::Address(0xdead_beef));
}

#[test]
fn alloc_pre_populates_array_slot_and_count() {
    let schema = SchemaBuilder::new("Buffer")
        .field(
            FieldDef::new("len", FieldKind::Primitive(PrimitiveKind::U32))
                .length_of("data"),
        )
        .field(FieldDef::new(
            "data",
            FieldKind::Array {
                element: ArrayElementKind::Primitive(PrimitiveKind::U8),
            },
        ))
        .build()
        .unwrap();

    let mut lengths = Object::new();
    lengths.insert("data".to_owned(), Value::UInt(16));

    let allocated = schema.alloc(&lengths, PackOptions::default()).unwrap();
    assert_eq!(&allocated.bytes[0..4], &16u32.to_le_bytes());
    assert_eq!(allocated.sub_buffers.len(), 1);
    assert_eq!(allocated.sub_buffers[0].len(), 16);
    assert!(allocated.sub_buffers[0].iter().all(|&b| b == 0));
}

#[test]
fn describe_reports_field_layout() {
    let schema = SchemaBuilder::new("Described")
        .field(FieldDef::new("x", FieldKind::Primitive(PrimitiveKind::I32)))
        .field(FieldDef::new("y", FieldKind::Primitive(PrimitiveKind::I32)))
        .build()
        .unwrap();

    let fields = schema.describe();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "x");
    assert_eq!(fields[0].kind, "primitive(i32)");
    assert_eq!(fields[1].offset, 4);
}

#[test]
fn nested_inline_absent_skips_recursion_instead_of_packing_defaults() {
    // Regression test: the nested schema below has a *required* field with no default, so if
    // `pack` ever recursed into it with a synthesized empty object, this would fail with
    // `MissingRequiredField` even though the outer field was never supplied at all.
    let sampler = Arc::new(
        SchemaBuilder::new("Sampler")
            .field(FieldDef::new("kind", FieldKind::Primitive(PrimitiveKind::U32)))
            .build()
            .unwrap(),
    );

    let entry = SchemaBuilder::new("Entry")
        .field(FieldDef::new("binding", FieldKind::Primitive(PrimitiveKind::U32)))
        .field(FieldDef::new("sampler", FieldKind::NestedInline(sampler)).optional())
        .build()
        .unwrap();

    let packed = entry
        .pack(&obj(vec![("binding", Value::UInt(7))]), PackOptions::default())
        .unwrap();

    assert_eq!(&packed.bytes[0..4], &7u32.to_le_bytes());
    assert_eq!(&packed.bytes[4..8], &[0, 0, 0, 0]);
}

#[test]
fn map_optional_inline_runs_nested_map_value_even_when_absent() {
    let sampler = Arc::new(
        SchemaBuilder::new("Sampler")
            .field(FieldDef::new("kind", FieldKind::Primitive(PrimitiveKind::U32)))
            .map_value(|_| obj(vec![("kind", Value::UInt(9))]))
            .build()
            .unwrap(),
    );

    let entry = SchemaBuilder::new("Entry")
        .field(FieldDef::new("binding", FieldKind::Primitive(PrimitiveKind::U32)))
        .field(
            FieldDef::new("sampler", FieldKind::NestedInline(sampler))
                .optional()
                .map_optional_inline(),
        )
        .build()
        .unwrap();

    let packed = entry
        .pack(&obj(vec![("binding", Value::UInt(7))]), PackOptions::default())
        .unwrap();

    assert_eq!(&packed.bytes[0..4], &7u32.to_le_bytes());
    assert_eq!(&packed.bytes[4..8], &9u32.to_le_bytes());
}

#[test]
fn nested_pointer_round_trip() {
    let vec2 = vec2_schema();
    let schema = SchemaBuilder::new("Sprite")
        .field(FieldDef::new("origin", FieldKind::NestedPointer(vec2)).optional())
        .build()
        .unwrap();

    let present = obj(vec![("origin", obj(vec![("x", Value::Float(1.5)), ("y", Value::Float(-2.5))]))]);
    let packed = schema.pack(&present, PackOptions::default()).unwrap();
    assert_eq!(packed.sub_buffers.len(), 1);

    let host = NativeHost;
    let decoded = schema
        .unpack(&packed.bytes, UnpackOptions { host: Some(&host) })
        .unwrap();
    let origin = decoded.as_object().unwrap().get("origin").unwrap().as_object().unwrap();
    assert_eq!(origin.get("x").unwrap().as_f64(), Some(1.5));
    assert_eq!(origin.get("y").unwrap().as_f64(), Some(-2.5));

    let absent = schema.pack(&obj(vec![]), PackOptions::default()).unwrap();
    assert!(absent.sub_buffers.is_empty());
    let decoded_absent = schema
        .unpack(&absent.bytes, UnpackOptions { host: Some(&host) })
        .unwrap();
    assert!(decoded_absent.as_object().unwrap().get("origin").unwrap().is_null());
}

#[test]
fn pack_transform_and_unpack_transform_round_trip() {
    let schema = SchemaBuilder::new("FixedPoint")
        .field(
            FieldDef::new("value", FieldKind::Primitive(PrimitiveKind::I32))
                .pack_transform(|v| {
                    let tenths = (v.as_f64().unwrap_or(0.0) * 10.0).round() as i64;
                    Ok(Value::Int(tenths))
                })
                .unpack_transform(|v| {
                    let tenths = v.as_i64().unwrap_or(0);
                    Ok(Value::Float(tenths as f64 / 10.0))
                }),
        )
        .build()
        .unwrap();

    let packed = schema
        .pack(&obj(vec![("value", Value::Float(4.2))]), PackOptions::default())
        .unwrap();
    assert_eq!(&packed.bytes[..], &42i32.to_le_bytes());

    let decoded = schema.unpack(&packed.bytes, UnpackOptions::default()).unwrap();
    match decoded.as_object().unwrap().get("value").unwrap() {
        Value::Float(f) => assert!((f - 4.2).abs() < 1e-9),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn map_value_and_reduce_value_applied() {
    let schema = SchemaBuilder::new("Mapped")
        .field(FieldDef::new("x", FieldKind::Primitive(PrimitiveKind::U32)))
        .map_value(|v| {
            let legacy = v
                .as_object()
                .and_then(|o| o.get("legacy"))
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            obj(vec![("x", Value::UInt(legacy))])
        })
        .reduce_value(|v| match v {
            Value::Object(mut o) => {
                let x = o.get("x").and_then(|v| v.as_u64()).unwrap_or(0);
                o.insert("doubled".to_owned(), Value::UInt(x * 2));
                Value::Object(o)
            }
            other => other,
        })
        .build()
        .unwrap();

    let packed = schema
        .pack(&obj(vec![("legacy", Value::UInt(21))]), PackOptions::default())
        .unwrap();
    assert_eq!(&packed.bytes[..], &21u32.to_le_bytes());

    let decoded = schema.unpack(&packed.bytes, UnpackOptions::default()).unwrap();
    let out = decoded.as_object().unwrap();
    assert_eq!(out.get("x").unwrap().as_u64(), Some(21));
    assert_eq!(out.get("doubled").unwrap().as_u64(), Some(42));
}

#[test]
fn validator_short_circuits_on_first_rejection() {
    let v1_calls = Arc::new(AtomicUsize::new(0));
    let v2_calls = Arc::new(AtomicUsize::new(0));
    let v3_calls = Arc::new(AtomicUsize::new(0));

    let (c1, c2, c3) = (v1_calls.clone(), v2_calls.clone(), v3_calls.clone());
    let schema = SchemaBuilder::new("Ordered")
        .field(
            FieldDef::new("age", FieldKind::Primitive(PrimitiveKind::U8))
                .validate(move |_, _, _ctx: ValidationContext<'_>| {
                    c1.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .validate(move |_, field, _ctx: ValidationContext<'_>| {
                    c2.fetch_add(1, Ordering::SeqCst);
                    Err(CodecError::Rejected {
                        field: field.to_owned(),
                        message: "always rejects".to_owned(),
                    })
                })
                .validate(move |_, _, _ctx: ValidationContext<'_>| {
                    c3.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
        )
        .build()
        .unwrap();

    let err = schema
        .pack(&obj(vec![("age", Value::UInt(30))]), PackOptions::default())
        .unwrap_err();
    assert!(matches!(err, CodecError::Validation { field, .. } if field == "age"));

    assert_eq!(v1_calls.load(Ordering::SeqCst), 1);
    assert_eq!(v2_calls.load(Ordering::SeqCst), 1);
    assert_eq!(v3_calls.load(Ordering::SeqCst), 0, "validator after the first rejection must not run");
}

#[test]
fn validation_hints_reach_validators_at_every_nesting_depth_and_inside_arrays() {
    let seen_tokens: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let leaf_seen = seen_tokens.clone();
    let leaf = Arc::new(
        SchemaBuilder::new("Leaf")
            .field(
                FieldDef::new("v", FieldKind::Primitive(PrimitiveKind::U32)).validate(
                    move |_, _, ctx: ValidationContext<'_>| {
                        let token = ctx
                            .hints
                            .as_object()
                            .and_then(|o| o.get("token"))
                            .and_then(|v| v.as_str())
                            .unwrap_or("")
                            .to_owned();
                        leaf_seen.lock().unwrap().push(token);
                        Ok(())
                    },
                ),
            )
            .build()
            .unwrap(),
    );

    let root = SchemaBuilder::new("Root")
        .field(FieldDef::new("mid", FieldKind::NestedInline(leaf.clone())))
        .field(FieldDef::new(
            "items",
            FieldKind::Array {
                element: ArrayElementKind::InlineRecord(leaf),
            },
        ))
        .build()
        .unwrap();

    let input = obj(vec![
        ("mid", obj(vec![("v", Value::UInt(1))])),
        (
            "items",
            Value::Array(vec![
                obj(vec![("v", Value::UInt(2))]),
                obj(vec![("v", Value::UInt(3))]),
            ]),
        ),
    ]);

    let hints = obj(vec![("token", Value::Str("T1".to_owned()))]);
    root.pack(
        &input,
        PackOptions {
            validation_hints: Some(&hints),
            ..Default::default()
        },
    )
    .unwrap();

    let seen = seen_tokens.lock().unwrap();
    assert_eq!(seen.len(), 3, "mid + both array elements must all run the validator");
    assert!(seen.iter().all(|t| t == "T1"));
}

fn init_test_logging() {
    let _ = env_logger::try_init();
}

#[test]
fn array_length_mismatch_after_pack_transform_still_packs_and_warns() {
    init_test_logging();

    let schema = SchemaBuilder::new("Filtered")
        .field(
            FieldDef::new("len", FieldKind::Primitive(PrimitiveKind::U32))
                .length_of("items"),
        )
        .field(
            FieldDef::new(
                "items",
                FieldKind::Array {
                    element: ArrayElementKind::Primitive(PrimitiveKind::U8),
                },
            )
            .pack_transform(|v| {
                let elements = v.as_array().unwrap_or(&[]);
                Ok(Value::Array(elements[..elements.len() - 1].to_vec()))
            }),
        )
        .build()
        .unwrap();

    let input = obj(vec![(
        "items",
        Value::Array(vec![Value::UInt(1), Value::UInt(2), Value::UInt(3), Value::UInt(4)]),
    )]);

    // The length field is derived from the raw, pre-transform input (4 elements) while the
    // transform above drops the last element before encoding (3 elements); this must not fail
    // pack, it only logs a warning (see the length_of/pack_transform divergence note in pack.rs).
    let packed = schema.pack(&input, PackOptions::default()).unwrap();
    assert_eq!(&packed.bytes[0..4], &4u32.to_le_bytes());
    assert_eq!(packed.sub_buffers[0].len(), 3);
}
