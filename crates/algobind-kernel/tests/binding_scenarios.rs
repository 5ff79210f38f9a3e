//! Integration tests: bind a geospatial catalogue onto client types and call
//! the generated members.

use algobind_kernel::{
    ArgValue, BindError, Binder, Catalog, CatalogSource, FetchError, Invocation,
    InvocationError, InvocationRecorder, MemberKind, NamedArgs, Registry, SubtypeTable,
    TargetType, TypedValue, parse_catalog,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct JsonSource {
    catalog: Value,
    fetches: Arc<AtomicUsize>,
}

impl CatalogSource for JsonSource {
    fn fetch(&self) -> Result<Catalog, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        parse_catalog(&self.catalog).map_err(|e| FetchError::new(e.to_string()))
    }
}

fn catalog() -> Value {
    json!({
        "Image.constant": {
            "returns": "Image",
            "args": [
                {"name": "value", "type": "Image"},
                {"name": "x", "type": "Number", "optional": true}
            ],
            "description": "Creates a constant image."
        },
        "Image.load": {
            "returns": "Image",
            "args": [{"name": "id", "type": "String"}]
        },
        "Image.clip": {
            "returns": "Image",
            "args": [
                {"name": "input", "type": "Image"},
                {"name": "geometry", "type": "Geometry"}
            ]
        },
        "Image.reduceRegion": {
            "returns": "Dictionary<Number>",
            "args": [
                {"name": "image", "type": "Element"},
                {"name": "reducer", "type": "Reducer"}
            ]
        },
        "Image.wrap": {
            "returns": "Image",
            "args": [{"name": "value", "type": "Object"}]
        },
        "Image.pair": {
            "returns": "Image",
            "args": [
                {"name": "a", "type": "Number"},
                {"name": "b", "type": "Number"}
            ]
        },
        "Image.map": {
            "returns": "Image",
            "args": [{"name": "algorithm", "type": "Function"}]
        },
        "Image.select.bands": {
            "returns": "Image",
            "args": [{"name": "input", "type": "Image"}]
        },
        "Collection.map": {
            "returns": "Collection",
            "args": [
                {"name": "collection", "type": "Collection"},
                {"name": "baseAlgorithm", "type": "Algorithm"}
            ]
        }
    })
}

fn setup(catalog: Value) -> (Binder<InvocationRecorder>, Arc<AtomicUsize>) {
    let fetches = Arc::new(AtomicUsize::new(0));
    let registry = Registry::new(JsonSource {
        catalog,
        fetches: Arc::clone(&fetches),
    });
    let binder = Binder::new(registry, SubtypeTable::geospatial(), InvocationRecorder);
    (binder, fetches)
}

fn literal(value: Value) -> ArgValue {
    ArgValue::from(value)
}

fn record(value: Value) -> ArgValue {
    ArgValue::record_from_json(value).expect("record literal must be an object")
}

fn image(id: &str) -> TypedValue {
    TypedValue::new("Image", json!({"id": id}))
}

#[test]
fn classification_follows_first_parameter() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");

    assert!(target.contains(MemberKind::Instance, "constant"));
    assert!(target.contains(MemberKind::Instance, "clip"));
    assert!(target.contains(MemberKind::Instance, "reduceRegion"));
    assert!(target.contains(MemberKind::Static, "load"));
    assert!(target.contains(MemberKind::Static, "wrap"));
    assert!(!target.contains(MemberKind::Static, "constant"));
}

#[test]
fn only_exact_two_part_names_are_bound() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    let report = binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");

    assert!(report.members.iter().all(|entry| entry.function != "Image.select.bands"));
    assert!(!target.contains(MemberKind::Instance, "select.bands"));
    assert!(!target.contains(MemberKind::Instance, "bands"));
    let unbound = binder.registry().unbound_entries().expect("populated");
    assert_eq!(
        unbound.keys().cloned().collect::<Vec<_>>(),
        vec!["Collection.map".to_string(), "Image.select.bands".to_string()]
    );
}

#[test]
fn bound_signatures_are_generic_stripped() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");

    let member = target
        .member(MemberKind::Instance, "reduceRegion")
        .and_then(|member| member.signature())
        .expect("generated member carries its signature");
    assert_eq!(member.returns, "Dictionary");
}

#[test]
fn colliding_members_are_renamed_not_overwritten() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds Image");
    let report = binder
        .bind(&mut target, "Collection", "Image", None)
        .expect("binds Collection");

    assert_eq!(report.members.len(), 1);
    assert_eq!(report.members[0].member, "map_");
    assert_eq!(report.members[0].renamed_from.as_deref(), Some("map"));

    let original = target
        .member(MemberKind::Static, "map")
        .and_then(|member| member.as_bound())
        .expect("map kept");
    let renamed = target
        .member(MemberKind::Static, "map_")
        .and_then(|member| member.as_bound())
        .expect("map_ installed");
    assert_eq!(original.function().name(), "Image.map");
    assert_eq!(renamed.function().name(), "Collection.map");
}

#[test]
fn hand_written_members_survive_bind_and_unbind() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    target.define_native(MemberKind::Static, "load", |_, _| {
        Ok(Invocation {
            function: "native.load".to_string(),
            arguments: NamedArgs::new(),
        })
    });
    target.define_constant("name", json!("Image"));

    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");
    assert!(target.contains(MemberKind::Static, "load_"));
    let native = target.call_static("load", vec![]).expect("native call");
    assert_eq!(native.function, "native.load");

    let removed = binder.unbind(&mut target);
    assert_eq!(removed, 7);
    assert!(target.contains(MemberKind::Static, "load"));
    assert!(target.contains(MemberKind::Static, "name"));
    assert_eq!(target.bound_members().count(), 0);
}

#[test]
fn unbind_removes_members_from_every_bind() {
    let (binder, _) = setup(json!({
        "Image.load": {"returns": "Image", "args": [{"name": "id", "type": "String"}]},
        "Image.size": {"returns": "Number", "args": [{"name": "image", "type": "Image"}]},
        "Collection.load": {"returns": "Collection", "args": [{"name": "id", "type": "String"}]}
    }));
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    target.define_constant("name", json!("Image"));
    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds Image");
    binder
        .bind(&mut target, "Collection", "Image", None)
        .expect("binds Collection");
    assert!(target.contains(MemberKind::Static, "load_"));

    assert_eq!(binder.unbind(&mut target), 3);
    assert_eq!(target.bound_members().count(), 0);
    assert!(target.contains(MemberKind::Static, "name"));
    assert_eq!(binder.unbind(&mut target), 0);
}

#[test]
fn generic_parameters_are_stripped_before_classification() {
    let (binder, _) = setup(json!({
        "Collection.first": {
            "returns": "Element",
            "args": [{"name": "collection", "type": "Collection<Element>"}]
        }
    }));
    let mut target: TargetType<Invocation> = TargetType::new("ImageCollection");
    let report = binder
        .bind(&mut target, "Collection", "ImageCollection", None)
        .expect("binds");

    assert_eq!(report.count(MemberKind::Instance), 1);
    let member = target
        .member(MemberKind::Instance, "first")
        .and_then(|member| member.as_bound())
        .expect("first is an instance member");
    assert_eq!(member.signature().args[0].type_name, "Collection");
    assert_eq!(member.to_string(), "ImageCollection::first(self) -> Element");
}

#[test]
fn prepend_prefixes_member_names() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    binder
        .bind(&mut target, "Image", "Image", Some("ee_"))
        .expect("binds");
    assert!(target.contains(MemberKind::Static, "ee_load"));
    assert!(!target.contains(MemberKind::Static, "load"));
}

#[test]
fn named_and_positional_calls_are_equivalent() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");

    let positional = target
        .call_static("pair", vec![literal(json!(1)), literal(json!(2))])
        .expect("positional call");
    let named = target
        .call_static("pair", vec![record(json!({"a": 1, "b": 2}))])
        .expect("named call");
    assert_eq!(positional, named);
    assert_eq!(
        serde_json::to_value(&positional).expect("serializes"),
        json!({"function": "Image.pair", "arguments": {"a": 1, "b": 2}})
    );
}

#[test]
fn instance_calls_bind_the_receiver_first() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");
    let receiver = image("srtm");

    let positional = target
        .call_method(&receiver, "clip", vec![literal(json!("polygon"))])
        .expect("positional call");
    let named = target
        .call_method(&receiver, "clip", vec![record(json!({"geometry": "polygon"}))])
        .expect("named call");
    assert_eq!(positional, named);
    assert_eq!(positional.arguments["input"], ArgValue::Typed(receiver));
}

#[test]
fn named_call_redeclaring_receiver_fails() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");

    let err = target
        .call_method(&image("srtm"), "clip", vec![record(json!({"input": "other"}))])
        .expect_err("receiver collision");
    assert_eq!(
        err,
        BindError::Invocation(InvocationError::ArgumentCollision {
            function: "Image.clip".to_string(),
            argument: "input".to_string(),
        })
    );
}

#[test]
fn object_typed_first_argument_end_to_end() {
    let (binder, _) = setup(json!({
        "Image.constant": {
            "returns": "Image",
            "args": [{"name": "value", "type": "Object", "required": true}],
            "description": ""
        }
    }));
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    let report = binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");
    assert_eq!(report.count(MemberKind::Static), 1);

    let invocation = target
        .call_static("constant", vec![literal(json!(5))])
        .expect("call");
    assert_eq!(invocation.function, "Image.constant");
    assert_eq!(invocation.arguments["value"], literal(json!(5)));
}

#[test]
fn members_render_their_call_form() {
    let (binder, _) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");
    let rendered = target
        .bound_members()
        .map(|member| member.to_string())
        .collect::<Vec<_>>();
    assert!(rendered.contains(&"Image::constant(self, [x]) -> Image".to_string()));
    assert!(rendered.contains(&"Image::load(id) -> Image".to_string()));
}

#[test]
fn bind_report_snapshot() {
    let (binder, _) = setup(json!({
        "Image.load": {"returns": "Image", "args": [{"name": "id", "type": "String"}]},
        "Image.abs": {"returns": "Image", "args": [{"name": "value", "type": "Image"}]}
    }));
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    target.define_native(MemberKind::Instance, "abs", |_, _| {
        Ok(Invocation {
            function: "native.abs".to_string(),
            arguments: NamedArgs::new(),
        })
    });
    let report = binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");

    insta::assert_json_snapshot!(report, @r###"
    {
      "target": "Image",
      "prefix": "Image",
      "typeName": "Image",
      "members": [
        {
          "member": "abs_",
          "function": "Image.abs",
          "kind": "instance",
          "renamedFrom": "abs"
        },
        {
          "member": "load",
          "function": "Image.load",
          "kind": "static"
        }
      ]
    }
    "###);
}

#[test]
fn reset_forces_refetch_and_keeps_installed_members() {
    let (binder, fetches) = setup(catalog());
    let mut target: TargetType<Invocation> = TargetType::new("Image");
    binder
        .bind(&mut target, "Image", "Image", None)
        .expect("binds");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    binder.registry().reset();
    assert!(binder.registry().bound_names().is_empty());
    let still_callable = target
        .call_static("load", vec![literal(json!("srtm"))])
        .expect("installed members survive reset");
    assert_eq!(still_callable.function, "Image.load");

    binder.registry().lookup("Image.load").expect("refetches");
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[test]
fn registry_level_call_and_apply() {
    let (binder, _) = setup(catalog());
    let registry = binder.registry();
    let called = registry
        .call(&InvocationRecorder, "Image.pair", vec![literal(json!(1)), literal(json!(2))])
        .expect("call");
    let mut args = NamedArgs::new();
    args.insert("a".to_string(), literal(json!(1)));
    args.insert("b".to_string(), literal(json!(2)));
    let applied = registry
        .apply(&InvocationRecorder, "Image.pair", args)
        .expect("apply");
    assert_eq!(called, applied);

    assert!(matches!(
        registry.call(&InvocationRecorder, "Image.nope", vec![]),
        Err(BindError::Registry(_))
    ));
}
