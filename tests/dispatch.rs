mod common;

use lowasm::context::WasmContext;
use lowasm::dispatch;
use lowasm::errors::BackendError;
use lowasm::ir::types::Type;
use lowasm::ir::{ClassKind, ClassName, FieldName, FunctionName, LinkedClass};
use lowasm::preprocess::preprocess;
use lowasm::wasm::instrs::Instr;
use lowasm::wasm::names::{FuncName, TypeName};
use pretty_assertions::assert_eq;

use common::*;

fn ctx_for(classes: Vec<LinkedClass>) -> WasmContext {
    let mut ctx = WasmContext::new();
    preprocess(&mut ctx, &classes).unwrap();

    ctx
}

#[test]
fn overrides_replace_slots_in_place() {
    let mut ctx = ctx_for(vec![
        ClassBuilder::new("B", ClassKind::Class)
            .concrete_method(int_method_name("foo"))
            .build(),
        ClassBuilder::new("A", ClassKind::Class)
            .super_class("B")
            .concrete_method(int_method_name("foo"))
            .concrete_method(int_method_name("bar"))
            .build(),
    ]);

    let vtable = dispatch::vtable(&mut ctx, &ClassName::new("A")).unwrap();

    assert_eq!(vtable.len(), 2);
    assert_eq!(vtable[0].name.class_name, ClassName::new("A"));
    assert_eq!(vtable[0].name.method_name, int_method_name("foo"));
    assert_eq!(vtable[1].name.method_name, int_method_name("bar"));
}

#[test]
fn method_names_are_unique_per_vtable() {
    // `m` reaches A through B, through I, and through A's own interface
    // list; it still occupies a single slot
    let mut ctx = ctx_for(vec![
        ClassBuilder::new("I", ClassKind::Interface)
            .abstract_method(int_method_name("m"))
            .build(),
        ClassBuilder::new("B", ClassKind::Class)
            .interface("I")
            .concrete_method(int_method_name("m"))
            .build(),
        ClassBuilder::new("A", ClassKind::Class)
            .super_class("B")
            .interface("I")
            .build(),
    ]);

    let vtable = dispatch::vtable(&mut ctx, &ClassName::new("A")).unwrap();
    assert_eq!(vtable.len(), 1);

    let concrete = dispatch::concrete_vtable(&mut ctx, &ClassName::new("A")).unwrap();
    assert_eq!(concrete.len(), 1);
    assert!(!concrete[0].is_abstract);
    assert_eq!(concrete[0].name.class_name, ClassName::new("B"));
}

#[test]
fn abstract_redeclarations_do_not_shadow_concrete_slots() {
    let mut ctx = ctx_for(vec![
        ClassBuilder::new("B", ClassKind::Class)
            .concrete_method(int_method_name("m"))
            .build(),
        ClassBuilder::new("A", ClassKind::AbstractClass)
            .super_class("B")
            .abstract_method(int_method_name("m"))
            .build(),
    ]);

    let vtable = dispatch::vtable(&mut ctx, &ClassName::new("A")).unwrap();
    assert_eq!(vtable.len(), 1);
    assert!(vtable[0].is_abstract);

    let concrete = dispatch::concrete_vtable(&mut ctx, &ClassName::new("A")).unwrap();
    assert_eq!(concrete.len(), 1);
    assert!(!concrete[0].is_abstract);
    assert_eq!(concrete[0].name.class_name, ClassName::new("B"));
}

fn diamond() -> Vec<LinkedClass> {
    vec![
        ClassBuilder::new("I1", ClassKind::Interface)
            .abstract_method(int_method_name("m"))
            .build(),
        ClassBuilder::new("I2", ClassKind::Interface)
            .interface("I1")
            .abstract_method(int_method_name("m"))
            .build(),
        ClassBuilder::new("C", ClassKind::Class)
            .interface("I1")
            .interface("I2")
            .concrete_method(int_method_name("m"))
            .build(),
    ]
}

#[test]
fn duplicate_interfaces_are_preserved() {
    let mut ctx = ctx_for(diamond());

    let itables = dispatch::itables(&mut ctx, &ClassName::new("C")).unwrap();

    assert_eq!(
        *itables,
        vec![
            ClassName::new("I1"),
            ClassName::new("I1"),
            ClassName::new("I2"),
        ]
    );
}

#[test]
fn method_resolution_is_last_wins() {
    let mut ctx = ctx_for(diamond());

    let (itable_idx, method_idx) =
        dispatch::resolve_method(&mut ctx, &ClassName::new("C"), &int_method_name("m")).unwrap();

    // the most-derived re-declaration (I2) wins over both I1 entries
    assert_eq!(itable_idx, 2);
    assert_eq!(method_idx, 0);
}

#[test]
fn unresolvable_methods_fail() {
    let mut ctx = ctx_for(diamond());

    let err = dispatch::resolve_method(&mut ctx, &ClassName::new("C"), &int_method_name("absent"))
        .unwrap_err();

    assert!(matches!(err, BackendError::MethodNotFound { .. }));
}

#[test]
fn user_fields_start_at_slot_two() {
    let ctx = ctx_for(vec![
        ClassBuilder::new("E", ClassKind::Class)
            .field("x", Type::Int)
            .build(),
        ClassBuilder::new("D", ClassKind::Class)
            .super_class("E")
            .field("y", Type::Double)
            .build(),
    ]);

    assert_eq!(
        dispatch::field_index(&ctx, &ClassName::new("E"), &FieldName::new("x")).unwrap(),
        2
    );
    assert_eq!(
        dispatch::field_index(&ctx, &ClassName::new("D"), &FieldName::new("y")).unwrap(),
        3
    );
    assert_eq!(
        dispatch::field_index(&ctx, &ClassName::new("D"), &FieldName::new("x")).unwrap(),
        2
    );

    let err =
        dispatch::field_index(&ctx, &ClassName::new("D"), &FieldName::new("absent")).unwrap_err();
    assert!(matches!(err, BackendError::FieldNotFound { .. }));
}

#[test]
fn vtable_types_carry_every_slot() {
    let mut ctx = ctx_for(vec![
        ClassBuilder::new("Base", ClassKind::AbstractClass)
            .abstract_method(int_method_name("m"))
            .build(),
        ClassBuilder::new("Impl", ClassKind::Class)
            .super_class("Base")
            .concrete_method(int_method_name("m"))
            .concrete_method(int_method_name("n"))
            .build(),
    ]);

    dispatch::vtable_type(&mut ctx, &ClassName::new("Base")).unwrap();
    dispatch::vtable_type(&mut ctx, &ClassName::new("Impl")).unwrap();

    let impl_vtable_ty = ctx
        .module()
        .struct_types()
        .iter()
        .find(|ty| ty.name == TypeName::VTable(ClassName::new("Impl")))
        .unwrap();

    assert_eq!(impl_vtable_ty.fields.len(), 2);
    assert_eq!(
        impl_vtable_ty.super_type,
        Some(TypeName::VTable(ClassName::new("Base")))
    );
}

#[test]
fn class_types_reserve_the_leading_slots() {
    let mut ctx = ctx_for(vec![
        ClassBuilder::new("E", ClassKind::Class)
            .field("x", Type::Int)
            .build(),
        ClassBuilder::new("D", ClassKind::Class)
            .super_class("E")
            .field("y", Type::Double)
            .build(),
    ]);

    dispatch::class_type(&mut ctx, &ClassName::new("D")).unwrap();

    let class_ty = ctx
        .module()
        .struct_types()
        .iter()
        .find(|ty| ty.name == TypeName::Class(ClassName::new("D")))
        .unwrap();

    assert_eq!(class_ty.fields.len(), 4);
    assert_eq!(class_ty.fields[0].name, dispatch::VTABLE_FIELD_NAME);
    assert_eq!(class_ty.fields[1].name, dispatch::ITABLES_FIELD_NAME);
    assert_eq!(class_ty.fields[2].name, "x");
    assert_eq!(class_ty.fields[3].name, "y");
    assert_eq!(
        class_ty.super_type,
        Some(TypeName::Class(ClassName::new("E")))
    );
}

#[test]
fn vtable_globals_reference_concrete_implementations_only() {
    let mut ctx = ctx_for(vec![
        ClassBuilder::new("Base", ClassKind::AbstractClass)
            .abstract_method(int_method_name("m"))
            .build(),
        ClassBuilder::new("Impl", ClassKind::Class)
            .super_class("Base")
            .concrete_method(int_method_name("m"))
            .build(),
    ]);

    dispatch::global_vtable(&mut ctx, &ClassName::new("Impl")).unwrap();

    let global = ctx.module().globals().last().unwrap();

    let expected_ref = Instr::RefFunc(FuncName::Method(FunctionName::new(
        ClassName::new("Impl"),
        int_method_name("m"),
    )));

    assert_eq!(
        global.init.instrs,
        vec![
            expected_ref,
            Instr::StructNew(TypeName::VTable(ClassName::new("Impl"))),
        ]
    );
    assert!(!global.mutable);
}

#[test]
fn itables_globals_build_one_struct_per_interface() {
    let mut ctx = ctx_for(vec![
        ClassBuilder::new("I", ClassKind::Interface)
            .abstract_method(int_method_name("m"))
            .build(),
        ClassBuilder::new("C", ClassKind::Class)
            .interface("I")
            .concrete_method(int_method_name("m"))
            .build(),
    ]);

    dispatch::global_itables(&mut ctx, &ClassName::new("C")).unwrap();

    let global = ctx.module().globals().last().unwrap();

    let expected_ref = Instr::RefFunc(FuncName::Method(FunctionName::new(
        ClassName::new("C"),
        int_method_name("m"),
    )));

    assert_eq!(
        global.init.instrs,
        vec![
            expected_ref,
            Instr::StructNew(TypeName::ITable(ClassName::new("I"))),
            Instr::ArrayNewFixed {
                ty: TypeName::ItablesArray,
                len: 1,
            },
        ]
    );
}
