mod common;

use lowasm::context::{FuncSig, WasmContext};
use lowasm::context::helpers::HELPERS_CLASS;
use lowasm::ir::types::{PrimRef, TypeRef};
use lowasm::ir::{ClassName, FunctionName, MethodName, ModuleInitializer};
use lowasm::wasm::instrs::Instr;
use lowasm::wasm::names::{FuncName, GlobalName, TypeName};
use lowasm::wasm::types::{HeapType, SimpleHeapType, StorageType, ValType};
use lowasm::wasm::ImportDesc;
use pretty_assertions::assert_eq;

use common::*;

#[test]
fn every_helper_is_imported_at_construction() {
    let ctx = WasmContext::new();
    let imports = ctx.module().imports();

    assert!(!imports.is_empty());
    assert!(imports.iter().all(|import| import.module == HELPERS_CLASS));
    assert!(imports.iter().any(|import| import.field == "stringConcat"));
    assert!(imports.iter().any(|import| import.field == "boxDouble"));
    assert!(imports.iter().any(|import| import.field == "jsStrictEquals"));

    // imported helpers resolve their signatures through the interner
    for import in imports {
        let ImportDesc::Func { type_name, .. } = &import.desc;
        assert!(matches!(type_name, TypeName::FuncSig(_)));
    }
}

#[test]
fn signature_interning_is_a_function() {
    let mut ctx = WasmContext::new();
    let baseline = ctx.module().func_types().len();

    let sig = FuncSig {
        params: vec![StorageType::Val(ValType::I64)],
        results: vec![StorageType::Val(ValType::I32)],
    };

    let first = ctx.intern_sig(sig.clone());
    let second = ctx.intern_sig(sig);

    assert_eq!(first, second);
    assert_eq!(ctx.module().func_types().len(), baseline + 1);

    // a signature already interned for a helper import is reused as-is
    let helper_sig = FuncSig {
        params: vec![
            StorageType::Val(ValType::AnyRef),
            StorageType::Val(ValType::AnyRef),
        ],
        results: vec![StorageType::Val(ValType::I32)],
    };

    ctx.intern_sig(helper_sig);
    assert_eq!(ctx.module().func_types().len(), baseline + 1);
}

#[test]
fn string_constants_are_interned_from_index_one() {
    let mut ctx = WasmContext::new();

    assert_eq!(ctx.intern_string("a"), GlobalName::StringConst(1));
    assert_eq!(ctx.intern_string("b"), GlobalName::StringConst(2));
    assert_eq!(ctx.intern_string("a"), GlobalName::StringConst(1));

    let globals = ctx.module().globals();
    assert_eq!(globals.len(), 2);

    for global in globals {
        assert!(global.mutable);
        assert_eq!(
            global.ty,
            ValType::Ref(HeapType::Simple(SimpleHeapType::Any))
        );
        // the placeholder scalar; the start function builds the real value
        assert_eq!(
            global.init.instrs,
            vec![Instr::I32Const(0), Instr::RefI31]
        );
    }
}

#[test]
fn start_builds_strings_then_runs_initializers() {
    let class_name = ClassName::new("M$");
    let main = void_method_name("main");

    let mut ctx = WasmContext::new();
    let global = ctx.intern_string("Hi");

    ctx.complete(&[ModuleInitializer::VoidMainMethod {
        class_name: class_name.clone(),
        method_name: main.clone(),
    }]);

    assert_eq!(ctx.module().start(), Some(&FuncName::Start));

    let start = ctx
        .module()
        .funcs()
        .iter()
        .find(|func| func.name == FuncName::Start)
        .unwrap();

    let load_module = MethodName::new(
        "loadModule",
        vec![],
        TypeRef::Class(class_name.clone()),
    );

    assert_eq!(
        start.body.instrs,
        vec![
            Instr::Call(FuncName::Helper("emptyString")),
            Instr::I32Const('H' as i32),
            Instr::Call(FuncName::Helper("charToString")),
            Instr::Call(FuncName::Helper("stringConcat")),
            Instr::I32Const('i' as i32),
            Instr::Call(FuncName::Helper("charToString")),
            Instr::Call(FuncName::Helper("stringConcat")),
            Instr::GlobalSet(global),
            Instr::Call(FuncName::Method(FunctionName::new(
                class_name.clone(),
                load_module,
            ))),
            Instr::RefAsNonNull,
            Instr::Call(FuncName::Method(FunctionName::new(class_name, main))),
        ]
    );
}

#[test]
fn empty_strings_are_set_directly_from_empty_string() {
    let mut ctx = WasmContext::new();
    let global = ctx.intern_string("");

    ctx.complete(&[]);

    let start = ctx
        .module()
        .funcs()
        .iter()
        .find(|func| func.name == FuncName::Start)
        .unwrap();

    assert_eq!(
        start.body.instrs,
        vec![
            Instr::Call(FuncName::Helper("emptyString")),
            Instr::GlobalSet(global),
        ]
    );
}

#[test]
fn nothing_to_run_means_no_start_section() {
    let mut ctx = WasmContext::new();
    ctx.complete(&[]);

    assert_eq!(ctx.module().start(), None);
    assert!(ctx.module().funcs().is_empty());
}

#[test]
fn main_with_args_initializers_are_ignored() {
    let mut ctx = WasmContext::new();

    ctx.complete(&[ModuleInitializer::MainMethodWithArgs {
        class_name: ClassName::new("M$"),
        method_name: MethodName::new(
            "main",
            vec![TypeRef::Array(lowasm::ir::types::ArrayTypeRef {
                base: Box::new(TypeRef::Class(ClassName::object())),
                dims: 1,
            })],
            TypeRef::Prim(PrimRef::Void),
        ),
        args: vec!["--flag".to_owned()],
    }]);

    assert_eq!(ctx.module().start(), None);
    assert!(ctx.module().funcs().is_empty());
}
