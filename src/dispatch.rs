//! Virtual- and interface-dispatch planning.
//!
//! Derives, per class, the ordered vtable and itable layouts, the struct
//! types realizing them, and the globals holding their instances. All
//! layouts are memoized in the context; class infos must be frozen
//! before the first lookup, which phase separation guarantees.

use std::rc::Rc;

use itertools::Itertools;
use tracing::trace;

use crate::context::{transform_result_type, transform_type, FieldInfo, FuncSig, FunctionInfo, WasmContext};
use crate::errors::BackendError;
use crate::ir::{ClassName, FieldName, MethodName};
use crate::wasm::instrs::Instr;
use crate::wasm::names::{FuncName, GlobalName, TypeName};
use crate::wasm::types::{HeapType, StorageType, StructField, StructType, ValType};
use crate::wasm::{Expr, Global};

/// The field holding the vtable reference, at slot 0 of every class
/// struct.
pub const VTABLE_FIELD_NAME: &str = "vtable";

/// The field holding the itables reference, at slot 1 of every class
/// struct.
pub const ITABLES_FIELD_NAME: &str = "itables";

/// The number of implicit leading slots of a class struct.
const RESERVED_FIELD_SLOTS: usize = 2;

/// The vtable of a class, abstract slots included. Every method name
/// appears at most once; overrides replace the original entry at its
/// slot, new methods append.
pub fn vtable(
    ctx: &mut WasmContext,
    class_name: &ClassName,
) -> Result<Rc<Vec<FunctionInfo>>, BackendError> {
    table(ctx, class_name, true)
}

/// The vtable of a class restricted to concrete entries: abstract
/// methods are dropped at collection, so an inherited concrete method
/// keeps its slot even when the class re-declares it abstractly.
pub fn concrete_vtable(
    ctx: &mut WasmContext,
    class_name: &ClassName,
) -> Result<Rc<Vec<FunctionInfo>>, BackendError> {
    table(ctx, class_name, false)
}

fn table(
    ctx: &mut WasmContext,
    class_name: &ClassName,
    include_abstract: bool,
) -> Result<Rc<Vec<FunctionInfo>>, BackendError> {
    let key = (class_name.clone(), include_abstract);

    if let Some(cached) = ctx.vtable_cache.get(&key) {
        return Ok(cached.clone());
    }

    let mut slots: Vec<FunctionInfo> = Vec::new();

    for method in collect_methods(ctx, class_name, include_abstract)? {
        match slots
            .iter()
            .find_position(|slot| slot.name.method_name == method.name.method_name)
        {
            Some((idx, _)) => slots[idx] = method,
            None => slots.push(method),
        }
    }

    trace!(class = %class_name, include_abstract, slots = slots.len(), "laid out a vtable");

    let slots = Rc::new(slots);
    ctx.vtable_cache.insert(key, slots.clone());

    Ok(slots)
}

fn collect_methods(
    ctx: &WasmContext,
    class_name: &ClassName,
    include_abstract: bool,
) -> Result<Vec<FunctionInfo>, BackendError> {
    let info = ctx.class_info(class_name)?;
    let mut methods = Vec::new();

    if let Some(super_class) = &info.super_class {
        methods.extend(collect_methods(ctx, super_class, include_abstract)?);
    }

    for interface in &info.interfaces {
        methods.extend(collect_methods(ctx, interface, include_abstract)?);
    }

    methods.extend(
        info.methods
            .iter()
            .filter(|method| include_abstract || !method.is_abstract)
            .cloned(),
    );

    Ok(methods)
}

/// The itables of a class: its interfaces gathered bottom-up, the
/// class's own entry last if it is itself an interface. Duplicates are
/// preserved; `resolve_method` depends on that for its last-wins
/// tie-break.
pub fn itables(
    ctx: &mut WasmContext,
    class_name: &ClassName,
) -> Result<Rc<Vec<ClassName>>, BackendError> {
    if let Some(cached) = ctx.itable_cache.get(class_name) {
        return Ok(cached.clone());
    }

    let interfaces = Rc::new(collect_interfaces(ctx, class_name)?);
    ctx.itable_cache
        .insert(class_name.clone(), interfaces.clone());

    Ok(interfaces)
}

fn collect_interfaces(
    ctx: &WasmContext,
    class_name: &ClassName,
) -> Result<Vec<ClassName>, BackendError> {
    let info = ctx.class_info(class_name)?;
    let mut interfaces = Vec::new();

    if let Some(super_class) = &info.super_class {
        interfaces.extend(collect_interfaces(ctx, super_class)?);
    }

    for interface in &info.interfaces {
        interfaces.extend(collect_interfaces(ctx, interface)?);
    }

    if info.kind.is_interface() {
        interfaces.push(class_name.clone());
    }

    Ok(interfaces)
}

/// Resolves a method against the itables of a class.
///
/// Returns the index of the resolving interface within the itables
/// vector and the index of the method within that interface's method
/// list. Both scans run from the end: under multiple-interface
/// inheritance the most-derived re-declaration wins.
pub fn resolve_method(
    ctx: &mut WasmContext,
    class_name: &ClassName,
    method_name: &MethodName,
) -> Result<(usize, usize), BackendError> {
    let interfaces = itables(ctx, class_name)?;

    for (itable_idx, interface) in interfaces.iter().enumerate().rev() {
        let info = ctx.class_info(interface)?;
        let method_idx = info
            .methods
            .iter()
            .rposition(|method| &method.name.method_name == method_name);

        if let Some(method_idx) = method_idx {
            return Ok((itable_idx, method_idx));
        }
    }

    Err(BackendError::MethodNotFound {
        class_name: class_name.clone(),
        method_name: method_name.to_string(),
    })
}

/// The struct-field index of a field of a class instance. User fields
/// start after the two reserved slots; fields inherited from the super
/// chain come first.
pub fn field_index(
    ctx: &WasmContext,
    class_name: &ClassName,
    field_name: &FieldName,
) -> Result<usize, BackendError> {
    let info = ctx.class_info(class_name)?;

    if let Some(idx) = info.fields.iter().position(|field| &field.name == field_name) {
        return Ok(RESERVED_FIELD_SLOTS + inherited_field_count(ctx, class_name)? + idx);
    }

    match &info.super_class {
        Some(super_class) => field_index(ctx, super_class, field_name).map_err(|err| match err {
            BackendError::FieldNotFound { .. } => BackendError::FieldNotFound {
                class_name: class_name.clone(),
                field_name: field_name.clone(),
            },

            other => other,
        }),

        None => Err(BackendError::FieldNotFound {
            class_name: class_name.clone(),
            field_name: field_name.clone(),
        }),
    }
}

fn inherited_field_count(ctx: &WasmContext, class_name: &ClassName) -> Result<usize, BackendError> {
    let info = ctx.class_info(class_name)?;

    match &info.super_class {
        Some(super_class) => {
            Ok(inherited_field_count(ctx, super_class)? + ctx.class_info(super_class)?.fields.len())
        }

        None => Ok(0),
    }
}

fn collect_fields(
    ctx: &WasmContext,
    class_name: &ClassName,
) -> Result<Vec<FieldInfo>, BackendError> {
    let info = ctx.class_info(class_name)?;
    let mut fields = match &info.super_class {
        Some(super_class) => collect_fields(ctx, super_class)?,
        None => Vec::new(),
    };

    fields.extend(info.fields.iter().cloned());

    Ok(fields)
}

fn method_sig(method: &FunctionInfo) -> FuncSig {
    let mut params = vec![StorageType::Val(ValType::AnyRef)];
    params.extend(
        method
            .arg_types
            .iter()
            .map(|tpe| StorageType::Val(transform_type(tpe))),
    );

    FuncSig {
        params,
        results: transform_result_type(&method.result_type),
    }
}

/// Registers the vtable struct type of a class: one typed func-ref field
/// per slot, abstract slots included, subtyping the super's vtable type.
pub fn vtable_type(
    ctx: &mut WasmContext,
    class_name: &ClassName,
) -> Result<TypeName, BackendError> {
    let slots = vtable(ctx, class_name)?;
    let mut fields = Vec::with_capacity(slots.len());

    for slot in slots.iter() {
        let sig_name = ctx.intern_sig(method_sig(slot));

        fields.push(StructField {
            name: slot.name.method_name.simple_name.clone(),
            ty: StorageType::Val(ValType::Ref(HeapType::Func(sig_name))),
            mutable: false,
        });
    }

    let super_type = ctx
        .class_info(class_name)?
        .super_class
        .clone()
        .map(TypeName::VTable);
    let name = TypeName::VTable(class_name.clone());

    ctx.module_mut().add_struct_type(StructType {
        name: name.clone(),
        fields,
        super_type,
    });

    Ok(name)
}

/// Registers the itable struct type of an interface: one typed func-ref
/// field per declared method, in declaration order.
pub fn itable_type(
    ctx: &mut WasmContext,
    interface_name: &ClassName,
) -> Result<TypeName, BackendError> {
    let methods = ctx.class_info(interface_name)?.methods.clone();
    let mut fields = Vec::with_capacity(methods.len());

    for method in &methods {
        let sig_name = ctx.intern_sig(method_sig(method));

        fields.push(StructField {
            name: method.name.method_name.simple_name.clone(),
            ty: StorageType::Val(ValType::Ref(HeapType::Func(sig_name))),
            mutable: false,
        });
    }

    let name = TypeName::ITable(interface_name.clone());

    ctx.module_mut().add_struct_type(StructType {
        name: name.clone(),
        fields,
        super_type: None,
    });

    Ok(name)
}

/// Registers the instance struct type of a class: the vtable reference
/// at slot 0, the itables reference at slot 1, then every field of the
/// super chain followed by the class's own fields.
pub fn class_type(ctx: &mut WasmContext, class_name: &ClassName) -> Result<TypeName, BackendError> {
    let all_fields = collect_fields(ctx, class_name)?;
    let super_type = ctx
        .class_info(class_name)?
        .super_class
        .clone()
        .map(TypeName::Class);

    let mut fields = vec![
        StructField {
            name: VTABLE_FIELD_NAME.to_owned(),
            ty: StorageType::Val(ValType::Ref(HeapType::Type(TypeName::VTable(
                class_name.clone(),
            )))),
            mutable: false,
        },
        StructField {
            name: ITABLES_FIELD_NAME.to_owned(),
            ty: StorageType::Val(ValType::RefNull(HeapType::Type(TypeName::ItablesArray))),
            mutable: false,
        },
    ];

    for field in all_fields {
        fields.push(StructField {
            name: field.name.as_str().to_owned(),
            ty: StorageType::Val(transform_type(&field.tpe)),
            mutable: true,
        });
    }

    let name = TypeName::Class(class_name.clone());

    ctx.module_mut().add_struct_type(StructType {
        name: name.clone(),
        fields,
        super_type,
    });

    Ok(name)
}

/// Registers the vtable instance of a class as an immutable global. Only
/// meaningful for instantiable classes, where every slot has a concrete
/// implementation.
pub fn global_vtable(
    ctx: &mut WasmContext,
    class_name: &ClassName,
) -> Result<GlobalName, BackendError> {
    let slots = concrete_vtable(ctx, class_name)?;

    let mut instrs: Vec<Instr> = slots
        .iter()
        .map(|slot| Instr::RefFunc(FuncName::Method(slot.name.clone())))
        .collect();
    instrs.push(Instr::StructNew(TypeName::VTable(class_name.clone())));

    let name = GlobalName::VTable(class_name.clone());

    ctx.module_mut().add_global(Global {
        name: name.clone(),
        ty: ValType::Ref(HeapType::Type(TypeName::VTable(class_name.clone()))),
        mutable: false,
        init: Expr::new(instrs),
    });

    Ok(name)
}

/// Registers the itables array of a class as an immutable global: one
/// itable struct per implemented interface, each slot resolved to the
/// class's concrete implementation.
pub fn global_itables(
    ctx: &mut WasmContext,
    class_name: &ClassName,
) -> Result<GlobalName, BackendError> {
    let interfaces = itables(ctx, class_name)?;
    let concrete = concrete_vtable(ctx, class_name)?;
    let mut instrs = Vec::new();

    for interface in interfaces.iter() {
        let info = ctx.class_info(interface)?;

        for method in &info.methods {
            let implementation = concrete
                .iter()
                .find(|slot| slot.name.method_name == method.name.method_name)
                .ok_or_else(|| BackendError::MethodNotFound {
                    class_name: class_name.clone(),
                    method_name: method.name.method_name.to_string(),
                })?;

            instrs.push(Instr::RefFunc(FuncName::Method(implementation.name.clone())));
        }

        instrs.push(Instr::StructNew(TypeName::ITable(interface.clone())));
    }

    instrs.push(Instr::ArrayNewFixed {
        ty: TypeName::ItablesArray,
        len: interfaces.len() as i32,
    });

    let name = GlobalName::ITables(class_name.clone());

    ctx.module_mut().add_global(Global {
        name: name.clone(),
        ty: ValType::Ref(HeapType::Type(TypeName::ItablesArray)),
        mutable: false,
        init: Expr::new(instrs),
    });

    Ok(name)
}
