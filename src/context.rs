//! The build context: the module under construction, the class-info
//! table, and the interners shared by every later stage.

pub mod helpers;

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::errors::BackendError;
use crate::ir::types::{Type, TypeRef};
use crate::ir::{
    ClassKind, ClassName, FieldName, FunctionName, JsNativeLoadSpec, MethodName, ModuleInitializer,
};
use crate::wasm::instrs::Instr;
use crate::wasm::names::{FuncName, GlobalName, TypeName};
use crate::wasm::types::{FuncType, HeapType, SimpleHeapType, StorageType, ValType};
use crate::wasm::{Expr, Function, Global, Import, ImportDesc, Module};

use helpers::{helpers, HELPERS_CLASS};

/// A virtually dispatchable method of a class. `is_abstract` is true iff
/// the method has no body, including the slots synthesized by the
/// abstract-method recovery pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub name: FunctionName,
    pub arg_types: Vec<Type>,
    pub result_type: Type,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: FieldName,
    pub tpe: Type,
}

/// Per-class information derived from the linked input.
///
/// Created once by the preprocessor; after that, the only permitted
/// mutation is appending recovered abstract methods.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: ClassName,
    pub kind: ClassKind,
    pub methods: Vec<FunctionInfo>,
    pub fields: Vec<FieldInfo>,
    pub super_class: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    pub ancestors: Vec<ClassName>,
    pub js_native_load_spec: Option<JsNativeLoadSpec>,
    pub js_native_members: IndexMap<MethodName, JsNativeLoadSpec>,
}

impl ClassInfo {
    pub fn method_named(&self, method_name: &MethodName) -> Option<&FunctionInfo> {
        self.methods
            .iter()
            .find(|method| &method.name.method_name == method_name)
    }
}

/// A function signature at the Wasm level, the unit of type interning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncSig {
    pub params: Vec<StorageType>,
    pub results: Vec<StorageType>,
}

/// Maps an IR type to the Wasm value type it is represented as.
///
/// Reference types are uniformly `anyref`; only primitives get unboxed
/// representations.
pub fn transform_type(tpe: &Type) -> ValType {
    match tpe {
        Type::Boolean | Type::Char | Type::Byte | Type::Short | Type::Int => ValType::I32,
        Type::Long => ValType::I64,
        Type::Float => ValType::F32,
        Type::Double => ValType::F64,
        Type::Class(_) | Type::Array(_) | Type::Any | Type::Nothing => ValType::AnyRef,
        Type::Void => unreachable!("void is not a value type"),
    }
}

/// Maps an IR result type to the Wasm result list (`void` maps to no
/// results).
pub fn transform_result_type(tpe: &Type) -> Vec<StorageType> {
    match tpe {
        Type::Void => vec![],
        _ => vec![StorageType::Val(transform_type(tpe))],
    }
}

/// The context of a module compilation.
///
/// Owns the module store and the class-info table; every interner is
/// append-only. The preprocessor populates the class infos, the planner
/// and the external instruction selector read them, and `complete`
/// finishes the module off with the synthesized start function.
pub struct WasmContext {
    module: Module,
    class_infos: IndexMap<ClassName, ClassInfo>,
    sigs: IndexSet<FuncSig>,
    string_globals: IndexMap<String, GlobalName>,
    pub(crate) vtable_cache: HashMap<(ClassName, bool), Rc<Vec<FunctionInfo>>>,
    pub(crate) itable_cache: HashMap<ClassName, Rc<Vec<ClassName>>>,
}

impl WasmContext {
    /// Creates a context with every runtime helper already registered
    /// as an import.
    pub fn new() -> Self {
        let mut ctx = Self {
            module: Module::new(),
            class_infos: IndexMap::new(),
            sigs: IndexSet::new(),
            string_globals: IndexMap::new(),
            vtable_cache: HashMap::new(),
            itable_cache: HashMap::new(),
        };

        for (_, helper) in helpers() {
            let type_name = ctx.intern_sig(FuncSig {
                params: helper.params.clone(),
                results: helper.results.clone(),
            });

            ctx.module.add_import(Import {
                module: HELPERS_CLASS.to_owned(),
                field: helper.name.to_owned(),
                desc: ImportDesc::Func {
                    name: FuncName::Helper(helper.name),
                    type_name,
                },
            });
        }

        ctx
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    pub fn add_class_info(&mut self, info: ClassInfo) {
        use indexmap::map::Entry;

        match self.class_infos.entry(info.name.clone()) {
            Entry::Occupied(entry) => {
                panic!("the class {} has already been registered", entry.key());
            }

            Entry::Vacant(entry) => {
                entry.insert(info);
            }
        }
    }

    pub fn class_info(&self, name: &ClassName) -> Result<&ClassInfo, BackendError> {
        self.class_infos
            .get(name)
            .ok_or_else(|| BackendError::ClassNotFound(name.clone()))
    }

    pub fn class_infos(&self) -> impl Iterator<Item = &ClassInfo> {
        self.class_infos.values()
    }

    /// Reinstates a vtable slot at the class a call site statically
    /// dispatches through, unless the class already declares the method.
    ///
    /// The slot's signature is derived from the method name's type
    /// references; the upstream linker erased the declaration itself.
    pub(crate) fn register_possible_abstract_call(
        &mut self,
        class_name: &ClassName,
        method_name: &MethodName,
    ) -> Result<(), BackendError> {
        let info = self
            .class_infos
            .get_mut(class_name)
            .ok_or_else(|| BackendError::ClassNotFound(class_name.clone()))?;

        if info.method_named(method_name).is_none() {
            trace!(class = %class_name, method = %method_name, "reinstating an abstract method slot");

            info.methods.push(FunctionInfo {
                name: FunctionName::new(class_name.clone(), method_name.clone()),
                arg_types: method_name.param_types(),
                result_type: method_name.result_type(),
                is_abstract: true,
            });
        }

        Ok(())
    }

    /// Interns a function signature, registering a new function type on
    /// first encounter.
    pub fn intern_sig(&mut self, sig: FuncSig) -> TypeName {
        if let Some(idx) = self.sigs.get_index_of(&sig) {
            return TypeName::FuncSig(idx as u32);
        }

        let (idx, _) = self.sigs.insert_full(sig.clone());
        let name = TypeName::FuncSig(idx as u32);

        self.module.add_func_type(FuncType {
            name: name.clone(),
            params: sig.params,
            results: sig.results,
        });

        name
    }

    /// Interns a string constant, allocating a global for it on first
    /// encounter. Indices start at 1.
    ///
    /// The global starts out as a placeholder scalar; the start function
    /// overwrites it with the actual string before any user code runs.
    pub fn intern_string(&mut self, s: &str) -> GlobalName {
        if let Some(name) = self.string_globals.get(s) {
            return name.clone();
        }

        let idx = self.string_globals.len() as u32 + 1;
        let name = GlobalName::StringConst(idx);
        self.string_globals.insert(s.to_owned(), name.clone());

        self.module.add_global(Global {
            name: name.clone(),
            ty: ValType::Ref(HeapType::Simple(SimpleHeapType::Any)),
            mutable: true,
            init: Expr::new(vec![Instr::I32Const(0), Instr::RefI31]),
        });

        name
    }

    /// Assembles the start function: string-constant construction first,
    /// then the module initializers, in order. Registers nothing when
    /// there is nothing to run.
    pub fn complete(&mut self, module_initializers: &[ModuleInitializer]) {
        let mut instrs = Vec::new();

        for (s, global) in &self.string_globals {
            instrs.push(Instr::Call(FuncName::Helper("emptyString")));

            for c in s.encode_utf16() {
                instrs.push(Instr::I32Const(c as i32));
                instrs.push(Instr::Call(FuncName::Helper("charToString")));
                instrs.push(Instr::Call(FuncName::Helper("stringConcat")));
            }

            instrs.push(Instr::GlobalSet(global.clone()));
        }

        for initializer in module_initializers {
            match initializer {
                ModuleInitializer::VoidMainMethod {
                    class_name,
                    method_name,
                } => {
                    let load_module = MethodName::new(
                        "loadModule",
                        vec![],
                        TypeRef::Class(class_name.clone()),
                    );

                    instrs.push(Instr::Call(FuncName::Method(FunctionName::new(
                        class_name.clone(),
                        load_module,
                    ))));
                    instrs.push(Instr::RefAsNonNull);
                    instrs.push(Instr::Call(FuncName::Method(FunctionName::new(
                        class_name.clone(),
                        method_name.clone(),
                    ))));
                }

                // TODO: materialize argv once the runtime can build a string array
                ModuleInitializer::MainMethodWithArgs { class_name, .. } => {
                    debug!(class = %class_name, "skipping a main-with-args initializer");
                }
            }
        }

        if instrs.is_empty() {
            return;
        }

        let type_name = self.intern_sig(FuncSig {
            params: vec![],
            results: vec![],
        });

        self.module.add_function(Function {
            name: FuncName::Start,
            type_name,
            params: vec![],
            locals: vec![],
            body: Expr::new(instrs),
        });
        self.module.set_start(FuncName::Start);
    }
}

impl Default for WasmContext {
    fn default() -> Self {
        Self::new()
    }
}
