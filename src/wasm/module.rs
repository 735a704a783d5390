use indexmap::IndexSet;

use crate::errors::BackendError;

use super::instrs::Instr;
use super::names::{FuncName, GlobalName, LocalName, TypeName};
use super::types::{
    ArrayType, FuncType, HeapType, SimpleHeapType, StorageType, StructType, ValType,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expr {
    pub instrs: Vec<Instr>,
}

impl Expr {
    pub fn new(instrs: Vec<Instr>) -> Self {
        Self { instrs }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub field: String,
    pub desc: ImportDesc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportDesc {
    Func {
        name: FuncName,
        type_name: TypeName,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub name: LocalName,
    pub ty: ValType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: FuncName,
    pub type_name: TypeName,
    pub params: Vec<Local>,
    pub locals: Vec<Local>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: GlobalName,
    pub ty: ValType,
    pub mutable: bool,
    pub init: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportKind {
    Func(FuncName),
    Global(GlobalName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
}

/// The module store. Every collection is append-only during the build
/// phase; emission only reads.
#[derive(Debug)]
pub struct Module {
    struct_types: Vec<StructType>,
    array_types: Vec<ArrayType>,
    func_types: Vec<FuncType>,
    imports: Vec<Import>,
    funcs: Vec<Function>,
    globals: Vec<Global>,
    exports: Vec<Export>,
    start: Option<FuncName>,
}

impl Module {
    pub fn new() -> Self {
        Self {
            struct_types: Vec::new(),
            array_types: vec![ArrayType {
                name: TypeName::ItablesArray,
                elem: StorageType::Val(ValType::Ref(HeapType::Simple(SimpleHeapType::Struct))),
                mutable: false,
            }],
            func_types: Vec::new(),
            imports: Vec::new(),
            funcs: Vec::new(),
            globals: Vec::new(),
            exports: Vec::new(),
            start: None,
        }
    }

    pub fn add_struct_type(&mut self, ty: StructType) {
        self.struct_types.push(ty);
    }

    pub fn add_array_type(&mut self, ty: ArrayType) {
        self.array_types.push(ty);
    }

    pub fn add_func_type(&mut self, ty: FuncType) {
        self.func_types.push(ty);
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    pub fn add_function(&mut self, func: Function) {
        self.funcs.push(func);
    }

    pub fn add_global(&mut self, global: Global) {
        self.globals.push(global);
    }

    pub fn add_export(&mut self, export: Export) {
        self.exports.push(export);
    }

    pub fn set_start(&mut self, name: FuncName) {
        self.start = Some(name);
    }

    pub fn array_types(&self) -> &[ArrayType] {
        &self.array_types
    }

    pub fn func_types(&self) -> &[FuncType] {
        &self.func_types
    }

    pub fn struct_types(&self) -> &[StructType] {
        &self.struct_types
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn funcs(&self) -> &[Function] {
        &self.funcs
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    pub fn start(&self) -> Option<&FuncName> {
        self.start.as_ref()
    }

    /// The struct types of the recursive type group, topologically
    /// sorted so that every type appears after its declared super.
    ///
    /// Kahn-style: each pass emits the types whose super is absent or
    /// already emitted; reaching a fixed point with types left over
    /// means the subtype relation is cyclic.
    pub fn rec_group_types(&self) -> Result<Vec<&StructType>, BackendError> {
        let mut sorted = Vec::with_capacity(self.struct_types.len());
        let mut emitted: IndexSet<&TypeName> = IndexSet::new();
        let mut remaining: Vec<&StructType> = self.struct_types.iter().collect();

        while !remaining.is_empty() {
            let (ready, deferred): (Vec<_>, Vec<_>) = remaining.into_iter().partition(|ty| {
                ty.super_type
                    .as_ref()
                    .map_or(true, |super_type| emitted.contains(super_type))
            });

            if ready.is_empty() {
                return Err(BackendError::CyclicSubtype(
                    deferred.into_iter().map(|ty| ty.name.clone()).collect(),
                ));
            }

            for ty in ready {
                emitted.insert(&ty.name);
                sorted.push(ty);
            }

            remaining = deferred;
        }

        Ok(sorted)
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}
