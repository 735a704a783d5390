//! Serializes a module to the Wasm binary format with the GC and
//! typed-reference extensions.
//!
//! Emission is read-only: all names are resolved to dense indices here,
//! against the index spaces fixed by declaration order (imports before
//! defined functions; struct types topologically sorted, then function
//! types, then array types).

use indexmap::IndexMap;
use tracing::debug;

use crate::errors::BackendError;
use crate::wasm::instrs::{BlockType, Immediate, Instr};
use crate::wasm::names::{FuncName, GlobalName, LabelId, LocalName, TypeName};
use crate::wasm::types::{HeapType, StorageType, ValType};
use crate::wasm::{Expr, ExportKind, Function, ImportDesc, Module};

const SECTION_TYPE: u8 = 0x01;
const SECTION_IMPORT: u8 = 0x02;
const SECTION_FUNCTION: u8 = 0x03;
const SECTION_GLOBAL: u8 = 0x06;
const SECTION_EXPORT: u8 = 0x07;
const SECTION_START: u8 = 0x08;
const SECTION_CODE: u8 = 0x0A;

const END_OPCODE: u8 = 0x0B;

/// Serializes the module to bytes.
pub fn emit_module(module: &Module) -> Result<Vec<u8>, BackendError> {
    Emitter::new(module)?.emit()
}

/// A growable byte buffer with the binary-format primitives.
#[derive(Default)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn byte(&mut self, b: u8) {
        self.bytes.push(b);
    }

    pub fn boolean(&mut self, b: bool) {
        self.byte(b as u8);
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Unsigned LEB128, over the 64-bit widening of the value.
    pub fn u32(&mut self, value: u32) {
        let mut value = value as u64;

        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;

            if value == 0 {
                self.byte(byte);
                break;
            }

            self.byte(byte | 0x80);
        }
    }

    /// Signed LEB128 over 64 bits.
    pub fn s64(&mut self, mut value: i64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;

            let sign_clear = byte & 0x40 == 0;

            if (value == 0 && sign_clear) || (value == -1 && !sign_clear) {
                self.byte(byte);
                break;
            }

            self.byte(byte | 0x80);
        }
    }

    pub fn s32(&mut self, value: i32) {
        self.s64(value as i64);
    }

    /// Signed LEB128 of the unsigned widening of a 32-bit value, so bit
    /// 31 is never sign-extended. The format requires this for type
    /// indices in heap-type position.
    pub fn s33_of_u32(&mut self, value: u32) {
        self.s64(value as i64);
    }

    pub fn f32(&mut self, value: f32) {
        self.raw(&value.to_le_bytes());
    }

    pub fn f64(&mut self, value: f64) {
        self.raw(&value.to_le_bytes());
    }

    /// An opcode: one byte, or two bytes big-endian.
    pub fn opcode(&mut self, opcode: u32) -> Result<(), BackendError> {
        if opcode <= 0xFF {
            self.byte(opcode as u8);
        } else if opcode <= 0xFFFF {
            self.byte((opcode >> 8) as u8);
            self.byte(opcode as u8);
        } else {
            return Err(BackendError::OpcodeTooWide(opcode));
        }

        Ok(())
    }

    /// A UTF-8 name: byte length, then the bytes.
    pub fn name(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.raw(s.as_bytes());
    }

    /// A vector: element count, then each element.
    fn vec<T>(
        &mut self,
        items: impl ExactSizeIterator<Item = T>,
        mut f: impl FnMut(&mut Self, T) -> Result<(), BackendError>,
    ) -> Result<(), BackendError> {
        self.u32(items.len() as u32);

        for item in items {
            f(self, item)?;
        }

        Ok(())
    }

    /// An optional value, encoded as a vector of zero or one elements.
    fn opt<T>(
        &mut self,
        value: Option<T>,
        f: impl FnMut(&mut Self, T) -> Result<(), BackendError>,
    ) -> Result<(), BackendError> {
        self.vec(value.into_iter(), f)
    }

    /// Emits the inner bytes to a child buffer, then their length
    /// followed by the bytes themselves.
    fn byte_length_sub_section(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), BackendError>,
    ) -> Result<(), BackendError> {
        let mut child = Buffer::new();
        f(&mut child)?;

        self.u32(child.bytes.len() as u32);
        self.raw(&child.bytes);

        Ok(())
    }
}

struct Emitter<'a> {
    module: &'a Module,
    types: IndexMap<&'a TypeName, u32>,
    funcs: IndexMap<&'a FuncName, u32>,
    globals: IndexMap<&'a GlobalName, u32>,
    locals: Option<IndexMap<&'a LocalName, u32>>,
    labels: Vec<Option<LabelId>>,
}

impl<'a> Emitter<'a> {
    fn new(module: &'a Module) -> Result<Self, BackendError> {
        let mut types = IndexMap::new();

        for ty in module.rec_group_types()? {
            types.insert(&ty.name, types.len() as u32);
        }

        for ty in module.func_types() {
            types.insert(&ty.name, types.len() as u32);
        }

        for ty in module.array_types() {
            types.insert(&ty.name, types.len() as u32);
        }

        let mut funcs = IndexMap::new();

        for import in module.imports() {
            let ImportDesc::Func { name, .. } = &import.desc;
            funcs.insert(name, funcs.len() as u32);
        }

        for func in module.funcs() {
            funcs.insert(&func.name, funcs.len() as u32);
        }

        let mut globals = IndexMap::new();

        for global in module.globals() {
            globals.insert(&global.name, globals.len() as u32);
        }

        Ok(Self {
            module,
            types,
            funcs,
            globals,
            locals: None,
            labels: Vec::new(),
        })
    }

    fn type_idx(&self, name: &TypeName) -> u32 {
        *self
            .types
            .get(name)
            .unwrap_or_else(|| panic!("the type {} was never declared", name))
    }

    fn func_idx(&self, name: &FuncName) -> u32 {
        *self
            .funcs
            .get(name)
            .unwrap_or_else(|| panic!("the function {} was never declared", name))
    }

    fn global_idx(&self, name: &GlobalName) -> u32 {
        *self
            .globals
            .get(name)
            .unwrap_or_else(|| panic!("the global {} was never declared", name))
    }

    fn emit(mut self) -> Result<Vec<u8>, BackendError> {
        let mut out = Buffer::new();

        out.raw(b"\0asm");
        out.raw(&[0x01, 0x00, 0x00, 0x00]);

        self.type_section(&mut out)?;
        self.import_section(&mut out)?;
        self.function_section(&mut out)?;
        self.global_section(&mut out)?;
        self.export_section(&mut out)?;
        self.start_section(&mut out)?;
        self.code_section(&mut out)?;

        let bytes = out.into_bytes();
        debug!(len = bytes.len(), "emitted a module");

        Ok(bytes)
    }

    fn section(
        out: &mut Buffer,
        id: u8,
        f: impl FnOnce(&mut Buffer) -> Result<(), BackendError>,
    ) -> Result<(), BackendError> {
        out.byte(id);
        out.byte_length_sub_section(f)
    }

    /// All type definitions, wrapped in one recursive group: struct
    /// types first (topologically sorted), then function types, then
    /// array types. The order fixes every type index.
    fn type_section(&mut self, out: &mut Buffer) -> Result<(), BackendError> {
        let structs = self.module.rec_group_types()?;
        let func_types = self.module.func_types();
        let array_types = self.module.array_types();

        Self::section(out, SECTION_TYPE, |out| {
            out.u32(1);
            out.byte(0x4E);
            out.u32((structs.len() + func_types.len() + array_types.len()) as u32);

            for ty in &structs {
                out.byte(0x50);
                out.opt(ty.super_type.as_ref(), |out, super_type| {
                    out.u32(self.type_idx(super_type));
                    Ok(())
                })?;
                out.byte(0x5F);
                out.vec(ty.fields.iter(), |out, field| {
                    self.storage_type(out, &field.ty)?;
                    out.boolean(field.mutable);
                    Ok(())
                })?;
            }

            for ty in func_types {
                out.byte(0x60);
                out.vec(ty.params.iter(), |out, param| self.storage_type(out, param))?;
                out.vec(ty.results.iter(), |out, result| {
                    self.storage_type(out, result)
                })?;
            }

            for ty in array_types {
                out.byte(0x5E);
                self.storage_type(out, &ty.elem)?;
                out.boolean(ty.mutable);
            }

            Ok(())
        })
    }

    fn import_section(&mut self, out: &mut Buffer) -> Result<(), BackendError> {
        Self::section(out, SECTION_IMPORT, |out| {
            out.vec(self.module.imports().iter(), |out, import| {
                out.name(&import.module);
                out.name(&import.field);

                let ImportDesc::Func { type_name, .. } = &import.desc;
                out.byte(0x00);
                out.u32(self.type_idx(type_name));

                Ok(())
            })
        })
    }

    fn function_section(&mut self, out: &mut Buffer) -> Result<(), BackendError> {
        Self::section(out, SECTION_FUNCTION, |out| {
            out.vec(self.module.funcs().iter(), |out, func| {
                out.u32(self.type_idx(&func.type_name));
                Ok(())
            })
        })
    }

    fn global_section(&mut self, out: &mut Buffer) -> Result<(), BackendError> {
        Self::section(out, SECTION_GLOBAL, |out| {
            let globals = self.module.globals();
            out.u32(globals.len() as u32);

            for global in globals {
                self.val_type(out, &global.ty)?;
                out.boolean(global.mutable);
                self.expr(out, &global.init)?;
            }

            Ok(())
        })
    }

    fn export_section(&mut self, out: &mut Buffer) -> Result<(), BackendError> {
        Self::section(out, SECTION_EXPORT, |out| {
            out.vec(self.module.exports().iter(), |out, export| {
                out.name(&export.name);

                match &export.kind {
                    ExportKind::Func(name) => {
                        out.byte(0x00);
                        out.u32(self.func_idx(name));
                    }

                    ExportKind::Global(name) => {
                        out.byte(0x03);
                        out.u32(self.global_idx(name));
                    }
                }

                Ok(())
            })
        })
    }

    fn start_section(&mut self, out: &mut Buffer) -> Result<(), BackendError> {
        let Some(start) = self.module.start() else {
            return Ok(());
        };

        Self::section(out, SECTION_START, |out| {
            out.u32(self.func_idx(start));
            Ok(())
        })
    }

    fn code_section(&mut self, out: &mut Buffer) -> Result<(), BackendError> {
        Self::section(out, SECTION_CODE, |out| {
            let funcs = self.module.funcs();
            out.u32(funcs.len() as u32);

            for func in funcs {
                out.byte_length_sub_section(|out| self.func_body(out, func))?;
            }

            Ok(())
        })
    }

    /// A function body: the non-parameter locals (one count-1 record
    /// each), then the expression. Local indices are the parameters in
    /// declaration order from 0, then the non-parameter locals.
    fn func_body(&mut self, out: &mut Buffer, func: &'a Function) -> Result<(), BackendError> {
        out.vec(func.locals.iter(), |out, local| {
            out.u32(1);
            self.val_type(out, &local.ty)
        })?;

        let mut locals = IndexMap::new();

        for local in func.params.iter().chain(&func.locals) {
            locals.insert(&local.name, locals.len() as u32);
        }

        self.locals = Some(locals);
        let result = self.expr(out, &func.body);
        self.locals = None;

        result
    }

    fn expr(&mut self, out: &mut Buffer, expr: &Expr) -> Result<(), BackendError> {
        for instr in &expr.instrs {
            self.instr(out, instr)?;
        }

        out.byte(END_OPCODE);

        Ok(())
    }

    fn instr(&mut self, out: &mut Buffer, instr: &Instr) -> Result<(), BackendError> {
        out.opcode(instr.opcode())?;

        for immediate in instr.immediates() {
            self.immediate(out, &immediate)?;
        }

        if let Some(label) = instr.opened_label() {
            self.labels.push(label);
        } else if matches!(instr, Instr::End) {
            self.labels.pop();
        }

        Ok(())
    }

    fn immediate(&mut self, out: &mut Buffer, immediate: &Immediate) -> Result<(), BackendError> {
        match immediate {
            Immediate::I32(value) => out.s32(*value),
            Immediate::I64(value) => out.s64(*value),
            Immediate::F32(value) => out.f32(*value),
            Immediate::F64(value) => out.f64(*value),

            Immediate::MemArg(mem_arg) => {
                out.u32(mem_arg.offset);
                out.u32(mem_arg.align);
            }

            Immediate::BlockType(BlockType::Empty) => out.byte(0x40),
            Immediate::BlockType(BlockType::Value(ty)) => self.val_type(out, ty)?,
            Immediate::BlockType(BlockType::Func(name)) => {
                out.s33_of_u32(self.type_idx(name));
            }

            Immediate::Func(name) => out.u32(self.func_idx(name)),
            Immediate::Type(name) => out.u32(self.type_idx(name)),
            Immediate::Global(name) => out.u32(self.global_idx(name)),
            Immediate::StructField(idx) => out.u32(*idx),

            Immediate::Local(name) => {
                let locals = self
                    .locals
                    .as_ref()
                    .ok_or_else(|| BackendError::LocalsUnavailable(name.clone()))?;
                let idx = *locals
                    .get(name)
                    .unwrap_or_else(|| panic!("the local {} was never declared", name));

                out.u32(idx);
            }

            Immediate::Label(label) => out.u32(self.resolve_label(*label)?),

            Immediate::Heap(heap) => self.heap_type(out, heap)?,

            Immediate::CastFlags {
                nullable1,
                nullable2,
            } => {
                out.byte((*nullable1 as u8) | ((*nullable2 as u8) << 1));
            }

            Immediate::LabelVector(_) => {
                return Err(BackendError::UnsupportedImmediate("LabelIdxVector"));
            }

            Immediate::Table(_) => {
                return Err(BackendError::UnsupportedImmediate("TableIdx"));
            }

            Immediate::Tag(_) => {
                return Err(BackendError::UnsupportedImmediate("TagIdx"));
            }
        }

        Ok(())
    }

    /// Resolves a label identity to its relative depth: the distance
    /// from the innermost open frame to the nearest frame carrying the
    /// identity. Unlabeled frames still count toward the depth.
    fn resolve_label(&self, label: LabelId) -> Result<u32, BackendError> {
        self.labels
            .iter()
            .rev()
            .position(|frame| frame == &Some(label))
            .map(|depth| depth as u32)
            .ok_or(BackendError::LabelOutOfScope(label))
    }

    fn val_type(&self, out: &mut Buffer, ty: &ValType) -> Result<(), BackendError> {
        match ty {
            ValType::I32 => out.byte(0x7F),
            ValType::I64 => out.byte(0x7E),
            ValType::F32 => out.byte(0x7D),
            ValType::F64 => out.byte(0x7C),
            ValType::AnyRef => out.byte(0x6E),

            ValType::Ref(heap) => {
                out.byte(0x64);
                self.heap_type(out, heap)?;
            }

            ValType::RefNull(heap) => {
                out.byte(0x63);
                self.heap_type(out, heap)?;
            }
        }

        Ok(())
    }

    fn storage_type(&self, out: &mut Buffer, ty: &StorageType) -> Result<(), BackendError> {
        match ty {
            StorageType::Val(ty) => self.val_type(out, ty),

            StorageType::I8 => {
                out.byte(0x78);
                Ok(())
            }

            StorageType::I16 => {
                out.byte(0x77);
                Ok(())
            }
        }
    }

    fn heap_type(&self, out: &mut Buffer, heap: &HeapType) -> Result<(), BackendError> {
        match heap {
            HeapType::Type(name) | HeapType::Func(name) => {
                out.s33_of_u32(self.type_idx(name));
            }

            HeapType::Simple(simple) => out.byte(simple.code()),
        }

        Ok(())
    }
}
