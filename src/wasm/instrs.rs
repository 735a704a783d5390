use super::names::{FuncName, GlobalName, LabelId, LocalName, TypeName};
use super::types::{HeapType, ValType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemArg {
    pub offset: u32,
    pub align: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockType {
    Empty,
    Value(ValType),
    Func(TypeName),
}

/// One immediate of an instruction. The emitter encodes each form per
/// the binary format; `LabelVector`, `Table` and `Tag` are declared for
/// completeness of the instruction grammar but rejected at emission.
#[derive(Debug, Clone, PartialEq)]
pub enum Immediate {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    MemArg(MemArg),
    BlockType(BlockType),
    Func(FuncName),
    Label(LabelId),
    LabelVector(Vec<LabelId>),
    Type(TypeName),
    Local(LocalName),
    Global(GlobalName),
    StructField(u32),
    Heap(HeapType),
    CastFlags { nullable1: bool, nullable2: bool },
    Table(u32),
    Tag(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    // control
    Unreachable,
    Nop,
    Block { label: Option<LabelId>, ty: BlockType },
    Loop { label: Option<LabelId>, ty: BlockType },
    If { label: Option<LabelId>, ty: BlockType },
    Else,
    End,
    Br(LabelId),
    BrIf(LabelId),
    BrTable { labels: Vec<LabelId>, default: LabelId },
    Return,
    Call(FuncName),
    CallIndirect { ty: TypeName, table: u32 },
    ReturnCall(FuncName),
    CallRef(TypeName),

    // parametric
    Drop,
    Select,

    // variables
    LocalGet(LocalName),
    LocalSet(LocalName),
    LocalTee(LocalName),
    GlobalGet(GlobalName),
    GlobalSet(GlobalName),

    // constants
    I32Const(i32),
    I64Const(i64),
    F32Const(f32),
    F64Const(f64),

    // i32
    I32Eqz,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32GtS,
    I32GtU,
    I32LeS,
    I32LeU,
    I32GeS,
    I32GeU,
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32RemS,
    I32And,
    I32Or,
    I32Xor,
    I32Shl,
    I32ShrS,
    I32ShrU,

    // i64
    I64Eqz,
    I64Eq,
    I64Ne,
    I64LtS,
    I64Add,
    I64Sub,
    I64Mul,

    // f32
    F32Eq,
    F32Ne,
    F32Add,
    F32Sub,
    F32Mul,
    F32Div,

    // f64
    F64Eq,
    F64Ne,
    F64Lt,
    F64Add,
    F64Sub,
    F64Mul,
    F64Div,

    // conversions
    I32WrapI64,
    I64ExtendI32S,
    F32DemoteF64,
    F64ConvertI32S,
    F64PromoteF32,

    // references
    RefNull(HeapType),
    RefIsNull,
    RefFunc(FuncName),
    RefEq,
    RefAsNonNull,
    BrOnNull(LabelId),
    BrOnNonNull(LabelId),

    // gc
    StructNew(TypeName),
    StructNewDefault(TypeName),
    StructGet { ty: TypeName, field: u32 },
    StructSet { ty: TypeName, field: u32 },
    ArrayNew(TypeName),
    ArrayNewDefault(TypeName),
    ArrayNewFixed { ty: TypeName, len: i32 },
    ArrayGet(TypeName),
    ArrayGetS(TypeName),
    ArrayGetU(TypeName),
    ArraySet(TypeName),
    ArrayLen,
    RefTest(HeapType),
    RefTestNull(HeapType),
    RefCast(HeapType),
    RefCastNull(HeapType),
    BrOnCast {
        label: LabelId,
        nullable1: bool,
        nullable2: bool,
        from: HeapType,
        to: HeapType,
    },
    BrOnCastFail {
        label: LabelId,
        nullable1: bool,
        nullable2: bool,
        from: HeapType,
        to: HeapType,
    },
    AnyConvertExtern,
    ExternConvertAny,
    RefI31,
    I31GetS,
    I31GetU,
}

impl Instr {
    /// The opcode of this instruction: one byte, or two bytes emitted
    /// big-endian for the `0xFB`-prefixed forms.
    pub fn opcode(&self) -> u32 {
        match self {
            Self::Unreachable => 0x00,
            Self::Nop => 0x01,
            Self::Block { .. } => 0x02,
            Self::Loop { .. } => 0x03,
            Self::If { .. } => 0x04,
            Self::Else => 0x05,
            Self::End => 0x0B,
            Self::Br(_) => 0x0C,
            Self::BrIf(_) => 0x0D,
            Self::BrTable { .. } => 0x0E,
            Self::Return => 0x0F,
            Self::Call(_) => 0x10,
            Self::CallIndirect { .. } => 0x11,
            Self::ReturnCall(_) => 0x12,
            Self::CallRef(_) => 0x14,

            Self::Drop => 0x1A,
            Self::Select => 0x1B,

            Self::LocalGet(_) => 0x20,
            Self::LocalSet(_) => 0x21,
            Self::LocalTee(_) => 0x22,
            Self::GlobalGet(_) => 0x23,
            Self::GlobalSet(_) => 0x24,

            Self::I32Const(_) => 0x41,
            Self::I64Const(_) => 0x42,
            Self::F32Const(_) => 0x43,
            Self::F64Const(_) => 0x44,

            Self::I32Eqz => 0x45,
            Self::I32Eq => 0x46,
            Self::I32Ne => 0x47,
            Self::I32LtS => 0x48,
            Self::I32LtU => 0x49,
            Self::I32GtS => 0x4A,
            Self::I32GtU => 0x4B,
            Self::I32LeS => 0x4C,
            Self::I32LeU => 0x4D,
            Self::I32GeS => 0x4E,
            Self::I32GeU => 0x4F,

            Self::I64Eqz => 0x50,
            Self::I64Eq => 0x51,
            Self::I64Ne => 0x52,
            Self::I64LtS => 0x53,

            Self::F32Eq => 0x5B,
            Self::F32Ne => 0x5C,

            Self::F64Eq => 0x61,
            Self::F64Ne => 0x62,
            Self::F64Lt => 0x63,

            Self::I32Add => 0x6A,
            Self::I32Sub => 0x6B,
            Self::I32Mul => 0x6C,
            Self::I32DivS => 0x6D,
            Self::I32RemS => 0x6F,
            Self::I32And => 0x71,
            Self::I32Or => 0x72,
            Self::I32Xor => 0x73,
            Self::I32Shl => 0x74,
            Self::I32ShrS => 0x75,
            Self::I32ShrU => 0x76,

            Self::I64Add => 0x7C,
            Self::I64Sub => 0x7D,
            Self::I64Mul => 0x7E,

            Self::F32Add => 0x92,
            Self::F32Sub => 0x93,
            Self::F32Mul => 0x94,
            Self::F32Div => 0x95,

            Self::F64Add => 0xA0,
            Self::F64Sub => 0xA1,
            Self::F64Mul => 0xA2,
            Self::F64Div => 0xA3,

            Self::I32WrapI64 => 0xA7,
            Self::I64ExtendI32S => 0xAC,
            Self::F32DemoteF64 => 0xB6,
            Self::F64ConvertI32S => 0xB7,
            Self::F64PromoteF32 => 0xBB,

            Self::RefNull(_) => 0xD0,
            Self::RefIsNull => 0xD1,
            Self::RefFunc(_) => 0xD2,
            Self::RefEq => 0xD3,
            Self::RefAsNonNull => 0xD4,
            Self::BrOnNull(_) => 0xD5,
            Self::BrOnNonNull(_) => 0xD6,

            Self::StructNew(_) => 0xFB00,
            Self::StructNewDefault(_) => 0xFB01,
            Self::StructGet { .. } => 0xFB02,
            Self::StructSet { .. } => 0xFB05,
            Self::ArrayNew(_) => 0xFB06,
            Self::ArrayNewDefault(_) => 0xFB07,
            Self::ArrayNewFixed { .. } => 0xFB08,
            Self::ArrayGet(_) => 0xFB0B,
            Self::ArrayGetS(_) => 0xFB0C,
            Self::ArrayGetU(_) => 0xFB0D,
            Self::ArraySet(_) => 0xFB0E,
            Self::ArrayLen => 0xFB0F,
            Self::RefTest(_) => 0xFB14,
            Self::RefTestNull(_) => 0xFB15,
            Self::RefCast(_) => 0xFB16,
            Self::RefCastNull(_) => 0xFB17,
            Self::BrOnCast { .. } => 0xFB18,
            Self::BrOnCastFail { .. } => 0xFB19,
            Self::AnyConvertExtern => 0xFB1A,
            Self::ExternConvertAny => 0xFB1B,
            Self::RefI31 => 0xFB1C,
            Self::I31GetS => 0xFB1D,
            Self::I31GetU => 0xFB1E,
        }
    }

    /// The immediates of this instruction, in encoding order.
    pub fn immediates(&self) -> Vec<Immediate> {
        match self {
            Self::Block { ty, .. } | Self::Loop { ty, .. } | Self::If { ty, .. } => {
                vec![Immediate::BlockType(ty.clone())]
            }

            Self::Br(label)
            | Self::BrIf(label)
            | Self::BrOnNull(label)
            | Self::BrOnNonNull(label) => vec![Immediate::Label(*label)],

            Self::BrTable { labels, default } => vec![
                Immediate::LabelVector(labels.clone()),
                Immediate::Label(*default),
            ],

            Self::Call(func) | Self::ReturnCall(func) | Self::RefFunc(func) => {
                vec![Immediate::Func(func.clone())]
            }

            Self::CallIndirect { ty, table } => {
                vec![Immediate::Type(ty.clone()), Immediate::Table(*table)]
            }

            Self::CallRef(ty)
            | Self::StructNew(ty)
            | Self::StructNewDefault(ty)
            | Self::ArrayNew(ty)
            | Self::ArrayNewDefault(ty)
            | Self::ArrayGet(ty)
            | Self::ArrayGetS(ty)
            | Self::ArrayGetU(ty)
            | Self::ArraySet(ty) => vec![Immediate::Type(ty.clone())],

            Self::LocalGet(local) | Self::LocalSet(local) | Self::LocalTee(local) => {
                vec![Immediate::Local(local.clone())]
            }

            Self::GlobalGet(global) | Self::GlobalSet(global) => {
                vec![Immediate::Global(global.clone())]
            }

            Self::I32Const(value) => vec![Immediate::I32(*value)],
            Self::I64Const(value) => vec![Immediate::I64(*value)],
            Self::F32Const(value) => vec![Immediate::F32(*value)],
            Self::F64Const(value) => vec![Immediate::F64(*value)],

            Self::RefNull(heap) => vec![Immediate::Heap(heap.clone())],

            Self::StructGet { ty, field } | Self::StructSet { ty, field } => vec![
                Immediate::Type(ty.clone()),
                Immediate::StructField(*field),
            ],

            Self::ArrayNewFixed { ty, len } => {
                vec![Immediate::Type(ty.clone()), Immediate::I32(*len)]
            }

            Self::RefTest(heap)
            | Self::RefTestNull(heap)
            | Self::RefCast(heap)
            | Self::RefCastNull(heap) => vec![Immediate::Heap(heap.clone())],

            Self::BrOnCast {
                label,
                nullable1,
                nullable2,
                from,
                to,
            }
            | Self::BrOnCastFail {
                label,
                nullable1,
                nullable2,
                from,
                to,
            } => vec![
                Immediate::CastFlags {
                    nullable1: *nullable1,
                    nullable2: *nullable2,
                },
                Immediate::Label(*label),
                Immediate::Heap(from.clone()),
                Immediate::Heap(to.clone()),
            ],

            _ => vec![],
        }
    }

    /// The label identity this instruction opens, if it is a structured
    /// opener. `End` closes the innermost open frame.
    pub fn opened_label(&self) -> Option<Option<LabelId>> {
        match self {
            Self::Block { label, .. } | Self::Loop { label, .. } | Self::If { label, .. } => {
                Some(*label)
            }

            _ => None,
        }
    }
}
