use std::fmt::{self, Display};

use crate::ir::{ClassName, FunctionName};
use crate::try_match;

/// The name of a type definition. Names are value types; the emitter
/// resolves them to dense indices at serialization time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    /// The struct type of a class's instances.
    Class(ClassName),

    /// The struct type of a class's vtable.
    VTable(ClassName),

    /// The struct type of an interface's itable.
    ITable(ClassName),

    /// An interned function signature.
    FuncSig(u32),

    /// The built-in array type holding the itables of an instance.
    ItablesArray,
}

impl Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => write!(f, "{}", name),
            Self::VTable(name) => write!(f, "{}.vtable", name),
            Self::ITable(name) => write!(f, "{}.itable", name),
            Self::FuncSig(idx) => write!(f, "sig{}", idx),
            Self::ItablesArray => write!(f, "itables"),
        }
    }
}

/// The name of an imported or defined function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FuncName {
    /// A function that corresponds to an IR method.
    Method(FunctionName),

    /// An imported runtime helper, identified by its field name.
    Helper(&'static str),

    /// The synthesized start function.
    Start,
}

impl FuncName {
    pub fn as_method(&self) -> Option<&FunctionName> {
        try_match!(self, Self::Method(name) => name)
    }
}

impl Display for FuncName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(name) => write!(f, "{}", name),
            Self::Helper(name) => write!(f, "{}", name),
            Self::Start => write!(f, "start"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlobalName {
    /// An interned string constant. Indices start at 1.
    StringConst(u32),

    /// The vtable instance of a class.
    VTable(ClassName),

    /// The itables array of a class.
    ITables(ClassName),
}

impl Display for GlobalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StringConst(idx) => write!(f, "string{}", idx),
            Self::VTable(name) => write!(f, "{}.vtable", name),
            Self::ITables(name) => write!(f, "{}.itables", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalName(String);

impl LocalName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Display for LocalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An opaque label identity. Two labels are the same scope iff their ids
/// are equal; the relative depth is computed only at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(u32);

/// Hands out fresh label identities, one generator per function body.
#[derive(Debug, Default)]
pub struct LabelGen {
    next: u32,
}

impl LabelGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> LabelId {
        let id = LabelId(self.next);
        self.next += 1;

        id
    }
}
