use super::types::Type;
use super::{ClassName, FieldName, MethodName};

#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Block(Block),
    If(If),
    While(While),
    Assign(Assign),
    Select(Select),
    VarRef(VarRef),
    New(New),
    Apply(Apply),
    ApplyStatically(ApplyStatically),
    Return(Return),
    BooleanLit(bool),
    CharLit(u16),
    IntLit(i32),
    LongLit(i64),
    FloatLit(f32),
    DoubleLit(f64),
    StringLit(String),
    Null,
}

impl Tree {
    /// The static type of this expression.
    pub fn tpe(&self) -> Type {
        match self {
            Self::Block(block) => block
                .stats
                .last()
                .map(Tree::tpe)
                .unwrap_or(Type::Void),
            Self::If(if_) => if_.tpe.clone(),
            Self::While(_) => Type::Void,
            Self::Assign(_) => Type::Void,
            Self::Select(select) => select.tpe.clone(),
            Self::VarRef(var_ref) => var_ref.tpe.clone(),
            Self::New(new) => Type::Class(new.class_name.clone()),
            Self::Apply(apply) => apply.tpe.clone(),
            Self::ApplyStatically(apply) => apply.tpe.clone(),
            Self::Return(_) => Type::Nothing,
            Self::BooleanLit(_) => Type::Boolean,
            Self::CharLit(_) => Type::Char,
            Self::IntLit(_) => Type::Int,
            Self::LongLit(_) => Type::Long,
            Self::FloatLit(_) => Type::Float,
            Self::DoubleLit(_) => Type::Double,
            Self::StringLit(_) => Type::Any,
            Self::Null => Type::Nothing,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stats: Vec<Tree>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub cond: Box<Tree>,
    pub thenp: Box<Tree>,
    pub elsep: Box<Tree>,
    pub tpe: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub cond: Box<Tree>,
    pub body: Box<Tree>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub lhs: Box<Tree>,
    pub rhs: Box<Tree>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub receiver: Box<Tree>,
    pub field: FieldName,
    pub tpe: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: String,
    pub tpe: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct New {
    pub class_name: ClassName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyFlags {
    pub is_private: bool,
}

/// A virtually dispatched method call.
#[derive(Debug, Clone, PartialEq)]
pub struct Apply {
    pub flags: ApplyFlags,
    pub receiver: Box<Tree>,
    pub method_name: MethodName,
    pub args: Vec<Tree>,
    pub tpe: Type,
}

/// A statically dispatched method call (super calls, private calls).
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyStatically {
    pub flags: ApplyFlags,
    pub receiver: Box<Tree>,
    pub class_name: ClassName,
    pub method_name: MethodName,
    pub args: Vec<Tree>,
    pub tpe: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub expr: Box<Tree>,
}

/// A member exported to JS, carrying an arbitrary body tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedMember {
    pub name: String,
    pub body: Tree,
}
