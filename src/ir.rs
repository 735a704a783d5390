//! The linked intermediate representation consumed by the backend.
//!
//! An upstream linker supplies a flat, fully resolved set of classes. The
//! definitions here mirror that contract: no name resolution happens in
//! this crate, and every cross-class reference is by name.

pub mod trees;
pub mod types;
pub mod visit;

use std::fmt::{self, Display};

use indexmap::IndexMap;

use trees::{ExportedMember, Tree};
use types::{Type, TypeRef};

/// The name of the root class of the hierarchy.
pub const OBJECT_CLASS: &str = "java.lang.Object";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName(String);

impl ClassName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn object() -> Self {
        Self(OBJECT_CLASS.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(String);

impl FieldName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A method name together with the type references of its signature.
///
/// Two methods override one another iff their `MethodName`s are equal;
/// the class qualifier is deliberately not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodName {
    pub simple_name: String,
    pub param_refs: Vec<TypeRef>,
    pub result_ref: TypeRef,
}

impl MethodName {
    pub fn new(
        simple_name: impl Into<String>,
        param_refs: Vec<TypeRef>,
        result_ref: TypeRef,
    ) -> Self {
        Self {
            simple_name: simple_name.into(),
            param_refs,
            result_ref,
        }
    }

    /// Derives the argument types of the method from its type references.
    pub fn param_types(&self) -> Vec<Type> {
        self.param_refs.iter().map(TypeRef::to_type).collect()
    }

    /// Derives the result type of the method from its type reference.
    pub fn result_type(&self) -> Type {
        self.result_ref.to_type()
    }
}

impl Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.simple_name)?;

        for param in &self.param_refs {
            write!(f, "{}", param)?;
        }

        write!(f, "){}", self.result_ref)
    }
}

/// The fully qualified name of a function: the owning class plus the
/// method name within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionName {
    pub class_name: ClassName,
    pub method_name: MethodName,
}

impl FunctionName {
    pub fn new(class_name: ClassName, method_name: MethodName) -> Self {
        Self {
            class_name,
            method_name,
        }
    }
}

impl Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class_name, self.method_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    ModuleClass,
    Interface,
    AbstractClass,
    HijackedClass,
    JsClass,
    JsModuleClass,
    NativeJsClass,
}

impl ClassKind {
    pub fn is_interface(self) -> bool {
        self == Self::Interface
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodNamespace {
    Public,
    Static,
    Private,
    Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub tpe: Type,
}

/// A method definition of a linked class. `body` is absent for abstract
/// methods that survived linking.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub namespace: MethodNamespace,
    pub name: MethodName,
    pub args: Vec<ParamDef>,
    pub result_type: Type,
    pub body: Option<Tree>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: FieldName,
    pub tpe: Type,
}

/// Where a JS-native class or member is loaded from at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsNativeLoadSpec {
    Global {
        global_ref: String,
        path: Vec<String>,
    },
    Import {
        module: String,
        path: Vec<String>,
    },
}

/// A class as produced by the upstream linker.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedClass {
    pub name: ClassName,
    pub kind: ClassKind,
    pub methods: Vec<MethodDef>,
    pub fields: Vec<FieldDef>,
    pub super_class: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    /// Includes the class itself and every transitive super class and
    /// interface.
    pub ancestors: Vec<ClassName>,
    pub js_native_load_spec: Option<JsNativeLoadSpec>,
    pub js_native_members: IndexMap<MethodName, JsNativeLoadSpec>,
    pub exported_members: Vec<ExportedMember>,
}

/// An entry point to run at module instantiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleInitializer {
    VoidMainMethod {
        class_name: ClassName,
        method_name: MethodName,
    },

    /// Recognized but ignored: argument vectors are not materializable
    /// yet.
    // TODO: support argv once the runtime grows a string-array constructor
    MainMethodWithArgs {
        class_name: ClassName,
        method_name: MethodName,
        args: Vec<String>,
    },
}
