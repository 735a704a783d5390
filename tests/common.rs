#![allow(dead_code)]

use indexmap::IndexMap;

use lowasm::ir::trees::{Block, ExportedMember, Tree};
use lowasm::ir::types::{PrimRef, Type, TypeRef};
use lowasm::ir::{
    ClassKind, ClassName, FieldDef, FieldName, LinkedClass, MethodDef, MethodName, MethodNamespace,
};

/// A nullary method name with the given result type reference.
pub fn method_name(simple: &str, result_ref: TypeRef) -> MethodName {
    MethodName::new(simple, vec![], result_ref)
}

pub fn void_method_name(simple: &str) -> MethodName {
    method_name(simple, TypeRef::Prim(PrimRef::Void))
}

pub fn int_method_name(simple: &str) -> MethodName {
    method_name(simple, TypeRef::Prim(PrimRef::Int))
}

pub fn empty_body() -> Tree {
    Tree::Block(Block { stats: vec![] })
}

pub struct ClassBuilder {
    class: LinkedClass,
}

impl ClassBuilder {
    pub fn new(name: &str, kind: ClassKind) -> Self {
        Self {
            class: LinkedClass {
                name: ClassName::new(name),
                kind,
                methods: vec![],
                fields: vec![],
                super_class: None,
                interfaces: vec![],
                ancestors: vec![ClassName::new(name)],
                js_native_load_spec: None,
                js_native_members: IndexMap::new(),
                exported_members: vec![],
            },
        }
    }

    pub fn super_class(mut self, name: &str) -> Self {
        self.class.super_class = Some(ClassName::new(name));
        self.class.ancestors.push(ClassName::new(name));

        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.class.interfaces.push(ClassName::new(name));
        self.class.ancestors.push(ClassName::new(name));

        self
    }

    pub fn method(mut self, namespace: MethodNamespace, name: MethodName, body: Option<Tree>) -> Self {
        let result_type = name.result_type();

        self.class.methods.push(MethodDef {
            namespace,
            name,
            args: vec![],
            result_type,
            body,
        });

        self
    }

    pub fn concrete_method(self, name: MethodName) -> Self {
        self.method(MethodNamespace::Public, name, Some(empty_body()))
    }

    pub fn abstract_method(self, name: MethodName) -> Self {
        self.method(MethodNamespace::Public, name, None)
    }

    pub fn method_with_body(self, name: MethodName, body: Tree) -> Self {
        self.method(MethodNamespace::Public, name, Some(body))
    }

    pub fn exported_member(mut self, name: &str, body: Tree) -> Self {
        self.class.exported_members.push(ExportedMember {
            name: name.to_owned(),
            body,
        });

        self
    }

    pub fn field(mut self, name: &str, tpe: Type) -> Self {
        self.class.fields.push(FieldDef {
            name: FieldName::new(name),
            tpe,
        });

        self
    }

    pub fn build(self) -> LinkedClass {
        self.class
    }
}
