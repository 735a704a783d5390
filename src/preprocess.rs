//! Builds the class-info table from the linked classes.
//!
//! Pass 1 maps every class to a `ClassInfo`. Pass 2 walks all method
//! bodies and exported members to reinstate abstract method slots: the
//! upstream linker drops abstract declarations whose only role was to be
//! overridden, but virtual dispatch through a reference typed as the
//! abstract base still needs a slot at the declaring level.

use tracing::trace_span;

use crate::context::{ClassInfo, FieldInfo, FunctionInfo, WasmContext};
use crate::errors::BackendError;
use crate::ir::trees::Apply;
use crate::ir::types::Type;
use crate::ir::visit::Visitor;
use crate::ir::{FunctionName, LinkedClass, MethodNamespace};

/// Runs both preprocessing passes over the linked classes.
pub fn preprocess(ctx: &mut WasmContext, classes: &[LinkedClass]) -> Result<(), BackendError> {
    register_class_infos(ctx, classes);
    recover_abstract_methods(ctx, classes)
}

/// Pass 1: registers a `ClassInfo` for every linked class.
pub fn register_class_infos(ctx: &mut WasmContext, classes: &[LinkedClass]) {
    for class in classes {
        ctx.add_class_info(build_class_info(class));
    }
}

/// Derives a `ClassInfo` from a linked class.
///
/// Constructors are excluded from `methods`: they are never virtually
/// dispatched and must not occupy vtable slots.
fn build_class_info(class: &LinkedClass) -> ClassInfo {
    let methods = class
        .methods
        .iter()
        .filter(|method| method.namespace != MethodNamespace::Constructor)
        .map(|method| FunctionInfo {
            name: FunctionName::new(class.name.clone(), method.name.clone()),
            arg_types: method.args.iter().map(|param| param.tpe.clone()).collect(),
            result_type: method.result_type.clone(),
            is_abstract: method.body.is_none(),
        })
        .collect();

    let fields = class
        .fields
        .iter()
        .map(|field| FieldInfo {
            name: field.name.clone(),
            tpe: field.tpe.clone(),
        })
        .collect();

    ClassInfo {
        name: class.name.clone(),
        kind: class.kind,
        methods,
        fields,
        super_class: class.super_class.clone(),
        interfaces: class.interfaces.clone(),
        ancestors: class.ancestors.clone(),
        js_native_load_spec: class.js_native_load_spec.clone(),
        js_native_members: class.js_native_members.clone(),
    }
}

/// Pass 2: walks every body looking for calls whose receiver is typed as
/// a class that no longer declares the called method, and appends a
/// synthetic abstract slot there. Appending only makes this idempotent.
pub fn recover_abstract_methods(
    ctx: &mut WasmContext,
    classes: &[LinkedClass],
) -> Result<(), BackendError> {
    let mut collector = AbstractMethodCollector { ctx, error: None };

    for class in classes {
        let span = trace_span!("recover_abstract_methods", class = %class.name);
        let _span = span.enter();

        for method in &class.methods {
            if let Some(body) = &method.body {
                collector.visit_tree(body);
            }
        }

        for member in &class.exported_members {
            collector.visit_tree(&member.body);
        }
    }

    match collector.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

struct AbstractMethodCollector<'ctx> {
    ctx: &'ctx mut WasmContext,
    error: Option<BackendError>,
}

impl Visitor for AbstractMethodCollector<'_> {
    fn visit_apply(&mut self, apply: &Apply) {
        if self.error.is_some() {
            return;
        }

        if let Type::Class(class_name) = apply.receiver.tpe() {
            if let Err(error) = self
                .ctx
                .register_possible_abstract_call(&class_name, &apply.method_name)
            {
                self.error = Some(error);
                return;
            }
        }

        apply.recurse(self);
    }
}
