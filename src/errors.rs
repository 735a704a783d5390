use std::error::Error;
use std::fmt::{self, Display};

use crate::ir::{ClassName, FieldName};
use crate::wasm::names::{LabelId, LocalName, TypeName};

/// An internal inconsistency in the linked input or in the module under
/// construction. None of these are recoverable: the caller handed the
/// backend something malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A class was referenced but never registered with the context.
    ClassNotFound(ClassName),

    /// VTable or itable resolution failed to locate a method slot.
    MethodNotFound {
        class_name: ClassName,
        method_name: String,
    },

    /// A field-index lookup named a field the class does not declare.
    FieldNotFound {
        class_name: ClassName,
        field_name: FieldName,
    },

    /// A branch referenced a label no enclosing block has opened.
    LabelOutOfScope(LabelId),

    /// A local index was requested outside any function-body frame.
    LocalsUnavailable(LocalName),

    /// An opcode does not fit the two-byte encoding.
    OpcodeTooWide(u32),

    /// The subtype relation between struct types contains a cycle.
    CyclicSubtype(Vec<TypeName>),

    /// The emitter was handed an immediate it declares but does not
    /// support (`LabelIdxVector`, `TableIdx`, `TagIdx`).
    UnsupportedImmediate(&'static str),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassNotFound(name) => {
                write!(f, "the class {} was not found in the context", name)
            }

            Self::MethodNotFound {
                class_name,
                method_name,
            } => {
                write!(
                    f,
                    "the method {} could not be resolved on the class {}",
                    method_name, class_name
                )
            }

            Self::FieldNotFound {
                class_name,
                field_name,
            } => {
                write!(
                    f,
                    "the class {} does not declare a field named {}",
                    class_name, field_name
                )
            }

            Self::LabelOutOfScope(label) => {
                write!(f, "the label {:?} is not opened by any enclosing block", label)
            }

            Self::LocalsUnavailable(local) => {
                write!(
                    f,
                    "the local {} was referenced outside a function-body frame",
                    local
                )
            }

            Self::OpcodeTooWide(opcode) => {
                write!(f, "the opcode {:#x} does not fit in two bytes", opcode)
            }

            Self::CyclicSubtype(unresolved) => {
                write!(
                    f,
                    "the subtype relation is cyclic; unresolved types: {:?}",
                    unresolved
                )
            }

            Self::UnsupportedImmediate(kind) => {
                write!(f, "the {} immediate is declared but not supported", kind)
            }
        }
    }
}

impl Error for BackendError {}
