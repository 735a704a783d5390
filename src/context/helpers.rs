//! The catalogue of runtime helpers the emitted module imports.
//!
//! The runtime library provides primitive boxing, string operations and
//! JS interop. Every helper is imported under the runtime class name
//! with its method name as the import field.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use paste::paste;

use crate::wasm::types::{HeapType, SimpleHeapType, StorageType, ValType};

/// The class name all runtime helpers live in; used as the Wasm import
/// module name.
pub const HELPERS_CLASS: &str = "__rt";

pub struct HelperFunc {
    pub name: &'static str,
    pub params: Vec<StorageType>,
    pub results: Vec<StorageType>,
}

macro_rules! helper_ty {
    (i32) => {
        StorageType::Val(ValType::I32)
    };
    (i64) => {
        StorageType::Val(ValType::I64)
    };
    (f32) => {
        StorageType::Val(ValType::F32)
    };
    (f64) => {
        StorageType::Val(ValType::F64)
    };
    (anyref) => {
        StorageType::Val(ValType::AnyRef)
    };
    (refany) => {
        StorageType::Val(ValType::Ref(HeapType::Simple(SimpleHeapType::Any)))
    };
}

macro_rules! define_helpers {
    ($( $section:ident { $( $key:ident => $name:literal : ( $($param:ident),* ) -> ( $($result:ident),* ) ),* $(,)? } )+) => {
        $( define_helpers!(@ $section, $( $key => $name : ( $($param),* ) -> ( $($result),* ) ),*); )+

        paste! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub enum HelperKey {
                $( $section([< $section HelperKey >]), )+
            }

            impl HelperKey {
                pub fn as_str(&self) -> &'static str {
                    match self {
                        $( Self::$section(key) => key.as_str(), )+
                    }
                }
            }

            $(
                impl From<[< $section HelperKey >]> for HelperKey {
                    fn from(key: [< $section HelperKey >]) -> HelperKey {
                        Self::$section(key)
                    }
                }
            )+

            /// All helpers, in catalogue order.
            pub fn helpers() -> impl Iterator<Item = (HelperKey, &'static HelperFunc)> {
                std::iter::empty()
                $( .chain([< $section:upper _HELPERS >].iter().map(|(&key, func)| (key.into(), func))) )+
            }
        }
    };

    (@ $section:ident, $( $key:ident => $name:literal : ( $($param:ident),* ) -> ( $($result:ident),* ) ),* ) => {
        paste! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub enum [< $section HelperKey >] {
                $( $key, )*
            }

            impl [< $section HelperKey >] {
                pub fn as_str(&self) -> &'static str {
                    match self {
                        $(
                            Self::$key => $name,
                        )*
                    }
                }
            }

            static [< $section:upper _HELPERS >]: Lazy<IndexMap<[< $section HelperKey >], HelperFunc>> = Lazy::new(|| {
                let mut map = IndexMap::new();

                $(
                    map.insert([< $section HelperKey >]::$key, HelperFunc {
                        name: $name,
                        params: vec![$( helper_ty!($param) ),*],
                        results: vec![$( helper_ty!($result) ),*],
                    });
                )*

                map
            });
        }
    }
}

define_helpers! {
    Core {
        Is => "is": (anyref, anyref) -> (i32),
        Undef => "undef": () -> (refany),
        IsUndef => "isUndef": (anyref) -> (i32),
    }

    Boxing {
        BoxBoolean => "boxBoolean": (i32) -> (anyref),
        UnboxBoolean => "unboxBoolean": (anyref) -> (i32),
        UnboxOrNullBoolean => "unboxOrNullBoolean": (anyref) -> (anyref),
        TypeTestBoolean => "typeTestBoolean": (anyref) -> (i32),

        BoxByte => "boxByte": (i32) -> (anyref),
        UnboxByte => "unboxByte": (anyref) -> (i32),
        UnboxOrNullByte => "unboxOrNullByte": (anyref) -> (anyref),
        TypeTestByte => "typeTestByte": (anyref) -> (i32),

        BoxShort => "boxShort": (i32) -> (anyref),
        UnboxShort => "unboxShort": (anyref) -> (i32),
        UnboxOrNullShort => "unboxOrNullShort": (anyref) -> (anyref),
        TypeTestShort => "typeTestShort": (anyref) -> (i32),

        BoxInt => "boxInt": (i32) -> (anyref),
        UnboxInt => "unboxInt": (anyref) -> (i32),
        UnboxOrNullInt => "unboxOrNullInt": (anyref) -> (anyref),
        TypeTestInt => "typeTestInt": (anyref) -> (i32),

        BoxFloat => "boxFloat": (f32) -> (anyref),
        UnboxFloat => "unboxFloat": (anyref) -> (f32),
        UnboxOrNullFloat => "unboxOrNullFloat": (anyref) -> (anyref),
        TypeTestFloat => "typeTestFloat": (anyref) -> (i32),

        BoxDouble => "boxDouble": (f64) -> (anyref),
        UnboxDouble => "unboxDouble": (anyref) -> (f64),
        UnboxOrNullDouble => "unboxOrNullDouble": (anyref) -> (anyref),
        TypeTestDouble => "typeTestDouble": (anyref) -> (i32),
    }

    Str {
        EmptyString => "emptyString": () -> (refany),
        StringLength => "stringLength": (refany) -> (i32),
        StringCharAt => "stringCharAt": (refany, i32) -> (i32),
        JsValueToString => "jsValueToString": (anyref) -> (refany),
        BooleanToString => "booleanToString": (i32) -> (refany),
        CharToString => "charToString": (i32) -> (refany),
        IntToString => "intToString": (i32) -> (refany),
        LongToString => "longToString": (i64) -> (refany),
        DoubleToString => "doubleToString": (f64) -> (refany),
        StringConcat => "stringConcat": (refany, refany) -> (refany),
        IsString => "isString": (anyref) -> (i32),
    }

    JsInterop {
        JsValueHashCode => "jsValueHashCode": (anyref) -> (i32),
        JsGlobalRefGet => "jsGlobalRefGet": (refany) -> (anyref),
        JsGlobalRefSet => "jsGlobalRefSet": (refany, anyref) -> (),
        JsGlobalRefTypeof => "jsGlobalRefTypeof": (refany) -> (refany),
        JsNewArray => "jsNewArray": () -> (anyref),
        JsArrayPush => "jsArrayPush": (anyref, anyref) -> (anyref),
        JsArraySpreadPush => "jsArraySpreadPush": (anyref, anyref) -> (anyref),
        JsNewObject => "jsNewObject": () -> (anyref),
        JsObjectPush => "jsObjectPush": (anyref, anyref, anyref) -> (anyref),
        JsSelect => "jsSelect": (anyref, anyref) -> (anyref),
        JsSelectSet => "jsSelectSet": (anyref, anyref, anyref) -> (),
        JsNew => "jsNew": (anyref, anyref) -> (anyref),
        JsFunctionApply => "jsFunctionApply": (anyref, anyref) -> (anyref),
        JsMethodApply => "jsMethodApply": (anyref, anyref, anyref) -> (anyref),
        JsDelete => "jsDelete": (anyref, anyref) -> (),
        JsIsTruthy => "jsIsTruthy": (anyref) -> (i32),
        JsLinkingInfo => "jsLinkingInfo": () -> (anyref),
    }

    JsOp {
        JsUnaryPlus => "jsUnaryPlus": (anyref) -> (anyref),
        JsUnaryMinus => "jsUnaryMinus": (anyref) -> (anyref),
        JsUnaryTilde => "jsUnaryTilde": (anyref) -> (anyref),
        JsUnaryBang => "jsUnaryBang": (anyref) -> (anyref),
        JsUnaryTypeof => "jsUnaryTypeof": (anyref) -> (anyref),

        JsStrictEquals => "jsStrictEquals": (anyref, anyref) -> (i32),
        JsNotStrictEquals => "jsNotStrictEquals": (anyref, anyref) -> (i32),
        JsPlus => "jsPlus": (anyref, anyref) -> (anyref),
        JsMinus => "jsMinus": (anyref, anyref) -> (anyref),
        JsTimes => "jsTimes": (anyref, anyref) -> (anyref),
        JsDivide => "jsDivide": (anyref, anyref) -> (anyref),
        JsModulo => "jsModulo": (anyref, anyref) -> (anyref),
        JsExponent => "jsExponent": (anyref, anyref) -> (anyref),
        JsBitwiseAnd => "jsBitwiseAnd": (anyref, anyref) -> (anyref),
        JsBitwiseOr => "jsBitwiseOr": (anyref, anyref) -> (anyref),
        JsBitwiseXor => "jsBitwiseXor": (anyref, anyref) -> (anyref),
        JsShiftLeft => "jsShiftLeft": (anyref, anyref) -> (anyref),
        JsArithmeticShiftRight => "jsArithmeticShiftRight": (anyref, anyref) -> (anyref),
        JsLogicalShiftRight => "jsLogicalShiftRight": (anyref, anyref) -> (anyref),
        JsLessThan => "jsLessThan": (anyref, anyref) -> (anyref),
        JsLessEqual => "jsLessEqual": (anyref, anyref) -> (anyref),
        JsGreaterThan => "jsGreaterThan": (anyref, anyref) -> (anyref),
        JsGreaterEqual => "jsGreaterEqual": (anyref, anyref) -> (anyref),
        JsIn => "jsIn": (anyref, anyref) -> (anyref),
        JsInstanceof => "jsInstanceof": (anyref, anyref) -> (anyref),
    }
}
