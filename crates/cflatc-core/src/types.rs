//! The small algebraic type system (spec §3, §4.11).
//!
//! A sealed hierarchy modeled as a tagged sum type, per the "sealed
//! hierarchies" design note in spec §9: every variant carries only the
//! fields it needs, and match arms are expected to be exhaustive rather
//! than dispatched by name.

use std::fmt;

/// Primitive scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Char,
    Void,
}

/// The type of a declaration, expression, or function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    /// Array of a non-function, non-void element type.
    Array(Box<Type>),
    /// `paramTypes` is ordered; a zero-arg function has an empty list.
    Function {
        ret: Box<Type>,
        params: Vec<Type>,
    },
    /// `Const(base)`: base is non-void, non-function.
    Const(Box<Type>),
}

impl Type {
    pub const INT: Type = Type::Primitive(Primitive::Int);
    pub const CHAR: Type = Type::Primitive(Primitive::Char);
    pub const VOID: Type = Type::Primitive(Primitive::Void);

    pub fn array(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    pub fn function(ret: Type, params: Vec<Type>) -> Self {
        Type::Function {
            ret: Box::new(ret),
            params,
        }
    }

    pub fn constant(base: Type) -> Self {
        Type::Const(Box::new(base))
    }

    /// Validate the const-qualification and array-element invariants
    /// from spec §3: const cannot wrap void or function; array element
    /// cannot be function or void.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Type::Primitive(_) => true,
            Type::Array(elem) => !matches!(
                elem.as_ref(),
                Type::Function { .. } | Type::Primitive(Primitive::Void)
            ) && elem.is_well_formed(),
            Type::Function { ret, params } => {
                ret.is_well_formed() && params.iter().all(Type::is_well_formed)
            }
            Type::Const(base) => {
                !matches!(
                    base.as_ref(),
                    Type::Primitive(Primitive::Void) | Type::Function { .. }
                ) && base.is_well_formed()
            }
        }
    }

    /// `stripConst(T)`: `Const(U) -> U`, else `T`.
    pub fn strip_const(&self) -> &Type {
        match self {
            Type::Const(inner) => inner,
            other => other,
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Type::Const(_))
    }

    /// `isIntConvertible(T)`: `stripConst(T) ∈ {int, char}`.
    pub fn is_int_convertible(&self) -> bool {
        matches!(
            self.strip_const(),
            Type::Primitive(Primitive::Int) | Type::Primitive(Primitive::Char)
        )
    }

    pub fn is_array(&self) -> bool {
        matches!(self.strip_const(), Type::Array(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.strip_const(), Type::Function { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self.strip_const(), Type::Primitive(Primitive::Void))
    }

    pub fn array_element(&self) -> Option<&Type> {
        match self.strip_const() {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn function_signature(&self) -> Option<(&Type, &[Type])> {
        match self.strip_const() {
            Type::Function { ret, params } => Some((ret, params)),
            _ => None,
        }
    }

    /// `canAssign(S, T)`: can a value of type `S` be assigned to storage of
    /// type `T`?
    pub fn can_assign(source: &Type, target: &Type) -> bool {
        let stripped_target = target.strip_const();
        if matches!(stripped_target, Type::Array(_) | Type::Function { .. }) {
            return source.strip_const() == stripped_target;
        }
        match stripped_target {
            Type::Primitive(Primitive::Int) => source.is_int_convertible(),
            Type::Primitive(Primitive::Char) => {
                matches!(source.strip_const(), Type::Primitive(Primitive::Char))
            }
            Type::Primitive(Primitive::Void) => false,
            _ => false,
        }
    }

    /// `canCast(S, T)`: both scalars after stripConst; target not void,
    /// Array, or Function.
    pub fn can_cast(source: &Type, target: &Type) -> bool {
        source.is_int_convertible()
            && !matches!(
                target.strip_const(),
                Type::Primitive(Primitive::Void) | Type::Array(_) | Type::Function { .. }
            )
    }

    /// `arithmeticResult(L, R)`: both scalar -> int (promotion).
    pub fn arithmetic_result(left: &Type, right: &Type) -> Option<Type> {
        if left.is_int_convertible() && right.is_int_convertible() {
            Some(Type::INT)
        } else {
            None
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(Primitive::Int) => write!(f, "int"),
            Type::Primitive(Primitive::Char) => write!(f, "char"),
            Type::Primitive(Primitive::Void) => write!(f, "void"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Function { ret, params } => {
                write!(f, "{ret}(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
            Type::Const(base) => write!(f, "const {base}"),
        }
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn const_cannot_wrap_void_or_function() {
        assert!(!Type::constant(Type::VOID).is_well_formed());
        let f = Type::function(Type::INT, vec![]);
        assert!(!Type::constant(f).is_well_formed());
        assert!(Type::constant(Type::INT).is_well_formed());
    }

    #[test]
    fn array_element_cannot_be_function_or_void() {
        assert!(!Type::array(Type::VOID).is_well_formed());
        assert!(!Type::array(Type::function(Type::INT, vec![])).is_well_formed());
        assert!(Type::array(Type::CHAR).is_well_formed());
    }

    #[test]
    fn can_assign_int_target_accepts_int_or_char() {
        assert!(Type::can_assign(&Type::INT, &Type::INT));
        assert!(Type::can_assign(&Type::CHAR, &Type::INT));
        assert!(!Type::can_assign(&Type::VOID, &Type::INT));
    }

    #[test]
    fn can_assign_char_target_accepts_char_only() {
        assert!(Type::can_assign(&Type::CHAR, &Type::CHAR));
        assert!(!Type::can_assign(&Type::INT, &Type::CHAR));
    }

    #[test]
    fn can_assign_array_requires_equality_after_strip_const() {
        let arr = Type::array(Type::CHAR);
        let const_arr = Type::constant(Type::array(Type::CHAR));
        assert!(Type::can_assign(&const_arr, &arr));
        assert!(!Type::can_assign(&Type::array(Type::INT), &arr));
    }

    #[test]
    fn can_cast_requires_scalar_source_and_non_void_non_aggregate_target() {
        assert!(Type::can_cast(&Type::INT, &Type::CHAR));
        assert!(!Type::can_cast(&Type::VOID, &Type::INT));
        assert!(!Type::can_cast(&Type::INT, &Type::VOID));
        assert!(!Type::can_cast(&Type::INT, &Type::array(Type::CHAR)));
    }

    #[test]
    fn arithmetic_result_promotes_to_int() {
        assert_eq!(Type::arithmetic_result(&Type::CHAR, &Type::CHAR), Some(Type::INT));
        assert_eq!(Type::arithmetic_result(&Type::VOID, &Type::INT), None);
    }
}
