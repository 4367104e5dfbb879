//! Field values and output type references
//!
//! A [`FieldValue`] is what flows through a field pipeline: the parent value
//! handed to a resolver, the key a resolver produces, and the loaded value
//! that replaces it. Values are type-erased behind `Arc<dyn Any>` so one
//! pipeline shape serves every key/value pair, and cloning a value never
//! copies the underlying object.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased value produced or consumed by a field
#[derive(Clone, Default)]
pub enum FieldValue {
    /// No value
    #[default]
    Null,
    /// A single shared value
    Any(Arc<dyn Any + Send + Sync>),
    /// An ordered list of values
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Shorthand for [`FieldValue::Null`]
    pub const NULL: FieldValue = FieldValue::Null;

    /// Wrap an owned value
    pub fn owned_any<T: Any + Send + Sync>(value: T) -> Self {
        Self::Any(Arc::new(value))
    }

    /// Wrap an already shared value without reallocating it
    pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self::Any(value)
    }

    /// Build a list value
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = FieldValue>,
    {
        Self::List(items.into_iter().collect())
    }

    /// Check for [`FieldValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the inner value if it is a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Any(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Get the shared inner value if it is a `T`
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Any(value) => Arc::clone(value).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Borrow the items if this is a list
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Identity comparison: both sides refer to the same objects
    ///
    /// Lists compare element-wise by identity. Two nulls are identical.
    pub fn ptr_eq(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Any(a), Self::Any(b)) => Arc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ptr_eq(y))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Any(value) => write!(f, "Any({:p})", Arc::as_ptr(value) as *const ()),
            Self::List(items) => f.debug_list().entries(items).finish(),
        }
    }
}

/// Reference to an output type as the schema sees it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A named type such as `Int` or `User`
    Named(String),
    /// A list of the inner type
    List(Box<TypeRef>),
    /// A non-null wrapper around the inner type
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Strip a non-null wrapper, if any
    pub fn nullable(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner.nullable(),
            other => other,
        }
    }

    /// Whether this type is a list, ignoring nullability
    pub fn is_list(&self) -> bool {
        matches!(self.nullable(), Self::List(_))
    }

    /// The element type if this type is a list
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self.nullable() {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// The innermost named type
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::List(inner) => write!(f, "[{}]", inner),
            Self::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// A value a keyed loader can return
///
/// The output type is declared explicitly instead of being discovered at
/// runtime, which is how the binder decides between singular and grouped
/// resolution.
pub trait LoadedValue: Clone + Send + Sync + 'static {
    /// The schema type this value is exposed as
    fn output_type() -> TypeRef;

    /// Erase the value for the field pipeline
    fn into_field_value(self) -> FieldValue;
}

/// A shared object exposed under a schema type name
///
/// `Arc<T>` of an entity is a [`LoadedValue`] whose identity is the
/// allocation, so the same entity reached through two keys deduplicates.
pub trait Entity: Send + Sync + 'static {
    /// Name of the schema type backing this entity
    const TYPE_NAME: &'static str;
}

impl<T: Entity> LoadedValue for Arc<T> {
    fn output_type() -> TypeRef {
        TypeRef::named(T::TYPE_NAME)
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::Any(self)
    }
}

impl<T: LoadedValue> LoadedValue for Vec<T> {
    fn output_type() -> TypeRef {
        TypeRef::list(T::output_type())
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::list(self.into_iter().map(LoadedValue::into_field_value))
    }
}

macro_rules! scalar_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl LoadedValue for $ty {
                fn output_type() -> TypeRef {
                    TypeRef::named($name)
                }

                fn into_field_value(self) -> FieldValue {
                    FieldValue::owned_any(self)
                }
            }
        )*
    };
}

scalar_value! {
    i32 => "Int",
    i64 => "Long",
    f64 => "Float",
    bool => "Boolean",
    String => "String",
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User;

    impl Entity for User {
        const TYPE_NAME: &'static str = "User";
    }

    #[test]
    fn test_type_ref_display() {
        let ty = TypeRef::non_null(TypeRef::list(TypeRef::named("User")));
        assert_eq!(ty.to_string(), "[User]!");
        assert!(ty.is_list());
        assert_eq!(ty.element_type(), Some(&TypeRef::named("User")));
        assert_eq!(ty.base_name(), "User");
    }

    #[test]
    fn test_output_types_from_loaded_values() {
        assert_eq!(<Arc<User>>::output_type(), TypeRef::named("User"));
        assert_eq!(
            <Vec<Arc<User>>>::output_type(),
            TypeRef::list(TypeRef::named("User"))
        );
        assert_eq!(i32::output_type(), TypeRef::named("Int"));
        assert!(!String::output_type().is_list());
    }

    #[test]
    fn test_entity_keeps_its_allocation() {
        let user = Arc::new(User);
        let value = Arc::clone(&user).into_field_value();

        let back = value.downcast_arc::<User>().unwrap();
        assert!(Arc::ptr_eq(&user, &back));
    }

    #[test]
    fn test_downcast_ref_rejects_other_types() {
        let value = FieldValue::owned_any(7_i32);
        assert_eq!(value.downcast_ref::<i32>(), Some(&7));
        assert!(value.downcast_ref::<i64>().is_none());
        assert!(FieldValue::NULL.downcast_ref::<i32>().is_none());
    }

    #[test]
    fn test_ptr_eq_is_identity_not_equality() {
        let a = FieldValue::owned_any(1_i32);
        let b = FieldValue::owned_any(1_i32);

        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
        assert!(FieldValue::list([a.clone()]).ptr_eq(&FieldValue::list([a])));
    }
}
