//! Post-decode semantic validation.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Semantic check run on a request right after it has been decoded.
///
/// Every request type handled by an endpoint implements this trait. The default
/// implementation accepts everything, so types without rules opt in with an empty
/// `impl`. When `validate` fails the client receives a `400 Bad Request` and the
/// endpoint function is never called.
///
/// # Examples
///
/// ```
/// use endpoint_kit_core::Validate;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct CreateUser {
///     name: String,
/// }
///
/// impl Validate for CreateUser {
///     fn validate(&self) -> Result<(), anyhow::Error> {
///         anyhow::ensure!(!self.name.trim().is_empty(), "name must not be blank");
///         Ok(())
///     }
/// }
///
/// #[derive(Deserialize)]
/// struct Ping {}
///
/// impl Validate for Ping {}
/// ```
pub trait Validate {
    /// Check the decoded request.
    ///
    /// # Errors
    ///
    /// Returns the reason the request is rejected.
    fn validate(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

macro_rules! accept_all {
    ($($ty:ty),* $(,)?) => {
        $(impl Validate for $ty {})*
    };
}

accept_all!(
    (),
    bool,
    char,
    String,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    serde_json::Value,
);

impl<T: Validate + ?Sized> Validate for Box<T> {
    fn validate(&self) -> Result<(), anyhow::Error> {
        (**self).validate()
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), anyhow::Error> {
        self.iter().try_for_each(Validate::validate)
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_ref().map_or(Ok(()), Validate::validate)
    }
}

impl<K, V: Validate, S: BuildHasher> Validate for HashMap<K, V, S> {
    fn validate(&self) -> Result<(), anyhow::Error> {
        self.values().try_for_each(Validate::validate)
    }
}

impl<K, V: Validate> Validate for BTreeMap<K, V> {
    fn validate(&self) -> Result<(), anyhow::Error> {
        self.values().try_for_each(Validate::validate)
    }
}

macro_rules! validate_tuple {
    ($($name:ident),+) => {
        impl<$($name: Validate),+> Validate for ($($name,)+) {
            #[allow(non_snake_case)]
            fn validate(&self) -> Result<(), anyhow::Error> {
                let ($($name,)+) = self;
                $($name.validate()?;)+
                Ok(())
            }
        }
    };
}

validate_tuple!(A);
validate_tuple!(A, B);
validate_tuple!(A, B, C);
validate_tuple!(A, B, C, D);
