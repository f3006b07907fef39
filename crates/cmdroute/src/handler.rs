//! Handler trait and the adapters that turn typed functions into handlers.
//!
//! Every registered command is stored behind the uniform [`Handler`]
//! interface: it reports the type tags of its parameters and accepts the
//! ordered, already-converted values. [`IntoHandler`] generates one adapter
//! per function signature (up to eight parameters) that downcasts each value
//! back into its parameter type.

use std::any::Any;
use std::marker::PhantomData;

use cmdroute_types::error::{ConversionError, DispatchError, Result};
use cmdroute_types::value::{TypeTag, Value};

/// A type-erased command callable.
pub trait Handler {
    /// Type tags of the parameters, in order. The length is the arity.
    fn arg_tags(&self) -> Vec<TypeTag>;

    /// Invoke with ordered values whose tags match [`Handler::arg_tags`].
    fn invoke(&self, args: Vec<Value>) -> Result<()>;
}

/// Conversion of a function into a [`Handler`].
///
/// `Args` is the parameter tuple; it only exists to keep the per-arity impls
/// apart and is inferred at the call site.
pub trait IntoHandler<Args> {
    type Handler: Handler + 'static;

    fn into_handler(self) -> Self::Handler;
}

/// Adapter for a plain function or closure with typed parameters.
pub struct FnHandler<F, Args> {
    func: F,
    _args: PhantomData<fn(Args)>,
}

fn downcast_arg<T: Any + Clone>(value: Option<&Value>, expected: usize, got: usize) -> Result<T> {
    let value = value.ok_or(DispatchError::ArityMismatch { expected, got })?;
    value.downcast::<T>().ok_or_else(|| {
        ConversionError::type_mismatch(TypeTag::of::<T>().name(), value.tag().name()).into()
    })
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        impl<F, $($ty,)*> Handler for FnHandler<F, ($($ty,)*)>
        where
            F: Fn($($ty),*),
            $($ty: Any + Clone,)*
        {
            fn arg_tags(&self) -> Vec<TypeTag> {
                vec![$(TypeTag::of::<$ty>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, args: Vec<Value>) -> Result<()> {
                let expected = self.arg_tags().len();
                let got = args.len();
                if expected != got {
                    return Err(DispatchError::ArityMismatch { expected, got });
                }
                let mut values = args.iter();
                $(let $ty = downcast_arg::<$ty>(values.next(), expected, got)?;)*
                (self.func)($($ty),*);
                Ok(())
            }
        }

        impl<F, $($ty,)*> IntoHandler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) + 'static,
            $($ty: Any + Clone,)*
        {
            type Handler = FnHandler<F, ($($ty,)*)>;

            fn into_handler(self) -> Self::Handler {
                FnHandler {
                    func: self,
                    _args: PhantomData,
                }
            }
        }
    };
}

impl_handler!();
impl_handler!(A);
impl_handler!(A, B);
impl_handler!(A, B, C);
impl_handler!(A, B, C, D);
impl_handler!(A, B, C, D, E);
impl_handler!(A, B, C, D, E, G);
impl_handler!(A, B, C, D, E, G, H);
impl_handler!(A, B, C, D, E, G, H, I);

/// Adapter for a closure over the raw value slice with an explicit tag list.
pub struct RawHandler<F> {
    tags: Vec<TypeTag>,
    func: F,
}

impl<F> RawHandler<F>
where
    F: Fn(&[Value]),
{
    pub fn new(tags: Vec<TypeTag>, func: F) -> Self {
        Self { tags, func }
    }
}

impl<F> Handler for RawHandler<F>
where
    F: Fn(&[Value]),
{
    fn arg_tags(&self) -> Vec<TypeTag> {
        self.tags.clone()
    }

    fn invoke(&self, args: Vec<Value>) -> Result<()> {
        if args.len() != self.tags.len() {
            return Err(DispatchError::ArityMismatch {
                expected: self.tags.len(),
                got: args.len(),
            });
        }
        (self.func)(&args);
        Ok(())
    }
}
