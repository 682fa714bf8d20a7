//! Scalar callables stored in the registry
//!
//! Every registered function is kept behind the same fixed-buffer interface,
//! `Fn(&[f64]) -> f64`, together with the arity it was registered with.
//! Typed closures of up to [`MAX_ARITY`] `f64` parameters convert into that
//! form through [`IntoScalarFunction`].

use crate::error::{EvalError, EvalResult};
use std::fmt;
use std::sync::Arc;

/// Largest parameter count a registered function may declare
pub const MAX_ARITY: usize = 16;

type SliceFn = dyn Fn(&[f64]) -> f64 + Send + Sync;

/// A scalar function with a fixed arity
#[derive(Clone)]
pub struct ScalarFunction {
    arity: usize,
    f: Arc<SliceFn>,
}

impl ScalarFunction {
    /// Wrap a slice-taking function that expects exactly `arity` arguments
    pub fn with_arity<F>(arity: usize, f: F) -> EvalResult<Self>
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        if arity > MAX_ARITY {
            return Err(EvalError::UnsupportedCallable(format!(
                "{} parameters, at most {} are supported",
                arity, MAX_ARITY
            )));
        }
        Ok(Self {
            arity,
            f: Arc::new(f),
        })
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invoke with positional arguments
    ///
    /// Callers check `args.len() == self.arity()` first; the registry's
    /// resolution step does this for both executors.
    pub fn call(&self, args: &[f64]) -> f64 {
        debug_assert_eq!(args.len(), self.arity);
        (self.f)(args)
    }
}

impl fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarFunction")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Conversion into a [`ScalarFunction`]
///
/// `Args` is a marker that keeps the closure impls for different
/// parameter counts apart; callers never name it.
pub trait IntoScalarFunction<Args> {
    fn into_scalar_function(self) -> EvalResult<ScalarFunction>;
}

impl IntoScalarFunction<ScalarFunction> for ScalarFunction {
    fn into_scalar_function(self) -> EvalResult<ScalarFunction> {
        Ok(self)
    }
}

macro_rules! f64_for {
    ($_arg:ident) => {
        f64
    };
}

macro_rules! impl_into_scalar_function {
    ($arity:expr; $($arg:ident),*) => {
        impl<F> IntoScalarFunction<($(f64_for!($arg),)*)> for F
        where
            F: Fn($(f64_for!($arg)),*) -> f64 + Send + Sync + 'static,
        {
            fn into_scalar_function(self) -> EvalResult<ScalarFunction> {
                ScalarFunction::with_arity($arity, move |args: &[f64]| match *args {
                    [$($arg),*] => self($($arg),*),
                    _ => f64::NAN,
                })
            }
        }
    };
}

impl_into_scalar_function!(0;);
impl_into_scalar_function!(1; a);
impl_into_scalar_function!(2; a, b);
impl_into_scalar_function!(3; a, b, c);
impl_into_scalar_function!(4; a, b, c, d);
impl_into_scalar_function!(5; a, b, c, d, e);
impl_into_scalar_function!(6; a, b, c, d, e, f);
impl_into_scalar_function!(7; a, b, c, d, e, f, g);
impl_into_scalar_function!(8; a, b, c, d, e, f, g, h);
impl_into_scalar_function!(9; a, b, c, d, e, f, g, h, i);
impl_into_scalar_function!(10; a, b, c, d, e, f, g, h, i, j);
impl_into_scalar_function!(11; a, b, c, d, e, f, g, h, i, j, k);
impl_into_scalar_function!(12; a, b, c, d, e, f, g, h, i, j, k, l);
impl_into_scalar_function!(13; a, b, c, d, e, f, g, h, i, j, k, l, m);
impl_into_scalar_function!(14; a, b, c, d, e, f, g, h, i, j, k, l, m, n);
impl_into_scalar_function!(15; a, b, c, d, e, f, g, h, i, j, k, l, m, n, o);
impl_into_scalar_function!(16; a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p);
