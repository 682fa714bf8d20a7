//! Name registry for functions and matrices
//!
//! Formulas reach external objects by name. Each name maps to at most one
//! live [`RegistryEntry`]; names are normalized through [`NameCase`] at
//! registration and at lookup.

use crate::error::{EvalError, EvalResult};
use crate::function::{IntoScalarFunction, ScalarFunction};
use ahash::AHashMap;
use std::borrow::Cow;
use tally_matrix::Matrix;

/// Case policy for registry and variable names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameCase {
    /// Names compare ignoring case
    #[default]
    Insensitive,
    /// Names compare exactly
    Sensitive,
}

impl NameCase {
    /// The single normalization applied to every stored or looked-up name
    pub fn normalize(self, name: &str) -> Cow<'_, str> {
        match self {
            NameCase::Sensitive => Cow::Borrowed(name),
            NameCase::Insensitive if name.chars().any(char::is_uppercase) => {
                Cow::Owned(name.to_lowercase())
            }
            NameCase::Insensitive => Cow::Borrowed(name),
        }
    }
}

/// A registered scalar function
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    name: String,
    function: ScalarFunction,
    overwritable: bool,
}

impl FunctionInfo {
    pub fn new(name: impl Into<String>, function: ScalarFunction, overwritable: bool) -> Self {
        Self {
            name: name.into(),
            function,
            overwritable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.function.arity()
    }

    pub fn function(&self) -> &ScalarFunction {
        &self.function
    }

    pub fn is_overwritable(&self) -> bool {
        self.overwritable
    }
}

/// A registered matrix
#[derive(Debug, Clone)]
pub struct MatrixInfo {
    name: String,
    matrix: Matrix,
    overwritable: bool,
}

impl MatrixInfo {
    pub fn new(name: impl Into<String>, matrix: Matrix, overwritable: bool) -> Self {
        Self {
            name: name.into(),
            matrix,
            overwritable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 2 for a true two-dimensional matrix, 1 for a row or column vector
    pub fn arity(&self) -> usize {
        if self.matrix.rows() > 1 && self.matrix.cols() > 1 {
            2
        } else {
            1
        }
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Mutable access to the values; any change drops the cached factorization
    pub fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    pub fn is_overwritable(&self) -> bool {
        self.overwritable
    }

    /// Element at one-based `indices`, truncated to `i32`
    ///
    /// One index addresses the flattened row-major storage, two address
    /// `(row, col)`.
    pub fn index(&self, indices: &[f64]) -> EvalResult<f64> {
        match *indices {
            [i] => Ok(self.matrix.get_flat_one_based(i as i32)?),
            [row, col] => Ok(self.matrix.get_one_based(row as i32, col as i32)?),
            _ => Err(EvalError::ArityMismatch {
                name: self.name.clone(),
                expected: self.arity(),
                actual: indices.len(),
            }),
        }
    }
}

/// Anything that can live in the registry
#[derive(Debug, Clone)]
pub enum RegistryEntry {
    Function(FunctionInfo),
    Matrix(MatrixInfo),
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        match self {
            RegistryEntry::Function(f) => f.name(),
            RegistryEntry::Matrix(m) => m.name(),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            RegistryEntry::Function(f) => f.arity(),
            RegistryEntry::Matrix(m) => m.arity(),
        }
    }

    pub fn is_overwritable(&self) -> bool {
        match self {
            RegistryEntry::Function(f) => f.overwritable,
            RegistryEntry::Matrix(m) => m.overwritable,
        }
    }

    pub fn set_overwritable(&mut self, overwritable: bool) {
        match self {
            RegistryEntry::Function(f) => f.overwritable = overwritable,
            RegistryEntry::Matrix(m) => m.overwritable = overwritable,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RegistryEntry::Function(_) => "function",
            RegistryEntry::Matrix(_) => "matrix",
        }
    }

    fn rename(&mut self, name: String) {
        match self {
            RegistryEntry::Function(f) => f.name = name,
            RegistryEntry::Matrix(m) => m.name = name,
        }
    }
}

impl From<FunctionInfo> for RegistryEntry {
    fn from(info: FunctionInfo) -> Self {
        RegistryEntry::Function(info)
    }
}

impl From<MatrixInfo> for RegistryEntry {
    fn from(info: MatrixInfo) -> Self {
        RegistryEntry::Matrix(info)
    }
}

/// Name-keyed store of functions and matrices usable from formulas
#[derive(Debug, Clone, Default)]
pub struct Registry {
    name_case: NameCase,
    entries: AHashMap<String, RegistryEntry>,
}

impl Registry {
    /// Create an empty case-insensitive registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given case policy
    pub fn with_name_case(name_case: NameCase) -> Self {
        Self {
            name_case,
            entries: AHashMap::new(),
        }
    }

    pub fn name_case(&self) -> NameCase {
        self.name_case
    }

    /// Look up an entry by name
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(self.name_case.normalize(name).as_ref())
    }

    /// Look up a function by name; `None` if absent or not a function
    pub fn get_function(&self, name: &str) -> Option<&FunctionInfo> {
        match self.get(name)? {
            RegistryEntry::Function(f) => Some(f),
            RegistryEntry::Matrix(_) => None,
        }
    }

    /// Look up a matrix by name; `None` if absent or not a matrix
    pub fn get_matrix(&self, name: &str) -> Option<&MatrixInfo> {
        match self.get(name)? {
            RegistryEntry::Matrix(m) => Some(m),
            RegistryEntry::Function(_) => None,
        }
    }

    /// Mutable access to a registered matrix
    pub fn get_matrix_mut(&mut self, name: &str) -> Option<&mut MatrixInfo> {
        let key = self.name_case.normalize(name);
        match self.entries.get_mut(key.as_ref())? {
            RegistryEntry::Matrix(m) => Some(m),
            RegistryEntry::Function(_) => None,
        }
    }

    /// Mutable access to any entry, e.g. to change its overwrite flag
    pub fn get_mut(&mut self, name: &str) -> Option<&mut RegistryEntry> {
        let key = self.name_case.normalize(name);
        self.entries.get_mut(key.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized names of all entries, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Insert or replace an entry
    ///
    /// Names that are empty or only whitespace are rejected with
    /// [`EvalError::InvalidArgument`]. Replacing requires the existing entry
    /// to be overwritable, and a new function must keep the existing entry's
    /// arity. On error the registry is left unchanged.
    pub fn register(&mut self, entry: impl Into<RegistryEntry>) -> EvalResult<()> {
        let mut entry = entry.into();
        if entry.name().trim().is_empty() {
            return Err(EvalError::InvalidArgument(
                "registry names must not be empty or blank".into(),
            ));
        }

        let key = self.name_case.normalize(entry.name()).into_owned();
        if let Some(existing) = self.entries.get(&key) {
            if !existing.is_overwritable() {
                return Err(EvalError::DuplicateRegistration(key));
            }
            if matches!(entry, RegistryEntry::Function(_)) && existing.arity() != entry.arity() {
                return Err(EvalError::ArityMismatch {
                    name: key,
                    expected: existing.arity(),
                    actual: entry.arity(),
                });
            }
            tracing::debug!(name = %key, kind = entry.kind(), "replacing registry entry");
        } else {
            tracing::debug!(name = %key, kind = entry.kind(), arity = entry.arity(), "registering");
        }

        entry.rename(key.clone());
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Register a scalar function
    ///
    /// Accepts typed closures such as `|x: f64, y: f64| x * y` as well as a
    /// prepared [`ScalarFunction`].
    pub fn register_function<Args, F>(
        &mut self,
        name: &str,
        function: F,
        overwritable: bool,
    ) -> EvalResult<()>
    where
        F: IntoScalarFunction<Args>,
    {
        let function = function.into_scalar_function()?;
        self.register(FunctionInfo::new(name, function, overwritable))
    }

    /// Register a function taking its arguments as a slice of `arity` values
    pub fn register_slice_function<F>(
        &mut self,
        name: &str,
        arity: usize,
        function: F,
        overwritable: bool,
    ) -> EvalResult<()>
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        let function = ScalarFunction::with_arity(arity, function)?;
        self.register(FunctionInfo::new(name, function, overwritable))
    }

    /// Register a `rows x cols` matrix from row-major values
    pub fn register_matrix(
        &mut self,
        name: &str,
        rows: usize,
        cols: usize,
        values: Vec<f64>,
        overwritable: bool,
    ) -> EvalResult<()> {
        let matrix = Matrix::from_vec(rows, cols, values)?;
        self.register_matrix_value(name, matrix, overwritable)
    }

    /// Register an already built matrix
    pub fn register_matrix_value(
        &mut self,
        name: &str,
        matrix: Matrix,
        overwritable: bool,
    ) -> EvalResult<()> {
        self.register(MatrixInfo::new(name, matrix, overwritable))
    }

    /// Function lookup used by both executors: existence, kind and arity
    pub(crate) fn resolve_function(&self, name: &str, argc: usize) -> EvalResult<&FunctionInfo> {
        let info = self
            .get_function(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        if info.arity() != argc {
            return Err(EvalError::ArityMismatch {
                name: name.to_string(),
                expected: info.arity(),
                actual: argc,
            });
        }
        Ok(info)
    }

    /// Matrix lookup used by both executors: existence, kind and arity
    pub(crate) fn resolve_matrix(&self, name: &str, argc: usize) -> EvalResult<&MatrixInfo> {
        let info = self
            .get_matrix(name)
            .ok_or_else(|| EvalError::UnknownMatrix(name.to_string()))?;
        if info.arity() != argc {
            return Err(EvalError::ArityMismatch {
                name: name.to_string(),
                expected: info.arity(),
                actual: argc,
            });
        }
        Ok(info)
    }
}
