//! Per-evaluation context

use crate::error::{EvalError, EvalResult};
use crate::registry::Registry;
use ahash::AHashMap;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Variable bindings and registry for a single evaluation
///
/// Variable names are normalized with the registry's [`NameCase`] when the
/// context is built and again at every lookup, so `X` and `x` meet under
/// the case-insensitive policy. If two incoming keys normalize to the same
/// name, which value wins is unspecified.
///
/// [`NameCase`]: crate::registry::NameCase
#[derive(Debug)]
pub struct Context<'r> {
    variables: AHashMap<String, f64>,
    registry: &'r Registry,
}

impl<'r> Context<'r> {
    pub fn new<S: BuildHasher>(registry: &'r Registry, variables: &HashMap<String, f64, S>) -> Self {
        let case = registry.name_case();
        let variables = variables
            .iter()
            .map(|(name, value)| (case.normalize(name).into_owned(), *value))
            .collect();
        Self {
            variables,
            registry,
        }
    }

    /// Context without any variables
    pub fn empty(registry: &'r Registry) -> Self {
        Self {
            variables: AHashMap::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Value bound to `name`
    pub fn variable(&self, name: &str) -> EvalResult<f64> {
        let key = self.registry.name_case().normalize(name);
        self.variables
            .get(key.as_ref())
            .copied()
            .ok_or_else(|| EvalError::VariableNotDefined(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NameCase;

    fn vars(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_variable_lookup() {
        let reg = Registry::new();
        let ctx = Context::new(&reg, &vars(&[("x", 2.0)]));
        assert_eq!(ctx.variable("x").unwrap(), 2.0);
        assert_eq!(
            ctx.variable("y").unwrap_err(),
            EvalError::VariableNotDefined("y".into())
        );
    }

    #[test]
    fn test_variable_case_insensitive() {
        let reg = Registry::new();
        let ctx = Context::new(&reg, &vars(&[("Rate", 0.5)]));
        assert_eq!(ctx.variable("rate").unwrap(), 0.5);
        assert_eq!(ctx.variable("RATE").unwrap(), 0.5);
    }

    #[test]
    fn test_variable_case_sensitive() {
        let reg = Registry::with_name_case(NameCase::Sensitive);
        let ctx = Context::new(&reg, &vars(&[("Rate", 0.5)]));
        assert_eq!(ctx.variable("Rate").unwrap(), 0.5);
        assert!(ctx.variable("rate").is_err());
    }

    #[test]
    fn test_empty_context() {
        let reg = Registry::new();
        let ctx = Context::empty(&reg);
        assert!(matches!(
            ctx.variable("x"),
            Err(EvalError::VariableNotDefined(_))
        ));
    }
}
