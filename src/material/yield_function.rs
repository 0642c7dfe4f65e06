use crate::base::{Error, ParamPlastic, RodResult};
use russell_lab::deriv1_central5;
use std::collections::HashMap;
use std::sync::Arc;

/// Defines a multivariate scalar function f(x)
pub type FnScalar = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Holds a scalar function and the ordered names of its arguments
#[derive(Clone)]
pub struct ScalarFunction {
    /// Names of the arguments (in order)
    pub args: Vec<String>,

    /// The function
    function: FnScalar,
}

impl ScalarFunction {
    /// Allocates a new instance
    pub fn new<F>(args: &[&str], function: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        ScalarFunction {
            args: args.iter().map(|s| s.to_string()).collect(),
            function: Arc::new(function),
        }
    }

    /// Evaluates the function
    pub fn eval(&self, x: &[f64]) -> f64 {
        (self.function)(x)
    }
}

impl std::fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScalarFunction({})", self.args.join(","))
    }
}

/// Holds named scalar functions that materials may refer to
#[derive(Clone, Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, ScalarFunction>,
}

impl FunctionRegistry {
    /// Allocates a new (empty) registry
    pub fn new() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// Registers (or replaces) a function
    pub fn register(&mut self, name: &str, function: ScalarFunction) {
        self.functions.insert(name.to_string(), function);
    }

    /// Returns the function with the given name
    pub fn get(&self, name: &str) -> Option<&ScalarFunction> {
        self.functions.get(name)
    }
}

/// Implements the yield surface f(σ, h) of an elasto-plastic rod
///
/// The arguments are the stress components followed by the hardening
/// components. The gradient comes from the configured derivatives or, if
/// none are configured, from central finite differences.
#[derive(Clone, Debug)]
pub struct YieldSurface {
    function: ScalarFunction,
    derivatives: Option<Vec<ScalarFunction>>,
    n_stress: usize,
}

impl YieldSurface {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `param` -- plastic parameters (yield function and derivative names)
    /// * `registry` -- the registered functions
    /// * `expected_args` -- names of the arguments (stress components, then hardening components)
    /// * `n_stress` -- number of stress components
    /// * `context` -- identifies the material instance in error messages
    pub fn new(
        param: &ParamPlastic,
        registry: &FunctionRegistry,
        expected_args: &[String],
        n_stress: usize,
        context: &str,
    ) -> RodResult<Self> {
        let lookup = |name: &str, what: &str| -> RodResult<ScalarFunction> {
            let function = registry
                .get(name)
                .ok_or_else(|| Error::config(context, format!("{} '{}' is not registered", what, name)))?;
            if function.args != expected_args {
                return Err(Error::config(
                    context,
                    format!(
                        "{} '{}' must have arguments ({}); got ({})",
                        what,
                        name,
                        expected_args.join(","),
                        function.args.join(",")
                    ),
                ));
            }
            Ok(function.clone())
        };
        if param.yield_cond.is_empty() {
            return Err(Error::config(context, "missing property: yieldCond"));
        }
        let function = lookup(&param.yield_cond, "yieldCond")?;
        let derivatives = match &param.yield_deriv {
            None => None,
            Some(names) => {
                if names.len() != expected_args.len() {
                    return Err(Error::config(
                        context,
                        format!(
                            "yieldDeriv requires {} names (one per argument); got {}",
                            expected_args.len(),
                            names.len()
                        ),
                    ));
                }
                let mut list = Vec::with_capacity(names.len());
                for name in names {
                    list.push(lookup(name, "yieldDeriv")?);
                }
                Some(list)
            }
        };
        Ok(YieldSurface {
            function,
            derivatives,
            n_stress,
        })
    }

    /// Returns the number of arguments
    pub fn n_args(&self) -> usize {
        self.function.args.len()
    }

    /// Evaluates f(x)
    pub fn value(&self, x: &[f64]) -> f64 {
        self.function.eval(x)
    }

    /// Calculates the gradient g = ∂f/∂x
    ///
    /// Components belonging to stress arguments that are exactly zero are set
    /// to zero, so that plastic flow does not appear in unloaded directions.
    pub fn gradient(&self, grad: &mut [f64], x: &[f64]) -> RodResult<()> {
        match &self.derivatives {
            Some(derivatives) => {
                for (i, df) in derivatives.iter().enumerate() {
                    grad[i] = df.eval(x);
                }
            }
            None => {
                let mut args = x.to_vec();
                for i in 0..x.len() {
                    grad[i] = deriv1_central5(x[i], &mut args, |at, a: &mut Vec<f64>| {
                        let original = a[i];
                        a[i] = at;
                        let f = self.function.eval(a);
                        a[i] = original;
                        Ok(f)
                    })?;
                }
            }
        }
        for i in 0..self.n_stress {
            if x[i] == 0.0 {
                grad[i] = 0.0;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{FunctionRegistry, ScalarFunction, YieldSurface};
    use crate::base::{DofCatalog, SampleParams};
    use russell_lab::approx_eq;

    fn registry() -> FunctionRegistry {
        let dofs = DofCatalog::default();
        let args = dofs.yield_arg_names(true, false);
        let args: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        let mut registry = FunctionRegistry::new();
        // f = n₀² + 2 m₂² + h_iso - 1
        registry.register(
            "f",
            ScalarFunction::new(&args, |x| x[0] * x[0] + 2.0 * x[5] * x[5] + x[6] - 1.0),
        );
        for i in 0..7 {
            let name = format!("df{}", i);
            let df: Box<dyn Fn(&[f64]) -> f64 + Send + Sync> = match i {
                0 => Box::new(|x: &[f64]| 2.0 * x[0]),
                5 => Box::new(|x: &[f64]| 4.0 * x[5]),
                6 => Box::new(|_: &[f64]| 1.0),
                _ => Box::new(|_: &[f64]| 0.0),
            };
            registry.register(&name, ScalarFunction::new(&args, move |x| df(x)));
        }
        registry.register("wrong", ScalarFunction::new(&["a", "b"], |x| x[0] + x[1]));
        registry
    }

    #[test]
    fn gradient_works() {
        let registry = registry();
        let names = DofCatalog::default().yield_arg_names(true, false);
        let x = [0.5, 0.1, -0.2, 0.3, 0.4, -0.7, 0.25];

        let param = SampleParams::param_plastic("f", Some(1.0), None);
        let numerical = YieldSurface::new(&param, &registry, &names, 6, "test").unwrap();
        assert_eq!(numerical.n_args(), 7);
        approx_eq(numerical.value(&x), 0.25 + 0.98 + 0.25 - 1.0, 1e-15);

        let mut param = param.clone();
        param.yield_deriv = Some((0..7).map(|i| format!("df{}", i)).collect());
        let analytical = YieldSurface::new(&param, &registry, &names, 6, "test").unwrap();

        let mut g_num = vec![0.0; 7];
        let mut g_ana = vec![0.0; 7];
        numerical.gradient(&mut g_num, &x).unwrap();
        analytical.gradient(&mut g_ana, &x).unwrap();
        approx_eq(g_ana[0], 1.0, 1e-15);
        approx_eq(g_ana[5], -2.8, 1e-15);
        approx_eq(g_ana[6], 1.0, 1e-15);
        for i in 0..7 {
            approx_eq(g_num[i], g_ana[i], 1e-9);
        }
    }

    #[test]
    fn gradient_zeroes_unloaded_stress_components() {
        let mut registry = FunctionRegistry::new();
        let names = DofCatalog::default().yield_arg_names(false, false);
        let args: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        // linear in every argument: the gradient is 1 everywhere but at zero stresses
        registry.register("sum", ScalarFunction::new(&args, |x| x.iter().sum::<f64>() - 1.0));
        let param = SampleParams::param_plastic("sum", None, None);
        let surface = YieldSurface::new(&param, &registry, &names, 6, "test").unwrap();
        let x = [2.0, 0.0, 0.0, 0.0, 0.0, -1.0];
        let mut g = vec![0.0; 6];
        surface.gradient(&mut g, &x).unwrap();
        approx_eq(g[0], 1.0, 1e-10);
        assert_eq!(g[1], 0.0);
        assert_eq!(g[4], 0.0);
        approx_eq(g[5], 1.0, 1e-10);
    }

    #[test]
    fn new_captures_errors() {
        let registry = registry();
        let names = DofCatalog::default().yield_arg_names(true, false);

        let param = SampleParams::param_plastic("", None, None);
        assert!(YieldSurface::new(&param, &registry, &names, 6, "test").is_err());

        let param = SampleParams::param_plastic("missing", None, None);
        assert!(YieldSurface::new(&param, &registry, &names, 6, "test").is_err());

        let param = SampleParams::param_plastic("wrong", None, None);
        let err = YieldSurface::new(&param, &registry, &names, 6, "test").err().unwrap();
        assert!(format!("{}", err).contains("must have arguments"));

        let mut param = SampleParams::param_plastic("f", None, None);
        param.yield_deriv = Some(vec!["df0".to_string()]);
        assert!(YieldSurface::new(&param, &registry, &names, 6, "test").is_err());

        // same function, fewer expected arguments (no hardening)
        let names = DofCatalog::default().yield_arg_names(false, false);
        let param = SampleParams::param_plastic("f", None, None);
        assert!(YieldSurface::new(&param, &registry, &names, 6, "test").is_err());
    }
}
