//! Declarative pipeline executor.
//!
//! A [`Pipeline`] is an ordered sequence of [`StepDescriptor`]s, each naming a
//! registered transform plus optional positional and keyword arguments. The
//! executor folds the steps over a `DataFrame`, feeding each step the output
//! of the previous one. Steps are plain data, so the order of operations is
//! configurable (e.g., loaded from a JSON plan document) without touching the
//! executor.

use crate::error::{PrepError, Result, ResultExt};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// A transform invokable by the executor.
///
/// Transforms consume the dataset by value and return a new one; they must
/// not mutate shared state.
pub type TransformFn = fn(DataFrame, &StepArgs) -> Result<DataFrame>;

/// One declared transformation step.
///
/// `function` is always present; `args` and `kwargs` are independently
/// optional. Descriptors are immutable once constructed. A JSON plan document
/// is an array of these records:
///
/// ```json
/// [
///   { "function": "drop_cols", "kwargs": { "subset": ["ID"] } },
///   { "function": "rename_cols" }
/// ]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDescriptor {
    /// Name of a registered transform.
    pub function: String,

    /// Optional ordered positional arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,

    /// Optional keyword arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwargs: Option<Map<String, Value>>,
}

impl StepDescriptor {
    /// Create a descriptor with no extra arguments.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: None,
            kwargs: None,
        }
    }

    /// Attach positional arguments.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    /// Attach a keyword argument.
    pub fn with_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}

/// Borrowed view over a step's arguments, handed to transforms.
///
/// Parameters may be supplied by keyword or positionally; keyword wins when
/// both are present. Extraction failures surface as
/// [`PrepError::ArgumentMismatch`].
pub struct StepArgs<'a> {
    transform: &'a str,
    args: &'a [Value],
    kwargs: Option<&'a Map<String, Value>>,
}

impl<'a> StepArgs<'a> {
    fn new(transform: &'a str, args: &'a [Value], kwargs: Option<&'a Map<String, Value>>) -> Self {
        Self {
            transform,
            args,
            kwargs,
        }
    }

    /// Name of the transform these arguments were declared for.
    pub fn transform(&self) -> &str {
        self.transform
    }

    /// Look up a parameter by keyword name, falling back to position.
    pub fn get(&self, index: usize, name: &str) -> Option<&Value> {
        if let Some(kwargs) = self.kwargs
            && let Some(value) = kwargs.get(name)
        {
            return Some(value);
        }
        self.args.get(index)
    }

    /// Like [`get`](Self::get) but required.
    pub fn require(&self, index: usize, name: &str) -> Result<&Value> {
        self.get(index, name).ok_or_else(|| {
            PrepError::mismatch(
                self.transform,
                format!("missing required argument '{name}'"),
            )
        })
    }

    /// A required string parameter.
    pub fn string(&self, index: usize, name: &str) -> Result<String> {
        match self.require(index, name)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(PrepError::mismatch(
                self.transform,
                format!("argument '{name}' must be a string, got {other}"),
            )),
        }
    }

    /// A required numeric parameter.
    pub fn number(&self, index: usize, name: &str) -> Result<f64> {
        match self.require(index, name)? {
            Value::Number(n) => n.as_f64().ok_or_else(|| {
                PrepError::mismatch(self.transform, format!("argument '{name}' is not finite"))
            }),
            other => Err(PrepError::mismatch(
                self.transform,
                format!("argument '{name}' must be a number, got {other}"),
            )),
        }
    }

    /// A required column selection: a single name or a list of names.
    pub fn columns(&self, index: usize, name: &str) -> Result<Vec<String>> {
        match self.require(index, name)? {
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(PrepError::mismatch(
                        self.transform,
                        format!("argument '{name}' must contain column names, got {other}"),
                    )),
                })
                .collect(),
            other => Err(PrepError::mismatch(
                self.transform,
                format!("argument '{name}' must be a column name or list of names, got {other}"),
            )),
        }
    }

    /// Reject keyword arguments outside `accepted` and positional arguments
    /// beyond `max_positional`.
    pub fn reject_unknown(&self, accepted: &[&str], max_positional: usize) -> Result<()> {
        if self.args.len() > max_positional {
            return Err(PrepError::mismatch(
                self.transform,
                format!(
                    "takes at most {} positional argument(s), got {}",
                    max_positional,
                    self.args.len()
                ),
            ));
        }
        if let Some(kwargs) = self.kwargs {
            for key in kwargs.keys() {
                if !accepted.contains(&key.as_str()) {
                    return Err(PrepError::mismatch(
                        self.transform,
                        format!("unexpected keyword argument '{key}'"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Registry mapping transform names to functions.
///
/// All built-in cleaning and feature transforms are pre-registered; callers
/// may add their own before constructing a [`Pipeline`].
#[derive(Debug)]
pub struct Registry {
    transforms: HashMap<String, TransformFn>,
}

impl Registry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// A registry with all built-in transforms.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        crate::cleaner::register(&mut registry);
        crate::features::register(&mut registry);
        registry
    }

    /// Register a transform under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, func: TransformFn) {
        self.transforms.insert(name.into(), func);
    }

    fn get(&self, name: &str) -> Option<TransformFn> {
        self.transforms.get(name).copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// An ordered sequence of step descriptors plus the transform registry used
/// to resolve them. Constructed once, executable any number of times; never
/// mutated by execution.
#[derive(Debug)]
pub struct Pipeline {
    steps: Vec<StepDescriptor>,
    registry: Registry,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a pipeline over the built-in transforms.
    pub fn new(steps: Vec<StepDescriptor>) -> Self {
        Self::with_registry(steps, Registry::builtin())
    }

    /// Create a pipeline with a custom registry.
    pub fn with_registry(steps: Vec<StepDescriptor>, registry: Registry) -> Self {
        Self { steps, registry }
    }

    /// Parse a pipeline from a JSON plan document (an array of steps).
    ///
    /// A step without a `function` key is a malformed descriptor and fails
    /// here, before anything runs.
    pub fn from_json(plan: &str) -> Result<Self> {
        let steps: Vec<StepDescriptor> =
            serde_json::from_str(plan).map_err(|e| PrepError::InvalidPlan(e.to_string()))?;
        Ok(Self::new(steps))
    }

    /// Load a pipeline from a JSON plan file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let plan = std::fs::read_to_string(path)?;
        Self::from_json(&plan)
    }

    /// The declared steps, in execution order.
    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    /// Check that every declared step resolves to a registered transform.
    pub fn validate(&self) -> Result<()> {
        for step in &self.steps {
            if self.registry.get(&step.function).is_none() {
                return Err(PrepError::UnknownTransform(step.function.clone()));
            }
        }
        Ok(())
    }

    /// Apply a single step to `df`, returning the transformed DataFrame.
    ///
    /// Argument-shape mismatches are fatal, with one exception: when the
    /// descriptor carries both positional and keyword arguments, a mismatch
    /// is logged and the step is skipped, the input passing through
    /// unchanged. Existing plans rely on that skip.
    pub fn apply_step(&self, df: DataFrame, step: &StepDescriptor) -> Result<DataFrame> {
        let func = self
            .registry
            .get(&step.function)
            .ok_or_else(|| PrepError::UnknownTransform(step.function.clone()))?;

        let positional: &[Value] = step.args.as_deref().unwrap_or(&[]);
        let step_args = StepArgs::new(&step.function, positional, step.kwargs.as_ref());

        let lenient = step.args.is_some() && step.kwargs.is_some();
        if !lenient {
            return func(df, &step_args);
        }

        // DataFrame clones share column buffers.
        let fallback = df.clone();
        match func(df, &step_args) {
            Ok(out) => Ok(out),
            Err(e) if e.is_mismatch() => {
                warn!(
                    "Skipping step '{}' (positional + keyword arguments mismatched): {}",
                    step.function, e
                );
                Ok(fallback)
            }
            Err(e) => Err(e),
        }
    }

    /// Run every step in order, starting from `df`.
    ///
    /// No retries: the run either completes all steps or halts at the first
    /// fatal error. The caller's DataFrame is consumed by value; each step
    /// produces an independent new value for the next one.
    pub fn run(&self, df: DataFrame) -> Result<DataFrame> {
        let mut current = df;
        for (index, step) in self.steps.iter().enumerate() {
            debug!("Applying step {} '{}'", index + 1, step.function);
            current = self
                .apply_step(current, step)
                .context(format!("step {} ('{}')", index + 1, step.function))?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use serde_json::json;

    fn toy_df() -> DataFrame {
        df!(
            "a" => [1i64, 2, 3],
            "b" => ["x", "y", "z"],
            "c" => [0.5f64, 1.5, 2.5],
        )
        .unwrap()
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let df = toy_df();
        let out = Pipeline::new(Vec::new()).run(df.clone()).unwrap();
        assert!(out.equals_missing(&df));
    }

    #[test]
    fn run_does_not_mutate_callers_dataframe() {
        let df = toy_df();
        let kept = df.clone();
        let pipeline = Pipeline::new(vec![
            StepDescriptor::new("drop_cols").with_kwarg("subset", json!(["a", "b"])),
        ]);
        let out = pipeline.run(df).unwrap();
        assert_eq!(kept.get_column_names().len(), 3);
        assert_eq!(out.get_column_names_str(), vec!["c"]);
    }

    #[test]
    fn unknown_transform_is_fatal() {
        let pipeline = Pipeline::new(vec![StepDescriptor::new("no_such_transform")]);
        let err = pipeline.run(toy_df()).unwrap_err();
        assert!(err.to_string().contains("no_such_transform"));
    }

    #[test]
    fn validate_reports_unknown_transforms() {
        let pipeline = Pipeline::new(vec![
            StepDescriptor::new("rename_cols"),
            StepDescriptor::new("bogus"),
        ]);
        assert!(matches!(
            pipeline.validate(),
            Err(PrepError::UnknownTransform(name)) if name == "bogus"
        ));
    }

    #[test]
    fn rejects_plan_without_function() {
        let plan = r#"[ { "kwargs": { "subset": ["a"] } } ]"#;
        let err = Pipeline::from_json(plan).unwrap_err();
        assert!(matches!(err, PrepError::InvalidPlan(_)));
        assert!(err.to_string().contains("function"));
    }

    #[test]
    fn parses_plan_with_optional_argument_groups() {
        let plan = r#"[
            { "function": "drop_cols", "kwargs": { "subset": ["a"] } },
            { "function": "rename_cols" },
            { "function": "clear_numeric_strings", "args": ["b"] }
        ]"#;
        let pipeline = Pipeline::from_json(plan).unwrap();
        assert_eq!(pipeline.steps().len(), 3);
        assert!(pipeline.steps()[1].args.is_none());
        assert!(pipeline.steps()[1].kwargs.is_none());
        pipeline.validate().unwrap();
    }

    #[test]
    fn skips_step_on_combined_arg_mismatch() {
        // rename_cols takes no arguments; supplying both groups triggers the
        // lenient legacy branch and the step passes the data through.
        let df = toy_df();
        let pipeline = Pipeline::new(vec![
            StepDescriptor::new("rename_cols")
                .with_args(vec![json!(1)])
                .with_kwarg("bogus", json!(true)),
            StepDescriptor::new("drop_cols").with_kwarg("subset", json!(["b"])),
        ]);
        let out = pipeline.run(df).unwrap();
        // First step skipped (columns untouched), second step still ran.
        assert_eq!(out.get_column_names_str(), vec!["a", "c"]);
    }

    #[test]
    fn single_group_mismatch_is_fatal() {
        let pipeline = Pipeline::new(vec![
            StepDescriptor::new("rename_cols").with_args(vec![json!(1)]),
        ]);
        let err = pipeline.run(toy_df()).unwrap_err();
        assert!(err.is_mismatch());
    }

    #[test]
    fn missing_required_kwarg_is_fatal() {
        let pipeline = Pipeline::new(vec![StepDescriptor::new("drop_cols")]);
        let err = pipeline.run(toy_df()).unwrap_err();
        assert!(err.is_mismatch());
        assert!(err.to_string().contains("subset"));
    }

    #[test]
    fn keyword_wins_over_positional() {
        let args = vec![json!("positional")];
        let mut kwargs = Map::new();
        kwargs.insert("subset".to_string(), json!("keyword"));
        let view = StepArgs::new("drop_cols", &args, Some(&kwargs));
        assert_eq!(view.columns(0, "subset").unwrap(), vec!["keyword"]);
    }

    #[test]
    fn custom_transform_registration() {
        fn take_head(df: DataFrame, args: &StepArgs) -> crate::error::Result<DataFrame> {
            let n = args.number(0, "n")? as usize;
            Ok(df.head(Some(n)))
        }

        let mut registry = Registry::builtin();
        registry.register("take_head", take_head);
        let pipeline = Pipeline::with_registry(
            vec![StepDescriptor::new("take_head").with_kwarg("n", json!(2))],
            registry,
        );
        let out = pipeline.run(toy_df()).unwrap();
        assert_eq!(out.height(), 2);
    }
}
