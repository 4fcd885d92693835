//! # Handler and Getter capabilities
//!
//! A handler maps (read-only Container, empty ChangeContext) to the filled
//! ChangeContext. A getter maps (read-only module view, arguments) to a JSON
//! value. Both must be pure: the same inputs always give the same output.
//!
//! Plain closures and `fn` items implement both traits.

use sd_01_state_store::ModuleView;
use sd_02_execution_context::{ChangeContext, Container};
use serde_json::Value;
use shared_types::Args;

use super::GetterError;

pub trait Handler: Send + Sync {
    fn call(&self, container: &Container, ctx: ChangeContext) -> ChangeContext;
}

impl<F> Handler for F
where
    F: Fn(&Container, ChangeContext) -> ChangeContext + Send + Sync,
{
    fn call(&self, container: &Container, ctx: ChangeContext) -> ChangeContext {
        self(container, ctx)
    }
}

pub trait Getter: Send + Sync {
    fn query(&self, view: &ModuleView, args: &Args) -> Result<Value, GetterError>;
}

impl<F> Getter for F
where
    F: Fn(&ModuleView, &Args) -> Result<Value, GetterError> + Send + Sync,
{
    fn query(&self, view: &ModuleView, args: &Args) -> Result<Value, GetterError> {
        self(view, args)
    }
}

/// Required string argument of a getter.
pub fn required_str<'a>(args: &'a Args, name: &str) -> Result<&'a str, GetterError> {
    match args.get(name) {
        None => Err(GetterError::MissingArgument(name.to_string())),
        Some(value) => value.as_str().ok_or_else(|| GetterError::InvalidArgument {
            name: name.to_string(),
            reason: "expected a string".into(),
        }),
    }
}
