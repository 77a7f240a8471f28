//! Global tunable parameters initialized from environment variables.
//!
//! An [`EnvParam`] names an environment variable and a default value (as a string,
//! so that the parameter can be declared in a `static`). The parameter is parsed
//! on first access and frozen afterwards: later changes to the environment are
//! ignored.
//!
//! This is meant for knobs that influence an algorithm but do not deserve a place
//! in the public API or on the command line.
//!
//! ```
//! use env_param::EnvParam;
//! static WIDTH: EnvParam<u32> = EnvParam::new("DEMO_WIDTH", "16");
//!
//! fn main() {
//!     // variable not set: the default applies
//!     assert_eq!(WIDTH.get(), 16);
//! }
//! ```
//!
//! If the environment variable is set before the first access, its value wins:
//!
//! ```
//! use env_param::EnvParam;
//! static DEPTH: EnvParam<u32> = EnvParam::new("DEMO_DEPTH", "3");
//!
//! fn main() {
//!     std::env::set_var("DEMO_DEPTH", "7");
//!     assert_eq!(DEPTH.get(), 7);
//! }
//! ```
//!
//! A parameter may also be forced programmatically with [`EnvParam::set`], which
//! panics if the value was already read (the read value may have been acted upon,
//! so silently changing it would be a bug factory).

use once_cell::sync::OnceCell;
use std::str::FromStr;

pub struct EnvParam<T> {
    /// Name of the environment variable holding the override, if any.
    var: &'static str,
    /// Textual form of the default value, parsed on first access.
    default: &'static str,
    cell: OnceCell<T>,
}

impl<T> EnvParam<T> {
    pub const fn new(var: &'static str, default: &'static str) -> EnvParam<T> {
        EnvParam {
            var,
            default,
            cell: OnceCell::new(),
        }
    }

    /// Name of the backing environment variable.
    pub fn var_name(&self) -> &'static str {
        self.var
    }
}

impl<T: FromStr> EnvParam<T> {
    /// Returns the value of the parameter, initializing it on first access.
    ///
    /// # Panics
    ///
    /// Panics if the declared default cannot be parsed to `T`.
    pub fn get(&self) -> T
    where
        T: Copy,
    {
        *self.get_ref()
    }

    /// Reference-returning variant of [`EnvParam::get`] for non-`Copy` parameter types.
    pub fn get_ref(&self) -> &T {
        self.cell.get_or_init(|| self.resolve())
    }

    /// Forces the value of the parameter without consulting the environment.
    ///
    /// # Panics
    ///
    /// Panics if the parameter was already initialized (set or read).
    pub fn set(&self, value: T) {
        if self.cell.set(value).is_err() {
            panic!("parameter {} was already initialized", self.var);
        }
    }

    fn resolve(&self) -> T {
        let parsed_default = || match T::from_str(self.default) {
            Ok(v) => v,
            Err(_) => panic!("{}: unparseable default value {:?}", self.var, self.default),
        };
        match std::env::var(self.var) {
            Ok(text) => match T::from_str(&text) {
                Ok(v) => v,
                Err(_) => {
                    eprintln!(
                        "[env_param] {}: could not parse {:?}, falling back to default {:?}",
                        self.var, text, self.default
                    );
                    parsed_default()
                }
            },
            Err(std::env::VarError::NotPresent) => parsed_default(),
            Err(err) => {
                eprintln!("[env_param] {}: {err}, falling back to default {:?}", self.var, self.default);
                parsed_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_applies_when_unset() {
        static P: EnvParam<i64> = EnvParam::new("ENV_PARAM_TEST_UNSET", "42");
        assert_eq!(P.get(), 42);
    }

    #[test]
    fn environment_overrides_default() {
        static P: EnvParam<i64> = EnvParam::new("ENV_PARAM_TEST_SET", "0");
        std::env::set_var("ENV_PARAM_TEST_SET", "-7");
        assert_eq!(P.get(), -7);
    }

    #[test]
    fn first_read_freezes_the_value() {
        static P: EnvParam<bool> = EnvParam::new("ENV_PARAM_TEST_FROZEN", "false");
        assert!(!P.get());
        std::env::set_var("ENV_PARAM_TEST_FROZEN", "true");
        assert!(!P.get());
    }

    #[test]
    fn unparseable_override_falls_back() {
        static P: EnvParam<u32> = EnvParam::new("ENV_PARAM_TEST_GARBAGE", "5");
        std::env::set_var("ENV_PARAM_TEST_GARBAGE", "not-a-number");
        assert_eq!(P.get(), 5);
    }

    #[test]
    fn programmatic_set_wins() {
        static P: EnvParam<u32> = EnvParam::new("ENV_PARAM_TEST_FORCED", "1");
        P.set(9);
        assert_eq!(P.get(), 9);
    }
}
