//! Bounded, automatable component parameters.

use alloc::vec::Vec;
use arrayvec::ArrayString;
use core::fmt::Debug;

/// Scalar types a [`Parameter`] can hold.
pub trait ParamValue: Copy + PartialOrd + Debug {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl ParamValue for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl ParamValue for i32 {
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(value: f64) -> Self {
        libm::round(value) as i32
    }
}

/// A bounded scalar with a default, optional quick-pick options and an
/// optional logarithmic response curve.
#[derive(Clone, Debug)]
pub struct Parameter<T: ParamValue> {
    /// Display name
    name: ArrayString<16>,
    /// Current value
    value: T,
    /// Minimum value
    min: T,
    /// Maximum value
    max: T,
    /// Default value
    default: T,
    /// Discrete values offered for quick selection
    options: Vec<T>,
    /// Normalized control maps exponentially onto `[min, max]`
    logarithmic: bool,
}

impl<T: ParamValue> Parameter<T> {
    /// Create a new parameter at its default value.
    pub fn new(name: &str, min: T, max: T, default: T) -> Self {
        let mut param_name = ArrayString::new();
        let _ = param_name.try_push_str(name);
        let mut param = Self {
            name: param_name,
            value: default,
            min,
            max,
            default,
            options: Vec::new(),
            logarithmic: false,
        };
        param.value = param.clamp(default);
        param.default = param.value;
        param
    }

    /// Attach quick-pick options.
    pub fn with_options(mut self, options: &[T]) -> Self {
        let options = options.iter().map(|&o| self.clamp(o)).collect();
        self.options = options;
        self
    }

    /// Use a logarithmic response curve for normalized control.
    pub fn logarithmic(mut self) -> Self {
        self.logarithmic = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> T {
        self.value
    }

    /// Set the value, clamped to `[min, max]`.
    pub fn set(&mut self, value: T) {
        self.value = self.clamp(value);
    }

    /// Restore the compiled-in default.
    pub fn reset(&mut self) {
        self.value = self.default;
    }

    pub fn default_value(&self) -> T {
        self.default
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }

    pub fn is_logarithmic(&self) -> bool {
        self.logarithmic
    }

    /// Pick one of the quick-pick options. Returns false if out of range.
    pub fn select(&mut self, option: usize) -> bool {
        match self.options.get(option) {
            Some(&value) => {
                self.value = value;
                true
            }
            None => false,
        }
    }

    /// Current value mapped to `[0, 1]` through the response curve.
    pub fn normalized(&self) -> f32 {
        let (min, max, value) = (self.min.to_f64(), self.max.to_f64(), self.value.to_f64());
        if max <= min {
            return 0.0;
        }
        let n = if self.uses_log_curve() {
            libm::log(value / min) / libm::log(max / min)
        } else {
            (value - min) / (max - min)
        };
        n.clamp(0.0, 1.0) as f32
    }

    /// Set from a `[0, 1]` control position through the response curve.
    pub fn set_normalized(&mut self, n: f32) {
        let n = (n as f64).clamp(0.0, 1.0);
        let (min, max) = (self.min.to_f64(), self.max.to_f64());
        let value = if self.uses_log_curve() {
            min * libm::pow(max / min, n)
        } else {
            min + (max - min) * n
        };
        self.set(T::from_f64(value));
    }

    fn uses_log_curve(&self) -> bool {
        self.logarithmic && self.min.to_f64() > 0.0
    }

    fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// A float or integer parameter behind one interface.
#[derive(Clone, Debug)]
pub enum AnyParam {
    Float(Parameter<f32>),
    Int(Parameter<i32>),
}

impl AnyParam {
    pub fn name(&self) -> &str {
        match self {
            AnyParam::Float(p) => p.name(),
            AnyParam::Int(p) => p.name(),
        }
    }

    /// Current value widened to f64.
    pub fn value(&self) -> f64 {
        match self {
            AnyParam::Float(p) => p.get().to_f64(),
            AnyParam::Int(p) => p.get().to_f64(),
        }
    }

    /// Set from an f64, clamping (and rounding for integers).
    pub fn set_value(&mut self, value: f64) {
        match self {
            AnyParam::Float(p) => p.set(f32::from_f64(value)),
            AnyParam::Int(p) => p.set(i32::from_f64(value)),
        }
    }

    pub fn default_value(&self) -> f64 {
        match self {
            AnyParam::Float(p) => p.default_value().to_f64(),
            AnyParam::Int(p) => p.default_value().to_f64(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            AnyParam::Float(p) => p.reset(),
            AnyParam::Int(p) => p.reset(),
        }
    }

    pub fn set_normalized(&mut self, n: f32) {
        match self {
            AnyParam::Float(p) => p.set_normalized(n),
            AnyParam::Int(p) => p.set_normalized(n),
        }
    }

    pub fn normalized(&self) -> f32 {
        match self {
            AnyParam::Float(p) => p.normalized(),
            AnyParam::Int(p) => p.normalized(),
        }
    }

    /// Float value; integers are converted.
    pub fn as_f32(&self) -> f32 {
        match self {
            AnyParam::Float(p) => p.get(),
            AnyParam::Int(p) => p.get() as f32,
        }
    }

    /// Integer value; floats are rounded.
    pub fn as_i32(&self) -> i32 {
        match self {
            AnyParam::Float(p) => i32::from_f64(p.get() as f64),
            AnyParam::Int(p) => p.get(),
        }
    }
}

impl From<Parameter<f32>> for AnyParam {
    fn from(p: Parameter<f32>) -> Self {
        AnyParam::Float(p)
    }
}

impl From<Parameter<i32>> for AnyParam {
    fn from(p: Parameter<i32>) -> Self {
        AnyParam::Int(p)
    }
}
