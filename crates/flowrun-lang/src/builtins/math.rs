//! Implementations behind the built-in table. Arity and argument types are
//! already checked by the caller, so `args` has the expected length.

use crate::error::ExecutionError;
use crate::runtime::binops::floor_mod;

fn domain(func: &'static str, value: f64) -> ExecutionError {
    ExecutionError::math("error.msg.math_domain")
        .with("func", func)
        .with("value", value)
}

pub fn modulo(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    floor_mod(args[0], args[1])
}

pub fn sin(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError> { Ok(args[0].sin()) }
pub fn cos(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError> { Ok(args[0].cos()) }
pub fn tan(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError> { Ok(args[0].tan()) }

pub fn arcsin(func: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    let x = args[0];
    if !(-1.0..=1.0).contains(&x) { return Err(domain(func, x)); }
    Ok(x.asin())
}

pub fn arccos(func: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    let x = args[0];
    if !(-1.0..=1.0).contains(&x) { return Err(domain(func, x)); }
    Ok(x.acos())
}

pub fn arctan(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError> { Ok(args[0].atan()) }
pub fn floor(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError>  { Ok(args[0].floor()) }
pub fn ceil(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError>   { Ok(args[0].ceil()) }
pub fn abs(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError>    { Ok(args[0].abs()) }

/// `round(x)` or `round(x, digits)`. Ties go to the even neighbour.
pub fn round(func: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    let x = args[0];
    let Some(&digits) = args.get(1) else {
        return Ok(x.round_ties_even());
    };
    if digits.fract() != 0.0 { return Err(domain(func, digits)); }
    let scale = 10f64.powi(digits as i32);
    Ok((x * scale).round_ties_even() / scale)
}

/// Natural log, or `log(x, base)`.
pub fn log(func: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    let x = args[0];
    if x <= 0.0 { return Err(domain(func, x)); }
    match args.get(1) {
        None => Ok(x.ln()),
        Some(&base) if base <= 0.0 || base == 1.0 => Err(domain(func, base)),
        Some(&base) => Ok(x.ln() / base.ln()),
    }
}

pub fn sign(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    let x = args[0];
    Ok(if x > 0.0 { 1.0 } else if x < 0.0 { -1.0 } else { 0.0 })
}

pub fn sqrt(func: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    let x = args[0];
    if x < 0.0 { return Err(domain(func, x)); }
    Ok(x.sqrt())
}

/// `root(x, n)`: the n-th root. Negative `x` only has a real root for odd
/// integer `n`.
pub fn root(func: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    let (x, n) = (args[0], args[1]);
    if n == 0.0 { return Err(domain(func, n)); }
    if x >= 0.0 {
        return Ok(x.powf(1.0 / n));
    }
    let odd_integer = n.fract() == 0.0 && n.rem_euclid(2.0) == 1.0;
    if !odd_integer { return Err(domain(func, x)); }
    Ok(-(-x).powf(1.0 / n))
}

pub fn max(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn min(_: &'static str, args: &[f64]) -> Result<f64, ExecutionError> {
    Ok(args.iter().copied().fold(f64::INFINITY, f64::min))
}
