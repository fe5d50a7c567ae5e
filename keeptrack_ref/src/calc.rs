// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small length-expression evaluator.
//!
//! Understands `calc()`, `min()`, `max()` and `clamp()` over `px`, `rem`, `em`
//! and `%` terms with `+ - * /`. That covers what tests write into sticky
//! `top` declarations.

use alloc::vec::Vec;

use keeptrack::geometry::parse_float_prefix;

/// Bases for relative units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Units {
    pub(crate) root_font: f64,
    pub(crate) font: f64,
    pub(crate) percent_base: f64,
}

/// Evaluates `expr` to pixels.
pub(crate) fn eval(expr: &str, units: &Units) -> Option<f64> {
    let mut parser = Parser {
        src: expr.as_bytes(),
        pos: 0,
        units,
    };
    let value = parser.sum()?;
    parser.skip_ws();
    (parser.pos == parser.src.len() && value.is_finite()).then_some(value)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    units: &'a Units,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.src.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.src.get(self.pos) == Some(&byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn sum(&mut self) -> Option<f64> {
        let mut value = self.product()?;
        loop {
            if self.eat(b'+') {
                value += self.product()?;
            } else if self.eat(b'-') {
                value -= self.product()?;
            } else {
                return Some(value);
            }
        }
    }

    fn product(&mut self) -> Option<f64> {
        let mut value = self.atom()?;
        loop {
            if self.eat(b'*') {
                value *= self.atom()?;
            } else if self.eat(b'/') {
                let divisor = self.atom()?;
                if divisor == 0.0 {
                    return None;
                }
                value /= divisor;
            } else {
                return Some(value);
            }
        }
    }

    fn atom(&mut self) -> Option<f64> {
        self.skip_ws();
        if self.eat(b'(') {
            let value = self.sum()?;
            return self.eat(b')').then_some(value);
        }
        let src = self.src;
        let rest = core::str::from_utf8(&src[self.pos..]).ok()?;
        for (name, apply) in FUNCTIONS {
            if let Some(after) = rest.strip_prefix(name) {
                if after.starts_with('(') {
                    self.pos += name.len() + 1;
                    let args = self.args()?;
                    return apply(&args);
                }
            }
        }
        self.length(rest)
    }

    fn args(&mut self) -> Option<Vec<f64>> {
        let mut args = Vec::new();
        loop {
            args.push(self.sum()?);
            if self.eat(b')') {
                return Some(args);
            }
            if !self.eat(b',') {
                return None;
            }
        }
    }

    fn length(&mut self, rest: &str) -> Option<f64> {
        let number = parse_float_prefix(rest)?;
        let consumed = number_len(rest);
        let after = &rest[consumed..];
        let (scale, unit_len) = if after.starts_with("px") {
            (1.0, 2)
        } else if after.starts_with("rem") {
            (self.units.root_font, 3)
        } else if after.starts_with("em") {
            (self.units.font, 2)
        } else if after.starts_with('%') {
            (self.units.percent_base / 100.0, 1)
        } else {
            (1.0, 0)
        };
        self.pos += consumed + unit_len;
        Some(number * scale)
    }
}

/// Length in bytes of the number `parse_float_prefix` reads from `s`.
fn number_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    end = digits_from(end);
    if bytes.get(end) == Some(&b'.') {
        end = digits_from(end + 1);
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }
    end
}

type Function = fn(&[f64]) -> Option<f64>;

const FUNCTIONS: [(&str, Function); 4] = [("calc", calc), ("min", min), ("max", max), ("clamp", clamp)];

fn calc(args: &[f64]) -> Option<f64> {
    match *args {
        [value] => Some(value),
        _ => None,
    }
}

fn min(args: &[f64]) -> Option<f64> {
    args.iter().copied().reduce(f64::min)
}

fn max(args: &[f64]) -> Option<f64> {
    args.iter().copied().reduce(f64::max)
}

fn clamp(args: &[f64]) -> Option<f64> {
    match *args {
        [lo, value, hi] => Some(value.min(hi).max(lo)),
        _ => None,
    }
}
