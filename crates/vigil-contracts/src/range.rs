use serde::Serialize;
use vigil_reflect::{FieldKind, Value};

/// Lenient numeric-literal cleanup applied to each range bound before
/// parsing: whitespace and thousands separators (`,`, `_`) are stripped;
/// digits, sign, decimal point and exponent markers are kept; anything else
/// is silently dropped. The leniency is a contract of its own — it governs
/// which bound spellings (`1_000`, `2, 000`) are accepted.
pub fn sanitize_numeric(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_whitespace() || c == ',' || c == '_' {
            continue;
        }
        if c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E') {
            out.push(c);
        }
    }
    out
}

/// Parsed `Range` bound: sanitized bound literals, per-side inclusivity, and
/// whether either literal carries a float marker. The numeric domain is
/// resolved against the target field at check time, not at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeExpr {
    pub lower: String,
    pub upper: String,
    pub lower_inclusive: bool,
    pub upper_inclusive: bool,
    pub float_bounds: bool,
}

impl RangeExpr {
    /// Parses the remainder of a rule tag after the `Range` prefix, e.g.
    /// `[0,100)` or `( 1.5, 2.5]`. Bracket style is independent per side.
    /// The interior splits at its first comma, so thousands separators in
    /// the lower bound must use `_`; the upper bound tolerates either.
    pub fn parse(rest: &str) -> Result<Self, String> {
        let spec = rest.trim_start();
        if spec.len() < 2 {
            return Err("range spec must look like [lower,upper]".to_string());
        }
        let lower_inclusive = match spec.as_bytes()[0] {
            b'[' => true,
            b'(' => false,
            _ => return Err("range spec must open with '[' or '('".to_string()),
        };
        let upper_inclusive = match spec.as_bytes()[spec.len() - 1] {
            b']' => true,
            b')' => false,
            _ => return Err("range spec must close with ']' or ')'".to_string()),
        };
        let interior = &spec[1..spec.len() - 1];
        let (lower_raw, upper_raw) = interior
            .split_once(',')
            .ok_or_else(|| "range spec needs two comma-separated bounds".to_string())?;

        let lower = sanitize_numeric(lower_raw);
        let upper = sanitize_numeric(upper_raw);
        if lower.is_empty() || upper.is_empty() {
            return Err("range bound is empty after sanitization".to_string());
        }
        let float_bounds = has_float_marker(&lower) || has_float_marker(&upper);

        Ok(Self {
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
            float_bounds,
        })
    }

    /// Compares a field's live value against the bound. Integer fields use
    /// exact comparison in their own signedness domain and reject float
    /// literals; float fields always take the tolerant float path.
    pub fn check(&self, kind: &FieldKind, value: &Value) -> Result<bool, String> {
        match (kind, value) {
            (FieldKind::Int { signed: true }, Value::Int(v)) => {
                self.check_signed().map(|(lo, hi)| {
                    within(*v, lo, hi, self.lower_inclusive, self.upper_inclusive)
                })
            }
            (FieldKind::Int { signed: false }, Value::UInt(v)) => {
                self.check_unsigned().map(|(lo, hi)| {
                    within(*v, lo, hi, self.lower_inclusive, self.upper_inclusive)
                })
            }
            (FieldKind::Float, Value::Float(v)) => self.check_float(*v),
            (kind, _) if !kind.is_numeric() => {
                Err("Range invariant used on a non-numeric field".to_string())
            }
            _ => Err("live value does not match the declared numeric kind".to_string()),
        }
    }

    fn check_signed(&self) -> Result<(i64, i64), String> {
        if self.float_bounds {
            return Err("integer field requires integer bounds".to_string());
        }
        let lo: i64 = parse_bound(&self.lower)?;
        let hi: i64 = parse_bound(&self.upper)?;
        if lo > hi {
            return Err("lower bound must be <= upper bound".to_string());
        }
        Ok((lo, hi))
    }

    fn check_unsigned(&self) -> Result<(u64, u64), String> {
        if self.float_bounds {
            return Err("integer field requires integer bounds".to_string());
        }
        let lo: u64 = parse_bound(&self.lower)?;
        let hi: u64 = parse_bound(&self.upper)?;
        if lo > hi {
            return Err("lower bound must be <= upper bound".to_string());
        }
        Ok((lo, hi))
    }

    fn check_float(&self, value: f64) -> Result<bool, String> {
        let lo: f64 = parse_bound(&self.lower)?;
        let hi: f64 = parse_bound(&self.upper)?;
        if lo > hi {
            return Err("lower bound must be <= upper bound".to_string());
        }
        // Adaptive epsilon, widened outward so representation error near a
        // boundary never excludes a value that is inside the range.
        let scale = 1.0_f64.max(lo.abs()).max(hi.abs()).max(value.abs());
        let eps = (scale * 1e-6).clamp(1e-10, 1e-3);
        let lower_ok = if self.lower_inclusive {
            value >= lo - eps
        } else {
            value > lo - eps
        };
        let upper_ok = if self.upper_inclusive {
            value <= hi + eps
        } else {
            value < hi + eps
        };
        Ok(lower_ok && upper_ok)
    }
}

fn has_float_marker(bound: &str) -> bool {
    bound.contains(['.', 'e', 'E'])
}

fn parse_bound<T: std::str::FromStr>(bound: &str) -> Result<T, String> {
    bound
        .parse()
        .map_err(|_| format!("unparseable range bound `{bound}`"))
}

fn within<T: PartialOrd>(value: T, lo: T, hi: T, lo_inc: bool, hi_inc: bool) -> bool {
    let lower_ok = if lo_inc { value >= lo } else { value > lo };
    let upper_ok = if hi_inc { value <= hi } else { value < hi };
    lower_ok && upper_ok
}
