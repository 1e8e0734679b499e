use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::{Group, Keyword};
use crate::error::{UsageError, ValidationError};
use crate::schema::Scope;
use crate::types::{Kind, Type};

/// `multipleOf`, `maximum`, `exclusiveMaximum`, `minimum`, `exclusiveMinimum`.
///
/// The exclusive bounds are numbers, as in 2020-12, not the booleans of older drafts.
/// Limits are kept as [`Number`] so integral limits serialize without a fraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumericConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
}

fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Orders two numbers, exactly when both are integral.
fn compare(a: &Number, b: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (as_integer(a), as_integer(b)) {
        return a.cmp(&b);
    }
    as_f64(a).partial_cmp(&as_f64(b)).unwrap_or(Ordering::Equal)
}

fn is_multiple(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (value.as_i64(), divisor.as_i64()) {
        return v % d == 0;
    }
    if let (Some(v), Some(d)) = (value.as_u64(), divisor.as_u64()) {
        return v % d == 0;
    }
    let quotient = as_f64(value) / as_f64(divisor);
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
}

impl Keyword for NumericConstraints {
    fn group(&self) -> Group {
        Group::Numeric
    }

    fn kind(&self) -> Kind {
        Kind::ASSERTION
    }

    fn applies_to(&self, t: Type) -> bool {
        t.has(&[Type::INTEGER | Type::NUMBER])
    }

    fn is_active(&self) -> bool {
        self.multiple_of.is_some()
            || self.maximum.is_some()
            || self.exclusive_maximum.is_some()
            || self.minimum.is_some()
            || self.exclusive_minimum.is_some()
    }

    fn validate(&self, value: &Value, _scope: &Scope<'_>) -> Result<(), ValidationError> {
        let Value::Number(n) = value else {
            return Ok(());
        };
        if let Some(divisor) = &self.multiple_of {
            if as_f64(divisor) <= 0.0 {
                return Err(UsageError::InvalidMultipleOf {
                    value: divisor.to_string(),
                }
                .into());
            }
            if !is_multiple(n, divisor) {
                return Err(ValidationError::MultipleOf {
                    value: n.clone(),
                    divisor: divisor.clone(),
                });
            }
        }
        if let Some(limit) = &self.maximum {
            if compare(n, limit) == Ordering::Greater {
                return Err(ValidationError::Maximum {
                    value: n.clone(),
                    limit: limit.clone(),
                });
            }
        }
        if let Some(limit) = &self.exclusive_maximum {
            if compare(n, limit) != Ordering::Less {
                return Err(ValidationError::ExclusiveMaximum {
                    value: n.clone(),
                    limit: limit.clone(),
                });
            }
        }
        if let Some(limit) = &self.minimum {
            if compare(n, limit) == Ordering::Less {
                return Err(ValidationError::Minimum {
                    value: n.clone(),
                    limit: limit.clone(),
                });
            }
        }
        if let Some(limit) = &self.exclusive_minimum {
            if compare(n, limit) != Ordering::Greater {
                return Err(ValidationError::ExclusiveMinimum {
                    value: n.clone(),
                    limit: limit.clone(),
                });
            }
        }
        Ok(())
    }
}
