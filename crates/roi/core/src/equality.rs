// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Structural equality over value trees
//!
//! Used by the version differ to decide whether a `data` or `metadata` field changed.
//! Numbers compare with exact `==`: two metrics computed through different float paths
//! can differ in the last bit and will be reported as modified. No tolerance is applied.

use crate::value::Value;

/// Structural equality of two values
///
/// Lists are order-sensitive; maps compare key sets and then each entry.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }

    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::List(xs), Value::List(ys)) => xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y)),
        (Value::Map(xs), Value::Map(ys)) => xs.len() == ys.len() && xs.iter().all(|(key, x)| ys.get(key).is_some_and(|y| deep_equal(x, y))),
        _ => false,
    }
}

/// Equality where `None` stands for an absent field
///
/// Absent and `null` are both nullish and equal to each other; a nullish side never
/// equals a non-nullish one.
pub fn deep_equal_opt(a: Option<&Value>, b: Option<&Value>) -> bool {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => deep_equal(x, y),
        _ => false,
    }
}
