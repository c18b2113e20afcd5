// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encoded polyline codec (Google polyline algorithm).
//
// Route geometries come back from the routing engine as polyline strings at
// precision 6. Encoded order is latitude then longitude; decoded positions
// are returned as `Coordinate` (longitude first).

use crate::error::{NavBridgeError, Result};
use crate::types::Coordinate;

/// Precision of route geometries returned by the routing engine.
pub const ROUTE_GEOMETRY_PRECISION: u32 = 6;

const MAX_PRECISION: u32 = 10;

fn factor(precision: u32) -> Result<f64> {
    if precision > MAX_PRECISION {
        return Err(NavBridgeError::Polyline(format!(
            "precision {precision} exceeds {MAX_PRECISION}"
        )));
    }
    Ok(10f64.powi(precision as i32))
}

/// Decode an encoded polyline into coordinates.
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<Coordinate>> {
    let factor = factor(precision)?;
    let bytes = encoded.as_bytes();
    let mut path = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, next_delta(bytes, &mut index)?, index)?;
        if index >= bytes.len() {
            return Err(NavBridgeError::Polyline(format!(
                "dangling latitude at offset {index}"
            )));
        }
        lon = accumulate(lon, next_delta(bytes, &mut index)?, index)?;
        path.push(Coordinate {
            longitude: lon as f64 / factor,
            latitude: lat as f64 / factor,
        });
    }

    Ok(path)
}

/// Encode coordinates as a polyline string.
pub fn encode(path: &[Coordinate], precision: u32) -> Result<String> {
    let factor = factor(precision)?;
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for c in path {
        let lat = scaled(c.latitude, factor)?;
        let lon = scaled(c.longitude, factor)?;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lon - prev_lon);
        prev_lat = lat;
        prev_lon = lon;
    }

    Ok(out)
}

fn accumulate(total: i64, delta: i64, index: usize) -> Result<i64> {
    total.checked_add(delta).ok_or_else(|| {
        NavBridgeError::Polyline(format!("coordinate overflows before offset {index}"))
    })
}

/// Largest scaled magnitude `encode` accepts; keeps every delta and its
/// zig-zag form inside `i64`.
const MAX_SCALED: f64 = (1u64 << 60) as f64;

fn scaled(value: f64, factor: f64) -> Result<i64> {
    let v = (value * factor).round();
    if !v.is_finite() || v.abs() >= MAX_SCALED {
        return Err(NavBridgeError::Polyline(format!("coordinate {value} out of range")));
    }
    Ok(v as i64)
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let Some(&raw) = bytes.get(*index) else {
            return Err(NavBridgeError::Polyline(format!(
                "truncated value at offset {index}"
            )));
        };
        if !(63..127).contains(&raw) {
            return Err(NavBridgeError::Polyline(format!(
                "invalid character {:?} at offset {index}",
                raw as char
            )));
        }
        if shift > 60 {
            return Err(NavBridgeError::Polyline(format!(
                "value overflows at offset {index}"
            )));
        }
        *index += 1;

        let chunk = i64::from(raw - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

fn push_value(out: &mut String, value: i64) {
    let mut v = value << 1;
    if value < 0 {
        v = !v;
    }
    while v >= 0x20 {
        out.push(char::from((0x20 | (v & 0x1f)) as u8 + 63));
        v >>= 5;
    }
    out.push(char::from(v as u8 + 63));
}
