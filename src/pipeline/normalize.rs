//! Schema normalization
//!
//! Best-effort canonicalization of an incoming raw table: column names are
//! rewritten to lower-case underscore form, the identifier column is dropped,
//! `total_charges` is coerced to numeric, and placeholder category values are
//! collapsed to the vocabulary the encoder was fitted against. Missing
//! optional columns are silently skipped; this stage never rejects a record.

use anyhow::Result;
use polars::prelude::*;

/// Identifier column dropped during normalization (no predictive signal)
pub const ID_COLUMN: &str = "customer_id";

/// Charges column that arrives as text in raw exports
pub const TOTAL_CHARGES: &str = "total_charges";

/// Flag column that arrives as 0/1 but was fitted as "No"/"Yes"
pub const SENIOR_CITIZEN: &str = "senior_citizen";

/// Rewrite a raw column or indicator name to canonical form
///
/// Lower-case underscore-separated: camelCase boundaries become underscores,
/// spaces and hyphens become underscores, and the fitted `(automatic)` suffix
/// on payment-method indicator names is stripped. Idempotent.
pub fn canonical_name(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                // Acronym followed by a regular word: "IDNumber" -> "id_number"
                Some(p) if p.is_ascii_uppercase() => {
                    next.is_some_and(|n| n.is_ascii_lowercase())
                }
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == ' ' || c == '-' {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    match out.strip_suffix("_(automatic)") {
        Some(stripped) => stripped.to_string(),
        None => out,
    }
}

/// Normalize a raw table into the canonical schema
///
/// Lenient by design: every step checks for its column and skips silently
/// when it is absent.
pub fn normalize(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;

    // Canonical column names
    let canonical: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| canonical_name(name.as_str()))
        .collect();
    df.set_column_names(canonical)?;

    // The identifier carries no predictive signal
    df = df.drop_many([ID_COLUMN]);

    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

    // Coerce total_charges to numeric; empty or unparseable values become 0.0
    if names.iter().any(|n| n == TOTAL_CHARGES) {
        let repaired = df
            .column(TOTAL_CHARGES)?
            .as_materialized_series()
            .cast(&DataType::Float64)?
            .fill_null(FillNullStrategy::Zero)?;
        df.replace(TOTAL_CHARGES, repaired)?;
    }

    // "No phone service" and "No internet service" both signal absence of the
    // service; the encoder was fitted only against "No"
    for name in &names {
        if name == TOTAL_CHARGES {
            continue;
        }
        let column = df.column(name)?;
        if column.dtype() != &DataType::String {
            continue;
        }
        let replaced: StringChunked = column
            .str()?
            .into_iter()
            .map(|opt| {
                opt.map(|v| match v {
                    "No phone service" | "No internet service" => "No",
                    other => other,
                })
            })
            .collect();
        df.replace(name, replaced.into_series().with_name(name.as_str().into()))?;
    }

    // senior_citizen arrives as a 0/1 flag but the encoder vocabulary is text
    if names.iter().any(|n| n == SENIOR_CITIZEN) {
        let column = df.column(SENIOR_CITIZEN)?;
        let mapped: Vec<Option<String>> = if column.dtype().is_primitive_numeric() {
            column
                .cast(&DataType::Int64)?
                .i64()?
                .into_iter()
                .map(|opt| {
                    opt.map(|n| match n {
                        0 => "No".to_string(),
                        1 => "Yes".to_string(),
                        other => other.to_string(),
                    })
                })
                .collect()
        } else {
            column
                .str()?
                .into_iter()
                .map(|opt| {
                    opt.map(|s| match s {
                        "0" | "No" => "No".to_string(),
                        "1" | "Yes" => "Yes".to_string(),
                        other => other.to_string(),
                    })
                })
                .collect()
        };
        df.replace(SENIOR_CITIZEN, Series::new(SENIOR_CITIZEN.into(), mapped))?;
    }

    Ok(df)
}
