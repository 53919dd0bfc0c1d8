use super::types::{SlabBound, TaxSlab};

/// Walk an ordered slab table and accumulate tax on `taxable_income`.
///
/// The walk is total and deterministic over any slice: a malformed table
/// (non-ascending bounds, an unbounded slab before the end) still runs to
/// completion and returns whatever the walk produces. Callers that care
/// about well-formedness run `validate_slabs` first.
pub fn compute_tax(taxable_income: f64, slabs: &[TaxSlab]) -> f64 {
    let mut tax = 0.0;
    let mut prev_limit = 0.0;
    let mut remaining = taxable_income;

    for slab in slabs {
        let taxable_here = match slab.upper {
            SlabBound::Unbounded => remaining,
            SlabBound::Bounded(upper) => (upper - prev_limit).min(remaining).max(0.0),
        };

        if taxable_here <= 0.0 {
            if let SlabBound::Bounded(upper) = slab.upper {
                prev_limit = upper;
            }
            continue;
        }

        tax += taxable_here * (slab.rate_percent / 100.0);
        remaining -= taxable_here;
        if let SlabBound::Bounded(upper) = slab.upper {
            prev_limit = upper;
        }
        if remaining <= 0.0 {
            break;
        }
    }

    tax
}

/// Boundary validation for user-supplied slab tables: non-empty, finite,
/// strictly ascending bounds starting above zero, and at most one
/// unbounded slab which must be last.
pub fn validate_slabs(slabs: &[TaxSlab]) -> Result<(), String> {
    if slabs.is_empty() {
        return Err("tax slab table must contain at least one slab".to_string());
    }

    let mut prev_upper = 0.0;
    for (index, slab) in slabs.iter().enumerate() {
        if !slab.rate_percent.is_finite() {
            return Err(format!("slab {} has a non-finite rate", index + 1));
        }
        match slab.upper {
            SlabBound::Bounded(upper) => {
                if !upper.is_finite() {
                    return Err(format!("slab {} has a non-finite upper bound", index + 1));
                }
                if upper <= prev_upper {
                    return Err(format!(
                        "slab upper bounds must be ascending; slab {} does not extend past {}",
                        index + 1,
                        prev_upper
                    ));
                }
                prev_upper = upper;
            }
            SlabBound::Unbounded => {
                if index + 1 != slabs.len() {
                    return Err("only the last slab may be unbounded".to_string());
                }
            }
        }
    }

    Ok(())
}
