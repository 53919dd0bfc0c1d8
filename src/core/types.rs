/// Upper edge of a tax slab: a concrete income bound, or the open-ended
/// remainder band.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SlabBound {
    Bounded(f64),
    Unbounded,
}

/// One band of a progressive tax table. A table is an ordered slice of
/// slabs covering income from zero upward, ascending, with at most one
/// unbounded slab which must come last.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TaxSlab {
    pub upper: SlabBound,
    pub rate_percent: f64,
}

impl TaxSlab {
    pub fn bounded(upper: f64, rate_percent: f64) -> Self {
        Self {
            upper: SlabBound::Bounded(upper),
            rate_percent,
        }
    }

    pub fn unbounded(rate_percent: f64) -> Self {
        Self {
            upper: SlabBound::Unbounded,
            rate_percent,
        }
    }
}
