//! Value ranges per component and of the tuple magnitude.
//!
//! `NaN` never takes part in a range. The finite variants additionally skip the infinities.
//! Tuples flagged in a ghost array can be excluded; a range over no values at all is `None`.

use super::GenericArray;
use crate::prelude::*;

/// Which quantity a range is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeComponent {
    Component(usize),
    /// euclidean norm of each tuple. For single component arrays this is the range of
    /// component 0 (signed), matching the component range.
    Magnitude,
}

impl From<usize> for RangeComponent {
    fn from(component: usize) -> Self {
        Self::Component(component)
    }
}

/// Per-tuple flags marking tuples to leave out of a range.
///
/// A tuple is skipped when `flags[tuple] & skip != 0`. Tuples past the end of `flags` are
/// never skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ghosts<'a> {
    pub flags: &'a [u8],
    pub skip: u8,
}

impl<'a> Ghosts<'a> {
    /// skip a tuple when any flag bit is set
    pub const DEFAULT_SKIP: u8 = 0xff;

    pub fn new(flags: &'a [u8]) -> Self {
        Self {
            flags,
            skip: Self::DEFAULT_SKIP,
        }
    }

    pub fn with_skip(flags: &'a [u8], skip: u8) -> Self {
        Self { flags, skip }
    }

    #[inline]
    pub fn is_skipped(&self, tuple_idx: usize) -> bool {
        self.flags
            .get(tuple_idx)
            .map_or(false, |flag| flag & self.skip != 0)
    }
}

#[inline]
fn skipped(ghosts: Option<&Ghosts<'_>>, tuple_idx: usize) -> bool {
    ghosts.map_or(false, |ghosts| ghosts.is_skipped(tuple_idx))
}

/// cached ranges, keyed by quantity and finiteness
#[derive(Debug, Default)]
pub(crate) struct RangeCache {
    entries: Vec<(RangeComponent, bool, Option<[f64; 2]>)>,
}

impl RangeCache {
    fn get(&self, which: RangeComponent, finite: bool) -> Option<Option<[f64; 2]>> {
        self.entries
            .iter()
            .find(|(w, f, _)| *w == which && *f == finite)
            .map(|(_, _, range)| *range)
    }

    fn insert(&mut self, which: RangeComponent, finite: bool, range: Option<[f64; 2]>) {
        self.entries.push((which, finite, range));
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

fn component_range<B: Backend>(
    backend: &B,
    tuples: usize,
    component: usize,
    ghosts: Option<&Ghosts<'_>>,
    finite: bool,
) -> Option<[B::Value; 2]> {
    let mut range: Option<[B::Value; 2]> = None;

    for tuple in 0..tuples {
        if skipped(ghosts, tuple) {
            continue;
        }

        let value = backend.get_component(tuple, component);
        if value.is_nan() || (finite && !value.is_finite()) {
            continue;
        }

        range = Some(match range {
            None => [value, value],
            Some([low, high]) => [
                if value < low { value } else { low },
                if value > high { value } else { high },
            ],
        });
    }

    range
}

fn magnitude_range<B: Backend>(
    backend: &B,
    tuples: usize,
    ghosts: Option<&Ghosts<'_>>,
    finite: bool,
) -> Option<[f64; 2]> {
    let components = backend.components();
    let mut range: Option<[f64; 2]> = None;

    for tuple in 0..tuples {
        if skipped(ghosts, tuple) {
            continue;
        }

        let squared: f64 = (0..components)
            .map(|component| {
                let value = backend.get_component(tuple, component).as_f64();
                value * value
            })
            .sum();

        if squared.is_nan() || (finite && !squared.is_finite()) {
            continue;
        }

        range = Some(match range {
            None => [squared, squared],
            Some([low, high]) => [low.min(squared), high.max(squared)],
        });
    }

    range.map(|[low, high]| [low.sqrt(), high.sqrt()])
}

impl<B: Backend> GenericArray<B> {
    /// `[min, max]` of one component in the array's own type, `None` if no value qualifies
    pub fn value_range(
        &self,
        component: usize,
        ghosts: Option<Ghosts<'_>>,
    ) -> Option<[B::Value; 2]> {
        self.typed_range(component, ghosts, false)
    }

    /// like [`GenericArray::value_range`] but ignoring infinities
    pub fn finite_value_range(
        &self,
        component: usize,
        ghosts: Option<Ghosts<'_>>,
    ) -> Option<[B::Value; 2]> {
        self.typed_range(component, ghosts, true)
    }

    fn typed_range(
        &self,
        component: usize,
        ghosts: Option<Ghosts<'_>>,
        finite: bool,
    ) -> Option<[B::Value; 2]> {
        if component >= self.number_of_components() {
            return None;
        }
        component_range(
            &self.backend,
            self.number_of_tuples(),
            component,
            ghosts.as_ref(),
            finite,
        )
    }

    /// Compute a range without touching the cache.
    pub fn compute_range(&self, which: RangeComponent, ghosts: Option<Ghosts<'_>>) -> Option<[f64; 2]> {
        self.compute(which, ghosts, false)
    }

    pub fn compute_finite_range(
        &self,
        which: RangeComponent,
        ghosts: Option<Ghosts<'_>>,
    ) -> Option<[f64; 2]> {
        self.compute(which, ghosts, true)
    }

    fn compute(
        &self,
        which: RangeComponent,
        ghosts: Option<Ghosts<'_>>,
        finite: bool,
    ) -> Option<[f64; 2]> {
        let which = match which {
            RangeComponent::Magnitude if self.number_of_components() == 1 => {
                RangeComponent::Component(0)
            }
            other => other,
        };

        match which {
            RangeComponent::Component(component) => self
                .typed_range(component, ghosts, finite)
                .map(|[low, high]| [low.as_f64(), high.as_f64()]),
            RangeComponent::Magnitude => magnitude_range(
                &self.backend,
                self.number_of_tuples(),
                ghosts.as_ref(),
                finite,
            ),
        }
    }

    /// Range over every tuple, cached until the array is modified.
    pub fn range(&self, which: RangeComponent) -> Option<[f64; 2]> {
        self.cached_range(which, false)
    }

    /// Finite range over every tuple, cached until the array is modified.
    pub fn finite_range(&self, which: RangeComponent) -> Option<[f64; 2]> {
        self.cached_range(which, true)
    }

    fn cached_range(&self, which: RangeComponent, finite: bool) -> Option<[f64; 2]> {
        let mut cache = self.cache();
        if let Some(range) = cache.ranges.get(which, finite) {
            return range;
        }

        let range = self.compute(which, None, finite);
        cache.ranges.insert(which, finite, range);
        range
    }
}
