//! Friendship generation.
//!
//! # Selection model
//!
//! Every student independently draws exactly `degree` candidate friends,
//! uniformly and without replacement, from the other `n - 1` students. The
//! undirected edge set is the union of all `{i, j}` pairs with duplicates
//! removed.
//!
//! Because selection is per student and not symmetric, a student chosen by
//! others gains those edges on top of its own picks: realized degree is
//! always `>= degree` and frequently larger. This is part of the model.
//!
//! The random source is always passed in by the caller, so a seeded RNG
//! reproduces the same friendship set.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::index;
use tracing::{debug, instrument};

use crate::error::GeneratorError;

/// An injectable friendship-generation policy.
///
/// Implementations return normalized pairs `(a, b)` with `a < b`, sorted
/// ascending and free of duplicates.
pub trait FriendshipSource {
    /// Produce friendship pairs over student indexes `0..student_count`.
    ///
    /// # Errors
    ///
    /// Returns a [`GeneratorError`] if the parameters cannot produce a valid
    /// edge set.
    fn friendships<R: Rng + ?Sized>(
        &self,
        student_count: usize,
        rng: &mut R,
    ) -> Result<Vec<(usize, usize)>, GeneratorError>;
}

// ---------------------------------------------------------------------------
// UniformOutDegree
// ---------------------------------------------------------------------------

/// Each student picks `degree` distinct friends uniformly at random.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformOutDegree {
    pub degree: usize,
}

impl FriendshipSource for UniformOutDegree {
    fn friendships<R: Rng + ?Sized>(
        &self,
        student_count: usize,
        rng: &mut R,
    ) -> Result<Vec<(usize, usize)>, GeneratorError> {
        generate_friendships(student_count, self.degree, rng)
    }
}

/// Generate the friendship pair set for `student_count` students, each
/// choosing `degree` candidates.
///
/// # Errors
///
/// - [`GeneratorError::EmptyPopulation`] if `student_count == 0`.
/// - [`GeneratorError::InvalidDegree`] unless `0 < degree < student_count`.
#[instrument(skip(rng))]
pub fn generate_friendships<R: Rng + ?Sized>(
    student_count: usize,
    degree: usize,
    rng: &mut R,
) -> Result<Vec<(usize, usize)>, GeneratorError> {
    if student_count == 0 {
        return Err(GeneratorError::EmptyPopulation);
    }
    if degree == 0 || degree >= student_count {
        return Err(GeneratorError::InvalidDegree {
            degree,
            student_count,
        });
    }

    let mut pairs = BTreeSet::new();
    for i in 0..student_count {
        // Sample from the n - 1 other students, then shift past `i`.
        for pick in index::sample(rng, student_count - 1, degree) {
            let j = if pick >= i { pick + 1 } else { pick };
            pairs.insert((i.min(j), i.max(j)));
        }
    }

    debug!(
        student_count,
        degree,
        edges = pairs.len(),
        "generated friendships"
    );
    Ok(pairs.into_iter().collect())
}

// ---------------------------------------------------------------------------
// FixedFriendships
// ---------------------------------------------------------------------------

/// A predetermined friendship list. Ignores the random source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedFriendships {
    pairs: Vec<(usize, usize)>,
}

impl FixedFriendships {
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// A single ring `0 - 1 - ... - (n-1) - 0`.
    #[must_use]
    pub fn ring(student_count: usize) -> Self {
        Self::new((0..student_count).map(|i| (i, (i + 1) % student_count)))
    }
}

impl FriendshipSource for FixedFriendships {
    fn friendships<R: Rng + ?Sized>(
        &self,
        student_count: usize,
        _rng: &mut R,
    ) -> Result<Vec<(usize, usize)>, GeneratorError> {
        if student_count == 0 {
            return Err(GeneratorError::EmptyPopulation);
        }
        let mut pairs = BTreeSet::new();
        for &(a, b) in &self.pairs {
            if a == b || a >= student_count || b >= student_count {
                return Err(GeneratorError::InvalidPair(a, b));
            }
            pairs.insert((a.min(b), a.max(b)));
        }
        Ok(pairs.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
