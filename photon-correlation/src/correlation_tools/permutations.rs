use tracing::debug;

use crate::errors::Error;

/// Odometer over every sequence of `length` values drawn, with repetition,
/// from `[0, limit)`. The last position turns fastest so sequences come out
/// in lexicographic order.
///
/// Once the space is exhausted the iterator keeps returning `None`.
#[derive(Debug, Clone)]
pub struct Combinations {
    length: usize,
    limit: usize,
    current: Vec<usize>,
    yielded: bool,
    exhausted: bool,
}

impl Combinations {
    pub fn new(length: usize, limit: usize) -> Self {
        Self {
            length,
            limit,
            current: vec![0; length],
            yielded: false,
            exhausted: limit == 0 && length > 0,
        }
    }

    /// `limit ^ length`, or `None` on overflow.
    pub fn total(&self) -> Option<usize> {
        (0..self.length).try_fold(1usize, |acc, _| acc.checked_mul(self.limit))
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if !self.yielded {
            self.yielded = true;
            return Some(self.current.clone());
        }

        for position in (0..self.length).rev() {
            self.current[position] += 1;
            if self.current[position] < self.limit {
                return Some(self.current.clone());
            }
            self.current[position] = 0;
        }

        self.exhausted = true;
        None
    }
}

impl std::iter::FusedIterator for Combinations {}

/// `n!`, failing instead of overflowing.
pub fn factorial(n: usize) -> Result<usize, Error> {
    (1..=n).try_fold(1usize, |acc, k| acc.checked_mul(k)).ok_or_else(|| {
        Error::InvalidConfiguration(format!("{}! does not fit in memory addressing", n))
    })
}

/// True if every entry of `sequence` is distinct.
pub fn is_permutation(sequence: &[usize]) -> bool {
    for i in 0..sequence.len() {
        for j in (i + 1)..sequence.len() {
            if sequence[i] == sequence[j] {
                return false;
            }
        }
    }
    true
}

/// True if `sequence` is strictly increasing, which implies distinct entries.
pub fn is_positive_permutation(sequence: &[usize]) -> bool {
    sequence.windows(2).all(|pair| pair[0] < pair[1])
}

/// Immutable set of the orderings of `length` tuple members.
///
/// With `positive_only` only the strictly increasing ordering survives, which
/// is the identity. Otherwise all `length!` orderings are kept, in the order
/// they are discovered by walking [`Combinations`].
#[derive(Debug, Clone)]
pub struct Permutations {
    length: usize,
    positive_only: bool,
    count: usize,
    values: Vec<usize>,
}

impl Permutations {
    pub fn new(length: usize, positive_only: bool) -> Result<Self, Error> {
        debug!(length, positive_only, "Building permutations");
        let bound = factorial(length)?;
        let slots = bound.checked_mul(length).ok_or_else(|| {
            Error::Allocation(format!("{} permutations of length {}", bound, length))
        })?;

        let mut values: Vec<usize> = Vec::new();
        values.try_reserve_exact(slots).map_err(|_| {
            Error::Allocation(format!("{} permutations of length {}", bound, length))
        })?;

        let mut count = 0;
        for candidate in Combinations::new(length, length) {
            let accepted = if positive_only {
                is_positive_permutation(&candidate)
            } else {
                is_permutation(&candidate)
            };

            if accepted {
                values.extend_from_slice(&candidate);
                count += 1;
            }
        }
        debug!(count, "Found permutations");

        Ok(Self {
            length,
            positive_only,
            count,
            values,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn positive_only(&self) -> bool {
        self.positive_only
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> Option<&[usize]> {
        if index < self.count {
            Some(&self.values[index * self.length..(index + 1) * self.length])
        } else {
            None
        }
    }

    pub fn iter(&self) -> IterPermutations<'_> {
        IterPermutations {
            inner: self,
            pos: 0,
        }
    }
}

pub struct IterPermutations<'a> {
    inner: &'a Permutations,
    pos: usize,
}

impl<'a> Iterator for IterPermutations<'a> {
    type Item = &'a [usize];

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        let permutation = self.inner.get(self.pos)?;
        self.pos += 1;
        Some(permutation)
    }
}

impl<'a> std::iter::FusedIterator for IterPermutations<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_enumerate_lexicographically() {
        let all: Vec<Vec<usize>> = Combinations::new(2, 3).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 0], vec![0, 1], vec![0, 2],
                vec![1, 0], vec![1, 1], vec![1, 2],
                vec![2, 0], vec![2, 1], vec![2, 2],
            ]
        );
        assert_eq!(Combinations::new(3, 4).total(), Some(64));
        assert_eq!(Combinations::new(3, 4).collect::<Vec<_>>().len(), 64);
        assert_eq!(Combinations::new(2, 0).next(), None);
    }

    #[test]
    fn combinations_do_not_wrap() {
        let mut combinations = Combinations::new(1, 2);
        assert_eq!(combinations.next(), Some(vec![0]));
        assert_eq!(combinations.next(), Some(vec![1]));
        assert_eq!(combinations.next(), None);
        assert_eq!(combinations.next(), None);
    }

    #[test]
    fn full_permutation_counts() {
        for length in 1..=6 {
            let permutations = Permutations::new(length, false).unwrap();
            assert_eq!(permutations.len(), factorial(length).unwrap());
        }
    }

    #[test]
    fn positive_only_keeps_the_identity() {
        for length in 1..=6 {
            let permutations = Permutations::new(length, true).unwrap();
            assert_eq!(permutations.len(), 1);
            let identity: Vec<usize> = (0..length).collect();
            assert_eq!(permutations.get(0).unwrap(), identity.as_slice());
        }
    }

    #[test]
    fn permutations_are_distinct() {
        for length in 1..=5 {
            let permutations = Permutations::new(length, false).unwrap();
            let all: Vec<&[usize]> = permutations.iter().collect();
            for (i, a) in all.iter().enumerate() {
                assert!(is_permutation(a));
                for b in all.iter().skip(i + 1) {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn iteration_starts_at_zero_and_does_not_wrap() {
        let permutations = Permutations::new(3, false).unwrap();
        let mut iter = permutations.iter();
        assert_eq!(iter.next(), Some(&[0, 1, 2][..]));
        assert_eq!(iter.by_ref().count(), 5);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
        assert_eq!(permutations.get(6), None);
    }

    #[test]
    fn permutation_predicates() {
        assert!(is_permutation(&[2, 0, 1]));
        assert!(!is_permutation(&[2, 0, 2]));
        assert!(is_positive_permutation(&[0, 1, 2]));
        assert!(!is_positive_permutation(&[0, 2, 1]));
        assert!(!is_positive_permutation(&[1, 1]));
        assert!(is_permutation(&[]));
    }

    #[test]
    fn factorial_overflow_is_a_configuration_error() {
        assert_eq!(factorial(0).unwrap(), 1);
        assert_eq!(factorial(5).unwrap(), 120);
        assert!(matches!(factorial(40), Err(Error::InvalidConfiguration(_))));
    }
}
