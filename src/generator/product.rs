//! Lazy Cartesian product over dimension sizes.

/// Odometer over `sizes`: yields index tuples with the last dimension
/// changing fastest. Nothing is materialized beyond the current tuple.
#[derive(Debug, Clone)]
pub struct CartesianProduct {
    sizes: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl CartesianProduct {
    pub fn new(sizes: Vec<usize>) -> Self {
        let next = if sizes.contains(&0) {
            None
        } else {
            Some(vec![0; sizes.len()])
        };
        Self { sizes, next }
    }

    /// Number of tuples in the full product; `None` if it overflows.
    pub fn total(&self) -> Option<u128> {
        self.sizes
            .iter()
            .try_fold(1u128, |acc, &size| acc.checked_mul(size as u128))
    }

    fn advance(&mut self) {
        let Some(current) = self.next.as_mut() else {
            return;
        };
        for position in (0..current.len()).rev() {
            current[position] += 1;
            if current[position] < self.sizes[position] {
                return;
            }
            current[position] = 0;
        }
        self.next = None;
    }
}

impl Iterator for CartesianProduct {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.clone()?;
        self.advance();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_dimension_changes_fastest() {
        let tuples: Vec<_> = CartesianProduct::new(vec![2, 3]).collect();
        assert_eq!(
            tuples,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
            ]
        );
    }

    #[test]
    fn test_no_dimensions_yields_one_empty_tuple() {
        let tuples: Vec<_> = CartesianProduct::new(vec![]).collect();
        assert_eq!(tuples, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_empty_dimension_yields_nothing() {
        assert_eq!(CartesianProduct::new(vec![3, 0]).count(), 0);
    }

    #[test]
    fn test_huge_product_is_lazy() {
        let mut product = CartesianProduct::new(vec![1_000_000; 8]);
        assert_eq!(product.total(), Some(10u128.pow(48)));
        assert_eq!(product.nth(1_000_001), Some(vec![0, 0, 0, 0, 0, 0, 1, 1]));
    }

    #[test]
    fn test_total_overflow_is_none() {
        assert_eq!(CartesianProduct::new(vec![usize::MAX; 4]).total(), None);
    }
}
