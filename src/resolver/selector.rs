//! Selector grammar: the body of `{Name[...]}`.
//!
//! Clauses are separated by `;` and may appear in any order:
//!
//! - `3` picks a random subset of three values
//! - `#0,2,4` picks values by zero-based index
//! - `BobCut,Braids` picks values by key
//! - `$5` sets the combinatorial weight (default 1); `$0` makes the
//!   placeholder non-combinatorial
//!
//! At most one of limit, index list and key list may be given.

use crate::error::{PromptError, Result};
use crate::variations::VariationDictionary;
use rand::Rng;
use tracing::warn;

/// Weight used when a selector has no `$w` clause.
pub const DEFAULT_WEIGHT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub limit: Option<usize>,
    pub indexes: Option<Vec<usize>>,
    pub keys: Option<Vec<String>>,
    pub weight: Option<u32>,
}

impl Selector {
    /// Parse a selector body. `token` is the full token, for error messages.
    pub fn parse(body: &str, token: &str) -> Result<Self> {
        let mut selector = Selector::default();

        for clause in body.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            if let Some(weight) = clause.strip_prefix('$') {
                if selector.weight.is_some() {
                    return Err(PromptError::selector(token, "weight given more than once"));
                }
                let weight = weight.trim().parse::<u32>().map_err(|_| {
                    PromptError::selector(token, format!("invalid weight '{}'", clause))
                })?;
                selector.weight = Some(weight);
            } else if let Some(list) = clause.strip_prefix('#') {
                let indexes = list
                    .split(',')
                    .map(|i| {
                        i.trim().parse::<usize>().map_err(|_| {
                            PromptError::selector(token, format!("invalid index '{}'", i.trim()))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                selector.set_selection(token, |s| s.indexes = Some(indexes))?;
            } else if clause.chars().all(|c| c.is_ascii_digit()) {
                let limit = clause.parse::<usize>().map_err(|_| {
                    PromptError::selector(token, format!("invalid limit '{}'", clause))
                })?;
                selector.set_selection(token, |s| s.limit = Some(limit))?;
            } else {
                let keys: Vec<String> = clause
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect();
                if keys.iter().any(|k| k.starts_with('#') || k.starts_with('$')) {
                    return Err(PromptError::selector(
                        token,
                        format!("'{}' mixes keys with '#' or '$' clauses; separate clauses with ';'", clause),
                    ));
                }
                selector.set_selection(token, |s| s.keys = Some(keys))?;
            }
        }

        Ok(selector)
    }

    fn set_selection(&mut self, token: &str, apply: impl FnOnce(&mut Self)) -> Result<()> {
        if self.limit.is_some() || self.indexes.is_some() || self.keys.is_some() {
            return Err(PromptError::selector(
                token,
                "use at most one of a limit, an index list (#i,j) or a key list",
            ));
        }
        apply(self);
        Ok(())
    }

    pub fn weight(&self) -> u32 {
        self.weight.unwrap_or(DEFAULT_WEIGHT)
    }

    /// `$0`: excluded from the combinatorial product.
    pub fn is_free(&self) -> bool {
        self.weight() == 0
    }

    /// Positions of the selected entries of `dict`.
    ///
    /// Precedence: index list, key list, limit, whole dictionary. Unknown
    /// keys and out-of-range indexes are skipped. A limit draws a random
    /// subset and keeps dictionary order.
    pub fn select<R: Rng + ?Sized>(&self, dict: &VariationDictionary, rng: &mut R) -> Vec<usize> {
        if let Some(indexes) = &self.indexes {
            return indexes
                .iter()
                .copied()
                .filter(|&i| {
                    let in_range = i < dict.len();
                    if !in_range {
                        warn!(index = i, len = dict.len(), "selector index out of range, skipped");
                    }
                    in_range
                })
                .collect();
        }

        if let Some(keys) = &self.keys {
            return keys
                .iter()
                .filter_map(|key| {
                    let found = dict.index_of(key);
                    if found.is_none() {
                        warn!(key = %key, "selector key not found, skipped");
                    }
                    found
                })
                .collect();
        }

        if let Some(limit) = self.limit {
            if limit < dict.len() {
                let mut picked = rand::seq::index::sample(rng, dict.len(), limit).into_vec();
                picked.sort_unstable();
                return picked;
            }
        }

        (0..dict.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn parse(body: &str) -> Result<Selector> {
        Selector::parse(body, &format!("{{X[{}]}}", body))
    }

    fn ten() -> VariationDictionary {
        (0..10).map(|i| (format!("k{}", i), format!("v{}", i))).collect()
    }

    #[test]
    fn test_parse_each_clause() {
        assert_eq!(parse("3").unwrap().limit, Some(3));
        assert_eq!(parse("#0,2,4").unwrap().indexes, Some(vec![0, 2, 4]));
        assert_eq!(
            parse("BobCut, Braids").unwrap().keys,
            Some(vec!["BobCut".to_string(), "Braids".to_string()])
        );
        assert_eq!(parse("$5").unwrap().weight, Some(5));
    }

    #[test]
    fn test_clause_order_is_free() {
        let a = parse("$2;#1,3").unwrap();
        let b = parse("#1,3;$2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.weight(), 2);
    }

    #[test]
    fn test_default_weight_and_free_marker() {
        assert_eq!(parse("").unwrap().weight(), DEFAULT_WEIGHT);
        assert!(parse("$0").unwrap().is_free());
        assert!(!parse("2").unwrap().is_free());
    }

    #[test]
    fn test_two_selection_kinds_rejected() {
        let err = parse("3;#1,2").unwrap_err();
        assert!(matches!(err, PromptError::SelectorSyntax { .. }));
        let err = parse("A,B;2").unwrap_err();
        assert!(matches!(err, PromptError::SelectorSyntax { .. }));
    }

    #[test]
    fn test_invalid_clauses_rejected() {
        assert!(parse("$x").is_err());
        assert!(parse("#1,two").is_err());
        assert!(parse("$1;$2").is_err());
        assert!(parse("A,$2").is_err());
    }

    #[test]
    fn test_index_selection_keeps_given_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let sel = parse("#4,0,2;$9").unwrap();
        assert_eq!(sel.select(&ten(), &mut rng), vec![4, 0, 2]);
    }

    #[test]
    fn test_out_of_range_index_skipped() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(parse("#1,42").unwrap().select(&ten(), &mut rng), vec![1]);
    }

    #[test]
    fn test_key_selection() {
        let mut rng = StdRng::seed_from_u64(1);
        let sel = parse("k7,missing,k1").unwrap();
        assert_eq!(sel.select(&ten(), &mut rng), vec![7, 1]);
    }

    #[test]
    fn test_limit_picks_distinct_subset_in_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = parse("3").unwrap().select(&ten(), &mut rng);
        assert_eq!(picked.len(), 3);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert!(picked.iter().all(|&i| i < 10));
    }

    #[test]
    fn test_limit_larger_than_dictionary_selects_all() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(parse("50").unwrap().select(&ten(), &mut rng).len(), 10);
    }

    #[test]
    fn test_precedence_when_several_kinds_are_set() {
        let mut rng = StdRng::seed_from_u64(7);
        let sel = Selector {
            limit: Some(1),
            indexes: Some(vec![3]),
            keys: Some(vec!["k5".to_string()]),
            weight: None,
        };
        assert_eq!(sel.select(&ten(), &mut rng), vec![3]);

        let sel = Selector {
            indexes: None,
            ..sel
        };
        assert_eq!(sel.select(&ten(), &mut rng), vec![5]);
    }
}
