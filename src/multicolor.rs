//! Multicolors: multisets of genomes labelling breakpoint graph edges.
//!
//! A multiplicity above one means the adjacency occurs several times in the
//! same genome (e.g. after a duplication). Multiplicities are always positive;
//! subtraction drops genomes that reach zero.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::genome::Genome;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Multicolor {
    multicolors: BTreeMap<Genome, usize>,
}

impl Multicolor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Genome -> multiplicity view.
    pub fn multicolors(&self) -> &BTreeMap<Genome, usize> {
        &self.multicolors
    }

    /// Distinct genomes, in sorted order.
    pub fn colors(&self) -> impl Iterator<Item = &Genome> {
        self.multicolors.keys()
    }

    pub fn multiplicity(&self, genome: &Genome) -> usize {
        self.multicolors.get(genome).copied().unwrap_or(0)
    }

    pub fn contains(&self, genome: &Genome) -> bool {
        self.multicolors.contains_key(genome)
    }

    /// Number of distinct genomes.
    pub fn distinct_len(&self) -> usize {
        self.multicolors.len()
    }

    /// Sum of all multiplicities.
    pub fn total_len(&self) -> usize {
        self.multicolors.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.multicolors.is_empty()
    }

    /// Every genome repeated by its multiplicity.
    pub fn elements(&self) -> impl Iterator<Item = &Genome> {
        self.multicolors
            .iter()
            .flat_map(|(genome, &count)| std::iter::repeat(genome).take(count))
    }

    /// Sorted element list, usable as a plain comparable key.
    pub fn hashable_representation(&self) -> Vec<Genome> {
        self.elements().cloned().collect()
    }

    pub fn update<I: IntoIterator<Item = Genome>>(&mut self, genomes: I) {
        for genome in genomes {
            *self.multicolors.entry(genome).or_insert(0) += 1;
        }
    }

    /// Same distinct genomes, every multiplicity reset to one.
    pub fn without_multiplicity(&self) -> Multicolor {
        self.colors().cloned().collect()
    }

    /// `true` when every multiplicity here is at most the one in `other`.
    pub fn is_subset_of(&self, other: &Multicolor) -> bool {
        self.multicolors
            .iter()
            .all(|(genome, &count)| count <= other.multiplicity(genome))
    }

    /// Add `other` into `target` in place and hand `target` back.
    pub fn left_merge<'a>(target: &'a mut Multicolor, other: &Multicolor) -> &'a mut Multicolor {
        *target += other;
        target
    }

    pub fn merge<'a, I: IntoIterator<Item = &'a Multicolor>>(multicolors: I) -> Multicolor {
        let mut result = Multicolor::new();
        for multicolor in multicolors {
            result += multicolor;
        }
        result
    }

    /// Per-genome minimum of the two multiplicities.
    pub fn intersect(first: &Multicolor, second: &Multicolor) -> Multicolor {
        let multicolors = first
            .multicolors
            .iter()
            .filter_map(|(genome, &count)| {
                let shared = count.min(second.multiplicity(genome));
                (shared > 0).then(|| (genome.clone(), shared))
            })
            .collect();
        Multicolor { multicolors }
    }

    pub fn similarity_score(first: &Multicolor, second: &Multicolor) -> usize {
        Multicolor::intersect(first, second).total_len()
    }

    /// Cut `multicolor` into parts following `guidance`.
    ///
    /// Larger guidance entries are tried first and each is taken out as long as
    /// it still fits; what is left becomes one part per distinct genome.
    pub fn split_colors(
        multicolor: &Multicolor,
        guidance: Option<&[Multicolor]>,
        account_for_multiplicity: bool,
    ) -> Vec<Multicolor> {
        let mut guidance: Vec<Multicolor> = guidance
            .unwrap_or(&[])
            .iter()
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                if account_for_multiplicity {
                    entry.clone()
                } else {
                    entry.without_multiplicity()
                }
            })
            .collect();
        guidance.sort_by(|a, b| {
            b.distinct_len()
                .cmp(&a.distinct_len())
                .then_with(|| b.total_len().cmp(&a.total_len()))
                .then_with(|| a.cmp(b))
        });

        let mut remaining = multicolor.clone();
        let mut result = Vec::new();
        for entry in &guidance {
            while !remaining.is_empty() && entry.is_subset_of(&remaining) {
                remaining -= entry;
                result.push(entry.clone());
            }
        }
        for (genome, &count) in &remaining.multicolors {
            result.push(Multicolor {
                multicolors: BTreeMap::from([(genome.clone(), count)]),
            });
        }
        result
    }
}

impl FromIterator<Genome> for Multicolor {
    fn from_iter<I: IntoIterator<Item = Genome>>(iter: I) -> Self {
        let mut multicolor = Multicolor::new();
        multicolor.update(iter);
        multicolor
    }
}

impl<'a> FromIterator<&'a Genome> for Multicolor {
    fn from_iter<I: IntoIterator<Item = &'a Genome>>(iter: I) -> Self {
        iter.into_iter().cloned().collect()
    }
}

impl From<Genome> for Multicolor {
    fn from(genome: Genome) -> Self {
        std::iter::once(genome).collect()
    }
}

impl AddAssign<&Multicolor> for Multicolor {
    fn add_assign(&mut self, other: &Multicolor) {
        for (genome, &count) in &other.multicolors {
            *self.multicolors.entry(genome.clone()).or_insert(0) += count;
        }
    }
}

impl SubAssign<&Multicolor> for Multicolor {
    fn sub_assign(&mut self, other: &Multicolor) {
        for (genome, &count) in &other.multicolors {
            if let Some(current) = self.multicolors.get_mut(genome) {
                if *current > count {
                    *current -= count;
                } else {
                    self.multicolors.remove(genome);
                }
            }
        }
    }
}

impl Add<&Multicolor> for &Multicolor {
    type Output = Multicolor;

    fn add(self, other: &Multicolor) -> Multicolor {
        let mut result = self.clone();
        result += other;
        result
    }
}

impl Sub<&Multicolor> for &Multicolor {
    type Output = Multicolor;

    fn sub(self, other: &Multicolor) -> Multicolor {
        let mut result = self.clone();
        result -= other;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mc(names: &[&str]) -> Multicolor {
        names.iter().map(|name| Genome::new(*name)).collect()
    }

    #[test]
    fn empty_multicolor_has_no_colors() {
        let multicolor = Multicolor::new();
        assert!(multicolor.is_empty());
        assert_eq!(multicolor.colors().count(), 0);
    }

    #[test]
    fn repeated_genomes_accumulate_multiplicity() {
        let multicolor = mc(&["red", "red", "blue"]);
        assert_eq!(multicolor.distinct_len(), 2);
        assert_eq!(multicolor.multiplicity(&Genome::new("red")), 2);
        assert_eq!(multicolor.total_len(), 3);
        assert_eq!(
            multicolor.hashable_representation(),
            vec![Genome::new("blue"), Genome::new("red"), Genome::new("red")]
        );
    }

    #[test]
    fn addition_sums_and_subtraction_floors_at_zero() {
        let first = mc(&["red", "blue"]);
        let second = mc(&["red", "green"]);
        assert_eq!(&first + &second, mc(&["red", "red", "blue", "green"]));
        assert_eq!(&first - &second, mc(&["blue"]));
        assert_eq!(&second - &mc(&["green", "green", "green"]), mc(&["red"]));
    }

    #[test]
    fn subset_respects_multiplicity() {
        assert!(mc(&["red"]).is_subset_of(&mc(&["red", "blue"])));
        assert!(!mc(&["red", "red"]).is_subset_of(&mc(&["red", "blue"])));
        assert!(Multicolor::new().is_subset_of(&mc(&["red"])));
    }

    #[test]
    fn left_merge_updates_in_place() {
        let mut target = mc(&["red"]);
        Multicolor::left_merge(&mut target, &mc(&["blue"]));
        assert_eq!(target, mc(&["red", "blue"]));
        let merged = Multicolor::merge([&mc(&["a"]), &mc(&["b"]), &mc(&["a"])]);
        assert_eq!(merged, mc(&["a", "a", "b"]));
    }

    #[test]
    fn similarity_counts_shared_elements() {
        let first = mc(&["red", "red", "blue"]);
        let second = mc(&["red", "blue", "blue", "green"]);
        assert_eq!(Multicolor::intersect(&first, &second), mc(&["red", "blue"]));
        assert_eq!(Multicolor::similarity_score(&first, &second), 2);
    }

    #[test]
    fn split_without_guidance_yields_single_colors() {
        let parts = Multicolor::split_colors(&mc(&["red", "red", "blue"]), None, true);
        assert_eq!(parts.len(), 2);
        assert!(parts.contains(&mc(&["red", "red"])));
        assert!(parts.contains(&mc(&["blue"])));
    }

    #[test]
    fn split_follows_larger_guidance_first() {
        let guidance = vec![mc(&["a"]), mc(&["a", "b"]), mc(&["c", "d"])];
        let parts = Multicolor::split_colors(&mc(&["a", "b", "c", "e"]), Some(&guidance), true);
        assert_eq!(parts.len(), 3);
        assert!(parts.contains(&mc(&["a", "b"])));
        assert!(parts.contains(&mc(&["c"])));
        assert!(parts.contains(&mc(&["e"])));
    }

    #[test]
    fn split_can_ignore_guidance_multiplicity() {
        let guidance = vec![mc(&["a", "a"])];
        let strict = Multicolor::split_colors(&mc(&["a", "a"]), Some(&guidance), true);
        assert_eq!(strict, vec![mc(&["a", "a"])]);
        let relaxed = Multicolor::split_colors(&mc(&["a", "a"]), Some(&guidance), false);
        assert_eq!(relaxed, vec![mc(&["a"]), mc(&["a"])]);
    }
}
