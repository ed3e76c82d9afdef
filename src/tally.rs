//! Per-category line counts and the element-wise merge used for directory totals.

use std::fmt;
use std::ops::AddAssign;

/// The kind of a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Code,
    Comment,
    Documentation,
    Whitespace,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 4] = [
        Category::Code,
        Category::Comment,
        Category::Documentation,
        Category::Whitespace,
    ];

    /// Label shown next to the count in the report.
    pub fn label(self) -> &'static str {
        match self {
            Category::Code => "lines of code",
            Category::Comment => "comments",
            Category::Documentation => "documentation lines",
            Category::Whitespace => "whitespace lines",
        }
    }

    /// Position used to break ties between equal counts; lower ranks first.
    pub fn tie_rank(self) -> u8 {
        match self {
            Category::Code => 0,
            Category::Documentation => 1,
            Category::Comment => 2,
            Category::Whitespace => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Code => "CODE",
            Category::Comment => "COMMENT",
            Category::Documentation => "DOC",
            Category::Whitespace => "WHITESPACE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub code: u64,
    pub comment: u64,
    pub documentation: u64,
    pub whitespace: u64,
}

impl Tally {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Code => self.code,
            Category::Comment => self.comment,
            Category::Documentation => self.documentation,
            Category::Whitespace => self.whitespace,
        }
    }

    pub fn record(&mut self, category: Category) {
        match category {
            Category::Code => self.code += 1,
            Category::Comment => self.comment += 1,
            Category::Documentation => self.documentation += 1,
            Category::Whitespace => self.whitespace += 1,
        }
    }

    /// Sum of the four counts.
    pub fn total(&self) -> u64 {
        self.code + self.comment + self.documentation + self.whitespace
    }

    pub fn merge(&mut self, other: &Tally) {
        self.code += other.code;
        self.comment += other.comment;
        self.documentation += other.documentation;
        self.whitespace += other.whitespace;
    }

    /// `(category, count)` pairs in declaration order.
    pub fn entries(&self) -> [(Category, u64); 4] {
        Category::ALL.map(|category| (category, self.get(category)))
    }
}

impl AddAssign<&Tally> for Tally {
    fn add_assign(&mut self, rhs: &Tally) {
        self.merge(rhs);
    }
}

/// Folds any number of tallies into one. Order does not affect the result.
pub fn merge_all<'a, I>(tallies: I) -> Tally
where
    I: IntoIterator<Item = &'a Tally>,
{
    tallies.into_iter().fold(Tally::default(), |mut acc, tally| {
        acc += tally;
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(code: u64, comment: u64, documentation: u64, whitespace: u64) -> Tally {
        Tally {
            code,
            comment,
            documentation,
            whitespace,
        }
    }

    #[test]
    fn test_record_and_get_track_each_category() {
        let mut t = Tally::default();
        t.record(Category::Code);
        t.record(Category::Code);
        t.record(Category::Documentation);
        t.record(Category::Whitespace);
        assert_eq!(t.get(Category::Code), 2);
        assert_eq!(t.get(Category::Comment), 0);
        assert_eq!(t.get(Category::Documentation), 1);
        assert_eq!(t.get(Category::Whitespace), 1);
        assert_eq!(t.total(), 4);
    }

    #[test]
    fn test_merge_all_of_nothing_is_zero() {
        let none: [Tally; 0] = [];
        assert_eq!(merge_all(&none), Tally::default());
    }

    #[test]
    fn test_merge_is_associative() {
        let a = tally(3, 1, 4, 1);
        let b = tally(5, 9, 2, 6);
        let c = tally(5, 3, 5, 8);
        let left = merge_all(&[merge_all(&[a, b]), c]);
        let right = merge_all(&[a, merge_all(&[b, c])]);
        assert_eq!(left, right);
        assert_eq!(left, tally(13, 13, 11, 15));
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = tally(10, 0, 2, 7);
        let b = tally(1, 4, 0, 0);
        assert_eq!(merge_all(&[a, b]), merge_all(&[b, a]));
    }

    #[test]
    fn test_entries_follow_declaration_order() {
        let t = tally(1, 2, 3, 4);
        assert_eq!(
            t.entries(),
            [
                (Category::Code, 1),
                (Category::Comment, 2),
                (Category::Documentation, 3),
                (Category::Whitespace, 4),
            ]
        );
    }

    #[test]
    fn test_tie_rank_prefers_code_then_documentation() {
        let mut categories = Category::ALL;
        categories.sort_by_key(|c| c.tie_rank());
        assert_eq!(
            categories,
            [
                Category::Code,
                Category::Documentation,
                Category::Comment,
                Category::Whitespace,
            ]
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn any_tally() -> impl Strategy<Value = Tally> {
        (
            0u64..1_000_000,
            0u64..1_000_000,
            0u64..1_000_000,
            0u64..1_000_000,
        )
            .prop_map(|(code, comment, documentation, whitespace)| Tally {
                code,
                comment,
                documentation,
                whitespace,
            })
    }

    fn merged(a: Tally, b: Tally) -> Tally {
        let mut out = a;
        out.merge(&b);
        out
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in any_tally(), b in any_tally()) {
            prop_assert_eq!(merged(a, b), merged(b, a));
        }

        #[test]
        fn merge_is_associative(a in any_tally(), b in any_tally(), c in any_tally()) {
            prop_assert_eq!(merged(merged(a, b), c), merged(a, merged(b, c)));
        }

        #[test]
        fn merge_all_sums_totals(tallies in prop::collection::vec(any_tally(), 0..16)) {
            let combined = merge_all(&tallies);
            let expected: u64 = tallies.iter().map(Tally::total).sum();
            prop_assert_eq!(combined.total(), expected);
        }
    }
}
