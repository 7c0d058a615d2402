//! OR chains of equality tests on one column become a single IN list.
//!
//! ```text
//! c = 1 OR c = 2          → c IN (1, 2)
//! c IN (1, 2) OR c = 3    → c IN (1, 2, 3)
//! c IN (1) OR c IN (2)    → c IN (1, 2)
//! ```

use crate::fragment::{BinaryFragment, ColumnFragment, Fragment};

/// `column = literal` in either order.
fn equality(f: &Fragment) -> Option<(&ColumnFragment, &Fragment)> {
    let Fragment::Binary(BinaryFragment {
        left,
        op: "=",
        right,
        negated: false,
        ..
    }) = f
    else {
        return None;
    };
    match (left.as_ref(), right.as_ref()) {
        (Fragment::Column(c), v @ Fragment::Literal(_))
        | (v @ Fragment::Literal(_), Fragment::Column(c)) => Some((c, v)),
        _ => None,
    }
}

/// `column IN (...)`, not negated.
fn in_list(f: &Fragment) -> Option<(&ColumnFragment, &[Fragment])> {
    match f {
        Fragment::In {
            argument,
            list,
            negated: false,
        } => match argument.as_ref() {
            Fragment::Column(c) => Some((c, list.as_slice())),
            _ => None,
        },
        _ => None,
    }
}

fn column_and_values(f: &Fragment) -> Option<(&ColumnFragment, Vec<&Fragment>)> {
    if let Some((c, v)) = equality(f) {
        return Some((c, vec![v]));
    }
    in_list(f).map(|(c, list)| (c, list.iter().collect()))
}

/// Rewrite `a OR b` into an IN list when both sides test the same column.
/// Anything else is returned unchanged.
pub fn promote_to_in(f: Fragment) -> Fragment {
    merge(&f).unwrap_or(f)
}

fn merge(f: &Fragment) -> Option<Fragment> {
    let Fragment::Binary(BinaryFragment {
        left,
        op: "OR",
        right,
        negated: false,
        ..
    }) = f
    else {
        return None;
    };
    let (lc, lv) = column_and_values(left)?;
    let (rc, rv) = column_and_values(right)?;
    if !lc.same_source(rc) {
        return None;
    }
    let mut list: Vec<Fragment> = Vec::with_capacity(lv.len() + rv.len());
    for v in lv.into_iter().chain(rv) {
        if !list.contains(v) {
            list.push(v.clone());
        }
    }
    let mut column = lc.clone();
    column.alias = None;
    Some(Fragment::In {
        argument: Box::new(Fragment::Column(column)),
        list,
        negated: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Fragment {
        Fragment::Column(ColumnFragment::new(Some("t".into()), name))
    }

    fn eq(l: Fragment, r: Fragment) -> Fragment {
        Fragment::Binary(BinaryFragment::new(l, "=", r))
    }

    fn or(l: Fragment, r: Fragment) -> Fragment {
        let mut b = BinaryFragment::new(l, "OR", r);
        b.wrap_left = true;
        b.wrap_right = true;
        Fragment::Binary(b)
    }

    fn lit(s: &str) -> Fragment {
        Fragment::literal(s)
    }

    fn in_of(c: Fragment, items: &[&str]) -> Fragment {
        Fragment::In {
            argument: Box::new(c),
            list: items.iter().map(|s| lit(s)).collect(),
            negated: false,
        }
    }

    #[test]
    fn test_two_equalities() {
        let f = promote_to_in(or(eq(col("Id"), lit("1")), eq(lit("2"), col("Id"))));
        assert_eq!(f, in_of(col("Id"), &["1", "2"]));
    }

    #[test]
    fn test_chain_accumulates_without_duplicates() {
        let inner = promote_to_in(or(eq(col("Id"), lit("1")), eq(col("Id"), lit("2"))));
        let f = promote_to_in(or(inner, eq(col("Id"), lit("2"))));
        assert_eq!(f, in_of(col("Id"), &["1", "2"]));
        let f = promote_to_in(or(in_of(col("Id"), &["1"]), in_of(col("Id"), &["3"])));
        assert_eq!(f, in_of(col("Id"), &["1", "3"]));
    }

    #[test]
    fn test_different_columns_untouched() {
        let f = or(eq(col("Id"), lit("1")), eq(col("Age"), lit("2")));
        assert_eq!(promote_to_in(f.clone()), f);
        let f = or(eq(col("Id"), lit("1")), eq(col("Id"), col("Age")));
        assert_eq!(promote_to_in(f.clone()), f);
    }

    #[test]
    fn test_negated_operands_untouched() {
        let mut negated = BinaryFragment::new(col("Id"), "=", lit("1"));
        negated.negated = true;
        let f = or(Fragment::Binary(negated), eq(col("Id"), lit("2")));
        assert_eq!(promote_to_in(f.clone()), f);
    }
}
