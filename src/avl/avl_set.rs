use super::AvlMap;
use crate::bst::{IntoIter, Iter};
use crate::TreeError;
use std::borrow::Borrow;
use std::cmp::Ordering::*;
use std::fmt::{Debug, Formatter};
use std::iter::{FusedIterator, Peekable};

/// A sorted set of values.
///
/// The implementation is mostly a thin wrapper around [`AvlMap`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AvlSet<V> {
    map: AvlMap<V, ()>,
}

impl<V> AvlSet<V> {
    /// Returns a new, empty set.
    pub fn new() -> Self {
        Self { map: AvlMap::new() }
    }

    /// Removes all the entries from self.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Returns true if self is the empty set, false otherwise.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of elements in self.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns the least value in the set.
    pub fn first(&self) -> Option<&V> {
        self.map.first_key_value().map(|(k, _)| k)
    }

    /// Returns the greatest value in self.
    pub fn last(&self) -> Option<&V> {
        self.map.last_key_value().map(|e| e.0)
    }

    /// Returns an iterator over self's values in sorted order.
    pub fn iter(&self) -> SetIter<'_, V> {
        SetIter {
            iter: self.map.iter(),
        }
    }

    /// Returns an iterator over elements in self and not in other
    pub fn difference<'a>(&'a self, other: &'a Self) -> Difference<'a, V>
    where
        V: Ord,
    {
        Difference::new(self.iter(), other.iter())
    }

    /// Returns an iterator of the values that are in both self and other.
    pub fn intersection<'a>(&'a self, other: &'a Self) -> Intersection<'a, V>
    where
        V: Ord,
    {
        Intersection::new(self.iter(), other.iter())
    }

    /// Returns an iterator over elements in self or other but not both.
    pub fn symmetric_difference<'a>(&'a self, other: &'a Self) -> SymmetricDifference<'a, V>
    where
        V: Ord,
    {
        SymmetricDifference::new(self.iter(), other.iter())
    }

    /// Returns an iterator over the elements of self and other, ordered by key.
    ///
    /// Common elements are only returned once.
    pub fn union<'a>(&'a self, other: &'a Self) -> Union<'a, V>
    where
        V: Ord,
    {
        Union::new(self.iter(), other.iter())
    }

    /// Returns true if self and other have no common values and false otherwise
    pub fn is_disjoint(&self, other: &Self) -> bool
    where
        V: Ord,
    {
        self.intersection(other).next().is_none()
    }

    /// Tests if self is a subset of other.
    pub fn is_subset(&self, other: &Self) -> bool
    where
        V: Ord,
    {
        self.len() <= other.len() && self.difference(other).next().is_none()
    }

    /// tests if self is a superset of other.
    pub fn is_superset(&self, other: &Self) -> bool
    where
        V: Ord,
    {
        other.is_subset(self)
    }
}

impl<V: Ord> AvlSet<V> {
    /// Inserts the given value and returns true if self did not already have
    /// the value and returns false otherwise.
    ///
    /// # Examples
    /// ```
    /// use avl_bst::AvlSet;
    ///
    /// let mut s = AvlSet::new();
    /// assert!(s.insert(1));
    /// assert!(!s.insert(1));
    /// assert_eq!(s.len(), 1);
    /// ```
    pub fn insert(&mut self, value: V) -> bool {
        self.map.insert(value, ()).is_none()
    }

    /// Tests if self contains the given value.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.contains_key(value)
    }

    /// Returns a reference to the element matching value, if it exists
    pub fn get<Q>(&self, value: &Q) -> Option<&V>
    where
        V: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.get_key_value(value).map(|e| e.0)
    }

    /// Removes the given value from self returning true if the value was
    /// present and false otherwise.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.remove(value).is_some()
    }

    /// Removes and returns the set member that matches value.
    pub fn take<Q>(&mut self, value: &Q) -> Option<V>
    where
        V: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.remove_entry(value).map(|e| e.0)
    }

    /// Replace and return the matching value in the set.
    pub fn replace(&mut self, value: V) -> Option<V> {
        let ret = self.take(&value);
        self.insert(value);
        ret
    }

    /// Removes and returns the least value.
    pub fn pop_first(&mut self) -> Option<V> {
        self.map.pop_first().map(|e| e.0)
    }

    /// Removes and returns the greatest value.
    pub fn pop_last(&mut self) -> Option<V> {
        self.map.pop_last().map(|e| e.0)
    }

    /// Retain values for which f returns true and discard others
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&V) -> bool,
    {
        let map = std::mem::take(&mut self.map);
        self.map = map.into_iter().filter(|(v, _)| f(v)).collect();
    }

    /// Verifies the invariants of the underlying tree.
    pub fn check(&self) -> Result<(), TreeError> {
        self.map.check()
    }
}

impl<T> Default for AvlSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for AvlSet<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> Extend<T> for AvlSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for x in iter {
            self.insert(x);
        }
    }
}

impl<T: Ord> FromIterator<T> for AvlSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut s = AvlSet::new();
        s.extend(iter);
        s
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for AvlSet<T> {
    fn from(vs: [T; N]) -> Self {
        AvlSet::from_iter(vs)
    }
}

impl<'a, T> IntoIterator for &'a AvlSet<T> {
    type Item = &'a T;
    type IntoIter = SetIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for AvlSet<T> {
    type Item = T;
    type IntoIter = std::iter::Map<IntoIter<T, ()>, fn((T, ())) -> T>;

    fn into_iter(self) -> Self::IntoIter {
        let first: fn((T, ())) -> T = |e| e.0;
        self.map.into_iter().map(first)
    }
}

/// An iterator over the values of an [`AvlSet`], in sorted order.
pub struct SetIter<'a, T> {
    iter: Iter<'a, T, ()>,
}

impl<'a, T> Clone for SetIter<'a, T> {
    fn clone(&self) -> Self {
        SetIter {
            iter: self.iter.clone(),
        }
    }
}

impl<'a, T> Iterator for SetIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|e| e.0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for SetIter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|e| e.0)
    }
}

impl<'a, T> ExactSizeIterator for SetIter<'a, T> {}

impl<'a, T> FusedIterator for SetIter<'a, T> {}

// Declares a lazy merge of two sorted iterators.  The mask picks what is
// yielded: 0b100 for values only on the left, 0b010 for values on both sides
// and 0b001 for values only on the right.
macro_rules! make_set_op_iter {
    ( $name:ident, $mask:literal ) => {
        /// A lazy set operation over two sorted sets.
        pub struct $name<'a, T> {
            lhs: Peekable<SetIter<'a, T>>,
            rhs: Peekable<SetIter<'a, T>>,
        }

        impl<'a, T> $name<'a, T> {
            fn new(lhs: SetIter<'a, T>, rhs: SetIter<'a, T>) -> Self {
                Self {
                    lhs: lhs.peekable(),
                    rhs: rhs.peekable(),
                }
            }
        }

        impl<'a, T: Ord> Iterator for $name<'a, T> {
            type Item = &'a T;

            fn next(&mut self) -> Option<Self::Item> {
                loop {
                    let (x, bit) = match (self.lhs.peek().copied(), self.rhs.peek().copied()) {
                        (None, None) => return None,
                        (Some(_), None) => (self.lhs.next(), 0b100),
                        (None, Some(_)) => (self.rhs.next(), 0b001),
                        (Some(l), Some(r)) => match l.cmp(r) {
                            Less => (self.lhs.next(), 0b100),
                            Greater => (self.rhs.next(), 0b001),
                            Equal => {
                                self.rhs.next();
                                (self.lhs.next(), 0b010)
                            }
                        },
                    };

                    if $mask & bit != 0 {
                        return x;
                    }
                    if $mask & 0b001 == 0 && self.lhs.peek().is_none() {
                        // nothing more can come from the left
                        return None;
                    }
                }
            }
        }

        impl<'a, T: Ord> FusedIterator for $name<'a, T> {}
    };
}

make_set_op_iter!(Difference, 0b100);
make_set_op_iter!(Intersection, 0b010);
make_set_op_iter!(Union, 0b111);
make_set_op_iter!(SymmetricDifference, 0b101);

impl<K: Clone + Ord> std::ops::BitAnd for &AvlSet<K> {
    type Output = AvlSet<K>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs).cloned().collect()
    }
}

impl<K: Clone + Ord> std::ops::BitOr for &AvlSet<K> {
    type Output = AvlSet<K>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs).cloned().collect()
    }
}

impl<K: Clone + Ord> std::ops::Sub for &AvlSet<K> {
    type Output = AvlSet<K>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.difference(rhs).cloned().collect()
    }
}

impl<K: Clone + Ord> std::ops::BitXor for &AvlSet<K> {
    type Output = AvlSet<K>;

    fn bitxor(self, rhs: Self) -> Self::Output {
        self.symmetric_difference(rhs).cloned().collect()
    }
}

#[cfg(test)]
mod test {
    extern crate quickcheck;
    use super::*;
    use quickcheck::quickcheck;
    use std::collections::BTreeSet;

    fn set_checks(s1: &AvlSet<u8>, s2: &AvlSet<u8>, t1: &BTreeSet<u8>, t2: &BTreeSet<u8>) {
        assert!(s1.intersection(s2).cmp(t1.intersection(t2)).is_eq());
        assert!(s1.difference(s2).cmp(t1.difference(t2)).is_eq());
        assert_eq!(s1.is_disjoint(s2), t1.is_disjoint(t2));
        assert_eq!(s1.is_subset(s2), t1.is_subset(t2));
        assert_eq!(s1.is_superset(s2), t1.is_superset(t2));
        assert!(s1.union(s2).cmp(t1.union(t2)).is_eq());
        assert!(s1
            .symmetric_difference(s2)
            .cmp(t1.symmetric_difference(t2))
            .is_eq());

        let both = s1 & s2;
        both.check().unwrap();
        assert!(both.iter().eq((t1 & t2).iter()));
        assert!((s1 | s2).iter().eq((t1 | t2).iter()));
        assert!((s1 - s2).iter().eq((t1 - t2).iter()));
        assert!((s1 ^ s2).iter().eq((t1 ^ t2).iter()));
    }

    fn set_test(v1: Vec<u8>, v2: Vec<u8>) {
        let s1: AvlSet<_> = v1.clone().into_iter().collect();
        let s2: AvlSet<_> = v2.clone().into_iter().collect();

        let t1: BTreeSet<u8> = v1.into_iter().collect();
        let t2: BTreeSet<u8> = v2.into_iter().collect();

        set_checks(&s1, &s2, &t1, &t2);
        set_checks(&s2, &s1, &t2, &t1);
    }

    fn rm_test(vs: Vec<i8>) {
        let mut s = AvlSet::new();
        let mut t = BTreeSet::new();

        for k in vs {
            if k > 0 {
                assert_eq!(s.insert(k % 32), t.insert(k % 32));
            } else if k > i8::MIN {
                assert_eq!(s.remove(&(-k % 32)), t.remove(&(-k % 32)));
            }
            s.check().unwrap();
            assert!(s.iter().eq(t.iter()));
        }
    }

    #[test]
    fn set_test_regr1() {
        set_test(vec![], vec![0]);
    }

    #[test]
    fn take_and_replace_test() {
        let mut s = AvlSet::from([3, 1, 2]);
        assert_eq!(s.take(&2), Some(2));
        assert_eq!(s.take(&2), None);
        assert_eq!(s.replace(3), Some(3));
        assert_eq!(s.replace(4), None);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(s.get(&4), Some(&4));
        s.check().unwrap();
    }

    #[test]
    fn pop_and_retain_test() {
        let mut s: AvlSet<u32> = (0..20).collect();
        assert_eq!(s.pop_first(), Some(0));
        assert_eq!(s.pop_last(), Some(19));
        s.retain(|x| x % 3 == 0);
        assert_eq!(s.into_iter().collect::<Vec<_>>(), vec![3, 6, 9, 12, 15, 18]);
    }

    #[test]
    fn debug_test() {
        let s = AvlSet::from([2, 1]);
        assert_eq!(format!("{:?}", s), "{1, 2}");
    }

    quickcheck! {
        fn qc_set_tests(v1: Vec<u8>, v2: Vec<u8>) -> () {
            set_test(v1, v2);
        }

        fn qc_rm_test(vs: Vec<i8>) -> () {
            rm_test(vs);
        }
    }
}
