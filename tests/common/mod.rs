use proptest::prelude::*;

#[macro_export]
macro_rules! assert_eq_all {
    ( $x:expr, $( $y:expr ),+ $(,)? ) => {{
        let x = $x;
        $( assert_eq!(x, $y); )+
    }};
}

#[allow(dead_code)]
pub(super) fn assert_eq_iters<I: Iterator, J: Iterator<Item = I::Item>>(
    mut i: I,
    mut j: J,
) where
    I::Item: std::fmt::Debug + Eq, // same inferred for J::Item
{
    loop {
        match (i.next(), j.next()) {
            (None, None) => return,
            (a, b) => assert_eq!(a, b),
        }
    }
}

#[allow(dead_code)]
pub(super) fn assert_eq_iters_back<I, J>(i: I, j: J)
where
    I: DoubleEndedIterator,
    J: DoubleEndedIterator<Item = I::Item>,
    I::Item: std::fmt::Debug + Eq,
{
    assert_eq_iters(i.rev(), j.rev());
}

#[allow(dead_code)]
pub(super) type U16Pairs = Vec<(u16, u16)>;

#[allow(dead_code)]
pub(super) fn u16_pairs(
    keys: std::ops::Range<u16>,
    len: std::ops::Range<usize>,
) -> impl Strategy<Value = U16Pairs> {
    prop::collection::vec((keys, 0u16..1024u16), len)
}

#[allow(dead_code)]
pub(super) fn small_int_pairs() -> impl Strategy<Value = U16Pairs> {
    u16_pairs(0..1024, 0..512)
}

// few distinct keys, so inserts collide and removes hit
#[allow(dead_code)]
pub(super) fn tiny_int_pairs() -> impl Strategy<Value = U16Pairs> {
    u16_pairs(0..64, 0..128)
}

#[allow(dead_code)]
pub(super) fn string_u16_pairs() -> impl Strategy<Value = Vec<(String, u16)>> {
    prop::collection::vec(("[a-z]{0,2}", 0u16..1024u16), 0..512)
}

/// A step in a scripted workload.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub(super) enum Op {
    Insert(u16, u16),
    Remove(u16),
    PopFirst,
    PopLast,
}

#[allow(dead_code)]
pub(super) fn ops(keys: u16, len: usize) -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        4 => (0..keys, any::<u16>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => (0..keys).prop_map(Op::Remove),
        1 => Just(Op::PopFirst),
        1 => Just(Op::PopLast),
    ];
    prop::collection::vec(op, 0..len)
}

#[allow(dead_code)]
pub(super) type U16Seq = Vec<u16>;

#[allow(dead_code)]
pub(super) fn small_int_seq() -> impl Strategy<Value = U16Seq> {
    prop::collection::vec(0u16..1024, 0..512)
}

#[allow(dead_code)]
pub(super) fn tiny_int_seq() -> impl Strategy<Value = U16Seq> {
    prop::collection::vec(0u16..64, 0..128)
}
