//! proptest strategies for value trees

use crate::archive::PrimitiveValue;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Leaves any format can carry losslessly
pub fn arb_leaf() -> impl Strategy<Value = PrimitiveValue> {
    prop_oneof![
        Just(PrimitiveValue::Null),
        any::<bool>().prop_map(PrimitiveValue::Bool),
        any::<i64>().prop_map(PrimitiveValue::Integer),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(PrimitiveValue::Float),
        ".{0,16}".prop_map(PrimitiveValue::Text),
        proptest::collection::vec(any::<u8>(), 0..32).prop_map(PrimitiveValue::Bytes),
    ]
}

/// Nested trees with unreserved keys
pub fn arb_primitive_value() -> impl Strategy<Value = PrimitiveValue> {
    arb_leaf().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(PrimitiveValue::Sequence),
            proptest::collection::btree_map("[a-z][a-zA-Z0-9_]{0,7}", inner, 0..6)
                .prop_map(|map: BTreeMap<String, PrimitiveValue>| PrimitiveValue::Mapping(map)),
        ]
    })
}
