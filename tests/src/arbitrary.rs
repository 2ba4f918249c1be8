use proptest::{
    collection::{btree_map, vec},
    prelude::*,
};
use prost::bytes::Bytes;
use prost_reflect_table::{Table, Value};

use crate::{point, table, test_bridge};

fn non_zero<T>(strategy: impl Strategy<Value = T>) -> impl Strategy<Value = T>
where
    T: Default + PartialEq + std::fmt::Debug,
{
    strategy.prop_filter("the default value is not set", |v| *v != T::default())
}

prop_compose! {
    fn integers()(
        int32 in non_zero(any::<i32>()),
        int64 in non_zero(any::<i64>()),
        uint32 in 1..=u32::MAX,
        uint64 in 1..=i64::MAX,
        sint32 in non_zero(any::<i32>()),
        sint64 in non_zero(any::<i64>()),
        fixed32 in 1..=u32::MAX,
        fixed64 in 1..=i64::MAX,
        sfixed32 in non_zero(any::<i32>()),
        sfixed64 in non_zero(any::<i64>()),
    ) -> Vec<(&'static str, Value)> {
        vec![
            ("int32", int32.into()),
            ("int64", int64.into()),
            ("uint32", uint32.into()),
            ("uint64", uint64.into()),
            ("sint32", sint32.into()),
            ("sint64", sint64.into()),
            ("fixed32", fixed32.into()),
            ("fixed64", fixed64.into()),
            ("sfixed32", sfixed32.into()),
            ("sfixed64", sfixed64.into()),
        ]
    }
}

prop_compose! {
    fn scalars()(
        integers in integers(),
        double in proptest::num::f64::NORMAL,
        float in proptest::num::f32::NORMAL,
        string in "[a-zA-Z0-9 ]{1,16}",
        bytes in vec(any::<u8>(), 1..16),
    ) -> Table {
        let mut table: Table = integers.into_iter().collect();
        table.insert("double", double);
        table.insert("float", float);
        table.insert("bool", true);
        table.insert("string", string);
        table.insert("bytes", Bytes::from(bytes));
        table
    }
}

prop_compose! {
    fn scalar_arrays()(
        int32 in vec(any::<i32>(), 0..8),
        int64 in vec(any::<i64>(), 0..8),
        double in vec(proptest::num::f64::NORMAL, 0..8),
        bools in vec(any::<bool>(), 0..8),
        string in vec(".{0,8}", 0..8),
    ) -> Table {
        let mut table: Table = [
            "float", "uint32", "uint64", "sint32", "sint64", "fixed32", "fixed64", "sfixed32",
            "sfixed64", "bytes",
        ]
        .into_iter()
        .map(|name| (name, Table::new()))
        .collect();
        table.insert("int32", Table::from_sequence(int32));
        table.insert("int64", Table::from_sequence(int64));
        table.insert("double", Table::from_sequence(double));
        table.insert("bool", Table::from_sequence(bools));
        table.insert("string", Table::from_sequence(string));
        table
    }
}

proptest! {
    #[test]
    fn roundtrip_scalars(input in scalars()) {
        let bridge = test_bridge();
        let message = bridge.encode("test.Scalars", &Value::Table(input.clone())).unwrap();
        prop_assert_eq!(bridge.decode(&message), input);
    }

    #[test]
    fn roundtrip_scalars_through_bytes(input in scalars()) {
        let bridge = test_bridge();
        let bytes = bridge.encode_to_vec("test.Scalars", &Value::Table(input.clone())).unwrap();
        prop_assert_eq!(bridge.decode_from_slice("test.Scalars", &bytes).unwrap(), input);
    }

    #[test]
    fn roundtrip_scalar_arrays(input in scalar_arrays()) {
        let bridge = test_bridge();
        let message = bridge.encode("test.ScalarArrays", &Value::Table(input.clone())).unwrap();
        prop_assert_eq!(bridge.decode(&message), input);
    }

    #[test]
    fn roundtrip_path(
        coordinates in vec((non_zero(any::<i32>()), non_zero(any::<i32>())), 0..8),
        name in "[a-z]{1,8}",
    ) {
        let points = Table::from_sequence(
            coordinates.into_iter().map(|(x, y)| point(x.into(), y.into())),
        );
        let input = table([("points", points.into()), ("name", name.into())]);

        let bridge = test_bridge();
        let message = bridge.encode("test.Path", &Value::Table(input.clone())).unwrap();
        prop_assert_eq!(bridge.decode(&message), input);
    }

    #[test]
    fn roundtrip_maps(
        counts in btree_map("[a-z]{1,5}", any::<i32>(), 0..5),
        names in btree_map(any::<i64>(), ".{0,5}", 0..5),
        weights in btree_map(any::<u32>(), proptest::num::f64::NORMAL, 0..5),
    ) {
        let input = table([
            ("counts", counts.into_iter().collect::<Table>().into()),
            ("names", names.into_iter().collect::<Table>().into()),
            ("flags", Table::new().into()),
            ("colors", Table::new().into()),
            (
                "weights",
                weights
                    .into_iter()
                    .map(|(key, value)| (i64::from(key), value))
                    .collect::<Table>()
                    .into(),
            ),
        ]);

        let bridge = test_bridge();
        let message = bridge.encode("test.Maps", &Value::Table(input.clone())).unwrap();
        prop_assert_eq!(bridge.decode(&message), input);
    }

    #[test]
    fn int32_range_is_checked(value in any::<i64>()) {
        let input = table([("int32", Value::Integer(value))]);
        let result = test_bridge().encode("test.Scalars", &Value::Table(input));
        prop_assert_eq!(result.is_ok(), i32::try_from(value).is_ok());
    }

    #[test]
    fn oneof_keeps_one_member(radius in proptest::num::f64::NORMAL, label in "[a-z]{1,8}") {
        let input = table([("radius", radius.into()), ("label", label.clone().into())]);
        let message = test_bridge().encode("test.Shape", &Value::Table(input)).unwrap();
        prop_assert_eq!(
            test_bridge().decode(&message),
            table([("label", label.into())])
        );
    }
}
