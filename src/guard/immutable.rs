//! Immutability Classifier
//!
//! Decides by exact type whether a value can be handed out without a copy.

use std::any::TypeId;
use std::cmp::Ordering;
use std::ops::{Range, RangeInclusive};
use std::sync::Arc;
use std::time::Duration;

macro_rules! immutable_types {
    ($($ty:ty),+ $(,)?) => {
        /// Names of every type classified as immutable.
        ///
        /// The list is closed. Membership is by exact type, so wrappers and
        /// containers of these types are not included.
        pub static IMMUTABLE_TYPES: &[&str] = &[$(stringify!($ty)),+];

        fn is_immutable_type(id: TypeId) -> bool {
            $(id == TypeId::of::<$ty>())||+
        }
    };
}

immutable_types![
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    (),
    &'static str,
    &'static [u8],
    Arc<str>,
    Arc<[u8]>,
    Range<i32>,
    Range<i64>,
    Range<u32>,
    Range<u64>,
    Range<usize>,
    RangeInclusive<i32>,
    RangeInclusive<i64>,
    RangeInclusive<u32>,
    RangeInclusive<u64>,
    RangeInclusive<usize>,
    Duration,
    TypeId,
    Ordering,
    fn(),
];

// == Is Immutable ==
/// Returns true if `T` is on the immutable allow-list.
///
/// Shallow: only the outermost type is inspected.
pub fn is_immutable<T: ?Sized + 'static>(_value: &T) -> bool {
    is_immutable_type(TypeId::of::<T>())
}

// == Is Mutable ==
pub fn is_mutable<T: ?Sized + 'static>(value: &T) -> bool {
    !is_immutable(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap, HashSet};

    #[test]
    fn test_scalar_samples_are_immutable() {
        assert!(is_immutable(&true));
        assert!(is_immutable(&false));
        assert!(is_immutable(&'x'));
        assert!(is_immutable(&0_i32));
        assert!(is_immutable(&(1_i64 << 32)));
        assert!(is_immutable(&u64::MAX));
        assert!(is_immutable(&1.0_f64));
        assert!(is_immutable(&1e10_f32));
        assert!(is_immutable(&()));
    }

    #[test]
    fn test_shared_text_and_bytes_are_immutable() {
        let text: &'static str = "1";
        let bytes: &'static [u8] = b"10";
        let shared_text: Arc<str> = Arc::from("");
        let shared_bytes: Arc<[u8]> = Arc::from(&b""[..]);

        assert!(is_immutable(&text));
        assert!(is_immutable(&bytes));
        assert!(is_immutable(&shared_text));
        assert!(is_immutable(&shared_bytes));
    }

    #[test]
    fn test_ranges_and_descriptors_are_immutable() {
        assert!(is_immutable(&(0_usize..10)));
        assert!(is_immutable(&(0_i64..=10)));
        assert!(is_immutable(&Duration::from_secs(1)));
        assert!(is_immutable(&TypeId::of::<String>()));
        assert!(is_immutable(&Ordering::Less));

        let f: fn() = || {};
        assert!(is_immutable(&f));
    }

    #[test]
    fn test_containers_are_mutable() {
        assert!(is_mutable(&Vec::<i32>::new()));
        assert!(is_mutable(&vec![1]));
        assert!(is_mutable(&HashMap::<i32, i32>::new()));
        assert!(is_mutable(&HashMap::from([(1, 2)])));
        assert!(is_mutable(&HashSet::from([1])));
        assert!(is_mutable(&BTreeMap::<String, i32>::new()));
        assert!(is_mutable(&String::from("owned")));
    }

    #[test]
    fn test_user_types_are_mutable() {
        struct Point {
            _x: i32,
        }

        assert!(is_mutable(&Point { _x: 1 }));
    }

    #[test]
    fn test_classification_is_shallow() {
        // Wrapping an immutable type in a container makes it mutable, and an
        // immutable pointer type is judged without looking at its target.
        assert!(is_mutable(&Some(1_i32)));
        assert!(is_mutable(&vec![Arc::<str>::from("a")]));
        assert!(is_immutable(&Arc::<str>::from("a")));
    }

    #[test]
    fn test_classifier_is_deterministic() {
        for _ in 0..3 {
            assert!(is_immutable(&5_u8) && !is_mutable(&5_u8));
            assert!(is_mutable(&vec![5_u8]) && !is_immutable(&vec![5_u8]));
        }
    }

    #[test]
    fn test_allow_list_names() {
        assert!(IMMUTABLE_TYPES.contains(&"bool"));
        assert!(IMMUTABLE_TYPES.contains(&"Duration"));
        assert!(!IMMUTABLE_TYPES.iter().any(|name| name.starts_with("Vec")));
    }
}
