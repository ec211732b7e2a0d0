//! Multi-result unification
//!
//! Combines the per-index results of one batch into a single container of
//! the same family as the inputs, labeled by index name in request order.

use ndarray::Axis;
use specidx_core::value::{
    DataArray, Frame, LazyArray, LazyFrame, LazySeries, RemoteImage, RemoteList, RemoteNumber,
    Series,
};
use specidx_core::{ContainerKind, Error, Result, Value};

/// Move every value of one variant out of a result list
macro_rules! take_all {
    ($results:expr, $variant:ident) => {
        $results
            .into_iter()
            .filter_map(|r| match r {
                Value::$variant(v) => Some(v),
                _ => None,
            })
            .collect()
    };
}

/// Combine ordered results into one container.
///
/// | first result   | combined as                                              |
/// |----------------|----------------------------------------------------------|
/// | array          | stacked along a new leading axis                         |
/// | series         | frame with one column per result, named by `labels`      |
/// | labeled array  | concatenated along `axis`, `labels` as its coordinate    |
/// | remote image   | multi-band image, bands named by `labels`                |
/// | remote number  | remote list in label order                               |
/// | lazy array     | stacked along a new leading axis                         |
/// | lazy series    | lazy frame with columns named by `labels`                |
///
/// A single result is returned as is.
///
/// # Errors
/// - [`Error::LabelCount`] if `labels` and `results` differ in length
/// - [`Error::NotEnoughResults`] for an empty batch
/// - [`Error::MixedContainerKinds`] if results belong to different families
/// - [`Error::UnsupportedContainerType`] for any other family
pub fn unify(mut results: Vec<Value>, labels: &[String], axis: &str) -> Result<Value> {
    if results.len() != labels.len() {
        return Err(Error::LabelCount {
            expected: results.len(),
            found: labels.len(),
        });
    }
    let kind = match results.first() {
        Some(first) => first.kind(),
        None => {
            return Err(Error::NotEnoughResults {
                required: 1,
                found: 0,
            })
        }
    };
    if let Some((position, other)) = results.iter().enumerate().find(|(_, r)| r.kind() != kind) {
        return Err(Error::MixedContainerKinds {
            expected: kind,
            found: other.kind(),
            position,
        });
    }
    if results.len() == 1 {
        if let Some(only) = results.pop() {
            return Ok(only);
        }
    }

    tracing::debug!(kind = %kind, results = results.len(), "unifying index results");

    match kind {
        ContainerKind::Array => {
            let arrays: Vec<_> = results.iter().filter_map(Value::as_array).collect();
            let views: Vec<_> = arrays.iter().map(|a| a.view()).collect();
            Ok(Value::Array(ndarray::stack(Axis(0), &views)?))
        }
        ContainerKind::Series => {
            let series: Vec<Series> = take_all!(results, Series);
            Ok(Value::Frame(Frame::from_series(labels, series)?))
        }
        ContainerKind::DataArray => {
            let arrays: Vec<DataArray> = take_all!(results, DataArray);
            let joined = DataArray::concat(&arrays, axis)?.with_coord(axis, labels.iter().cloned())?;
            Ok(Value::DataArray(joined))
        }
        ContainerKind::RemoteImage => {
            let images: Vec<RemoteImage> = take_all!(results, RemoteImage);
            Ok(Value::RemoteImage(RemoteImage::cat(&images).rename(labels)?))
        }
        ContainerKind::RemoteNumber => {
            let numbers: Vec<RemoteNumber> = take_all!(results, RemoteNumber);
            Ok(Value::RemoteList(RemoteList::from_numbers(&numbers)))
        }
        ContainerKind::LazyArray => {
            let arrays: Vec<LazyArray> = take_all!(results, LazyArray);
            Ok(Value::LazyArray(LazyArray::stack(&arrays)?))
        }
        ContainerKind::LazySeries => {
            let series: Vec<LazySeries> = take_all!(results, LazySeries);
            Ok(Value::LazyFrame(LazyFrame::concat(&series)?.rename(labels)?))
        }
        other => Err(Error::UnsupportedContainerType(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_arrays_stack_on_new_axis() {
        let out = unify(
            vec![
                Value::from(array![1.0, 2.0, 3.0]),
                Value::from(array![4.0, 5.0, 6.0]),
            ],
            &labels(&["NDVI", "SAVI"]),
            "index",
        )
        .unwrap();
        let a = out.as_array().unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a[[1, 0]], 4.0);
    }

    #[test]
    fn test_series_become_frame() {
        let out = unify(
            vec![
                Value::Series(Series::new(vec![0.1, 0.2])),
                Value::Series(Series::new(vec![0.3, 0.4])),
            ],
            &labels(&["NDVI", "SAVI"]),
            "index",
        )
        .unwrap();
        let f = out.as_frame().unwrap();
        assert_eq!(f.columns(), labels(&["NDVI", "SAVI"]).as_slice());
        assert_eq!(f.column("NDVI").unwrap().values(), &array![0.1, 0.2]);
    }

    #[test]
    fn test_data_arrays_get_index_coordinate() {
        let make = |v: f64| {
            let data = Array2::from_elem((2, 2), v).into_dyn();
            Value::DataArray(DataArray::new(data, ["x", "y"]).unwrap())
        };
        let out = unify(vec![make(1.0), make(2.0)], &labels(&["NDVI", "NBR"]), "index").unwrap();
        let d = out.as_data_array().unwrap();
        assert_eq!(d.dims()[0], "index");
        assert_eq!(d.coord("index").unwrap(), labels(&["NDVI", "NBR"]).as_slice());
        assert_eq!(d.sel("index", "NBR").unwrap().data()[[0, 0]], 2.0);
    }

    #[test]
    fn test_remote_numbers_collect_in_order() {
        let out = unify(
            vec![
                Value::RemoteNumber(RemoteNumber::new(1.0)),
                Value::RemoteNumber(RemoteNumber::new(2.0)),
            ],
            &labels(&["a", "b"]),
            "index",
        )
        .unwrap();
        assert_eq!(out.as_remote_list().unwrap().len(), 2);
    }

    #[test]
    fn test_single_result_passes_through() {
        let out = unify(vec![Value::Scalar(0.5)], &labels(&["NDVI"]), "index").unwrap();
        assert_eq!(out, Value::Scalar(0.5));
    }

    #[test]
    fn test_scalars_are_rejected() {
        let err = unify(
            vec![Value::Scalar(0.5), Value::Scalar(0.6)],
            &labels(&["NDVI", "SAVI"]),
            "index",
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedContainerType(ContainerKind::Scalar)));
    }

    #[test]
    fn test_mixed_families_fail() {
        let err = unify(
            vec![Value::from(array![1.0]), Value::Series(Series::new(vec![1.0]))],
            &labels(&["a", "b"]),
            "index",
        )
        .unwrap_err();
        match err {
            Error::MixedContainerKinds {
                expected,
                found,
                position,
            } => {
                assert_eq!(expected, ContainerKind::Array);
                assert_eq!(found, ContainerKind::Series);
                assert_eq!(position, 1);
            }
            other => panic!("expected MixedContainerKinds, got {:?}", other),
        }
    }

    #[test]
    fn test_label_count_checked() {
        assert!(matches!(
            unify(vec![Value::Scalar(1.0)], &labels(&["a", "b"]), "index"),
            Err(Error::LabelCount { .. })
        ));
    }
}
