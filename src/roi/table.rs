use std::path::Path;

use indexmap::IndexMap;

use crate::error::RoiError;

const COORDINATE_COLUMNS: [&str; 3] = ["x", "y", "z"];

/// Columns of one table inside an HDF5 file; `group` is `None` for the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub group: Option<String>,
    pub columns: IndexMap<String, Vec<f64>>,
}

impl Table {
    pub fn has_coordinates(&self) -> bool {
        COORDINATE_COLUMNS
            .iter()
            .all(|column| self.columns.contains_key(*column))
    }
}

/// Keeps the tables that carry `x`, `y` and `z`. Fails with every column
/// name seen when none does.
fn coordinate_tables(tables: Vec<Table>) -> Result<Vec<Table>, RoiError> {
    let mut seen: Vec<String> = Vec::new();
    let mut kept = Vec::new();
    for table in tables {
        if table.has_coordinates() {
            kept.push(table);
            continue;
        }
        for name in table.columns.keys() {
            if !seen.contains(name) {
                seen.push(name.clone());
            }
        }
    }
    if kept.is_empty() {
        return Err(RoiError::MissingColumns(seen));
    }
    Ok(kept)
}

/// Collects every group (root included) whose 1-D datasets include `x`, `y`
/// and `z`. Other groups, such as metadata or index arrays, are skipped.
#[cfg(feature = "hdf5")]
pub fn read_tables(path: &Path) -> Result<Vec<Table>, RoiError> {
    let fail = |reason: String| RoiError::Read {
        path: path.to_path_buf(),
        reason,
    };

    let file = hdf5::File::open(path).map_err(|e| fail(e.to_string()))?;
    let mut tables = vec![Table {
        group: None,
        columns: columns_of(&file).map_err(|e| fail(e.to_string()))?,
    }];

    for name in file.member_names().map_err(|e| fail(e.to_string()))? {
        let Ok(group) = file.group(&name) else {
            continue;
        };
        let columns = columns_of(&group).map_err(|e| fail(e.to_string()))?;
        tables.push(Table {
            group: Some(name),
            columns,
        });
    }

    let tables = coordinate_tables(tables)?;
    tracing::debug!("{} coordinate table(s) in {}", tables.len(), path.display());
    Ok(tables)
}

#[cfg(feature = "hdf5")]
fn columns_of(group: &hdf5::Group) -> hdf5::Result<IndexMap<String, Vec<f64>>> {
    let mut columns = IndexMap::new();
    for name in group.member_names()? {
        let Ok(dataset) = group.dataset(&name) else {
            continue;
        };
        if dataset.ndim() != 1 {
            continue;
        }
        columns.insert(name, dataset.read_raw::<f64>()?);
    }
    Ok(columns)
}

#[cfg(not(feature = "hdf5"))]
pub fn read_tables(_path: &Path) -> Result<Vec<Table>, RoiError> {
    Err(RoiError::FeatureDisabled("HDF5", "hdf5"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(group: Option<&str>, names: &[&str]) -> Table {
        Table {
            group: group.map(str::to_string),
            columns: names.iter().map(|n| (n.to_string(), vec![1.0])).collect(),
        }
    }

    #[test]
    fn metadata_tables_are_skipped() {
        let kept = coordinate_tables(vec![
            table(None, &["index"]),
            table(Some("meta"), &["id", "label"]),
            table(Some("cells"), &["x", "y", "z", "id"]),
        ])
        .unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].group.as_deref(), Some("cells"));
    }

    #[test]
    fn no_coordinate_table_lists_what_was_found() {
        let err = coordinate_tables(vec![
            table(None, &["x", "y"]),
            table(Some("meta"), &["id", "y"]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            RoiError::MissingColumns(found) if found == ["x", "y", "id"]
        ));
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn hdf5_without_the_feature_is_unavailable() {
        assert!(matches!(
            read_tables(Path::new("rois.h5")),
            Err(RoiError::FeatureDisabled(..))
        ));
    }

    #[cfg(feature = "hdf5")]
    fn write_group(file: &hdf5::Group, columns: &[(&str, [f64; 2])]) {
        for (name, values) in columns {
            file.new_dataset_builder()
                .with_data(&values[..])
                .create(*name)
                .unwrap();
        }
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn groups_with_coordinates_become_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rois.h5");
        {
            let file = hdf5::File::create(&path).unwrap();
            write_group(&file, &[("index", [0.0, 1.0])]);
            let meta = file.create_group("meta").unwrap();
            write_group(&meta, &[("id", [7.0, 8.0])]);
            let left = file.create_group("left").unwrap();
            write_group(&left, &[("x", [1.0, 2.0]), ("y", [3.0, 4.0]), ("z", [5.0, 6.0])]);
        }

        let tables = read_tables(&path).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].group.as_deref(), Some("left"));
        assert_eq!(tables[0].columns["y"], vec![3.0, 4.0]);
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn file_without_coordinates_is_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rois.h5");
        {
            let file = hdf5::File::create(&path).unwrap();
            write_group(&file, &[("x", [1.0, 2.0]), ("y", [3.0, 4.0])]);
        }

        assert!(matches!(
            read_tables(&path),
            Err(RoiError::MissingColumns(found)) if found == ["x", "y"]
        ));
    }
}
