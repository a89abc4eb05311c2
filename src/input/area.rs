//! Code for reading area-related information from CSV files.
use super::*;
use crate::area::AreaMap;
use std::path::Path;

const AREAS_FILE_NAME: &str = "areas.csv";

/// Reads areas from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// An [`AreaMap`] with the parsed areas, in file order, or an error
pub fn read_areas(model_dir: &Path) -> Result<AreaMap> {
    read_csv_id_file(&model_dir.join(AREAS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::Area;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    /// Create an example areas file in dir_path
    fn create_areas_file(dir_path: &Path, contents: &str) {
        let file_path = dir_path.join(AREAS_FILE_NAME);
        let mut file = File::create(file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
    }

    #[test]
    fn test_read_areas() {
        let dir = tempdir().unwrap();
        create_areas_file(
            dir.path(),
            "id,description
GB,Great Britain
IE,Ireland",
        );
        let areas = read_areas(dir.path()).unwrap();
        assert_eq!(
            areas,
            AreaMap::from([
                (
                    "GB".into(),
                    Area {
                        id: "GB".into(),
                        description: "Great Britain".to_string(),
                    }
                ),
                (
                    "IE".into(),
                    Area {
                        id: "IE".into(),
                        description: "Ireland".to_string(),
                    }
                ),
            ])
        );
    }

    #[test]
    fn test_read_areas_duplicate() {
        let dir = tempdir().unwrap();
        create_areas_file(
            dir.path(),
            "id,description
GB,Great Britain
GB,Also Great Britain",
        );
        let err = read_areas(dir.path()).unwrap_err();
        assert_eq!(
            err.chain().nth(1).unwrap().to_string(),
            "Duplicate ID found: GB"
        );
    }
}
