use std::{fs::Metadata, path::PathBuf};

use anyhow::{anyhow, Result};
use console::style;

use pydeps::path::{clean_path_and_make_absolute, constants::FILE_EXTENSION_SOURCE};

/**
    Discovers an entry script path based on a given script argument.

    Script discovery is done in a few steps:

    1. If we got a file that exists, use it as-is, whatever its extension
    2. If we got a directory, check if it has a `__main__.py` file to use
    3. If we got a path without an extension, also look for a `.py` file
    4. No other options left, the file simply did not exist

    The resulting path is always absolute.
*/
pub fn discover_script_path(path: impl Into<PathBuf>) -> Result<PathBuf> {
    let file_path = clean_path_and_make_absolute(path.into());

    // NOTE: We use metadata directly here to try to
    // avoid accessing the file path more than once
    let file_meta = file_path.metadata();
    let is_file = file_meta.as_ref().map_or(false, Metadata::is_file);
    let is_dir = file_meta.as_ref().map_or(false, Metadata::is_dir);

    if is_file {
        Ok(file_path)
    } else if is_dir {
        let main_path = file_path.join("__main__.py");
        if main_path.is_file() {
            Ok(main_path)
        } else {
            Err(anyhow!(
                "No script was found at {}, found a directory without a __main__.py file",
                style(file_path.display()).yellow()
            ))
        }
    } else if file_path.extension().is_none()
        && file_path.with_extension(FILE_EXTENSION_SOURCE).is_file()
    {
        Ok(file_path.with_extension(FILE_EXTENSION_SOURCE))
    } else {
        Err(anyhow!(
            "No script was found at {}",
            style(file_path.display()).yellow()
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir, write};

    use super::*;

    #[test]
    fn finds_existing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("anaconda");
        write(&script, "import sys\n").unwrap();

        assert_eq!(discover_script_path(&script).unwrap(), script);
    }

    #[test]
    fn appends_source_extension() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path().join("setup.py"), "").unwrap();

        assert_eq!(
            discover_script_path(tmp.path().join("setup")).unwrap(),
            tmp.path().join("setup.py")
        );
    }

    #[test]
    fn uses_main_file_in_directories() {
        let tmp = tempfile::tempdir().unwrap();
        create_dir(tmp.path().join("app")).unwrap();

        assert!(discover_script_path(tmp.path().join("app")).is_err());

        write(tmp.path().join("app/__main__.py"), "").unwrap();
        assert_eq!(
            discover_script_path(tmp.path().join("app")).unwrap(),
            tmp.path().join("app/__main__.py")
        );
    }

    #[test]
    fn missing_scripts_are_errors() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover_script_path(tmp.path().join("nope.py")).is_err());
    }
}
