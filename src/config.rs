use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use directories::ProjectDirs;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{DependencyError, DependencyResult},
    layout::LayoutOverrides,
    path::{clean_path, clean_path_and_make_absolute, constants::FILE_NAME_CONFIG},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    python: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout: Option<LayoutOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aliases: Option<IndexMap<PathBuf, PathBuf>>,
}

/**
    A deserialized `pydeps.toml` file.

    Relative paths in the layout section are resolved against the
    directory of the file, relative alias paths are left as they are
    and get resolved against the standard library root later on.
*/
#[derive(Debug, Clone)]
pub struct Config {
    dir: Arc<Path>,
    file: ConfigFile,
}

impl Config {
    /**
        Reads a config file from the given path.

        # Errors

        If the file could not be read, or is not a valid config file.
    */
    pub fn read(path: impl AsRef<Path>) -> DependencyResult<Self> {
        let path = clean_path_and_make_absolute(path);
        let contents = fs::read_to_string(&path).map_err(|e| DependencyError::io(&path, e))?;
        Self::parse(&path, &contents)
    }

    /**
        Looks for a config file, first in the given directory, and then
        in the config directory of the current user, and reads it.

        Returns `None` if no config file exists in either location.

        # Errors

        If a config file exists, but could not be read or is invalid.
    */
    pub fn discover(dir: impl AsRef<Path>) -> DependencyResult<Option<Self>> {
        let user_dir = ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
            .map(|dirs| dirs.config_dir().to_path_buf());
        let candidates = std::iter::once(dir.as_ref().to_path_buf()).chain(user_dir);

        for candidate in candidates {
            let path = candidate.join(FILE_NAME_CONFIG);
            match fs::read_to_string(&path) {
                Ok(contents) => {
                    debug!(path = %path.display(), "found config file");
                    return Self::parse(&path, &contents).map(Some);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(DependencyError::io(&path, e)),
            }
        }

        Ok(None)
    }

    fn parse(path: &Path, contents: &str) -> DependencyResult<Self> {
        let file = toml::from_str(contents).map_err(|e| DependencyError::Config {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        let dir = path
            .parent()
            .map_or_else(|| clean_path_and_make_absolute("."), Path::to_path_buf);
        Ok(Self {
            dir: dir.into(),
            file,
        })
    }

    /**
        Returns the interpreter to query for its layout, if one was configured.
    */
    #[must_use]
    pub fn python(&self) -> Option<&str> {
        self.file.python.as_deref()
    }

    /**
        Returns the layout overrides, with relative paths
        resolved against the directory of the config file.
    */
    #[must_use]
    pub fn layout_overrides(&self) -> LayoutOverrides {
        let mut overrides = self.file.layout.clone().unwrap_or_default();
        let resolve = |path: &mut PathBuf| *path = clean_path(self.dir.join(&*path));

        for path in [
            &mut overrides.stdlib,
            &mut overrides.site_packages,
            &mut overrides.makefile,
            &mut overrides.config_header,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
        for path in overrides.module_path.iter_mut().flatten() {
            resolve(path);
        }

        overrides
    }

    /**
        Gets a copy of all aliases in the config file, in the order they were written.

        Will return an empty map if there are no aliases.
    */
    #[must_use]
    pub fn aliases(&self) -> IndexMap<PathBuf, PathBuf> {
        self.file.aliases.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_sections() {
        let config = Config::parse(
            Path::new("/etc/pydeps/pydeps.toml"),
            r#"
                python = "/usr/bin/python3.12"

                [layout]
                stdlib = "../lib/python3.12"
                site_packages = "/usr/lib/python3.12/site-packages"
                module_path = ["extra", "/abs"]

                [aliases]
                "urllib.py" = "urllib2.py"
                "gi/__init__.py" = "/usr/lib/python3.12/site-packages/gi/overrides/Gtk.py"
            "#,
        )
        .unwrap();

        assert_eq!(config.python(), Some("/usr/bin/python3.12"));

        let overrides = config.layout_overrides();
        assert_eq!(overrides.stdlib, Some(PathBuf::from("/etc/lib/python3.12")));
        assert_eq!(
            overrides.site_packages,
            Some(PathBuf::from("/usr/lib/python3.12/site-packages"))
        );
        assert_eq!(overrides.makefile, None);
        assert_eq!(
            overrides.module_path,
            Some(vec![PathBuf::from("/etc/pydeps/extra"), PathBuf::from("/abs")])
        );

        let aliases = config.aliases();
        assert_eq!(aliases.len(), 2);
        assert_eq!(
            aliases.get_index(0),
            Some((&PathBuf::from("urllib.py"), &PathBuf::from("urllib2.py")))
        );
    }

    #[test]
    fn empty_file_is_valid() {
        let config = Config::parse(Path::new("/x/pydeps.toml"), "").unwrap();
        assert_eq!(config.python(), None);
        assert!(!config.layout_overrides().is_complete());
        assert!(config.aliases().is_empty());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::parse(Path::new("/x/pydeps.toml"), "pyhton = \"python3\"").unwrap_err();
        assert!(matches!(err, DependencyError::Config { .. }));
    }

    #[test]
    fn read_reports_missing_files() {
        let err = Config::read("/nonexistent/dir/pydeps.toml").unwrap_err();
        assert!(matches!(err, DependencyError::Io { .. }));
    }

    #[test]
    fn discovers_file_in_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(FILE_NAME_CONFIG), "python = \"python3.11\"").unwrap();

        let config = Config::discover(tmp.path()).unwrap().unwrap();
        assert_eq!(config.python(), Some("python3.11"));
    }
}
