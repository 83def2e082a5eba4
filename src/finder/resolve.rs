/*!
    Utilities for resolving Python module names to files on disk.
*/

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;

use crate::path::{
    append_extension,
    constants::{FILE_EXTENSIONS_NATIVE, FILE_EXTENSION_SOURCE, FILE_NAME_INIT},
};

/**
    A module location, resolved to a file that exists on the filesystem.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleLocation {
    /// A package directory with an `__init__.py` file in it.
    Package { init: PathBuf, dir: PathBuf },
    /// A single `.py` source file.
    Source(PathBuf),
    /// A compiled extension module, such as `name.so` or `name.cpython-312-x86_64-linux-gnu.so`.
    Extension(PathBuf),
}

impl ModuleLocation {
    /**
        Returns the file that backs this module.
    */
    #[must_use]
    pub fn file(&self) -> &Path {
        match self {
            Self::Package { init, .. } => init,
            Self::Source(path) | Self::Extension(path) => path,
        }
    }

    /**
        Returns `true` if the file that backs this module should be scanned for imports.
    */
    #[must_use]
    pub const fn is_source(&self) -> bool {
        !matches!(self, Self::Extension(_))
    }
}

/**
    Cache of directory listings used when looking for extension modules.

    Extension modules carry an arbitrary platform tag in their file
    name, so they can not be found using a single existence check.
*/
#[derive(Debug, Default)]
pub struct DirCache {
    listings: HashMap<PathBuf, Vec<String>>,
}

impl DirCache {
    fn listing(&mut self, dir: &Path) -> &[String] {
        self.listings.entry(dir.to_path_buf()).or_insert_with(|| {
            fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(Result::ok)
                        .filter_map(|entry| entry.file_name().into_string().ok())
                        .sorted()
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    /**
        Finds a module with the given (non-dotted) name in the given directory.

        Given a name `module`, these are searched, in order:

        - `module/__init__.py`
        - `module.py`
        - `module.so` or `module.pyd`
        - `module.<tag>.so` or `module.<tag>.pyd`
    */
    pub fn find_in_dir(&mut self, dir: &Path, name: &str) -> Option<ModuleLocation> {
        let package = dir.join(name);
        let init = package.join(append_extension(FILE_NAME_INIT, FILE_EXTENSION_SOURCE));
        if init.is_file() {
            return Some(ModuleLocation::Package { init, dir: package });
        }

        let source = append_extension(&package, FILE_EXTENSION_SOURCE);
        if source.is_file() {
            return Some(ModuleLocation::Source(source));
        }

        let prefix = format!("{name}.");
        self.listing(dir)
            .iter()
            .find(|file_name| {
                file_name
                    .strip_prefix(&prefix)
                    .and_then(|rest| rest.rsplit('.').next())
                    .is_some_and(|ext| FILE_EXTENSIONS_NATIVE.contains(&ext))
            })
            .map(|file_name| ModuleLocation::Extension(dir.join(file_name)))
            .filter(|path| path.file().is_file())
    }

    /**
        Finds a module with the given (non-dotted) name in the first
        directory of the given search path that contains it.
    */
    pub fn find_in_dirs<'a>(
        &mut self,
        dirs: impl IntoIterator<Item = &'a PathBuf>,
        name: &str,
    ) -> Option<ModuleLocation> {
        dirs.into_iter()
            .find_map(|dir| self.find_in_dir(dir, name))
    }

    /**
        Lists the names of all submodules that can be found in a package directory.

        This is used for `from package import *`, and returns names
        in sorted order, without duplicates and without `__init__`.
    */
    pub fn submodules(&mut self, package_dir: &Path) -> Vec<String> {
        let listing = self.listing(package_dir).to_vec();
        listing
            .into_iter()
            .filter_map(|file_name| {
                let path = package_dir.join(&file_name);
                if path.is_dir() {
                    let init = path.join(append_extension(FILE_NAME_INIT, FILE_EXTENSION_SOURCE));
                    return init.is_file().then_some(file_name);
                }
                let (stem, ext) = file_name.split_once('.')?;
                let ext = ext.rsplit('.').next()?;
                let is_module =
                    ext == FILE_EXTENSION_SOURCE || FILE_EXTENSIONS_NATIVE.contains(&ext);
                (is_module && stem != FILE_NAME_INIT).then(|| stem.to_string())
            })
            .sorted()
            .dedup()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, write};

    use super::*;

    fn touch(path: &Path) {
        create_dir_all(path.parent().unwrap()).unwrap();
        write(path, "").unwrap();
    }

    #[test]
    fn prefers_packages_over_sources() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("json/__init__.py"));
        touch(&tmp.path().join("json.py"));

        let found = DirCache::default().find_in_dir(tmp.path(), "json").unwrap();
        assert_eq!(
            found,
            ModuleLocation::Package {
                init: tmp.path().join("json/__init__.py"),
                dir: tmp.path().join("json"),
            }
        );
    }

    #[test]
    fn directories_without_init_are_not_packages() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("data/readme.txt"));

        assert_eq!(DirCache::default().find_in_dir(tmp.path(), "data"), None);
    }

    #[test]
    fn finds_tagged_extension_modules() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("_ssl.cpython-312-x86_64-linux-gnu.so"));
        touch(&tmp.path().join("_ssl_helper.py"));

        let found = DirCache::default().find_in_dir(tmp.path(), "_ssl").unwrap();
        assert_eq!(
            found,
            ModuleLocation::Extension(tmp.path().join("_ssl.cpython-312-x86_64-linux-gnu.so"))
        );
        assert!(!found.is_source());
    }

    #[test]
    fn searches_dirs_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(&first.path().join("shared.py"));
        touch(&second.path().join("shared.py"));
        touch(&second.path().join("only_second.py"));

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let mut cache = DirCache::default();
        assert_eq!(
            cache.find_in_dirs(&dirs, "shared").unwrap().file(),
            first.path().join("shared.py")
        );
        assert_eq!(
            cache.find_in_dirs(&dirs, "only_second").unwrap().file(),
            second.path().join("only_second.py")
        );
        assert_eq!(cache.find_in_dirs(&dirs, "missing"), None);
    }

    #[test]
    fn lists_submodules() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("__init__.py"));
        touch(&tmp.path().join("b.py"));
        touch(&tmp.path().join("a.py"));
        touch(&tmp.path().join("a.cpython-312-x86_64-linux-gnu.so"));
        touch(&tmp.path().join("sub/__init__.py"));
        touch(&tmp.path().join("notes.txt"));
        touch(&tmp.path().join("plain_dir/x.py"));

        assert_eq!(DirCache::default().submodules(tmp.path()), ["a", "b", "sub"]);
    }
}
