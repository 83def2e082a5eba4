/*!
    Static import analysis for Python scripts.

    Finds every module that a script imports, directly or indirectly,
    without running any of the code involved. Imports that only happen
    through dynamic means such as `__import__` or `importlib` can not be
    seen here, see [`AliasTable`](crate::AliasTable) for how those are handled.
*/

use std::{
    collections::{HashSet, VecDeque},
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    error::{DependencyError, DependencyResult},
    layout::Layout,
    path::{clean_path_and_make_absolute, constants::MODULE_NAME_MAIN},
};

mod resolve;
mod scanner;

pub use self::resolve::{DirCache, ModuleLocation};
pub use self::scanner::{scan_imports, ImportKind, ImportStatement, ScanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Built into the interpreter, has no backing file.
    Builtin,
    /// A single `.py` file.
    Source,
    /// A package, backed by its `__init__.py` file.
    Package,
    /// A compiled extension module.
    Extension,
}

/**
    A module reachable from an analyzed script.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    name: String,
    file: Option<PathBuf>,
    kind: ModuleKind,
}

impl ModuleRecord {
    #[must_use]
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
            kind: ModuleKind::Builtin,
        }
    }

    #[must_use]
    pub fn new(name: impl Into<String>, kind: ModuleKind, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: Some(file.into()),
            kind,
        }
    }

    fn from_location(name: impl Into<String>, location: &ModuleLocation) -> Self {
        let kind = match location {
            ModuleLocation::Package { .. } => ModuleKind::Package,
            ModuleLocation::Source(_) => ModuleKind::Source,
            ModuleLocation::Extension(_) => ModuleKind::Extension,
        };
        Self::new(name, kind, location.file())
    }

    /**
        Returns the fully qualified name of the module, such as `xml.dom.minidom`.
    */
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /**
        Returns the file that backs this module, if any.

        Modules that are built into the interpreter have no backing file.
    */
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        self.kind
    }
}

/**
    A facility that statically finds all modules reachable from a script.
*/
pub trait ImportAnalyzer {
    /**
        Returns every module imported by the given script, directly
        or indirectly, in the order they were first discovered.

        The script itself is not part of the result.

        # Errors

        - If the script, or any source module it imports, can not be read.
        - If the script, or any source module it imports, can not be parsed.
    */
    fn analyze(&self, script: &Path) -> DependencyResult<Vec<ModuleRecord>>;
}

impl<T: ImportAnalyzer + ?Sized> ImportAnalyzer for &T {
    fn analyze(&self, script: &Path) -> DependencyResult<Vec<ModuleRecord>> {
        (**self).analyze(script)
    }
}

/**
    Finds modules by scanning Python source files for import
    statements and resolving them against a module search path.

    Modules that can not be found anywhere on the search path are
    left out of the result, there is nothing on disk to bundle for them.
*/
#[derive(Debug, Clone)]
pub struct ModuleFinder {
    module_path: Vec<PathBuf>,
    builtin_modules: HashSet<String>,
}

impl ModuleFinder {
    /**
        Creates a new module finder using the search path and
        built-in module names of the given interpreter layout.
    */
    #[must_use]
    pub fn new(layout: &Layout) -> Self {
        Self {
            module_path: layout.module_path.clone(),
            builtin_modules: layout.builtin_modules.iter().cloned().collect(),
        }
    }

    /**
        Returns the module search path, not including
        the directory of the script being analyzed.
    */
    #[must_use]
    pub fn module_path(&self) -> &[PathBuf] {
        &self.module_path
    }
}

impl ImportAnalyzer for ModuleFinder {
    fn analyze(&self, script: &Path) -> DependencyResult<Vec<ModuleRecord>> {
        let script = clean_path_and_make_absolute(script);
        debug!(script = %script.display(), "scanning imports");

        let mut run = FinderRun::new(self, &script);
        run.pending.push_back(PendingScan {
            name: MODULE_NAME_MAIN.to_string(),
            file: script,
            is_package: false,
        });
        run.scan_pending()?;

        Ok(run.modules.into_values().map(|found| found.record).collect())
    }
}

#[derive(Debug)]
struct FoundModule {
    record: ModuleRecord,
    package_dir: Option<PathBuf>,
}

#[derive(Debug)]
struct PendingScan {
    name: String,
    file: PathBuf,
    is_package: bool,
}

/**
    State for a single call to [`ModuleFinder::analyze`].
*/
struct FinderRun<'a> {
    finder: &'a ModuleFinder,
    search_path: Vec<PathBuf>,
    modules: IndexMap<String, FoundModule>,
    missing: HashSet<String>,
    pending: VecDeque<PendingScan>,
    dirs: DirCache,
}

impl<'a> FinderRun<'a> {
    fn new(finder: &'a ModuleFinder, script: &Path) -> Self {
        // The directory of the script always comes first, the same
        // way that it does when the interpreter runs the script
        let search_path = script
            .parent()
            .map(Path::to_path_buf)
            .into_iter()
            .chain(finder.module_path.iter().cloned())
            .collect();
        Self {
            finder,
            search_path,
            modules: IndexMap::new(),
            missing: HashSet::new(),
            pending: VecDeque::new(),
            dirs: DirCache::default(),
        }
    }

    fn scan_pending(&mut self) -> DependencyResult<()> {
        while let Some(scan) = self.pending.pop_front() {
            trace!(module = %scan.name, file = %scan.file.display(), "scanning module");

            let bytes = fs::read(&scan.file).map_err(|e| DependencyError::io(&scan.file, e))?;
            let source = String::from_utf8_lossy(&bytes);
            let statements = scan_imports(&source).map_err(|e| DependencyError::Parse {
                path: scan.file.clone(),
                line: e.line,
                message: e.message,
            })?;

            for statement in statements {
                self.handle_statement(&scan, statement.kind);
            }
        }
        Ok(())
    }

    fn handle_statement(&mut self, caller: &PendingScan, kind: ImportKind) {
        match kind {
            ImportKind::Import { module } => {
                self.import_module(&module);
            }
            ImportKind::From {
                level,
                module,
                names,
            } => {
                let base = if level == 0 {
                    module
                } else {
                    relative_base(caller, level, module.as_deref())
                };
                let Some(base) = base else {
                    debug!(
                        caller = %caller.name,
                        level,
                        "relative import beyond top-level package"
                    );
                    return;
                };
                let Some(package_dir) = self.import_module(&base) else {
                    return;
                };
                for name in names {
                    if name == "*" {
                        for sub in self.dirs.submodules(&package_dir) {
                            self.import_submodule(&format!("{base}.{sub}"));
                        }
                    } else {
                        self.import_submodule(&format!("{base}.{name}"));
                    }
                }
            }
        }
    }

    /**
        Imports a module that may just as well be an attribute of its
        parent package, for example `from os import path` vs `from os import sep`.
    */
    fn import_submodule(&mut self, name: &str) {
        let seen = self.modules.contains_key(name) || self.missing.contains(name);
        if !seen && self.find_module(name).is_none() {
            trace!(module = %name, "name is not a submodule");
        }
    }

    /**
        Imports the given module and all of its parent packages.

        Returns the package directory of the module if it was found and is a package.
    */
    fn import_module(&mut self, name: &str) -> Option<PathBuf> {
        if let Some(found) = self.modules.get(name) {
            return found.package_dir.clone();
        }
        if self.missing.contains(name) {
            return None;
        }
        match self.find_module(name) {
            Some(package_dir) => package_dir,
            None => {
                debug!(module = %name, "module not found");
                None
            }
        }
    }

    /**
        Finds a module that has not yet been seen, importing parents first.

        Returns `None` if the module could not be found, and `Some`
        with the package directory for found modules (if a package).
    */
    fn find_module(&mut self, name: &str) -> Option<Option<PathBuf>> {
        let location = match name.rsplit_once('.') {
            None if self.finder.builtin_modules.contains(name) => {
                self.insert(ModuleRecord::builtin(name), None);
                return Some(None);
            }
            None => self.dirs.find_in_dirs(&self.search_path, name),
            Some((parent, last)) => match self.import_module(parent) {
                Some(parent_dir) => self.dirs.find_in_dir(&parent_dir, last),
                None => None,
            },
        };

        let Some(location) = location else {
            self.missing.insert(name.to_string());
            return None;
        };

        let record = ModuleRecord::from_location(name, &location);
        let package_dir = match &location {
            ModuleLocation::Package { dir, .. } => Some(dir.clone()),
            _ => None,
        };
        if location.is_source() {
            self.pending.push_back(PendingScan {
                name: name.to_string(),
                file: location.file().to_path_buf(),
                is_package: package_dir.is_some(),
            });
        }
        self.insert(record, package_dir.clone());
        Some(package_dir)
    }

    fn insert(&mut self, record: ModuleRecord, package_dir: Option<PathBuf>) {
        trace!(module = %record.name, kind = ?record.kind, "found module");
        self.modules.insert(
            record.name.clone(),
            FoundModule {
                record,
                package_dir,
            },
        );
    }
}

/**
    Resolves the absolute module name for a relative import such as `from ..a import b`.

    Returns `None` if the import goes beyond the top-level package.
*/
fn relative_base(caller: &PendingScan, level: usize, module: Option<&str>) -> Option<String> {
    let mut package: Vec<&str> = caller.name.split('.').collect();
    if !caller.is_package || caller.name == MODULE_NAME_MAIN {
        package.pop();
    }
    for _ in 1..level {
        package.pop()?;
    }
    if package.is_empty() {
        return None;
    }
    let mut base = package.join(".");
    if let Some(module) = module {
        base.push('.');
        base.push_str(module);
    }
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(name: &str, is_package: bool) -> PendingScan {
        PendingScan {
            name: name.to_string(),
            file: PathBuf::new(),
            is_package,
        }
    }

    #[test]
    fn relative_from_module() {
        let caller = pending("pkg.sub.mod", false);
        assert_eq!(relative_base(&caller, 1, None), Some("pkg.sub".into()));
        assert_eq!(relative_base(&caller, 1, Some("x")), Some("pkg.sub.x".into()));
        assert_eq!(relative_base(&caller, 2, Some("y")), Some("pkg.y".into()));
        assert_eq!(relative_base(&caller, 3, Some("z")), None);
    }

    #[test]
    fn relative_from_package() {
        let caller = pending("pkg.sub", true);
        assert_eq!(relative_base(&caller, 1, Some("x")), Some("pkg.sub.x".into()));
        assert_eq!(relative_base(&caller, 2, None), Some("pkg".into()));
    }

    #[test]
    fn relative_from_main_script() {
        let caller = pending(MODULE_NAME_MAIN, false);
        assert_eq!(relative_base(&caller, 1, Some("x")), None);
    }
}
