use std::{
    collections::{HashSet, VecDeque},
    path::{Component, Path, PathBuf},
};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::{
    error::DependencyResult,
    finder::ImportAnalyzer,
    layout::Layout,
    path::{
        clean_path, clean_path_and_make_absolute, constants::DIR_NAME_SITE_PACKAGES,
        constants::FILE_EXTENSION_SOURCE, diff_path,
    },
};

/**
    Modules that import other modules in ways that static analysis can
    not see, mapped to the file that must then also be analyzed.

    The default table maps the standard library `urllib` module to
    `urllib2`, which it pulls in lazily at runtime.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: IndexMap<PathBuf, PathBuf>,
}

impl AliasTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Creates the default alias table for the given layout.
    */
    #[must_use]
    pub fn with_defaults(layout: &Layout) -> Self {
        let mut table = Self::new();
        table.extend_relative(&layout.stdlib, [("urllib.py", "urllib2.py")]);
        table
    }

    /**
        Adds an alias, replacing any existing alias for the same file.
    */
    pub fn insert(&mut self, file: impl AsRef<Path>, alias: impl AsRef<Path>) {
        self.entries
            .insert(clean_path(file.as_ref()), clean_path(alias.as_ref()));
    }

    /**
        Adds aliases where relative paths are resolved against the given root.
    */
    pub fn extend_relative<F, A>(&mut self, root: &Path, aliases: impl IntoIterator<Item = (F, A)>)
    where
        F: AsRef<Path>,
        A: AsRef<Path>,
    {
        for (file, alias) in aliases {
            self.insert(root.join(file), root.join(alias));
        }
    }

    /**
        Gets the file that must also be analyzed when the given file is a dependency.
    */
    #[must_use]
    pub fn get(&self, file: &Path) -> Option<&Path> {
        self.entries.get(file).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/**
    Finds the package directory that a file belongs to, if any.

    A file belongs to a package if its path relative to one of the given
    roots crosses at least one directory separator, and the first segment
    of that relative path is neither a parent directory marker (meaning
    the file is not under the root at all) nor `site-packages` (which
    would otherwise turn all of site-packages into a single package
    whenever it lives inside of the standard library root).

    Roots are checked in order, and the first match is returned as `root/<first segment>`.
*/
#[must_use]
pub fn package_root(path: &Path, roots: &[&Path]) -> Option<PathBuf> {
    roots.iter().find_map(|root| {
        let relative = diff_path(path, root)?;
        let mut components = relative.components();
        let Some(Component::Normal(first)) = components.next() else {
            return None;
        };
        if first == DIR_NAME_SITE_PACKAGES || components.next().is_none() {
            return None;
        }
        Some(root.join(first))
    })
}

/**
    Collects every file that a set of entry scripts needs in order to run standalone.

    See [`DependencyCollector::collect`] for details.
*/
#[derive(Debug, Clone)]
pub struct DependencyCollector<A> {
    layout: Layout,
    aliases: AliasTable,
    analyzer: A,
}

impl<A: ImportAnalyzer> DependencyCollector<A> {
    #[must_use]
    pub fn new(layout: Layout, aliases: AliasTable, analyzer: A) -> Self {
        Self {
            layout,
            aliases,
            analyzer,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /**
        Collects the dependencies of the given entry scripts.

        The returned list starts with the support files of the interpreter,
        see [`Layout::support_files`], followed by every discovered
        dependency in the order it was first discovered. No file is
        listed twice, and all paths are absolute.

        Entry scripts are analyzed in the order given. Whenever a module
        belongs to a package under one of the package roots, every source
        file of that package is included, and whenever a module is found
        in the alias table, its alias is included and analyzed as an
        additional entry script.

        # Errors

        - If any entry script, or any module it imports, could not be read or parsed.
        - If a package directory could not be enumerated.
    */
    pub fn collect<P: AsRef<Path>>(
        &self,
        scripts: impl IntoIterator<Item = P>,
    ) -> DependencyResult<Vec<PathBuf>> {
        let roots = self.layout.package_roots();

        let mut dependencies: IndexSet<PathBuf> =
            self.layout.support_files().into_iter().collect();
        let mut processed_dirs: HashSet<PathBuf> = HashSet::new();
        let mut worklist: VecDeque<PathBuf> = scripts
            .into_iter()
            .map(clean_path_and_make_absolute)
            .collect();

        while let Some(script) = worklist.pop_front() {
            debug!(script = %script.display(), "collecting dependencies");

            for module in self.analyzer.analyze(&script)? {
                let Some(file) = module.file() else {
                    trace!(module = %module.name(), "skipping module without a file");
                    continue;
                };

                dependencies.insert(file.to_path_buf());

                if let Some(dir) = package_root(file, &roots) {
                    if !processed_dirs.contains(&dir) {
                        trace!(dir = %dir.display(), "including whole package");
                        dependencies.extend(package_sources(&dir)?);
                        processed_dirs.insert(dir);
                    }
                }

                if let Some(alias) = self.aliases.get(file) {
                    if dependencies.insert(alias.to_path_buf()) {
                        debug!(
                            module = %module.name(),
                            alias = %alias.display(),
                            "analyzing aliased module"
                        );
                        worklist.push_back(alias.to_path_buf());
                    }
                }
            }
        }

        Ok(dependencies.into_iter().collect())
    }
}

/**
    Lists every source file in a package directory, recursively, sorted by path.
*/
fn package_sources(dir: &Path) -> DependencyResult<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let is_source = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == FILE_EXTENSION_SOURCE);
        if is_source && !entry.file_type().is_dir() {
            sources.push(entry.into_path());
        }
    }
    Ok(sources)
}
