use std::{
    path::{Path, PathBuf},
    process::Command,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{DependencyError, DependencyResult},
    path::constants::{DIR_NAME_LIB_DYNLOAD, FILE_EXTENSION_SOURCE},
};

pub const DEFAULT_PYTHON: &str = "python3";

/**
    Names of the modules that are compiled into a stock CPython 3 interpreter.

    Only used when the layout is fully configured by hand, since
    the interpreter otherwise reports its own built-in modules.
*/
pub const DEFAULT_BUILTIN_MODULES: &[&str] = &[
    "_abc",
    "_ast",
    "_codecs",
    "_collections",
    "_functools",
    "_imp",
    "_io",
    "_locale",
    "_operator",
    "_signal",
    "_sre",
    "_stat",
    "_string",
    "_symtable",
    "_thread",
    "_tokenize",
    "_tracemalloc",
    "_typing",
    "_warnings",
    "_weakref",
    "atexit",
    "builtins",
    "errno",
    "faulthandler",
    "gc",
    "itertools",
    "marshal",
    "posix",
    "pwd",
    "sys",
    "time",
    "xxsubtype",
];

const INTROSPECT_SCRIPT: &str = r#"
import json, sys, sysconfig
paths = sysconfig.get_paths()
print(json.dumps({
    "stdlib": paths["stdlib"],
    "site_packages": paths["purelib"],
    "makefile": sysconfig.get_makefile_filename(),
    "config_header": sysconfig.get_config_h_filename(),
    "module_path": [p for p in sys.path if p],
    "builtin_modules": sorted(sys.builtin_module_names),
}))
"#;

/**
    Installation layout of a Python interpreter.

    This is everything that the dependency collector needs to know about
    the interpreter that will run the bundled scripts, and it is either
    queried from a real interpreter using [`Layout::introspect`], or
    put together by hand, for example from a configuration file.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// The standard library root, such as `/usr/lib64/python3.12`.
    pub stdlib: PathBuf,
    /// The site-packages root for third-party packages.
    pub site_packages: PathBuf,
    /// The build-configuration makefile of the interpreter.
    pub makefile: PathBuf,
    /// The build-configuration header of the interpreter, `pyconfig.h`.
    pub config_header: PathBuf,
    /// The module search path of the interpreter, its `sys.path`.
    #[serde(default)]
    pub module_path: Vec<PathBuf>,
    /// Names of modules compiled into the interpreter.
    #[serde(default)]
    pub builtin_modules: Vec<String>,
}

impl Layout {
    /**
        Creates a new layout from the two package roots and the two
        build-configuration files, using a default search path
        and the built-in modules of a stock CPython 3 interpreter.
    */
    #[must_use]
    pub fn new(
        stdlib: impl Into<PathBuf>,
        site_packages: impl Into<PathBuf>,
        makefile: impl Into<PathBuf>,
        config_header: impl Into<PathBuf>,
    ) -> Self {
        let stdlib = stdlib.into();
        let site_packages = site_packages.into();
        Self {
            module_path: default_module_path(&stdlib, &site_packages),
            builtin_modules: DEFAULT_BUILTIN_MODULES
                .iter()
                .map(ToString::to_string)
                .collect(),
            stdlib,
            site_packages,
            makefile: makefile.into(),
            config_header: config_header.into(),
        }
    }

    /**
        Queries the installation layout of the given Python interpreter.

        # Errors

        - If the interpreter could not be started.
        - If the interpreter exited with a non-zero status.
        - If the output of the interpreter could not be understood.
    */
    pub fn introspect(python: impl AsRef<str>) -> DependencyResult<Self> {
        let python = python.as_ref();
        debug!(python, "querying interpreter layout");

        let output = Command::new(python)
            .args(["-c", INTROSPECT_SCRIPT])
            .output()
            .map_err(|e| DependencyError::Layout(format!("failed to run '{python}': {e}")))?;

        if !output.status.success() {
            return Err(DependencyError::Layout(format!(
                "'{python}' exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            DependencyError::Layout(format!("unexpected output from '{python}': {e}"))
        })
    }

    /**
        Returns the roots that installed packages live under,
        site-packages first and the standard library second.
    */
    #[must_use]
    pub fn package_roots(&self) -> [&Path; 2] {
        [&self.site_packages, &self.stdlib]
    }

    /**
        Returns the files that the interpreter needs at runtime,
        no matter what the scripts that it runs are importing:

        1. The build-configuration makefile
        2. The build-configuration header
        3. The `site` module of the standard library
        4. The `sysconfig` module of the standard library
    */
    #[must_use]
    pub fn support_files(&self) -> [PathBuf; 4] {
        [
            self.makefile.clone(),
            self.config_header.clone(),
            self.stdlib.join("site").with_extension(FILE_EXTENSION_SOURCE),
            self.stdlib
                .join("sysconfig")
                .with_extension(FILE_EXTENSION_SOURCE),
        ]
    }
}

fn default_module_path(stdlib: &Path, site_packages: &Path) -> Vec<PathBuf> {
    vec![
        stdlib.to_path_buf(),
        stdlib.join(DIR_NAME_LIB_DYNLOAD),
        site_packages.to_path_buf(),
    ]
}

/**
    Per-field overrides for a [`Layout`].

    Any field that is not set is taken from the interpreter.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdlib: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_packages: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub makefile: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_header: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin_modules: Option<Vec<String>>,
}

impl LayoutOverrides {
    /**
        Returns `true` if the overrides describe a layout on
        their own, without having to ask an interpreter.
    */
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stdlib.is_some()
            && self.site_packages.is_some()
            && self.makefile.is_some()
            && self.config_header.is_some()
    }

    /**
        Resolves the final layout, only running the given
        interpreter if the overrides are not complete.

        # Errors

        If the overrides are not complete, and the interpreter could not be queried.
    */
    pub fn resolve(self, python: impl AsRef<str>) -> DependencyResult<Layout> {
        let base = match (
            &self.stdlib,
            &self.site_packages,
            &self.makefile,
            &self.config_header,
        ) {
            (Some(stdlib), Some(site_packages), Some(makefile), Some(config_header)) => {
                Layout::new(stdlib, site_packages, makefile, config_header)
            }
            _ => Layout::introspect(python)?,
        };
        Ok(self.apply(base))
    }

    /**
        Replaces every field of the given layout that has been overridden.
    */
    #[must_use]
    pub fn apply(self, mut layout: Layout) -> Layout {
        if let Some(stdlib) = self.stdlib {
            layout.stdlib = stdlib;
        }
        if let Some(site_packages) = self.site_packages {
            layout.site_packages = site_packages;
        }
        if let Some(makefile) = self.makefile {
            layout.makefile = makefile;
        }
        if let Some(config_header) = self.config_header {
            layout.config_header = config_header;
        }
        if let Some(module_path) = self.module_path {
            layout.module_path = module_path;
        }
        if let Some(builtin_modules) = self.builtin_modules {
            layout.builtin_modules = builtin_modules;
        }
        layout
    }
}
