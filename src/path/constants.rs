/*!
    Constants for working with Python module paths.
*/

pub const FILE_NAME_INIT: &str = "__init__";
pub const FILE_EXTENSION_SOURCE: &str = "py";
pub const FILE_EXTENSIONS_NATIVE: [&str; 2] = ["so", "pyd"];

pub const DIR_NAME_SITE_PACKAGES: &str = "site-packages";
pub const DIR_NAME_LIB_DYNLOAD: &str = "lib-dynload";

pub const FILE_NAME_CONFIG: &str = "pydeps.toml";

pub const MODULE_NAME_MAIN: &str = "__main__";
