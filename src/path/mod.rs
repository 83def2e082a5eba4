mod std;

pub mod constants;

pub use self::std::{
    append_extension, clean_path, clean_path_and_make_absolute, diff_path, get_current_dir,
};
