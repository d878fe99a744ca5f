pub mod trace;

pub use trace::TraceReader;

use std::path::Path;

/// Number of characters stripped from each end of a source filename
const ID_PREFIX_LEN: usize = 4;
const ID_SUFFIX_LEN: usize = 4;

/// Derive the vehicle identifier from a source path
///
/// Files are expected to be named `new_[ID].txt`; the first four and last four
/// characters of the base name are dropped. Names too short to hold both
/// yield an empty identifier.
pub fn vehicle_id_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let len = name.chars().count();
    if len <= ID_PREFIX_LEN + ID_SUFFIX_LEN {
        return String::new();
    }

    name.chars()
        .skip(ID_PREFIX_LEN)
        .take(len - ID_PREFIX_LEN - ID_SUFFIX_LEN)
        .collect()
}
