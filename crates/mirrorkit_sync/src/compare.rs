//! One-level directory comparison.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::spec::EnumEntryKind;
use crate::util::{SpecSyncPatterns, probe_entry_followed, probe_entry_plain};

const N_COMPARE_CHUNK_BYTES: usize = 64 * 1024;

/// Classification of the immediate children of a (source, destination) pair.
///
/// The four sets are pairwise disjoint. Identical files appear in none.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpecDirectoryDiff {
    /// Names present under the source only.
    pub only_in_source: BTreeSet<OsString>,
    /// Names present under the destination only.
    pub only_in_destination: BTreeSet<OsString>,
    /// Names present on both sides whose bytes differ, whose kind differs
    /// (file on one side, directory on the other), or whose destination entry
    /// is a symlink or special file.
    pub common_files_differing: BTreeSet<OsString>,
    /// Names that are real directories on both sides.
    pub common_subdirectories: BTreeSet<OsString>,
    /// Source-side special files, left out of every set.
    pub names_special: BTreeSet<OsString>,
}

/// Non-excluded children of `path_dir`; `None` marks entries `probe` cannot
/// classify as a file or directory.
fn list_entries<F>(
    path_dir: &Path,
    spec_patterns: &SpecSyncPatterns,
    probe: F,
) -> io::Result<BTreeMap<OsString, Option<EnumEntryKind>>>
where
    F: Fn(&Path) -> io::Result<Option<EnumEntryKind>>,
{
    let mut dict_entries = BTreeMap::new();
    for entry_res in fs::read_dir(path_dir)? {
        let name = entry_res?.file_name();
        if spec_patterns.is_excluded(&name) {
            continue;
        }
        let kind = probe(&path_dir.join(&name))?;
        dict_entries.insert(name, kind);
    }
    Ok(dict_entries)
}

/// Compare the immediate children of `dir_source` and `dir_destination`.
///
/// Read-only and non-recursive. Source kinds are resolved through symlinks;
/// destination entries are taken as they are, so a destination link is never
/// treated as a directory. Files present on both sides are compared byte for
/// byte.
pub fn compare_directories(
    dir_source: &Path,
    dir_destination: &Path,
    spec_patterns: &SpecSyncPatterns,
) -> io::Result<SpecDirectoryDiff> {
    let mut spec_diff = SpecDirectoryDiff::default();
    let dict_src = list_entries(dir_source, spec_patterns, probe_entry_followed)?;
    let dict_dst = list_entries(dir_destination, spec_patterns, probe_entry_plain)?;

    for (name, kind_src) in &dict_src {
        let Some(kind_src) = kind_src else {
            spec_diff.names_special.insert(name.clone());
            continue;
        };
        match (kind_src, dict_dst.get(name)) {
            (_, None) => {
                spec_diff.only_in_source.insert(name.clone());
            }
            (EnumEntryKind::Directory, Some(Some(EnumEntryKind::Directory))) => {
                spec_diff.common_subdirectories.insert(name.clone());
            }
            (EnumEntryKind::File, Some(Some(EnumEntryKind::File))) => {
                // Unreadable pairs are left to the engine, which records the failure.
                let if_differ = files_differ(&dir_source.join(name), &dir_destination.join(name))
                    .unwrap_or(true);
                if if_differ {
                    spec_diff.common_files_differing.insert(name.clone());
                }
            }
            (_, Some(_)) => {
                spec_diff.common_files_differing.insert(name.clone());
            }
        }
    }
    for name in dict_dst.keys() {
        if !dict_src.contains_key(name) {
            spec_diff.only_in_destination.insert(name.clone());
        }
    }

    Ok(spec_diff)
}

/// Full byte comparison of two files.
///
/// Different lengths short-circuit to `true`; equal lengths are read chunk by
/// chunk. Timestamps are never consulted.
pub fn files_differ(path_a: &Path, path_b: &Path) -> io::Result<bool> {
    let meta_a = fs::metadata(path_a)?;
    let meta_b = fs::metadata(path_b)?;
    if meta_a.len() != meta_b.len() {
        return Ok(true);
    }

    let mut reader_a = BufReader::new(File::open(path_a)?);
    let mut reader_b = BufReader::new(File::open(path_b)?);
    let mut buf_a = vec![0_u8; N_COMPARE_CHUNK_BYTES];
    let mut buf_b = vec![0_u8; N_COMPARE_CHUNK_BYTES];
    loop {
        let n_read_a = read_full(&mut reader_a, &mut buf_a)?;
        let n_read_b = read_full(&mut reader_b, &mut buf_b)?;
        if n_read_a != n_read_b || buf_a[..n_read_a] != buf_b[..n_read_b] {
            return Ok(true);
        }
        if n_read_a == 0 {
            return Ok(false);
        }
    }
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut n_filled = 0;
    while n_filled < buf.len() {
        match reader.read(&mut buf[n_filled..]) {
            Ok(0) => break,
            Ok(n) => n_filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(n_filled)
}
