// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Helpers shared by the unit tests.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;

/// Unified diff between two texts, computed with `diff` from `$PATH`.
pub fn diff(left_label: &str, left: &str, right_label: &str, right: &str) -> String {
    let mut left_file = NamedTempFile::new().unwrap();
    left_file.write_all(left.as_bytes()).unwrap();
    let mut right_file = NamedTempFile::new().unwrap();
    right_file.write_all(right.as_bytes()).unwrap();

    let output = Command::new("diff")
        .arg("--unified")
        .arg("--label")
        .arg(left_label)
        .arg("--label")
        .arg(right_label)
        .arg(left_file.path())
        .arg(right_file.path())
        .output()
        .expect("failed to run diff");
    // diff(1) exits with 2 on trouble, 1 when the inputs differ.
    assert_ne!(output.status.code().unwrap(), 2, "diff failed: {}", output.status);
    String::from_utf8(output.stdout).expect("diff output was not UTF-8")
}

/// Panic with a diff if the two texts differ.
#[track_caller]
pub fn assert_eq_with_diff(left_label: &str, left: &str, right_label: &str, right: &str) {
    assert!(
        left == right,
        "texts did not match, diff:\n{}\n",
        diff(left_label, left, right_label, right)
    );
}

#[track_caller]
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(haystack.contains(needle), "Could not find {:?} in {:?}", needle, haystack);
}

#[track_caller]
pub fn assert_not_contains(haystack: &str, needle: &str) {
    assert!(!haystack.contains(needle), "Unexpected {:?} in {:?}", needle, haystack);
}

/// Compare generated code with a golden file.
///
/// `snapshot_path` is relative to the crate directory, which is the
/// working directory of tests run by Cargo. When `UPDATE_SNAPSHOTS` is
/// set the golden file is rewritten instead.
#[track_caller]
pub fn assert_snapshot_eq<P: AsRef<Path>>(snapshot_path: P, actual_content: &str) {
    let snapshot = snapshot_path.as_ref();

    if std::env::var("UPDATE_SNAPSHOTS").is_ok() {
        if std::env::var("CARGO_MANIFEST_DIR").is_err() {
            panic!("Please unset UPDATE_SNAPSHOTS if you are not using Cargo");
        }
        fs::write(snapshot, actual_content).unwrap_or_else(|err| {
            panic!("Could not write snapshot to {}: {}", snapshot.display(), err)
        });
        return;
    }

    let snapshot_content = fs::read_to_string(snapshot).unwrap_or_else(|err| {
        panic!("Could not read snapshot from {}: {}", snapshot.display(), err)
    });
    assert_eq_with_diff(
        &snapshot.display().to_string(),
        &snapshot_content,
        "actual",
        actual_content,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_keeps_labels() {
        let patch = diff("left 'file'", "foo\nbar\n", "right ~file!", "foo\nnew line\nbar\n");
        assert_contains(&patch, "left 'file'");
        assert_contains(&patch, "right ~file!");
        assert_contains(&patch, "+new line");
    }

    #[test]
    #[should_panic]
    fn test_assert_eq_with_diff_on_diff() {
        assert_eq_with_diff("", "foo\nbar\n", "", "foo\nnew line\nbar\n");
    }

    #[test]
    fn test_assert_eq_with_diff_on_eq() {
        assert_eq_with_diff("left", "foo\nbar\n", "right", "foo\nbar\n");
    }
}
