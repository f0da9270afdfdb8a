//! Parsing of raw `LIST` output into typed directory entries.
//!
//! A listing line looks like
//! `drwxr-xr-x  2 site site 4096 Mar 01 12:00 wp-content`. The name is the
//! ninth whitespace-separated field, and everything after the eighth field
//! belongs to it, so names containing spaces survive.

use crate::utils::errors::{BackupError, Result};

/// Fields a listing line is split into; the last one is the entry name.
const LISTING_FIELDS: usize = 9;

/// Lines at the top of every listing that refer to `.` and `..`.
const SELF_AND_PARENT: usize = 2;

/// One entry of a remote directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Full remote path (queried directory joined with the entry name)
    pub path: String,

    /// Is this a directory?
    pub is_directory: bool,
}

/// Parse the raw listing of `directory` into entries, in listing order.
///
/// The first two lines are always dropped. A line that yields no name is a
/// malformed listing and fails the whole directory.
pub fn parse_listing<S: AsRef<str>>(directory: &str, lines: &[S]) -> Result<Vec<RemoteEntry>> {
    lines
        .iter()
        .skip(SELF_AND_PARENT)
        .map(|line| parse_line(directory, line.as_ref()))
        .collect()
}

fn parse_line(directory: &str, line: &str) -> Result<RemoteEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    let name = name_field(line).ok_or_else(|| BackupError::MalformedListing {
        directory: directory.to_string(),
        line: line.to_string(),
    })?;

    Ok(RemoteEntry {
        path: join_remote(directory, name),
        is_directory: line.starts_with('d'),
    })
}

/// Last field of the line when split into at most `LISTING_FIELDS` fields.
fn name_field(line: &str) -> Option<&str> {
    let mut rest = line.trim_start();
    if rest.is_empty() {
        return None;
    }

    for _ in 1..LISTING_FIELDS {
        match rest.find(char::is_whitespace) {
            Some(end) => {
                let after = rest[end..].trim_start();
                if after.is_empty() {
                    return Some(&rest[..end]);
                }
                rest = after;
            }
            None => return Some(rest),
        }
    }

    Some(rest)
}

/// Join a remote directory and a name with `/`. An empty directory is the root.
pub fn join_remote(parent: &str, name: &str) -> String {
    if name.is_empty() {
        return if parent.is_empty() { "/".to_string() } else { parent.to_string() };
    }
    if name.starts_with('/') {
        return name.to_string();
    }
    if parent.is_empty() {
        format!("/{}", name)
    } else if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(lines: &[&str]) -> Vec<String> {
        let mut all = vec![
            "drwxr-xr-x  5 site site 4096 Mar 01 12:00 .".to_string(),
            "drwxr-xr-x 12 site site 4096 Mar 01 12:00 ..".to_string(),
        ];
        all.extend(lines.iter().map(|l| l.to_string()));
        all
    }

    #[test]
    fn test_self_and_parent_are_dropped() {
        let entries = parse_listing("/www", &listing(&[])).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_first_two_lines_dropped_whatever_they_contain() {
        let lines = [
            "-rw-r--r-- 1 site site 10 Mar 01 12:00 a.txt",
            "-rw-r--r-- 1 site site 10 Mar 01 12:00 b.txt",
            "-rw-r--r-- 1 site site 10 Mar 01 12:00 c.txt",
        ];
        let entries = parse_listing("/", &lines).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/c.txt");
    }

    #[test]
    fn test_directory_marker() {
        let entries = parse_listing(
            "/www",
            &listing(&[
                "drwxr-xr-x 2 site site 4096 Mar 01 12:00 wp-content",
                "-rw-r--r-- 1 site site  512 Mar 01 12:00 index.php",
                "lrwxrwxrwx 1 site site    9 Mar 01 12:00 current -> releases",
            ]),
        )
        .unwrap();

        assert_eq!(
            entries,
            vec![
                RemoteEntry { path: "/www/wp-content".to_string(), is_directory: true },
                RemoteEntry { path: "/www/index.php".to_string(), is_directory: false },
                RemoteEntry { path: "/www/current -> releases".to_string(), is_directory: false },
            ]
        );
    }

    #[test]
    fn test_names_with_spaces() {
        let entries = parse_listing(
            "/docs",
            &listing(&["-rw-r--r-- 1 site site 2048 Mar 01 12:00 annual report  2023.pdf"]),
        )
        .unwrap();
        assert_eq!(entries[0].path, "/docs/annual report  2023.pdf");
    }

    #[test]
    fn test_empty_parent_is_root() {
        let entries = parse_listing(
            "",
            &listing(&["drwxr-xr-x 2 site site 4096 Mar 01 12:00 a"]),
        )
        .unwrap();
        assert_eq!(entries[0].path, "/a");
        assert!(entries[0].is_directory);
    }

    #[test]
    fn test_crlf_line_endings() {
        let entries = parse_listing(
            "/",
            &listing(&["-rw-r--r-- 1 site site 3 Mar 01 12:00 robots.txt\r\n"]),
        )
        .unwrap();
        assert_eq!(entries[0].path, "/robots.txt");
    }

    #[test]
    fn test_short_line_uses_last_token() {
        let entries = parse_listing("/x", &listing(&["-rw 1 name"])).unwrap();
        assert_eq!(entries[0].path, "/x/name");
    }

    #[test]
    fn test_blank_line_is_malformed() {
        let err = parse_listing("/www", &listing(&["   "])).unwrap_err();
        assert!(matches!(err, BackupError::MalformedListing { .. }));
    }

    #[test]
    fn test_join_remote() {
        assert_eq!(join_remote("/", "a"), "/a");
        assert_eq!(join_remote("/var/lib", "dpkg"), "/var/lib/dpkg");
        assert_eq!(join_remote("/var/lib/", "dpkg"), "/var/lib/dpkg");
        assert_eq!(join_remote("/var/lib", ""), "/var/lib");
        assert_eq!(join_remote("", ""), "/");
        assert_eq!(join_remote("", "a"), "/a");
    }
}
