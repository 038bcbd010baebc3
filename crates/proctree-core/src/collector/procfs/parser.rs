//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::collector::traits::FileSystem;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Fields of `/proc/[pid]/stat` needed to place a process in the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    /// True if the comm was wrapped in braces, which marks a thread entry.
    pub is_thread: bool,
    pub ppid: u32,
    pub pgrp: i32,
    /// Total threads including the main one, if the field was present.
    pub num_threads: Option<u32>,
}

/// Parses `/proc/[pid]/stat` content.
///
/// The format is tricky because the comm field can contain spaces and parentheses.
/// Format: pid (comm) state ppid pgrp session tty_nr ...
///
/// Only state, `ppid` and `pgrp` are required after the comm; the stat
/// line of a process that is exiting may already be truncated.
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    // Find the comm field boundaries (enclosed in parentheses)
    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;

    let raw_comm = &content[open_paren + 1..close_paren];
    let (comm, is_thread) = match raw_comm
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
    {
        Some(inner) => (inner.to_string(), true),
        None => (raw_comm.to_string(), false),
    };

    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();
    if fields.len() < 3 {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected 3+, got {}",
            fields.len()
        )));
    }

    let ppid = fields[1]
        .parse::<i64>()
        .map_err(|_| ParseError::new("invalid ppid"))?;
    let pgrp = fields[2]
        .parse::<i32>()
        .map_err(|_| ParseError::new("invalid pgrp"))?;

    Ok(ProcStat {
        pid,
        comm,
        is_thread,
        ppid: u32::try_from(ppid).unwrap_or(0),
        pgrp,
        num_threads: fields.get(17).and_then(|s| s.parse().ok()),
    })
}

/// Extracts the real UID from `/proc/[pid]/status` content.
///
/// The `Uid:` line lists real, effective, saved and filesystem ids. Returns
/// `None` if the line is missing or malformed.
pub fn parse_status_uid(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|ids| ids.split_whitespace().next())
        .and_then(|real| real.parse().ok())
}

/// Parses `/proc/[pid]/cmdline` content: NUL-separated arguments.
pub fn parse_cmdline(content: &str) -> String {
    content
        .split('\0')
        .filter(|arg| !arg.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses `/etc/passwd` content and returns a map of UID -> username.
///
/// Format: username:password:uid:gid:gecos:home:shell
pub fn parse_passwd(content: &str) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    for line in content.lines() {
        // Skip comments and empty lines
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() >= 3
            && let Ok(uid) = parts[2].parse::<u32>()
        {
            // first entry wins, like getpwuid
            map.entry(uid).or_insert_with(|| parts[0].to_string());
        }
    }
    map
}

/// Resolver for UID -> username mapping.
///
/// Caches the passwd file contents for efficient lookups.
#[derive(Debug, Clone, Default)]
pub struct UserResolver {
    uid_to_name: HashMap<u32, String>,
}

impl UserResolver {
    /// Creates a new empty resolver.
    pub fn new() -> Self {
        Self {
            uid_to_name: HashMap::new(),
        }
    }

    /// Reads the passwd file at `path`. An unreadable file yields an empty
    /// resolver, so owners fall back to numeric uids.
    pub fn load<F: FileSystem>(fs: &F, path: &Path) -> Self {
        let mut resolver = Self::new();
        match fs.read_to_string(path) {
            Ok(content) => resolver.load_from_content(&content),
            Err(e) => debug!(
                path = %path.display(),
                error = %e,
                "passwd not readable, owners will be shown as uids"
            ),
        }
        resolver
    }

    /// Loads user mappings from /etc/passwd content.
    pub fn load_from_content(&mut self, content: &str) {
        self.uid_to_name = parse_passwd(content);
    }

    /// Returns the username for `uid`, if known.
    pub fn lookup(&self, uid: u32) -> Option<&str> {
        self.uid_to_name.get(&uid).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;

    #[test]
    fn test_parse_proc_stat_basic() {
        let content = "1234 (bash) S 1233 1234 1234 34816 1235 4194304 5000 50000 10 20 100 50 200 100 20 0 1 0 100000 25000000 2000 18446744073709551615 0 0 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 5 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.comm, "bash");
        assert_eq!(stat.ppid, 1233);
        assert_eq!(stat.pgrp, 1234);
        assert_eq!(stat.num_threads, Some(1));
        assert!(!stat.is_thread);
    }

    #[test]
    fn test_parse_proc_stat_with_spaces_in_comm() {
        let content = "5000 (Web Content) S 4999 5000 4999 0 -1 4194304 100000 0 500 0 5000 1000 0 0 20 0 20 0 500000 2000000000 50000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.pid, 5000);
        assert_eq!(stat.comm, "Web Content");
        assert_eq!(stat.ppid, 4999);
        assert_eq!(stat.num_threads, Some(20));
    }

    #[test]
    fn test_parse_proc_stat_with_parentheses_in_comm() {
        let content = "5001 (test(1)) S 1 5001 5001 0 -1 4194304 1000 0 0 0 10 5 0 0 20 0 1 0 500100 10000000 1000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.pid, 5001);
        assert_eq!(stat.comm, "test(1)");
    }

    #[test]
    fn test_parse_proc_stat_thread_braces() {
        let stat = parse_proc_stat("812 ({gmain}) S 800 800 800 0").unwrap();
        assert!(stat.is_thread);
        assert_eq!(stat.comm, "gmain");
        assert_eq!(stat.num_threads, None);
    }

    #[test]
    fn test_parse_proc_stat_init_has_no_parent() {
        let stat = parse_proc_stat("1 (systemd) S 0 1 1 0 -1").unwrap();
        assert_eq!(stat.ppid, 0);
    }

    #[test]
    fn test_parse_proc_stat_truncated() {
        assert!(parse_proc_stat("77 (gone) Z").is_err());
        assert!(parse_proc_stat("77 gone S 1 1").is_err());
        assert!(parse_proc_stat("x (bad) S 1 1").is_err());
        assert!(parse_proc_stat("9 (bad) S one 1").is_err());
    }

    #[test]
    fn test_parse_status_uid() {
        let uid = parse_status_uid(
            "Name:\tsshd\nUmask:\t0022\nPid:\t812\nUid:\t1000\t1001\t1000\t1000\nGid:\t100\t100\t100\t100\n",
        );
        assert_eq!(uid, Some(1000));
    }

    #[test]
    fn test_parse_status_uid_missing_or_malformed() {
        assert_eq!(parse_status_uid("Name:\tzombie\nState:\tZ (zombie)\n"), None);
        assert_eq!(parse_status_uid("Uid:\tnobody\n"), None);
    }

    #[test]
    fn test_parse_cmdline() {
        assert_eq!(parse_cmdline("/bin/bash\0--login\0"), "/bin/bash --login");
        assert_eq!(parse_cmdline(""), "");
        assert_eq!(parse_cmdline("nginx: worker process"), "nginx: worker process");
    }

    #[test]
    fn test_parse_passwd() {
        let users = parse_passwd(
            "# comment\nroot:x:0:0::/root:/bin/bash\n\nuser:x:1000:1000::/home/user:/bin/bash\ntoor:x:0:0::/root:/bin/sh\nbroken:x:abc:0::/:/bin/sh\n",
        );
        assert_eq!(users.len(), 2);
        assert_eq!(users[&0], "root");
        assert_eq!(users[&1000], "user");
    }

    #[test]
    fn test_user_resolver() {
        let mut resolver = UserResolver::new();
        assert_eq!(resolver.lookup(0), None);
        resolver.load_from_content(
            "root:x:0:0::/root:/bin/bash\nuser:x:1000:1000::/home/user:/bin/bash",
        );

        assert_eq!(resolver.lookup(0), Some("root"));
        assert_eq!(resolver.lookup(1000), Some("user"));
        assert_eq!(resolver.lookup(9999), None);
    }

    #[test]
    fn test_user_resolver_load_through_filesystem() {
        let resolver = UserResolver::load(&MockFs::typical_system(), Path::new("/etc/passwd"));
        assert_eq!(resolver.lookup(1000), Some("user"));

        let missing = UserResolver::load(&MockFs::new(), Path::new("/etc/passwd"));
        assert_eq!(missing.lookup(0), None);
    }
}
