//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` filesystem states
//! for testing various system conditions.

use super::filesystem::MockFs;

/// Builds a full-length `/proc/[pid]/stat` line.
fn stat_line(pid: u32, comm: &str, ppid: u32, pgrp: u32, threads: u32) -> String {
    format!(
        "{pid} ({comm}) S {ppid} {pgrp} {pgrp} 0 -1 4194560 1500 0 10 0 20 10 0 0 20 0 {threads} 0 150 10000000 500 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0"
    )
}

fn status(name: &str, uid: u32) -> String {
    format!("Name:\t{name}\nState:\tS (sleeping)\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\nGid:\t{uid}\t{uid}\t{uid}\t{uid}\n")
}

impl MockFs {
    /// Creates a typical system with a few processes.
    ///
    /// Includes: systemd (PID 1), kthreadd (PID 2), sshd with a user login
    /// shell running an editor, and `/etc/passwd` for name resolution.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        // /etc/passwd for user name resolution
        fs.add_file(
            "/etc/passwd",
            "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin
user:x:1000:1000:User:/home/user:/bin/bash
",
        );

        // non-process entries
        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_file("/proc/loadavg", "0.15 0.10 0.05 1/150 1234\n");

        fs.add_process(
            1,
            &stat_line(1, "systemd", 0, 1, 1),
            &status("systemd", 0),
            "/sbin/init\0splash\0",
        );
        fs.add_tasks(1, &[1]);

        fs.add_process(2, &stat_line(2, "kthreadd", 0, 0, 1), &status("kthreadd", 0), "");

        fs.add_process(
            1000,
            &stat_line(1000, "sshd", 1, 1000, 1),
            &status("sshd", 0),
            "/usr/sbin/sshd\0-D\0",
        );
        fs.add_process(
            1001,
            &stat_line(1001, "bash", 1000, 1001, 1),
            &status("bash", 1000),
            "-bash\0",
        );
        fs.add_process(
            1002,
            &stat_line(1002, "vim", 1001, 1002, 1),
            &status("vim", 1000),
            "vim\0notes.txt\0",
        );

        fs
    }

    /// Processes with spaces and parentheses in their names.
    pub fn with_special_names() -> Self {
        let mut fs = Self::new();
        fs.add_process(1, &stat_line(1, "init", 0, 1, 1), &status("init", 0), "");
        fs.add_process(
            5000,
            &stat_line(5000, "Web Content", 1, 5000, 20),
            &status("Web Content", 1000),
            "/usr/lib/firefox/firefox\0-contentproc\0",
        );
        fs.add_process(
            5001,
            &stat_line(5001, "test(1)", 1, 5001, 1),
            &status("test(1)", 1000),
            "./test(1)\0",
        );
        fs
    }

    /// Multi-threaded processes.
    ///
    /// PID 700 exposes its threads under `task/`; PID 800 has no readable
    /// `task/` directory and reports 5 threads in `stat`.
    pub fn threaded_daemon() -> Self {
        let mut fs = Self::new();
        fs.add_process(1, &stat_line(1, "init", 0, 1, 1), &status("init", 0), "");
        fs.add_tasks(1, &[1]);

        fs.add_process(
            700,
            &stat_line(700, "dockerd", 1, 700, 4),
            &status("dockerd", 0),
            "/usr/bin/dockerd\0",
        );
        fs.add_tasks(700, &[700, 701, 702, 703]);

        fs.add_process(
            710,
            &stat_line(710, "containerd", 700, 700, 1),
            &status("containerd", 0),
            "containerd\0",
        );
        fs.add_tasks(710, &[710]);

        fs.add_process(
            800,
            &stat_line(800, "java", 1, 800, 5),
            &status("java", 1000),
            "java\0-jar\0app.jar\0",
        );
        fs
    }

    /// Processes racing with the scan.
    ///
    /// PID 5 has exited (directory without files), PID 6 has a truncated
    /// stat, PID 10 has no readable status.
    pub fn with_vanishing_process() -> Self {
        let mut fs = Self::new();
        fs.add_process(1, &stat_line(1, "init", 0, 1, 1), &status("init", 0), "");
        fs.add_dir("/proc/5");
        fs.add_process(6, "6 (dying) Z", "", "");
        fs.add_process(10, &stat_line(10, "worker", 1, 10, 1), "", "");
        fs
    }

    /// A process whose parent is missing from the table.
    pub fn with_orphans() -> Self {
        let mut fs = Self::new();
        fs.add_process(1, &stat_line(1, "init", 0, 1, 1), &status("init", 0), "");
        fs.add_process(2, &stat_line(2, "getty", 1, 2, 1), &status("getty", 0), "");
        fs.add_process(5, &stat_line(5, "orphan", 99, 5, 1), &status("orphan", 0), "");
        fs
    }
}
