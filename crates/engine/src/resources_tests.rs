// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use sv_core::Instance;
use tempfile::NamedTempFile;

use super::*;

#[test]
fn read_total_cpu_usage_sums_cpu_line_fields() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "cpu  100 200 300 400 0 0 0 0 0 0").unwrap();
    writeln!(file, "cpu0 50 100 150 200 0 0 0 0 0 0").unwrap();

    let total = read_total_cpu_usage(file.path()).unwrap();
    assert_eq!(total, 100 + 200 + 300 + 400);
}

#[test]
fn read_total_cpu_usage_rejects_non_cpu_first_line() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "intr 12345 0 0").unwrap();

    assert!(read_total_cpu_usage(file.path()).is_none());
}

#[test]
fn read_proc_pid_stat_extracts_utime_stime_vsize() {
    let mut file = NamedTempFile::new().unwrap();
    // Field 2 (comm) deliberately contains a space to exercise the
    // paren-splitting logic; fields counted from "(" close onward.
    let mut line = String::from("1234 (my proc) S 1 1 1 0 -1 0 0 0 0 0 ");
    // fields 14(utime)=111, 15(stime)=222, then 7 filler fields up to
    // field 22, landing field 23(vsize)=333
    line.push_str("111 222 0 0 0 0 0 0 0 333");
    writeln!(file, "{line}").unwrap();

    let (utime, stime, vsize) = read_proc_pid_stat(file.path().to_str().unwrap()).unwrap();
    assert_eq!(utime, 111);
    assert_eq!(stime, 222);
    assert_eq!(vsize, 333);
}

#[test]
fn read_vmrss_parses_kilobyte_value() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "VmPeak:    9000 kB").unwrap();
    writeln!(file, "VmRSS:     4096 kB").unwrap();

    let rss = read_vmrss(file.path().to_str().unwrap()).unwrap();
    assert_eq!(rss, 4096);
}

#[test]
fn read_vmrss_missing_field_returns_none() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "VmPeak:    9000 kB").unwrap();

    assert!(read_vmrss(file.path().to_str().unwrap()).is_none());
}

#[test]
fn cpu_pct_computes_percentage_of_delta() {
    assert_eq!(cpu_pct(150, 100, 200), 25);
    assert_eq!(cpu_pct(100, 100, 200), 0);
}

#[test]
fn sample_all_skips_non_running_instances() {
    let mut sampler = ResourceSampler::new();
    let mut instance = Instance::new("i", vec!["/bin/true".into()]);
    instance.running = false;
    instance.pid = Some(99999);

    sampler.sample_all(std::iter::once(&mut instance));

    assert_eq!(instance.cpu_pct_user, 0);
    assert_eq!(instance.mem_rss, 0);
}
