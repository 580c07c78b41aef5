use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

// Block 80001 txids and merkle root, Bitcoin display order.
const TX_A: &str = "fd859b8a041591c4a759fc5e0a1eba3776739eef2066823a15fa3c2f2f0eb15e";
const TX_B: &str = "10b6fe7a18750cd43c847ed1d82daf8f3ee19f885da2b770ecfa22e961a5b829";
const TX_C: &str = "73496b488e2fccace327a81c6887ca08c3551c42f9adfe3984104390859bd794";
const ROOT: &str = "876ec557b3686aec47a98587420373a29f36c1fbc119a7bc6807163164a5fb8a";

fn txmerkle() -> Command {
    Command::cargo_bin("txmerkle").unwrap()
}

#[test]
fn root_from_hash_list() {
    let td = assert_fs::TempDir::new().unwrap();
    let list = td.child("hashes.txt");
    list.write_str(&format!("# block 80001\n{}\n\n{}\n{}\n", TX_A, TX_B, TX_C)).unwrap();

    txmerkle()
        .args(["root", "--display-order", "--hashes", list.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("root={}", ROOT)))
        .stdout(predicate::str::contains("tail_duplicates=false"));
}

#[test]
fn root_from_transactions_json() {
    let td = assert_fs::TempDir::new().unwrap();
    let txs = td.child("txs.json");
    txs.write_str(&format!(r#"[{{"txid":"{}"}},{{"txid":"{}"}},{{"txid":"{}"}}]"#, TX_A, TX_B, TX_C))
        .unwrap();

    txmerkle()
        .args(["root", "--json", "--display-order", "--txs", txs.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("\"root\": \"{}\"", ROOT)))
        .stdout(predicate::str::contains("\"leaves\": 3"));
}

#[test]
fn strict_rejects_mutated_list_and_check_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    let list = td.child("hashes.txt");
    list.write_str(&format!("{}\n{}\n{}\n{}\n", TX_A, TX_B, TX_C, TX_C)).unwrap();
    let path = list.path().to_str().unwrap();

    txmerkle()
        .args(["root", "--display-order", "--hashes", path])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("root={}", ROOT)))
        .stdout(predicate::str::contains("tail_duplicates=true"));

    txmerkle()
        .args(["root", "--strict", "--display-order", "--hashes", path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CVE-2012-2459"));

    txmerkle()
        .args(["check", "--expected", ROOT, "--display-order", "--hashes", path])
        .assert()
        .failure()
        .stdout(predicate::str::contains("BAD"));
}

#[test]
fn check_accepts_matching_root() {
    let td = assert_fs::TempDir::new().unwrap();
    let list = td.child("hashes.txt");
    list.write_str(&format!("{}\n{}\n{}\n", TX_A, TX_B, TX_C)).unwrap();

    txmerkle()
        .args(["check", "--expected", ROOT, "--display-order", "--hashes", list.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn items_directory_reproduces_cve_collision() {
    let td = assert_fs::TempDir::new().unwrap();
    let original = td.child("original");
    let mutated = td.child("mutated");
    original.create_dir_all().unwrap();
    mutated.create_dir_all().unwrap();
    for n in 1u8..=6 {
        original.child(format!("{:02}", n)).write_binary(&[n]).unwrap();
        mutated.child(format!("{:02}", n)).write_binary(&[n]).unwrap();
    }
    mutated.child("07").write_binary(&[5]).unwrap();
    mutated.child("08").write_binary(&[6]).unwrap();

    let run = |dir: &std::path::Path| {
        let out = txmerkle().args(["root", "--items", dir.to_str().unwrap()]).output().unwrap();
        assert!(out.status.success());
        String::from_utf8(out.stdout).unwrap()
    };
    let a = run(original.path());
    let b = run(mutated.path());
    assert_eq!(a.lines().next(), b.lines().next());
    assert!(a.contains("tail_duplicates=false"));
    assert!(b.contains("tail_duplicates=true"));
}

#[test]
fn missing_or_ambiguous_input_is_an_error() {
    txmerkle()
        .args(["root"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("none of the input sources"));

    let td = assert_fs::TempDir::new().unwrap();
    let list = td.child("hashes.txt");
    list.write_str(&format!("{}\n", TX_A)).unwrap();
    let dir = td.child("items");
    dir.create_dir_all().unwrap();
    dir.child("a").write_str("a").unwrap();

    txmerkle()
        .args(["root", "--hashes", list.path().to_str().unwrap(), "--items", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("more than one input source"));
}

#[test]
fn malformed_hash_line_reports_location() {
    let td = assert_fs::TempDir::new().unwrap();
    let list = td.child("hashes.txt");
    list.write_str(&format!("{}\nabcd\n", TX_A)).unwrap();

    txmerkle()
        .args(["root", "--hashes", list.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hashes.txt:2"));
}
