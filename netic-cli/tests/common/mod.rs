#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Writes a tiny complete input set below `root`: gene and interaction type
/// indexes, five mutation paths over two samples, and one circuit per sample.
pub fn write_fixture(root: &Path) {
    fs::write(root.join("gene-ids"), "1\tA\n2\tB\n3\tC\n4\tD\n").unwrap();
    fs::write(root.join("interaction-type-ids"), "1\tppi\n2\tkinase\n").unwrap();

    let paths = root.join("paths_4").join("mutation");
    fs::create_dir_all(&paths).unwrap();
    fs::write(
        paths.join("paths.txt"),
        "s1\t0.5\tA->B\t1\t[0.5]\t1\t[1]\n\
         s1\t0.5\tB->C\t1\t[0.5]\t1\t[1]\n\
         s1\t0.25\tA->B->C\t1\t[0.5 0.5]\t1\t[1 1]\n\
         s2\t0.5\tC->D\t1\t[0.5]\t1\t[1]\n\
         s2\t0.4\tB->D\t1\t[0.4]\t1\t[2]\n",
    )
    .unwrap();

    let circuits = root.join("NF_4").join("mutation");
    write_circuit(
        &circuits.join("a"),
        "1;2;1\n2;3;1\n1;s1\n",
        "1;2;1;0.5\n2;3;1;0.5\n",
        "nnf 4 3 3\nL 1\nL 2\nL 3\nA 3 0 1 2\n",
    );
    write_circuit(
        &circuits.join("b"),
        "3;4;1\n3;s2\n",
        "3;4;1;0.5\n",
        "nnf 3 2 2\nL 1\nL 2\nA 2 0 1\n",
    );
}

fn write_circuit(dir: &Path, translation: &str, weights: &str, nnf: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("translation_table"), translation).unwrap();
    fs::write(dir.join("interactions"), weights).unwrap();
    fs::write(dir.join("compiled.cnf.nnf"), nnf).unwrap();
}

/// A `netic` invocation for a short seeded run on the fixture in `root`.
pub fn small_run(root: &Path, seed: u64) -> Command {
    let mut cmd = Command::cargo_bin("netic").unwrap();
    cmd.arg("-o")
        .arg(root)
        .args(["--population-size", "10"])
        .args(["--generations-count", "3"])
        .args(["--target-network-size", "3"])
        .args(["--regulatory-types", "kinase"])
        .args(["--num-threads", "2"])
        .arg("--no-early-termination")
        .args(["--seed", &seed.to_string()]);
    cmd
}

/// Every file below `dir` with its contents, sorted by relative path.
pub fn read_tree(dir: &Path) -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    collect(dir, dir, &mut files);
    files.sort();
    files
}

fn collect(root: &Path, dir: &Path, files: &mut Vec<(PathBuf, String)>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            files.push((relative, fs::read_to_string(&path).unwrap()));
        }
    }
}
