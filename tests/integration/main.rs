//! Integration tests for the zygote CLI

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const MANIFEST: &str = "foo==1.0\n# via -r requirements.in\nbar==2.0\n# via\n#   foo==1.0\n";

    const TREE: &str = r#"{
        "packages": ["A==1"],
        "children": [{"packages": ["B==1"], "children": []}]
    }"#;

    const FLAT_TREE: &str = r#"{"packages": [], "children": []}"#;

    const COSTS: &str = r#"{
        "A": {"1": {"time_ms": 10.0, "mem_mb": 5.0}},
        "B": {"1": {"time_ms": 20.0, "mem_mb": 7.0}}
    }"#;

    const WORKLOAD: &str = r#"{
        "functions": [
            {"name": "ab", "packages": ["A==1", "B==1"]},
            {"name": "a", "packages": ["A==1"]}
        ],
        "calls": [{"name": "ab"}, {"name": "ab"}, {"name": "a"}]
    }"#;

    /// Runs with a config path inside `dir` so the user's config is never read
    fn zygote(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("zygote");
        cmd.env("ZYGOTE_CONFIG", dir.path().join("config.toml"));
        cmd
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn arg(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        zygote(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache-tree cost simulator"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        zygote(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("zygote"));
    }

    #[test]
    fn parse_shows_requesters() {
        let dir = TempDir::new().unwrap();
        let manifest = write(&dir, "requirements.txt", MANIFEST);
        zygote(&dir)
            .args(["parse", arg(&manifest), "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"bar==2.0\": [\n      \"foo==1.0\"\n    ]"))
            .stdout(predicate::str::contains("direct_req"));
    }

    #[test]
    fn parse_plain_lists_requirement_set() {
        let dir = TempDir::new().unwrap();
        let manifest = write(&dir, "requirements.txt", MANIFEST);
        zygote(&dir)
            .args(["parse", arg(&manifest), "--format", "plain"])
            .assert()
            .success()
            .stdout("bar==2.0\nfoo==1.0\n");
    }

    #[test]
    fn parse_empty_manifest_fails() {
        let dir = TempDir::new().unwrap();
        let manifest = write(&dir, "requirements.txt", "\n");
        zygote(&dir)
            .args(["parse", arg(&manifest)])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid manifest"));
    }

    #[test]
    fn lookup_descends_and_warms() {
        let dir = TempDir::new().unwrap();
        let tree = write(&dir, "tree.json", TREE);
        let costs = write(&dir, "costs.json", COSTS);
        zygote(&dir)
            .args([
                "lookup",
                "--tree",
                arg(&tree),
                "--costs",
                arg(&costs),
                "--format",
                "plain",
                "A==1",
                "B==1",
            ])
            .assert()
            .success()
            .stdout("#1 21.400\n");
    }

    #[test]
    fn lookup_without_match_fails() {
        let dir = TempDir::new().unwrap();
        let tree = write(&dir, "tree.json", TREE);
        let costs = write(&dir, "costs.json", COSTS);
        zygote(&dir)
            .args(["lookup", "--tree", arg(&tree), "--costs", arg(&costs), "C==1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No cache node can serve"));
    }

    #[test]
    fn lookup_cost_miss_fails() {
        let dir = TempDir::new().unwrap();
        let tree = write(&dir, "tree.json", TREE);
        let costs = write(&dir, "costs.json", COSTS);
        zygote(&dir)
            .args([
                "lookup",
                "--tree",
                arg(&tree),
                "--costs",
                arg(&costs),
                "A==1",
                "Z==9",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No cost table entry for Z==9"));
    }

    #[test]
    fn replay_compares_trees_and_saves_hits() {
        let dir = TempDir::new().unwrap();
        let deep = write(&dir, "deep.json", TREE);
        let flat = write(&dir, "flat.json", FLAT_TREE);
        let costs = write(&dir, "costs.json", COSTS);
        let workload = write(&dir, "workload.json", WORKLOAD);
        let out = dir.path().join("out");

        zygote(&dir)
            .args([
                "replay",
                arg(&deep),
                arg(&flat),
                "--workload",
                arg(&workload),
                "--costs",
                arg(&costs),
                "--save-trees",
                arg(&out),
                "--format",
                "plain",
            ])
            .assert()
            .success()
            .stdout("deep 22.800\nflat 72.100\n");

        let saved = fs::read_to_string(out.join("deep.json")).unwrap();
        assert!(saved.contains("\"hit_count\": 2"));
        assert!(saved.contains("\"hit_count\": 1"));
    }

    #[test]
    fn replay_reports_failed_tree_and_keeps_others() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.json", FLAT_TREE);
        let bad = write(&dir, "bad.json", r#"{"packages": ["Z==1"], "children": []}"#);
        let costs = write(&dir, "costs.json", COSTS);
        let workload = write(&dir, "workload.json", WORKLOAD);

        zygote(&dir)
            .args([
                "replay",
                arg(&good),
                arg(&bad),
                "--workload",
                arg(&workload),
                "--costs",
                arg(&costs),
                "--format",
                "plain",
            ])
            .assert()
            .success()
            .stdout("good 72.100\n")
            .stderr(predicate::str::contains("bad: No cache node can serve"));
    }

    #[test]
    fn replay_fails_when_every_tree_fails() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.json", r#"{"packages": ["Z==1"], "children": []}"#);
        let costs = write(&dir, "costs.json", COSTS);
        let workload = write(&dir, "workload.json", WORKLOAD);

        zygote(&dir)
            .args([
                "replay",
                arg(&bad),
                "--workload",
                arg(&workload),
                "--costs",
                arg(&costs),
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error: No cache node can serve"));
    }

    #[test]
    fn replay_unknown_function_fails() {
        let dir = TempDir::new().unwrap();
        let tree = write(&dir, "tree.json", TREE);
        let costs = write(&dir, "costs.json", COSTS);
        let workload = write(
            &dir,
            "workload.json",
            r#"{"functions": [], "calls": [{"name": "missing"}]}"#,
        );
        zygote(&dir)
            .args([
                "replay",
                arg(&tree),
                "--workload",
                arg(&workload),
                "--costs",
                arg(&costs),
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown function 'missing'"));
    }

    #[test]
    fn top_counts_packages() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.txt", "six==1.16.0\nnumpy==1.25.2\n");
        let b = write(&dir, "b.txt", "six==1.16.0\n");
        zygote(&dir)
            .args(["top", "-n", "1", "--format", "plain", arg(&a), arg(&b)])
            .assert()
            .success()
            .stdout("six==1.16.0\n");
    }

    #[test]
    fn deps_writes_map() {
        let dir = TempDir::new().unwrap();
        let manifest = write(&dir, "requirements.txt", MANIFEST);
        let output = dir.path().join("deps.json");
        zygote(&dir)
            .args(["deps", arg(&manifest), "--output", arg(&output)])
            .assert()
            .success();

        let map = fs::read_to_string(&output).unwrap();
        assert!(map.contains("\"foo\""));
        assert!(map.contains("\"bar==2.0\": 1"));
    }

    #[test]
    fn config_path_follows_env() {
        let dir = TempDir::new().unwrap();
        zygote(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_then_show() {
        let dir = TempDir::new().unwrap();
        zygote(&dir).args(["config", "init"]).assert().success();
        assert!(dir.path().join("config.toml").exists());

        zygote(&dir)
            .args(["config", "set", "simulation.policy", "best-of-subtree"])
            .assert()
            .success();

        zygote(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("policy = \"best-of-subtree\""));
    }
}
