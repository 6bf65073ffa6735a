use camino::Utf8PathBuf;
use reposcope_core::{Collector, CollectorOpts, RunContext};
use reposcope_coupling::CouplingCollector;

#[tokio::test]
async fn two_node_go_cycle_emits_one_signal() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

    std::fs::write(root.join("go.mod"), "module example.com/c\n\ngo 1.22\n").unwrap();
    std::fs::create_dir_all(root.join("pkga")).unwrap();
    std::fs::create_dir_all(root.join("pkgb")).unwrap();
    std::fs::write(
        root.join("pkga/a.go"),
        "package pkga\n\nimport \"example.com/c/pkgb\"\n\nfunc A() { pkgb.B() }\n",
    )
    .unwrap();
    std::fs::write(
        root.join("pkgb/b.go"),
        "package pkgb\n\nimport \"example.com/c/pkga\"\n\nfunc B() { pkga.A() }\n",
    )
    .unwrap();

    let ctx = RunContext::default();
    let opts = CollectorOpts::default();
    let output = CouplingCollector.collect(&ctx, &root, &opts).await.unwrap();

    let cycles: Vec<_> = output.signals.iter().filter(|s| s.kind == "circular-dependency").collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].confidence, 0.80);
    assert!(cycles[0].title.contains("pkga"));
    assert!(cycles[0].title.contains("pkgb"));
}
