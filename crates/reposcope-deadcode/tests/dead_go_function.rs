use camino::Utf8PathBuf;
use reposcope_core::{Collector, CollectorOpts, RunContext};
use reposcope_deadcode::DeadCodeCollector;

#[tokio::test]
async fn unused_unexported_function_is_flagged_used_one_is_not() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

    std::fs::write(
        root.join("helper.go"),
        "package main\n\nfunc unusedHelper() int {\n\treturn 1\n}\n\nfunc usedFunc() int {\n\treturn 2\n}\n",
    )
    .unwrap();
    std::fs::write(root.join("main.go"), "package main\n\nfunc main() {\n\tusedFunc()\n}\n").unwrap();

    let ctx = RunContext::default();
    let opts = CollectorOpts::default();
    let output = DeadCodeCollector.collect(&ctx, &root, &opts).await.unwrap();

    let names: Vec<&str> = output.signals.iter().map(|s| s.title.as_str()).collect();
    assert!(names.iter().any(|t| t.contains("unusedHelper")), "{names:?}");
    assert!(!names.iter().any(|t| t.contains("usedFunc")), "{names:?}");

    let unused = output.signals.iter().find(|s| s.title.contains("unusedHelper")).unwrap();
    assert_eq!(unused.kind, "unused-function");
    assert_eq!(unused.confidence, 0.7);
}
