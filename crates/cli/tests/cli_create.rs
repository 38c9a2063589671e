use std::path::Path;
use std::process::Output;

use tempfile::TempDir;

async fn zato_qs(args: &[&str], cwd: &Path) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_zato-qs"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "info")
        .env_remove("ZATO_QS_CONFIG")
        .kill_on_drop(true)
        .output()
        .await
        .expect("Failed to run zato-qs")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[tokio::test]
async fn test_create_windows_cluster() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("qs1");

    let output = zato_qs(
        &[
            "create",
            target.to_str().unwrap(),
            "--platform",
            "windows",
            "--cluster-name",
            "qs-cli",
            "--servers",
            "2",
        ],
        dir.path(),
    )
    .await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    assert!(target.join("zato-qs-start.bat").exists());
    assert!(!target.join("zato-qs-start.sh").exists());
    assert!(target.join("zato.db").exists());
    assert!(target.join("server1/config/server.toml").exists());
    assert!(target.join("server2/config/server.toml").exists());
    assert!(target.join("load-balancer/config/lb.toml").exists());
    assert!(!target.join("ca").exists());

    let logs = stdout(&output);
    assert!(logs.contains("[1/7] Certificate authority created"));
    assert!(logs.contains("[7/7] Scheduler created"));
    assert!(logs.contains("Quickstart cluster qs-cli created"));
    assert!(logs.contains("Dashboard user:[admin], password:["));
}

#[tokio::test]
async fn test_create_with_config_file_and_snapshot() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("qs2");
    let config = dir.path().join("quickstart.toml");
    std::fs::write(
        &config,
        r#"
[kvdb]
host = "cache.local"
password = "kvdb-secret"

[cluster]
name = "from-file"
"#,
    )
    .unwrap();

    let output = zato_qs(
        &[
            "--config",
            config.to_str().unwrap(),
            "create",
            target.to_str().unwrap(),
            "--platform",
            "windows",
            "--store-config",
        ],
        dir.path(),
    )
    .await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("Quickstart cluster from-file created"));

    let snapshot =
        std::fs::read_to_string(target.join("zato.quickstart.config.toml")).unwrap();
    assert!(snapshot.contains("from-file"));
    assert!(snapshot.contains("cache.local"));
    assert!(!snapshot.contains("kvdb-secret"));

    let server = std::fs::read_to_string(target.join("server1/config/server.toml")).unwrap();
    assert!(server.contains("cache.local"));
}

#[tokio::test]
async fn test_create_fails_on_non_empty_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("leftover.txt"), "x").unwrap();

    let output = zato_qs(
        &["create", dir.path().to_str().unwrap(), "--platform", "windows"],
        dir.path(),
    )
    .await;

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("is not empty"));
    assert!(!dir.path().join("zato.db").exists());
}

#[tokio::test]
async fn test_create_rejects_zero_servers() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("qs3");

    let output = zato_qs(
        &[
            "create",
            target.to_str().unwrap(),
            "--platform",
            "windows",
            "--servers",
            "0",
        ],
        dir.path(),
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("cluster.servers must be at least 1"));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_create_rejects_unsupported_odb() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("qs4");

    let output = zato_qs(
        &[
            "create",
            target.to_str().unwrap(),
            "--platform",
            "posix",
            "--odb-type",
            "mysql",
            "--odb-host",
            "db.local",
            "--odb-user",
            "zato",
            "--odb-db-name",
            "zato",
        ],
        dir.path(),
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Unsupported ODB type: mysql"));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_create_rejects_unsafe_cluster_name() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("qs5");

    let output = zato_qs(
        &[
            "create",
            target.to_str().unwrap(),
            "--platform",
            "windows",
            "--cluster-name",
            "my cluster;x",
        ],
        dir.path(),
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("cluster.name"));
    assert!(!target.exists());
}
