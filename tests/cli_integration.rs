use assert_cmd::Command;
use pendingdb::database_file::DatabaseFile;
use pendingdb::descriptor::FileReference;
use predicates::prelude::*;
use std::path::Path;

const ENTRY: &str = "6f1c1d5e-7c1a-4a53-9d64-3c6f0b8c2b11";

fn pendingdb(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pendingdb").unwrap();
    cmd.env("PENDINGDB_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn init_db(home: &Path, db: &Path) {
    pendingdb(home)
        .arg("init")
        .arg(db)
        .arg("--name")
        .arg("Vault")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database created"));
}

#[test]
fn test_queue_show_and_apply() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    let db = home.join("vault.json");
    init_db(home, &db);

    pendingdb(home)
        .args(["create", db.to_str().unwrap(), "--uuid", ENTRY])
        .args(["--title", "Mail", "--username", "alice", "--password", "s3cret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued 2 operation(s)"));

    pendingdb(home)
        .arg("status")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 pending operation(s) for local:vault.json"));

    pendingdb(home)
        .arg("show")
        .arg(&db)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("createEntry")
                .and(predicate::str::contains("editEntry"))
                .and(predicate::str::contains("Title = Mail"))
                .and(predicate::str::contains("s3cret").not()),
        );

    // Nothing is written to the database until apply.
    let file = DatabaseFile::load(FileReference::new(&db)).unwrap();
    assert_eq!(file.database.root.entry_count(), 0);

    pendingdb(home)
        .arg("apply")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 2 pending operation(s)"));

    pendingdb(home)
        .arg("status")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending transaction"));

    let file = DatabaseFile::load(FileReference::new(&db)).unwrap();
    let entry = file.database.find_entry(ENTRY.parse().unwrap()).unwrap();
    assert_eq!(entry.title(), "Mail");
    assert_eq!(entry.user_name(), "alice");
}

#[test]
fn test_add_url_with_apply() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    let db = home.join("vault.json");
    init_db(home, &db);

    pendingdb(home)
        .args(["create", db.to_str().unwrap(), "--uuid", ENTRY, "--apply"])
        .args(["--url", "https://a.example"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied and saved 2 operation(s)"));

    pendingdb(home)
        .args(["add-url", db.to_str().unwrap(), ENTRY, "https://b.example", "--apply"])
        .assert()
        .success();

    let file = DatabaseFile::load(FileReference::new(&db)).unwrap();
    let entry = file.database.find_entry(ENTRY.parse().unwrap()).unwrap();
    let urls: Vec<_> = entry.url_fields().map(|f| f.value.as_str()).collect();
    assert_eq!(urls, vec!["https://a.example", "https://b.example"]);

    pendingdb(home)
        .arg("status")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending transaction"));
}

#[test]
fn test_apply_recovers_missing_entry() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    let db = home.join("vault.json");
    init_db(home, &db);

    pendingdb(home)
        .args(["edit", db.to_str().unwrap(), ENTRY, "--set", "Title=Orphan"])
        .assert()
        .success();

    pendingdb(home)
        .arg("apply")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recovered Entries"));

    let file = DatabaseFile::load(FileReference::new(&db)).unwrap();
    let entry = file.database.find_entry(ENTRY.parse().unwrap()).unwrap();
    assert_eq!(entry.title(), "Orphan");
    assert!(file.database.root.entries.is_empty());
    assert_eq!(file.database.root.groups.len(), 1);
}

#[test]
fn test_discard_drops_queue() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    let db = home.join("vault.json");
    init_db(home, &db);

    pendingdb(home)
        .args(["add-url", db.to_str().unwrap(), ENTRY, "https://b.example"])
        .assert()
        .success();

    pendingdb(home)
        .arg("discard")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("discarded"));

    pendingdb(home)
        .arg("show")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending operations."));
}

#[test]
fn test_init_refuses_existing_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    let db = home.join("vault.json");
    init_db(home, &db);

    pendingdb(home)
        .arg("init")
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_reports_store_dir() {
    let temp_dir = tempfile::tempdir().unwrap();

    pendingdb(temp_dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("store-dir")
                .and(predicate::str::contains("Recovered Entries")),
        );
}
