use modelsight_fs::{Workspace, atomic_read, atomic_write, ensure_dir, file_size};
use tempfile::tempdir;

#[test]
fn test_staged_download_lifecycle() {
    let dir = tempdir().unwrap();
    let models = dir.path().join("models");
    ensure_dir(&models).unwrap();

    let dest = models.join("0123456789abcdef_skull.glb");
    let ws = Workspace::new(models.join(".staging"), &dest).unwrap().keep_partial(true);
    std::fs::write(ws.path(), vec![7u8; 64]).unwrap();
    assert_eq!(file_size(&dest).unwrap(), None);

    let committed = ws.commit().unwrap();
    assert_eq!(file_size(&committed).unwrap(), Some(64));
}

#[test]
fn test_atomic_write_creates_parent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("session.json");
    atomic_write(&path, b"{\"currentModelUri\":\"/tmp/a.glb\"}").unwrap();
    assert_eq!(
        atomic_read(&path).unwrap(),
        b"{\"currentModelUri\":\"/tmp/a.glb\"}"
    );
}

#[test]
fn test_atomic_read_missing_reports_path() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = atomic_read(&missing).unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}
