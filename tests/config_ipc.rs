mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar_with_env, temp_dir, write_fixtures};

#[test]
fn config_file_supplies_sources_and_class_size() {
    let dir = temp_dir("artplanner-config");
    let sources = write_fixtures(&dir);
    let config_path = dir.join("artplanner.json");
    std::fs::write(
        &config_path,
        serde_json::to_string(&json!({ "sources": sources, "defaultClassSize": 18 })).expect("json"),
    )
    .expect("write config");

    let config = config_path.to_string_lossy().to_string();
    let (mut child, mut stdin, mut reader) =
        spawn_sidecar_with_env(&[("ARTPLANNER_CONFIG", config.as_str())]);

    let selection = request_ok(&mut stdin, &mut reader, "1", "selection.get", json!({}));
    assert_eq!(selection["selection"]["classSize"], json!(18));

    let loaded = request_ok(&mut stdin, &mut reader, "2", "catalog.load", json!({}));
    assert_eq!(loaded["counts"]["videos"], json!(3));

    let _ = child.kill();
}

#[test]
fn env_override_replaces_one_source() {
    let dir = temp_dir("artplanner-config-env");
    let sources = write_fixtures(&dir);
    let only_one = dir.join("one-video.csv");
    std::fs::write(
        &only_one,
        "channel_name,link,grade_levels\nCassie Stephens,https://www.youtube.com/@cassiestephens,elementary\n",
    )
    .expect("write");
    let config_path = dir.join("artplanner.json");
    std::fs::write(
        &config_path,
        serde_json::to_string(&json!({ "sources": sources })).expect("json"),
    )
    .expect("write config");

    let config = config_path.to_string_lossy().to_string();
    let videos = only_one.to_string_lossy().to_string();
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with_env(&[
        ("ARTPLANNER_CONFIG", config.as_str()),
        ("ARTPLANNER_VIDEOS_SOURCE", videos.as_str()),
    ]);

    let loaded = request_ok(&mut stdin, &mut reader, "1", "catalog.load", json!({}));
    assert_eq!(loaded["counts"]["videos"], json!(1));
    assert_eq!(loaded["counts"]["standards"], json!(4));

    let _ = child.kill();
}

#[test]
fn class_size_env_beats_config_file_and_is_clamped() {
    let dir = temp_dir("artplanner-config-class");
    let config_path = dir.join("artplanner.json");
    std::fs::write(&config_path, r#"{ "defaultClassSize": 18 }"#).expect("write config");

    let config = config_path.to_string_lossy().to_string();
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with_env(&[
        ("ARTPLANNER_CONFIG", config.as_str()),
        ("ARTPLANNER_DEFAULT_CLASS_SIZE", "32"),
    ]);
    let selection = request_ok(&mut stdin, &mut reader, "1", "selection.get", json!({}));
    assert_eq!(selection["selection"]["classSize"], json!(32));
    let _ = child.kill();

    let (mut child, mut stdin, mut reader) =
        spawn_sidecar_with_env(&[("ARTPLANNER_DEFAULT_CLASS_SIZE", "400")]);
    let selection = request_ok(&mut stdin, &mut reader, "1", "selection.get", json!({}));
    assert_eq!(selection["selection"]["classSize"], json!(60));
    let _ = child.kill();
}
