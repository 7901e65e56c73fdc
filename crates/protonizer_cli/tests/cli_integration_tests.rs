//! Integration tests for the protonizer binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const MODULE: &str = r#"
variable "name" {
  type        = string
  description = "Name of the queue"
}

variable "retention" {
  type    = number
  default = 345600
}

output "queue_url" {
  description = "URL of the queue"
  value       = aws_sqs_queue.this.url
}
"#;

fn protonizer(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_protonizer"))
        .args(args)
        .env("RUST_LOG", "off")
        .env_remove("AWS_REGION")
        .env_remove("AWS_DEFAULT_REGION")
        .output()
        .expect("failed to run protonizer")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_protonize_writes_template() {
    let src = tempdir().unwrap();
    fs::write(src.path().join("main.tf"), MODULE).unwrap();
    let out = tempdir().unwrap();

    let output = protonizer(&[
        "protonize",
        "-n",
        "queue",
        "-s",
        path_arg(src.path()),
        "-o",
        path_arg(out.path()),
        "-b",
        "state-bucket",
    ]);
    assert!(output.status.success(), "{:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("template source outputted to"));

    let root = out.path().join("queue");
    for file in [
        "proton.yaml",
        "README.md",
        "schema/schema.yaml",
        "infrastructure/manifest.yaml",
        "infrastructure/main.tf",
        "infrastructure/variables.tf",
        "infrastructure/outputs.tf",
        "infrastructure/output.sh",
        "infrastructure/install-terraform.sh",
        "infrastructure/src/main.tf",
    ] {
        assert!(root.join(file).is_file(), "missing {}", file);
    }

    let config: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(root.join("proton.yaml")).unwrap()).unwrap();
    assert_eq!(config["name"].as_str(), Some("queue"));
    assert_eq!(config["type"].as_str(), Some("environment"));

    let schema: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(root.join("schema/schema.yaml")).unwrap())
            .unwrap();
    let properties = &schema["schema"]["types"]["EnvironmentInputType"]["properties"];
    assert!(properties.get("name").is_none());
    assert_eq!(properties["retention"]["default"].as_u64(), Some(345600));

    let main_tf = fs::read_to_string(root.join("infrastructure/main.tf")).unwrap();
    assert!(main_tf.contains("name = var.environment.name"));
    assert!(!main_tf.contains("inputs.name"));
    assert!(main_tf.contains("retention = var.environment.inputs.retention"));

    let manifest = fs::read_to_string(root.join("infrastructure/manifest.yaml")).unwrap();
    assert!(manifest.contains("state-bucket"));
}

#[test]
fn test_new_awsmanaged_service() {
    let out = tempdir().unwrap();

    let output = protonizer(&[
        "new",
        "-n",
        "api",
        "-t",
        "service",
        "-p",
        "awsmanaged",
        "--compatible-env",
        "net:1",
        "-o",
        path_arg(out.path()),
    ]);
    assert!(output.status.success(), "{:?}", output);

    let root = out.path().join("api");
    assert!(root.join("instance_infrastructure/manifest.yaml").is_file());
    assert!(root.join("instance_infrastructure/cloudformation.yaml").is_file());
    assert!(!root.join("instance_infrastructure/main.tf").exists());

    let config = fs::read_to_string(root.join("proton.yaml")).unwrap();
    assert!(config.contains("net:1"));
}

#[test]
fn test_new_codebuild_requires_state_bucket() {
    let out = tempdir().unwrap();

    let output = protonizer(&["new", "-n", "net", "-o", path_arg(out.path())]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!out.path().join("net").exists());
}

#[test]
fn test_invalid_compatible_env_is_usage_error() {
    let output = protonizer(&[
        "new",
        "-n",
        "api",
        "-t",
        "service",
        "--compatible-env",
        "net",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_service_without_compatible_env() {
    let src = tempdir().unwrap();
    fs::write(src.path().join("main.tf"), MODULE).unwrap();
    let out = tempdir().unwrap();

    let output = protonizer(&[
        "protonize",
        "-n",
        "queue",
        "-t",
        "service",
        "-s",
        path_arg(src.path()),
        "-o",
        path_arg(out.path()),
        "-b",
        "state",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!out.path().join("queue").exists());
}

#[test]
fn test_protonize_awsmanaged_rejected() {
    let src = tempdir().unwrap();
    fs::write(src.path().join("main.tf"), MODULE).unwrap();

    let output = protonizer(&[
        "protonize",
        "-n",
        "queue",
        "-s",
        path_arg(src.path()),
        "-p",
        "awsmanaged",
        "-b",
        "state",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_parse_error_exit_code() {
    let src = tempdir().unwrap();
    fs::write(src.path().join("main.tf"), "variable \"broken\" {\n  type = \n").unwrap();
    let out = tempdir().unwrap();

    let output = protonizer(&[
        "protonize",
        "-n",
        "broken",
        "-s",
        path_arg(src.path()),
        "-o",
        path_arg(out.path()),
        "-b",
        "state",
    ]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_publish_without_bucket_fails_before_aws() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("proton.yaml");
    fs::write(
        &config,
        "name: net\ntype: environment\ndisplayName: net\ndescription: network\n",
    )
    .unwrap();

    let output = protonizer(&["publish", "-f", path_arg(&config)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("publishBucket"));
    assert!(!dir.path().join("bundle.tar.gz").exists());
}
