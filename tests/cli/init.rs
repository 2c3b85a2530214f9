use anyhow::{Context, Result};
use serde_json::Value;

use crate::{CliTest, run};

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    assert_eq!(parsed["includes"], serde_json::json!(["."]));
    assert_eq!(parsed["ignores"], serde_json::json!([]));
    assert_eq!(parsed["ignoreTestFiles"], true);
    assert_eq!(parsed["strict"], false);

    assert!(
        content.contains("  "),
        "Config should use 2-space indentation"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let out = run(test.command().arg("init"))?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("Created .notaterc.json"));

    assert!(test.root().join(".notaterc.json").exists());
    let content = test.read_file(".notaterc.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".notaterc.json", "{}")?;

    let out = run(test.command().arg("init"))?;
    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("Error: .notaterc.json already exists"));
    assert_eq!(test.read_file(".notaterc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::with_file("src/app.ts", "// @Tag()\nexport const x = 1;\n")?;

    let out = run(test.command().arg("init"))?;
    assert_eq!(out.code, Some(0));

    let out = run(&mut test.check_command())?;
    assert_eq!(out.code, Some(0), "stdout: {}", out.stdout);
    assert!(out.stdout.contains("Checked 1 source file, 1 annotation"));

    Ok(())
}

#[test]
fn test_no_command_prints_help() -> Result<()> {
    let test = CliTest::new()?;

    let out = run(&mut test.command())?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("Usage:"));

    Ok(())
}
