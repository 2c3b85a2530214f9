use anyhow::Result;

use crate::{CliTest, run};

const MODEL_TS: &str = r#"export class Thing {
  greeting(): string {
    return "hi";
  }
}
"#;

const ROUTES_TS: &str = r#"import { Thing } from "./model";

// @Route("/things", Thing.greeting)
export function handler(thing: Thing): string {
  return thing.greeting();
}
"#;

#[test]
fn test_check_clean_project() -> Result<()> {
    let test = CliTest::with_file("src/model.ts", MODEL_TS)?;
    test.write_file("src/routes.ts", ROUTES_TS)?;

    let out = run(&mut test.check_command())?;
    assert_eq!(out.code, Some(0), "stdout: {}", out.stdout);
    assert!(
        out.stdout
            .contains("Checked 2 source files, 1 annotation - no issues found")
    );

    Ok(())
}

#[test]
fn test_check_reports_parse_error_with_source_line() -> Result<()> {
    let test = CliTest::with_file(
        "src/app.ts",
        r#"export class Thing {}

// @Broken(1 + 1)
export function handler(): void {}
"#,
    )?;

    let out = run(&mut test.check_command())?;
    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains("--> src/app.ts:3:12"));
    assert!(out.stdout.contains(r#"error: Broken(1 + 1): unsupported syntax "1 + 1""#));
    assert!(out.stdout.contains("3 | // @Broken(1 + 1)"));
    assert!(out.stdout.contains("1 problems (1 error, 0 warnings)"));

    Ok(())
}

#[test]
fn test_check_unresolved_reference_is_a_warning() -> Result<()> {
    let test = CliTest::with_file(
        "src/app.ts",
        r#"// @Uses(Missing)
export function handler(): void {}
"#,
    )?;

    let out = run(&mut test.check_command())?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains(r#"warning: cannot resolve "Missing""#));
    assert!(out.stdout.contains("0 errors, 1 warning"));

    Ok(())
}

#[test]
fn test_check_strict_flag_fails_on_warnings() -> Result<()> {
    let test = CliTest::with_file(
        "src/app.ts",
        r#"// @Uses(Missing)
export function handler(): void {}
"#,
    )?;

    let out = run(test.check_command().arg("--strict"))?;
    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains(r#"error: cannot resolve "Missing""#));

    Ok(())
}

#[test]
fn test_check_strict_from_config() -> Result<()> {
    let test = CliTest::with_file(
        "src/app.ts",
        r#"// @Uses(Missing)
export function handler(): void {}
"#,
    )?;
    test.write_file(".notaterc.json", r#"{ "strict": true }"#)?;

    let out = run(&mut test.check_command())?;
    assert_eq!(out.code, Some(1));

    Ok(())
}

#[test]
fn test_check_respects_ignores_and_test_files() -> Result<()> {
    let test = CliTest::with_file("src/app.ts", "export const ok = 1;\n")?;
    test.write_file("src/app.test.ts", "// @Broken(1 + 1)\nexport const t = 1;\n")?;
    test.write_file("gen/out.ts", "// @Broken(1 + 1)\nexport const g = 1;\n")?;
    test.write_file(".notaterc.json", r#"{ "ignores": ["gen"] }"#)?;

    let out = run(&mut test.check_command())?;
    assert_eq!(out.code, Some(0), "stdout: {}", out.stdout);
    assert!(out.stdout.contains("Checked 1 source file, 0 annotations"));

    Ok(())
}

#[test]
fn test_check_source_root() -> Result<()> {
    let test = CliTest::with_file("web/src/model.ts", MODEL_TS)?;
    test.write_file("web/src/routes.ts", ROUTES_TS)?;

    let out = run(test.check_command().args(["--source-root", "web"]))?;
    assert_eq!(out.code, Some(0), "stdout: {}", out.stdout);
    assert!(out.stdout.contains("Checked 2 source files"));

    Ok(())
}

#[test]
fn test_check_empty_project() -> Result<()> {
    let test = CliTest::new()?;

    let out = run(&mut test.check_command())?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("Checked 0 source files"));

    Ok(())
}

#[test]
fn test_check_invalid_config_is_fatal() -> Result<()> {
    let test = CliTest::with_file("src/app.ts", "export const ok = 1;\n")?;
    test.write_file(".notaterc.json", "{ nope")?;

    let out = run(&mut test.check_command())?;
    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("Error: Failed to parse config file"));

    Ok(())
}

#[test]
fn test_check_missing_source_root_is_fatal() -> Result<()> {
    let test = CliTest::new()?;

    let out = run(test.check_command().args(["--source-root", "nope"]))?;
    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("source root is not a directory"));

    Ok(())
}
