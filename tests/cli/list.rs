use anyhow::Result;
use serde_json::Value;

use crate::{CliTest, run};

const APP_TS: &str = r#"export class Thing {
  greeting(): string {
    return "hi";
  }
}

// @Route("/things", Thing.greeting)
// @Cached(30)
export function handler(thing: Thing): string {
  return thing.greeting();
}

// @Route("/missing", Missing)
export function other(): void {}
"#;

#[test]
fn test_list_text() -> Result<()> {
    let test = CliTest::with_file("src/app.ts", APP_TS)?;

    let out = run(&mut test.list_command())?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains(r#"Route("/things", Thing.greeting)"#));
    assert!(out.stdout.contains("--> src/app.ts:7:5"));
    assert!(out.stdout.contains(r#"= arg 0: "/things" (string)"#));
    assert!(out.stdout.contains("= arg 1: Thing.greeting -> "));
    assert!(out.stdout.contains("= arg 0: 30 (int)"));
    assert!(out.stdout.contains("= arg 1: Missing (unresolved: "));
    assert!(out.stdout.contains("3 annotations"));
    // The unresolved reference is only hinted at.
    assert!(out.stderr.contains("1 problem(s) found"));

    Ok(())
}

#[test]
fn test_list_filter_by_name() -> Result<()> {
    let test = CliTest::with_file("src/app.ts", APP_TS)?;

    let out = run(test.list_command().args(["--name", "Cached"]))?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("Cached(30)"));
    assert!(!out.stdout.contains("Route("));
    assert!(out.stdout.contains("1 annotation"));

    let out = run(test.list_command().args(["--name", "Nope"]))?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("No annotations named Nope"));

    Ok(())
}

#[test]
fn test_list_json() -> Result<()> {
    let test = CliTest::with_file("src/app.ts", APP_TS)?;

    let out = run(test.list_command().args(["--name", "Route", "--json"]))?;
    assert_eq!(out.code, Some(0));

    let entries: Value = serde_json::from_str(&out.stdout)?;
    let entries = entries.as_array().expect("a JSON array");
    assert_eq!(entries.len(), 2);

    let first = &entries[0];
    assert_eq!(first["name"], "Route");
    assert_eq!(first["location"]["file_path"], "src/app.ts");
    assert_eq!(first["location"]["line"], 7);
    assert!(first["anchor"].as_str().unwrap().contains("handler"));
    assert_eq!(first["arguments"][0]["kind"], "string");
    assert_eq!(first["arguments"][0]["value"], "/things");
    assert_eq!(first["arguments"][1]["kind"], "reference");
    assert_eq!(first["arguments"][1]["path"], "Thing.greeting");
    assert!(first["arguments"][1]["resolution"].is_array());

    let second = &entries[1];
    assert!(second["arguments"][1]["resolution"]["error"].is_string());

    Ok(())
}

#[test]
fn test_list_parse_errors_do_not_fail() -> Result<()> {
    let test = CliTest::with_file("src/app.ts", "// @Broken(1 + 1)\nexport const x = 1;\n")?;

    let out = run(&mut test.list_command())?;
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("No annotations found"));
    assert!(out.stderr.contains("1 problem(s) found"));

    Ok(())
}
