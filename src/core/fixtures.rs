//! TypeScript sources shared by the unit tests.
//!
//! `annotations.ts` exercises every kind of declaration the scanner visits,
//! references into `fmt.ts`, and the malformed annotations whose errors the
//! tests pin down.

use crate::core::{
    parse::{Scanned, scan},
    source::{Load, Loader, SourceModel, SymbolId},
};

pub const ANNOTATIONS_PATH: &str = "src/annotations.ts";
pub const FMT_PATH: &str = "src/fmt.ts";

pub const ANNOTATIONS_TS: &str = r#"/*
@OnLoneImport()
*/
import * as fmt from "./fmt";

import {
  // @OnNamedImport()
  sprintf,
  // @OnNormalImport()
  Stringer,
} from "./fmt";

// @OnSideEffectImport()
import "./polyfill";

// @OnType()
export class Thing {
  // @OnField()
  age: number = 0;

  // @OnMethod()
  greeting(): string {
    return "hello";
  }

  static create(): Thing {
    return new Thing();
  }
}

// @OnFunc(describe)
export function describe(thing: Thing): string {
  const local = thing.greeting();
  return local;
}

// @OnLoneVar()
const someVar = 5;

// @OnDoubleVar()
let two = 3, together = 4;

let
  // @OnFirstOfGroup()
  first = 1,
  // @OnSecondOfGroup()
  second = 2;

export enum Color {
  // @OnEnumMember()
  Red,
  Blue,
}

const current: Thing | null = new Thing();

// @Literals("a string", 5, -0.125)
// @LocalRefs(Thing, Thing.greeting)
// @RemoteRefs(fmt.sprintf, fmt.Stringer, sprintf, Stringer.toString)
// @ValueRefs(current.greeting, current.age, Thing.create, Color.Red)
export type Magnitude = {
  // @OnLiteralField()
  value: number;
};

// @BrokenRefs(Missing, Thing.nope, Missing.deeper.still)
// @NotACall.Foo.Bar + 1
// @BadCallSyntax(foo bar)
// @BadCallMath(1 + 1)
// @BadCallFn(-555, Foo.Bar())
type Foo = string;

/* @NotOnOpeningLine() */
// @Detached()

// @Attached()
function helper(): void {}

export { someVar, first as primary };
"#;

pub const FMT_TS: &str = r#"export interface Stringer {
  toString(): string;
}

export function sprintf(format: string, ...args: unknown[]): string {
  return format;
}

export default class Printer {
  print(value: Stringer): void {}
}
"#;

pub fn loader() -> Loader {
    let mut loader = Loader::new();
    loader
        .include_source(ANNOTATIONS_PATH, ANNOTATIONS_TS)
        .include_source(FMT_PATH, FMT_TS);
    loader
}

pub fn model() -> SourceModel {
    let loaded = loader().load().unwrap();
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    loaded.model
}

pub fn scanned() -> (SourceModel, Scanned) {
    let model = model();
    let scanned = scan(&model);
    (model, scanned)
}

/// Model-wide lookup by `Kind name` display, e.g. `"method greeting"`.
pub fn symbol(model: &SourceModel, display: &str) -> SymbolId {
    let matches: Vec<SymbolId> = (0..model.symbols.len())
        .map(SymbolId::from_index)
        .filter(|id| model.symbol(*id).to_string() == display)
        .collect();
    assert_eq!(matches.len(), 1, "{display}: {matches:?}");
    matches[0]
}
