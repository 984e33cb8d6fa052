//! Integration tests for typegen
//!
//! build.rs runs the generator over the fixtures in `fixtures/` and writes
//! the declaration files to OUT_DIR. These tests check the generated text
//! and exercise verify mode against files on disk.

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use typegen::codegen::DialectKind;
use typegen::{CodegenBuilder, CodegenError};

// Include generated declarations from build.rs
const SQLITE_OUTPUT: &str = include_str!(concat!(env!("OUT_DIR"), "/db.d.ts"));
const POSTGRES_OUTPUT: &str = include_str!(concat!(env!("OUT_DIR"), "/postgres.d.ts"));
const POSTGRES_RUNTIME_OUTPUT: &str =
    include_str!(concat!(env!("OUT_DIR"), "/postgres-runtime.d.ts"));

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

fn sqlite_builder(out_file: &Path) -> CodegenBuilder {
    CodegenBuilder::new(fixture("sqlite-schema.sql"))
        .dialect(DialectKind::Sqlite)
        .out_file(out_file)
        .camel_case(true)
}

// ============================================================================
// Generated output
// ============================================================================

#[test]
fn test_sqlite_output_from_cargo_metadata() {
    let expected = r#"/**
 * This file was generated by typegen.
 * Please do not edit it manually.
 */

import type { ColumnType } from "kysely";

export type Generated<T> = T extends ColumnType<infer S, infer I, infer U>
  ? ColumnType<S, I | undefined, U>
  : ColumnType<T, T | undefined, T>;

export interface FooBar {
  id: Generated<number>;
  userName: string;
  userStatus: string | null;
  score: number | null;
  priority: "high" | "low" | null;
}

export interface DB {
  fooBar: FooBar;
}
"#;
    assert_eq!(SQLITE_OUTPUT, expected);
}

#[test]
fn test_postgres_enum_is_literal_union() {
    assert!(POSTGRES_OUTPUT.contains("export type Status = \"active\" | \"inactive\";"));
    assert!(POSTGRES_OUTPUT.contains("  status: Generated<Status>;\n"));
}

#[test]
fn test_postgres_columns() {
    assert!(POSTGRES_OUTPUT.contains("export interface Account {\n  id: Generated<number>;\n"));
    assert!(POSTGRES_OUTPUT.contains("  /**\n   * Login address\n   */\n  email: string;\n"));
    assert!(POSTGRES_OUTPUT.contains("  tags: string[] | null;\n"));
    assert!(POSTGRES_OUTPUT.contains("  createdAt: Generated<Timestamp>;\n"));
    assert!(POSTGRES_OUTPUT.contains("export type Timestamp = ColumnType<Date, Date | string, Date | string>;"));
}

#[test]
fn test_postgres_second_table() {
    assert!(POSTGRES_OUTPUT.contains("export interface AuditLog {\n  id: Generated<Int8>;\n  accountId: number;\n  payload: Json | null;\n}"));
    assert!(POSTGRES_OUTPUT.contains("export type Int8 = "));
    assert!(POSTGRES_OUTPUT.contains("export type Json = "));
    assert!(POSTGRES_OUTPUT.ends_with("export interface DB {\n  accounts: Account;\n  activeAccounts: ActiveAccount;\n  auditLogs: AuditLog;\n}\n"));
}

#[test]
fn test_postgres_view_is_typed_from_its_table() {
    assert!(POSTGRES_OUTPUT.contains("export interface ActiveAccount {\n  id: number | null;\n  /**\n   * Login address\n   */\n  email: string | null;\n}"));
}

#[test]
fn test_postgres_declarations_are_emitted_once() {
    assert_eq!(POSTGRES_OUTPUT.matches("export type Generated<T>").count(), 1);
    assert_eq!(POSTGRES_OUTPUT.matches("export type Status ").count(), 1);
    // No array columns of enums, so the array helpers stay out
    assert!(!POSTGRES_OUTPUT.contains("ArrayType"));
}

#[test]
fn test_postgres_runtime_enum() {
    assert!(POSTGRES_RUNTIME_OUTPUT
        .contains("export enum Status {\n  Active = \"active\",\n  Inactive = \"inactive\",\n}"));
    assert!(POSTGRES_RUNTIME_OUTPUT.contains("  status: Generated<Status>;\n"));
    assert!(!POSTGRES_RUNTIME_OUTPUT.contains("export type Status "));
}

#[test]
fn test_postgres_override_with_custom_import() {
    assert!(POSTGRES_RUNTIME_OUTPUT
        .contains("import type { Instant as InstantString } from \"./scalars\";\n"));
    assert!(POSTGRES_RUNTIME_OUTPUT.contains("  created_at: InstantString;\n"));
    // Without camelCase or singularization the raw names are kept
    assert!(POSTGRES_RUNTIME_OUTPUT.contains("  audit_logs: AuditLogs;\n"));
}

// ============================================================================
// Verify mode
// ============================================================================

#[test]
fn test_verify_matches_generated_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_file = dir.path().join("db.d.ts");

    let written = sqlite_builder(&out_file).generate().unwrap();
    assert_eq!(written, SQLITE_OUTPUT);

    let verified = sqlite_builder(&out_file).verify().generate().unwrap();
    assert_eq!(verified, written);
    assert_eq!(std::fs::read_to_string(&out_file).unwrap(), written);
}

#[test]
fn test_verify_reports_diff() {
    let dir = tempfile::tempdir().unwrap();
    let out_file = dir.path().join("db.d.ts");
    std::fs::write(&out_file, SQLITE_OUTPUT.replace("score: number | null;", "score: number;"))
        .unwrap();

    match sqlite_builder(&out_file).verify().generate() {
        Err(CodegenError::VerifyMismatch { path, diff }) => {
            assert_eq!(path, out_file);
            assert!(diff.contains("-  score: number;\n"));
            assert!(diff.contains("+  score: number | null;\n"));
        }
        other => panic!("expected a verify mismatch, got {:?}", other),
    }

    // Verify never rewrites the file
    assert!(std::fs::read_to_string(&out_file)
        .unwrap()
        .contains("score: number;"));
}

#[test]
fn test_verify_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out_file = dir.path().join("missing.d.ts");

    let result = sqlite_builder(&out_file).verify().generate();
    assert!(matches!(result, Err(CodegenError::VerifyMismatch { .. })));
    assert!(!out_file.exists());
}

#[test]
fn test_print_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let out_file = dir.path().join("db.d.ts");

    let printed = sqlite_builder(&out_file).print().generate().unwrap();
    assert_eq!(printed, SQLITE_OUTPUT);
    assert!(!out_file.exists());
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_include_and_exclude_patterns() {
    let dir = tempfile::tempdir().unwrap();
    let out_file = dir.path().join("db.d.ts");

    let output = CodegenBuilder::new(fixture("postgres-schema.sql"))
        .dialect(DialectKind::Postgres)
        .out_file(&out_file)
        .include_pattern("public.*")
        .exclude_pattern("audit_*")
        .print()
        .generate()
        .unwrap();

    assert!(output.contains("export interface Accounts {"));
    assert!(!output.contains("AuditLogs"));
    // Json is only referenced by the excluded table
    assert!(!output.contains("export type Json"));
}
