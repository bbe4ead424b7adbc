//! End-to-end generation tests: tables in, artefacts on disk.

use std::path::Path;
use std::sync::atomic::Ordering;

use chrono::{TimeZone, Utc};
use flattables::{
    compile_schema, generate, tidy, ArtifactCategory, BuildOptions, Cell, CodegenError, Column,
    CompilerOptions, OutputLayout, RenderOptions, SourceFormatter, Table, TableSet, TablesError,
    Targets, WriteOutcome,
};

fn build_options() -> BuildOptions {
    BuildOptions {
        generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        ..BuildOptions::new("demo_tables::Demo")
    }
}

fn render_options(base: &Path) -> RenderOptions {
    let mut options = RenderOptions::new(OutputLayout::for_namespace(base, "Demo"));
    options.formatter = SourceFormatter::Disabled;
    options
}

fn demo_set() -> TableSet {
    let mut set = TableSet::new("Demo");
    set.push_table(Table::new(
        "User",
        vec![Column::new("name", "string"), Column::new("id", "uint64")],
    ))
    .unwrap();
    set
}

fn planets_set() -> TableSet {
    let toml = r#"
name = "Demo"

[[tables]]
name = "Planet"
columns = [
    { name = "name", type = "string" },
    { name = "mass", type = "float64" },
    { name = "habitable", type = "bool" },
]
rows = [
    ["Earth", 5.97e24, true],
    ["Mars", 6.42e23, false],
]

[[tables]]
name = "Moon"
columns = [
    { name = "name", type = "string" },
    { name = "orbitRadius", type = "uint32" },
]
rows = [["Luna", 384400]]

[[tables]]
name = "Tag"
columns = [{ name = "label", type = "string" }]
"#;
    TableSet::from_toml(toml).unwrap()
}

fn file_count(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    walk(dir)
}

fn walk(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let path = e.unwrap().path();
            if path.is_dir() {
                walk(&path)
            } else {
                1
            }
        })
        .sum()
}

#[test]
fn demo_user_schema() {
    let dir = tempfile::tempdir().unwrap();
    generate(&demo_set(), &build_options(), &render_options(dir.path())).unwrap();

    let schema = std::fs::read_to_string(dir.path().join("Demo/Demo.fbs")).unwrap();
    assert!(schema.contains("namespace Demo;"), "{schema}");
    assert!(schema.contains("table User {"), "{schema}");
    assert!(schema.contains("name : [string] ;"), "{schema}");
    assert!(schema.contains("id : [ulong] ;"), "{schema}");
    assert!(schema.contains("root_type User;"), "{schema}");
    assert!(schema.contains("// column type: uint64"), "{schema}");
}

#[test]
fn writes_every_flatbuffers_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate(&demo_set(), &build_options(), &render_options(dir.path())).unwrap();

    for file in [
        "Demo/Demo.fbs",
        "Demo/README.md",
        "Demo/Demo_to_flatbuffers.rs",
        "Demo/Demo_from_flatbuffers.rs",
        "Demo/Demo_rows.rs",
        "Demo/Demo_helpers.rs",
        "Demo/Demo_test.rs",
        "Demo_main/Demo_main.rs",
    ] {
        assert!(dir.path().join(file).is_file(), "missing {file}");
    }
    assert_eq!(report.artifacts.len(), 8);
    assert_eq!(report.written(), 8);
    assert_eq!(
        report.schema_path(),
        Some(dir.path().join("Demo/Demo.fbs").as_path())
    );
    assert!(!dir.path().join("Demo/Demo.graphql").exists());
}

#[test]
fn schema_has_one_block_per_table() {
    let set = planets_set();
    let dir = tempfile::tempdir().unwrap();
    let report = generate(&set, &build_options(), &render_options(dir.path())).unwrap();
    let schema = &report.artifacts[0].contents;

    let lines: Vec<&str> = schema.lines().collect();
    let blocks: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.starts_with("table "))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(blocks.len(), set.table_count());

    for (block, table) in blocks.iter().zip(&set.tables) {
        assert_eq!(lines[*block], format!("table {} {{", table.name));
        let fields = lines[block + 1..]
            .iter()
            .take_while(|l| **l != "}")
            .filter(|l| l.contains(" : ["))
            .count();
        assert_eq!(fields, table.col_count(), "fields of [{}]", table.name);
    }

    let roots: Vec<&&str> = lines.iter().filter(|l| l.starts_with("root_type ")).collect();
    assert_eq!(roots, [&"root_type Planet;"]);
}

#[test]
fn generated_rust_parses() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate(&planets_set(), &build_options(), &render_options(dir.path())).unwrap();
    for artifact in &report.artifacts {
        if artifact.path.extension().is_some_and(|e| e == "rs") {
            if let Err(e) = syn::parse_file(&artifact.contents) {
                panic!("{} does not parse: {e}\n{}", artifact.path.display(), artifact.contents);
            }
        }
    }
}

#[test]
fn generated_code_embeds_rows() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate(&planets_set(), &build_options(), &render_options(dir.path())).unwrap();
    let helpers = report
        .artifacts
        .iter()
        .find(|a| a.task == "helpers")
        .unwrap();
    assert!(helpers.contents.contains("Cell::from(\"Earth\")"), "{}", helpers.contents);
    assert!(helpers.contents.contains("Cell::from(384400u32)"), "{}", helpers.contents);
    assert!(helpers.contents.contains("Cell::from(true)"), "{}", helpers.contents);
    assert!(helpers.contents.contains("pub enum DemoError"), "{}", helpers.contents);

    let rows = report.artifacts.iter().find(|a| a.task == "rows").unwrap();
    assert!(rows.contents.contains("pub orbit_radius: u32,"), "{}", rows.contents);
}

#[test]
fn headers_carry_provenance() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate(&demo_set(), &build_options(), &render_options(dir.path())).unwrap();
    let to_fb = report
        .artifacts
        .iter()
        .find(|a| a.task == "to_flatbuffers")
        .unwrap();
    assert!(to_fb.contents.starts_with("// Demo_to_flatbuffers.rs\n"), "{}", to_fb.contents);
    assert!(to_fb.contents.contains("9:30 AM Sunday 1 Mar 2026"), "{}", to_fb.contents);
    assert!(
        to_fb.contents.contains("flattablesc generate -f '<tables file>' -n Demo -p demo_tables::Demo"),
        "{}",
        to_fb.contents
    );
    assert!(
        to_fb.contents.contains("use flatbuffers::{FlatBufferBuilder, WIPOffset};"),
        "{}",
        to_fb.contents
    );
}

#[test]
fn deprecated_columns_stay_in_schema_only() {
    let mut set = TableSet::new("Demo");
    let mut user = Table::new(
        "User",
        vec![
            Column::new("name", "string"),
            Column::new("age_DEPRECATED_", "uint8"),
        ],
    );
    user.push_row(vec![Cell::from("Zaphod"), Cell::from(42u8)]).unwrap();
    set.push_table(user).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let report = generate(&set, &build_options(), &render_options(dir.path())).unwrap();

    let schema = &report.artifacts[0].contents;
    assert!(schema.contains("age : [ubyte] (deprecated) ;"), "{schema}");
    assert!(!schema.contains("_DEPRECATED_ :"), "{schema}");

    let to_fb = report
        .artifacts
        .iter()
        .find(|a| a.task == "to_flatbuffers")
        .unwrap();
    assert!(!to_fb.contents.contains("age_vec"), "{}", to_fb.contents);
    assert!(to_fb.contents.contains("name_vec"), "{}", to_fb.contents);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = render_options(dir.path());
    options.dry_run = true;

    let report = generate(&demo_set(), &build_options(), &options).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.artifacts.len(), 8);
    assert!(report.artifacts.iter().all(|a| a.outcome == WriteOutcome::DryRun));
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn dry_run_matches_real_run() {
    let mut bad = TableSet::new("Demo");
    bad.push_table(Table::new("User", vec![Column::new("Name", "string")]))
        .unwrap();

    for set in [demo_set(), planets_set(), bad] {
        let real_dir = tempfile::tempdir().unwrap();
        let dry_dir = tempfile::tempdir().unwrap();
        let mut dry = render_options(dry_dir.path());
        dry.dry_run = true;

        let real = generate(&set, &build_options(), &render_options(real_dir.path()));
        let dry_result = generate(&set, &build_options(), &dry);

        match (real, dry_result) {
            (Ok(real), Ok(dry_report)) => {
                let contents = |r: &flattables::GenerationReport| {
                    r.artifacts.iter().map(|a| a.contents.clone()).collect::<Vec<_>>()
                };
                assert_eq!(contents(&real), contents(&dry_report));
            }
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            (a, b) => panic!("dry run diverged: {:?} vs {:?}", a.err(), b.err()),
        }
        assert_eq!(file_count(dry_dir.path()), 0);
    }
}

#[test]
fn upper_case_column_is_rejected() {
    let mut set = TableSet::new("Demo");
    set.push_table(Table::new("User", vec![Column::new("Name", "string")]))
        .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = generate(&set, &build_options(), &render_options(dir.path())).unwrap_err();
    match &err {
        CodegenError::NamingConvention { suggestion, .. } => assert_eq!(suggestion, "name"),
        other => panic!("expected NamingConvention, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 12);
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn unwidened_int_is_rejected() {
    let mut set = TableSet::new("Demo");
    set.push_table(Table::new("User", vec![Column::new("count", "int")]))
        .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = generate(&set, &build_options(), &render_options(dir.path())).unwrap_err();
    assert!(err.to_string().contains("int32 or int64"), "{err}");
}

#[test]
fn column_with_space_is_rejected() {
    let mut set = TableSet::new("Demo");
    set.push_table(Table::new(
        "User",
        vec![Column::new("first name", "string"), Column::new("id", "uint64")],
    ))
    .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = generate(&set, &build_options(), &render_options(dir.path())).unwrap_err();
    assert!(
        matches!(err, CodegenError::Tables(TablesError::InvalidName { ref name, .. }) if name == "first name"),
        "{err}"
    );
    assert!(err.to_string().contains("' ' is not allowed"), "{err}");
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn graphql_only_still_rejects_non_identifier_columns() {
    let mut set = TableSet::new("Demo");
    set.push_table(Table::new("User", vec![Column::new("a-b", "string")]))
        .unwrap();
    let build = BuildOptions {
        targets: Targets {
            flatbuffers: false,
            graphql: true,
        },
        ..build_options()
    };
    let dir = tempfile::tempdir().unwrap();

    let err = generate(&set, &build, &render_options(dir.path())).unwrap_err();
    assert_eq!(err.exit_code(), 10, "{err}");
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn deprecated_twin_of_a_column_is_rejected() {
    let mut set = TableSet::new("Demo");
    set.push_table(Table::new(
        "User",
        vec![Column::new("age", "uint8"), Column::new("age_deprecated_", "uint8")],
    ))
    .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = generate(&set, &build_options(), &render_options(dir.path())).unwrap_err();
    assert!(
        matches!(err, CodegenError::DuplicateColumn { ref table, ref column } if table == "User" && column == "age"),
        "{err}"
    );
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn empty_table_set_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = generate(&TableSet::new("Demo"), &build_options(), &render_options(dir.path()))
        .unwrap_err();
    assert!(matches!(err, CodegenError::NoTables { .. }), "{err}");
    assert_eq!(err.exit_code(), 18);
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn blank_namespace_is_rejected() {
    let mut set = demo_set();
    set.name = String::new();
    let dir = tempfile::tempdir().unwrap();

    let err = generate(&set, &build_options(), &render_options(dir.path())).unwrap_err();
    assert!(matches!(err, CodegenError::InvalidNamespace { .. }), "{err}");
    assert_eq!(err.exit_code(), 19);
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn digit_suffixed_columns_match_flatc_accessors() {
    let mut set = TableSet::new("Demo");
    let mut point = Table::new(
        "Point",
        vec![Column::new("x2", "float32"), Column::new("orbit10km", "uint32")],
    );
    point.push_row(vec![1.5f32.into(), 7u32.into()]).unwrap();
    set.push_table(point).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let report = generate(&set, &build_options(), &render_options(dir.path())).unwrap();
    let rows = report.artifacts.iter().find(|a| a.task == "rows").unwrap();
    assert!(rows.contents.contains("pub x_2: f32,"), "{}", rows.contents);
    assert!(rows.contents.contains("pub orbit_10km: u32,"), "{}", rows.contents);
}

#[test]
fn nan_cells_survive_the_generated_round_trip_test() {
    let mut set = TableSet::new("Demo");
    let mut reading = Table::new(
        "Reading",
        vec![Column::new("sensor", "string"), Column::new("value", "float64")],
    );
    reading.push_row(vec!["sensor-a".into(), f64::NAN.into()]).unwrap();
    reading.push_row(vec!["sensor-b".into(), 0.25f64.into()]).unwrap();
    set.push_table(reading).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let report = generate(&set, &build_options(), &render_options(dir.path())).unwrap();
    let helpers = report.artifacts.iter().find(|a| a.task == "helpers").unwrap();
    assert!(helpers.contents.contains("Cell::from(f64::NAN)"), "{}", helpers.contents);

    let test = report.artifacts.iter().find(|a| a.task == "test").unwrap();
    assert!(test.contents.contains("fn assert_same_rows"), "{}", test.contents);
    assert!(!test.contents.contains("), expected);"), "{}", test.contents);
    syn::parse_file(&test.contents).unwrap();
}

#[test]
fn second_run_leaves_files_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    generate(&demo_set(), &build_options(), &render_options(dir.path())).unwrap();
    let again = generate(&demo_set(), &build_options(), &render_options(dir.path())).unwrap();
    assert_eq!(again.written(), 0);
    assert!(again
        .artifacts
        .iter()
        .all(|a| a.outcome == WriteOutcome::Unchanged));
}

#[test]
fn abort_stops_before_first_write() {
    let dir = tempfile::tempdir().unwrap();
    let options = render_options(dir.path());
    options.abort.store(true, Ordering::SeqCst);

    let err = generate(&demo_set(), &build_options(), &options).unwrap_err();
    assert!(matches!(err, CodegenError::Aborted { ref task } if task == "schema"), "{err}");
    assert_eq!(err.exit_code(), 130);
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn graphql_only_writes_graphql_schema() {
    let mut set = TableSet::new("Demo");
    set.push_table(Table::new(
        "User",
        vec![Column::new("name", "string"), Column::new("score", "float64")],
    ))
    .unwrap();
    let build = BuildOptions {
        targets: Targets {
            flatbuffers: false,
            graphql: true,
        },
        ..build_options()
    };
    let dir = tempfile::tempdir().unwrap();

    let report = generate(&set, &build, &render_options(dir.path())).unwrap();
    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.artifacts[0].category, ArtifactCategory::GraphQl);
    assert!(report.schema_path().is_none());

    let sdl = std::fs::read_to_string(dir.path().join("Demo/Demo.graphql")).unwrap();
    assert!(sdl.contains("type User {"), "{sdl}");
    assert!(sdl.contains("score: [Float!]!"), "{sdl}");
    assert!(sdl.contains("user: User"), "{sdl}");
}

#[test]
fn rendered_output_is_already_tidy() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate(&planets_set(), &build_options(), &render_options(dir.path())).unwrap();
    for artifact in &report.artifacts {
        assert_eq!(
            tidy(&artifact.contents),
            artifact.contents,
            "{} changes under a second tidy",
            artifact.path.display()
        );
    }
}

#[tokio::test]
async fn missing_compiler_leaves_schema_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let options = render_options(dir.path());
    let report = generate(&demo_set(), &build_options(), &options).unwrap();
    let schema = report.schema_path().unwrap().to_path_buf();

    let compiler = CompilerOptions {
        program: "flatc-is-not-installed-here".to_string(),
        ..CompilerOptions::default()
    };
    let err = compile_schema(&schema, &options.layout.out_dir, &compiler)
        .await
        .unwrap_err();

    assert!(matches!(err, CodegenError::CompilerUnavailable { .. }), "{err}");
    assert!(err.hint().unwrap().contains("installed flatc"));
    assert_eq!(err.exit_code(), 21);
    assert!(schema.is_file());
}
