//! Integration tests for the record modifier.

use chrono::TimeZone;
use record_modifier::transformer::{EncodingPolicy, KeyFilter};
use record_modifier::{
    ConfigError, ExpressionContext, ModifierError, Pipeline, Record, RecordModifier, RuleSet,
    Value,
};
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    Record::from_json(value).unwrap()
}

fn run(directives: &str, input: serde_json::Value) -> serde_json::Value {
    let modifier = RecordModifier::from_directives(directives).unwrap();
    modifier.process("test_tag", record(input)).record.to_json()
}

fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().trim().to_string()
}

// =============================================================================
// Configuration Compilation Tests
// =============================================================================

#[test]
fn test_configure_resolves_hostname_once() {
    let modifier = RecordModifier::from_directives(
        r#"
        type record_modifier
        tag foo.filtered

        gen_host "${hostname}"
        foo bar
        include_tag_key
        tag_key included_tag
        remove_keys hoge
        "#,
    )
    .unwrap();

    let fields = modifier.pipeline().static_fields();
    assert_eq!(fields.get("gen_host"), Some(&Value::from(local_hostname())));
    assert_eq!(fields.get("foo"), Some(&Value::from("bar")));
    assert_eq!(fields.len(), 2);
}

#[test]
fn test_compile_with_fixed_context() {
    let timestamp = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let ctx = ExpressionContext::new("edge-7", timestamp);
    let rules = RuleSet::new()
        .with("host", "${hostname}")
        .with("started", "${now}");

    let pipeline = Pipeline::compile_with(&rules, &ctx).unwrap();
    let out = pipeline.transform(Record::new(), "t");
    assert_eq!(
        out.to_json(),
        json!({"host": "edge-7", "started": "2024-01-02T03:04:05+00:00"})
    );

    // Compiled values are literals; later records see the same value.
    let again = pipeline.transform(Record::new(), "t");
    assert_eq!(again, out);
}

#[test]
fn test_remove_and_whitelist_are_exclusive() {
    let result = RecordModifier::from_yaml(
        r#"
remove_keys: k1
whitelist_keys: k2
"#,
    );
    assert!(matches!(
        result,
        Err(ModifierError::Config(ConfigError::ConflictingKeyFilters))
    ));
}

#[test]
fn test_yaml_list_options() {
    let modifier = RecordModifier::from_yaml(
        r#"
whitelist_keys: [k1, k2]
remove_path:
  - a.b
  - c
"#,
    )
    .unwrap();

    let pipeline = modifier.pipeline();
    match pipeline.key_filter() {
        KeyFilter::Whitelist(keys) => {
            assert!(keys.contains("k1"));
            assert!(keys.contains("k2"));
        }
        other => panic!("unexpected key filter: {:?}", other),
    }
    let paths: Vec<String> = pipeline.remove_paths().iter().map(|p| p.to_string()).collect();
    assert_eq!(paths, vec!["a.b", "c"]);
}

#[test]
fn test_bad_encoding_is_fatal() {
    assert!(matches!(
        RecordModifier::from_directives("char_encoding utf-8:cp932:x"),
        Err(ModifierError::Config(ConfigError::MalformedEncoding(_)))
    ));
    assert!(matches!(
        RecordModifier::from_directives("char_encoding not-an-encoding"),
        Err(ModifierError::Config(ConfigError::UnknownEncoding(_)))
    ));
}

// =============================================================================
// Record Transformation Tests
// =============================================================================

#[test]
fn test_format_with_tag_static_fields_and_removal() {
    let modifier = RecordModifier::from_directives(
        r#"
        tag foo.filtered
        gen_host "${hostname}"
        foo bar
        include_tag_key
        tag_key included_tag
        remove_keys hoge
        "#,
    )
    .unwrap();

    let host = local_hostname();
    for a in [1, 2] {
        let emitted = modifier.process("test_tag", record(json!({"a": a})));
        assert_eq!(emitted.tag, "foo.filtered");
        assert_eq!(
            emitted.record.to_json(),
            json!({"a": a, "gen_host": host, "foo": "bar", "included_tag": "test_tag"})
        );
    }
    assert_eq!(modifier.records_total(), 2);
}

#[test]
fn test_set_char_encoding() {
    let modifier = RecordModifier::from_directives("char_encoding utf-8").unwrap();
    let mut input = Record::new();
    input.insert(
        "k",
        record_modifier::Text::from_bytes(b"v".to_vec(), encoding_rs::WINDOWS_1252),
    );

    let out = modifier.process("test_tag", input).record;
    let text = out.get("k").and_then(Value::as_text).unwrap();
    assert_eq!(text.encoding(), encoding_rs::UTF_8);
    assert_eq!(text.as_bytes(), b"v");
}

#[test]
fn test_convert_char_encoding() {
    let modifier = RecordModifier::from_directives("char_encoding utf-8:cp932").unwrap();
    assert_eq!(
        modifier.pipeline().encoding(),
        &EncodingPolicy::Convert {
            from: encoding_rs::UTF_8,
            to: encoding_rs::SHIFT_JIS
        }
    );

    let out = modifier.process("test_tag", record(json!({"k": "v"}))).record;
    let text = out.get("k").and_then(Value::as_text).unwrap();
    assert_eq!(text.encoding(), encoding_rs::SHIFT_JIS);
    assert_eq!(text.as_bytes(), b"v");
}

#[test]
fn test_unconvertible_text_still_reaches_later_stages() {
    let modifier = RecordModifier::from_directives(
        "char_encoding utf-8:cp932\nremove_keys drop\nremove_path nested.gone\nfoo bar\ninclude_tag_key",
    )
    .unwrap();

    let mut input = record(json!({"ok": "日本", "drop": 1, "nested": {"gone": 2, "kept": 3}}));
    input.insert(
        "raw",
        record_modifier::Text::from_bytes(vec![0xff, 0xfe], encoding_rs::UTF_8),
    );

    let out = modifier.process("test_tag", input).record;

    let raw = out.get("raw").and_then(Value::as_text).unwrap();
    assert_eq!(raw.encoding(), encoding_rs::UTF_8);
    assert_eq!(raw.as_bytes(), &[0xff, 0xfe]);
    let ok = out.get("ok").and_then(Value::as_text).unwrap();
    assert_eq!(ok.encoding(), encoding_rs::SHIFT_JIS);

    assert!(!out.contains_key("drop"));
    assert_eq!(out.get("nested").unwrap().to_json(), json!({"kept": 3}));
    assert_eq!(out.get("foo"), Some(&Value::from("bar")));
    assert_eq!(out.get("tag"), Some(&Value::from("test_tag")));
}

#[test]
fn test_remove_one_key() {
    assert_eq!(
        run("remove_keys k1", json!({"k1": "v", "k2": "v"})),
        json!({"k2": "v"})
    );
}

#[test]
fn test_remove_multiple_keys() {
    assert_eq!(
        run("remove_keys k1, k2, k3", json!({"k1": "v", "k2": "v", "k4": "v"})),
        json!({"k4": "v"})
    );
}

#[test]
fn test_remove_non_whitelist_keys() {
    assert_eq!(
        run(
            "whitelist_keys k1, k2, k3",
            json!({"k1": "v", "k2": "v", "k4": "v", "k5": "v"})
        ),
        json!({"k1": "v", "k2": "v"})
    );
}

#[test]
fn test_remove_paths() {
    assert_eq!(
        run(
            "remove_path b.b1.b1b1",
            json!({"a": 1, "b": {"b1": {"b1b1": 22, "b1b2": 33}, "inner": 22}})
        ),
        json!({"a": 1, "b": {"b1": {"b1b2": 33}, "inner": 22}})
    );
}

#[test]
fn test_remove_multiple_paths() {
    assert_eq!(
        run(
            "remove_path b.b1.b1b1, a, b1",
            json!({"a": 1, "b": {"b1": {"b1b1": 22, "b1b2": 33}, "inner": 22}})
        ),
        json!({"b": {"b1": {"b1b2": 33}, "inner": 22}})
    );
}

#[test]
fn test_missing_path_is_noop() {
    let input = json!({"a": 1, "b": {"c": 2}});
    assert_eq!(run("remove_path x.y, b.c.d, zz", input.clone()), input);
}

#[test]
fn test_path_removal_is_idempotent() {
    let pipeline = Pipeline::compile(&RuleSet::new().with("remove_path", "b.b1, a")).unwrap();
    let once = pipeline.transform(
        record(json!({"a": 1, "b": {"b1": 2, "b2": 3}})),
        "t",
    );
    let twice = pipeline.transform(once.clone(), "t");
    assert_eq!(once, twice);
    assert_eq!(once.to_json(), json!({"b": {"b2": 3}}));
}

#[test]
fn test_static_field_wins_over_removal() {
    assert_eq!(
        run(
            "remove_keys k1\nremove_path k2\nk1 injected\nk2 injected",
            json!({"k1": "v", "k2": "v", "k3": "v"})
        ),
        json!({"k1": "injected", "k2": "injected", "k3": "v"})
    );
}

#[test]
fn test_static_only_is_merge() {
    let input = json!({"a": 1, "foo": "old", "nested": {"x": [1, "y"]}});
    assert_eq!(
        run("foo bar\nbaz qux", input),
        json!({"a": 1, "foo": "bar", "nested": {"x": [1, "y"]}, "baz": "qux"})
    );
}

// =============================================================================
// Configuration File Tests
// =============================================================================

#[test]
fn test_load_directive_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record_modifier.conf");
    std::fs::write(
        &path,
        "# strip noise\nremove_keys hoge\ninclude_tag_key\ntag_key src\n",
    )
    .unwrap();

    let rules = RuleSet::from_file(&path).unwrap();
    let modifier = RecordModifier::new(&rules).unwrap();
    let emitted = modifier.process("app", record(json!({"hoge": 1, "a": 2})));
    assert_eq!(emitted.record.to_json(), json!({"a": 2, "src": "app"}));
}

#[test]
fn test_full_yaml_config() {
    let yaml = r#"
type: record_modifier
tag: out.modified

service: checkout
labels:
  team: payments
  host: "${hostname}"

include_tag_key: true
tag_key: source_tag
remove_keys: "password, token"
remove_path: "request.headers.authorization"
char_encoding: "utf-8"
"#;

    let modifier = RecordModifier::from_yaml(yaml).unwrap();
    let input = record(json!({
        "msg": "ok",
        "password": "hunter2",
        "request": {"headers": {"authorization": "Bearer x", "accept": "*/*"}}
    }));

    let emitted = modifier.process("in.raw", input);
    assert_eq!(emitted.tag, "out.modified");
    assert_eq!(
        emitted.record.to_json(),
        json!({
            "msg": "ok",
            "request": {"headers": {"accept": "*/*"}},
            "service": "checkout",
            "labels": {"team": "payments", "host": local_hostname()},
            "source_tag": "in.raw"
        })
    );
}
