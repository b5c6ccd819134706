//! End-to-end extraction over small Go workspaces.

use std::fs;
use std::path::Path;

use gofunc::{Config, Error, FunctionInfo, Renderer, Session};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("file has a parent")).expect("create dir");
    fs::write(path, contents).expect("write file");
}

/// A module `example.com/app` in `<tmp>/app`, a local replacement in
/// `<tmp>/lib` and a module cache in `<tmp>/modcache`.
fn workspace() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let root = dir.path();

    write(
        root,
        "app/go.mod",
        r"module example.com/app

go 1.22

require (
	example.com/lib v0.0.0-00010101000000-000000000000
	github.com/acme/widgets v1.2.0
)

replace example.com/lib => ../lib
",
    );

    write(
        root,
        "app/service/foo.go",
        r#"package service

import (
	"fmt"

	"example.com/app/bar"
	"example.com/lib/util"
	"github.com/acme/widgets"
)

func Foo(c *Config, n int) (int, error) {
	fmt.Println(c.Name)
	v, err := bar.Helper(n)
	util.Trim(c.Name)
	widgets.Render(c.Name)
	client.Do()
	local()
	return v, err
}

func local() {}
"#,
    );

    write(
        root,
        "app/service/config.go",
        "package service\n\ntype Config struct {\n\tName string\n}\n",
    );

    write(
        root,
        "app/bar/bar.go",
        "package bar\n\nfunc Helper(n int) (int, error) {\n\treturn n, nil\n}\n",
    );

    write(
        root,
        "lib/util/util.go",
        "package util\n\nfunc Trim(s string) string { return s }\n",
    );

    write(
        root,
        "modcache/github.com/acme/widgets@v1.2.0/widgets.go",
        "package widgets\n\ntype Widget struct {\n\tID int\n}\n\nfunc Render(s string) *Widget { return nil }\n",
    );

    dir
}

fn config(root: &Path) -> Config {
    Config {
        module_cache: Some(root.join("modcache")),
        ..Config::default()
    }
}

fn info(name: &str, params: &[&str], returns: &[&str]) -> FunctionInfo {
    FunctionInfo {
        name: name.to_string(),
        params: params.iter().map(ToString::to_string).collect(),
        returns: returns.iter().map(ToString::to_string).collect(),
    }
}

#[test]
fn extracts_function_with_one_level_of_dependencies() {
    let ws = workspace();
    let service = ws.path().join("app/service");

    let bundle = gofunc::extract_function(&service, "Foo", &config(ws.path()))
        .expect("extraction should succeed");

    assert_eq!(bundle.module, "example.com/app");
    assert_eq!(bundle.package, "service");
    assert!(bundle.code.starts_with("func Foo(c *Config, n int) (int, error) {"));
    assert!(bundle.code.ends_with("return v, err\n}"));
    assert_eq!(
        bundle.params,
        vec!["type Config struct {\n\tName string\n}", "int"]
    );
    assert_eq!(bundle.returns, vec!["int", "error"]);
    assert_eq!(
        bundle.funcs,
        vec![
            info("bar.Helper", &["int"], &["int", "error"]),
            info("util.Trim", &["string"], &["string"]),
            info(
                "widgets.Render",
                &["string"],
                &["type Widget struct {\n\tID int\n}"]
            ),
            info("local", &[], &[]),
        ]
    );
}

#[test]
fn calls_through_values_without_imports_are_skipped() {
    let ws = workspace();
    let service = ws.path().join("app/service");

    let bundle = gofunc::extract_function(&service, "Foo", &config(ws.path()))
        .expect("extraction should succeed");

    assert!(bundle.funcs.iter().all(|f| f.name != "client.Do"));
    assert!(bundle.funcs.iter().all(|f| !f.name.starts_with("fmt.")));
}

#[test]
fn missing_cache_entry_degrades_to_empty_signature() {
    let ws = workspace();
    fs::remove_dir_all(ws.path().join("modcache/github.com")).expect("remove cached module");
    let service = ws.path().join("app/service");

    let bundle = gofunc::extract_function(&service, "Foo", &config(ws.path()))
        .expect("missing dependency sources should not be fatal");

    let render = bundle
        .funcs
        .iter()
        .find(|f| f.name == "widgets.Render")
        .expect("call is still listed");
    assert!(render.params.is_empty() && render.returns.is_empty());
}

#[test]
fn pointer_method_is_found_by_receiver_name() {
    let ws = workspace();
    write(
        ws.path(),
        "app/service/server.go",
        "package service\n\ntype Server struct{}\n\nfunc (s *Server) Start(c Config) error {\n\treturn nil\n}\n",
    );
    let service = ws.path().join("app/service");
    let mut session = Session::open(&service, &config(ws.path())).expect("open session");

    let bundle = session
        .extract(&service, "Server.Start")
        .expect("method should be found");

    assert!(bundle.code.starts_with("func (s *Server) Start(c Config) error"));
    assert_eq!(bundle.params, vec!["type Config struct {\n\tName string\n}"]);
    assert_eq!(bundle.returns, vec!["error"]);
    assert!(bundle.funcs.is_empty());
}

#[test]
fn struct_used_by_several_slots_is_embedded_once_per_list() {
    let ws = workspace();
    write(
        ws.path(),
        "app/service/pair.go",
        "package service\n\nfunc Pair(a Config, b *Config) (Config, error) {\n\treturn *b, nil\n}\n",
    );
    let service = ws.path().join("app/service");

    let bundle = gofunc::extract_function(&service, "Pair", &config(ws.path()))
        .expect("extraction should succeed");

    let config_source = "type Config struct {\n\tName string\n}";
    assert_eq!(bundle.params, vec![config_source]);
    assert_eq!(bundle.returns, vec![config_source, "error"]);
}

#[test]
fn unknown_function_is_fatal() {
    let ws = workspace();
    let service = ws.path().join("app/service");

    let err = gofunc::extract_function(&service, "Nope", &config(ws.path()))
        .expect_err("unknown function should fail");

    assert!(matches!(err, Error::FunctionNotFound { ref name, .. } if name == "Nope"));
}

#[test]
fn broken_file_in_target_search_is_fatal() {
    let ws = workspace();
    write(ws.path(), "app/service/aaa_broken.go", "package service\n\nfunc (\n");
    let service = ws.path().join("app/service");

    let err = gofunc::extract_function(&service, "Foo", &config(ws.path()))
        .expect_err("broken target file should fail");

    assert!(matches!(err, Error::Parse { .. }), "got {err:?}");
}

#[test]
fn extracted_code_reparses_to_the_same_declaration() {
    let ws = workspace();
    let service = ws.path().join("app/service");
    let bundle = gofunc::extract_function(&service, "Foo", &config(ws.path()))
        .expect("extraction should succeed");

    let reparse = ws.path().join("reparse");
    write(
        &reparse,
        "snippet.go",
        &format!("package snippet\n\n{}\n\n{}\n", bundle.params[0], bundle.code),
    );
    let mut session = Session::open(&service, &config(ws.path())).expect("open session");
    let again = session
        .extract(&reparse, "Foo")
        .expect("snippet should parse and contain Foo");

    assert_eq!(again.code, bundle.code);
    assert_eq!(again.params, bundle.params);
    assert_eq!(again.returns, bundle.returns);
}

#[test]
fn renders_default_and_json_output() {
    let ws = workspace();
    let service = ws.path().join("app/service");
    let bundle = gofunc::extract_function(&service, "Foo", &config(ws.path()))
        .expect("extraction should succeed");

    let text = Renderer::default().render(&bundle).expect("render");
    assert!(text.contains("example.com/app"));
    assert!(text.contains("Function: bar.Helper\nParameters: int\nReturns: interror"));

    let json = gofunc::render_json(&bundle).expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(value["funcs"][0]["name"], "bar.Helper");
    assert_eq!(value["returns"][1], "error");
}

#[test]
fn template_from_config_file() {
    let ws = workspace();
    let service = ws.path().join("app/service");
    write(
        &service,
        gofunc::CONFIG_FILE_NAME,
        "module_cache: ../../modcache\ntemplate: prompt.tera\n",
    );
    write(
        &service,
        "prompt.tera",
        "{{ package }}/{% for f in funcs %}{{ f.name }};{% endfor %}",
    );

    let config = Config::discover(&service).expect("config should load");
    let bundle = gofunc::extract_function(&service, "Foo", &config).expect("extract");
    let text = Renderer::from_config(&config)
        .expect("template file")
        .render(&bundle)
        .expect("render");

    assert_eq!(text, "service/bar.Helper;util.Trim;widgets.Render;local;");
}
