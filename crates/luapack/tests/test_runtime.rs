#![allow(clippy::disallowed_methods)]

use std::{fs, path::Path};

use luapack::{BundleOrchestrator, Config, MinifyMode};
use mlua::{Function, Lua, Table};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Bundle a small project in `mode` and return the generated text
fn build_bundle(temp_dir: &TempDir, mode: MinifyMode) -> String {
    let root = temp_dir.path().join("pkg");
    write_file(
        &root.join("a.lua"),
        "-- pulls in a sibling and a host module\n\
         local b = require(\"sub.b\")\n\
         local native = require(\"host.native\")\n\
         return { b = b, native = native, name = ... }\n",
    );
    write_file(&root.join("sub/b.lua"), "--[[ block\ncomment ]]\nreturn 2 -- two\n");
    write_file(&root.join("c.lua"), "return \"x\\z\n      y -- kept\" -- dropped\n");
    write_file(&root.join("d.lua"), "local unused = 1\n");

    let output = temp_dir.path().join(format!("pkg-{mode}.lua"));
    let mut config = Config::for_root(&root);
    config.output = Some(output.clone());
    config.minify = mode;
    BundleOrchestrator::new(config).run().unwrap();
    fs::read_to_string(output).unwrap()
}

/// Load `bundle` into a fresh interpreter with one host-provided module
fn load_bundle(lua: &Lua, bundle: &str) -> Table {
    lua.load(r#"package.preload["host.native"] = function(name) return "native:" .. name end"#)
        .exec()
        .unwrap();
    lua.load(bundle).set_name("pkg").eval::<Table>().unwrap()
}

#[test]
fn test_bundle_resolves_locally_then_natively() {
    for mode in [MinifyMode::Off, MinifyMode::Lines, MinifyMode::Flatten] {
        let temp_dir = TempDir::new().unwrap();
        let bundle = build_bundle(&temp_dir, mode);
        let lua = Lua::new();
        let ns = load_bundle(&lua, &bundle);
        let require: Function = ns.get("require").unwrap();

        let a: Table = require.call("a").unwrap();
        assert_eq!(a.get::<i64>("b").unwrap(), 2, "{mode}");
        assert_eq!(a.get::<String>("native").unwrap(), "native:host.native", "{mode}");
        assert_eq!(a.get::<String>("name").unwrap(), "a", "{mode}");

        assert_eq!(require.call::<String>("c").unwrap(), "xy -- kept", "{mode}");
        assert!(require.call::<bool>("d").unwrap(), "{mode}");
    }
}

#[test]
fn test_bundle_caches_units_like_require() {
    let temp_dir = TempDir::new().unwrap();
    let bundle = build_bundle(&temp_dir, MinifyMode::Flatten);
    let lua = Lua::new();
    let ns = load_bundle(&lua, &bundle);
    lua.globals().set("pkg", ns).unwrap();

    let same = lua
        .load("return rawequal(pkg.require('a'), pkg.require('a'))")
        .eval::<bool>()
        .unwrap();
    assert!(same);
}

#[test]
fn test_unknown_module_reaches_host_require() {
    let temp_dir = TempDir::new().unwrap();
    let bundle = build_bundle(&temp_dir, MinifyMode::Lines);
    let lua = Lua::new();
    let ns = load_bundle(&lua, &bundle);
    let require: Function = ns.get("require").unwrap();

    let err = require.call::<String>("nowhere.to.be.found").unwrap_err();
    assert!(err.to_string().contains("nowhere.to.be.found"), "{err}");
}
