//! Scenario suite for unused-members-core.

use crate::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: &str) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_project() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir()
        .join("unused_members_tests")
        .join(format!("{}_{}", std::process::id(), id));
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(dir.join("src")).unwrap();
    dir
}

fn run_with(sources: &[(&str, &str)], config: &ScanConfig) -> Vec<(String, String, Reason)> {
    let project = Project::from_sources("/repo", sources.iter().copied()).unwrap();
    let findings = analyze(&project, config, &Shard::single(), |_| {}).unwrap();
    let mut out: Vec<_> = findings
        .iter()
        .map(|m| (m.class_name.clone(), m.member_name.clone(), m.reason))
        .collect();
    out.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
    out
}

fn run(sources: &[(&str, &str)]) -> Vec<(String, String, Reason)> {
    run_with(sources, &ScanConfig::default())
}

fn finding(class: &str, member: &str, reason: Reason) -> (String, String, Reason) {
    (class.to_string(), member.to_string(), reason)
}

// Scenario A: internal use only vs no use
#[test]
fn test_flags_offending_members() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  x = 1;\n\n  fn() {\n    return this.x;\n  }\n}\n",
    )]);
    assert_eq!(
        result,
        vec![
            finding("A", "fn", Reason::Unused),
            finding("A", "x", Reason::ShouldBePrivate),
        ]
    );
}

// Scenario B: destructuring from another file counts
#[test]
fn test_checks_references_in_all_files() {
    let result = run(&[
        ("foo.ts", "export class A {\n  x = 1;\n  y = 1;\n}\n"),
        ("bar.ts", "import { A } from './foo';\nconst { y } = new A();\n"),
    ]);
    assert_eq!(result, vec![finding("A", "x", Reason::Unused)]);
}

#[test]
fn test_used_members_not_flagged() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  x = 1;\n}\nconst a = new A();\nconsole.log(a.x);\n",
    )]);
    assert!(result.is_empty());
}

// Scenario C
#[test]
fn test_skips_classes_implementing_interfaces() {
    let result = run(&[(
        "foo.ts",
        "interface IA {\n  x: number;\n}\nclass A implements IA {\n  x = 1;\n}\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_skips_abstract_classes_and_members() {
    let result = run(&[(
        "foo.ts",
        "abstract class Base {\n  helper() {}\n}\nclass Impl {\n  abstract run(): void;\n}\n",
    )]);
    assert!(result.is_empty());
}

// Scenario D
#[test]
fn test_skips_inherited_members() {
    let result = run(&[(
        "foo.ts",
        "class GrandParent {\n  x = 1;\n}\nclass Parent extends GrandParent {\n  y = 1;\n}\nconsole.log(new GrandParent().x, new Parent().y);\n\nclass Child extends Parent {\n  x = 2;\n  y = 2;\n}\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_inherited_members_across_files() {
    let result = run(&[
        ("base.ts", "export class Base {\n  shared = 1;\n}\n"),
        (
            "child.ts",
            "import { Base } from './base';\nexport class Child extends Base {\n  shared = 2;\n  own = 3;\n}\n",
        ),
        (
            "use.ts",
            "import { Child } from './child';\nconsole.log(new Child().shared);\n",
        ),
    ]);
    assert_eq!(result, vec![finding("Child", "own", Reason::Unused)]);
}

#[test]
fn test_respects_ignore_comment() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  x = 1;\n  // unused-class-members-ignore-next\n  y = 1;\n}\n// unused-class-members-ignore-next\nclass B {\n  x = 1;\n  y = 1;\n}\n",
    )]);
    assert_eq!(result, vec![finding("A", "x", Reason::Unused)]);
}

#[test]
fn test_path_scope_restricts_files() {
    let sources = [
        ("foo/foo1.ts", "class Foo1 {\n  x = 1;\n}\n"),
        ("foo/foo2.ts", "class Foo2 {\n  x = 1;\n}\n"),
        ("bar/bar.ts", "class Bar {\n  x = 1;\n}\n"),
    ];
    let dir = ScanConfig {
        path: Some("foo".into()),
        ..Default::default()
    };
    assert_eq!(
        run_with(&sources, &dir),
        vec![
            finding("Foo1", "x", Reason::Unused),
            finding("Foo2", "x", Reason::Unused),
        ]
    );

    let file = ScanConfig {
        path: Some("foo/foo1.ts".into()),
        ..Default::default()
    };
    assert_eq!(run_with(&sources, &file), vec![finding("Foo1", "x", Reason::Unused)]);
}

// Scenario E
#[test]
fn test_allowlists_suppress_members() {
    let source = [(
        "foo.ts",
        "class A {\n  x = 1;\n  @y\n  y = 1;\n  z = getZ();\n}\n",
    )];
    assert_eq!(run(&source).len(), 3);

    let config = ScanConfig {
        ignore_member_names: vec!["x".into()],
        ignore_decorator_names: vec!["y".into()],
        ignore_initializer_names: vec!["getZ".into()],
        ..Default::default()
    };
    assert!(run_with(&source, &config).is_empty());

    let only_names = ScanConfig {
        ignore_member_names: vec!["x".into()],
        ..Default::default()
    };
    let result = run_with(&source, &only_names);
    assert_eq!(
        result,
        vec![finding("A", "y", Reason::Unused), finding("A", "z", Reason::Unused)]
    );
}

#[test]
fn test_override_members_not_flagged() {
    let result = run(&[
        (
            "Setting.ts",
            "export class Setting {\n  get value() {\n    return \"1\";\n  }\n\n  async assignment() {\n    return Promise.resolve();\n  }\n}\n",
        ),
        (
            "OverrideSetting.ts",
            "import { Setting } from \"./Setting\";\nexport class OverrideSetting extends Setting {\n  override get value() {\n    return \"1\";\n  }\n\n  override async assignment() {\n    return Promise.resolve();\n  }\n}\n",
        ),
        (
            "use.ts",
            "import { OverrideSetting } from \"./OverrideSetting\";\nconst s = new OverrideSetting();\nconsole.log(s.value);\nconsole.log(s.assignment());\n",
        ),
    ]);
    assert!(result.is_empty());
}

#[test]
fn test_private_members_only_reported_when_unused() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  private a = 1;\n  private b = 2;\n  #c = 3;\n  go() { return this.a; }\n}\nnew A().go();\n",
    )]);
    assert_eq!(
        result,
        vec![finding("A", "#c", Reason::Unused), finding("A", "b", Reason::Unused)]
    );

    let config = ScanConfig {
        skip_private: true,
        ..Default::default()
    };
    let sources = [(
        "foo.ts",
        "class A {\n  private b = 2;\n  go() {}\n}\nnew A().go();\n",
    )];
    assert!(run_with(&sources, &config).is_empty());
}

#[test]
fn test_protected_members_skipped() {
    let result = run(&[("foo.ts", "class A {\n  protected x = 1;\n}\n")]);
    assert!(result.is_empty());
}

#[test]
fn test_ignore_could_be_private() {
    let sources = [(
        "foo.ts",
        "class A {\n  x = 1;\n  go() { return this.x; }\n}\nnew A().go();\n",
    )];
    assert_eq!(run(&sources), vec![finding("A", "x", Reason::ShouldBePrivate)]);

    let config = ScanConfig {
        ignore_could_be_private: true,
        ..Default::default()
    };
    assert!(run_with(&sources, &config).is_empty());
}

#[test]
fn test_accessor_pair_shares_references() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  get v() { return 1; }\n  set v(x: number) {}\n}\nconst a = new A();\na.v = 2;\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_parameter_properties() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  constructor(private readonly used: number, public unused: number, public inner: number) {\n    console.log(inner);\n  }\n  go() { return this.used; }\n}\nnew A(1, 2, 3).go();\n",
    )]);
    assert_eq!(
        result,
        vec![
            finding("A", "inner", Reason::ShouldBePrivate),
            finding("A", "unused", Reason::Unused),
        ]
    );
}

#[test]
fn test_static_access_does_not_count() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  static create() { return new A(); }\n  x = 1;\n}\nA.create();\nconsole.log(A.x);\n",
    )]);
    assert_eq!(result, vec![finding("A", "x", Reason::Unused)]);
}

#[test]
fn test_unknown_receiver_counts_conservatively() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  x = 1;\n}\nfunction read(o: any) {\n  return o.x;\n}\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_subclass_member_through_base_typed_receiver() {
    let result = run(&[(
        "foo.ts",
        "class Base {\n  kind = 'b';\n}\nclass Sub extends Base {\n  subOnly() {\n    return 1;\n  }\n}\nexport function f(x: Base) {\n  x.kind;\n  if (x instanceof Sub) return x.subOnly();\n}\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_loop_variable_shadowing_typed_binding() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  y = 1;\n}\nclass B {\n  y = 2;\n}\nconst a = new A();\na.y;\nconst bs: B[] = [new B()];\nfor (const a of bs) {\n  a.y;\n}\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_for_in_variable_shadowing_typed_binding() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  y = 1;\n}\nclass B {\n  y = 2;\n}\nconst a = new A();\na.y;\nconst t = { k: new B() };\nfor (const a in t) {\n  a.y;\n}\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_array_destructuring_shadowing_typed_binding() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  y = 1;\n}\nclass B {\n  y = 2;\n}\nconst a = new A();\na.y;\nexport function f(list: B[]) {\n  const [a] = list;\n  return a.y;\n}\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_catch_and_rest_bindings_shadowing_typed_binding() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  y = 1;\n  z = 1;\n}\nclass B {\n  y = 2;\n  z = 2;\n}\nconst a = new A();\na.y;\na.z;\ntry {\n  run();\n} catch (a) {\n  a.y;\n}\nexport function f(...a: B[]) {\n  return a.z;\n}\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_inner_parameter_shadowing_typed_binding() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  y = 1;\n}\nclass B {\n  y = 2;\n}\nconst a = new A();\na.y;\nexport function f(a: B) {\n  return a.y;\n}\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_same_name_on_unrelated_class_does_not_count() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  run() {}\n}\nclass B {\n  run() {}\n}\nconst b: B = new B();\nb.run();\n",
    )]);
    assert_eq!(result, vec![finding("A", "run", Reason::Unused)]);
}

#[test]
fn test_reference_from_other_class_in_same_file() {
    let result = run(&[(
        "foo.ts",
        "class A {\n  x = 1;\n}\nclass B {\n  read(a: A) { return a.x; }\n}\nnew B().read(new A());\n",
    )]);
    assert!(result.is_empty());
}

#[test]
fn test_re_exports_and_default_exports() {
    let result = run(&[
        ("models/user.ts", "export default class User {\n  name = '';\n  age = 0;\n}\n"),
        ("models/index.ts", "export { default as User } from './user';\n"),
        (
            "main.ts",
            "import { User } from './models';\nconst u = new User();\nconsole.log(u.name);\n",
        ),
    ]);
    assert_eq!(result, vec![finding("User", "age", Reason::Unused)]);
}

#[test]
fn test_namespace_import() {
    let result = run(&[
        ("svc.ts", "export class Svc {\n  a() {}\n  b() {}\n}\n"),
        ("main.ts", "import * as svc from './svc';\nnew svc.Svc().a();\n"),
    ]);
    assert_eq!(result, vec![finding("Svc", "b", Reason::Unused)]);
}

#[test]
fn test_syntax_errors_do_not_abort_scan() {
    let result = run(&[
        ("broken.ts", "class Broken {\n  x = = 1;\n"),
        ("ok.ts", "class Ok {\n  y = 1;\n}\n"),
    ]);
    assert_eq!(result, vec![finding("Ok", "y", Reason::Unused)]);
}

#[test]
fn test_declaration_files_not_analyzed() {
    let result = run(&[("types.d.ts", "export declare class Lib {\n  x: number;\n}\n")]);
    assert!(result.is_empty());
}

#[test]
fn test_ignore_file_regex() {
    let sources = [
        ("a.ts", "class A {\n  x = 1;\n}\n"),
        ("a.test.ts", "class T {\n  y = 1;\n}\n"),
    ];
    let config = ScanConfig {
        ignore_file_regex: Some(r"\.test\.ts$".into()),
        ..Default::default()
    };
    assert_eq!(run_with(&sources, &config), vec![finding("A", "x", Reason::Unused)]);
}

#[test]
fn test_shards_partition_findings() {
    let sources: Vec<(String, String)> = (0..12)
        .map(|i| (format!("src/f{}.ts", i), format!("class C{} {{\n  x = 1;\n}}\n", i)))
        .collect();
    let project = Project::from_sources(
        "/repo",
        sources.iter().map(|(p, s)| (p.as_str(), s.as_str())),
    )
    .unwrap();
    let config = ScanConfig::default();

    let all = analyze(&project, &config, &Shard::single(), |_| {}).unwrap();
    assert_eq!(all.len(), 12);

    let mut seen = Vec::new();
    for current in 1..=3 {
        let shard = Shard::new(3, current).unwrap();
        let part = analyze(&project, &config, &shard, |_| {}).unwrap();
        seen.extend(part.iter().map(|m| m.class_name.clone()));
    }
    seen.sort();
    let mut expected: Vec<String> = all.iter().map(|m| m.class_name.clone()).collect();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn test_end_to_end_tsconfig_project() {
    let root = setup_temp_project();
    write_file(
        &root.join("tsconfig.json"),
        r#"{
  "compilerOptions": {
    "baseUrl": ".",
    "paths": { "@app/*": ["src/*"] },
    "outDir": "dist"
  },
  "include": ["src"]
}"#,
    );
    write_file(
        &root.join("src/store.ts"),
        "export class Store {\n  items: string[] = [];\n  add(item: string) {\n    this.items.push(item);\n  }\n  clear() {}\n}\n",
    );
    write_file(
        &root.join("src/app.ts"),
        "import { Store } from '@app/store';\nconst store = new Store();\nstore.add('a');\n",
    );
    write_file(&root.join("dist/store.d.ts"), "export declare class Out {}\n");
    write_file(
        &root.join("node_modules/lib/index.ts"),
        "export class Lib {\n  x = 1;\n}\n",
    );

    let result = UnusedMembers::new(ScanConfig::default())
        .base_dir(&root)
        .analyze()
        .unwrap();

    assert_eq!(result.project.files().len(), 2);
    let found: Vec<(String, String, Reason)> = result
        .findings
        .iter()
        .map(|m| (m.class_name.clone(), m.member_name.clone(), m.reason))
        .collect();
    assert_eq!(
        found,
        vec![
            finding("Store", "items", Reason::ShouldBePrivate),
            finding("Store", "clear", Reason::Unused),
        ]
    );

    let text = format_plain(&result.findings);
    assert!(text.contains("src/store.ts\nStore\n- items: should be private\n- clear: unused\n"));

    fs::remove_dir_all(&root).ok();
}
