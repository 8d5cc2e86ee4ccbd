use std::path::Path;

use goldbox::content::Role;
use goldbox::load::LoadError;
use goldbox::TestNode;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn names(node: &TestNode) -> Vec<&str> {
    node.children.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn one_input_one_output() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "greet.input.json", r#"{"a":1}"#);
    write(root.path(), "greet.output.json", "{\n  \"a\": 1\n}\n");

    let tree = goldbox::load::load(root.path()).unwrap();
    assert_eq!(tree.len(), 1);
    let greet = tree.child("greet").unwrap();
    assert!(greet.is_leaf());
    let assertion = greet.assertion.as_ref().unwrap();
    assert_eq!(assertion.input.role, Role::Input);
    assert_eq!(assertion.input.payload, br#"{"a":1}"#);
    assert_eq!(assertion.output.role, Role::Output);
    assert!(assertion.output.location.file.ends_with("greet.output.json"));
}

#[test]
fn two_inputs_one_output() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "greet.input.en.txt", "hello\n");
    write(root.path(), "greet.input.fr.txt", "bonjour\n");
    write(root.path(), "greet.output.txt", "HELLO\n");

    let tree = goldbox::load::load(root.path()).unwrap();
    let greet = tree.child("greet").unwrap();
    assert!(greet.assertion.is_none());
    assert_eq!(greet.children.len(), 2);
    assert_ne!(greet.children[0].name, greet.children[1].name);
    assert_eq!(greet.children[0].assertion.as_ref().unwrap().input.attributes["en"], "");
}

#[test]
fn matrix_children_are_distinct() {
    let root = tempfile::tempdir().unwrap();
    for name in ["a", "b", "c"] {
        write(root.path(), &format!("m.input.{name}.json"), "{}");
    }
    write(root.path(), "m.output.yaml", "{}\n");
    write(root.path(), "m.output.toml", "\n");

    let tree = goldbox::load::load(root.path()).unwrap();
    let matrix = tree.child("m").unwrap();
    assert_eq!(matrix.children.len(), 6);
    let mut seen = names(matrix);
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 6, "{matrix}");
}

#[test]
fn output_without_input() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "nested/orphan.output.txt", "x\n");
    write(root.path(), "paired.input.txt", "x\n");
    write(root.path(), "paired.output.txt", "x\n");

    let err = goldbox::load::load(root.path()).unwrap_err();
    assert!(matches!(err, LoadError::NoInputs { .. }), "{err}");
    assert!(err.to_string().contains("orphan.output.txt"), "{err}");
}

#[test]
fn role_none_never_asserted() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "notes.txt", "scratch\n");
    write(
        root.path(),
        "doc.md",
        "```sh\necho hi\n```\n\n```txt gold:input\nin\n```\n\n```txt gold:output\nout\n```\n",
    );

    let tree = goldbox::load::load(root.path()).unwrap();
    for case in tree.cases() {
        assert_ne!(case.assertion.input.role, Role::None);
        assert_ne!(case.assertion.output.role, Role::None);
        assert_ne!(case.assertion.input.payload, b"echo hi\n");
    }
    assert_eq!(tree.len(), 1);
}

#[test]
fn mixed_tree() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "case10.input.txt", "");
    write(root.path(), "case10.output.txt", "");
    write(root.path(), "case2.input.txt", "");
    write(root.path(), "case2.output.txt", "");
    write(root.path(), "b_dir/x.input.txt", "");
    write(root.path(), "b_dir/x.output.txt", "");
    write(
        root.path(),
        "a_doc.md",
        "# Doc title\n\n```txt gold:input\n```\n```txt gold:output\n```\n",
    );
    write(root.path(), "_off/y.input.txt", "");
    write(root.path(), "_off/y.output.txt", "");

    let tree = goldbox::load::load(root.path()).unwrap();
    assert_eq!(names(&tree), ["off", "Doc title", "b_dir", "case2", "case10"]);

    let cases: Vec<_> = tree
        .cases()
        .iter()
        .map(|c| (c.path()[1..].join("/"), c.skip))
        .collect();
    assert_eq!(
        cases,
        [
            ("off/y".to_owned(), true),
            ("Doc title/anonymous test on line 5".to_owned(), false),
            ("b_dir/x".to_owned(), false),
            ("case2".to_owned(), false),
            ("case10".to_owned(), false),
        ]
    );
}
