//! End-to-end tests for the `resource-overlay tree` command.

mod common;
use common::prelude::*;

fn fixture() -> TestFixture {
    TestFixture::new()
        .with_root(packages::ROOT_WITH_BLOG_AND_THEME)
        .with_file("res/index.html", "<html>")
        .with_file("res/js/app.js", "app")
        .with_package_dir("vendor/blog", packages::BLOG)
        .with_file("vendor/blog/css/blog.css", "blog")
        .with_package_dir("vendor/theme", packages::THEME_OVERRIDING_BLOG)
        .with_file("vendor/theme/css/dark.css", "dark")
}

#[test]
fn test_tree_help() {
    cargo_bin_cmd!("resource-overlay")
        .arg("tree")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Display the repository as a tree"))
        .stdout(predicate::str::contains("--depth"));
}

#[test]
fn test_tree_shows_merged_repository() {
    fixture()
        .command()
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/"))
        .stdout(predicate::str::contains("app"))
        .stdout(predicate::str::contains("index.html"))
        .stdout(predicate::str::contains("app.js"))
        .stdout(predicate::str::contains("blog.css"))
        .stdout(predicate::str::contains("dark.css"));
}

#[test]
fn test_tree_from_subpath() {
    fixture()
        .command()
        .arg("tree")
        .arg("/acme/blog")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/acme/blog"))
        .stdout(predicate::str::contains("css"))
        .stdout(predicate::str::contains("index.html").not());
}

#[test]
fn test_tree_depth_limit() {
    fixture()
        .command()
        .arg("tree")
        .arg("--depth")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("app"))
        .stdout(predicate::str::contains("acme"))
        .stdout(predicate::str::contains("index.html").not());
}
