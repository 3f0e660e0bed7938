//! Benchmarks for building resource repositories.
//!
//! These benchmarks measure full builds of package sets of various sizes,
//! builds dominated by conflict detection, and incremental mapping changes
//! on an already built repository.

use std::fs;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use resource_overlay::builder::RepositoryBuilder;
use resource_overlay::mapping::PathMapping;
use resource_overlay::metadata::NullMetadataStore;
use resource_overlay::package::{Package, PackageSet};
use resource_overlay::repository::InMemoryRepository;
use tempfile::TempDir;

/// Creates a package set where every package maps its own path and a
/// shared path, each package overriding the one before it.
fn create_override_chain(base: &Path, num_packages: usize) -> PackageSet {
    fs::create_dir_all(base.join("root/res")).unwrap();
    let mut root = Package::root("root", &base.join("root"));
    root.add_mapping(PathMapping::new("/app", &["res"]).unwrap());
    let mut set = PackageSet::new(root);

    for i in 0..num_packages {
        let name = format!("vendor/package{}", i);
        let install_path = base.join(&name);
        fs::create_dir_all(install_path.join("res")).unwrap();
        fs::create_dir_all(install_path.join("shared")).unwrap();

        let mut package = Package::new(&name, &install_path);
        package.add_mapping(PathMapping::new(&format!("/{}", name), &["res"]).unwrap());
        package.add_mapping(PathMapping::new("/shared", &["shared"]).unwrap());
        if i > 0 {
            package.add_overridden_package(&format!("vendor/package{}", i - 1));
        }
        set.add(package).unwrap();
    }
    set
}

/// Creates a package set where every package contends for nested paths
/// with no override relations at all.
fn create_conflicting(base: &Path, num_packages: usize) -> PackageSet {
    fs::create_dir_all(base.join("root")).unwrap();
    let mut set = PackageSet::new(Package::root("root", &base.join("root")));

    for i in 0..num_packages {
        let name = format!("vendor/package{}", i);
        let install_path = base.join(&name);
        fs::create_dir_all(install_path.join("res")).unwrap();

        let mut package = Package::new(&name, &install_path);
        let path = format!("/shared/level{}", i % 4);
        package.add_mapping(PathMapping::new(&path, &["res"]).unwrap());
        set.add(package).unwrap();
    }
    set
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_repository");

    for size in [10, 50, 200] {
        let temp = TempDir::new().unwrap();
        let packages = create_override_chain(temp.path(), size);

        group.bench_with_input(BenchmarkId::new("override_chain", size), &packages, |b, packages| {
            b.iter(|| {
                let mut builder = RepositoryBuilder::new(
                    packages.clone(),
                    InMemoryRepository::new(),
                    NullMetadataStore,
                );
                black_box(builder.build_repository().unwrap())
            })
        });
    }

    for size in [10, 50] {
        let temp = TempDir::new().unwrap();
        let packages = create_conflicting(temp.path(), size);

        group.bench_with_input(BenchmarkId::new("conflicting", size), &packages, |b, packages| {
            b.iter(|| {
                let mut builder = RepositoryBuilder::new(
                    packages.clone(),
                    InMemoryRepository::new(),
                    NullMetadataStore,
                );
                builder.build_repository().unwrap();
                black_box(builder.get_path_conflicts().len())
            })
        });
    }

    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");

    for size in [10, 50, 200] {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("root/docs")).unwrap();
        let packages = create_override_chain(temp.path(), size);
        let mut builder =
            RepositoryBuilder::new(packages, InMemoryRepository::new(), NullMetadataStore);
        builder.build_repository().unwrap();

        group.bench_function(BenchmarkId::new("map_unmap", size), |b| {
            b.iter(|| {
                let mapping = PathMapping::new(black_box("/docs"), &["docs"]).unwrap();
                builder.add_mapping(mapping, true).unwrap();
                builder.remove_mapping("/docs").unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_incremental);
criterion_main!(benches);
